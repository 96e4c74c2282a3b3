pub mod database_service;
pub mod http_service;

pub use database_service::DatabaseService;
pub use http_service::HttpService;
