pub mod handlers;
pub mod server;

pub use server::create_router;

use lifecycle::Manager;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Manager,
}

impl AppState {
    pub fn new(manager: Manager) -> Self {
        Self { manager }
    }
}
