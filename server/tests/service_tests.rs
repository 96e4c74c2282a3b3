//! Integration tests for the service adapters, run against an in-memory
//! SQLite pool and an HTTP listener on an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use tokio_test::assert_ok;

use lifecycle::{Manager, ManagerOptions, Service};
use server::config::{DatabaseConfig, ServerConfig};
use server::services::{DatabaseService, HttpService};

fn test_manager() -> Manager {
    Manager::new(ManagerOptions {
        start_timeout: Duration::from_secs(5),
        stop_timeout: Duration::from_secs(5),
        rollback_timeout: Duration::from_secs(5),
        health_interval: Duration::from_secs(60),
        health_timeout: Duration::from_secs(2),
        status_timeout: Duration::from_secs(2),
        trap_signals: false,
    })
}

fn memory_database_config() -> DatabaseConfig {
    DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        acquire_timeout_seconds: 5,
    }
}

#[tokio::test]
async fn database_service_connects_pings_and_closes() {
    let service = DatabaseService::new(memory_database_config());

    assert!(service.health_check().await.is_err());
    assert!(service.database().await.is_none());

    assert_ok!(service.start().await);
    let database = service.database().await.expect("pool available after start");
    assert_ok!(service.health_check().await);

    // The pool is usable for real queries, not just pings.
    let row: (i64,) = sqlx::query_as("SELECT 41 + 1")
        .fetch_one(database.pool())
        .await
        .unwrap();
    assert_eq!(row.0, 42);

    assert_ok!(service.stop().await);
    assert!(service.database().await.is_none());
    assert!(service.health_check().await.is_err());
}

#[tokio::test]
async fn database_service_start_fails_on_unreachable_url() {
    let service = DatabaseService::new(DatabaseConfig {
        // Read-only mode against a file that does not exist.
        url: "sqlite://does/not/exist.db?mode=ro".to_string(),
        max_connections: 1,
        acquire_timeout_seconds: 1,
    });

    assert!(service.start().await.is_err());
    assert!(service.database().await.is_none());
}

#[tokio::test]
async fn http_service_serves_health_and_status_routes() {
    let manager = test_manager();
    let http = Arc::new(HttpService::new(
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_seconds: 5,
        },
        manager.clone(),
    ));
    manager.register(http.clone()).await;

    assert_ok!(manager.start().await);
    let addr = http.local_addr().await.expect("listener address recorded");

    let client = reqwest::Client::new();

    let health = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), 200);
    let body: serde_json::Value = health.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let status = client
        .get(format!("http://{}/api/status", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(status.status(), 200);
    let body: serde_json::Value = status.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["started"], true);
    assert_eq!(body["data"]["services"][0]["name"], "http-server");
    assert_eq!(body["data"]["services"][0]["healthy"], true);

    // The adapter's own probe goes through the same route.
    assert_ok!(http.health_check().await);

    assert_ok!(manager.stop().await);
    assert!(http.local_addr().await.is_none());
    assert!(http.health_check().await.is_err());

    // A fresh connection is refused once the listener is gone.
    let refused = reqwest::Client::new()
        .get(format!("http://{}/health", addr))
        .send()
        .await;
    assert!(refused.is_err());
}

#[tokio::test]
async fn bind_conflict_surfaces_as_startup_failure_with_rollback() {
    let manager = test_manager();

    let first = Arc::new(HttpService::new(
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_seconds: 5,
        },
        manager.clone(),
    ));
    manager.register(first.clone()).await;
    assert_ok!(manager.start().await);
    let taken = first.local_addr().await.unwrap();

    // Second manager tries to claim the same port and must fail to start.
    let second_manager = test_manager();
    let database = Arc::new(DatabaseService::new(memory_database_config()));
    let second = Arc::new(HttpService::new(
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: taken.port(),
            request_timeout_seconds: 5,
        },
        second_manager.clone(),
    ));
    second_manager.register(database.clone()).await;
    second_manager.register(second.clone()).await;

    let err = second_manager.start().await.unwrap_err();
    assert!(err.to_string().contains("http-server"));
    // The database pool that came up before the bind failure was rolled back.
    assert!(database.database().await.is_none());
    assert!(!second_manager.is_started().await);

    assert_ok!(manager.stop().await);
}
