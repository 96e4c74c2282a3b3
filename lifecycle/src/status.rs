use serde::Serialize;

/// Point-in-time view of the manager and every registered service, suitable
/// for serialization onto a status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub started: bool,
    pub services: Vec<ServiceStatus>,
}

/// Health probe result for a single registered service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
