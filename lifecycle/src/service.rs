use anyhow::Result;
use async_trait::async_trait;

/// A unit with an independent start/stop/health-check lifecycle.
///
/// Implementations own their internal resources; the manager only drives the
/// lifecycle hooks. Every hook runs under a bounded timeout, so a hook that
/// never returns is observed as a failure instead of stalling the manager.
#[async_trait]
pub trait Service: Send + Sync {
    /// Stable identity used in logs and status reports.
    fn name(&self) -> &str;

    /// Bring the service up. Called once, in registration order.
    async fn start(&self) -> Result<()>;

    /// Tear the service down. Called in reverse registration order, both
    /// during graceful shutdown and when rolling back a failed startup.
    async fn stop(&self) -> Result<()>;

    /// Non-mutating liveness probe.
    async fn health_check(&self) -> Result<()>;
}
