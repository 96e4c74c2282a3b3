//! Error types for manager state transitions.

use std::fmt;

/// Failures surfaced by [`Manager`](crate::Manager) operations.
///
/// Shutdown and health-check failures are deliberately absent: both are
/// logged and absorbed so a shutdown pass always runs to completion.
#[derive(Debug)]
pub enum LifecycleError {
    /// `start` was called while a start was already in flight or complete.
    AlreadyStarted,

    /// `stop` was called while nothing was running.
    NotStarted,

    /// A service's `start` hook failed; every service started before it has
    /// been stopped again in reverse order.
    StartupFailed {
        service: String,
        source: anyhow::Error,
    },
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::AlreadyStarted => write!(f, "application is already started"),
            LifecycleError::NotStarted => write!(f, "application is not started"),
            LifecycleError::StartupFailed { service, source } => {
                write!(f, "service '{}' failed to start: {}", service, source)
            }
        }
    }
}

impl std::error::Error for LifecycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LifecycleError::StartupFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
