use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::LifecycleError;
use crate::service::Service;
use crate::signals;
use crate::status::{ServiceStatus, StatusReport};

/// Timeouts and signal behavior for a [`Manager`].
#[derive(Clone, Debug)]
pub struct ManagerOptions {
    /// Ceiling for each service's `start` hook.
    pub start_timeout: Duration,
    /// Ceiling for each service's `stop` hook during graceful shutdown.
    pub stop_timeout: Duration,
    /// Ceiling for each `stop` hook invoked while rolling back a failed startup.
    pub rollback_timeout: Duration,
    /// Delay between background health-check passes.
    pub health_interval: Duration,
    /// Ceiling for each `health_check` hook invoked by the background loop.
    pub health_timeout: Duration,
    /// Ceiling for each `health_check` hook invoked by [`Manager::status`].
    pub status_timeout: Duration,
    /// Install SIGINT/SIGTERM/SIGHUP handlers. Disable in tests and drive
    /// shutdown through [`Manager::request_shutdown`] instead.
    pub trap_signals: bool,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            start_timeout: Duration::from_secs(30),
            stop_timeout: Duration::from_secs(30),
            rollback_timeout: Duration::from_secs(10),
            health_interval: Duration::from_secs(30),
            health_timeout: Duration::from_secs(10),
            status_timeout: Duration::from_secs(5),
            trap_signals: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Unstarted,
    Starting,
    Started,
    Stopping,
}

struct State {
    phase: Phase,
    services: Vec<Arc<dyn Service>>,
}

struct Inner {
    options: ManagerOptions,
    /// Guards phase and the registered sequence. Held only for short
    /// check/update sections, never across a service hook.
    state: Mutex<State>,
    /// Cancelled exactly once, on the first `stop` entry; the background
    /// tasks select on it as their exit condition.
    cancel: CancellationToken,
    /// Synthetic termination source. The signal watcher reacts to it the same
    /// way it reacts to an OS signal.
    terminate: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Orchestrates ordered startup, rollback on partial failure, reverse-order
/// shutdown and background health polling for a set of registered services.
///
/// Cloning is cheap; every clone shares the same state.
#[derive(Clone)]
pub struct Manager {
    inner: Arc<Inner>,
}

impl Manager {
    pub fn new(options: ManagerOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                state: Mutex::new(State {
                    phase: Phase::Unstarted,
                    services: Vec::new(),
                }),
                cancel: CancellationToken::new(),
                terminate: CancellationToken::new(),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Append a service to the startup sequence.
    ///
    /// Order is significant: services start in registration order and stop in
    /// exactly the reverse order. Once a start is in flight the sequence is
    /// fixed; late registrations are dropped with a warning.
    pub async fn register(&self, service: Arc<dyn Service>) {
        let mut state = self.inner.state.lock().await;
        if state.phase != Phase::Unstarted {
            warn!(
                "Cannot register new service after startup, dropping: {}",
                service.name()
            );
            return;
        }
        debug!("Service registered: {}", service.name());
        state.services.push(service);
    }

    /// Start every registered service in registration order.
    ///
    /// On the first failure the services already started are stopped again in
    /// reverse order and the returned error names the offending service. The
    /// signal watcher and the health loop are only spawned once every service
    /// is up.
    pub async fn start(&self) -> Result<(), LifecycleError> {
        let services = {
            let mut state = self.inner.state.lock().await;
            if state.phase != Phase::Unstarted {
                return Err(LifecycleError::AlreadyStarted);
            }
            state.phase = Phase::Starting;
            state.services.clone()
        };

        info!("Starting {} services", services.len());

        let mut started: Vec<Arc<dyn Service>> = Vec::with_capacity(services.len());
        for service in &services {
            let attempt =
                bounded(self.inner.options.start_timeout, "start", service.start()).await;
            match attempt {
                Ok(()) => {
                    info!("Service started: {}", service.name());
                    started.push(service.clone());
                }
                Err(err) => {
                    error!("Service failed to start: {}: {}", service.name(), err);
                    self.rollback(&started).await;
                    self.inner.state.lock().await.phase = Phase::Unstarted;
                    return Err(LifecycleError::StartupFailed {
                        service: service.name().to_string(),
                        source: err,
                    });
                }
            }
        }

        self.inner.state.lock().await.phase = Phase::Started;
        info!("All services started");

        let mut tasks = self.inner.tasks.lock().await;
        tasks.push(tokio::spawn(self.clone().watch_for_shutdown()));
        tasks.push(tokio::spawn(self.clone().health_check_loop()));

        Ok(())
    }

    /// Stop every registered service in reverse registration order.
    ///
    /// Shutdown is best effort: individual failures are logged, the pass
    /// always covers all services, and the manager ends up unstarted
    /// regardless of how many stop hooks failed.
    pub async fn stop(&self) -> Result<(), LifecycleError> {
        let services = {
            let mut state = self.inner.state.lock().await;
            if state.phase != Phase::Started {
                return Err(LifecycleError::NotStarted);
            }
            state.phase = Phase::Stopping;
            state.services.clone()
        };

        // Unblocks the signal watcher and the health loop.
        self.inner.cancel.cancel();

        info!("Stopping {} services", services.len());
        let mut failures = 0usize;
        for service in services.iter().rev() {
            let attempt = bounded(self.inner.options.stop_timeout, "stop", service.stop()).await;
            match attempt {
                Ok(()) => info!("Service stopped: {}", service.name()),
                Err(err) => {
                    failures += 1;
                    error!("Service failed to stop: {}: {}", service.name(), err);
                }
            }
        }

        self.inner.state.lock().await.phase = Phase::Unstarted;
        if failures > 0 {
            warn!(
                "Shutdown complete, {} of {} services did not stop cleanly",
                failures,
                services.len()
            );
        } else {
            info!("Shutdown complete");
        }

        Ok(())
    }

    /// Ask the signal watcher to shut the application down, exactly as if a
    /// termination signal had arrived.
    pub fn request_shutdown(&self) {
        self.inner.terminate.cancel();
    }

    /// Block until shutdown has been handled, signal-triggered or not.
    pub async fn wait(&self) {
        let handles: Vec<JoinHandle<()>> = self.inner.tasks.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(err) = handle.await {
                error!("Background task failed: {}", err);
            }
        }
    }

    /// Whether every registered service has started and none has been stopped.
    pub async fn is_started(&self) -> bool {
        self.inner.state.lock().await.phase == Phase::Started
    }

    /// Snapshot the manager state and probe every registered service.
    ///
    /// The service list is copied under the state lock and the probes run
    /// outside it, so this is safe to call while a start or stop is in
    /// flight.
    pub async fn status(&self) -> StatusReport {
        let (started, services) = {
            let state = self.inner.state.lock().await;
            (state.phase == Phase::Started, state.services.clone())
        };

        let probes = services.iter().map(|service| async {
            let result = bounded(
                self.inner.options.status_timeout,
                "health check",
                service.health_check(),
            )
            .await;
            ServiceStatus {
                name: service.name().to_string(),
                healthy: result.is_ok(),
                error: result.err().map(|err| err.to_string()),
            }
        });

        StatusReport {
            started,
            services: join_all(probes).await,
        }
    }

    /// Stop the given already-started services in reverse order, best effort.
    async fn rollback(&self, started: &[Arc<dyn Service>]) {
        for service in started.iter().rev() {
            let attempt = bounded(
                self.inner.options.rollback_timeout,
                "stop",
                service.stop(),
            )
            .await;
            match attempt {
                Ok(()) => info!("Rolled back service: {}", service.name()),
                Err(err) => error!("Rollback failed for {}: {}", service.name(), err),
            }
        }
    }

    async fn watch_for_shutdown(self) {
        let triggered = async {
            let os_signal = async {
                if self.inner.options.trap_signals {
                    signals::wait_for_termination_signal().await;
                } else {
                    std::future::pending::<()>().await;
                }
            };
            tokio::select! {
                _ = os_signal => info!("Termination signal received, shutting down"),
                _ = self.inner.terminate.cancelled() => info!("Shutdown requested, shutting down"),
            }
        };

        tokio::select! {
            _ = triggered => {
                match self.stop().await {
                    Ok(()) => {}
                    // Someone beat us to it; the stop pass already ran.
                    Err(LifecycleError::NotStarted) => debug!("Shutdown already handled"),
                    Err(err) => error!("Shutdown failed: {}", err),
                }
            }
            _ = self.inner.cancel.cancelled() => {
                // Stop was called programmatically; do not stop twice.
            }
        }
    }

    async fn health_check_loop(self) {
        let mut ticker = tokio::time::interval(self.inner.options.health_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the first probe
        // happens one full interval after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_health_checks().await,
                _ = self.inner.cancel.cancelled() => return,
            }
        }
    }

    /// One health pass over a snapshot of the registered services. Failures
    /// are warnings only; health polling never changes manager state.
    async fn run_health_checks(&self) {
        let services = self.inner.state.lock().await.services.clone();

        let probes = services.iter().map(|service| async {
            let attempt = bounded(
                self.inner.options.health_timeout,
                "health check",
                service.health_check(),
            )
            .await;
            if let Err(err) = attempt {
                warn!("Health check failed: {}: {}", service.name(), err);
            }
        });
        join_all(probes).await;
    }
}

/// Run a service hook under a timeout ceiling, folding the elapsed case into
/// the hook's own error type.
async fn bounded(
    limit: Duration,
    op: &str,
    hook: impl Future<Output = anyhow::Result<()>>,
) -> anyhow::Result<()> {
    match timeout(limit, hook).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!("{} did not complete within {:?}", op, limit)),
    }
}
