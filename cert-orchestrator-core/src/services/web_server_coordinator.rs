//! Mutual exclusion over the shared validation port.
//!
//! The CA contacts the validation port directly during a standalone
//! challenge; a competing web service would answer first and fail the
//! validation. This coordinator stops that service for the duration of the
//! wrapped action and restarts it on every exit path.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::CoreResult;
use crate::traits::{CommandSpec, ProcessRunner};

/// Coordinates exclusive use of the validation port.
///
/// A single shared resource: at most one
/// [`with_port_suspended`](Self::with_port_suspended) call is in flight
/// system-wide; concurrent
/// callers queue on the internal lock. Interleaving would make the web
/// service flap and unrelated traffic fail.
pub struct WebServerCoordinator {
    runner: Arc<dyn ProcessRunner>,
    service: String,
    control_timeout: Duration,
    port_lock: Mutex<()>,
}

impl WebServerCoordinator {
    /// Creates the coordinator for the named web service.
    #[must_use]
    pub fn new(runner: Arc<dyn ProcessRunner>, service: &str, control_timeout: Duration) -> Self {
        Self {
            runner,
            service: service.to_string(),
            control_timeout,
            port_lock: Mutex::new(()),
        }
    }

    /// Runs `action` with the competing web service suspended.
    ///
    /// The stop is best-effort: a failure to stop is logged as a warning and
    /// the flow proceeds anyway. (A failed stop can make the subsequent
    /// challenge fail with a confusing agent error instead of "port busy";
    /// surfacing it earlier would change observed behavior, so it stays a
    /// warning for now.) The restart runs unconditionally: on success, on
    /// failure, and (through a drop guard) when `action` unwinds or the
    /// surrounding task is cancelled mid-flight.
    pub async fn with_port_suspended<T, F, Fut>(&self, action: F) -> CoreResult<T>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = CoreResult<T>> + Send,
    {
        let _guard = self.port_lock.lock().await;
        self.control("stop").await;
        let mut restart = RestartGuard {
            runner: self.runner.clone(),
            spec: Some(self.control_spec("start")),
        };
        let result = action().await;
        restart.disarm();
        self.control("start").await;
        result
    }

    fn control_spec(&self, verb: &str) -> CommandSpec {
        CommandSpec::new(
            "systemctl",
            &format!("{verb} {}", self.service),
            self.control_timeout,
        )
        .arg(verb)
        .arg(&self.service)
    }

    /// Issues one idempotent stop/start command. Failures are logged, never
    /// propagated as hard errors.
    async fn control(&self, verb: &str) {
        let spec = self.control_spec(verb);

        match self.runner.run(spec).await {
            Ok(output) if output.success() => {
                log::info!("Web service {} {verb}ed for port handover", self.service);
            }
            Ok(output) => {
                log::warn!(
                    "Failed to {verb} web service {}: {}",
                    self.service,
                    output.diagnostic()
                );
            }
            Err(e) => {
                log::warn!("Failed to {verb} web service {}: {e}", self.service);
            }
        }
    }
}

/// Restarts the web service when the wrapped action never completed, either
/// because it unwound or because the surrounding task was dropped mid-await.
/// Disarmed on the ordinary exit paths, where `control("start")` runs with
/// full logging instead.
struct RestartGuard {
    runner: Arc<dyn ProcessRunner>,
    spec: Option<CommandSpec>,
}

impl RestartGuard {
    fn disarm(&mut self) {
        self.spec = None;
    }
}

impl Drop for RestartGuard {
    fn drop(&mut self) {
        let Some(spec) = self.spec.take() else { return };
        // Drop is sync; hand the start command to the runtime if one is
        // still there. During full runtime teardown there is nothing left
        // to restart for.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let runner = self.runner.clone();
        handle.spawn(async move {
            if let Err(e) = runner.run(spec).await {
                log::warn!("Failed to restart web service after aborted action: {e}");
            }
        });
    }
}
