//! Startup orchestration.
//!
//! # Responsibilities
//! - Run startup steps in registration order, one at a time
//! - Bound each step by `runtime.startupTimeout`
//! - Collect cleanups yielded by steps onto the front of the shutdown list
//!
//! # Design Decisions
//! - Fail fast: the first error ends startup and is handed to `stop`
//! - Yielded cleanups form a stack: the last resource acquired is released first
//! - A stop that lands mid-startup skips the remaining steps, and the
//!   in-flight step's cleanup is released as soon as the step returns

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, TryFutureExt};

use crate::config::schema::SHUTDOWN_TIMEOUT_KEY;
use crate::config::validation::step_timeout;
use crate::lifecycle::controller::{Controller, LifecycleState, StepContext};
use crate::lifecycle::error::{HandlerError, LifecycleError};
use crate::lifecycle::shutdown::{self, ShutdownHandler};
use crate::observability::metrics;
use crate::resilience::{race, TimeoutPolicy};

/// What a startup step resolves to: optionally, the cleanup for what it set up.
pub type StartupResult = Result<Option<ShutdownHandler>, HandlerError>;

type StartupFn = dyn Fn(StepContext) -> BoxFuture<'static, StartupResult> + Send + Sync;

/// A unit of initialization work.
#[derive(Clone)]
pub struct StartupHandler(Arc<StartupFn>);

impl StartupHandler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StartupResult> + Send + 'static,
    {
        Self(Arc::new(move |ctx| f(ctx).boxed()))
    }

    fn call(&self, ctx: StepContext) -> BoxFuture<'static, StartupResult> {
        (self.0)(ctx)
    }
}

impl std::fmt::Debug for StartupHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StartupHandler")
    }
}

/// Run `steps` against `controller`. Errors are returned, not handled.
pub(crate) async fn run(
    controller: &Arc<Controller>,
    steps: Vec<StartupHandler>,
    timeout: Duration,
    policy: TimeoutPolicy,
) -> Result<(), LifecycleError> {
    let total = steps.len();
    let timeout_ms = timeout.as_millis() as u64;
    tracing::info!(steps = total, timeout_ms, "Starting up");

    for (index, step) in steps.into_iter().enumerate() {
        let number = index + 1;
        if controller.state() != LifecycleState::Running {
            tracing::info!(
                step = number,
                total,
                "Stop requested during startup, skipping remaining steps"
            );
            return Ok(());
        }

        tracing::debug!(step = number, total, "Running startup step");
        let started = Instant::now();
        let ctx = StepContext::new(Arc::clone(controller), index, total);
        let outcome = race(
            step.call(ctx).map_err(LifecycleError::from),
            timeout,
            LifecycleError::StartupTimeout {
                step: number,
                timeout_ms,
            },
            policy,
        )
        .await;
        metrics::record_step("startup", &outcome, started);

        if let Some(cleanup) = outcome? {
            match controller.push_cleanup(cleanup) {
                Ok(()) => tracing::debug!(step = number, "Startup step registered a cleanup"),
                Err(cleanup) => release_late(controller, cleanup, number, policy).await,
            }
        }
    }

    tracing::info!(steps = total, "Startup complete");
    Ok(())
}

/// Run a cleanup whose step finished after a stop had already taken the
/// shutdown list. Failures are logged; the run's exit code is already decided.
async fn release_late(
    controller: &Arc<Controller>,
    cleanup: ShutdownHandler,
    step: usize,
    policy: TimeoutPolicy,
) {
    tracing::info!(step, "Startup step finished after stop, releasing its cleanup now");
    let timeout = step_timeout(controller.settings(), SHUTDOWN_TIMEOUT_KEY);
    if let Err(err) = shutdown::run(controller, vec![cleanup], timeout, policy).await {
        tracing::warn!(step, error = %err, "Late cleanup failed");
    }
}
