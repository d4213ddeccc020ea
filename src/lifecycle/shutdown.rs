//! Shutdown coordination.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, TryFutureExt};

use crate::lifecycle::controller::{Controller, StepContext};
use crate::lifecycle::error::{HandlerError, LifecycleError};
use crate::observability::metrics;
use crate::resilience::{race, TimeoutPolicy};

type ShutdownFn = dyn Fn(StepContext) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync;

/// A unit of cleanup work, run during a graceful stop.
#[derive(Clone)]
pub struct ShutdownHandler(Arc<ShutdownFn>);

impl ShutdownHandler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        Self(Arc::new(move |ctx| f(ctx).boxed()))
    }

    /// A cleanup that owns what it releases. Calls after the first do nothing.
    pub fn once<F, Fut>(f: F) -> Self
    where
        F: FnOnce(StepContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let slot = Mutex::new(Some(f));
        Self::new(move |ctx| {
            let f = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            async move {
                match f {
                    Some(f) => f(ctx).await,
                    None => Ok(()),
                }
            }
        })
    }

    fn call(&self, ctx: StepContext) -> BoxFuture<'static, Result<(), HandlerError>> {
        (self.0)(ctx)
    }
}

impl std::fmt::Debug for ShutdownHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ShutdownHandler")
    }
}

/// Run `steps` front to back, stopping at the first failure.
pub(crate) async fn run(
    controller: &Arc<Controller>,
    steps: Vec<ShutdownHandler>,
    timeout: Duration,
    policy: TimeoutPolicy,
) -> Result<(), LifecycleError> {
    let total = steps.len();
    let timeout_ms = timeout.as_millis() as u64;
    tracing::info!(steps = total, timeout_ms, "Shutting down");

    for (index, step) in steps.into_iter().enumerate() {
        let number = index + 1;
        tracing::debug!(step = number, total, "Running shutdown step");
        let started = Instant::now();
        let ctx = StepContext::new(Arc::clone(controller), index, total);
        let outcome = race(
            step.call(ctx).map_err(LifecycleError::from),
            timeout,
            LifecycleError::ShutdownTimeout {
                step: number,
                timeout_ms,
            },
            policy,
        )
        .await;
        metrics::record_step("shutdown", &outcome, started);

        if let Err(err) = outcome {
            tracing::warn!(
                step = number,
                total,
                error = %err,
                "Shutdown step failed, skipping remaining steps"
            );
            return Err(err);
        }
    }

    tracing::info!(steps = total, "Shutdown complete");
    Ok(())
}
