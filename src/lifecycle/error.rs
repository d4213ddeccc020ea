//! Lifecycle errors and the error-handler slot.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::Instrument;

use crate::config::ConfigError;

/// Exit code used when an error carries none of its own.
pub const DEFAULT_ERROR_EXIT_CODE: i32 = 1;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A resource supplied at construction could not be loaded.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// A startup step did not settle in time.
    #[error("startup step {step} timed out after {timeout_ms}ms")]
    StartupTimeout { step: usize, timeout_ms: u64 },

    /// A shutdown step did not settle in time.
    #[error("shutdown step {step} timed out after {timeout_ms}ms")]
    ShutdownTimeout { step: usize, timeout_ms: u64 },

    /// A step failed on its own.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl LifecycleError {
    /// Process exit code this error maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Handler(err) => err.exit_code().unwrap_or(DEFAULT_ERROR_EXIT_CODE),
            _ => DEFAULT_ERROR_EXIT_CODE,
        }
    }
}

impl From<JoinError> for LifecycleError {
    fn from(err: JoinError) -> Self {
        let message = if err.is_panic() {
            "step panicked".to_string()
        } else {
            format!("step task failed: {}", err)
        };
        Self::Handler(HandlerError::msg(message))
    }
}

/// Failure reported by a startup or shutdown step.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    exit_code: Option<i32>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: None,
            source: None,
        }
    }

    /// Wrap another error, keeping it as the source.
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: err.to_string(),
            exit_code: None,
            source: Some(Box::new(err)),
        }
    }

    /// Exit the process with `code` if this error ends the run.
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err)
    }
}

impl From<ConfigError> for HandlerError {
    fn from(err: ConfigError) -> Self {
        Self::new(err)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::msg(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::msg(message)
    }
}

type ErrorFn = dyn Fn(Arc<LifecycleError>) -> BoxFuture<'static, ()> + Send + Sync;

/// The single slot observing the error that ends a run.
#[derive(Clone)]
pub struct ErrorHandler(Arc<ErrorFn>);

impl ErrorHandler {
    /// An asynchronous handler; `stop` awaits it before exiting.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<LifecycleError>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self(Arc::new(move |err| f(err).boxed()))
    }

    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&LifecycleError) + Send + Sync + 'static,
    {
        Self::new(move |err| {
            f(err.as_ref());
            std::future::ready(())
        })
    }

    /// Log the error and its exit code.
    pub fn log() -> Self {
        Self::sync(|err| {
            tracing::error!(error = %err, exit_code = err.exit_code(), "Lifecycle failed");
        })
    }

    /// Runs on its own task. A panic is logged and the stop carries on.
    pub(crate) async fn call(&self, err: Arc<LifecycleError>) {
        let handler = Arc::clone(&self.0);
        let task = tokio::spawn(async move { handler(err).await }.in_current_span());
        if let Err(join_error) = task.await {
            tracing::error!(error = %join_error, "Error handler failed");
        }
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::log()
    }
}

impl std::fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ErrorHandler")
    }
}
