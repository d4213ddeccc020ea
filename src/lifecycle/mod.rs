//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     start() → read startupTimeout → run steps in order, each raced
//!     against the timeout → yielded cleanups pushed to the shutdown front
//!
//! Shutdown (shutdown.rs):
//!     stop() → read shutdownTimeout → run shutdown steps front to back
//!     → error handler (if any error) → exit sink
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/end of stdin → graceful stop()
//! ```
//!
//! # Design Decisions
//! - Ordered startup: steps run one at a time, in registration order
//! - Ordered shutdown: cleanups from startup run last-acquired-first
//! - Every step has a timeout; a lost race is an error like any other
//! - Errors never escape start/stop; the error handler is the one observer
//! - Process exit goes through an injectable sink

pub mod controller;
pub mod environment;
pub mod error;
pub mod exit;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use controller::{Controller, ControllerOptions, LifecycleState, StepContext};
pub use environment::Environment;
pub use error::{ErrorHandler, HandlerError, LifecycleError};
pub use exit::{CapturedExit, ExitSink, ProcessExit};
pub use shutdown::ShutdownHandler;
pub use signals::{SignalSender, Signals, Trigger};
pub use startup::{StartupHandler, StartupResult};
