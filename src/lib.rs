//! Script runtime library.
//!
//! A lifecycle controller that runs ordered startup steps, collects the
//! cleanups they yield, and tears everything down on completion, signal or
//! failure. Settings live in a dot-path JSON store shared by every script.

pub mod cli;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod scripts;

pub use config::{ProgramInfo, Settings};
pub use lifecycle::{
    Controller, ControllerOptions, HandlerError, LifecycleError, LifecycleState, ShutdownHandler,
    StartupHandler, StepContext,
};
pub use scripts::{Launcher, Script, ScriptRegistry};
