//! Script subsystem.
//!
//! # Data Flow
//! ```text
//! CLI `start [name]`
//!     → registry.rs (resolve name, extension stripped)
//!     → launcher.rs (build controller, script registers its steps)
//!     → controller start → wait for stop → exit code back to the CLI
//! ```
//!
//! # Design Decisions
//! - Scripts are registered in code, not discovered on disk
//! - Every script shares the launcher's settings file
//! - The launcher captures the exit code; the binary decides when to exit

pub mod heartbeat;
pub mod launcher;
pub mod registry;

pub use heartbeat::Heartbeat;
pub use launcher::{LaunchConfig, LaunchError, Launcher};
pub use registry::{Script, ScriptRegistry, ScriptResolver};
