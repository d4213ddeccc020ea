//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle step:
//!     → timeouts.rs (race the step against its deadline)
//!     → On timeout: sentinel error, loser aborted or detached
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every lifecycle step has a deadline
//! - The caller names the error a lost race produces

pub mod timeouts;

pub use timeouts::{race, TimeoutPolicy};
