//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Controller, steps, settings and CLI produce:
//!     → logging.rs (structured log events, stderr)
//!     → metrics.rs (step counters and latencies)
//!     → tracing.rs (per-run spans with program and run id)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing in production
//! - Run ID flows through every step of a run
//! - Metrics go through a facade; exporters are the embedder's choice

pub mod logging;
pub mod metrics;
pub mod tracing;
