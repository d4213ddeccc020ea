//! Metrics collection.
//!
//! # Metrics
//! - `lifecycle_steps_total` (counter): steps run, by phase and outcome
//! - `lifecycle_step_duration_seconds` (histogram): step latency by phase
//! - `lifecycle_exits_total` (counter): stops, by exit code
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; no exporter is installed here
//! - Outcomes are `ok`, `timeout` or `error`

use std::time::Instant;

use crate::lifecycle::LifecycleError;

/// Record one startup or shutdown step.
pub fn record_step<T>(phase: &'static str, outcome: &Result<T, LifecycleError>, started: Instant) {
    let outcome = match outcome {
        Ok(_) => "ok",
        Err(LifecycleError::StartupTimeout { .. } | LifecycleError::ShutdownTimeout { .. }) => {
            "timeout"
        }
        Err(_) => "error",
    };

    ::metrics::counter!("lifecycle_steps_total", "phase" => phase, "outcome" => outcome)
        .increment(1);
    ::metrics::histogram!("lifecycle_step_duration_seconds", "phase" => phase)
        .record(started.elapsed().as_secs_f64());
}

/// Record a completed stop.
pub fn record_exit(code: i32) {
    ::metrics::counter!("lifecycle_exits_total", "code" => code.to_string()).increment(1);
}
