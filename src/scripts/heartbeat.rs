//! Built-in `heartbeat` script.
//!
//! Logs a beat every `heartbeat.intervalMs` until stopped. When
//! `heartbeat.count` is set, the script stops itself after that many beats.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::config::ProgramInfo;
use crate::lifecycle::{Controller, ShutdownHandler, StartupHandler, StartupResult, StepContext};
use crate::scripts::registry::Script;

pub const INTERVAL_KEY: &str = "heartbeat.intervalMs";
pub const COUNT_KEY: &str = "heartbeat.count";

const DEFAULT_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Default, Clone, Copy)]
pub struct Heartbeat;

impl Script for Heartbeat {
    fn info(&self) -> ProgramInfo {
        ProgramInfo::new("heartbeat")
            .with_description("Log a beat at a fixed interval until stopped")
    }

    fn default_settings(&self) -> Option<Value> {
        Some(json!({"heartbeat": {"intervalMs": DEFAULT_INTERVAL_MS}}))
    }

    fn configure(&self, controller: &Controller) {
        controller.add_startup_step(StartupHandler::new(start_ticker));
    }
}

async fn start_ticker(ctx: StepContext) -> StartupResult {
    let interval_ms = ctx
        .settings()
        .get_as::<u64>(INTERVAL_KEY)?
        .unwrap_or(DEFAULT_INTERVAL_MS)
        .max(1);
    let limit = ctx.settings().get_as::<u64>(COUNT_KEY)?;

    let beats = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&beats);
    let controller = Arc::clone(ctx.controller());

    let ticker = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let beat = counter.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::info!(beat, "Heartbeat");
            if limit.is_some_and(|limit| beat >= limit) {
                controller.request_stop();
                break;
            }
        }
    });

    tracing::info!(interval_ms, limit = ?limit, "Heartbeat started");

    Ok(Some(ShutdownHandler::once(move |_| async move {
        ticker.abort();
        tracing::info!(beats = beats.load(Ordering::SeqCst), "Heartbeat stopped");
        Ok(())
    })))
}
