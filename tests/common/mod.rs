//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use script_runtime::lifecycle::{
    CapturedExit, Controller, ControllerOptions, ErrorHandler, LifecycleError, ShutdownHandler,
    StartupHandler,
};

/// Ordered record of what ran.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries().iter().any(|e| e == entry)
    }
}

/// A controller whose exit code is captured instead of ending the process.
pub fn controller(defaults: Value) -> (Arc<Controller>, Arc<CapturedExit>) {
    let exit = Arc::new(CapturedExit::new());
    let controller = Controller::new(ControllerOptions {
        default_settings: Some(defaults.into()),
        exit: Some(exit.clone()),
        ..Default::default()
    })
    .unwrap();
    (controller, exit)
}

/// Controller with both step timeouts set to `timeout_ms`.
pub fn controller_with_timeouts(timeout_ms: u64) -> (Arc<Controller>, Arc<CapturedExit>) {
    controller(json!({
        "runtime": {"startupTimeout": timeout_ms, "shutdownTimeout": timeout_ms}
    }))
}

/// Startup step that records `label` and yields no cleanup.
pub fn recording_step(journal: &Journal, label: &str) -> StartupHandler {
    let journal = journal.clone();
    let label = label.to_string();
    StartupHandler::new(move |_| {
        journal.record(label.clone());
        async { Ok(None) }
    })
}

/// Startup step that records `label` and yields a cleanup recording `cleanup <label>`.
pub fn acquiring_step(journal: &Journal, label: &str) -> StartupHandler {
    let journal = journal.clone();
    let label = label.to_string();
    StartupHandler::new(move |_| {
        journal.record(label.clone());
        let cleanup = recording_cleanup(&journal, &format!("cleanup {}", label));
        async move { Ok(Some(cleanup)) }
    })
}

/// Startup step that never finishes within any reasonable timeout.
pub fn stalled_step(journal: &Journal, label: &str) -> StartupHandler {
    let journal = journal.clone();
    let label = label.to_string();
    StartupHandler::new(move |_| {
        journal.record(label.clone());
        async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }
    })
}

pub fn recording_cleanup(journal: &Journal, label: &str) -> ShutdownHandler {
    let journal = journal.clone();
    let label = label.to_string();
    ShutdownHandler::new(move |_| {
        journal.record(label.clone());
        async { Ok(()) }
    })
}

/// Error handler that records each error's display form.
pub fn capturing_error_handler() -> (ErrorHandler, Arc<Mutex<Vec<Arc<LifecycleError>>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handler = ErrorHandler::new(move |err: Arc<LifecycleError>| {
        let sink = Arc::clone(&sink);
        async move {
            tokio::task::yield_now().await;
            sink.lock().unwrap().push(err);
        }
    });
    (handler, seen)
}
