//! Where the final exit code goes.

use std::sync::{Mutex, PoisonError};

/// Receives the exit code once a run has stopped.
pub trait ExitSink: Send + Sync {
    fn exit(&self, code: i32);
}

/// Terminates the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExit;

impl ExitSink for ProcessExit {
    fn exit(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Records the exit code instead of terminating, for embedding and tests.
#[derive(Debug, Default)]
pub struct CapturedExit {
    code: Mutex<Option<i32>>,
}

impl CapturedExit {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded code, if the run has stopped.
    pub fn code(&self) -> Option<i32> {
        *self.code.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ExitSink for CapturedExit {
    fn exit(&self, code: i32) {
        *self.code.lock().unwrap_or_else(PoisonError::into_inner) = Some(code);
    }
}
