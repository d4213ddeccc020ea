//! Configuration schema definitions.
//!
//! Program identity and the built-in settings the runtime itself consumes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Settings key holding the per-step startup timeout in milliseconds.
pub const STARTUP_TIMEOUT_KEY: &str = "runtime.startupTimeout";

/// Settings key holding the per-step shutdown timeout in milliseconds.
pub const SHUTDOWN_TIMEOUT_KEY: &str = "runtime.shutdownTimeout";

/// Timeout applied when a timeout key is absent or unusable.
pub const DEFAULT_STEP_TIMEOUT_MS: u64 = 2000;

/// Identity of a program or script.
///
/// Deserializes from manifest-style JSON; fields other than these are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProgramInfo {
    /// Program name, used in logs.
    pub name: String,

    /// Short human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ProgramInfo {
    /// Create an identity with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            version: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl Default for ProgramInfo {
    /// Named after the running executable.
    fn default() -> Self {
        let name = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "app".to_string());
        Self::new(name)
    }
}

/// Settings every controller starts from, before caller defaults.
pub fn builtin_defaults() -> Value {
    json!({
        "runtime": {
            "startupTimeout": DEFAULT_STEP_TIMEOUT_MS,
            "shutdownTimeout": DEFAULT_STEP_TIMEOUT_MS,
        }
    })
}
