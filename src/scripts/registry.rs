//! Script registration and lookup.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::config::ProgramInfo;
use crate::lifecycle::Controller;

/// A program the launcher can run under a controller.
pub trait Script: Send + Sync {
    /// Name and description shown by the CLI.
    fn info(&self) -> ProgramInfo;

    /// Settings this script expects, merged under the persisted document.
    fn default_settings(&self) -> Option<Value> {
        None
    }

    /// Register startup and shutdown steps.
    fn configure(&self, controller: &Controller);
}

/// Finds scripts by name.
pub trait ScriptResolver {
    fn list_scripts(&self) -> Vec<ProgramInfo>;
    fn resolve(&self, name: &str) -> Option<Arc<dyn Script>>;
}

/// Scripts known at compile time, keyed by name.
#[derive(Default, Clone)]
pub struct ScriptRegistry {
    scripts: BTreeMap<String, Arc<dyn Script>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a script under its own name, replacing any script of that name.
    pub fn register(&mut self, script: impl Script + 'static) -> &mut Self {
        let name = normalize(&script.info().name);
        self.scripts.insert(name, Arc::new(script));
        self
    }

    pub fn with(mut self, script: impl Script + 'static) -> Self {
        self.register(script);
        self
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl ScriptResolver for ScriptRegistry {
    fn list_scripts(&self) -> Vec<ProgramInfo> {
        self.scripts.values().map(|s| s.info()).collect()
    }

    fn resolve(&self, name: &str) -> Option<Arc<dyn Script>> {
        self.scripts.get(&normalize(name)).cloned()
    }
}

impl std::fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.scripts.keys()).finish()
    }
}

/// `jobs/cleanup.rs` and `cleanup` name the same script.
fn normalize(name: &str) -> String {
    Path::new(name.trim())
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.trim().to_string())
}
