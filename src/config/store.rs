//! Persisted dot-path settings store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::env;
use crate::config::error::ConfigError;
use crate::config::loader::load_json;
use crate::config::path::{self, segments};

/// Shared handle to the settings document.
///
/// Reads take a lock-free snapshot. Writes are serialized, written to disk
/// first (when a path is configured) and only then published, so a failed
/// write leaves the in-memory document untouched.
#[derive(Clone)]
pub struct Settings {
    inner: Arc<Inner>,
}

struct Inner {
    values: ArcSwap<Value>,
    defaults: Value,
    path: Option<PathBuf>,
    env_prefix: Option<String>,
    write_lock: Mutex<()>,
}

impl Settings {
    /// Open a store over `defaults`, merging any document persisted at `path`.
    pub fn open(
        defaults: Value,
        path: Option<PathBuf>,
        env_prefix: Option<String>,
    ) -> Result<Self, ConfigError> {
        if !defaults.is_object() {
            return Err(ConfigError::NotAnObject("default settings"));
        }

        let mut values = defaults.clone();
        if let Some(path) = path.as_deref().filter(|p| p.exists()) {
            let persisted: Value = load_json(path)?;
            if !persisted.is_object() {
                return Err(ConfigError::NotAnObject("settings file"));
            }
            path::merge(&mut values, persisted);
            tracing::debug!(path = %path.display(), "Loaded persisted settings");
        }

        Ok(Self {
            inner: Arc::new(Inner {
                values: ArcSwap::from_pointee(values),
                defaults,
                path,
                env_prefix,
                write_lock: Mutex::new(()),
            }),
        })
    }

    /// A store that never touches disk.
    pub fn in_memory(defaults: Value) -> Result<Self, ConfigError> {
        Self::open(defaults, None, None)
    }

    /// Where the document is persisted, if anywhere.
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// The defaults snapshot `reset` restores.
    pub fn defaults(&self) -> &Value {
        &self.inner.defaults
    }

    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Value at `path`, cloned out of the current snapshot.
    pub fn get(&self, path: &str) -> Option<Value> {
        let parts = segments(path).ok()?;
        path::lookup(&self.inner.values.load(), &parts).cloned()
    }

    pub fn get_or(&self, path: &str, default: Value) -> Value {
        self.get(path).unwrap_or(default)
    }

    /// Deserialize the value at `path`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ConfigError> {
        self.get(path)
            .map(serde_json::from_value)
            .transpose()
            .map_err(ConfigError::from)
    }

    /// Environment override for `path` first, then the store, then `default`.
    pub fn get_or_env(&self, path: &str, default: Value) -> Value {
        env::lookup(self.inner.env_prefix.as_deref(), path)
            .or_else(|| self.get(path))
            .unwrap_or(default)
    }

    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        let parts = segments(path)?;
        let value = value.into();
        self.update(|doc| path::insert(doc, &parts, value))
    }

    /// Set several dot-paths in one write.
    pub fn set_many<I, K>(&self, values: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut pending = Vec::new();
        for (key, value) in values {
            let parts: Vec<String> = segments(key.as_ref())?
                .into_iter()
                .map(String::from)
                .collect();
            pending.push((parts, value));
        }
        self.update(|doc| {
            for (parts, value) in pending {
                let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
                path::insert(doc, &parts, value)?;
            }
            Ok(())
        })
    }

    /// Remove `path`. Returns whether a value was present.
    pub fn delete(&self, path: &str) -> Result<bool, ConfigError> {
        let parts = segments(path)?;
        if !self.has(path) {
            return Ok(false);
        }
        self.update(|doc| Ok(path::remove(doc, &parts)))
    }

    /// Restore the defaults snapshot.
    pub fn reset(&self) -> Result<(), ConfigError> {
        let defaults = self.inner.defaults.clone();
        self.update(|doc| {
            *doc = defaults;
            Ok(())
        })
    }

    /// Snapshot of the subtree at `path`, or of the whole document.
    pub fn list(&self, path: Option<&str>) -> Option<Value> {
        match path {
            Some(path) => self.get(path),
            None => Some(Value::clone(&self.inner.values.load())),
        }
    }

    /// Pattern search over keys.
    pub fn search(&self, _pattern: &str) -> Result<Vec<(String, Value)>, ConfigError> {
        Err(ConfigError::NotImplemented("settings pattern search"))
    }

    /// Apply `apply` to a copy of the document, then persist and publish it.
    /// Nothing is written when `apply` fails.
    fn update<R>(
        &self,
        apply: impl FnOnce(&mut Value) -> Result<R, ConfigError>,
    ) -> Result<R, ConfigError> {
        let _guard = self
            .inner
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut next = Value::clone(&self.inner.values.load());
        let outcome = apply(&mut next)?;
        self.persist(&next)?;
        self.inner.values.store(Arc::new(next));
        Ok(outcome)
    }

    fn persist(&self, doc: &Value) -> Result<(), ConfigError> {
        let Some(path) = &self.inner.path else {
            return Ok(());
        };
        let persist_err = |source| ConfigError::Persist {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(persist_err)?;
        }
        let body = serde_json::to_string_pretty(doc)?;
        // Write-then-rename keeps the old file intact if the write fails.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(persist_err)?;
        fs::rename(&tmp, path).map_err(persist_err)?;
        Ok(())
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("path", &self.inner.path)
            .field("env_prefix", &self.inner.env_prefix)
            .finish_non_exhaustive()
    }
}
