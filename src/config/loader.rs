//! Loading JSON resources from disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::error::ConfigError;
use crate::config::schema::ProgramInfo;

/// Where program identity comes from.
#[derive(Debug, Clone)]
pub enum InfoSource {
    Literal(ProgramInfo),
    /// A JSON manifest holding at least `name`.
    Path(PathBuf),
}

impl From<ProgramInfo> for InfoSource {
    fn from(info: ProgramInfo) -> Self {
        Self::Literal(info)
    }
}

impl From<PathBuf> for InfoSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Where default settings come from.
#[derive(Debug, Clone)]
pub enum SettingsSource {
    Literal(Value),
    /// A JSON file holding an object.
    Path(PathBuf),
}

impl From<Value> for SettingsSource {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<PathBuf> for SettingsSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve(base: Option<&Path>, path: &Path) -> PathBuf {
    match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

/// Read and deserialize a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl InfoSource {
    pub fn load(&self, base: Option<&Path>) -> Result<ProgramInfo, ConfigError> {
        match self {
            Self::Literal(info) => Ok(info.clone()),
            Self::Path(path) => load_json(&resolve(base, path)),
        }
    }
}

impl SettingsSource {
    pub fn load(&self, base: Option<&Path>) -> Result<Value, ConfigError> {
        let value = match self {
            Self::Literal(value) => value.clone(),
            Self::Path(path) => load_json(&resolve(base, path))?,
        };
        if !value.is_object() {
            return Err(ConfigError::NotAnObject("default settings"));
        }
        Ok(value)
    }
}
