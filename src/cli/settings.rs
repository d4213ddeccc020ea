//! `config` / `settings` subcommands.

use std::io::{self, BufRead, Read, Write};

use clap::Subcommand;
use serde_json::Value;

use crate::config::env::parse_value;
use crate::config::{ConfigError, Settings};

#[derive(Debug, Clone, Subcommand)]
pub enum SettingsCommand {
    /// Set a value (read from stdin when omitted)
    Set { path: String, value: Option<String> },
    /// Print a value
    Get { path: String },
    /// Print whether a value exists
    Has { path: String },
    /// Remove a value
    Delete { path: String },
    /// Print the whole document or a subtree
    List { path: Option<String> },
    /// Restore the default settings
    Reset,
}

/// Run one subcommand. Failures are reported on `err`, never returned.
pub fn execute(
    command: &SettingsCommand,
    settings: &Settings,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<()> {
    match run(command, settings, input, out) {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!(command = ?command, error = %e, "Settings command failed");
            writeln!(err, "Error: {}", e)
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("no value at {0:?}")]
    Missing(String),
}

fn run(
    command: &SettingsCommand,
    settings: &Settings,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), CommandError> {
    match command {
        SettingsCommand::Set { path, value } => {
            let raw = match value {
                Some(value) => value.clone(),
                None => {
                    let mut buf = String::new();
                    input.read_to_string(&mut buf)?;
                    buf.trim_end_matches(['\r', '\n']).to_string()
                }
            };
            settings.set(path, parse_value(&raw))?;
        }
        SettingsCommand::Get { path } => {
            let value = settings.get(path).ok_or_else(|| CommandError::Missing(path.clone()))?;
            print_value(out, &value)?;
        }
        SettingsCommand::Has { path } => {
            writeln!(out, "{}", settings.has(path))?;
        }
        SettingsCommand::Delete { path } => {
            if !settings.delete(path)? {
                return Err(CommandError::Missing(path.clone()));
            }
        }
        SettingsCommand::List { path } => {
            let value = settings
                .list(path.as_deref())
                .ok_or_else(|| CommandError::Missing(path.clone().unwrap_or_default()))?;
            print_value(out, &value)?;
        }
        SettingsCommand::Reset => {
            settings.reset()?;
        }
    }
    Ok(())
}

/// Strings print bare so `get` output can be used in shell pipelines.
fn print_value(out: &mut dyn Write, value: &Value) -> Result<(), CommandError> {
    match value {
        Value::String(s) => writeln!(out, "{}", s)?,
        other => {
            let pretty = serde_json::to_string_pretty(other).map_err(ConfigError::from)?;
            writeln!(out, "{}", pretty)?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exec(settings: &Settings, command: SettingsCommand, stdin: &str) -> (String, String) {
        let mut input = stdin.as_bytes();
        let mut out = Vec::new();
        let mut err = Vec::new();
        execute(&command, settings, &mut input, &mut out, &mut err).unwrap();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn test_set_get_has_delete() {
        let settings = Settings::in_memory(json!({"a": {"b": 1}})).unwrap();

        let set = SettingsCommand::Set {
            path: "a.c".into(),
            value: Some("42".into()),
        };
        assert_eq!(exec(&settings, set, ""), (String::new(), String::new()));
        assert_eq!(settings.get("a.c"), Some(json!(42)));

        let get = SettingsCommand::Get { path: "a.c".into() };
        assert_eq!(exec(&settings, get, "").0, "42\n");

        let has = SettingsCommand::Has { path: "a.zz".into() };
        assert_eq!(exec(&settings, has, "").0, "false\n");

        let delete = SettingsCommand::Delete { path: "a.c".into() };
        exec(&settings, delete, "");
        assert!(!settings.has("a.c"));
    }

    #[test]
    fn test_set_reads_stdin() {
        let settings = Settings::in_memory(json!({})).unwrap();
        let set = SettingsCommand::Set {
            path: "tags".into(),
            value: None,
        };
        exec(&settings, set, "[\"x\", \"y\"]\n");
        assert_eq!(settings.get("tags"), Some(json!(["x", "y"])));
    }

    #[test]
    fn test_errors_are_printed_not_returned() {
        let settings = Settings::in_memory(json!({})).unwrap();

        let (out, err) = exec(&settings, SettingsCommand::Get { path: "nope".into() }, "");
        assert!(out.is_empty());
        assert_eq!(err, "Error: no value at \"nope\"\n");

        let (_, err) = exec(
            &settings,
            SettingsCommand::Set {
                path: "a..b".into(),
                value: Some("1".into()),
            },
            "",
        );
        assert!(err.starts_with("Error: invalid settings path"));
    }

    #[test]
    fn test_list_and_reset() {
        let settings = Settings::in_memory(json!({"name": "demo"})).unwrap();
        settings.set("extra", 1).unwrap();

        let (out, _) = exec(&settings, SettingsCommand::List { path: Some("name".into()) }, "");
        assert_eq!(out, "demo\n");

        exec(&settings, SettingsCommand::Reset, "");
        assert_eq!(settings.list(None), Some(json!({"name": "demo"})));
    }
}
