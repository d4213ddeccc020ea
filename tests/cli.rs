//! Command-line flows against a real settings file.

use std::fs;

use clap::Parser;
use serde_json::{json, Value};
use tempfile::tempdir;

use script_runtime::cli::{self, settings, Cli, Command};
use script_runtime::config::{ProgramInfo, Settings};
use script_runtime::lifecycle::{Controller, HandlerError, StartupHandler};
use script_runtime::scripts::{Heartbeat, Script, ScriptRegistry};

struct Exiting(i32);

impl Script for Exiting {
    fn info(&self) -> ProgramInfo {
        ProgramInfo::new("exiting")
    }

    fn configure(&self, controller: &Controller) {
        let code = self.0;
        controller.add_startup_step(StartupHandler::new(move |ctx| async move {
            if code != 0 {
                return Err(HandlerError::msg("exiting on purpose").with_exit_code(code));
            }
            ctx.controller().request_stop();
            Ok(None)
        }));
    }
}

fn run_settings(store: &Settings, args: &[&str], stdin: &str) -> (String, String) {
    let argv = ["script-runtime", "config"].iter().chain(args).copied();
    let Command::Config { action } = Cli::try_parse_from(argv).unwrap().command else {
        panic!("expected a config command");
    };

    let mut input = stdin.as_bytes();
    let mut out = Vec::new();
    let mut err = Vec::new();
    settings::execute(&action, store, &mut input, &mut out, &mut err).unwrap();
    (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
}

#[test]
fn test_config_commands_edit_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let registry = ScriptRegistry::new().with(Heartbeat);
    let store =
        Settings::open(cli::settings_defaults(&registry), Some(path.clone()), None).unwrap();

    run_settings(&store, &["set", "heartbeat.count", "3"], "");
    run_settings(&store, &["set", "owner.name"], "ops team\n");

    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["heartbeat"]["count"], 3);
    assert_eq!(on_disk["owner"]["name"], "ops team");

    assert_eq!(run_settings(&store, &["get", "owner.name"], "").0, "ops team\n");
    assert_eq!(run_settings(&store, &["has", "heartbeat.count"], "").0, "true\n");
    let expected = serde_json::to_string_pretty(&json!({"intervalMs": 1000, "count": 3})).unwrap();
    assert_eq!(
        run_settings(&store, &["list", "heartbeat"], "").0,
        format!("{}\n", expected)
    );

    run_settings(&store, &["delete", "owner"], "");
    assert_eq!(run_settings(&store, &["has", "owner"], "").0, "false\n");

    run_settings(&store, &["reset"], "");
    let reopened = Settings::open(cli::settings_defaults(&registry), Some(path), None).unwrap();
    assert_eq!(reopened.get("heartbeat.count"), None);
    assert_eq!(reopened.get("heartbeat.intervalMs"), Some(json!(1000)));
}

#[test]
fn test_config_errors_are_printed() {
    let store = Settings::in_memory(json!({})).unwrap();
    let (out, err) = run_settings(&store, &["delete", "nothing.here"], "");
    assert!(out.is_empty());
    assert_eq!(err, "Error: no value at \"nothing.here\"\n");
}

#[tokio::test]
async fn test_start_returns_script_exit_code() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("settings.json");
    let config = config.to_str().unwrap();

    let registry = || ScriptRegistry::new().with(Exiting(0));
    let parse = |script: Option<&str>| {
        let mut argv = vec!["script-runtime", "--config", config, "start"];
        argv.extend(script);
        Cli::try_parse_from(argv).unwrap()
    };

    assert_eq!(cli::run(parse(None), registry()).await, 0);
    assert_eq!(cli::run(parse(Some("missing")), registry()).await, 1);

    let failing = ScriptRegistry::new().with(Exiting(4));
    assert_eq!(cli::run(parse(Some("exiting.rs")), failing).await, 4);
}

#[tokio::test]
async fn test_start_without_name_needs_a_single_script() {
    let registry = ScriptRegistry::new()
        .with(Exiting(0))
        .with(Heartbeat);
    let dir = tempdir().unwrap();
    let config = dir.path().join("settings.json");

    let argv = ["script-runtime", "--config", config.to_str().unwrap(), "start"];
    let args = Cli::try_parse_from(argv).unwrap();
    assert_eq!(cli::run(args, registry).await, 1);
}
