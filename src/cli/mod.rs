//! Command-line surface of the `script-runtime` binary.
//!
//! # Commands
//! ```text
//! script-runtime [-C dir] [--config settings.json] start [script]
//! script-runtime [-C dir] config|settings set|get|has|delete|list|reset ...
//! ```
//!
//! The working directory switch is applied before any command runs, so
//! relative `--config` paths resolve against it.

pub mod settings;

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::config::path::merge;
use crate::config::schema::builtin_defaults;
use crate::config::Settings;
use crate::scripts::{LaunchConfig, Launcher, ScriptResolver};

pub use settings::SettingsCommand;

#[derive(Debug, Parser)]
#[command(name = "script-runtime")]
#[command(about = "Run scripts under a managed startup/shutdown lifecycle", long_about = None)]
pub struct Cli {
    /// Change to this directory before doing anything else
    #[arg(short = 'C', long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Settings file shared by every script
    #[arg(long, global = true, default_value = "settings.json")]
    pub config: PathBuf,

    /// Prefix for environment variable overrides
    #[arg(long, global = true)]
    pub env_prefix: Option<String>,

    /// Environment name, overrides APP_ENV
    #[arg(long, global = true)]
    pub env: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a registered script until it stops
    Start { script: Option<String> },
    /// Read and write the settings file
    #[command(visible_alias = "settings")]
    Config {
        #[command(subcommand)]
        action: SettingsCommand,
    },
}

/// Execute a parsed command line and return the process exit code.
pub async fn run<R: ScriptResolver>(cli: Cli, resolver: R) -> i32 {
    if let Some(dir) = &cli.cwd {
        if let Err(e) = std::env::set_current_dir(dir) {
            eprintln!("Error: cannot change directory to {}: {}", dir.display(), e);
            return 1;
        }
        tracing::debug!(cwd = %dir.display(), "Changed working directory");
    }

    match &cli.command {
        Command::Start { script } => {
            let launcher = Launcher::new(resolver, launch_config(&cli));
            match launcher.load_and_run(script.as_deref()).await {
                Ok(code) => code,
                Err(e) => {
                    tracing::error!(error = %e, "Launch failed");
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
        Command::Config { action } => {
            let store = match Settings::open(
                settings_defaults(&resolver),
                Some(cli.config.clone()),
                cli.env_prefix.clone(),
            ) {
                Ok(store) => store,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return 1;
                }
            };

            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut out = io::stdout().lock();
            let mut err = io::stderr().lock();
            match settings::execute(action, &store, &mut input, &mut out, &mut err) {
                Ok(()) => {
                    let _ = out.flush();
                    0
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to write command output");
                    1
                }
            }
        }
    }
}

pub fn launch_config(cli: &Cli) -> LaunchConfig {
    LaunchConfig {
        environment: cli.env.clone(),
        config_path: Some(cli.config.clone()),
        prefix_env: cli.env_prefix.clone(),
        attach_signals: true,
        ..Default::default()
    }
}

/// Runtime defaults plus the defaults of every registered script, so that
/// `config reset` and `config get` agree with what a script would see.
pub fn settings_defaults<R: ScriptResolver>(resolver: &R) -> Value {
    let mut defaults = builtin_defaults();
    for info in resolver.list_scripts() {
        let script_defaults = resolver
            .resolve(&info.name)
            .and_then(|s| s.default_settings());
        if let Some(script_defaults) = script_defaults {
            merge(&mut defaults, script_defaults);
        }
    }
    defaults
}
