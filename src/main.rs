//! Script runtime
//!
//! Runs registered scripts under a managed startup/shutdown lifecycle and
//! manages the settings file they share.
//!
//! # Architecture Overview
//!
//! ```text
//!   argv ──▶ cli ──┬─▶ start ──▶ scripts::Launcher ──▶ lifecycle::Controller
//!                  │                                    │  startup steps (timed)
//!                  │                                    │  shutdown steps (timed)
//!                  │                                    ▼
//!                  │                               exit code ──▶ process exit
//!                  │
//!                  └─▶ config ──▶ config::Settings (settings.json)
//! ```

use clap::Parser;

use script_runtime::cli::{self, Cli};
use script_runtime::lifecycle::Environment;
use script_runtime::observability::logging;
use script_runtime::scripts::{Heartbeat, ScriptRegistry};

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    logging::init(Environment::resolve(args.env.as_deref()));
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "script-runtime starting");

    let registry = ScriptRegistry::new().with(Heartbeat);
    let code = cli::run(args, registry).await;

    std::process::exit(code);
}
