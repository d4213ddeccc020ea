//! Running a resolved script under a controller.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::path::merge;
use crate::config::InfoSource;
use crate::lifecycle::{
    CapturedExit, Controller, ControllerOptions, ExitSink, LifecycleError, Signals,
};
use crate::resilience::TimeoutPolicy;
use crate::scripts::registry::{Script, ScriptResolver};

/// Errors raised before a script gets to run.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no script named {0:?}")]
    UnknownScript(String),

    #[error("no script given, choose one of: {}", .0.join(", "))]
    NoneChosen(Vec<String>),

    #[error("no scripts are registered")]
    NoScripts,

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Settings shared by every script the launcher runs.
#[derive(Debug, Clone, Default)]
pub struct LaunchConfig {
    pub info: Option<InfoSource>,
    pub default_settings: Option<Value>,
    pub environment: Option<String>,
    pub config_path: Option<PathBuf>,
    pub resolve_from: Option<PathBuf>,
    pub prefix_env: Option<String>,
    pub timeout_policy: TimeoutPolicy,
    /// Stop gracefully on SIGINT/SIGTERM.
    pub attach_signals: bool,
}

/// Resolves scripts by name and runs them to completion.
pub struct Launcher<R> {
    resolver: R,
    config: LaunchConfig,
}

impl<R: ScriptResolver> Launcher<R> {
    pub fn new(resolver: R, config: LaunchConfig) -> Self {
        Self { resolver, config }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// The named script, or the only registered one when no name is given.
    pub fn pick(&self, name: Option<&str>) -> Result<Arc<dyn Script>, LaunchError> {
        if let Some(name) = name {
            return self
                .resolver
                .resolve(name)
                .ok_or_else(|| LaunchError::UnknownScript(name.to_string()));
        }

        let available = self.resolver.list_scripts();
        match available.as_slice() {
            [] => Err(LaunchError::NoScripts),
            [only] => self
                .resolver
                .resolve(&only.name)
                .ok_or_else(|| LaunchError::UnknownScript(only.name.clone())),
            many => Err(LaunchError::NoneChosen(many.iter().map(|i| i.name.clone()).collect())),
        }
    }

    /// Build a controller for `script` with its steps registered.
    pub fn prepare(
        &self,
        script: &dyn Script,
        exit: Arc<dyn ExitSink>,
    ) -> Result<Arc<Controller>, LaunchError> {
        let mut defaults = self
            .config
            .default_settings
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new()));
        if let Some(script_defaults) = script.default_settings() {
            merge(&mut defaults, script_defaults);
        }

        let controller = Controller::new(ControllerOptions {
            info: self.config.info.clone(),
            script: Some(script.info()),
            default_settings: Some(defaults.into()),
            environment: self.config.environment.clone(),
            config_path: self.config.config_path.clone(),
            resolve_from: self.config.resolve_from.clone(),
            prefix_env: self.config.prefix_env.clone(),
            exit: Some(exit),
            timeout_policy: self.config.timeout_policy,
            ..Default::default()
        })?;

        script.configure(&controller);
        Ok(controller)
    }

    /// Run a script until its controller stops and return the exit code.
    pub async fn load_and_run(&self, name: Option<&str>) -> Result<i32, LaunchError> {
        let script = self.pick(name)?;
        let exit = Arc::new(CapturedExit::new());
        let controller = self.prepare(script.as_ref(), exit.clone())?;

        tracing::info!(script = %script.info().name, "Launching script");
        if self.config.attach_signals {
            controller.start_with_signals(Signals::os()).await;
        } else {
            controller.start().await;
        }
        controller.wait_stopped().await;

        Ok(exit.code().unwrap_or(0))
    }
}
