//! The lifecycle controller.
//!
//! # State Transitions
//! ```text
//! Idle → Running:          start()
//! Running → ShuttingDown:  stop(error?)
//! ShuttingDown → Stopped:  shutdown steps done, error handler awaited
//! ```
//! Any other call to `start` or `stop` is a no-op, so repeated signals and
//! overlapping stops resolve to a single shutdown.

use std::collections::VecDeque;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::loader::resolve;
use crate::config::path::merge;
use crate::config::schema::{builtin_defaults, SHUTDOWN_TIMEOUT_KEY, STARTUP_TIMEOUT_KEY};
use crate::config::validation::step_timeout;
use crate::config::{ConfigError, InfoSource, ProgramInfo, Settings, SettingsSource};
use crate::lifecycle::environment::Environment;
use crate::lifecycle::error::{ErrorHandler, LifecycleError};
use crate::lifecycle::exit::{ExitSink, ProcessExit};
use crate::lifecycle::shutdown::{self, ShutdownHandler};
use crate::lifecycle::signals::Signals;
use crate::lifecycle::startup::{self, StartupHandler};
use crate::observability::{metrics, tracing::run_span};
use crate::resilience::TimeoutPolicy;

/// Where a controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Running,
    ShuttingDown,
    Stopped,
}

/// Everything a controller can be constructed with.
#[derive(Default)]
pub struct ControllerOptions {
    /// Program identity. Defaults to the executable name.
    pub info: Option<InfoSource>,

    /// The script running under this program's shared settings.
    pub script: Option<ProgramInfo>,

    /// Caller defaults, merged over the builtin runtime defaults.
    pub default_settings: Option<SettingsSource>,

    /// Overrides `APP_ENV`.
    pub environment: Option<String>,

    /// Settings persistence file. In-memory when unset.
    pub config_path: Option<PathBuf>,

    /// Base directory for relative resource paths.
    pub resolve_from: Option<PathBuf>,

    pub startup_steps: Vec<StartupHandler>,
    pub shutdown_steps: Vec<ShutdownHandler>,
    pub on_error: Option<ErrorHandler>,

    /// Prefix for `get_setting_or_env` variable names.
    pub prefix_env: Option<String>,

    /// Defaults to terminating the process.
    pub exit: Option<Arc<dyn ExitSink>>,

    pub timeout_policy: TimeoutPolicy,
}

impl ControllerOptions {
    pub fn new(info: impl Into<InfoSource>) -> Self {
        Self {
            info: Some(info.into()),
            ..Self::default()
        }
    }
}

/// Runs startup steps, then shutdown steps on termination.
pub struct Controller {
    info: ProgramInfo,
    script: Option<ProgramInfo>,
    environment: Environment,
    settings: Settings,
    startup_steps: Mutex<Vec<StartupHandler>>,
    shutdown_steps: Mutex<VecDeque<ShutdownHandler>>,
    error_handler: Mutex<ErrorHandler>,
    state: watch::Sender<LifecycleState>,
    exit: Arc<dyn ExitSink>,
    timeout_policy: TimeoutPolicy,
    run_id: Uuid,
}

impl Controller {
    /// Build a controller, loading any resource paths in `options`.
    pub fn new(options: ControllerOptions) -> Result<Arc<Self>, LifecycleError> {
        let base = options.resolve_from.as_deref();

        let info = match &options.info {
            Some(source) => source.load(base)?,
            None => ProgramInfo::default(),
        };

        let mut defaults = builtin_defaults();
        if let Some(source) = &options.default_settings {
            merge(&mut defaults, source.load(base)?);
        }

        let config_path = options.config_path.as_deref().map(|p| resolve(base, p));
        let settings = Settings::open(defaults, config_path, options.prefix_env.clone())?;
        let environment = Environment::resolve(options.environment.as_deref());
        let (state, _) = watch::channel(LifecycleState::Idle);

        tracing::debug!(
            name = %info.name,
            environment = %environment,
            settings_path = ?settings.path(),
            "Controller created"
        );

        Ok(Arc::new(Self {
            info,
            script: options.script,
            environment,
            settings,
            startup_steps: Mutex::new(options.startup_steps),
            shutdown_steps: Mutex::new(options.shutdown_steps.into()),
            error_handler: Mutex::new(options.on_error.unwrap_or_default()),
            state,
            exit: options.exit.unwrap_or_else(|| Arc::new(ProcessExit)),
            timeout_policy: options.timeout_policy,
            run_id: Uuid::new_v4(),
        }))
    }

    pub fn add_startup_steps(&self, handlers: impl IntoIterator<Item = StartupHandler>) -> &Self {
        lock(&self.startup_steps).extend(handlers);
        self
    }

    pub fn add_startup_step(&self, handler: StartupHandler) -> &Self {
        self.add_startup_steps([handler])
    }

    /// Append to the back of the shutdown list.
    pub fn add_shutdown_steps(&self, handlers: impl IntoIterator<Item = ShutdownHandler>) -> &Self {
        lock(&self.shutdown_steps).extend(handlers);
        self
    }

    pub fn add_shutdown_step(&self, handler: ShutdownHandler) -> &Self {
        self.add_shutdown_steps([handler])
    }

    pub fn set_error_handler(&self, handler: ErrorHandler) -> &Self {
        *lock(&self.error_handler) = handler;
        self
    }

    /// Cleanups yielded by startup steps run before everything registered so far.
    ///
    /// Hands the cleanup back once a stop has begun, since `stop` takes the
    /// shutdown list under the same lock after leaving `Running`.
    pub(crate) fn push_cleanup(&self, handler: ShutdownHandler) -> Result<(), ShutdownHandler> {
        let mut steps = lock(&self.shutdown_steps);
        if self.state() != LifecycleState::Running {
            return Err(handler);
        }
        steps.push_front(handler);
        Ok(())
    }

    /// Run the startup steps. No-op unless the controller is idle.
    ///
    /// Returns once startup completes or, on failure, once `stop` has run.
    pub async fn start(self: &Arc<Self>) {
        self.launch(None).await
    }

    /// Like [`start`](Self::start), stopping gracefully on the first trigger
    /// `signals` delivers.
    pub async fn start_with_signals(self: &Arc<Self>, signals: Signals) {
        self.launch(Some(signals)).await
    }

    async fn launch(self: &Arc<Self>, signals: Option<Signals>) {
        if !self.transition(LifecycleState::Idle, LifecycleState::Running) {
            tracing::debug!(state = ?self.state(), "Start ignored");
            return;
        }

        let span = run_span(&self.info, self.script.as_ref(), self.run_id);
        async {
            if let Some(signals) = signals {
                self.watch_signals(signals);
            }

            let timeout = step_timeout(&self.settings, STARTUP_TIMEOUT_KEY);
            let steps = lock(&self.startup_steps).clone();

            if let Err(err) = startup::run(self, steps, timeout, self.timeout_policy).await {
                tracing::error!(error = %err, "Startup failed");
                self.stop(Some(err)).await;
            }
        }
        .instrument(span)
        .await
    }

    fn watch_signals(self: &Arc<Self>, mut signals: Signals) {
        let controller = Arc::clone(self);
        tokio::spawn(
            async move {
                tokio::select! {
                    trigger = signals.recv() => {
                        if let Some(trigger) = trigger {
                            tracing::info!(trigger = %trigger, "Termination requested");
                            controller.stop(None).await;
                        }
                    }
                    _ = controller.wait_stopped() => {}
                }
            }
            .in_current_span(),
        );
    }

    /// Stop the run. No-op (returning `None`) unless the controller is running.
    ///
    /// Without an error, shutdown steps run front to back; a failing or
    /// timed-out step replaces the error and skips the rest. With an error,
    /// shutdown steps are skipped. Either way the error handler sees the final
    /// error, and the exit sink receives the exit code, which is also returned.
    pub async fn stop(self: &Arc<Self>, error: Option<LifecycleError>) -> Option<i32> {
        if !self.transition(LifecycleState::Running, LifecycleState::ShuttingDown) {
            tracing::debug!(state = ?self.state(), "Stop ignored");
            return None;
        }

        let span = run_span(&self.info, self.script.as_ref(), self.run_id);
        let code = async {
            let mut error = error;
            if error.is_none() {
                let timeout = step_timeout(&self.settings, SHUTDOWN_TIMEOUT_KEY);
                let steps: Vec<_> = lock(&self.shutdown_steps).drain(..).collect();
                if let Err(err) = shutdown::run(self, steps, timeout, self.timeout_policy).await {
                    error = Some(err);
                }
            } else {
                tracing::warn!("Stopping after a fatal error, skipping shutdown steps");
            }

            let code = match error {
                Some(err) => {
                    let code = err.exit_code();
                    let handler = lock(&self.error_handler).clone();
                    handler.call(Arc::new(err)).await;
                    code
                }
                None => 0,
            };

            self.state.send_replace(LifecycleState::Stopped);
            metrics::record_exit(code);
            tracing::info!(exit_code = code, "Stopped");
            code
        }
        .instrument(span)
        .await;

        self.exit.exit(code);
        Some(code)
    }

    /// Spawn a graceful stop, for steps and tasks that cannot await it.
    pub fn request_stop(self: &Arc<Self>) {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            controller.stop(None).await;
        });
    }

    /// Resolve once the controller has stopped.
    pub async fn wait_stopped(&self) {
        let mut state = self.state.subscribe();
        while *state.borrow_and_update() != LifecycleState::Stopped {
            if state.changed().await.is_err() {
                return;
            }
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    pub fn info(&self) -> &ProgramInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn description(&self) -> Option<&str> {
        self.info.description.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.info.version.as_deref()
    }

    pub fn script(&self) -> Option<&ProgramInfo> {
        self.script.as_ref()
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn is_test(&self) -> bool {
        self.environment == Environment::Test
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn get_setting(&self, path: &str) -> Option<Value> {
        self.settings.get(path)
    }

    pub fn get_setting_or(&self, path: &str, default: Value) -> Value {
        self.settings.get_or(path, default)
    }

    pub fn get_setting_or_env(&self, path: &str, default: Value) -> Value {
        self.settings.get_or_env(path, default)
    }

    pub fn has_setting(&self, path: &str) -> bool {
        self.settings.has(path)
    }

    pub fn set_setting(&self, path: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        self.settings.set(path, value)
    }

    pub fn set_settings<I, K>(&self, values: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        self.settings.set_many(values)
    }

    pub fn delete_setting(&self, path: &str) -> Result<bool, ConfigError> {
        self.settings.delete(path)
    }

    pub fn reset_settings(&self) -> Result<(), ConfigError> {
        self.settings.reset()
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("info", &self.info)
            .field("environment", &self.environment)
            .field("state", &self.state())
            .field("run_id", &self.run_id)
            .finish_non_exhaustive()
    }
}

/// What a step sees: the controller, its position and the list length.
#[derive(Clone)]
pub struct StepContext {
    controller: Arc<Controller>,
    index: usize,
    total: usize,
}

impl StepContext {
    pub(crate) fn new(controller: Arc<Controller>, index: usize, total: usize) -> Self {
        Self {
            controller,
            index,
            total,
        }
    }

    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    /// Zero-based position in the list being run.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

impl Deref for StepContext {
    type Target = Controller;

    fn deref(&self) -> &Controller {
        &self.controller
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
