//! Settings validation.
//!
//! Values consumed by the runtime itself are checked on read: an unusable
//! value is logged and replaced by its default rather than failing the run.

use std::time::Duration;

use crate::config::schema::DEFAULT_STEP_TIMEOUT_MS;
use crate::config::store::Settings;

/// Per-step timeout stored under `key`, in milliseconds.
pub fn step_timeout(settings: &Settings, key: &str) -> Duration {
    let Some(value) = settings.get(key) else {
        return Duration::from_millis(DEFAULT_STEP_TIMEOUT_MS);
    };

    match value.as_u64() {
        Some(ms) => Duration::from_millis(ms),
        None => {
            tracing::warn!(
                key = key,
                value = %value,
                default_ms = DEFAULT_STEP_TIMEOUT_MS,
                "Timeout is not a non-negative integer, using default"
            );
            Duration::from_millis(DEFAULT_STEP_TIMEOUT_MS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{builtin_defaults, STARTUP_TIMEOUT_KEY};
    use serde_json::json;

    #[test]
    fn test_step_timeout() {
        let settings = Settings::in_memory(builtin_defaults()).unwrap();
        assert_eq!(step_timeout(&settings, STARTUP_TIMEOUT_KEY), Duration::from_millis(2000));

        settings.set(STARTUP_TIMEOUT_KEY, 150).unwrap();
        assert_eq!(step_timeout(&settings, STARTUP_TIMEOUT_KEY), Duration::from_millis(150));
    }

    #[test]
    fn test_unusable_timeouts_fall_back() {
        let settings = Settings::in_memory(json!({})).unwrap();
        assert_eq!(step_timeout(&settings, STARTUP_TIMEOUT_KEY), Duration::from_millis(2000));

        for bad in [json!(-5), json!("soon"), json!(1.5)] {
            settings.set(STARTUP_TIMEOUT_KEY, bad).unwrap();
            assert_eq!(step_timeout(&settings, STARTUP_TIMEOUT_KEY), Duration::from_millis(2000));
        }
    }
}
