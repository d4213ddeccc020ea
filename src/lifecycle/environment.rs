//! Run mode classification.

use std::fmt;
use std::str::FromStr;

/// Process variable consulted when no environment is passed explicitly.
pub const ENVIRONMENT_VAR: &str = "APP_ENV";

/// Three-way run mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    /// Explicit value, then `APP_ENV`, then development.
    pub fn resolve(explicit: Option<&str>) -> Self {
        explicit
            .map(str::to_string)
            .or_else(|| std::env::var(ENVIRONMENT_VAR).ok())
            .map(|name| name.parse().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    /// Anything unrecognized is development.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "test" | "testing" => Self::Test,
            _ => Self::Development,
        })
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("test".parse::<Environment>().unwrap(), Environment::Test);
        assert_eq!("staging".parse::<Environment>().unwrap(), Environment::Development);
    }

    // Only this test touches APP_ENV, so the set/unset sequence stays in one place.
    #[test]
    fn test_resolution_order() {
        std::env::set_var(ENVIRONMENT_VAR, "production");
        assert_eq!(Environment::resolve(None), Environment::Production);
        assert_eq!(Environment::resolve(Some("test")), Environment::Test);

        std::env::set_var(ENVIRONMENT_VAR, "testing");
        assert_eq!(Environment::resolve(None), Environment::Test);

        std::env::remove_var(ENVIRONMENT_VAR);
        assert_eq!(Environment::resolve(None), Environment::Development);
        assert_eq!(Environment::resolve(Some("production")), Environment::Production);
    }
}
