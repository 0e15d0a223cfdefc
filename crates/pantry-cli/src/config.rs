use std::path::PathBuf;

use pantry_core::ListKind;

/// CLI configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    /// Used when a command is not given `--kind`.
    pub default_kind: ListKind,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_path = match lookup("PANTRY_DB_PATH") {
            Some(path) if path.trim().is_empty() => {
                return Err(ConfigError::Missing("PANTRY_DB_PATH"));
            }
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("./pantry.redb"),
        };

        let default_kind = match lookup("PANTRY_DEFAULT_KIND") {
            Some(kind) => kind.parse().map_err(|_| {
                ConfigError::Invalid("PANTRY_DEFAULT_KIND", "must be meal-plan or grocery-list")
            })?,
            None => ListKind::MealPlan,
        };

        Ok(Config {
            db_path,
            default_kind,
        })
    }
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, &'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => {
                write!(f, "Environment variable is set but empty: {}", var)
            }
            ConfigError::Invalid(var, msg) => write!(f, "Invalid value for {}: {}", var, msg),
        }
    }
}

impl std::error::Error for ConfigError {}
