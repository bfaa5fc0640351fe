//! Environment configuration helpers
//!
//! Values come from the process environment, optionally seeded from a
//! `.env` file. Empty values count as unset.

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading configuration from the environment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("Environment variable {0} is not set")]
    Missing(String),

    /// A variable is set but cannot be parsed
    #[error("Environment variable {key} has invalid value '{value}': {detail}")]
    Invalid {
        key: String,
        value: String,
        detail: String,
    },
}

/// Load a `.env` file from the working directory or its parents
///
/// Variables already present in the environment are not overridden.
/// Returns the path of the loaded file, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "Loaded .env file");
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unreadable .env file");
            None
        }
    }
}

/// Read a variable, treating empty or whitespace-only values as unset
pub fn var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Read a required variable
pub fn required(key: &str) -> Result<String, ConfigError> {
    var(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
}

/// Parse a variable when it is set
pub fn parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|value| {
            value.parse::<T>().map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                detail: e.to_string(),
                value,
            })
        })
        .transpose()
}

/// Parse a variable, falling back to `default` when unset
pub fn parse_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse(key)?.unwrap_or(default))
}
