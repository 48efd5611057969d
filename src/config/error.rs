//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating `polysite.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file `{0}`")]
    Toml(PathBuf, #[source] toml::de::Error),

    #[error("No config file at `{0}`")]
    NotFound(PathBuf),

    #[error("Config validation error: {0}")]
    Validation(String),
}
