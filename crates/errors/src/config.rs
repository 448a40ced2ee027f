//! Configuration errors

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
