use std::path::PathBuf;

use cattle_config::ConfigError;
use thiserror::Error;

/// Result type for topology operations
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Topology errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("duplicate {field} '{value}' in expanded topology")]
    DuplicateIdentifier { field: &'static str, value: String },

    #[error("{} already exists, use --force to overwrite", .0.display())]
    AlreadyExists(PathBuf),

    #[error(transparent)]
    Config(ConfigError),
}

impl From<ConfigError> for NetworkError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation(message) => NetworkError::Validation(message),
            other => NetworkError::Config(other),
        }
    }
}
