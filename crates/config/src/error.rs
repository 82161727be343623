use std::path::PathBuf;

use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}
