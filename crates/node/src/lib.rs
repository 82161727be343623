//! Cattle Node
//!
//! Glue between the topology, the key store and the external node
//! configuration toolkit. The toolkit renders deployments; this crate
//! decides which accounts and voting keys it gets.

pub mod command;
pub mod resolver;
pub mod toolkit;
pub mod update;

pub use command::CommandToolkit;
pub use resolver::{
    AccountPrompt, AccountResolver, KeyStoreAccountResolver, KeyStoreVotingKeyFiles,
    VotingKeyFileProvider,
};
pub use toolkit::{NemesisRenderRequest, NodeConfigureRequest, NodeConfigureResponse, NodeToolkit};
pub use update::{update_nodes, UpdateOptions};

use std::path::PathBuf;
use thiserror::Error;

/// Result type for node operations
pub type Result<T> = std::result::Result<T, NodeError>;

/// Node configuration errors
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("{0} is required but prompting is disabled")]
    PromptUnavailable(String),

    #[error("{role} key of {node} does not match public key {expected}")]
    KeyMismatch {
        node: String,
        role: String,
        expected: String,
    },

    #[error("node toolkit failed: {0}")]
    Toolkit(String),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    KeyStore(#[from] cattle_wallets::KeyStoreError),

    #[error(transparent)]
    Config(#[from] cattle_config::ConfigError),

    #[error(transparent)]
    Crypto(#[from] cattle_cryptography::CryptoError),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl NodeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NodeError::Io {
            path: path.into(),
            source,
        }
    }
}
