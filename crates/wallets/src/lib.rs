//! Cattle Wallets Library
//!
//! Owns every secret of a cattle network:
//! - network accounts (nemesis signer, founder, faucet, fee sinks)
//! - per-node accounts (main, transport, VRF, remote)
//! - time-boxed voting key files
//!
//! Once a key exists it is returned unchanged by every later lookup. Every
//! mutation rewrites the whole document, encrypted when a password is set.

pub mod encryption;
pub mod key_store;
pub mod lazy;
pub mod secret_store;
pub mod storage;
pub mod verify;

pub use encryption::ScryptParamsConfig;
pub use key_store::{KeyStore, KeyStoreOptions, StoreMode};
pub use lazy::LazyKeyStore;
pub use secret_store::SecretStore;
pub use storage::{
    KeyStorage, NetworkAccountRole, NodeKeyRole, StoredAccount, StoredNodeKeys, StoredVotingFile,
};
pub use verify::{verify_keys, KeyVerificationReport};

use std::path::PathBuf;
use thiserror::Error;

/// Minimum length of a non-empty key store password
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Result type for key store operations
pub type Result<T> = std::result::Result<T, KeyStoreError>;

/// Key store errors
#[derive(Error, Debug)]
pub enum KeyStoreError {
    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("voting key file for {node} covers epochs {stored:?}, requested {requested:?}")]
    EpochMismatch {
        node: String,
        requested: (u32, u32),
        stored: (u32, u32),
    },

    #[error("key store file not found: {}", .0.display())]
    StoreNotFound(PathBuf),

    #[error("key store {} was modified by another process", .0.display())]
    ConcurrentModification(PathBuf),

    #[error("key store is encrypted; a password is required")]
    PasswordRequired,

    #[error("could not read the key store password: {0}")]
    PasswordPrompt(#[source] std::io::Error),

    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    #[error("invalid key store password")]
    InvalidPassword,

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("invalid key store document: {0}")]
    InvalidDocument(String),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("cryptography error: {0}")]
    Crypto(#[from] cattle_cryptography::CryptoError),
}

impl KeyStoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KeyStoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Checks the password policy. Empty passwords mean "no encryption".
pub fn validate_password(password: &str) -> Result<()> {
    if !password.is_empty() && password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(KeyStoreError::PasswordTooShort);
    }
    Ok(())
}
