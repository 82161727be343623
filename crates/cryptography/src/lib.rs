//! Cattle Cryptography
//!
//! The small slice of the target chain's SDK the bootstrapper needs:
//! - Ed25519 key pairs and accounts with network-bound addresses
//! - key-link and voting-link transactions signed against a generation hash seed
//! - epoch-bounded voting key files

pub mod account;
pub mod hash;
pub mod keys;
pub mod transaction;
pub mod voting;

pub use account::{Account, Address};
pub use keys::{PrivateKey, PublicKey};
pub use transaction::{KeyLinkTransaction, LinkAction, SignedTransaction, TransactionKind};
pub use voting::VotingKeyFile;

use thiserror::Error;

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Cryptography errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("account {0} has no private key")]
    MissingPrivateKey(String),

    #[error("invalid voting key file: {0}")]
    InvalidVotingKeyFile(String),

    #[error("invalid generation hash seed: {0}")]
    InvalidHashSeed(String),
}

/// Parses a 32-byte hex generation hash seed.
pub fn parse_hash_seed(seed: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(seed).map_err(|err| CryptoError::InvalidHashSeed(err.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidHashSeed(format!("expected 32 bytes: {}", seed)))
}

/// Fresh random generation hash seed, upper-case hex.
pub fn random_hash_seed() -> String {
    use rand::RngCore;
    let mut seed = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut seed);
    hex::encode_upper(seed)
}
