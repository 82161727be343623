//! Cattle Ledger
//!
//! Assembles the nemesis block of a new network: the accounts every node
//! needs, their initial balances and the signed key-link transactions, all
//! handed to the node toolkit as one descriptor.
//!
//! ## Components
//!
//! - **TransactionLedger**: key-link payloads in a stable order
//! - **BalanceSheet**: per-mosaic currency distributions
//! - **NemesisDescriptor**: everything the toolkit needs to render the block
//! - **generate_genesis**: the end-to-end assembly

pub mod balances;
pub mod descriptor;
pub mod genesis;
pub mod transactions;

pub use balances::{scale_amount, BalanceSheet, CurrencyDistribution};
pub use descriptor::{FaucetSeed, KnownPeer, MosaicDistribution, NemesisDescriptor, PeerRole};
pub use genesis::{build_descriptor, generate_genesis, GenesisOptions};
pub use transactions::{LedgerKey, TransactionLedger, MAX_NODE_NUMBER};

use std::path::PathBuf;
use thiserror::Error;

/// Result type for nemesis assembly
pub type Result<T> = std::result::Result<T, GenesisError>;

/// Nemesis assembly errors
#[derive(Error, Debug)]
pub enum GenesisError {
    #[error("the network is not flagged as a new network")]
    NotNewNetwork,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("nemesis seed already exists at {}; regenerate to replace it", .0.display())]
    AlreadyGenerated(PathBuf),

    #[error("no harvesting node can build the nemesis block")]
    NoCandidateNode,

    #[error("could not resolve {0}")]
    Unresolved(String),

    #[error("balance of {balance} {mosaic} overflows at divisibility {divisibility}")]
    BalanceOverflow {
        mosaic: String,
        balance: u64,
        divisibility: u8,
    },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    KeyStore(#[from] cattle_wallets::KeyStoreError),

    #[error(transparent)]
    Node(#[from] cattle_node::NodeError),

    #[error(transparent)]
    Config(#[from] cattle_config::ConfigError),

    #[error(transparent)]
    Crypto(#[from] cattle_cryptography::CryptoError),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GenesisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenesisError::Io {
            path: path.into(),
            source,
        }
    }
}
