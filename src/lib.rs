//! # Cattle
//!
//! Provisioning and bootstrap for clusters of blockchain nodes:
//!
//! - **config**: input file, topology and preset data model
//! - **cryptography**: accounts, key-link transactions and voting key files
//! - **wallets**: the key store every secret lives in
//! - **network**: node-type catalog and topology expansion
//! - **node**: the node toolkit seam and node update
//! - **ledger**: nemesis block assembly
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cattle::config::NetworkInputFile;
//! use cattle::network::expand_to_file;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let input = NetworkInputFile::load(Path::new("network-input.yml"))?;
//! let topology = expand_to_file(&input, Path::new("network.yml"), false)?;
//! println!("{} nodes", topology.nodes.len());
//! # Ok(())
//! # }
//! ```

pub use cattle_config as config;
pub use cattle_cryptography as cryptography;
pub use cattle_ledger as ledger;
pub use cattle_network as network;
pub use cattle_node as node;
pub use cattle_wallets as wallets;

/// Commonly used types
pub mod prelude {
    pub use crate::config::{NetworkFile, NetworkInputFile, NetworkPreset, NodeInformation, NodeType};
    pub use crate::ledger::{generate_genesis, GenesisOptions, NemesisDescriptor};
    pub use crate::network::{expand, expand_to_file};
    pub use crate::node::{update_nodes, NodeToolkit, UpdateOptions};
    pub use crate::wallets::{KeyStore, KeyStoreOptions, LazyKeyStore, SecretStore};
}
