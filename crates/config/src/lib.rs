//! Cattle Configuration Module
//!
//! Data model shared by every cattle crate:
//! - the compact user input (`NetworkInputFile`)
//! - the expanded topology (`NetworkFile` / `NodeInformation`)
//! - the compiled-in node-type catalog
//! - base network presets and custom preset merging
//! - YAML persistence helpers

pub mod error;
pub mod input;
pub mod node_type;
pub mod preset;
pub mod topology;
pub mod yaml;

pub use error::{ConfigError, Result};
pub use input::{
    AdditionalDistribution, MosaicInput, NetworkDefinition, NetworkInputFile, NodeTypeInput,
    RestProtocol,
};
pub use node_type::{NodeType, NodeTypeMetadata};
pub use preset::{MosaicPreset, NetworkPreset};
pub use topology::{AccountAddress, NetworkFile, NodeAddresses, NodeInformation, VotingAddress};

/// Default input file name inside a working directory
pub const INPUT_FILE_NAME: &str = "network-input.yml";
/// Default topology file name inside a working directory
pub const NETWORK_FILE_NAME: &str = "network.yml";
/// Default key store file name inside a working directory
pub const KEY_STORE_FILE_NAME: &str = "key-store.yml";
/// Directory holding the materialized nemesis seed
pub const NEMESIS_SEED_DIR: &str = "nemesis-seed";
/// Scratch directory used while rendering the nemesis block
pub const NEMESIS_WORK_DIR: &str = "nemesis";
/// Nemesis descriptor file name inside [`NEMESIS_WORK_DIR`]
pub const NEMESIS_DESCRIPTOR_FILE_NAME: &str = "nemesis-descriptor.yml";
/// Per-node output directory inside a working directory
pub const NODES_DIR: &str = "nodes";

/// Default friendly name template
pub const DEFAULT_FRIENDLY_NAME_TEMPLATE: &str = "$nickname-$friendlyNumber-$suffix";

/// REST gateway ports
pub const HTTP_REST_PORT: u16 = 3000;
pub const HTTPS_REST_PORT: u16 = 3001;
/// Peer-to-peer port
pub const PEER_PORT: u16 = 7900;
/// Explorer port for demo nodes
pub const EXPLORER_PORT: u16 = 90;

/// Size of a generation hash seed in bytes
pub const GENERATION_HASH_SEED_SIZE: usize = 32;
