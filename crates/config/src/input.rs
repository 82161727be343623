//! User-declared network intent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{yaml, ConfigError, NodeType, Result, DEFAULT_FRIENDLY_NAME_TEMPLATE};

/// How an API node exposes its REST gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestProtocol {
    HttpOnly,
    #[default]
    HttpsOnly,
    Both,
}

impl RestProtocol {
    pub fn https_enabled(&self) -> bool {
        matches!(self, RestProtocol::HttpsOnly | RestProtocol::Both)
    }

    pub fn http_enabled(&self) -> bool {
        matches!(self, RestProtocol::HttpOnly | RestProtocol::Both)
    }
}

impl fmt::Display for RestProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestProtocol::HttpOnly => write!(f, "httpOnly"),
            RestProtocol::HttpsOnly => write!(f, "httpsOnly"),
            RestProtocol::Both => write!(f, "both"),
        }
    }
}

impl FromStr for RestProtocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "httponly" | "http" => Ok(RestProtocol::HttpOnly),
            "httpsonly" | "https" => Ok(RestProtocol::HttpsOnly),
            "both" => Ok(RestProtocol::Both),
            _ => Err(ConfigError::Validation(format!(
                "unknown rest protocol: {}",
                s
            ))),
        }
    }
}

/// Per-mosaic overrides for a new network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divisibility: Option<u8>,
}

/// Extra balance handed out in the nemesis block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalDistribution {
    pub mosaic_index: usize,
    pub address: String,
    pub amount: u64,
}

/// One group of identical nodes requested by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeInput {
    pub node_type: NodeType,
    pub nickname: String,
    pub count: u32,
    /// Whole-unit balance per mosaic for every node of the group
    #[serde(default)]
    pub balances: Vec<u64>,
    #[serde(default)]
    pub rest_protocol: RestProtocol,
}

impl NodeTypeInput {
    /// Group seeded from the catalog defaults.
    pub fn from_catalog(node_type: NodeType, count: u32) -> Self {
        let metadata = node_type.metadata();
        Self {
            node_type,
            nickname: metadata.nickname.to_string(),
            count,
            balances: metadata.balances.to_vec(),
            rest_protocol: RestProtocol::default(),
        }
    }
}

/// Network-level fields carried from the input file into the topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDefinition {
    pub is_new_network: bool,
    /// Base preset name (`mainnet`, `testnet`)
    pub preset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_preset: Option<PathBuf>,
    pub domain: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default = "default_template")]
    pub friendly_name_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_hash_seed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mosaics: Vec<MosaicInput>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faucet_balances: Vec<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_currency_distributions: Vec<AdditionalDistribution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_key_desired_lifetime: Option<u32>,
}

fn default_template() -> String {
    DEFAULT_FRIENDLY_NAME_TEMPLATE.to_string()
}

impl NetworkDefinition {
    pub fn new(preset: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            is_new_network: false,
            preset: preset.into(),
            custom_preset: None,
            domain: domain.into(),
            suffix: String::new(),
            friendly_name_template: default_template(),
            network_description: None,
            generation_hash_seed: None,
            base_namespace: None,
            mosaics: Vec::new(),
            faucet_balances: Vec::new(),
            additional_currency_distributions: Vec::new(),
            voting_key_desired_lifetime: None,
        }
    }

    /// Checks the fields a new network cannot be created without.
    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(ConfigError::Validation("domain cannot be empty".into()));
        }
        if !self.friendly_name_template.contains("$friendlyNumber") {
            tracing::warn!(
                target: "cattle",
                template = %self.friendly_name_template,
                "friendly name template has no $friendlyNumber; names may collide"
            );
        }
        if !self.is_new_network {
            return Ok(());
        }

        let missing = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());
        if missing(&self.network_description) {
            return Err(ConfigError::Validation(
                "networkDescription is required for a new network".into(),
            ));
        }
        if missing(&self.base_namespace) {
            return Err(ConfigError::Validation(
                "baseNamespace is required for a new network".into(),
            ));
        }
        match self.generation_hash_seed.as_deref() {
            Some(seed) if is_hash_seed(seed) => {}
            Some(seed) => {
                return Err(ConfigError::Validation(format!(
                    "generationHashSeed must be {} hex characters, got '{}'",
                    crate::GENERATION_HASH_SEED_SIZE * 2,
                    seed
                )))
            }
            None => {
                return Err(ConfigError::Validation(
                    "generationHashSeed is required for a new network".into(),
                ))
            }
        }
        Ok(())
    }
}

fn is_hash_seed(seed: &str) -> bool {
    seed.len() == crate::GENERATION_HASH_SEED_SIZE * 2 && hex::decode(seed).is_ok()
}

/// Compact description of the network a user wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInputFile {
    #[serde(flatten)]
    pub network: NetworkDefinition,
    pub node_types: Vec<NodeTypeInput>,
}

impl NetworkInputFile {
    pub fn load(path: &Path) -> Result<Self> {
        yaml::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        yaml::save(path, self)
    }

    /// Validates the network fields and every node group.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        if self.node_types.is_empty() {
            return Err(ConfigError::Validation(
                "at least one node type group is required".into(),
            ));
        }
        for group in &self.node_types {
            if group.count == 0 {
                return Err(ConfigError::Validation(format!(
                    "node type group '{}' ({}) must have a count of at least 1",
                    group.nickname, group.node_type
                )));
            }
            if group.nickname.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "node type group {} has an empty nickname",
                    group.node_type
                )));
            }
        }
        Ok(())
    }
}
