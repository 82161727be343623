//! Expanded network topology.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

use crate::{
    yaml, NetworkDefinition, NetworkPreset, NodeType, NodeTypeMetadata, RestProtocol, Result,
    EXPLORER_PORT, HTTPS_REST_PORT, HTTP_REST_PORT, PEER_PORT,
};

/// Resolved on-chain identity of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAddress {
    pub address: String,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

/// Voting account bound to an epoch range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingAddress {
    pub public_key: String,
    pub start_epoch: u32,
    pub end_epoch: u32,
}

/// Accounts resolved for a node once it is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAddresses {
    pub main: AccountAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<AccountAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrf: Option<AccountAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<AccountAddress>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub voting: Vec<VotingAddress>,
}

impl NodeAddresses {
    fn strip_private_keys(&mut self) {
        self.main.private_key = None;
        for account in [&mut self.transport, &mut self.vrf, &mut self.remote]
            .into_iter()
            .flatten()
        {
            account.private_key = None;
        }
    }
}

/// One physical node of the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInformation {
    pub number: u32,
    pub node_type: NodeType,
    pub nickname: String,
    pub friendly_name: String,
    pub hostname: String,
    pub assembly: String,
    #[serde(default)]
    pub balances: Vec<u64>,
    #[serde(default)]
    pub rest_protocol: RestProtocol,
    /// Per-node configuration override handed to the node toolkit
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub custom_preset: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<NodeAddresses>,
}

impl NodeInformation {
    pub fn metadata(&self) -> &'static NodeTypeMetadata {
        self.node_type.metadata()
    }

    /// REST endpoint other components should use to reach this node.
    pub fn rest_url(&self) -> String {
        if self.rest_protocol.https_enabled() {
            format!("https://{}:{}", self.hostname, HTTPS_REST_PORT)
        } else {
            format!("http://{}:{}", self.hostname, HTTP_REST_PORT)
        }
    }

    pub fn explorer_url(&self) -> String {
        format!("http://{}:{}/", self.hostname, EXPLORER_PORT)
    }

    pub fn peer_endpoint(&self) -> (String, u16) {
        (self.hostname.clone(), PEER_PORT)
    }

    /// Voting key lifetime in epochs: node override, else the preset's.
    pub fn voting_key_lifetime(&self, preset: &NetworkPreset) -> Option<u32> {
        self.override_u32("votingKeyDesiredLifetime")
            .or(preset.voting_key_desired_lifetime)
    }

    /// Integer override stored in the node's custom preset.
    pub fn override_u32(&self, key: &str) -> Option<u32> {
        self.custom_preset
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|value| u32::try_from(value).ok())
    }
}

/// Topology produced by expansion and refined by later steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFile {
    #[serde(flatten)]
    pub network: NetworkDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nemesis_seed_folder: Option<PathBuf>,
    pub nodes: Vec<NodeInformation>,
}

impl NetworkFile {
    pub fn load(path: &Path) -> Result<Self> {
        yaml::load(path)
    }

    /// Writes the topology with every private-key-bearing field removed.
    pub fn save(&self, path: &Path) -> Result<()> {
        yaml::save(path, &self.without_private_keys())
    }

    /// Copy of the topology safe to write to disk.
    pub fn without_private_keys(&self) -> NetworkFile {
        let mut stripped = self.clone();
        for node in &mut stripped.nodes {
            if let Some(addresses) = node.addresses.as_mut() {
                addresses.strip_private_keys();
            }
            yaml::strip_private_keys(&mut node.custom_preset);
        }
        stripped
    }

    pub fn node(&self, number: u32) -> Option<&NodeInformation> {
        self.nodes.iter().find(|node| node.number == number)
    }
}
