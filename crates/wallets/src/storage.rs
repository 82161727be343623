//! Persisted key store document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use zeroize::Zeroize;

/// Network-level account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkAccountRole {
    NemesisSigner,
    Founder,
    Faucet,
    HarvestNetworkFeeSink,
    NamespaceRentalFeeSink,
    MosaicRentalFeeSink,
}

impl fmt::Display for NetworkAccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NetworkAccountRole::NemesisSigner => "nemesisSigner",
            NetworkAccountRole::Founder => "founder",
            NetworkAccountRole::Faucet => "faucet",
            NetworkAccountRole::HarvestNetworkFeeSink => "harvestNetworkFeeSink",
            NetworkAccountRole::NamespaceRentalFeeSink => "namespaceRentalFeeSink",
            NetworkAccountRole::MosaicRentalFeeSink => "mosaicRentalFeeSink",
        };
        f.write_str(name)
    }
}

/// Per-node key roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKeyRole {
    Main,
    Transport,
    Remote,
    Vrf,
}

impl fmt::Display for NodeKeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKeyRole::Main => "main",
            NodeKeyRole::Transport => "transport",
            NodeKeyRole::Remote => "remote",
            NodeKeyRole::Vrf => "vrf",
        };
        f.write_str(name)
    }
}

/// Stored key material for one account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAccount {
    pub private_key: String,
    pub public_key: String,
}

impl fmt::Debug for StoredAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredAccount")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Keys of one node, addressed by `(name, number)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredNodeKeys {
    pub name: String,
    pub number: u32,
    #[serde(default)]
    pub keys: BTreeMap<NodeKeyRole, StoredAccount>,
}

/// Voting key file of one node, addressed by `(name, number, start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredVotingFile {
    pub name: String,
    pub number: u32,
    pub start_epoch: u32,
    pub end_epoch: u32,
    pub public_key: String,
    /// Base64 encoded file bytes
    pub file: String,
}

impl StoredVotingFile {
    pub fn belongs_to(&self, name: &str, number: u32) -> bool {
        self.name == name && self.number == number
    }
}

/// The whole key store document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStorage {
    #[serde(default)]
    pub network: BTreeMap<NetworkAccountRole, StoredAccount>,
    #[serde(default)]
    pub nodes: Vec<StoredNodeKeys>,
    #[serde(default)]
    pub voting_files: Vec<StoredVotingFile>,
}

impl KeyStorage {
    pub fn node(&self, name: &str, number: u32) -> Option<&StoredNodeKeys> {
        self.nodes
            .iter()
            .find(|node| node.name == name && node.number == number)
    }

    pub fn node_mut(&mut self, name: &str, number: u32) -> &mut StoredNodeKeys {
        let index = match self
            .nodes
            .iter()
            .position(|node| node.name == name && node.number == number)
        {
            Some(index) => index,
            None => {
                self.nodes.push(StoredNodeKeys {
                    name: name.to_string(),
                    number,
                    keys: BTreeMap::new(),
                });
                self.nodes.len() - 1
            }
        };
        &mut self.nodes[index]
    }

    pub fn voting_files_of<'a>(
        &'a self,
        name: &'a str,
        number: u32,
    ) -> impl Iterator<Item = &'a StoredVotingFile> + 'a {
        self.voting_files
            .iter()
            .filter(move |file| file.belongs_to(name, number))
    }

    pub fn is_empty(&self) -> bool {
        self.network.is_empty() && self.nodes.is_empty() && self.voting_files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_mut_creates_once() {
        let mut storage = KeyStorage::default();
        storage.node_mut("peer-01", 1);
        storage.node_mut("peer-01", 1);
        storage.node_mut("peer-01", 2);
        assert_eq!(storage.nodes.len(), 2);
        assert!(storage.node("peer-01", 2).is_some());
        assert!(storage.node("peer-02", 1).is_none());
    }

    #[test]
    fn document_uses_readable_keys() {
        let mut storage = KeyStorage::default();
        storage.network.insert(
            NetworkAccountRole::NemesisSigner,
            StoredAccount {
                private_key: "AA".into(),
                public_key: "BB".into(),
            },
        );
        storage.node_mut("dual-01", 1).keys.insert(
            NodeKeyRole::Vrf,
            StoredAccount {
                private_key: "CC".into(),
                public_key: "DD".into(),
            },
        );
        let text = serde_yaml::to_string(&storage).unwrap();
        assert!(text.contains("nemesisSigner:"));
        assert!(text.contains("vrf:"));
        assert_eq!(serde_yaml::from_str::<KeyStorage>(&text).unwrap(), storage);
    }

    #[test]
    fn debug_hides_private_keys() {
        let account = StoredAccount {
            private_key: "SECRET".into(),
            public_key: "PUBLIC".into(),
        };
        let text = format!("{:?}", account);
        assert!(!text.contains("SECRET"));
        assert!(text.contains("PUBLIC"));
    }
}
