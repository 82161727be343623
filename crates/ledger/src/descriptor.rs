//! Nemesis descriptor handed to the node toolkit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::{CurrencyDistribution, Result, TransactionLedger};

/// Role a node announces to its peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PeerRole {
    Api,
    Peer,
    Voting,
}

/// Bootstrap peer entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownPeer {
    pub public_key: String,
    pub host: String,
    pub port: u16,
    pub roles: Vec<PeerRole>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicDistribution {
    pub name: String,
    pub divisibility: u8,
    /// Accounts owning the mosaic definition
    pub accounts: Vec<String>,
    pub currency_distributions: Vec<CurrencyDistribution>,
}

/// Faucet seeding data; `repeat` is zero when there is no faucet account.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaucetSeed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    pub repeat: u32,
}

impl fmt::Debug for FaucetSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaucetSeed")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("repeat", &self.repeat)
            .finish()
    }
}

/// Everything needed to render the nemesis block.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NemesisDescriptor {
    pub nemesis_signer_private_key: String,
    pub generation_hash_seed: String,
    pub mosaics: Vec<MosaicDistribution>,
    pub transactions: TransactionLedger,
    pub faucet: FaucetSeed,
    pub known_peers: Vec<KnownPeer>,
    pub known_rest_gateways: Vec<String>,
    /// Node whose configuration builds the block
    pub candidate_node_number: u32,
}

impl NemesisDescriptor {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(cattle_config::yaml::load(path)?)
    }

    /// Writes the descriptor; it carries private keys, so on unix the file
    /// is created readable by the owner only.
    pub fn save(&self, path: &Path) -> Result<()> {
        Ok(cattle_config::yaml::save_private(path, self)?)
    }

    pub fn total_distributions(&self) -> usize {
        self.mosaics
            .iter()
            .map(|mosaic| mosaic.currency_distributions.len())
            .sum()
    }
}

impl fmt::Debug for NemesisDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NemesisDescriptor")
            .field("nemesis_signer_private_key", &"<redacted>")
            .field("generation_hash_seed", &self.generation_hash_seed)
            .field("mosaics", &self.mosaics)
            .field("transactions", &self.transactions.len())
            .field("faucet", &self.faucet)
            .field("known_peers", &self.known_peers)
            .field("known_rest_gateways", &self.known_rest_gateways)
            .field("candidate_node_number", &self.candidate_node_number)
            .finish()
    }
}
