//! Nemesis transaction ledger.
//!
//! Entries are keyed by `(type ordinal, type name, node number)` and kept in
//! a sorted map, so the serialized ledger has the same key order on every
//! run. The string form is `"{ordinal}_{name}_{number:05}"`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use cattle_cryptography::SignedTransaction;

use crate::GenesisError;

/// Highest node number a ledger key can hold. Up to five digits the numeric
/// order of keys is the order of their string form.
pub const MAX_NODE_NUMBER: u32 = 99_999;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LedgerKey {
    pub ordinal: u16,
    pub name: String,
    pub node_number: u32,
}

impl LedgerKey {
    pub fn new(transaction: &SignedTransaction, node_number: u32) -> Self {
        let kind = transaction.kind();
        Self {
            ordinal: kind.ordinal(),
            name: kind.name().to_string(),
            node_number,
        }
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{:05}", self.ordinal, self.name, self.node_number)
    }
}

impl FromStr for LedgerKey {
    type Err = GenesisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GenesisError::Validation(format!("invalid ledger key: {}", s));
        let mut parts = s.splitn(3, '_');
        let (Some(ordinal), Some(name), Some(number)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        let node_number: u32 = number.parse().map_err(|_| invalid())?;
        if node_number > MAX_NODE_NUMBER {
            return Err(invalid());
        }
        Ok(Self {
            ordinal: ordinal.parse().map_err(|_| invalid())?,
            name: name.to_string(),
            node_number,
        })
    }
}

impl Serialize for LedgerKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LedgerKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Signed payloads (upper-case hex) of every nemesis transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionLedger(BTreeMap<LedgerKey, String>);

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `transaction` for `node_number`, replacing an earlier entry
    /// of the same kind for that node.
    pub fn insert(&mut self, node_number: u32, transaction: &SignedTransaction) -> LedgerKey {
        let key = LedgerKey::new(transaction, node_number);
        self.0.insert(key.clone(), transaction.payload_hex());
        key
    }

    pub fn get(&self, key: &LedgerKey) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &LedgerKey> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cattle_cryptography::{Account, KeyLinkTransaction, PrivateKey};

    fn signed(node: u8) -> (SignedTransaction, SignedTransaction) {
        let main = Account::from_private_key(PrivateKey::from_bytes([node; 32]), 0x98);
        let linked = PrivateKey::from_bytes([node + 100; 32]).public_key();
        let seed = [7u8; 32];
        (
            KeyLinkTransaction::vrf_key_link(0x98, linked).sign(&main, &seed).unwrap(),
            KeyLinkTransaction::account_key_link(0x98, linked).sign(&main, &seed).unwrap(),
        )
    }

    #[test]
    fn key_format_is_zero_padded() {
        let (vrf, _) = signed(1);
        assert_eq!(LedgerKey::new(&vrf, 7).to_string(), "16963_VrfKeyLink_00007");
        let parsed: LedgerKey = "16963_VrfKeyLink_00007".parse().unwrap();
        assert_eq!(parsed, LedgerKey::new(&vrf, 7));
        assert!("VrfKeyLink_7".parse::<LedgerKey>().is_err());
        assert!("16963_VrfKeyLink_100000".parse::<LedgerKey>().is_err());
    }

    #[test]
    fn serialized_order_groups_by_kind_then_node() {
        let mut ledger = TransactionLedger::new();
        for node in [12u8, 3, 1] {
            let (vrf, remote) = signed(node);
            ledger.insert(u32::from(node), &vrf);
            ledger.insert(u32::from(node), &remote);
        }

        let yaml = serde_yaml::to_string(&ledger).unwrap();
        let keys: Vec<&str> = yaml
            .lines()
            .filter_map(|line| line.split(':').next())
            .collect();
        assert_eq!(
            keys,
            vec![
                "16716_AccountKeyLink_00001",
                "16716_AccountKeyLink_00003",
                "16716_AccountKeyLink_00012",
                "16963_VrfKeyLink_00001",
                "16963_VrfKeyLink_00003",
                "16963_VrfKeyLink_00012",
            ]
        );

        let parsed: TransactionLedger = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, ledger);
    }
}
