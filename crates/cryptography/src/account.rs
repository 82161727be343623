//! Accounts and network-bound addresses.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{hash, CryptoError, PrivateKey, PublicKey, Result};

const CHECKSUM_SIZE: usize = 4;
const RAW_ADDRESS_SIZE: usize = 1 + 20 + CHECKSUM_SIZE;

/// Base58 address: network byte, public key hash and a 4-byte checksum.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    encoded: String,
    network_identifier: u8,
}

impl Address {
    pub fn from_public_key(public_key: &PublicKey, network_identifier: u8) -> Self {
        let mut raw = Vec::with_capacity(RAW_ADDRESS_SIZE);
        raw.push(network_identifier);
        raw.extend_from_slice(&hash::public_key_hash(public_key.as_bytes()));
        let checksum = hash::sha3_256(&raw);
        raw.extend_from_slice(&checksum[..CHECKSUM_SIZE]);
        Self {
            encoded: bs58::encode(raw).into_string(),
            network_identifier,
        }
    }

    pub fn network_identifier(&self) -> u8 {
        self.network_identifier
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = bs58::decode(s.trim())
            .into_vec()
            .map_err(|err| CryptoError::InvalidAddress(format!("{}: {}", s, err)))?;
        if raw.len() != RAW_ADDRESS_SIZE {
            return Err(CryptoError::InvalidAddress(format!("{}: wrong length", s)));
        }
        let (body, checksum) = raw.split_at(RAW_ADDRESS_SIZE - CHECKSUM_SIZE);
        if hash::sha3_256(body)[..CHECKSUM_SIZE] != *checksum {
            return Err(CryptoError::InvalidAddress(format!("{}: bad checksum", s)));
        }
        Ok(Self {
            encoded: s.trim().to_string(),
            network_identifier: body[0],
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encoded)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// An on-chain account. Public-only accounts can be addressed but not sign.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    private_key: Option<PrivateKey>,
    public_key: PublicKey,
    address: Address,
}

impl Account {
    /// Fresh random account.
    pub fn generate(network_identifier: u8) -> Self {
        Self::from_private_key(PrivateKey::generate(), network_identifier)
    }

    pub fn from_private_key(private_key: PrivateKey, network_identifier: u8) -> Self {
        let public_key = private_key.public_key();
        Self {
            address: Address::from_public_key(&public_key, network_identifier),
            private_key: Some(private_key),
            public_key,
        }
    }

    pub fn from_private_key_hex(value: &str, network_identifier: u8) -> Result<Self> {
        Ok(Self::from_private_key(
            PrivateKey::from_hex(value)?,
            network_identifier,
        ))
    }

    pub fn from_public_key(public_key: PublicKey, network_identifier: u8) -> Self {
        Self {
            address: Address::from_public_key(&public_key, network_identifier),
            private_key: None,
            public_key,
        }
    }

    pub fn private_key(&self) -> Option<&PrivateKey> {
        self.private_key.as_ref()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn can_sign(&self) -> bool {
        self.private_key.is_some()
    }

    pub fn sign(&self, message: &[u8]) -> Result<[u8; 64]> {
        let private_key = self
            .private_key
            .as_ref()
            .ok_or_else(|| CryptoError::MissingPrivateKey(self.address.to_string()))?;
        Ok(private_key.sign(message))
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("public_key", &self.public_key)
            .field("can_sign", &self.can_sign())
            .finish()
    }
}
