//! Key-link transactions embedded in the nemesis block.
//!
//! Layout (little-endian):
//! `size u32 | reserved u32 | signature [64] | signer [32] | reserved u32 |
//!  version u8 | network u8 | type u16 | max_fee u64 | deadline u64 | body`

use std::fmt;

use crate::{Account, PublicKey, Result};

const SIGNATURE_OFFSET: usize = 8;
const SIGNER_OFFSET: usize = SIGNATURE_OFFSET + 64;
const VERIFIABLE_OFFSET: usize = SIGNER_OFFSET + 32 + 4;
const TRANSACTION_VERSION: u8 = 1;
/// Nemesis transactions carry no fee and the minimal deadline
const NEMESIS_DEADLINE: u64 = 1;

/// Transaction kinds used when linking node keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransactionKind {
    AccountKeyLink,
    VrfKeyLink,
    VotingKeyLink,
}

impl TransactionKind {
    /// Wire type code
    pub fn ordinal(&self) -> u16 {
        match self {
            TransactionKind::AccountKeyLink => 0x414C,
            TransactionKind::VrfKeyLink => 0x4243,
            TransactionKind::VotingKeyLink => 0x4143,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransactionKind::AccountKeyLink => "AccountKeyLink",
            TransactionKind::VrfKeyLink => "VrfKeyLink",
            TransactionKind::VotingKeyLink => "VotingKeyLink",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Unlink = 0,
    Link = 1,
}

/// Unsigned key-link transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLinkTransaction {
    kind: TransactionKind,
    network_identifier: u8,
    linked_public_key: PublicKey,
    epochs: Option<(u32, u32)>,
    action: LinkAction,
}

impl KeyLinkTransaction {
    /// Links a remote (harvesting) account to a main account.
    pub fn account_key_link(network_identifier: u8, linked_public_key: PublicKey) -> Self {
        Self::new(TransactionKind::AccountKeyLink, network_identifier, linked_public_key, None)
    }

    pub fn vrf_key_link(network_identifier: u8, linked_public_key: PublicKey) -> Self {
        Self::new(TransactionKind::VrfKeyLink, network_identifier, linked_public_key, None)
    }

    pub fn voting_key_link(
        network_identifier: u8,
        linked_public_key: PublicKey,
        start_epoch: u32,
        end_epoch: u32,
    ) -> Self {
        Self::new(
            TransactionKind::VotingKeyLink,
            network_identifier,
            linked_public_key,
            Some((start_epoch, end_epoch)),
        )
    }

    fn new(
        kind: TransactionKind,
        network_identifier: u8,
        linked_public_key: PublicKey,
        epochs: Option<(u32, u32)>,
    ) -> Self {
        Self {
            kind,
            network_identifier,
            linked_public_key,
            epochs,
            action: LinkAction::Link,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    fn body(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(41);
        body.extend_from_slice(self.linked_public_key.as_bytes());
        if let Some((start, end)) = self.epochs {
            body.extend_from_slice(&start.to_le_bytes());
            body.extend_from_slice(&end.to_le_bytes());
        }
        body.push(self.action as u8);
        body
    }

    /// Serializes and signs with `signer` against the network's generation hash seed.
    pub fn sign(&self, signer: &Account, generation_hash_seed: &[u8; 32]) -> Result<SignedTransaction> {
        let body = self.body();
        let size = VERIFIABLE_OFFSET + 20 + body.len();

        let mut payload = Vec::with_capacity(size);
        payload.extend_from_slice(&(size as u32).to_le_bytes());
        payload.extend_from_slice(&0u32.to_le_bytes());
        payload.extend_from_slice(&[0u8; 64]);
        payload.extend_from_slice(signer.public_key().as_bytes());
        payload.extend_from_slice(&0u32.to_le_bytes());
        payload.push(TRANSACTION_VERSION);
        payload.push(self.network_identifier);
        payload.extend_from_slice(&self.kind.ordinal().to_le_bytes());
        payload.extend_from_slice(&0u64.to_le_bytes());
        payload.extend_from_slice(&NEMESIS_DEADLINE.to_le_bytes());
        payload.extend_from_slice(&body);

        let signature = signer.sign(&signing_data(generation_hash_seed, &payload))?;
        payload[SIGNATURE_OFFSET..SIGNER_OFFSET].copy_from_slice(&signature);

        Ok(SignedTransaction {
            kind: self.kind,
            payload,
        })
    }
}

fn signing_data(generation_hash_seed: &[u8; 32], payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(32 + payload.len() - VERIFIABLE_OFFSET);
    data.extend_from_slice(generation_hash_seed);
    data.extend_from_slice(&payload[VERIFIABLE_OFFSET..]);
    data
}

/// Serialized, signed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    kind: TransactionKind,
    payload: Vec<u8>,
}

impl SignedTransaction {
    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Upper-case hex payload, as stored in the nemesis ledger.
    pub fn payload_hex(&self) -> String {
        hex::encode_upper(&self.payload)
    }

    /// Checks the embedded signature against the embedded signer.
    pub fn verify(&self, generation_hash_seed: &[u8; 32]) -> bool {
        if self.payload.len() < VERIFIABLE_OFFSET {
            return false;
        }
        let mut signer = [0u8; 32];
        signer.copy_from_slice(&self.payload[SIGNER_OFFSET..SIGNER_OFFSET + 32]);
        let mut signature = [0u8; 64];
        signature.copy_from_slice(&self.payload[SIGNATURE_OFFSET..SIGNER_OFFSET]);
        match PublicKey::from_bytes(signer) {
            Ok(signer) => signer.verify(&signing_data(generation_hash_seed, &self.payload), &signature),
            Err(_) => false,
        }
    }
}
