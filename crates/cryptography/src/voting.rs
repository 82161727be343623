//! Epoch-bounded voting key files.
//!
//! Header: `start u64 | end u64 | 0xFF*8 | 0xFF*8 | root public key [32] | start u64 | end u64`,
//! followed by one `child private key [32] | root signature [64]` record per
//! epoch of the inclusive range. The root signs `child public key | epoch u64`.

use crate::{Account, CryptoError, PrivateKey, PublicKey, Result};

const HEADER_SIZE: usize = 8 + 8 + 8 + 8 + 32 + 8 + 8;
const RECORD_SIZE: usize = 32 + 64;

/// Signed voting key file covering `[start_epoch, end_epoch]`.
#[derive(Clone, PartialEq, Eq)]
pub struct VotingKeyFile {
    start_epoch: u32,
    end_epoch: u32,
    public_key: PublicKey,
    bytes: Vec<u8>,
}

impl VotingKeyFile {
    /// Builds a file for `root` covering exactly `[start_epoch, end_epoch]`.
    pub fn generate(root: &Account, start_epoch: u32, end_epoch: u32) -> Result<Self> {
        if start_epoch > end_epoch {
            return Err(CryptoError::InvalidVotingKeyFile(format!(
                "invalid epoch range [{}, {}]",
                start_epoch, end_epoch
            )));
        }
        let epochs = (end_epoch - start_epoch) as usize + 1;
        let mut bytes = Vec::with_capacity(HEADER_SIZE + epochs * RECORD_SIZE);
        let (start, end) = (u64::from(start_epoch), u64::from(end_epoch));
        bytes.extend_from_slice(&start.to_le_bytes());
        bytes.extend_from_slice(&end.to_le_bytes());
        bytes.extend_from_slice(&[0xFF; 16]);
        bytes.extend_from_slice(root.public_key().as_bytes());
        bytes.extend_from_slice(&start.to_le_bytes());
        bytes.extend_from_slice(&end.to_le_bytes());

        for epoch in start..=end {
            let child = PrivateKey::generate();
            let signature = root.sign(&epoch_message(&child.public_key(), epoch))?;
            bytes.extend_from_slice(child.as_bytes());
            bytes.extend_from_slice(&signature);
        }

        Ok(Self {
            start_epoch,
            end_epoch,
            public_key: *root.public_key(),
            bytes,
        })
    }

    /// Parses and checks a stored file.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(invalid("file shorter than header"));
        }
        let read_u64 = |offset: usize| {
            let mut buffer = [0u8; 8];
            buffer.copy_from_slice(&bytes[offset..offset + 8]);
            u64::from_le_bytes(buffer)
        };
        let (start, end) = (read_u64(0), read_u64(8));
        if bytes[16..32].iter().any(|byte| *byte != 0xFF) {
            return Err(invalid("missing header marker"));
        }
        if (read_u64(64), read_u64(72)) != (start, end) {
            return Err(invalid("header epoch ranges disagree"));
        }
        let start_epoch = u32::try_from(start).map_err(|_| invalid("start epoch out of range"))?;
        let end_epoch = u32::try_from(end).map_err(|_| invalid("end epoch out of range"))?;
        if start_epoch > end_epoch {
            return Err(invalid("start epoch after end epoch"));
        }
        let expected = HEADER_SIZE + ((end_epoch - start_epoch) as usize + 1) * RECORD_SIZE;
        if bytes.len() != expected {
            return Err(invalid(&format!(
                "expected {} bytes for epochs [{}, {}], got {}",
                expected,
                start_epoch,
                end_epoch,
                bytes.len()
            )));
        }
        let mut root = [0u8; 32];
        root.copy_from_slice(&bytes[32..64]);

        Ok(Self {
            start_epoch,
            end_epoch,
            public_key: PublicKey::from_bytes(root)?,
            bytes: bytes.to_vec(),
        })
    }

    pub fn start_epoch(&self) -> u32 {
        self.start_epoch
    }

    pub fn end_epoch(&self) -> u32 {
        self.end_epoch
    }

    /// Root voting public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Verifies every per-epoch signature against the root key.
    pub fn verify(&self) -> bool {
        (u64::from(self.start_epoch)..=u64::from(self.end_epoch))
            .zip(self.bytes[HEADER_SIZE..].chunks_exact(RECORD_SIZE))
            .all(|(epoch, record)| {
                let mut child = [0u8; 32];
                child.copy_from_slice(&record[..32]);
                let mut signature = [0u8; 64];
                signature.copy_from_slice(&record[32..]);
                let child = PrivateKey::from_bytes(child).public_key();
                self.public_key
                    .verify(&epoch_message(&child, epoch), &signature)
            })
    }
}

impl std::fmt::Debug for VotingKeyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VotingKeyFile")
            .field("start_epoch", &self.start_epoch)
            .field("end_epoch", &self.end_epoch)
            .field("public_key", &self.public_key)
            .finish()
    }
}

fn epoch_message(child: &PublicKey, epoch: u64) -> Vec<u8> {
    let mut message = Vec::with_capacity(40);
    message.extend_from_slice(child.as_bytes());
    message.extend_from_slice(&epoch.to_le_bytes());
    message
}

fn invalid(reason: &str) -> CryptoError {
    CryptoError::InvalidVotingKeyFile(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_file_decodes_to_same_range() {
        let root = Account::generate(0x98);
        let file = VotingKeyFile::generate(&root, 3, 7).unwrap();
        assert_eq!(file.as_bytes().len(), HEADER_SIZE + 5 * RECORD_SIZE);

        let decoded = VotingKeyFile::decode(file.as_bytes()).unwrap();
        assert_eq!(decoded.start_epoch(), 3);
        assert_eq!(decoded.end_epoch(), 7);
        assert_eq!(decoded.public_key(), root.public_key());
        assert!(decoded.verify());
    }

    #[test]
    fn rejects_bad_ranges() {
        let root = Account::generate(0x98);
        assert!(VotingKeyFile::generate(&root, 5, 4).is_err());
        assert!(VotingKeyFile::generate(&root, 9, 9).is_ok());
    }

    #[test]
    fn rejects_truncated_and_tampered_files() {
        let root = Account::generate(0x98);
        let file = VotingKeyFile::generate(&root, 1, 2).unwrap();
        let bytes = file.as_bytes();

        assert!(VotingKeyFile::decode(&bytes[..bytes.len() - 1]).is_err());
        assert!(VotingKeyFile::decode(&bytes[..10]).is_err());

        let mut tampered = bytes.to_vec();
        tampered[72] = 9;
        assert!(VotingKeyFile::decode(&tampered).is_err());

        let mut forged = bytes.to_vec();
        let last = forged.len() - 1;
        forged[last] ^= 0x01;
        assert!(!VotingKeyFile::decode(&forged).unwrap().verify());
    }
}
