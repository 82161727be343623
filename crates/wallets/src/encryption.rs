//! Password-based sealing of the key store document.
//!
//! A scrypt-derived key seals the serialized document with AES-256-GCM. The
//! salt and KDF parameters travel in the envelope. A fresh nonce is drawn for
//! every write.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{KeyStoreError, Result};

/// Envelope format version
pub const ENVELOPE_VERSION: u8 = 1;

const SALT_SIZE: usize = 16;
const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;
const AAD: &[u8] = b"cattle-key-store";

/// Scrypt cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScryptParamsConfig {
    /// CPU/memory cost, a power of two
    pub n: u32,
    pub r: u32,
    pub p: u32,
}

impl ScryptParamsConfig {
    /// Very cheap parameters for tests
    pub fn fast() -> Self {
        Self { n: 1024, r: 8, p: 1 }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n <= 1 || !self.n.is_power_of_two() {
            return Err(KeyStoreError::Encryption(
                "scrypt N must be a power of 2 greater than 1".to_string(),
            ));
        }
        if self.r == 0 || self.p == 0 {
            return Err(KeyStoreError::Encryption(
                "scrypt r and p must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    fn to_scrypt_params(self) -> Result<scrypt::Params> {
        self.validate()?;
        scrypt::Params::new(self.n.trailing_zeros() as u8, self.r, self.p, KEY_SIZE)
            .map_err(|err| KeyStoreError::Encryption(err.to_string()))
    }
}

impl Default for ScryptParamsConfig {
    fn default() -> Self {
        Self {
            n: 16384, // 2^14
            r: 8,
            p: 1,
        }
    }
}

/// On-disk form of an encrypted key store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedEnvelope {
    pub version: u8,
    pub kdf: ScryptParamsConfig,
    /// Hex encoded salt
    pub salt: String,
    /// Hex encoded nonce
    pub nonce: String,
    /// Base64 encoded cipher text
    pub cipher_text: String,
}

/// Top-level wrapper so encrypted files read `encrypted: {...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedFile {
    pub encrypted: EncryptedEnvelope,
}

/// Key derived once per session and reused for every write.
pub struct SessionCipher {
    key: Zeroizing<[u8; KEY_SIZE]>,
    salt: [u8; SALT_SIZE],
    params: ScryptParamsConfig,
}

impl SessionCipher {
    /// Derives a key for a new store under a random salt.
    pub fn create(password: &str, params: ScryptParamsConfig) -> Result<Self> {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);
        Self::derive(password, salt, params)
    }

    /// Derives the key of an existing envelope and opens it.
    pub fn open(password: &str, envelope: &EncryptedEnvelope) -> Result<(Self, Vec<u8>)> {
        if envelope.version != ENVELOPE_VERSION {
            return Err(KeyStoreError::InvalidDocument(format!(
                "unsupported envelope version {}",
                envelope.version
            )));
        }
        let salt: [u8; SALT_SIZE] = decode_hex(&envelope.salt, "salt")?;
        let nonce: [u8; NONCE_SIZE] = decode_hex(&envelope.nonce, "nonce")?;
        let cipher_text = STANDARD
            .decode(&envelope.cipher_text)
            .map_err(|err| KeyStoreError::InvalidDocument(format!("cipher text: {}", err)))?;

        let session = Self::derive(password, salt, envelope.kdf)?;
        let cipher = Aes256Gcm::new_from_slice(&session.key[..])
            .map_err(|err| KeyStoreError::Encryption(err.to_string()))?;
        let plain = cipher
            .decrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &cipher_text,
                    aad: AAD,
                },
            )
            .map_err(|_| KeyStoreError::InvalidPassword)?;
        Ok((session, plain))
    }

    fn derive(password: &str, salt: [u8; SALT_SIZE], params: ScryptParamsConfig) -> Result<Self> {
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        scrypt::scrypt(
            password.as_bytes(),
            &salt,
            &params.to_scrypt_params()?,
            &mut key[..],
        )
        .map_err(|err| KeyStoreError::Encryption(err.to_string()))?;
        Ok(Self { key, salt, params })
    }

    pub fn seal(&self, plain: &[u8]) -> Result<EncryptedFile> {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let cipher = Aes256Gcm::new_from_slice(&self.key[..])
            .map_err(|err| KeyStoreError::Encryption(err.to_string()))?;
        let cipher_text = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plain,
                    aad: AAD,
                },
            )
            .map_err(|err| KeyStoreError::Encryption(err.to_string()))?;

        Ok(EncryptedFile {
            encrypted: EncryptedEnvelope {
                version: ENVELOPE_VERSION,
                kdf: self.params,
                salt: hex::encode(self.salt),
                nonce: hex::encode(nonce),
                cipher_text: STANDARD.encode(cipher_text),
            },
        })
    }
}

fn decode_hex<const N: usize>(value: &str, field: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(value)
        .map_err(|err| KeyStoreError::InvalidDocument(format!("{}: {}", field, err)))?;
    bytes.try_into().map_err(|_| {
        KeyStoreError::InvalidDocument(format!("{}: expected {} bytes", field, N))
    })
}
