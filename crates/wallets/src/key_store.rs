//! File-backed key store.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use cattle_cryptography::{Account, PrivateKey, VotingKeyFile};

use crate::encryption::{EncryptedFile, ScryptParamsConfig, SessionCipher};
use crate::{
    validate_password, KeyStorage, KeyStoreError, NetworkAccountRole, NodeKeyRole, Result,
    SecretStore, StoredAccount, StoredVotingFile,
};

/// What to do when the key store file does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreMode {
    /// Fail with [`KeyStoreError::StoreNotFound`]
    RequireExisting,
    #[default]
    CreateIfMissing,
}

/// Options for [`KeyStore::open`].
#[derive(Clone)]
pub struct KeyStoreOptions {
    password: Option<Zeroizing<String>>,
    network_identifier: u8,
    mode: StoreMode,
    scrypt: ScryptParamsConfig,
}

impl KeyStoreOptions {
    pub fn new(network_identifier: u8) -> Self {
        Self {
            password: None,
            network_identifier,
            mode: StoreMode::default(),
            scrypt: ScryptParamsConfig::default(),
        }
    }

    /// Encrypts the store. An empty password disables encryption.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Zeroizing::new(password.into()));
        self
    }

    pub fn mode(mut self, mode: StoreMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn scrypt(mut self, scrypt: ScryptParamsConfig) -> Self {
        self.scrypt = scrypt;
        self
    }
}

impl std::fmt::Debug for KeyStoreOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStoreOptions")
            .field("has_password", &self.password.is_some())
            .field("network_identifier", &self.network_identifier)
            .field("mode", &self.mode)
            .field("scrypt", &self.scrypt)
            .finish()
    }
}

/// Key store backed by a single YAML document.
///
/// Every mutation rewrites the whole document. A write fails with
/// [`KeyStoreError::ConcurrentModification`] when the file changed on disk
/// since this instance last read or wrote it.
pub struct KeyStore {
    path: PathBuf,
    network_identifier: u8,
    storage: KeyStorage,
    cipher: Option<SessionCipher>,
    digest: Option<[u8; 32]>,
}

impl KeyStore {
    pub fn open(path: impl Into<PathBuf>, options: KeyStoreOptions) -> Result<Self> {
        let path = path.into();
        let password = options
            .password
            .as_ref()
            .map(|password| password.as_str())
            .filter(|password| !password.is_empty());
        if let Some(password) = password {
            validate_password(password)?;
        }

        let (storage, cipher, digest) = match read_if_exists(&path)? {
            Some(bytes) => {
                let (storage, cipher) = decode_document(&bytes, password, options.scrypt)?;
                (storage, cipher, Some(digest_of(&bytes)))
            }
            None if options.mode == StoreMode::RequireExisting => {
                return Err(KeyStoreError::StoreNotFound(path));
            }
            None => {
                let cipher = password
                    .map(|password| SessionCipher::create(password, options.scrypt))
                    .transpose()?;
                (KeyStorage::default(), cipher, None)
            }
        };

        if cipher.is_none() {
            warn!(
                target: "cattle",
                path = %path.display(),
                "key store is not encrypted, private keys are stored in plain text"
            );
        }
        info!(
            target: "cattle",
            path = %path.display(),
            network_accounts = storage.network.len(),
            nodes = storage.nodes.len(),
            "opened key store"
        );

        Ok(Self {
            path,
            network_identifier: options.network_identifier,
            storage,
            cipher,
            digest,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    pub fn network_identifier(&self) -> u8 {
        self.network_identifier
    }

    pub fn storage(&self) -> &KeyStorage {
        &self.storage
    }

    fn account(&self, stored: &StoredAccount) -> Result<Account> {
        let account = Account::from_private_key_hex(&stored.private_key, self.network_identifier)?;
        if !account.public_key().to_hex().eq_ignore_ascii_case(&stored.public_key) {
            return Err(KeyStoreError::InvalidDocument(format!(
                "stored public key {} does not match its private key",
                stored.public_key
            )));
        }
        Ok(account)
    }

    /// Persists `storage` and adopts it only once the write succeeded.
    fn commit(&mut self, storage: KeyStorage) -> Result<()> {
        let on_disk = read_if_exists(&self.path)?.map(|bytes| digest_of(&bytes));
        if on_disk != self.digest {
            return Err(KeyStoreError::ConcurrentModification(self.path.clone()));
        }

        let plain = Zeroizing::new(serde_yaml::to_string(&storage)?);
        let text = match &self.cipher {
            Some(cipher) => Zeroizing::new(serde_yaml::to_string(&cipher.seal(plain.as_bytes())?)?),
            None => plain,
        };
        write_atomically(&self.path, text.as_bytes())?;

        self.digest = Some(digest_of(text.as_bytes()));
        self.storage = storage;
        debug!(target: "cattle", path = %self.path.display(), "key store written");
        Ok(())
    }
}

impl SecretStore for KeyStore {
    fn get_network_account(
        &mut self,
        role: NetworkAccountRole,
        generate_if_missing: bool,
    ) -> Result<Account> {
        if let Some(stored) = self.storage.network.get(&role) {
            return self.account(stored);
        }
        if !generate_if_missing {
            return Err(KeyStoreError::AccountNotFound(role.to_string()));
        }

        let account = Account::generate(self.network_identifier);
        let mut storage = self.storage.clone();
        storage.network.insert(role, stored_account(&account)?);
        self.commit(storage)?;
        info!(target: "cattle", role = %role, address = %account.address(), "generated network account");
        Ok(account)
    }

    fn save_network_account(
        &mut self,
        role: NetworkAccountRole,
        private_key: &PrivateKey,
    ) -> Result<()> {
        let stored = stored_key(private_key);
        if self.storage.network.get(&role) == Some(&stored) {
            return Ok(());
        }
        let mut storage = self.storage.clone();
        storage.network.insert(role, stored);
        self.commit(storage)
    }

    fn get_node_account(
        &mut self,
        role: NodeKeyRole,
        node_name: &str,
        node_number: u32,
        generate_if_missing: bool,
    ) -> Result<Account> {
        if let Some(stored) = self
            .storage
            .node(node_name, node_number)
            .and_then(|node| node.keys.get(&role))
        {
            return self.account(stored);
        }
        if !generate_if_missing {
            return Err(KeyStoreError::AccountNotFound(format!(
                "{} account of node {} #{}",
                role, node_name, node_number
            )));
        }

        let account = Account::generate(self.network_identifier);
        let mut storage = self.storage.clone();
        storage
            .node_mut(node_name, node_number)
            .keys
            .insert(role, stored_account(&account)?);
        self.commit(storage)?;
        info!(
            target: "cattle",
            node = node_name,
            number = node_number,
            role = %role,
            "generated node account"
        );
        Ok(account)
    }

    fn save_node_account(
        &mut self,
        role: NodeKeyRole,
        node_name: &str,
        node_number: u32,
        private_key: &PrivateKey,
    ) -> Result<()> {
        let stored = stored_key(private_key);
        let current = self
            .storage
            .node(node_name, node_number)
            .and_then(|node| node.keys.get(&role));
        if current == Some(&stored) {
            return Ok(());
        }
        let mut storage = self.storage.clone();
        storage
            .node_mut(node_name, node_number)
            .keys
            .insert(role, stored);
        self.commit(storage)
    }

    fn get_voting_key_file(
        &mut self,
        node_name: &str,
        node_number: u32,
        start_epoch: u32,
        end_epoch: u32,
    ) -> Result<VotingKeyFile> {
        let requested = (start_epoch, end_epoch);
        let mismatch = |stored: (u32, u32)| KeyStoreError::EpochMismatch {
            node: format!("{} #{}", node_name, node_number),
            requested,
            stored,
        };

        let existing: Vec<&StoredVotingFile> =
            self.storage.voting_files_of(node_name, node_number).collect();
        if let Some(stored) = existing
            .iter()
            .find(|file| (file.start_epoch, file.end_epoch) == requested)
        {
            let bytes = STANDARD.decode(&stored.file).map_err(|err| {
                KeyStoreError::InvalidDocument(format!("voting key file: {}", err))
            })?;
            let file = VotingKeyFile::decode(&bytes)?;
            let decoded = (file.start_epoch(), file.end_epoch());
            if decoded != requested {
                return Err(mismatch(decoded));
            }
            return Ok(file);
        }
        if let Some(other) = existing.first() {
            return Err(mismatch((other.start_epoch, other.end_epoch)));
        }

        let root = Account::generate(self.network_identifier);
        let file = VotingKeyFile::generate(&root, start_epoch, end_epoch)?;
        let mut storage = self.storage.clone();
        storage.voting_files.push(StoredVotingFile {
            name: node_name.to_string(),
            number: node_number,
            start_epoch,
            end_epoch,
            public_key: file.public_key().to_hex(),
            file: STANDARD.encode(file.as_bytes()),
        });
        self.commit(storage)?;
        info!(
            target: "cattle",
            node = node_name,
            number = node_number,
            start_epoch,
            end_epoch,
            "generated voting key file"
        );
        Ok(file)
    }
}

fn stored_key(private_key: &PrivateKey) -> StoredAccount {
    StoredAccount {
        private_key: private_key.to_hex(),
        public_key: private_key.public_key().to_hex(),
    }
}

fn stored_account(account: &Account) -> Result<StoredAccount> {
    let private_key = account.private_key().ok_or_else(|| {
        cattle_cryptography::CryptoError::MissingPrivateKey(account.address().to_string())
    })?;
    Ok(stored_key(private_key))
}

fn decode_document(
    bytes: &[u8],
    password: Option<&str>,
    scrypt: ScryptParamsConfig,
) -> Result<(KeyStorage, Option<SessionCipher>)> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        let cipher = password
            .map(|password| SessionCipher::create(password, scrypt))
            .transpose()?;
        return Ok((KeyStorage::default(), cipher));
    }

    let value: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
    if value.get("encrypted").is_some() {
        let file: EncryptedFile = serde_yaml::from_value(value)?;
        let password = password.ok_or(KeyStoreError::PasswordRequired)?;
        let (cipher, plain) = SessionCipher::open(password, &file.encrypted)?;
        let plain = Zeroizing::new(plain);
        let storage = serde_yaml::from_slice(&plain)?;
        return Ok((storage, Some(cipher)));
    }

    let storage = serde_yaml::from_value(value)?;
    let cipher = password
        .map(|password| SessionCipher::create(password, scrypt))
        .transpose()?;
    Ok((storage, cipher))
}

fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(KeyStoreError::io(path, err)),
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| KeyStoreError::io(parent, err))?;
    }
    let staging = path.with_extension("yml.tmp");
    cattle_config::yaml::write_private(&staging, contents).map_err(|err| match err {
        cattle_config::ConfigError::Io { path, source } => KeyStoreError::Io { path, source },
        other => KeyStoreError::InvalidDocument(other.to_string()),
    })?;
    fs::rename(&staging, path).map_err(|err| KeyStoreError::io(path, err))
}

fn digest_of(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> KeyStore {
        KeyStore::open(dir.path().join("key-store.yml"), KeyStoreOptions::new(0x98)).unwrap()
    }

    #[test]
    fn stale_instance_cannot_overwrite() {
        let dir = TempDir::new().unwrap();
        let mut first = open(&dir);
        let mut second = open(&dir);

        first
            .get_network_account(NetworkAccountRole::Founder, true)
            .unwrap();
        let err = second
            .get_network_account(NetworkAccountRole::Faucet, true)
            .unwrap_err();
        assert!(matches!(err, KeyStoreError::ConcurrentModification(_)));
        assert!(second.storage().is_empty());

        let mut reopened = open(&dir);
        assert!(reopened
            .get_network_account(NetworkAccountRole::Faucet, false)
            .is_err());
        assert!(reopened
            .get_network_account(NetworkAccountRole::Founder, false)
            .is_ok());
    }

    #[test]
    fn saving_the_same_key_does_not_rewrite() {
        let dir = TempDir::new().unwrap();
        let mut store = open(&dir);
        let key = PrivateKey::from_bytes([7u8; 32]);
        store
            .save_network_account(NetworkAccountRole::NemesisSigner, &key)
            .unwrap();
        let digest = store.digest;
        store
            .save_network_account(NetworkAccountRole::NemesisSigner, &key)
            .unwrap();
        assert_eq!(store.digest, digest);
    }

    #[test]
    fn empty_file_is_an_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key-store.yml");
        fs::write(&path, "\n").unwrap();
        let store = KeyStore::open(&path, KeyStoreOptions::new(0x98)).unwrap();
        assert!(store.storage().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn store_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let mut store = open(&dir);
        store
            .get_network_account(NetworkAccountRole::Founder, true)
            .unwrap();
        let mode = fs::metadata(dir.path().join("key-store.yml"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!dir.path().join("key-store.yml.tmp").exists());
    }
}
