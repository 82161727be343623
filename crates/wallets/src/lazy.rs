//! Key store opened on first use.

use cattle_cryptography::{Account, PrivateKey, VotingKeyFile};

use crate::{KeyStore, NetworkAccountRole, NodeKeyRole, Result, SecretStore};

type Factory = Box<dyn FnMut() -> Result<KeyStore>>;

/// Defers opening (and the password prompt it may need) until a secret is
/// actually requested. A failed open is retried on the next request.
pub struct LazyKeyStore {
    factory: Factory,
    store: Option<KeyStore>,
}

impl LazyKeyStore {
    pub fn new<F>(factory: F) -> Self
    where
        F: FnMut() -> Result<KeyStore> + 'static,
    {
        Self {
            factory: Box::new(factory),
            store: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.store.is_some()
    }

    /// The underlying store, opening it if needed.
    pub fn store(&mut self) -> Result<&mut KeyStore> {
        let store = match self.store.take() {
            Some(store) => store,
            None => (self.factory)()?,
        };
        Ok(self.store.insert(store))
    }
}

impl SecretStore for LazyKeyStore {
    fn get_network_account(
        &mut self,
        role: NetworkAccountRole,
        generate_if_missing: bool,
    ) -> Result<Account> {
        self.store()?.get_network_account(role, generate_if_missing)
    }

    fn save_network_account(
        &mut self,
        role: NetworkAccountRole,
        private_key: &PrivateKey,
    ) -> Result<()> {
        self.store()?.save_network_account(role, private_key)
    }

    fn get_node_account(
        &mut self,
        role: NodeKeyRole,
        node_name: &str,
        node_number: u32,
        generate_if_missing: bool,
    ) -> Result<Account> {
        self.store()?
            .get_node_account(role, node_name, node_number, generate_if_missing)
    }

    fn save_node_account(
        &mut self,
        role: NodeKeyRole,
        node_name: &str,
        node_number: u32,
        private_key: &PrivateKey,
    ) -> Result<()> {
        self.store()?
            .save_node_account(role, node_name, node_number, private_key)
    }

    fn get_voting_key_file(
        &mut self,
        node_name: &str,
        node_number: u32,
        start_epoch: u32,
        end_epoch: u32,
    ) -> Result<VotingKeyFile> {
        self.store()?
            .get_voting_key_file(node_name, node_number, start_epoch, end_epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeyStoreError, KeyStoreOptions, StoreMode};
    use std::cell::Cell;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[test]
    fn opens_on_first_request_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key-store.yml");
        let opened = Rc::new(Cell::new(0));

        let counter = Rc::clone(&opened);
        let mut lazy = LazyKeyStore::new(move || {
            counter.set(counter.get() + 1);
            KeyStore::open(&path, KeyStoreOptions::new(0x98))
        });
        assert!(!lazy.is_initialized());
        assert_eq!(opened.get(), 0);

        let first = lazy
            .get_network_account(NetworkAccountRole::Founder, true)
            .unwrap();
        let again = lazy
            .get_network_account(NetworkAccountRole::Founder, true)
            .unwrap();
        assert_eq!(first.public_key(), again.public_key());
        assert!(lazy.is_initialized());
        assert_eq!(opened.get(), 1);
    }

    #[test]
    fn failed_open_is_retried() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key-store.yml");
        let attempts = Rc::new(Cell::new(0));

        let counter = Rc::clone(&attempts);
        let mut lazy = LazyKeyStore::new(move || {
            counter.set(counter.get() + 1);
            let mode = if counter.get() == 1 {
                StoreMode::RequireExisting
            } else {
                StoreMode::CreateIfMissing
            };
            KeyStore::open(&path, KeyStoreOptions::new(0x98).mode(mode))
        });

        assert!(matches!(
            lazy.get_network_account(NetworkAccountRole::Faucet, true),
            Err(KeyStoreError::StoreNotFound(_))
        ));
        assert!(lazy
            .get_network_account(NetworkAccountRole::Faucet, true)
            .is_ok());
        assert_eq!(attempts.get(), 2);
    }
}
