//! Account and voting key callbacks handed to the node toolkit.

use std::cell::RefCell;

use cattle_cryptography::{Account, PrivateKey, PublicKey, VotingKeyFile};
use cattle_wallets::{KeyStoreError, NodeKeyRole, SecretStore};
use tracing::debug;

use crate::{NodeError, Result};

/// Supplies a usable account for a key role of the node being configured.
pub trait AccountResolver {
    /// `known` is the public key the node is already bound to, if any.
    fn resolve(&self, role: NodeKeyRole, known: Option<&PublicKey>) -> Result<Account>;
}

/// Interactive source of private keys.
///
/// Implementations re-prompt on malformed input instead of failing.
pub trait AccountPrompt {
    fn prompt_private_key(&self, message: &str, expected: Option<&PublicKey>) -> Result<PrivateKey>;
}

/// Supplies the voting key file of the node being configured.
pub trait VotingKeyFileProvider {
    fn voting_key_file(&self, start_epoch: u32, end_epoch: u32) -> Result<VotingKeyFile>;
}

/// Resolves accounts from the key store, falling back to the operator.
///
/// Scoped to a node, keys come from (or are generated into) the store. A
/// public key the node already uses must match the stored key; if nothing
/// is stored for it the operator is asked for the private key. Without a
/// node scope every account is prompted for. In ready mode prompting fails.
pub struct KeyStoreAccountResolver<'a, S: SecretStore> {
    store: &'a RefCell<S>,
    node: Option<(String, u32)>,
    prompt: &'a dyn AccountPrompt,
    ready: bool,
    network_identifier: u8,
}

impl<'a, S: SecretStore> KeyStoreAccountResolver<'a, S> {
    pub fn for_node(
        store: &'a RefCell<S>,
        node_name: impl Into<String>,
        node_number: u32,
        prompt: &'a dyn AccountPrompt,
        ready: bool,
        network_identifier: u8,
    ) -> Self {
        Self {
            store,
            node: Some((node_name.into(), node_number)),
            prompt,
            ready,
            network_identifier,
        }
    }

    pub fn unscoped(
        store: &'a RefCell<S>,
        prompt: &'a dyn AccountPrompt,
        ready: bool,
        network_identifier: u8,
    ) -> Self {
        Self {
            store,
            node: None,
            prompt,
            ready,
            network_identifier,
        }
    }

    fn label(&self) -> String {
        match &self.node {
            Some((name, number)) => format!("{} #{}", name, number),
            None => "unnamed node".to_string(),
        }
    }

    fn ask(&self, role: NodeKeyRole, expected: Option<&PublicKey>) -> Result<Account> {
        let what = format!("{} private key of {}", role, self.label());
        if self.ready {
            return Err(NodeError::PromptUnavailable(what));
        }
        let key = self.prompt.prompt_private_key(&format!("Enter the {}", what), expected)?;
        let account = Account::from_private_key(key, self.network_identifier);
        match expected {
            Some(expected) if account.public_key() != expected => Err(self.mismatch(role, expected)),
            _ => Ok(account),
        }
    }

    fn mismatch(&self, role: NodeKeyRole, expected: &PublicKey) -> NodeError {
        NodeError::KeyMismatch {
            node: self.label(),
            role: role.to_string(),
            expected: expected.to_string(),
        }
    }
}

impl<S: SecretStore> AccountResolver for KeyStoreAccountResolver<'_, S> {
    fn resolve(&self, role: NodeKeyRole, known: Option<&PublicKey>) -> Result<Account> {
        let Some((name, number)) = &self.node else {
            return self.ask(role, known);
        };

        let stored = match self
            .store
            .borrow_mut()
            .get_node_account(role, name, *number, false)
        {
            Ok(account) => Some(account),
            Err(KeyStoreError::AccountNotFound(_)) => None,
            Err(err) => return Err(err.into()),
        };

        match (stored, known) {
            (Some(account), Some(known)) if account.public_key() != known => {
                Err(self.mismatch(role, known))
            }
            (Some(account), _) => Ok(account),
            (None, None) => {
                debug!(target: "cattle", node = %name, number, role = %role, "generating account");
                Ok(self
                    .store
                    .borrow_mut()
                    .get_node_account(role, name, *number, true)?)
            }
            (None, Some(known)) => {
                let account = self.ask(role, Some(known))?;
                if let Some(private_key) = account.private_key() {
                    self.store
                        .borrow_mut()
                        .save_node_account(role, name, *number, private_key)?;
                }
                Ok(account)
            }
        }
    }
}

/// Voting key files from the key store, scoped to one node.
pub struct KeyStoreVotingKeyFiles<'a, S: SecretStore> {
    store: &'a RefCell<S>,
    node_name: String,
    node_number: u32,
}

impl<'a, S: SecretStore> KeyStoreVotingKeyFiles<'a, S> {
    pub fn new(store: &'a RefCell<S>, node_name: impl Into<String>, node_number: u32) -> Self {
        Self {
            store,
            node_name: node_name.into(),
            node_number,
        }
    }
}

impl<S: SecretStore> VotingKeyFileProvider for KeyStoreVotingKeyFiles<'_, S> {
    fn voting_key_file(&self, start_epoch: u32, end_epoch: u32) -> Result<VotingKeyFile> {
        Ok(self.store.borrow_mut().get_voting_key_file(
            &self.node_name,
            self.node_number,
            start_epoch,
            end_epoch,
        )?)
    }
}
