//! Capability shared by the eager and the lazy key store.

use cattle_cryptography::{Account, PrivateKey, VotingKeyFile};

use crate::{NetworkAccountRole, NodeKeyRole, Result};

/// Source of every account and voting key a network needs.
///
/// Lookups with `generate_if_missing` create, persist and return a new key
/// the first time, and the same key on every later call.
pub trait SecretStore {
    fn get_network_account(
        &mut self,
        role: NetworkAccountRole,
        generate_if_missing: bool,
    ) -> Result<Account>;

    fn save_network_account(
        &mut self,
        role: NetworkAccountRole,
        private_key: &PrivateKey,
    ) -> Result<()>;

    fn get_node_account(
        &mut self,
        role: NodeKeyRole,
        node_name: &str,
        node_number: u32,
        generate_if_missing: bool,
    ) -> Result<Account>;

    fn save_node_account(
        &mut self,
        role: NodeKeyRole,
        node_name: &str,
        node_number: u32,
        private_key: &PrivateKey,
    ) -> Result<()>;

    /// Voting key file covering exactly `[start_epoch, end_epoch]`.
    fn get_voting_key_file(
        &mut self,
        node_name: &str,
        node_number: u32,
        start_epoch: u32,
        end_epoch: u32,
    ) -> Result<VotingKeyFile>;
}

impl<T: SecretStore + ?Sized> SecretStore for &mut T {
    fn get_network_account(
        &mut self,
        role: NetworkAccountRole,
        generate_if_missing: bool,
    ) -> Result<Account> {
        (**self).get_network_account(role, generate_if_missing)
    }

    fn save_network_account(
        &mut self,
        role: NetworkAccountRole,
        private_key: &PrivateKey,
    ) -> Result<()> {
        (**self).save_network_account(role, private_key)
    }

    fn get_node_account(
        &mut self,
        role: NodeKeyRole,
        node_name: &str,
        node_number: u32,
        generate_if_missing: bool,
    ) -> Result<Account> {
        (**self).get_node_account(role, node_name, node_number, generate_if_missing)
    }

    fn save_node_account(
        &mut self,
        role: NodeKeyRole,
        node_name: &str,
        node_number: u32,
        private_key: &PrivateKey,
    ) -> Result<()> {
        (**self).save_node_account(role, node_name, node_number, private_key)
    }

    fn get_voting_key_file(
        &mut self,
        node_name: &str,
        node_number: u32,
        start_epoch: u32,
        end_epoch: u32,
    ) -> Result<VotingKeyFile> {
        (**self).get_voting_key_file(node_name, node_number, start_epoch, end_epoch)
    }
}
