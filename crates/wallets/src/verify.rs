//! Read-only check that the key store still backs a topology.

use cattle_config::{AccountAddress, NetworkFile, NodeInformation};
use tracing::{info, warn};

use crate::{KeyStoreError, NetworkAccountRole, NodeKeyRole, Result, SecretStore};

/// Outcome of [`verify_keys`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyVerificationReport {
    pub checked_nodes: usize,
    pub problems: Vec<String>,
}

impl KeyVerificationReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Checks that every key the topology relies on exists in `store` and
/// matches the public identity recorded in the topology. Never generates keys.
pub fn verify_keys<S>(store: &mut S, topology: &NetworkFile) -> Result<KeyVerificationReport>
where
    S: SecretStore + ?Sized,
{
    let mut report = KeyVerificationReport::default();

    if topology.network.is_new_network {
        for role in [NetworkAccountRole::NemesisSigner, NetworkAccountRole::Founder] {
            match store.get_network_account(role, false) {
                Ok(_) => {}
                Err(KeyStoreError::AccountNotFound(_)) => {
                    report.problems.push(format!("missing {} account", role));
                }
                Err(err) => return Err(err),
            }
        }
    }

    for node in topology.nodes.iter().filter(|node| !node.metadata().services_only) {
        report.checked_nodes += 1;
        let addresses = node.addresses.as_ref();
        check_role(store, node, NodeKeyRole::Main, addresses.map(|a| &a.main), &mut report)?;
        if node.metadata().harvesting {
            check_role(store, node, NodeKeyRole::Vrf, addresses.and_then(|a| a.vrf.as_ref()), &mut report)?;
            check_role(store, node, NodeKeyRole::Remote, addresses.and_then(|a| a.remote.as_ref()), &mut report)?;
        }
    }

    if report.is_ok() {
        info!(target: "cattle", nodes = report.checked_nodes, "key store matches topology");
    } else {
        for problem in &report.problems {
            warn!(target: "cattle", "{}", problem);
        }
    }
    Ok(report)
}

fn check_role<S>(
    store: &mut S,
    node: &NodeInformation,
    role: NodeKeyRole,
    recorded: Option<&AccountAddress>,
    report: &mut KeyVerificationReport,
) -> Result<()>
where
    S: SecretStore + ?Sized,
{
    let account = match store.get_node_account(role, &node.friendly_name, node.number, false) {
        Ok(account) => account,
        Err(KeyStoreError::AccountNotFound(_)) => {
            report
                .problems
                .push(format!("node {} has no {} key", node.friendly_name, role));
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    if let Some(recorded) = recorded {
        if !account
            .public_key()
            .to_hex()
            .eq_ignore_ascii_case(&recorded.public_key)
        {
            report.problems.push(format!(
                "node {} {} key {} differs from topology {}",
                node.friendly_name,
                role,
                account.public_key(),
                recorded.public_key
            ));
        }
    }
    Ok(())
}
