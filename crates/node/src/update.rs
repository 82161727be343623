//! Node update: configure every node through the toolkit and record the
//! accounts it ends up bound to.

use serde_yaml::Value;
use std::cell::RefCell;
use std::path::PathBuf;
use tracing::info;

use cattle_config::{yaml, NetworkFile, NetworkPreset, NETWORK_FILE_NAME, NODES_DIR};
use cattle_wallets::SecretStore;

use crate::{
    AccountPrompt, KeyStoreAccountResolver, KeyStoreVotingKeyFiles, NodeConfigureRequest,
    NodeToolkit, Result,
};

/// File the rendered preset is kept in, inside each node directory
pub const RENDERED_PRESET_FILE: &str = "rendered-preset.yml";

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub working_dir: PathBuf,
    /// Fail instead of prompting
    pub ready: bool,
    /// Extra overrides keyed by friendly name, merged into each node
    pub node_overrides: Option<Value>,
}

/// Configures every node in topology order, then persists the topology.
///
/// The topology on disk and in memory is only replaced once every node
/// succeeded.
pub fn update_nodes<S: SecretStore>(
    topology: &mut NetworkFile,
    store: &mut S,
    toolkit: &mut dyn NodeToolkit,
    prompt: &dyn AccountPrompt,
    options: &UpdateOptions,
) -> Result<()> {
    let preset = NetworkPreset::for_network_in(&topology.network, &options.working_dir)?;
    let store = RefCell::new(store);
    let mut updated = topology.clone();

    for node in &mut updated.nodes {
        if let Some(extra) = options
            .node_overrides
            .as_ref()
            .and_then(|overrides| overrides.get(node.friendly_name.as_str()))
        {
            yaml::deep_merge(&mut node.custom_preset, extra.clone());
        }

        let request = NodeConfigureRequest {
            preset: preset.clone(),
            overrides: node.custom_preset.clone(),
            assembly: node.assembly.clone(),
            working_dir: options.working_dir.join(NODES_DIR).join(&node.friendly_name),
            node: node.clone(),
        };
        let resolver = KeyStoreAccountResolver::for_node(
            &store,
            node.friendly_name.clone(),
            node.number,
            prompt,
            options.ready,
            preset.network_identifier,
        );
        let voting = KeyStoreVotingKeyFiles::new(&store, node.friendly_name.clone(), node.number);

        let response = toolkit.configure(&request, &resolver, &voting)?;
        if let Some(addresses) = response.addresses {
            node.addresses = Some(addresses);
        }
        if !response.rendered_preset.is_null() {
            yaml::save(
                &request.working_dir.join(RENDERED_PRESET_FILE),
                &response.rendered_preset,
            )?;
        }
        info!(
            target: "cattle",
            node = %node.friendly_name,
            number = node.number,
            assembly = %node.assembly,
            "node updated"
        );
    }

    updated.save(&options.working_dir.join(NETWORK_FILE_NAME))?;
    *topology = updated;
    Ok(())
}
