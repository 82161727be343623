//! The external node configuration toolkit seam.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::PathBuf;

use cattle_config::{NetworkPreset, NodeAddresses, NodeInformation};

use crate::{AccountResolver, Result, VotingKeyFileProvider};

/// Everything the toolkit needs to render one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfigureRequest {
    pub preset: NetworkPreset,
    pub overrides: Value,
    pub assembly: String,
    pub working_dir: PathBuf,
    pub node: NodeInformation,
}

/// What the toolkit hands back for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfigureResponse {
    /// `None` for nodes that hold no keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<NodeAddresses>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub rendered_preset: Value,
}

/// Input for rendering the nemesis block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NemesisRenderRequest {
    pub descriptor: PathBuf,
    pub preset: NetworkPreset,
    /// Node whose configuration builds the block
    pub candidate: NodeInformation,
    pub working_dir: PathBuf,
}

/// Renders node deployments and the nemesis seed.
pub trait NodeToolkit {
    /// Renders one node, pulling secrets through `accounts` and `voting`.
    fn configure(
        &mut self,
        request: &NodeConfigureRequest,
        accounts: &dyn AccountResolver,
        voting: &dyn VotingKeyFileProvider,
    ) -> Result<NodeConfigureResponse>;

    /// Builds the nemesis seed and returns the directory holding it.
    fn render_nemesis(&mut self, request: &NemesisRenderRequest) -> Result<PathBuf>;
}
