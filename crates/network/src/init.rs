//! Starter input files for `cattle init`.

use std::path::Path;

use cattle_config::{
    MosaicInput, NetworkDefinition, NetworkInputFile, NetworkPreset, NodeType, NodeTypeInput,
};
use tracing::info;

use crate::{NetworkError, Result};

/// Answers collected by `cattle init`, interactively or from defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOptions {
    pub preset: String,
    pub domain: String,
    pub suffix: String,
    pub new_network: bool,
    pub node_types: Vec<NodeTypeInput>,
}

impl InitOptions {
    /// One `votingDual` and one `peer` node on a new network.
    pub fn new(preset: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            preset: preset.into(),
            domain: domain.into(),
            suffix: String::new(),
            new_network: true,
            node_types: vec![
                NodeTypeInput::from_catalog(NodeType::VotingDual, 1),
                NodeTypeInput::from_catalog(NodeType::Peer, 1),
            ],
        }
    }
}

/// Builds a valid input file. New networks get a fresh generation hash
/// seed and the preset's mosaics under the base namespace.
pub fn template_input(options: &InitOptions) -> Result<NetworkInputFile> {
    let preset = NetworkPreset::base(&options.preset)?;
    let mut network = NetworkDefinition::new(preset.name.clone(), options.domain.clone());
    network.suffix = options.suffix.clone();
    network.is_new_network = options.new_network;

    if options.new_network {
        let namespace = "cattle".to_string();
        network.network_description = Some(format!("cattle {} network", preset.name));
        network.generation_hash_seed = Some(cattle_cryptography::random_hash_seed());
        network.mosaics = preset
            .mosaics
            .iter()
            .map(|mosaic| MosaicInput {
                name: format!("{}.{}", namespace, mosaic.name),
                divisibility: mosaic.divisibility,
            })
            .collect();
        network.faucet_balances = vec![0; preset.mosaics.len()];
        network.base_namespace = Some(namespace);
        network.voting_key_desired_lifetime = preset.voting_key_desired_lifetime;
    }

    let input = NetworkInputFile {
        network,
        node_types: options.node_types.clone(),
    };
    input.validate()?;
    Ok(input)
}

/// Writes a template input file to `path`.
pub fn init_input_file(path: &Path, options: &InitOptions, force: bool) -> Result<NetworkInputFile> {
    if path.exists() && !force {
        return Err(NetworkError::AlreadyExists(path.to_path_buf()));
    }
    let input = template_input(options)?;
    input.save(path)?;
    info!(
        target: "cattle",
        path = %path.display(),
        preset = %input.network.preset,
        groups = input.node_types.len(),
        "input file written"
    );
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_template_is_a_valid_new_network() {
        let input = template_input(&InitOptions::new("testnet", "example.org")).unwrap();
        assert!(input.network.is_new_network);
        assert_eq!(input.node_types.len(), 2);
        assert_eq!(input.network.mosaics[0].name, "cattle.currency");
        assert_eq!(input.network.generation_hash_seed.as_ref().unwrap().len(), 64);
        assert!(crate::expand(&input).is_ok());
    }

    #[test]
    fn existing_network_needs_no_seed() {
        let mut options = InitOptions::new("mainnet", "example.org");
        options.new_network = false;
        let input = template_input(&options).unwrap();
        assert!(input.network.generation_hash_seed.is_none());
        assert!(input.network.mosaics.is_empty());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("network-input.yml");
        let options = InitOptions::new("testnet", "example.org");
        init_input_file(&path, &options, false).unwrap();
        assert!(matches!(
            init_input_file(&path, &options, false),
            Err(NetworkError::AlreadyExists(_))
        ));
        assert!(init_input_file(&path, &options, true).is_ok());
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let options = InitOptions::new("moonnet", "example.org");
        assert!(matches!(
            template_input(&options),
            Err(NetworkError::Config(_))
        ));
    }
}
