//! Network presets.
//!
//! A preset carries the network-wide parameters the nemesis block and node
//! configuration depend on. Base presets are compiled in; a custom preset
//! file is deep-merged on top, then the input file's new-network fields win.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;

use crate::{yaml, ConfigError, NetworkDefinition, Result};

/// One mosaic of the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicPreset {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divisibility: Option<u8>,
    /// Whole-unit supply
    #[serde(default)]
    pub supply: u64,
}

/// Network-wide parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkPreset {
    pub name: String,
    /// Network identifier byte used for address derivation
    pub network_identifier: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_hash_seed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_key_desired_lifetime: Option<u32>,
    #[serde(default)]
    pub mosaics: Vec<MosaicPreset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nemesis_signer_public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founder_public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvest_network_fee_sink_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_rental_fee_sink_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mosaic_rental_fee_sink_address: Option<String>,
}

impl NetworkPreset {
    /// Names accepted by [`NetworkPreset::base`]
    pub const BASE_PRESETS: [&'static str; 2] = ["mainnet", "testnet"];

    /// Compiled-in base preset.
    pub fn base(name: &str) -> Result<Self> {
        let (identifier, lifetime) = match name.to_ascii_lowercase().as_str() {
            "mainnet" | "main" => (0x68, 720),
            "testnet" | "test" => (0x98, 720),
            _ => return Err(ConfigError::UnknownPreset(name.to_string())),
        };
        Ok(Self {
            name: name.to_ascii_lowercase(),
            network_identifier: identifier,
            network_description: None,
            generation_hash_seed: None,
            base_namespace: None,
            voting_key_desired_lifetime: Some(lifetime),
            mosaics: vec![
                MosaicPreset {
                    name: "currency".into(),
                    divisibility: Some(6),
                    supply: 7_842_928_625,
                },
                MosaicPreset {
                    name: "harvest".into(),
                    divisibility: Some(3),
                    supply: 15_000_000,
                },
            ],
            nemesis_signer_public_key: None,
            founder_public_key: None,
            harvest_network_fee_sink_address: None,
            namespace_rental_fee_sink_address: None,
            mosaic_rental_fee_sink_address: None,
        })
    }

    /// Base preset with the custom preset file merged on top.
    pub fn load(name: &str, custom: Option<&Path>) -> Result<Self> {
        let preset = Self::base(name)?;
        let Some(custom) = custom else {
            return Ok(preset);
        };
        let overlay: Value = yaml::load(custom)?;
        let mut merged = serde_yaml::to_value(&preset)?;
        yaml::deep_merge(&mut merged, overlay);
        let merged: NetworkPreset = serde_yaml::from_value(merged)?;
        tracing::debug!(
            target: "cattle",
            preset = %merged.name,
            custom = %custom.display(),
            "custom preset merged"
        );
        Ok(merged)
    }

    /// Preset for a network definition: base, custom file, then the
    /// definition's own new-network fields.
    pub fn for_network(network: &NetworkDefinition) -> Result<Self> {
        let mut preset = Self::load(&network.preset, network.custom_preset.as_deref())?;
        preset.apply_definition(network);
        Ok(preset)
    }

    /// Like [`NetworkPreset::for_network`], resolving a relative custom
    /// preset path against `working_dir`.
    pub fn for_network_in(network: &NetworkDefinition, working_dir: &Path) -> Result<Self> {
        match &network.custom_preset {
            Some(custom) if custom.is_relative() => {
                let mut network = network.clone();
                network.custom_preset = Some(working_dir.join(custom));
                Self::for_network(&network)
            }
            _ => Self::for_network(network),
        }
    }

    fn apply_definition(&mut self, network: &NetworkDefinition) {
        if let Some(description) = &network.network_description {
            self.network_description = Some(description.clone());
        }
        if let Some(seed) = &network.generation_hash_seed {
            self.generation_hash_seed = Some(seed.clone());
        }
        if let Some(namespace) = &network.base_namespace {
            self.base_namespace = Some(namespace.clone());
        }
        if let Some(lifetime) = network.voting_key_desired_lifetime {
            self.voting_key_desired_lifetime = Some(lifetime);
        }
        for (index, mosaic) in network.mosaics.iter().enumerate() {
            match self.mosaics.get_mut(index) {
                Some(existing) => {
                    existing.name = mosaic.name.clone();
                    if mosaic.divisibility.is_some() {
                        existing.divisibility = mosaic.divisibility;
                    }
                }
                None => self.mosaics.push(MosaicPreset {
                    name: mosaic.name.clone(),
                    divisibility: mosaic.divisibility,
                    supply: 0,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MosaicInput;

    #[test]
    fn base_presets_are_known() {
        for name in NetworkPreset::BASE_PRESETS {
            let preset = NetworkPreset::base(name).unwrap();
            assert_eq!(preset.mosaics.len(), 2);
        }
        assert_eq!(NetworkPreset::base("mainnet").unwrap().network_identifier, 0x68);
        assert!(matches!(
            NetworkPreset::base("moonnet"),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn custom_file_overrides_base() {
        let dir = tempfile::TempDir::new().unwrap();
        let custom = dir.path().join("custom.yml");
        std::fs::write(
            &custom,
            "votingKeyDesiredLifetime: 10\nmosaics:\n  - name: coin\n    divisibility: 0\n",
        )
        .unwrap();

        let preset = NetworkPreset::load("testnet", Some(&custom)).unwrap();
        assert_eq!(preset.voting_key_desired_lifetime, Some(10));
        assert_eq!(preset.mosaics.len(), 1);
        assert_eq!(preset.mosaics[0].divisibility, Some(0));
        assert_eq!(preset.network_identifier, 0x98);
    }

    #[test]
    fn definition_fields_win() {
        let mut network = NetworkDefinition::new("testnet", "example.org");
        network.generation_hash_seed = Some("00".repeat(32));
        network.mosaics = vec![
            MosaicInput {
                name: "cattle.coin".into(),
                divisibility: None,
            },
            MosaicInput {
                name: "cattle.harvest".into(),
                divisibility: Some(1),
            },
            MosaicInput {
                name: "cattle.extra".into(),
                divisibility: Some(2),
            },
        ];

        let preset = NetworkPreset::for_network(&network).unwrap();
        assert_eq!(preset.generation_hash_seed.as_deref(), Some("00".repeat(32).as_str()));
        assert_eq!(preset.mosaics[0].name, "cattle.coin");
        assert_eq!(preset.mosaics[0].divisibility, Some(6));
        assert_eq!(preset.mosaics[1].divisibility, Some(1));
        assert_eq!(preset.mosaics[2].divisibility, Some(2));
    }
}
