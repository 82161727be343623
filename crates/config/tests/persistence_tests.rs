//! Topology and input file persistence tests.

use cattle_config::{
    AccountAddress, NetworkDefinition, NetworkFile, NetworkInputFile, NodeAddresses,
    NodeInformation, NodeType, NodeTypeInput, RestProtocol,
};
use serde_yaml::Value;
use tempfile::TempDir;

fn sample_topology() -> NetworkFile {
    let mut network = NetworkDefinition::new("testnet", "cattle.example");
    network.suffix = "eu".into();
    network.faucet_balances = vec![100, 0];
    NetworkFile {
        network,
        nemesis_seed_folder: None,
        nodes: vec![NodeInformation {
            number: 1,
            node_type: NodeType::VotingDual,
            nickname: "dual".into(),
            friendly_name: "dual-01-eu".into(),
            hostname: "dual-01-eu.cattle.example".into(),
            assembly: "dual".into(),
            balances: vec![3_000_000, 150],
            rest_protocol: RestProtocol::Both,
            custom_preset: serde_yaml::from_str("privateKeySecurityMode: PROMPT_MAIN\n").unwrap(),
            addresses: Some(NodeAddresses {
                main: AccountAddress {
                    address: "TMAIN".into(),
                    public_key: "AA".repeat(32),
                    private_key: Some("BB".repeat(32)),
                },
                transport: None,
                vrf: None,
                remote: None,
                voting: Vec::new(),
            }),
        }],
    }
}

#[test]
fn topology_round_trips_without_private_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("network.yml");
    let topology = sample_topology();

    topology.save(&path).unwrap();
    let loaded = NetworkFile::load(&path).unwrap();

    assert_eq!(loaded, topology.without_private_keys());
    assert_ne!(loaded, topology);
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains(&"BB".repeat(32)));
    assert!(text.contains("friendlyName: dual-01-eu"));
}

#[test]
fn input_file_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("network-input.yml");
    let input = NetworkInputFile {
        network: NetworkDefinition::new("mainnet", "cattle.example"),
        node_types: vec![
            NodeTypeInput::from_catalog(NodeType::VotingDual, 2),
            NodeTypeInput::from_catalog(NodeType::Api, 1),
        ],
    };

    input.save(&path).unwrap();
    assert_eq!(NetworkInputFile::load(&path).unwrap(), input);
}

#[test]
fn hand_written_input_uses_defaults() {
    let input: NetworkInputFile = serde_yaml::from_str(
        r#"
isNewNetwork: false
preset: mainnet
domain: cattle.example
nodeTypes:
  - nodeType: peer
    nickname: node
    count: 3
"#,
    )
    .unwrap();

    assert_eq!(input.network.friendly_name_template, "$nickname-$friendlyNumber-$suffix");
    assert_eq!(input.node_types[0].rest_protocol, RestProtocol::HttpsOnly);
    assert!(input.node_types[0].balances.is_empty());
    assert!(input.validate().is_ok());
    assert_eq!(serde_yaml::to_value(&input).unwrap()["preset"], Value::from("mainnet"));
}
