//! Expansion written through to disk.

use cattle_config::{NetworkDefinition, NetworkFile, NetworkInputFile, NodeType, NodeTypeInput};
use cattle_network::{expand, expand_to_file, NetworkError};
use proptest::prelude::*;
use std::collections::HashSet;
use tempfile::TempDir;

fn input(template: &str, groups: Vec<NodeTypeInput>) -> NetworkInputFile {
    let mut network = NetworkDefinition::new("testnet", "cattle.example");
    network.suffix = "eu".into();
    network.friendly_name_template = template.into();
    NetworkInputFile {
        network,
        node_types: groups,
    }
}

fn group(node_type: NodeType, nickname: &str, count: u32) -> NodeTypeInput {
    let mut group = NodeTypeInput::from_catalog(node_type, count);
    group.nickname = nickname.into();
    group
}

#[test]
fn duplicate_hostnames_write_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("network.yml");
    let input = input(
        "node-$friendlyNumber",
        vec![group(NodeType::Dual, "dual", 1), group(NodeType::Peer, "peer", 1)],
    );

    let err = expand_to_file(&input, &path, false).unwrap_err();
    assert!(matches!(err, NetworkError::DuplicateIdentifier { .. }));
    assert!(!path.exists());
}

#[test]
fn written_topology_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("network.yml");
    let input = input(
        "$nickname-$friendlyNumber-$suffix",
        vec![
            group(NodeType::VotingDual, "dual", 1),
            group(NodeType::Api, "api", 2),
            group(NodeType::Services, "services", 1),
        ],
    );

    let written = expand_to_file(&input, &path, false).unwrap();
    let loaded = NetworkFile::load(&path).unwrap();
    assert_eq!(loaded, written);
    assert_eq!(loaded.nodes.len(), 4);
    assert_eq!(loaded.nodes[3].assembly, "services");
    assert_eq!(loaded.nodes[2].hostname, "api-02-eu.cattle.example");
}

#[test]
fn existing_topology_needs_force() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("network.yml");
    let input = input(
        "$nickname-$friendlyNumber",
        vec![group(NodeType::Peer, "peer", 1)],
    );
    expand_to_file(&input, &path, false).unwrap();

    assert!(matches!(
        expand_to_file(&input, &path, false),
        Err(NetworkError::AlreadyExists(_))
    ));
    assert!(expand_to_file(&input, &path, true).is_ok());
}

#[test]
fn expansion_is_deterministic() {
    let input = input(
        "$nickname-$friendlyNumber-$suffix",
        vec![group(NodeType::Demo, "demo", 2), group(NodeType::Peer, "peer", 3)],
    );
    let first = serde_yaml::to_string(&expand(&input).unwrap()).unwrap();
    let second = serde_yaml::to_string(&expand(&input).unwrap()).unwrap();
    assert_eq!(first, second);
}

fn group_strategy() -> impl Strategy<Value = NodeTypeInput> {
    (
        prop::sample::select(NodeType::ALL.to_vec()),
        prop::sample::select(vec!["dual", "peer", "api", "node"]),
        1u32..4,
    )
        .prop_map(|(node_type, nickname, count)| group(node_type, nickname, count))
}

proptest! {
    #[test]
    fn prop_expansion_names_are_unique_or_rejected(
        template in prop::sample::select(vec![
            "$nickname-$friendlyNumber-$suffix",
            "$nickname-$friendlyNumber",
            "$nickname-$suffix",
            "node-$friendlyNumber",
            "cattle",
        ]),
        groups in prop::collection::vec(group_strategy(), 1..5),
    ) {
        match expand(&input(template, groups)) {
            Ok(topology) => {
                let names: HashSet<_> = topology.nodes.iter().map(|node| &node.friendly_name).collect();
                let hosts: HashSet<_> = topology.nodes.iter().map(|node| &node.hostname).collect();
                prop_assert_eq!(names.len(), topology.nodes.len());
                prop_assert_eq!(hosts.len(), topology.nodes.len());
                let numbers: Vec<u32> = topology.nodes.iter().map(|node| node.number).collect();
                let expected: Vec<u32> = (1..=topology.nodes.len() as u32).collect();
                prop_assert_eq!(numbers, expected);
            }
            Err(NetworkError::DuplicateIdentifier { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}
