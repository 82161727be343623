//! Topology expansion.
//!
//! Every node of every input group becomes one `NodeInformation`, numbered
//! from 1 in input order. Friendly names come from the user template with
//! `$suffix`, `$nickname` and `$friendlyNumber` substituted. The counter
//! behind `$friendlyNumber` is kept per `(nickname, region)`.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use cattle_config::{
    yaml, NetworkFile, NetworkInputFile, NodeInformation, NodeTypeMetadata, RestProtocol,
};
use serde_yaml::Value;
use tracing::{debug, info};

use crate::{NetworkError, Result};

/// Region used outside multi-region deployments.
const DEFAULT_REGION: u32 = 0;

/// Expands `input` into a topology. Pure: touches neither disk nor secrets.
pub fn expand(input: &NetworkInputFile) -> Result<NetworkFile> {
    input.validate()?;

    let network = &input.network;
    let mut counters: HashMap<(&str, u32), u32> = HashMap::new();
    let mut nodes = Vec::new();

    for group in &input.node_types {
        let metadata = group.node_type.metadata();
        for _ in 0..group.count {
            let counter = counters
                .entry((group.nickname.as_str(), DEFAULT_REGION))
                .or_insert(0);
            *counter += 1;

            let friendly_name = network
                .friendly_name_template
                .replace("$suffix", &network.suffix)
                .replace("$nickname", &group.nickname)
                .replace("$friendlyNumber", &friendly_number(*counter, DEFAULT_REGION));
            let hostname = format!("{}.{}", friendly_name, network.domain);

            let mut node = NodeInformation {
                number: nodes.len() as u32 + 1,
                node_type: group.node_type,
                nickname: group.nickname.clone(),
                friendly_name,
                hostname,
                assembly: metadata.assembly().to_string(),
                balances: group.balances.clone(),
                rest_protocol: group.rest_protocol,
                custom_preset: Value::Null,
                addresses: None,
            };
            node.custom_preset = node_overrides(
                metadata,
                group.rest_protocol,
                &node.rest_url(),
                &node.explorer_url(),
            );
            debug!(
                target: "cattle",
                number = node.number,
                name = %node.friendly_name,
                assembly = %node.assembly,
                "expanded node"
            );
            nodes.push(node);
        }
    }

    ensure_unique(&nodes, "friendlyName", |node| &node.friendly_name)?;
    ensure_unique(&nodes, "hostname", |node| &node.hostname)?;

    Ok(NetworkFile {
        network: network.clone(),
        nemesis_seed_folder: None,
        nodes,
    })
}

/// Expands `input` and writes the stripped topology to `path`.
///
/// Nothing is written when expansion fails. An existing topology is only
/// replaced when `force` is set.
pub fn expand_to_file(input: &NetworkInputFile, path: &Path, force: bool) -> Result<NetworkFile> {
    if path.exists() && !force {
        return Err(NetworkError::AlreadyExists(path.to_path_buf()));
    }
    let topology = expand(input)?;
    topology.save(path)?;
    info!(
        target: "cattle",
        nodes = topology.nodes.len(),
        path = %path.display(),
        "topology written"
    );
    Ok(topology)
}

/// Two-digit counter, prefixed with the region outside region 0.
pub fn friendly_number(counter: u32, region: u32) -> String {
    if region == 0 {
        format!("{:02}", counter)
    } else {
        format!("{}{:02}", region, counter)
    }
}

/// Per-node configuration override handed to the node toolkit.
pub fn node_overrides(
    metadata: &NodeTypeMetadata,
    rest_protocol: RestProtocol,
    rest_url: &str,
    explorer_url: &str,
) -> Value {
    let mut entries = vec![
        ("privateKeySecurityMode", Value::from("PROMPT_MAIN")),
        (
            "nodes",
            Value::Sequence(vec![yaml::mapping([
                ("voting", Value::Bool(metadata.voting)),
                ("harvesting", Value::Bool(metadata.harvesting)),
            ])]),
        ),
    ];

    if metadata.api && rest_protocol.https_enabled() {
        entries.push((
            "gateways",
            Value::Sequence(vec![yaml::mapping([(
                "openPort",
                Value::Bool(rest_protocol.http_enabled()),
            )])]),
        ));
        entries.push((
            "httpsProxies",
            Value::Sequence(vec![yaml::mapping([(
                "excludeDockerService",
                Value::Bool(false),
            )])]),
        ));
    }

    if metadata.demo {
        let environment = yaml::mapping([
            ("DEFAULT_NODE", Value::from(rest_url)),
            ("DEFAULT_NODE_CLIENT", Value::from(rest_url)),
            ("EXPLORER_URL", Value::from(explorer_url)),
        ]);
        entries.push((
            "faucets",
            Value::Sequence(vec![yaml::mapping([("environment", environment)])]),
        ));
    }

    yaml::mapping(entries)
}

fn ensure_unique<'a, F>(nodes: &'a [NodeInformation], field: &'static str, key: F) -> Result<()>
where
    F: Fn(&'a NodeInformation) -> &'a String,
{
    let mut seen = HashSet::new();
    for node in nodes {
        let value = key(node);
        if !seen.insert(value.as_str()) {
            return Err(NetworkError::DuplicateIdentifier {
                field,
                value: value.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cattle_config::{NetworkDefinition, NodeType, NodeTypeInput};

    fn input(groups: Vec<NodeTypeInput>) -> NetworkInputFile {
        let mut network = NetworkDefinition::new("testnet", "example.org");
        network.suffix = "a".into();
        NetworkInputFile {
            network,
            node_types: groups,
        }
    }

    #[test]
    fn numbers_nodes_in_input_order() {
        let topology = expand(&input(vec![
            NodeTypeInput::from_catalog(NodeType::VotingDual, 2),
            NodeTypeInput::from_catalog(NodeType::Peer, 1),
            NodeTypeInput::from_catalog(NodeType::Dual, 1),
        ]))
        .unwrap();

        let names: Vec<_> = topology
            .nodes
            .iter()
            .map(|node| (node.number, node.friendly_name.as_str()))
            .collect();
        // votingDual and dual share the "dual" nickname counter
        assert_eq!(
            names,
            vec![(1, "dual-01-a"), (2, "dual-02-a"), (3, "peer-01-a"), (4, "dual-03-a")]
        );
        assert_eq!(topology.nodes[2].hostname, "peer-01-a.example.org");
        assert_eq!(topology.nodes[0].assembly, "dual");
        assert_eq!(topology.nodes[2].assembly, "peer");
    }

    #[test]
    fn friendly_number_padding() {
        assert_eq!(friendly_number(1, 0), "01");
        assert_eq!(friendly_number(12, 0), "12");
        assert_eq!(friendly_number(123, 0), "123");
        assert_eq!(friendly_number(3, 2), "203");
    }

    #[test]
    fn https_only_api_closes_plain_port() {
        let overrides = node_overrides(
            NodeType::Api.metadata(),
            RestProtocol::HttpsOnly,
            "https://api-01.example.org:3001",
            "http://api-01.example.org:90/",
        );
        assert_eq!(overrides["privateKeySecurityMode"], Value::from("PROMPT_MAIN"));
        assert_eq!(overrides["nodes"][0]["harvesting"], Value::Bool(false));
        assert_eq!(overrides["gateways"][0]["openPort"], Value::Bool(false));
        assert_eq!(
            overrides["httpsProxies"][0]["excludeDockerService"],
            Value::Bool(false)
        );
        assert!(overrides.get("faucets").is_none());
    }

    #[test]
    fn both_protocols_keep_plain_port_open() {
        let overrides = node_overrides(
            NodeType::Dual.metadata(),
            RestProtocol::Both,
            "https://dual-01.example.org:3001",
            "http://dual-01.example.org:90/",
        );
        assert_eq!(overrides["gateways"][0]["openPort"], Value::Bool(true));
        assert!(overrides.get("httpsProxies").is_some());
    }

    #[test]
    fn http_only_and_peers_get_no_gateway_overrides() {
        let http = node_overrides(NodeType::Api.metadata(), RestProtocol::HttpOnly, "", "");
        assert!(http.get("gateways").is_none());
        assert!(http.get("httpsProxies").is_none());

        let peer = node_overrides(NodeType::VotingPeer.metadata(), RestProtocol::HttpsOnly, "", "");
        assert!(peer.get("gateways").is_none());
        assert_eq!(peer["nodes"][0]["voting"], Value::Bool(true));
    }

    #[test]
    fn demo_faucet_points_at_its_own_node() {
        let topology = expand(&input(vec![NodeTypeInput::from_catalog(NodeType::Demo, 1)])).unwrap();
        let environment = &topology.nodes[0].custom_preset["faucets"][0]["environment"];
        assert_eq!(
            environment["DEFAULT_NODE"],
            Value::from("https://demo-01-a.example.org:3001")
        );
        assert_eq!(
            environment["EXPLORER_URL"],
            Value::from("http://demo-01-a.example.org:90/")
        );
    }

    #[test]
    fn template_without_number_collides() {
        let mut input = input(vec![NodeTypeInput::from_catalog(NodeType::Peer, 2)]);
        input.network.friendly_name_template = "$nickname-$suffix".into();
        match expand(&input) {
            Err(NetworkError::DuplicateIdentifier { field, value }) => {
                assert_eq!(field, "friendlyName");
                assert_eq!(value, "peer-a");
            }
            other => panic!("expected duplicate identifier, got {:?}", other),
        }
    }

    #[test]
    fn invalid_input_is_a_validation_error() {
        let mut input = input(vec![NodeTypeInput::from_catalog(NodeType::Peer, 0)]);
        assert!(matches!(expand(&input), Err(NetworkError::Validation(_))));

        input.node_types[0].count = 1;
        input.network.is_new_network = true;
        assert!(matches!(expand(&input), Err(NetworkError::Validation(_))));
    }
}
