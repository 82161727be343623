//! Node-type catalog.
//!
//! A closed set of node archetypes with their role flags, suggested balances
//! and naming hints. The table is compiled in and never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

/// Node archetypes a user can request in the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    VotingDual,
    VotingPeer,
    Dual,
    Peer,
    Api,
    Demo,
    Services,
}

/// Static metadata attached to a [`NodeType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeTypeMetadata {
    pub api: bool,
    pub peer: bool,
    pub harvesting: bool,
    pub voting: bool,
    pub demo: bool,
    pub services_only: bool,
    /// Default nickname used in friendly names
    pub nickname: &'static str,
    /// Suggested balance per mosaic, indexed like the preset mosaics
    pub balances: &'static [u64],
    /// Fixed assembly overriding the role rule
    pub fixed_assembly: Option<&'static str>,
}

impl NodeTypeMetadata {
    /// Deployment assembly selected by the role flags.
    pub fn assembly(&self) -> &'static str {
        if let Some(fixed) = self.fixed_assembly {
            return fixed;
        }
        match (self.api, self.peer) {
            (true, true) => "dual",
            (true, false) => "api",
            _ => "peer",
        }
    }
}

const CATALOG: [NodeTypeMetadata; 7] = [
    // VotingDual
    NodeTypeMetadata {
        api: true,
        peer: true,
        harvesting: true,
        voting: true,
        demo: false,
        services_only: false,
        nickname: "dual",
        balances: &[3_000_000, 150],
        fixed_assembly: None,
    },
    // VotingPeer
    NodeTypeMetadata {
        api: false,
        peer: true,
        harvesting: true,
        voting: true,
        demo: false,
        services_only: false,
        nickname: "beacon",
        balances: &[3_000_000, 150],
        fixed_assembly: None,
    },
    // Dual
    NodeTypeMetadata {
        api: true,
        peer: true,
        harvesting: true,
        voting: false,
        demo: false,
        services_only: false,
        nickname: "dual",
        balances: &[1_000_000, 150],
        fixed_assembly: None,
    },
    // Peer
    NodeTypeMetadata {
        api: false,
        peer: true,
        harvesting: true,
        voting: false,
        demo: false,
        services_only: false,
        nickname: "peer",
        balances: &[1_000_000, 150],
        fixed_assembly: None,
    },
    // Api
    NodeTypeMetadata {
        api: true,
        peer: false,
        harvesting: false,
        voting: false,
        demo: false,
        services_only: false,
        nickname: "api",
        balances: &[0, 0],
        fixed_assembly: None,
    },
    // Demo
    NodeTypeMetadata {
        api: true,
        peer: true,
        harvesting: true,
        voting: false,
        demo: true,
        services_only: false,
        nickname: "demo",
        balances: &[1_000_000, 150],
        fixed_assembly: None,
    },
    // Services
    NodeTypeMetadata {
        api: false,
        peer: false,
        harvesting: false,
        voting: false,
        demo: true,
        services_only: true,
        nickname: "services",
        balances: &[0, 0],
        fixed_assembly: Some("services"),
    },
];

impl NodeType {
    /// Every node type, in catalog order
    pub const ALL: [NodeType; 7] = [
        NodeType::VotingDual,
        NodeType::VotingPeer,
        NodeType::Dual,
        NodeType::Peer,
        NodeType::Api,
        NodeType::Demo,
        NodeType::Services,
    ];

    /// Catalog entry for this node type.
    pub fn metadata(&self) -> &'static NodeTypeMetadata {
        &CATALOG[*self as usize]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::VotingDual => "votingDual",
            NodeType::VotingPeer => "votingPeer",
            NodeType::Dual => "dual",
            NodeType::Peer => "peer",
            NodeType::Api => "api",
            NodeType::Demo => "demo",
            NodeType::Services => "services",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|node_type| node_type.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownNodeType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembly_rule_follows_roles() {
        assert_eq!(NodeType::VotingDual.metadata().assembly(), "dual");
        assert_eq!(NodeType::Dual.metadata().assembly(), "dual");
        assert_eq!(NodeType::Api.metadata().assembly(), "api");
        assert_eq!(NodeType::Peer.metadata().assembly(), "peer");
        assert_eq!(NodeType::VotingPeer.metadata().assembly(), "peer");
        assert_eq!(NodeType::Services.metadata().assembly(), "services");
    }

    #[test]
    fn metadata_lines_up_with_enum() {
        assert!(NodeType::VotingPeer.metadata().voting);
        assert!(!NodeType::VotingPeer.metadata().api);
        assert!(NodeType::Demo.metadata().demo);
        assert!(NodeType::Services.metadata().services_only);
        assert_eq!(NodeType::VotingPeer.metadata().nickname, "beacon");
    }

    #[test]
    fn parses_camel_case_names() {
        for node_type in NodeType::ALL {
            assert_eq!(node_type.as_str().parse::<NodeType>().unwrap(), node_type);
        }
        assert_eq!("VOTINGDUAL".parse::<NodeType>().unwrap(), NodeType::VotingDual);
        assert!("validator".parse::<NodeType>().is_err());
    }
}
