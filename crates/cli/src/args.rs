use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use cattle_config::{NodeType, INPUT_FILE_NAME, KEY_STORE_FILE_NAME, NETWORK_FILE_NAME};

/// Command-line arguments for cattle
#[derive(Parser, Debug, Clone)]
#[command(
    name = "cattle",
    version = env!("CARGO_PKG_VERSION"),
    about = "Bootstrap a cluster of blockchain nodes",
    long_about = "cattle expands a compact network description into a node topology, keeps every node's keys in one key store, and assembles the nemesis block of new networks."
)]
pub struct CliArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every command
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CommonArgs {
    /// Directory holding the input file, topology and key store
    #[arg(
        long = "working-dir",
        env = "CATTLE_WORKDIR",
        value_name = "DIR",
        default_value = ".",
        global = true
    )]
    pub working_dir: PathBuf,

    /// Key store password
    #[arg(
        long = "password",
        env = "CATTLE_PASSWORD",
        value_name = "PASSWORD",
        hide_env_values = true,
        global = true,
        conflicts_with = "no_password"
    )]
    pub password: Option<String>,

    /// Keep the key store unencrypted and never ask for a password
    #[arg(long = "no-password", global = true)]
    pub no_password: bool,

    /// Never prompt; fail when input would be needed
    #[arg(long = "ready", global = true)]
    pub ready: bool,

    /// Debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Node configuration toolkit executable
    #[arg(
        long = "toolkit",
        env = "CATTLE_TOOLKIT",
        value_name = "PROGRAM",
        default_value = "cattle-toolkit",
        global = true
    )]
    pub toolkit: PathBuf,
}

impl CommonArgs {
    pub fn input_file(&self) -> PathBuf {
        self.working_dir.join(INPUT_FILE_NAME)
    }

    pub fn network_file(&self) -> PathBuf {
        self.working_dir.join(NETWORK_FILE_NAME)
    }

    pub fn key_store_file(&self) -> PathBuf {
        self.working_dir.join(KEY_STORE_FILE_NAME)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write a starter input file
    Init {
        /// Base preset
        #[arg(long, default_value = "testnet")]
        preset: String,

        /// Domain every node hostname ends with
        #[arg(long)]
        domain: Option<String>,

        /// Value of `$suffix` in friendly names
        #[arg(long, default_value = "")]
        suffix: String,

        /// Join an existing network instead of creating one
        #[arg(long)]
        existing: bool,

        /// Node groups as `type=count`, e.g. `votingDual=2`
        #[arg(long = "nodes", value_name = "TYPE=COUNT", value_delimiter = ',', value_parser = parse_node_group)]
        nodes: Vec<(NodeType, u32)>,

        /// Overwrite an existing input file
        #[arg(long)]
        force: bool,
    },

    /// Expand the input file into the node topology
    Expand {
        /// Overwrite an existing topology
        #[arg(long)]
        force: bool,
    },

    /// Assemble the nemesis block of a new network
    Genesis {
        /// Replace an existing nemesis seed
        #[arg(long)]
        regenerate: bool,
    },

    /// Configure every node and record its accounts in the topology
    UpdateNodes {
        /// YAML file of extra overrides keyed by friendly name
        #[arg(long, value_name = "FILE")]
        overrides: Option<PathBuf>,
    },

    /// Check that the key store backs every account of the topology
    Verify,
}

/// Parses a `type=count` node group.
pub fn parse_node_group(value: &str) -> Result<(NodeType, u32), String> {
    let (node_type, count) = value
        .split_once('=')
        .ok_or_else(|| format!("expected TYPE=COUNT, got '{}'", value))?;
    let node_type = node_type.parse::<NodeType>().map_err(|err| err.to_string())?;
    let count = count
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid count '{}': {}", count, err))?;
    Ok((node_type, count))
}
