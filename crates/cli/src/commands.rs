//! Command handlers.

use anyhow::{bail, Context, Result};
use serde_yaml::Value;
use std::path::PathBuf;
use tracing::{info, warn};

use cattle_config::{NetworkFile, NetworkInputFile, NetworkPreset, NodeTypeInput};
use cattle_ledger::{generate_genesis, GenesisOptions};
use cattle_network::{expand_to_file, init_input_file, InitOptions};
use cattle_node::{update_nodes, CommandToolkit, UpdateOptions};
use cattle_wallets::{verify_keys, KeyStore, KeyStoreOptions, LazyKeyStore, StoreMode};

use crate::args::{CliArgs, Command, CommonArgs};
use crate::prompt::{self, TerminalPrompt};

pub fn run(cli: CliArgs) -> Result<()> {
    let common = &cli.common;
    match cli.command {
        Command::Init {
            preset,
            domain,
            suffix,
            existing,
            nodes,
            force,
        } => init(common, preset, domain, suffix, existing, nodes, force),
        Command::Expand { force } => expand(common, force),
        Command::Genesis { regenerate } => genesis(common, regenerate),
        Command::UpdateNodes { overrides } => update(common, overrides),
        Command::Verify => verify(common),
    }
}

fn init(
    common: &CommonArgs,
    preset: String,
    domain: Option<String>,
    suffix: String,
    existing: bool,
    nodes: Vec<(cattle_config::NodeType, u32)>,
    force: bool,
) -> Result<()> {
    let path = common.input_file();
    let interactive = !common.ready;

    let domain = match domain {
        Some(domain) => domain,
        None if interactive => prompt::prompt_text("Domain", "cattle.local")?,
        None => bail!("--domain is required with --ready"),
    };
    let mut options = InitOptions::new(preset, domain);
    options.new_network = !existing;
    options.suffix = suffix;

    if !nodes.is_empty() {
        options.node_types = nodes
            .into_iter()
            .map(|(node_type, count)| NodeTypeInput::from_catalog(node_type, count))
            .collect();
    } else if interactive {
        if options.suffix.is_empty() {
            options.suffix = prompt::prompt_text("Hostname suffix", "")?;
        }
        for group in &mut options.node_types {
            group.count = prompt::prompt_count(
                &format!("How many {} nodes", group.node_type),
                group.count,
            )?;
        }
        options.node_types.retain(|group| group.count > 0);
    }

    let force = force
        || (interactive
            && path.exists()
            && prompt::confirm(&format!("{} exists. Overwrite it?", path.display()), false)?);
    init_input_file(&path, &options, force)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn expand(common: &CommonArgs, force: bool) -> Result<()> {
    let input = NetworkInputFile::load(&common.input_file())
        .context("failed to load the input file; run `cattle init` first")?;
    let path = common.network_file();
    let topology = expand_to_file(&input, &path, force)
        .with_context(|| format!("failed to expand into {}", path.display()))?;
    println!("Wrote {} nodes to {}", topology.nodes.len(), path.display());
    Ok(())
}

fn genesis(common: &CommonArgs, regenerate: bool) -> Result<()> {
    let mut topology = load_topology(common)?;
    let mut store = lazy_store(common, &topology, StoreMode::CreateIfMissing)?;
    let mut toolkit = CommandToolkit::new(&common.toolkit);
    let options = GenesisOptions {
        working_dir: common.working_dir.clone(),
        regenerate,
        ready: common.ready,
    };

    let descriptor = generate_genesis(&mut topology, &mut store, &mut toolkit, &TerminalPrompt, &options)
        .context("nemesis generation failed")?;
    println!(
        "Nemesis seed written ({} transactions, candidate node {})",
        descriptor.transactions.len(),
        descriptor.candidate_node_number
    );
    Ok(())
}

fn update(common: &CommonArgs, overrides: Option<PathBuf>) -> Result<()> {
    let mut topology = load_topology(common)?;
    let node_overrides = overrides
        .map(|path| {
            cattle_config::yaml::load::<Value>(&path)
                .with_context(|| format!("failed to read overrides {}", path.display()))
        })
        .transpose()?;
    let mut store = lazy_store(common, &topology, StoreMode::CreateIfMissing)?;
    let mut toolkit = CommandToolkit::new(&common.toolkit);
    let options = UpdateOptions {
        working_dir: common.working_dir.clone(),
        ready: common.ready,
        node_overrides,
    };

    update_nodes(&mut topology, &mut store, &mut toolkit, &TerminalPrompt, &options)
        .context("node update failed")?;
    println!("Updated {} nodes", topology.nodes.len());
    Ok(())
}

fn verify(common: &CommonArgs) -> Result<()> {
    let topology = load_topology(common)?;
    let mut store = lazy_store(common, &topology, StoreMode::RequireExisting)?;
    let report = verify_keys(&mut store, &topology).context("key verification failed")?;
    if !report.is_ok() {
        for problem in &report.problems {
            eprintln!("  {}", problem);
        }
        bail!(
            "{} problem(s) found across {} nodes",
            report.problems.len(),
            report.checked_nodes
        );
    }
    println!("Key store backs all {} nodes", report.checked_nodes);
    Ok(())
}

fn load_topology(common: &CommonArgs) -> Result<NetworkFile> {
    let path = common.network_file();
    NetworkFile::load(&path).with_context(|| {
        format!(
            "failed to load {}; run `cattle expand` first",
            path.display()
        )
    })
}

/// Key store opened, and its password asked for, on first use.
fn lazy_store(common: &CommonArgs, topology: &NetworkFile, mode: StoreMode) -> Result<LazyKeyStore> {
    let preset = NetworkPreset::for_network_in(&topology.network, &common.working_dir)
        .context("failed to resolve the network preset")?;
    let path = common.key_store_file();
    let password = common.password.clone();
    let no_password = common.no_password;
    let ready = common.ready;
    let network_identifier = preset.network_identifier;

    Ok(LazyKeyStore::new(move || {
        let mut options = KeyStoreOptions::new(network_identifier).mode(mode);
        match (&password, no_password, ready) {
            (Some(password), _, _) => options = options.password(password.as_str()),
            (None, true, _) => {}
            (None, false, true) => {
                warn!(target: "cattle", "no key store password given in ready mode");
            }
            (None, false, false) => {
                let password = prompt::prompt_password(!path.exists())
                    .map_err(cattle_wallets::KeyStoreError::PasswordPrompt)?;
                options = options.password(password.as_str());
            }
        }
        info!(target: "cattle", path = %path.display(), "opening key store");
        KeyStore::open(&path, options)
    }))
}
