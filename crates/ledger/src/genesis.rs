//! Nemesis block assembly.
//!
//! Walks the topology in order, resolving every node's accounts from the key
//! store, crediting balances and signing the key-link transactions. Every
//! value the block depends on is resolved before the toolkit is called, so a
//! failed run never leaves a seed behind.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use cattle_config::{
    AccountAddress, NetworkFile, NetworkPreset, NodeInformation, NEMESIS_DESCRIPTOR_FILE_NAME,
    NEMESIS_SEED_DIR, NEMESIS_WORK_DIR, NETWORK_FILE_NAME,
};
use cattle_cryptography::{parse_hash_seed, Account, Address, KeyLinkTransaction, PublicKey};
use cattle_node::{
    AccountPrompt, AccountResolver, KeyStoreAccountResolver, KeyStoreVotingKeyFiles,
    NemesisRenderRequest, NodeToolkit, VotingKeyFileProvider,
};
use cattle_wallets::{KeyStoreError, NetworkAccountRole, NodeKeyRole, SecretStore};

use crate::{
    BalanceSheet, FaucetSeed, GenesisError, KnownPeer, MosaicDistribution, NemesisDescriptor,
    PeerRole, Result, TransactionLedger, MAX_NODE_NUMBER,
};

/// First epoch covered by nemesis voting keys
const FIRST_VOTING_EPOCH: u32 = 1;

#[derive(Debug, Clone, Default)]
pub struct GenesisOptions {
    pub working_dir: PathBuf,
    /// Replace an existing nemesis seed
    pub regenerate: bool,
    /// Fail instead of prompting
    pub ready: bool,
}

/// Network accounts the nemesis block references.
struct NetworkAccounts {
    nemesis_signer: Account,
    founder: Account,
    faucet: Option<Account>,
}

/// Builds the nemesis seed for a new network and records it on `topology`.
///
/// The descriptor is written to `nemesis/`, rendered by `toolkit`, and the
/// rendered seed is copied to `nemesis-seed/`. The topology is persisted
/// only after the seed is in place.
pub fn generate_genesis<S: SecretStore>(
    topology: &mut NetworkFile,
    store: &mut S,
    toolkit: &mut dyn NodeToolkit,
    prompt: &dyn AccountPrompt,
    options: &GenesisOptions,
) -> Result<NemesisDescriptor> {
    if !topology.network.is_new_network {
        return Err(GenesisError::NotNewNetwork);
    }
    let seed_dir = options.working_dir.join(NEMESIS_SEED_DIR);
    if let Some(existing) = existing_seed(topology, &options.working_dir) {
        if !options.regenerate {
            return Err(GenesisError::AlreadyGenerated(existing));
        }
        info!(target: "cattle", seed = %existing.display(), "regenerating nemesis seed");
    }

    let mut preset = NetworkPreset::for_network_in(&topology.network, &options.working_dir)?;
    let descriptor = build_descriptor(topology, &mut preset, store, prompt, options.ready)?;

    let work_dir = options.working_dir.join(NEMESIS_WORK_DIR);
    let descriptor_path = work_dir.join(NEMESIS_DESCRIPTOR_FILE_NAME);
    descriptor.save(&descriptor_path)?;

    let candidate = topology
        .node(descriptor.candidate_node_number)
        .cloned()
        .ok_or(GenesisError::NoCandidateNode)?;
    let rendered = toolkit.render_nemesis(&NemesisRenderRequest {
        descriptor: descriptor_path,
        preset,
        candidate,
        working_dir: work_dir,
    })?;

    if rendered != seed_dir {
        replace_dir(&rendered, &seed_dir)?;
    }

    let mut updated = topology.clone();
    updated.nemesis_seed_folder = Some(PathBuf::from(NEMESIS_SEED_DIR));
    updated.save(&options.working_dir.join(NETWORK_FILE_NAME))?;
    *topology = updated;

    info!(
        target: "cattle",
        seed = %seed_dir.display(),
        transactions = descriptor.transactions.len(),
        distributions = descriptor.total_distributions(),
        candidate = descriptor.candidate_node_number,
        "nemesis seed generated"
    );
    Ok(descriptor)
}

fn existing_seed(topology: &NetworkFile, working_dir: &Path) -> Option<PathBuf> {
    topology
        .nemesis_seed_folder
        .as_ref()
        .map(|folder| working_dir.join(folder))
        .into_iter()
        .chain(std::iter::once(working_dir.join(NEMESIS_SEED_DIR)))
        .find(|path| path.exists())
}

/// Resolves every account and signs every transaction of the nemesis block.
///
/// Network account identities are written into `preset`. Nothing is
/// written to disk apart from key store updates.
pub fn build_descriptor<S: SecretStore>(
    topology: &NetworkFile,
    preset: &mut NetworkPreset,
    store: &mut S,
    prompt: &dyn AccountPrompt,
    ready: bool,
) -> Result<NemesisDescriptor> {
    let generation_hash_seed = preset
        .generation_hash_seed
        .clone()
        .ok_or_else(|| GenesisError::Unresolved("generationHashSeed".into()))?;
    let seed = parse_hash_seed(&generation_hash_seed)?;
    if preset.mosaics.is_empty() {
        return Err(GenesisError::Unresolved("mosaics".into()));
    }
    let mut balances = BalanceSheet::new(&preset.mosaics)?;
    check_node_numbers(topology)?;
    let candidate_node_number = candidate_node(topology)?;
    let lifetimes = voting_lifetimes(topology, preset)?;

    let accounts = resolve_network_accounts(store, preset, &topology.network.faucet_balances)?;
    let network_identifier = preset.network_identifier;

    let mut transactions = TransactionLedger::new();
    let mut known_peers = Vec::new();
    let mut known_rest_gateways = Vec::new();

    let store = RefCell::new(store);
    for node in topology.nodes.iter().filter(|node| !node.metadata().services_only) {
        let metadata = node.metadata();
        let resolver = KeyStoreAccountResolver::for_node(
            &store,
            node.friendly_name.clone(),
            node.number,
            prompt,
            ready,
            network_identifier,
        );
        let known = node.addresses.as_ref();
        let main = resolve(&resolver, NodeKeyRole::Main, known.map(|k| &k.main))?;
        let vrf = resolve(&resolver, NodeKeyRole::Vrf, known.and_then(|k| k.vrf.as_ref()))?;
        let remote = resolve(&resolver, NodeKeyRole::Remote, known.and_then(|k| k.remote.as_ref()))?;

        let (host, port) = node.peer_endpoint();
        known_peers.push(KnownPeer {
            public_key: main.public_key().to_hex(),
            host,
            port,
            roles: peer_roles(node),
        });
        if metadata.api {
            known_rest_gateways.push(node.rest_url());
        }

        balances.credit_all(main.address().as_str(), &node.balances)?;

        let vrf_link = KeyLinkTransaction::vrf_key_link(network_identifier, *vrf.public_key())
            .sign(&main, &seed)?;
        transactions.insert(node.number, &vrf_link);
        let remote_link =
            KeyLinkTransaction::account_key_link(network_identifier, *remote.public_key())
                .sign(&main, &seed)?;
        transactions.insert(node.number, &remote_link);

        if let Some(lifetime) = lifetimes.get(&node.number) {
            let voting = KeyStoreVotingKeyFiles::new(&store, node.friendly_name.clone(), node.number);
            let file = voting.voting_key_file(FIRST_VOTING_EPOCH, *lifetime)?;
            let voting_link = KeyLinkTransaction::voting_key_link(
                network_identifier,
                *file.public_key(),
                file.start_epoch(),
                file.end_epoch(),
            )
            .sign(&main, &seed)?;
            transactions.insert(node.number, &voting_link);
        }

        debug!(
            target: "cattle",
            node = %node.friendly_name,
            number = node.number,
            address = %main.address(),
            "nemesis accounts resolved"
        );
    }

    if let Some(faucet) = &accounts.faucet {
        balances.credit_all(faucet.address().as_str(), &topology.network.faucet_balances)?;
    }
    for distribution in &topology.network.additional_currency_distributions {
        distribution.address.parse::<Address>().map_err(|err| {
            GenesisError::Validation(format!("additional distribution: {}", err))
        })?;
        balances.credit(distribution.mosaic_index, &distribution.address, distribution.amount)?;
    }

    let founder = accounts.founder.public_key().to_hex();
    let mosaics = balances
        .into_parts()
        .map(|((name, divisibility), currency_distributions)| MosaicDistribution {
            name,
            divisibility,
            accounts: vec![founder.clone()],
            currency_distributions,
        })
        .collect();

    Ok(NemesisDescriptor {
        nemesis_signer_private_key: private_key_hex(&accounts.nemesis_signer, "nemesis signer")?,
        generation_hash_seed,
        mosaics,
        transactions,
        faucet: match &accounts.faucet {
            Some(faucet) => FaucetSeed {
                private_key: Some(private_key_hex(faucet, "faucet")?),
                repeat: 1,
            },
            None => FaucetSeed::default(),
        },
        known_peers,
        known_rest_gateways,
        candidate_node_number,
    })
}

fn check_node_numbers(topology: &NetworkFile) -> Result<()> {
    match topology
        .nodes
        .iter()
        .find(|node| node.number > MAX_NODE_NUMBER)
    {
        Some(node) => Err(GenesisError::Validation(format!(
            "node {} is numbered {}; nemesis keys allow at most {}",
            node.friendly_name, node.number, MAX_NODE_NUMBER
        ))),
        None => Ok(()),
    }
}

/// First harvesting node, by topology order.
fn candidate_node(topology: &NetworkFile) -> Result<u32> {
    topology
        .nodes
        .iter()
        .find(|node| node.metadata().harvesting && !node.metadata().services_only)
        .map(|node| node.number)
        .ok_or(GenesisError::NoCandidateNode)
}

fn voting_lifetimes(
    topology: &NetworkFile,
    preset: &NetworkPreset,
) -> Result<std::collections::BTreeMap<u32, u32>> {
    topology
        .nodes
        .iter()
        .filter(|node| node.metadata().voting && !node.metadata().services_only)
        .map(|node| {
            node.voting_key_lifetime(preset)
                .map(|lifetime| (node.number, lifetime))
                .ok_or_else(|| {
                    GenesisError::Unresolved(format!(
                        "votingKeyDesiredLifetime of {}",
                        node.friendly_name
                    ))
                })
        })
        .collect()
}

fn resolve_network_accounts<S: SecretStore>(
    store: &mut S,
    preset: &mut NetworkPreset,
    faucet_balances: &[u64],
) -> Result<NetworkAccounts> {
    let nemesis_signer = store.get_network_account(NetworkAccountRole::NemesisSigner, true)?;
    let founder = store.get_network_account(NetworkAccountRole::Founder, true)?;
    let harvest_sink = store.get_network_account(NetworkAccountRole::HarvestNetworkFeeSink, true)?;
    let namespace_sink =
        store.get_network_account(NetworkAccountRole::NamespaceRentalFeeSink, true)?;
    let mosaic_sink = store.get_network_account(NetworkAccountRole::MosaicRentalFeeSink, true)?;

    let faucet = if faucet_balances.iter().any(|balance| *balance > 0) {
        Some(store.get_network_account(NetworkAccountRole::Faucet, true)?)
    } else {
        match store.get_network_account(NetworkAccountRole::Faucet, false) {
            Ok(account) => Some(account),
            Err(KeyStoreError::AccountNotFound(_)) => None,
            Err(err) => return Err(err.into()),
        }
    };

    preset.nemesis_signer_public_key = Some(nemesis_signer.public_key().to_hex());
    preset.founder_public_key = Some(founder.public_key().to_hex());
    preset.harvest_network_fee_sink_address = Some(harvest_sink.address().to_string());
    preset.namespace_rental_fee_sink_address = Some(namespace_sink.address().to_string());
    preset.mosaic_rental_fee_sink_address = Some(mosaic_sink.address().to_string());

    Ok(NetworkAccounts {
        nemesis_signer,
        founder,
        faucet,
    })
}

fn resolve(
    resolver: &dyn AccountResolver,
    role: NodeKeyRole,
    known: Option<&AccountAddress>,
) -> Result<Account> {
    let known = known
        .map(|address| address.public_key.parse::<PublicKey>())
        .transpose()?;
    Ok(resolver.resolve(role, known.as_ref())?)
}

fn peer_roles(node: &NodeInformation) -> Vec<PeerRole> {
    let metadata = node.metadata();
    [
        (metadata.api, PeerRole::Api),
        (metadata.peer, PeerRole::Peer),
        (metadata.voting, PeerRole::Voting),
    ]
    .into_iter()
    .filter_map(|(enabled, role)| enabled.then_some(role))
    .collect()
}

fn private_key_hex(account: &Account, what: &str) -> Result<String> {
    account
        .private_key()
        .map(|key| key.to_hex())
        .ok_or_else(|| GenesisError::Unresolved(format!("{} private key", what)))
}

/// Copies `from` next to `to`, then swaps it in. A failed copy leaves any
/// previous `to` in place.
fn replace_dir(from: &Path, to: &Path) -> Result<()> {
    let staging = to.with_extension("tmp");
    let previous = to.with_extension("old");
    for leftover in [&staging, &previous] {
        if leftover.exists() {
            fs::remove_dir_all(leftover).map_err(|err| GenesisError::io(leftover, err))?;
        }
    }
    if let Err(err) = copy_dir(from, &staging) {
        let _ = fs::remove_dir_all(&staging);
        return Err(err);
    }

    if to.exists() {
        fs::rename(to, &previous).map_err(|err| GenesisError::io(to, err))?;
    }
    fs::rename(&staging, to).map_err(|err| GenesisError::io(to, err))?;
    if previous.exists() {
        fs::remove_dir_all(&previous).map_err(|err| GenesisError::io(&previous, err))?;
    }
    Ok(())
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).map_err(|err| GenesisError::io(to, err))?;
    for entry in fs::read_dir(from).map_err(|err| GenesisError::io(from, err))? {
        let entry = entry.map_err(|err| GenesisError::io(from, err))?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        if source.is_dir() {
            copy_dir(&source, &target)?;
        } else {
            fs::copy(&source, &target).map_err(|err| GenesisError::io(&source, err))?;
        }
    }
    Ok(())
}
