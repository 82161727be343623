//! `CommandToolkit` against shell-script toolkits.
#![cfg(unix)]

use cattle_config::{
    NetworkDefinition, NetworkPreset, NodeInformation, NodeType, RestProtocol, VotingAddress,
};
use cattle_cryptography::{PrivateKey, PublicKey};
use cattle_node::command::VOTING_KEY_FILE;
use cattle_node::{
    AccountPrompt, CommandToolkit, KeyStoreAccountResolver, KeyStoreVotingKeyFiles,
    NemesisRenderRequest, NodeConfigureRequest, NodeError, NodeToolkit, Result,
};
use cattle_wallets::{KeyStore, KeyStoreOptions};
use serde_yaml::Value;
use std::cell::RefCell;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Records what it was called with, then answers with a rendered preset.
const RECORDING_CONFIGURE: &str = r#"
dir=$(dirname "$3")
echo "$1 $2 $4" > "$dir/seen-args.txt"
ls -l "$3" > "$dir/seen-mode.txt"
cat "$3" > "$dir/seen-request.yml"
printf 'renderedPreset:\n  assembly: rendered\n' > "$5"
"#;

const RECORDING_NEMESIS: &str = r#"
dir=$(dirname "$3")
echo "$1 $2 $4" > "$dir/seen-args.txt"
ls -l "$3" > "$dir/seen-mode.txt"
mkdir -p "$5/00000"
echo nemesis > "$5/00000/00001.dat"
"#;

const FAILING: &str = r#"
echo "cannot render $1" >&2
exit 3
"#;

const SILENT: &str = "exit 0\n";

struct NoPrompt;

impl AccountPrompt for NoPrompt {
    fn prompt_private_key(&self, message: &str, _: Option<&PublicKey>) -> Result<PrivateKey> {
        panic!("unexpected prompt: {}", message)
    }
}

/// Runs `script` through `/bin/sh`, so nothing has to be made executable.
fn toolkit(dir: &TempDir, script: &str) -> CommandToolkit {
    let path = dir.path().join("toolkit.sh");
    fs::write(&path, script).unwrap();
    CommandToolkit::new("/bin/sh").arg(path)
}

fn node(number: u32, node_type: NodeType, name: &str) -> NodeInformation {
    NodeInformation {
        number,
        node_type,
        nickname: node_type.metadata().nickname.into(),
        friendly_name: name.into(),
        hostname: format!("{}.example.org", name),
        assembly: node_type.metadata().assembly().into(),
        balances: Vec::new(),
        rest_protocol: RestProtocol::HttpsOnly,
        custom_preset: Value::Null,
        addresses: None,
    }
}

fn preset() -> NetworkPreset {
    NetworkPreset::for_network(&NetworkDefinition::new("testnet", "example.org")).unwrap()
}

fn configure_request(dir: &TempDir, node: NodeInformation) -> NodeConfigureRequest {
    NodeConfigureRequest {
        preset: preset(),
        overrides: Value::Null,
        assembly: node.assembly.clone(),
        working_dir: dir.path().join("nodes").join(&node.friendly_name),
        node,
    }
}

fn configure(
    dir: &TempDir,
    toolkit: &mut CommandToolkit,
    request: &NodeConfigureRequest,
) -> Result<cattle_node::NodeConfigureResponse> {
    let store = KeyStore::open(dir.path().join("key-store.yml"), KeyStoreOptions::new(0x98))
        .unwrap();
    let store = RefCell::new(store);
    let node = &request.node;
    let resolver = KeyStoreAccountResolver::for_node(
        &store,
        node.friendly_name.clone(),
        node.number,
        &NoPrompt,
        true,
        0x98,
    );
    let voting = KeyStoreVotingKeyFiles::new(&store, node.friendly_name.clone(), node.number);
    toolkit.configure(request, &resolver, &voting)
}

fn mode(path: &Path) -> u32 {
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}

fn seen_request(node_dir: &Path) -> Value {
    serde_yaml::from_str(&fs::read_to_string(node_dir.join("seen-request.yml")).unwrap()).unwrap()
}

#[test]
fn configure_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut toolkit = toolkit(&dir, RECORDING_CONFIGURE);
    let request = configure_request(&dir, node(1, NodeType::VotingDual, "dual-01"));
    let node_dir = request.working_dir.clone();

    let response = configure(&dir, &mut toolkit, &request).unwrap();

    assert_eq!(
        fs::read_to_string(node_dir.join("seen-args.txt")).unwrap().trim(),
        "configure --request --response"
    );
    assert_eq!(response.rendered_preset["assembly"].as_str(), Some("rendered"));

    // the request was owner-only while the toolkit ran, and is gone now
    let seen_mode = fs::read_to_string(node_dir.join("seen-mode.txt")).unwrap();
    assert!(seen_mode.starts_with("-rw-------"), "{}", seen_mode);
    assert!(!node_dir.join("configure-request.yml").exists());

    let seen = seen_request(&node_dir);
    assert_eq!(seen["node"]["friendlyName"].as_str(), Some("dual-01"));
    assert!(seen["accounts"]["main"]["privateKey"].is_string());
    assert!(!seen["accounts"]["vrf"].is_null());
    assert!(!seen["accounts"]["remote"].is_null());

    let addresses = response.addresses.unwrap();
    assert!(addresses.vrf.is_some());
    assert!(addresses.remote.is_some());
    assert_eq!(addresses.voting.len(), 1);
    let VotingAddress {
        start_epoch,
        end_epoch,
        ..
    } = &addresses.voting[0];
    assert_eq!((*start_epoch, *end_epoch), (1, 720));

    let voting_file = node_dir.join(VOTING_KEY_FILE);
    assert!(!fs::read(&voting_file).unwrap().is_empty());
    assert_eq!(mode(&voting_file), 0o600);
}

#[test]
fn non_harvesting_nodes_get_no_vrf_or_remote_keys() {
    let dir = TempDir::new().unwrap();
    let mut toolkit = toolkit(&dir, RECORDING_CONFIGURE);
    let request = configure_request(&dir, node(2, NodeType::Api, "api-01"));
    let node_dir = request.working_dir.clone();

    let addresses = configure(&dir, &mut toolkit, &request)
        .unwrap()
        .addresses
        .unwrap();
    assert!(addresses.vrf.is_none());
    assert!(addresses.remote.is_none());
    assert!(addresses.voting.is_empty());
    assert!(!node_dir.join(VOTING_KEY_FILE).exists());

    let seen = seen_request(&node_dir);
    assert!(seen["accounts"]["main"].is_mapping());
    assert!(seen["accounts"]["vrf"].is_null());
    assert!(seen["accounts"]["remote"].is_null());
}

#[test]
fn services_nodes_are_sent_without_accounts() {
    let dir = TempDir::new().unwrap();
    let mut toolkit = toolkit(&dir, RECORDING_CONFIGURE);
    let request = configure_request(&dir, node(3, NodeType::Services, "services-01"));

    let response = configure(&dir, &mut toolkit, &request).unwrap();
    assert!(response.addresses.is_none());
    assert!(seen_request(&request.working_dir)["accounts"].is_null());
}

#[test]
fn failing_toolkit_reports_stderr_and_removes_the_request() {
    let dir = TempDir::new().unwrap();
    let mut toolkit = toolkit(&dir, FAILING);
    let request = configure_request(&dir, node(1, NodeType::Peer, "peer-01"));

    let err = configure(&dir, &mut toolkit, &request).unwrap_err();
    match err {
        NodeError::Toolkit(message) => assert!(message.contains("cannot render configure"), "{}", message),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(!request.working_dir.join("configure-request.yml").exists());
}

#[test]
fn missing_executable_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let mut toolkit = CommandToolkit::new(dir.path().join("no-such-toolkit"));
    let request = configure_request(&dir, node(1, NodeType::Peer, "peer-01"));

    let err = configure(&dir, &mut toolkit, &request).unwrap_err();
    assert!(matches!(err, NodeError::Io { .. }));
    assert!(!request.working_dir.join("configure-request.yml").exists());
}

fn render_request(dir: &TempDir) -> NemesisRenderRequest {
    NemesisRenderRequest {
        descriptor: dir.path().join("nemesis").join("nemesis-descriptor.yml"),
        preset: preset(),
        candidate: node(1, NodeType::Dual, "dual-01"),
        working_dir: dir.path().join("nemesis"),
    }
}

#[test]
fn nemesis_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut toolkit = toolkit(&dir, RECORDING_NEMESIS);
    let request = render_request(&dir);

    let seed = toolkit.render_nemesis(&request).unwrap();

    assert_eq!(seed, request.working_dir.join("seed"));
    assert!(seed.join("00000/00001.dat").exists());
    assert_eq!(
        fs::read_to_string(request.working_dir.join("seen-args.txt"))
            .unwrap()
            .trim(),
        "nemesis --request --output"
    );
    let seen_mode = fs::read_to_string(request.working_dir.join("seen-mode.txt")).unwrap();
    assert!(seen_mode.starts_with("-rw-------"), "{}", seen_mode);
    assert!(!request.working_dir.join("nemesis-request.yml").exists());
}

#[test]
fn nemesis_without_output_is_an_error() {
    let dir = TempDir::new().unwrap();
    let mut toolkit = toolkit(&dir, SILENT);
    let request = render_request(&dir);

    let err = toolkit.render_nemesis(&request).unwrap_err();
    assert!(matches!(err, NodeError::Toolkit(message) if message.contains("did not produce")));
    assert!(!request.working_dir.join("nemesis-request.yml").exists());
}

#[test]
fn failing_nemesis_removes_the_request() {
    let dir = TempDir::new().unwrap();
    let mut toolkit = toolkit(&dir, FAILING);
    let request = render_request(&dir);

    let err = toolkit.render_nemesis(&request).unwrap_err();
    assert!(matches!(err, NodeError::Toolkit(message) if message.contains("cannot render nemesis")));
    assert!(!request.working_dir.join("nemesis-request.yml").exists());
    assert!(!PathBuf::from(&request.working_dir).join("seed").exists());
}
