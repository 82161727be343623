//! [`NodeToolkit`] backed by an external executable.
//!
//! Protocol: `<toolkit> configure --request <file> --response <file>` and
//! `<toolkit> nemesis --request <file> --output <dir>`. Request and response
//! files are YAML. The executable cannot call back, so accounts are resolved
//! up front and passed in the request, and the voting key file is written to
//! the node directory. Request files are owner-only and removed once the
//! executable returns.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use cattle_config::{yaml, AccountAddress, NodeAddresses, VotingAddress};
use cattle_cryptography::{Account, PublicKey};
use cattle_wallets::NodeKeyRole;

use crate::{
    AccountResolver, NemesisRenderRequest, NodeConfigureRequest, NodeConfigureResponse, NodeError,
    NodeToolkit, Result, VotingKeyFileProvider,
};

const CONFIGURE_REQUEST_FILE: &str = "configure-request.yml";
const CONFIGURE_RESPONSE_FILE: &str = "configure-response.yml";
const NEMESIS_REQUEST_FILE: &str = "nemesis-request.yml";
const NEMESIS_OUTPUT_DIR: &str = "seed";
/// Voting key file location inside a node directory
pub const VOTING_KEY_FILE: &str = "votingkeys/private_key_tree1.dat";

/// Toolkit executable driven through request/response files.
#[derive(Debug, Clone)]
pub struct CommandToolkit {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommandConfigureRequest<'a> {
    #[serde(flatten)]
    request: &'a NodeConfigureRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    accounts: Option<NodeAddresses>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CommandConfigureResponse {
    #[serde(default)]
    rendered_preset: Value,
}

impl CommandToolkit {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Adds an argument placed before the subcommand, e.g. the script an
    /// interpreter should run.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, command: &str, request: &Path, target_flag: &str, target: &Path) -> Result<()> {
        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .arg(command)
            .arg("--request")
            .arg(request)
            .arg(target_flag)
            .arg(target)
            .output()
            .map_err(|err| NodeError::io(&self.program, err))?;
        if !output.status.success() {
            return Err(NodeError::Toolkit(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        debug!(
            target: "cattle",
            program = %self.program.display(),
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            "toolkit finished"
        );
        Ok(())
    }
}

fn account_address(account: &Account) -> AccountAddress {
    AccountAddress {
        address: account.address().to_string(),
        public_key: account.public_key().to_hex(),
        private_key: account.private_key().map(|key| key.to_hex()),
    }
}

fn known_key(address: Option<&AccountAddress>) -> Result<Option<PublicKey>> {
    Ok(address
        .map(|address| address.public_key.parse::<PublicKey>())
        .transpose()?)
}

/// Resolves every account the node's roles need, plus its voting key file.
fn resolve_addresses(
    request: &NodeConfigureRequest,
    accounts: &dyn AccountResolver,
    voting: &dyn VotingKeyFileProvider,
) -> Result<NodeAddresses> {
    let metadata = request.node.metadata();
    let known = request.node.addresses.as_ref();
    let resolve = |role: NodeKeyRole, address: Option<&AccountAddress>| -> Result<AccountAddress> {
        let known = known_key(address)?;
        Ok(account_address(&accounts.resolve(role, known.as_ref())?))
    };

    let mut addresses = NodeAddresses {
        main: resolve(NodeKeyRole::Main, known.map(|k| &k.main))?,
        transport: Some(resolve(
            NodeKeyRole::Transport,
            known.and_then(|k| k.transport.as_ref()),
        )?),
        vrf: None,
        remote: None,
        voting: Vec::new(),
    };
    if metadata.harvesting {
        addresses.vrf = Some(resolve(NodeKeyRole::Vrf, known.and_then(|k| k.vrf.as_ref()))?);
        addresses.remote = Some(resolve(
            NodeKeyRole::Remote,
            known.and_then(|k| k.remote.as_ref()),
        )?);
    }

    if metadata.voting {
        let lifetime = request.node.voting_key_lifetime(&request.preset).ok_or_else(|| {
            NodeError::Toolkit("votingKeyDesiredLifetime is not configured".to_string())
        })?;
        let file = voting.voting_key_file(1, lifetime)?;
        let path = request.working_dir.join(VOTING_KEY_FILE);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| NodeError::io(parent, err))?;
        }
        yaml::write_private(&path, file.as_bytes())?;
        addresses.voting.push(VotingAddress {
            public_key: file.public_key().to_hex(),
            start_epoch: file.start_epoch(),
            end_epoch: file.end_epoch(),
        });
    }
    Ok(addresses)
}

/// Runs the toolkit on a request file that only exists while it runs.
fn with_request<T: Serialize>(
    path: &Path,
    request: &T,
    run: impl FnOnce() -> Result<()>,
) -> Result<()> {
    yaml::save_private(path, request)?;
    let result = run();
    match fs::remove_file(path) {
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(NodeError::io(path, err)),
        _ => result,
    }
}

impl NodeToolkit for CommandToolkit {
    fn configure(
        &mut self,
        request: &NodeConfigureRequest,
        accounts: &dyn AccountResolver,
        voting: &dyn VotingKeyFileProvider,
    ) -> Result<NodeConfigureResponse> {
        let dir = &request.working_dir;
        fs::create_dir_all(dir).map_err(|err| NodeError::io(dir, err))?;
        let metadata = request.node.metadata();
        let addresses = if metadata.services_only {
            None
        } else {
            Some(resolve_addresses(request, accounts, voting)?)
        };

        let request_path = dir.join(CONFIGURE_REQUEST_FILE);
        let response_path = dir.join(CONFIGURE_RESPONSE_FILE);
        let command_request = CommandConfigureRequest {
            request,
            accounts: addresses.clone(),
        };
        with_request(&request_path, &command_request, || {
            self.run("configure", &request_path, "--response", &response_path)
        })?;

        let response: CommandConfigureResponse = if response_path.exists() {
            yaml::load(&response_path)?
        } else {
            CommandConfigureResponse::default()
        };
        info!(target: "cattle", node = %request.node.friendly_name, "node configured");
        Ok(NodeConfigureResponse {
            addresses,
            rendered_preset: response.rendered_preset,
        })
    }

    fn render_nemesis(&mut self, request: &NemesisRenderRequest) -> Result<PathBuf> {
        let dir = &request.working_dir;
        fs::create_dir_all(dir).map_err(|err| NodeError::io(dir, err))?;
        let request_path = dir.join(NEMESIS_REQUEST_FILE);
        let output = dir.join(NEMESIS_OUTPUT_DIR);
        with_request(&request_path, request, || {
            self.run("nemesis", &request_path, "--output", &output)
        })?;
        if !output.is_dir() {
            return Err(NodeError::Toolkit(format!(
                "toolkit did not produce {}",
                output.display()
            )));
        }
        info!(target: "cattle", seed = %output.display(), "nemesis rendered");
        Ok(output)
    }
}
