//! Interactive prompts.
//!
//! Malformed answers are reported and asked again; only terminal failures
//! are returned as errors.

use dialoguer::{Confirm, Input};
use zeroize::Zeroizing;

use cattle_cryptography::{PrivateKey, PublicKey};
use cattle_node::{AccountPrompt, NodeError};
use cattle_wallets::validate_password;

/// Reads private keys from the terminal without echoing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl AccountPrompt for TerminalPrompt {
    fn prompt_private_key(
        &self,
        message: &str,
        expected: Option<&PublicKey>,
    ) -> cattle_node::Result<PrivateKey> {
        if let Some(expected) = expected {
            eprintln!("Expected public key: {}", expected);
        }
        loop {
            let answer = Zeroizing::new(
                rpassword::prompt_password(format!("{}: ", message))
                    .map_err(|err| NodeError::PromptUnavailable(format!("{} ({})", message, err)))?,
            );
            match check_private_key(&answer, expected) {
                Ok(key) => return Ok(key),
                Err(problem) => eprintln!("{}. Try again.", problem),
            }
        }
    }
}

/// Parses a private key answer, requiring it to match `expected` if given.
pub fn check_private_key(answer: &str, expected: Option<&PublicKey>) -> Result<PrivateKey, String> {
    let key = PrivateKey::from_hex(answer.trim()).map_err(|err| err.to_string())?;
    match expected {
        Some(expected) if key.public_key() != *expected => Err(format!(
            "that private key does not belong to public key {}",
            expected
        )),
        _ => Ok(key),
    }
}

/// Asks for the key store password until it satisfies the policy.
///
/// `confirm` asks twice, for stores that do not exist yet.
pub fn prompt_password(confirm: bool) -> std::io::Result<Zeroizing<String>> {
    loop {
        let password = Zeroizing::new(rpassword::prompt_password(
            "Key store password (empty for none): ",
        )?);
        if let Err(err) = validate_password(&password) {
            eprintln!("{}. Try again.", err);
            continue;
        }
        if confirm && !password.is_empty() {
            let again = Zeroizing::new(rpassword::prompt_password("Repeat password: ")?);
            if *again != *password {
                eprintln!("Passwords do not match. Try again.");
                continue;
            }
        }
        return Ok(password);
    }
}

pub fn prompt_text(message: &str, default: &str) -> anyhow::Result<String> {
    Ok(Input::<String>::new()
        .with_prompt(message)
        .default(default.to_string())
        .allow_empty(true)
        .interact_text()?)
}

pub fn prompt_count(message: &str, default: u32) -> anyhow::Result<u32> {
    Ok(Input::<u32>::new()
        .with_prompt(message)
        .default(default)
        .interact_text()?)
}

pub fn confirm(message: &str, default: bool) -> anyhow::Result<bool> {
    Ok(Confirm::new()
        .with_prompt(message)
        .default(default)
        .interact()?)
}
