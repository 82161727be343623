//! Cattle CLI Library
//!
//! Argument parsing, interactive prompts and command handlers behind the
//! `cattle` binary.

pub mod args;
pub mod commands;
pub mod prompt;

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the log subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug,cattle=debug" } else { "info,cattle=info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
