use anyhow::Result;
use clap::Parser;

use cattle_cli::args::CliArgs;
use cattle_cli::{commands, init_tracing};

fn main() -> Result<()> {
    let cli = CliArgs::parse();
    init_tracing(cli.common.verbose);
    commands::run(cli)
}
