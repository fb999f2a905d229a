//! Cloud Preflight CLI
//!
//! # Exit Codes
//!
//! - 0: every executed check passed
//! - 1: at least one check failed or errored
//! - 2: no check ran (only with `--strict`)
//! - 3: invalid arguments, configuration or snapshot file
//! - 10: internal error

use anyhow::Context;
use clap::Parser;
use preflight_cli::{logging, run_cli, PreflightCli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = PreflightCli::parse();
    logging::init(cli.verbose, cli.quiet, cli.log_format).context("failed to initialise logging")?;

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}
