//! Cloud Preflight CLI
//!
//! Library backing the `preflight` binary so the command surface can be
//! driven from tests.
//!
//! ```bash
//! # Validate against a recorded account state
//! preflight validate --config preflight.yaml --snapshot account.yaml
//!
//! # Only the Azure permission checks, as JSON
//! preflight validate -c preflight.yaml --tag azure --tag permissions --format json
//!
//! # Show what would run
//! preflight list --any-tag aws --any-tag gcp
//! ```

pub mod cli;
pub mod logging;

pub use cli::{ExitCode, OutputFormat, PreflightCli, PreflightCommands};

use std::io::Write;

/// Run the CLI against stdout and map errors to exit codes
pub async fn run_cli(cli: PreflightCli) -> ExitCode {
    let mut stdout = std::io::stdout();
    run_cli_with_output(cli, &mut stdout).await
}

/// Run the CLI, writing the report to `out`
pub async fn run_cli_with_output(cli: PreflightCli, out: &mut dyn Write) -> ExitCode {
    match cli::run(cli, out).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "preflight run aborted");
            eprintln!("Error: {}", e);
            if e.is_user_error() {
                ExitCode::InvalidInput
            } else {
                ExitCode::InternalError
            }
        }
    }
}
