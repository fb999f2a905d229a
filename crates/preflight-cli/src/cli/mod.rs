//! CLI module for the preflight runner
//!
//! Runs the built-in checks against a configuration file and renders the
//! report, or lists the registered checks.

pub mod commands;
pub mod output;

pub use commands::{PreflightCli, PreflightCommands, Selection, ValidateArgs};
pub use output::OutputFormat;

use preflight_core::{PreflightError, ValidationReport};
use std::io::Write;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every executed check passed
    Success = 0,
    /// At least one check failed or errored
    ValidationFailed = 1,
    /// Nothing executed and `--strict` was given
    NoChecksRan = 2,
    /// Invalid arguments or unloadable input files
    InvalidInput = 3,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Determine exit code from a finished report
    pub fn from_report(report: &ValidationReport, strict: bool) -> Self {
        if !report.is_pass() {
            ExitCode::ValidationFailed
        } else if report.no_checks_ran() && strict {
            ExitCode::NoChecksRan
        } else {
            ExitCode::Success
        }
    }
}

/// Run the CLI, writing reports to `out`
pub async fn run(cli: PreflightCli, out: &mut dyn Write) -> Result<ExitCode, PreflightError> {
    let quiet = cli.quiet;
    match cli.command {
        PreflightCommands::Validate(args) => commands::execute_validate(args, quiet, out).await,
        PreflightCommands::List { selection, format } => {
            commands::execute_list(selection, format, out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflight_core::{aggregate, CheckResult, CheckStatus};

    fn result(status: CheckStatus) -> CheckResult {
        CheckResult {
            name: "c".into(),
            tags: vec!["aws".into()],
            provider: "aws".into(),
            category: "uncategorized".into(),
            status,
            message: String::new(),
            cause: None,
            duration_ms: 0,
        }
    }

    #[test]
    fn test_exit_code_conversion() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::ValidationFailed), 1);
        assert_eq!(i32::from(ExitCode::NoChecksRan), 2);
        assert_eq!(i32::from(ExitCode::InvalidInput), 3);
        assert_eq!(i32::from(ExitCode::InternalError), 10);
    }

    #[test]
    fn test_exit_code_from_report() {
        let passing = aggregate(vec![result(CheckStatus::Pass)]);
        let failing = aggregate(vec![result(CheckStatus::Pass), result(CheckStatus::Error)]);
        let empty = aggregate(Vec::new());

        assert_eq!(ExitCode::from_report(&passing, true), ExitCode::Success);
        assert_eq!(ExitCode::from_report(&failing, false), ExitCode::ValidationFailed);
        assert_eq!(ExitCode::from_report(&empty, false), ExitCode::Success);
        assert_eq!(ExitCode::from_report(&empty, true), ExitCode::NoChecksRan);
    }
}
