//! CLI command definitions for the preflight runner

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use preflight_checks::{default_registry, SnapshotClientProvider};
use preflight_core::{
    ClientProvider, ConfigTree, DisconnectedProvider, EngineConfig, ExecutionEngine,
    PreflightError, RunContext, TagFilter, ValidationReport, DEFAULT_MAX_PARALLEL,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::output::{render_check_list, render_report, OutputFormat};
use super::ExitCode;
use crate::logging::LogFormat;

/// Cloud pre-flight validation
///
/// Verify that a cloud account has the resources, permissions and
/// configuration values a deployment needs before provisioning starts.
#[derive(Parser, Debug)]
#[command(name = "preflight")]
#[command(about = "Cloud pre-flight validation - check an account before provisioning", long_about = None)]
#[command(version)]
pub struct PreflightCli {
    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress the table report and all logs except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: PreflightCommands,
}

#[derive(Subcommand, Debug)]
pub enum PreflightCommands {
    /// Run checks against a configuration file
    Validate(ValidateArgs),

    /// List registered checks
    List {
        #[command(flatten)]
        selection: Selection,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Which checks to select
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Require a tag (repeatable; all must match)
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Require at least one of these tags (repeatable)
    #[arg(long = "any-tag", value_name = "TAG")]
    pub any_tags: Vec<String>,

    /// Exclude checks carrying a tag (repeatable)
    #[arg(long = "exclude-tag", value_name = "TAG")]
    pub exclude_tags: Vec<String>,

    /// Run only the named checks (repeatable)
    #[arg(long = "check", value_name = "NAME")]
    pub checks: Vec<String>,
}

impl Selection {
    pub fn to_filter(&self) -> TagFilter {
        let mut filter = TagFilter::all();
        for tag in &self.tags {
            filter = filter.with_tag(tag.clone());
        }
        for tag in &self.any_tags {
            filter = filter.with_any_tag(tag.clone());
        }
        for tag in &self.exclude_tags {
            filter = filter.without_tag(tag.clone());
        }
        for name in &self.checks {
            filter = filter.with_name(name.clone());
        }
        filter
    }
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Configuration file (.json, .yaml, .yml or .toml)
    #[arg(short, long, env = "PREFLIGHT_CONFIG")]
    pub config: PathBuf,

    /// Recorded account state to validate against instead of live cloud APIs
    #[arg(long, env = "PREFLIGHT_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    #[command(flatten)]
    pub selection: Selection,

    /// Output format for the report
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Run checks one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Maximum number of checks running at once
    #[arg(long, env = "PREFLIGHT_MAX_PARALLEL", default_value_t = DEFAULT_MAX_PARALLEL)]
    pub max_parallel: usize,

    /// Cancel checks still running after this many milliseconds
    #[arg(long = "timeout-ms", env = "PREFLIGHT_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Limit for each individual check, in milliseconds
    #[arg(long = "check-timeout-ms", env = "PREFLIGHT_CHECK_TIMEOUT_MS")]
    pub check_timeout_ms: Option<u64>,

    /// Include filter-excluded checks as SKIPPED
    #[arg(long)]
    pub show_skipped: bool,

    /// Exit with code 2 when no check ran
    #[arg(long)]
    pub strict: bool,
}

impl ValidateArgs {
    pub fn engine_config(&self) -> Result<EngineConfig, PreflightError> {
        if self.max_parallel == 0 {
            return Err(PreflightError::invalid_input("--max-parallel must be at least 1"));
        }

        let mut config = EngineConfig::default()
            .with_parallel(!self.sequential)
            .with_max_parallel(self.max_parallel)
            .with_show_skipped(self.show_skipped);
        if let Some(ms) = self.timeout_ms {
            config = config.with_run_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.check_timeout_ms {
            config = config.with_check_timeout(Duration::from_millis(ms));
        }
        Ok(config)
    }

    fn client_provider(&self) -> Result<Arc<dyn ClientProvider>, PreflightError> {
        match &self.snapshot {
            Some(path) => {
                let provider = SnapshotClientProvider::from_path(path)
                    .map_err(|e| PreflightError::invalid_input(e.to_string()))?;
                Ok(Arc::new(provider))
            }
            None => {
                tracing::info!("no snapshot given, checks needing cloud clients will report ERROR");
                Ok(Arc::new(DisconnectedProvider))
            }
        }
    }
}

/// Execute the validate command
pub async fn execute_validate(
    args: ValidateArgs,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<ExitCode, PreflightError> {
    let engine_config = args.engine_config()?;
    let registry = default_registry()?;
    let filter = args.selection.to_filter();
    registry.validate_filter(&filter)?;

    let config = ConfigTree::from_path(&args.config)?;
    let context = RunContext::new(config, args.client_provider()?);

    let report = ExecutionEngine::new(engine_config)
        .run_registry(&registry, &filter, context)
        .await;

    if !(quiet && args.format == OutputFormat::Table) {
        render_report(&report, args.format, out)?;
    }

    if let Some(warning) = no_checks_warning(&report, &filter, args.strict, quiet) {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }

    Ok(ExitCode::from_report(&report, args.strict))
}

/// Warning printed when a non-strict run executed nothing
///
/// Always logged; returned for stderr only when not `--quiet`.
fn no_checks_warning(
    report: &ValidationReport,
    filter: &TagFilter,
    strict: bool,
    quiet: bool,
) -> Option<String> {
    if !report.no_checks_ran() || strict {
        return None;
    }
    tracing::warn!(%filter, "no checks ran");
    (!quiet).then(|| format!("no checks ran for filter '{}'", filter))
}

/// Execute the list command
pub fn execute_list(
    selection: Selection,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<ExitCode, PreflightError> {
    let registry = default_registry()?;
    let filter = selection.to_filter();
    registry.validate_filter(&filter)?;

    render_check_list(&registry.list(&filter), format, out)?;
    Ok(ExitCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate() {
        let cli = PreflightCli::try_parse_from([
            "preflight",
            "-vv",
            "validate",
            "--config",
            "preflight.yaml",
            "--tag",
            "azure",
            "--exclude-tag",
            "infra",
            "--format",
            "json",
            "--sequential",
            "--check-timeout-ms",
            "500",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let PreflightCommands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.selection.to_filter().to_string(), "tag=azure exclude=infra");

        let engine = args.engine_config().unwrap();
        assert!(!engine.parallel);
        assert_eq!(engine.check_timeout, Some(Duration::from_millis(500)));
        assert!(engine.run_timeout.is_none());
    }

    #[test]
    fn test_zero_parallelism_rejected() {
        let cli = PreflightCli::try_parse_from([
            "preflight",
            "validate",
            "-c",
            "a.yaml",
            "--max-parallel",
            "0",
        ])
        .unwrap();
        let PreflightCommands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert!(args.engine_config().unwrap_err().is_user_error());
    }

    #[test]
    fn test_parse_list() {
        let cli = PreflightCli::try_parse_from(["preflight", "list", "--any-tag", "gcp"]).unwrap();
        assert!(matches!(cli.command, PreflightCommands::List { .. }));
    }

    #[test]
    fn test_no_checks_warning_respects_quiet_and_strict() {
        let empty = preflight_core::aggregate(Vec::new());
        let filter = TagFilter::tag("oracle");

        assert_eq!(
            no_checks_warning(&empty, &filter, false, false).as_deref(),
            Some("no checks ran for filter 'tag=oracle'")
        );
        assert_eq!(no_checks_warning(&empty, &filter, false, true), None);
        assert_eq!(no_checks_warning(&empty, &filter, true, false), None);
    }
}
