//! Output formatting for the preflight CLI
//!
//! Reports render as a grouped, coloured table for people or as JSON/YAML
//! for machines.

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use preflight_core::{
    CheckDescriptor, CheckResult, CheckStatus, PreflightError, ReportStatus, ValidationReport,
};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    /// YAML format for configuration output
    Yaml,
}

/// One registered check as shown by `preflight list`
#[derive(Debug, Clone, Serialize)]
pub struct CheckListing {
    pub name: String,
    pub tags: Vec<String>,
    pub provider: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CheckListing {
    pub fn from_descriptor(descriptor: &CheckDescriptor) -> Self {
        Self {
            name: descriptor.name().to_string(),
            tags: descriptor.tags().to_vec(),
            provider: descriptor.provider_label().to_string(),
            category: descriptor.category_label().to_string(),
            description: descriptor.description().map(str::to_string),
        }
    }
}

/// Render a validation report in the specified format
pub fn render_report(
    report: &ValidationReport,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), PreflightError> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", report.to_json()?).map_err(PreflightError::from),
        OutputFormat::Yaml => write!(out, "{}", report.to_yaml()?).map_err(PreflightError::from),
        OutputFormat::Table => render_table(report, out).map_err(PreflightError::from),
    }
}

fn render_table(report: &ValidationReport, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "Preflight Validation Report".cyan().bold())?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "Run:    {}", report.run_id())?;
    writeln!(out, "Config: {}", short_digest(report.config_digest()))?;

    for group in report.groups() {
        writeln!(out)?;
        writeln!(out, "{}", group.provider.to_uppercase().bold())?;
        for category in &group.categories {
            writeln!(out, "  {}", category.category.cyan())?;
            for result in &category.results {
                write_result_line(result, out)?;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", "-".repeat(60))?;

    let summary = report.summary();
    let verdict = match report.status() {
        ReportStatus::Pass => format!("+ {}", report.status()).green().bold(),
        ReportStatus::Fail => format!("x {}", report.status()).red().bold(),
    };
    writeln!(
        out,
        "{} {} passed, {} failed, {} errored, {} skipped ({}ms)",
        verdict,
        summary.passed,
        summary.failed,
        summary.errored,
        summary.skipped,
        report.duration_ms()
    )?;
    if report.no_checks_ran() {
        writeln!(out, "{}", "! No checks ran".yellow())?;
    }
    Ok(())
}

fn write_result_line(result: &CheckResult, out: &mut dyn Write) -> std::io::Result<()> {
    let icon = status_icon(result.status);
    if result.message.is_empty() {
        writeln!(out, "    {} {}", icon, result.name)
    } else {
        writeln!(out, "    {} {}: {}", icon, result.name, result.message)
    }
}

fn status_icon(status: CheckStatus) -> ColoredString {
    match status {
        CheckStatus::Pass => "+".green(),
        CheckStatus::Fail => "x".red(),
        CheckStatus::Error => "!".yellow(),
        CheckStatus::Skipped => "-".dimmed(),
    }
}

fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

/// Render the checks selected for `preflight list`
pub fn render_check_list(
    checks: &[Arc<CheckDescriptor>],
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), PreflightError> {
    let listings: Vec<CheckListing> = checks
        .iter()
        .map(|d| CheckListing::from_descriptor(d))
        .collect();

    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&listings)?).map_err(PreflightError::from)
        }
        OutputFormat::Yaml => write!(out, "{}", serde_yaml::to_string(&listings)?).map_err(PreflightError::from),
        OutputFormat::Table => {
            let width = listings.iter().map(|l| l.name.len()).max().unwrap_or(0);
            let mut render = || -> std::io::Result<()> {
                writeln!(out, "{}", "Registered Checks".cyan().bold())?;
                writeln!(out, "{}", "=".repeat(60))?;
                for listing in &listings {
                    writeln!(
                        out,
                        "  {:<width$}  [{}]  {}",
                        listing.name,
                        listing.tags.join(", "),
                        listing.description.as_deref().unwrap_or(""),
                        width = width
                    )?;
                }
                writeln!(out)?;
                writeln!(out, "{} check(s)", listings.len())
            };
            render().map_err(PreflightError::from)
        }
    }
}
