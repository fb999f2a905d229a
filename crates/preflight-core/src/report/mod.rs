//! Check results and the grouped validation report

mod aggregator;

pub use aggregator::{aggregate, ReportAggregator};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::registry::CheckDescriptor;

/// Group label for checks without a provider tag
pub const UNASSIGNED_PROVIDER: &str = "unassigned";

/// Group label for checks without a category tag
pub const UNCATEGORIZED: &str = "uncategorized";

/// Outcome class of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    /// The verified fact holds
    Pass,
    /// The fact does not hold, or required configuration is missing
    Fail,
    /// The check could not reach a verdict
    Error,
    /// Excluded by the run's filter
    Skipped,
}

impl CheckStatus {
    /// Whether this status makes the overall report fail
    pub fn is_failure(&self) -> bool {
        matches!(self, CheckStatus::Fail | CheckStatus::Error)
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "PASS"),
            CheckStatus::Fail => write!(f, "FAIL"),
            CheckStatus::Error => write!(f, "ERROR"),
            CheckStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// What produced a non-pass outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CauseKind {
    KeyMissing,
    ValueMissing,
    Assertion,
    Client,
    CloudApi,
    Unexpected,
    Panic,
    Timeout,
    Cancelled,
}

impl fmt::Display for CauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CauseKind::KeyMissing => "key_missing",
            CauseKind::ValueMissing => "value_missing",
            CauseKind::Assertion => "assertion",
            CauseKind::Client => "client",
            CauseKind::CloudApi => "cloud_api",
            CauseKind::Unexpected => "unexpected",
            CauseKind::Panic => "panic",
            CauseKind::Timeout => "timeout",
            CauseKind::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Underlying cause retained on a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
    pub kind: CauseKind,
    pub detail: String,
}

impl FailureCause {
    pub fn new(kind: CauseKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Outcome of one check in one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Check name
    pub name: String,
    /// Tags in declaration order
    pub tags: Vec<String>,
    /// Provider group label
    pub provider: String,
    /// Category group label
    pub category: String,
    pub status: CheckStatus,
    /// Failure message, empty on pass
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<FailureCause>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl CheckResult {
    pub fn new(descriptor: &CheckDescriptor, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: descriptor.name().to_string(),
            tags: descriptor.tags().to_vec(),
            provider: descriptor.provider_label().to_string(),
            category: descriptor.category_label().to_string(),
            status,
            message: message.into(),
            cause: None,
            duration_ms: 0,
        }
    }

    pub fn pass(descriptor: &CheckDescriptor) -> Self {
        Self::new(descriptor, CheckStatus::Pass, "")
    }

    pub fn fail(descriptor: &CheckDescriptor, message: impl Into<String>) -> Self {
        Self::new(descriptor, CheckStatus::Fail, message)
    }

    pub fn error(descriptor: &CheckDescriptor, message: impl Into<String>) -> Self {
        Self::new(descriptor, CheckStatus::Error, message)
    }

    /// A check excluded by the run's filter
    pub fn skipped(descriptor: &CheckDescriptor) -> Self {
        Self::new(descriptor, CheckStatus::Skipped, "excluded by filter")
    }

    /// A check stopped by run cancellation before it produced an outcome
    pub fn cancelled(descriptor: &CheckDescriptor) -> Self {
        Self::error(descriptor, "cancelled")
            .with_cause(FailureCause::new(CauseKind::Cancelled, "run cancelled"))
    }

    pub fn with_cause(mut self, cause: FailureCause) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }

    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    pub fn cause_kind(&self) -> Option<CauseKind> {
        self.cause.as_ref().map(|c| c.kind)
    }
}

/// Overall verdict of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportStatus {
    Pass,
    Fail,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::Pass => write!(f, "PASS"),
            ReportStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
}

impl ReportSummary {
    fn record(&mut self, status: CheckStatus) {
        self.total += 1;
        match status {
            CheckStatus::Pass => self.passed += 1,
            CheckStatus::Fail => self.failed += 1,
            CheckStatus::Error => self.errored += 1,
            CheckStatus::Skipped => self.skipped += 1,
        }
    }

    /// Checks that actually executed
    pub fn executed(&self) -> usize {
        self.total - self.skipped
    }
}

/// Identity of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// SHA-256 of the configuration tree the run used
    pub config_digest: String,
}

impl RunMetadata {
    /// Fresh run id, started now
    pub fn new(config_digest: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            config_digest: config_digest.into(),
        }
    }
}

impl Default for RunMetadata {
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: String,
    pub results: Vec<CheckResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderGroup {
    pub provider: String,
    pub categories: Vec<CategoryGroup>,
}

impl ProviderGroup {
    pub fn results(&self) -> impl Iterator<Item = &CheckResult> {
        self.categories.iter().flat_map(|c| c.results.iter())
    }
}

/// Frozen outcome of one run
///
/// Produced by [`ReportAggregator::finalize`]. Groups appear in the order
/// their first result was pushed, and results keep their push order within a
/// group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    duration_ms: u64,
    config_digest: String,
    status: ReportStatus,
    no_checks_ran: bool,
    summary: ReportSummary,
    groups: Vec<ProviderGroup>,
}

impl ValidationReport {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn config_digest(&self) -> &str {
        &self.config_digest
    }

    /// PASS iff no result is FAIL or ERROR
    pub fn status(&self) -> ReportStatus {
        self.status
    }

    pub fn is_pass(&self) -> bool {
        self.status == ReportStatus::Pass
    }

    /// True when nothing executed (no results, or only SKIPPED ones)
    pub fn no_checks_ran(&self) -> bool {
        self.no_checks_ran
    }

    pub fn summary(&self) -> &ReportSummary {
        &self.summary
    }

    pub fn groups(&self) -> &[ProviderGroup] {
        &self.groups
    }

    /// All results in report order
    pub fn results(&self) -> impl Iterator<Item = &CheckResult> {
        self.groups.iter().flat_map(|g| g.results())
    }

    /// FAIL and ERROR results in report order
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results().filter(|r| r.is_failure())
    }

    /// Look a result up by check name
    pub fn result(&self, name: &str) -> Option<&CheckResult> {
        self.results().find(|r| r.name == name)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> crate::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
