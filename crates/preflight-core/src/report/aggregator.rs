//! Incremental report construction

use std::time::Instant;

use super::{
    CategoryGroup, CheckResult, ProviderGroup, ReportStatus, ReportSummary, RunMetadata,
    ValidationReport,
};

/// Collects results as checks finish and freezes them into a report
pub struct ReportAggregator {
    metadata: RunMetadata,
    started: Instant,
    summary: ReportSummary,
    groups: Vec<ProviderGroup>,
}

impl ReportAggregator {
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            metadata,
            started: Instant::now(),
            summary: ReportSummary::default(),
            groups: Vec::new(),
        }
    }

    /// Add one result under its provider and category group
    pub fn push(&mut self, result: CheckResult) {
        self.summary.record(result.status);

        let group = match self.groups.iter().position(|g| g.provider == result.provider) {
            Some(index) => &mut self.groups[index],
            None => {
                self.groups.push(ProviderGroup {
                    provider: result.provider.clone(),
                    categories: Vec::new(),
                });
                let last = self.groups.len() - 1;
                &mut self.groups[last]
            }
        };

        match group
            .categories
            .iter_mut()
            .find(|c| c.category == result.category)
        {
            Some(category) => category.results.push(result),
            None => group.categories.push(CategoryGroup {
                category: result.category.clone(),
                results: vec![result],
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.summary.total
    }

    pub fn is_empty(&self) -> bool {
        self.summary.total == 0
    }

    /// Freeze the report
    pub fn finalize(self) -> ValidationReport {
        let failures = self.summary.failed + self.summary.errored;
        let status = if failures == 0 {
            ReportStatus::Pass
        } else {
            ReportStatus::Fail
        };

        ValidationReport {
            run_id: self.metadata.run_id,
            started_at: self.metadata.started_at,
            duration_ms: self.started.elapsed().as_millis() as u64,
            config_digest: self.metadata.config_digest,
            status,
            no_checks_ran: self.summary.executed() == 0,
            summary: self.summary,
            groups: self.groups,
        }
    }
}

impl Extend<CheckResult> for ReportAggregator {
    fn extend<I: IntoIterator<Item = CheckResult>>(&mut self, iter: I) {
        for result in iter {
            self.push(result);
        }
    }
}

/// Build a report from complete results with fresh run metadata
pub fn aggregate(results: impl IntoIterator<Item = CheckResult>) -> ValidationReport {
    let mut aggregator = ReportAggregator::new(RunMetadata::default());
    aggregator.extend(results);
    aggregator.finalize()
}
