//! Execution engine
//!
//! Runs a set of checks against one configuration and one client provider
//! and returns a single [`ValidationReport`]. One check's failure, panic or
//! timeout never stops the others.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::check::{CheckContext, CheckUnit};
use crate::client::{ClientCache, ClientProvider};
use crate::config::ConfigTree;
use crate::registry::{CheckDescriptor, CheckRegistry, TagFilter};
use crate::report::{CheckResult, ReportAggregator, RunMetadata, ValidationReport};

/// Default bound on concurrently running checks
pub const DEFAULT_MAX_PARALLEL: usize = 8;

/// Engine settings, fixed for the lifetime of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Run checks concurrently (bounded by `max_parallel`)
    pub parallel: bool,
    pub max_parallel: usize,
    /// Limit for each check body
    pub check_timeout: Option<Duration>,
    /// Limit for the whole run; checks still running when it elapses are cancelled
    pub run_timeout: Option<Duration>,
    /// Record filter-excluded checks as SKIPPED
    pub show_skipped: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_parallel: DEFAULT_MAX_PARALLEL,
            check_timeout: None,
            run_timeout: None,
            show_skipped: false,
        }
    }
}

impl EngineConfig {
    pub fn sequential() -> Self {
        Self::default().with_parallel(false)
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = Some(timeout);
        self
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }

    pub fn with_show_skipped(mut self, show_skipped: bool) -> Self {
        self.show_skipped = show_skipped;
        self
    }

    /// Effective concurrency limit
    pub fn concurrency(&self) -> usize {
        if self.parallel {
            self.max_parallel.max(1)
        } else {
            1
        }
    }
}

/// Shared, read-only dependencies of one run
///
/// Owns the run's [`ClientCache`]; dropping the context at the end of the run
/// releases every client handle.
#[derive(Debug, Clone)]
pub struct RunContext {
    config: ConfigTree,
    clients: Arc<ClientCache>,
}

impl RunContext {
    pub fn new(config: ConfigTree, provider: Arc<dyn ClientProvider>) -> Self {
        let clients = Arc::new(ClientCache::new(provider, config.clone()));
        Self { config, clients }
    }

    pub fn config(&self) -> &ConfigTree {
        &self.config
    }

    pub fn clients(&self) -> &Arc<ClientCache> {
        &self.clients
    }

    /// Context handed to the body of the check `name`
    pub fn check_context(&self, name: &str) -> CheckContext {
        CheckContext::new(self.config.clone(), Arc::clone(&self.clients), name)
    }
}

enum Planned {
    Run(Arc<CheckDescriptor>),
    Skip(Arc<CheckDescriptor>),
}

/// Schedules check units and aggregates their results
#[derive(Debug, Clone, Default)]
pub struct ExecutionEngine {
    config: EngineConfig,
}

impl ExecutionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the given checks, in order
    pub async fn run(
        &self,
        descriptors: Vec<Arc<CheckDescriptor>>,
        context: RunContext,
    ) -> ValidationReport {
        self.run_with_cancel(descriptors, context, CancellationToken::new())
            .await
    }

    /// Run the given checks until done or until `cancel` fires
    pub async fn run_with_cancel(
        &self,
        descriptors: Vec<Arc<CheckDescriptor>>,
        context: RunContext,
        cancel: CancellationToken,
    ) -> ValidationReport {
        let planned = descriptors.into_iter().map(Planned::Run).collect();
        self.execute(planned, context, cancel).await
    }

    /// Run the registry's checks selected by `filter`
    pub async fn run_registry(
        &self,
        registry: &CheckRegistry,
        filter: &TagFilter,
        context: RunContext,
    ) -> ValidationReport {
        self.run_registry_with_cancel(registry, filter, context, CancellationToken::new())
            .await
    }

    pub async fn run_registry_with_cancel(
        &self,
        registry: &CheckRegistry,
        filter: &TagFilter,
        context: RunContext,
        cancel: CancellationToken,
    ) -> ValidationReport {
        let planned = registry
            .iter()
            .filter_map(|descriptor| {
                if filter.matches(descriptor) {
                    Some(Planned::Run(Arc::clone(descriptor)))
                } else if self.config.show_skipped {
                    Some(Planned::Skip(Arc::clone(descriptor)))
                } else {
                    None
                }
            })
            .collect();

        tracing::debug!(%filter, registered = registry.len(), "selected checks");
        self.execute(planned, context, cancel).await
    }

    async fn execute(
        &self,
        planned: Vec<Planned>,
        context: RunContext,
        cancel: CancellationToken,
    ) -> ValidationReport {
        let metadata = RunMetadata::new(context.config().digest());
        tracing::info!(
            run_id = %metadata.run_id,
            checks = planned.len(),
            concurrency = self.config.concurrency(),
            "starting validation run"
        );
        let mut aggregator = ReportAggregator::new(metadata);

        let token = cancel.child_token();
        let watchdog = self.config.run_timeout.map(|limit| {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                tracing::warn!(timeout_ms = limit.as_millis() as u64, "run timeout elapsed, cancelling remaining checks");
                token.cancel();
            })
        });

        let check_timeout = self.config.check_timeout;
        let results: Vec<CheckResult> = stream::iter(planned)
            .map(|planned| {
                let token = token.clone();
                let work = match planned {
                    Planned::Run(descriptor) => Ok(CheckUnit::new(descriptor, &context, check_timeout)),
                    Planned::Skip(descriptor) => Err(descriptor),
                };
                async move {
                    match work {
                        Ok(unit) => unit.execute(token).await,
                        Err(descriptor) => CheckResult::skipped(&descriptor),
                    }
                }
            })
            .buffered(self.config.concurrency())
            .collect()
            .await;

        if let Some(watchdog) = watchdog {
            watchdog.abort();
        }

        aggregator.extend(results);
        let report = aggregator.finalize();
        let summary = report.summary();
        tracing::info!(
            run_id = %report.run_id(),
            status = %report.status(),
            passed = summary.passed,
            failed = summary.failed,
            errored = summary.errored,
            skipped = summary.skipped,
            duration_ms = report.duration_ms(),
            "validation run finished"
        );
        report
    }
}
