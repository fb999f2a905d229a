//! Cloud Preflight Core
//!
//! Validation execution framework for checking a cloud account before a
//! managed platform is provisioned into it.
//!
//! ## Architecture
//!
//! 1. **Config** (`config/`): immutable [`ConfigTree`] with dotted/colon path
//!    resolution that tells "key missing" apart from "value missing".
//! 2. **Client** (`client/`): the provider boundary. Read-only cloud API traits,
//!    the [`ClientProvider`] that builds handles and a per-run [`ClientCache`].
//! 3. **Registry** (`registry/`): explicit [`CheckRegistry`] of tagged
//!    [`CheckDescriptor`]s, filtered with a [`TagFilter`].
//! 4. **Check** (`check/`): [`CheckContext`] injected into every check body and
//!    the [`CheckUnit`] that turns one execution into one [`CheckResult`].
//! 5. **Engine** (`engine/`): bounded-parallel [`ExecutionEngine`] with per-check
//!    timeouts and run-level cancellation.
//! 6. **Report** (`report/`): [`ReportAggregator`] grouping results by provider
//!    and category into a frozen [`ValidationReport`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use preflight_core::{
//!     CheckContext, CheckError, CheckRegistry, ConfigTree, DisconnectedProvider,
//!     EngineConfig, ExecutionEngine, RunContext, TagFilter,
//! };
//!
//! async fn aws_table_name_configured(ctx: CheckContext) -> Result<(), CheckError> {
//!     ctx.require_str(
//!         "infra:aws:dynamodb:table_name",
//!         "No table name was defined for config option: {0}",
//!         "No table name was provided for config option: {0}",
//!     )?;
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = CheckRegistry::new();
//!     registry.register(["aws", "config"], aws_table_name_configured)?;
//!
//!     let config = ConfigTree::from_path("preflight.yaml")?;
//!     let context = RunContext::new(config, Arc::new(DisconnectedProvider));
//!     let engine = ExecutionEngine::new(EngineConfig::default());
//!
//!     let report = engine
//!         .run_registry(&registry, &TagFilter::tag("aws"), context)
//!         .await;
//!     println!("{}", report.status());
//!     Ok(())
//! }
//! ```

pub mod check;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod report;

pub use check::{CheckContext, CheckError, CheckFn, CheckFuture, CheckOutcome, CheckUnit};
pub use client::{
    ClientCache, ClientError, ClientHandle, ClientProvider, CloudApiError, DisconnectedProvider,
    Provider,
};
pub use config::{
    resolve, ConfigError, ConfigFormat, ConfigNode, ConfigTree, LoadError, Lookup,
    MessageTemplate, TemplateError,
};
pub use engine::{EngineConfig, ExecutionEngine, RunContext, DEFAULT_MAX_PARALLEL};
pub use error::{PreflightError, Result};
pub use registry::{CheckDescriptor, CheckRegistry, RegistryError, TagFilter};
pub use report::{
    aggregate, CategoryGroup, CauseKind, CheckResult, CheckStatus, FailureCause, ProviderGroup,
    ReportAggregator, ReportStatus, ReportSummary, RunMetadata, ValidationReport,
};

/// Re-exported so callers can cancel a run without depending on `tokio-util` directly
pub use tokio_util::sync::CancellationToken;

/// Framework version (from Cargo.toml)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
