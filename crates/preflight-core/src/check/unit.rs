//! Execution of a single check

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::{CheckContext, CheckError, CheckOutcome};
use crate::config::ConfigError;
use crate::engine::RunContext;
use crate::registry::CheckDescriptor;
use crate::report::{CauseKind, CheckResult, CheckStatus, FailureCause};

/// One descriptor bound to its run's dependencies
///
/// [`execute`](Self::execute) always produces exactly one [`CheckResult`].
/// The body runs in its own task so a panic is contained and reported as
/// ERROR instead of tearing down the run.
pub struct CheckUnit {
    descriptor: Arc<CheckDescriptor>,
    context: CheckContext,
    timeout: Option<Duration>,
}

enum Finished {
    Body(CheckOutcome),
    Panicked(String),
    TimedOut(Duration),
    Cancelled,
}

impl CheckUnit {
    pub fn new(descriptor: Arc<CheckDescriptor>, run: &RunContext, timeout: Option<Duration>) -> Self {
        let context = run.check_context(descriptor.name());
        Self {
            descriptor,
            context,
            timeout,
        }
    }

    pub fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    /// Run the body to completion, timeout or cancellation
    pub async fn execute(self, cancel: CancellationToken) -> CheckResult {
        let descriptor = self.descriptor;
        if cancel.is_cancelled() {
            tracing::debug!(check = %descriptor.name(), "run cancelled before check started");
            return CheckResult::cancelled(&descriptor);
        }

        let span = tracing::info_span!(
            "check",
            name = %descriptor.name(),
            provider = %descriptor.provider_label()
        );
        let started = Instant::now();
        tracing::debug!(parent: &span, "check started");

        let body = descriptor.body();
        let context = self.context;
        let mut handle = tokio::spawn(async move { body.call(context).await }.instrument(span.clone()));

        let finished = tokio::select! {
            biased;
            joined = &mut handle => match joined {
                Ok(outcome) => Finished::Body(outcome),
                Err(err) if err.is_panic() => Finished::Panicked(panic_message(err.into_panic())),
                Err(_) => Finished::Cancelled,
            },
            _ = cancel.cancelled() => {
                handle.abort();
                Finished::Cancelled
            }
            limit = deadline(self.timeout) => {
                handle.abort();
                Finished::TimedOut(limit)
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let result = build_result(&descriptor, finished).with_duration(duration_ms);

        if result.status == CheckStatus::Pass {
            tracing::debug!(parent: &span, duration_ms, "check passed");
        } else {
            tracing::warn!(
                parent: &span,
                status = %result.status,
                cause = ?result.cause_kind(),
                duration_ms,
                "{}",
                result.message
            );
        }
        result
    }
}

/// Sleeps for the timeout, or forever without one
async fn deadline(timeout: Option<Duration>) -> Duration {
    match timeout {
        Some(limit) => {
            tokio::time::sleep(limit).await;
            limit
        }
        None => std::future::pending().await,
    }
}

fn build_result(descriptor: &CheckDescriptor, finished: Finished) -> CheckResult {
    match finished {
        Finished::Body(Ok(())) => CheckResult::pass(descriptor),
        Finished::Body(Err(err)) => classify(descriptor, err),
        Finished::Panicked(message) => {
            CheckResult::error(descriptor, format!("Check panicked: {}", message))
                .with_cause(FailureCause::new(CauseKind::Panic, message))
        }
        Finished::TimedOut(limit) => {
            let message = format!("Check timed out after {}ms", limit.as_millis());
            CheckResult::error(descriptor, message.clone())
                .with_cause(FailureCause::new(CauseKind::Timeout, message))
        }
        Finished::Cancelled => CheckResult::cancelled(descriptor),
    }
}

fn classify(descriptor: &CheckDescriptor, err: CheckError) -> CheckResult {
    match err {
        CheckError::Assertion {
            message,
            retain_cause,
        } => {
            let result = CheckResult::fail(descriptor, message.clone());
            if retain_cause {
                result.with_cause(FailureCause::new(CauseKind::Assertion, message))
            } else {
                result
            }
        }
        CheckError::Config(err) => {
            let kind = match err {
                ConfigError::KeyMissing { .. } => CauseKind::KeyMissing,
                ConfigError::ValueMissing { .. } => CauseKind::ValueMissing,
            };
            CheckResult::fail(descriptor, err.message())
                .with_cause(FailureCause::new(kind, err.path()))
        }
        CheckError::Client(err) => CheckResult::error(descriptor, err.to_string())
            .with_cause(FailureCause::new(CauseKind::Client, format!("{:?}", err))),
        CheckError::Cloud(err) => CheckResult::error(descriptor, err.to_string())
            .with_cause(FailureCause::new(CauseKind::CloudApi, format!("{:?}", err))),
        CheckError::Unexpected(message) => CheckResult::error(descriptor, message.clone())
            .with_cause(FailureCause::new(CauseKind::Unexpected, message)),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
