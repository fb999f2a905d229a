//! Check bodies and the context injected into them
//!
//! A check is an async function from [`CheckContext`] to [`CheckOutcome`].
//! Returning `Ok(())` passes; every error variant maps to a fixed status in
//! the report:
//!
//! | Error                     | Status |
//! |---------------------------|--------|
//! | [`CheckError::Assertion`] | FAIL   |
//! | [`CheckError::Config`]    | FAIL   |
//! | [`CheckError::Client`]    | ERROR  |
//! | [`CheckError::Cloud`]     | ERROR  |
//! | [`CheckError::Unexpected`]| ERROR  |
//!
//! Panics, timeouts and cancellation are ERROR as well; see [`CheckUnit`].

mod unit;

pub use unit::CheckUnit;

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::client::{
    AwsApi, AzureApi, ClientCache, ClientError, ClientHandle, CloudApiError, GcpApi, Provider,
};
use crate::config::{ConfigError, ConfigNode, ConfigTree, MessageTemplate, TemplateError};

/// Ways a check body can end without passing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckError {
    /// The verified fact does not hold
    #[error("{message}")]
    Assertion { message: String, retain_cause: bool },

    /// A required configuration value is missing or empty
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No usable client for the provider
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A provider API call failed in a way the check did not handle
    #[error(transparent)]
    Cloud(#[from] CloudApiError),

    /// Anything else that prevented a verdict
    #[error("{0}")]
    Unexpected(String),
}

impl CheckError {
    /// Assertion failure reported by its message alone
    pub fn fail(message: impl Into<String>) -> Self {
        CheckError::Assertion {
            message: message.into(),
            retain_cause: false,
        }
    }

    /// Assertion failure that also records an `assertion` cause on the result
    pub fn fail_with_cause(message: impl Into<String>) -> Self {
        CheckError::Assertion {
            message: message.into(),
            retain_cause: true,
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        CheckError::Unexpected(message.into())
    }
}

impl From<TemplateError> for CheckError {
    fn from(err: TemplateError) -> Self {
        CheckError::Unexpected(err.to_string())
    }
}

pub type CheckOutcome = Result<(), CheckError>;

pub type CheckFuture = BoxFuture<'static, CheckOutcome>;

/// Callable check body
///
/// Implemented for every `Fn(CheckContext) -> impl Future<Output = CheckOutcome>`,
/// so plain `async fn`s register directly.
pub trait CheckFn: Send + Sync {
    fn call(&self, ctx: CheckContext) -> CheckFuture;
}

impl<F, Fut> CheckFn for F
where
    F: Fn(CheckContext) -> Fut + Send + Sync,
    Fut: Future<Output = CheckOutcome> + Send + 'static,
{
    fn call(&self, ctx: CheckContext) -> CheckFuture {
        Box::pin(self(ctx))
    }
}

/// Dependencies handed to one check body
#[derive(Debug, Clone)]
pub struct CheckContext {
    config: ConfigTree,
    clients: Arc<ClientCache>,
    check: Arc<str>,
}

impl CheckContext {
    pub fn new(config: ConfigTree, clients: Arc<ClientCache>, check: impl Into<Arc<str>>) -> Self {
        Self {
            config,
            clients,
            check: check.into(),
        }
    }

    pub fn config(&self) -> &ConfigTree {
        &self.config
    }

    pub fn check_name(&self) -> &str {
        &self.check
    }

    /// Shared handle for `provider`, built on first use in this run
    pub async fn client(&self, provider: Provider) -> Result<ClientHandle, CheckError> {
        Ok(self.clients.get(provider).await?)
    }

    pub async fn aws(&self) -> Result<Arc<dyn AwsApi>, CheckError> {
        match self.client(Provider::Aws).await? {
            ClientHandle::Aws(api) => Ok(api),
            other => Err(mismatch(Provider::Aws, &other)),
        }
    }

    pub async fn azure(&self) -> Result<Arc<dyn AzureApi>, CheckError> {
        match self.client(Provider::Azure).await? {
            ClientHandle::Azure(api) => Ok(api),
            other => Err(mismatch(Provider::Azure, &other)),
        }
    }

    pub async fn gcp(&self) -> Result<Arc<dyn GcpApi>, CheckError> {
        match self.client(Provider::Gcp).await? {
            ClientHandle::Gcp(api) => Ok(api),
            other => Err(mismatch(Provider::Gcp, &other)),
        }
    }

    /// Resolve a configuration path with the two failure messages
    ///
    /// Each message must contain exactly one `{0}` (or `{}`) for the path; a
    /// malformed message is an [`CheckError::Unexpected`].
    pub fn resolve(
        &self,
        path: &str,
        key_missing_message: &str,
        value_missing_message: &str,
    ) -> Result<&ConfigNode, CheckError> {
        let key_missing = MessageTemplate::new(key_missing_message.to_string())?;
        let value_missing = MessageTemplate::new(value_missing_message.to_string())?;
        Ok(self.config.resolve(path, &key_missing, &value_missing)?)
    }

    /// [`resolve`](Self::resolve) a value that must be a string
    pub fn require_str(
        &self,
        path: &str,
        key_missing_message: &str,
        value_missing_message: &str,
    ) -> Result<String, CheckError> {
        let node = self.resolve(path, key_missing_message, value_missing_message)?;
        match node.as_str() {
            Some(s) => Ok(s.to_string()),
            None => Err(CheckError::Unexpected(format!(
                "Config option {} must be a string, found {}",
                path,
                node.type_name()
            ))),
        }
    }
}

fn mismatch(expected: Provider, handle: &ClientHandle) -> CheckError {
    CheckError::Client(ClientError::Mismatch {
        expected,
        actual: handle.provider(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DisconnectedProvider;
    use serde_json::json;

    fn context(config: serde_json::Value) -> CheckContext {
        let config = ConfigTree::from(config);
        let clients = Arc::new(ClientCache::new(Arc::new(DisconnectedProvider), config.clone()));
        CheckContext::new(config, clients, "sample")
    }

    #[test]
    fn test_require_str() {
        let ctx = context(json!({"infra": {"aws": {"dynamodb": {"table_name": "t", "count": 3}}}}));
        assert_eq!(
            ctx.require_str("infra:aws:dynamodb:table_name", "km {0}", "vm {0}")
                .unwrap(),
            "t"
        );

        let err = ctx
            .require_str("infra:aws:dynamodb:count", "km {0}", "vm {0}")
            .unwrap_err();
        assert!(matches!(err, CheckError::Unexpected(ref m) if m.contains("integer")));
    }

    #[test]
    fn test_resolve_maps_config_errors() {
        let ctx = context(json!({"a": ""}));
        let err = ctx.resolve("a", "km {0}", "vm {0}").unwrap_err();
        assert_eq!(err.to_string(), "vm a");
        assert!(matches!(err, CheckError::Config(ConfigError::ValueMissing { .. })));
    }

    #[test]
    fn test_malformed_template_is_unexpected() {
        let ctx = context(json!({}));
        let err = ctx.resolve("a", "no slot here", "vm {0}").unwrap_err();
        assert!(matches!(err, CheckError::Unexpected(_)));
    }

    #[tokio::test]
    async fn test_client_error_propagates() {
        let ctx = context(json!({}));
        let err = ctx.aws().await.err().unwrap();
        assert_eq!(err, CheckError::Client(ClientError::Unsupported(Provider::Aws)));
    }
}
