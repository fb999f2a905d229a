//! Test helpers for running check bodies against fixed clients

use async_trait::async_trait;
use preflight_core::{
    CheckContext, ClientCache, ClientError, ClientHandle, ClientProvider, ConfigTree, Provider,
};
use std::sync::Arc;

/// Hands out one prepared handle
pub(crate) struct FixedProvider(pub ClientHandle);

#[async_trait]
impl ClientProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn get_client(
        &self,
        provider: Provider,
        _config: &ConfigTree,
    ) -> Result<ClientHandle, ClientError> {
        if self.0.provider() == provider {
            Ok(self.0.clone())
        } else {
            Err(ClientError::Unsupported(provider))
        }
    }
}

pub(crate) fn context_with(config: serde_json::Value, handle: ClientHandle) -> CheckContext {
    let config = ConfigTree::from(config);
    let clients = Arc::new(ClientCache::new(
        Arc::new(FixedProvider(handle)),
        config.clone(),
    ));
    CheckContext::new(config, clients, "test")
}
