//! Per-run client cache

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::{ClientError, ClientHandle, ClientProvider, Provider};
use crate::config::ConfigTree;

type Construction = Shared<BoxFuture<'static, Result<ClientHandle, ClientError>>>;

/// Lazily constructed client handles, one per provider
///
/// The first request for a provider starts construction on its own task;
/// every request, concurrent or later, awaits that same construction. A
/// caller that is aborted while waiting (timeout, cancellation) does not
/// stop the build, so the underlying [`ClientProvider`] is asked at most
/// once per provider. Construction errors are cached as well.
pub struct ClientCache {
    provider: Arc<dyn ClientProvider>,
    config: ConfigTree,
    slots: Mutex<HashMap<Provider, Construction>>,
    constructed: AtomicUsize,
}

impl ClientCache {
    pub fn new(provider: Arc<dyn ClientProvider>, config: ConfigTree) -> Self {
        Self {
            provider,
            config,
            slots: Mutex::new(HashMap::new()),
            constructed: AtomicUsize::new(0),
        }
    }

    /// Get the handle for `provider`, constructing it on first use
    pub async fn get(&self, provider: Provider) -> Result<ClientHandle, ClientError> {
        let construction = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots
                .entry(provider)
                .or_insert_with(|| self.start(provider))
                .clone()
        };
        construction.await
    }

    /// Number of providers whose construction was attempted
    pub fn constructed(&self) -> usize {
        self.constructed.load(Ordering::Relaxed)
    }

    /// Name of the underlying client provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn start(&self, provider: Provider) -> Construction {
        self.constructed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%provider, source = self.provider.name(), "constructing cloud client");

        let source = Arc::clone(&self.provider);
        let config = self.config.clone();
        let task = tokio::spawn(async move { construct(source.as_ref(), provider, &config).await });

        async move {
            match task.await {
                Ok(result) => result,
                Err(err) => Err(ClientError::Construction {
                    provider,
                    message: err.to_string(),
                }),
            }
        }
        .boxed()
        .shared()
    }
}

async fn construct(
    source: &dyn ClientProvider,
    provider: Provider,
    config: &ConfigTree,
) -> Result<ClientHandle, ClientError> {
    let handle = source.get_client(provider, config).await?;
    if handle.provider() != provider {
        return Err(ClientError::Mismatch {
            expected: provider,
            actual: handle.provider(),
        });
    }
    Ok(handle)
}

impl std::fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCache")
            .field("provider", &self.provider.name())
            .field("constructed", &self.constructed())
            .finish()
    }
}
