//! Cloud client boundary
//!
//! Checks never construct SDK clients themselves. They ask their
//! [`CheckContext`](crate::CheckContext) for a handle, which goes through the
//! run's [`ClientCache`] to the configured [`ClientProvider`].
//!
//! # Provider Traits
//!
//! Each cloud exposes only the read-only calls the checks need:
//!
//! - [`AwsApi`]: `describe_table`, `head_bucket`
//! - [`AzureApi`]: `get_resource_by_id`, `list_role_assignments`, `get_role_definition`
//! - [`GcpApi`]: `get_bucket`, `get_service_account`
//!
//! SDK-backed implementations live outside this crate. A provider "not found"
//! answer is reported as [`CloudApiError::NotFound`] so check bodies can turn
//! it into an assertion failure.

pub mod aws;
pub mod azure;
mod cache;
pub mod gcp;

pub use aws::{AwsApi, TableDescription};
pub use azure::{AzureApi, GenericResource, Permission, RoleAssignment, RoleDefinition};
pub use cache::ClientCache;
pub use gcp::{Bucket, GcpApi, ServiceAccount};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ConfigTree;

/// Target cloud platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
    Gcp,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Aws, Provider::Azure, Provider::Gcp];

    /// Tag used on checks targeting this provider
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Azure => "azure",
            Provider::Gcp => "gcp",
        }
    }

    /// Interpret a check tag as a provider, if it names one
    pub fn from_tag(tag: &str) -> Option<Self> {
        Provider::ALL.into_iter().find(|p| p.as_str() == tag)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::from_tag(&s.to_ascii_lowercase()).ok_or_else(|| format!("Unknown provider: {}", s))
    }
}

/// Errors raised while constructing a client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Credentials were rejected or could not be found
    #[error("Credentials for {provider} were rejected or unavailable: {message}")]
    Credentials { provider: Provider, message: String },

    /// The provider endpoint could not be reached
    #[error("Could not reach {provider}: {message}")]
    Connectivity { provider: Provider, message: String },

    /// The client provider cannot build clients for this cloud
    #[error("No {0} client is available from the configured client provider")]
    Unsupported(Provider),

    /// Client settings in the configuration are unusable
    #[error("{provider} client configuration error: {message}")]
    Configuration { provider: Provider, message: String },

    /// A provider returned a handle for a different cloud
    #[error("Client provider returned a {actual} handle when {expected} was requested")]
    Mismatch { expected: Provider, actual: Provider },

    /// Client construction panicked or was aborted
    #[error("{provider} client construction did not complete: {message}")]
    Construction { provider: Provider, message: String },
}

/// Errors returned by read-only cloud API calls
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Request throttled: {0}")]
    Throttled(String),

    #[error("Service error: {0}")]
    Service(String),
}

impl CloudApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudApiError::NotFound(_))
    }
}

/// An authenticated handle to one cloud's APIs
#[derive(Clone)]
pub enum ClientHandle {
    Aws(Arc<dyn AwsApi>),
    Azure(Arc<dyn AzureApi>),
    Gcp(Arc<dyn GcpApi>),
}

impl ClientHandle {
    pub fn provider(&self) -> Provider {
        match self {
            ClientHandle::Aws(_) => Provider::Aws,
            ClientHandle::Azure(_) => Provider::Azure,
            ClientHandle::Gcp(_) => Provider::Gcp,
        }
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClientHandle").field(&self.provider()).finish()
    }
}

/// Builds authenticated client handles
///
/// Implementations may perform network calls and authentication. The engine
/// calls `get_client` at most once per provider per run.
#[async_trait]
pub trait ClientProvider: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Construct a handle for `provider` using settings from `config`
    async fn get_client(
        &self,
        provider: Provider,
        config: &ConfigTree,
    ) -> Result<ClientHandle, ClientError>;
}

/// Provider used when no cloud access is configured
///
/// Every request fails with [`ClientError::Unsupported`], so checks that need
/// a client report ERROR while configuration-only failures still surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisconnectedProvider;

#[async_trait]
impl ClientProvider for DisconnectedProvider {
    fn name(&self) -> &str {
        "disconnected"
    }

    async fn get_client(
        &self,
        provider: Provider,
        _config: &ConfigTree,
    ) -> Result<ClientHandle, ClientError> {
        Err(ClientError::Unsupported(provider))
    }
}
