//! GCP read-only API surface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CloudApiError;

/// Cloud Storage bucket metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// IAM service account metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub email: String,
    #[serde(default)]
    pub disabled: bool,
}

#[async_trait]
pub trait GcpApi: Send + Sync {
    /// `storage.buckets.get`
    async fn get_bucket(&self, bucket_name: &str) -> Result<Bucket, CloudApiError>;

    /// `iam.projects.serviceAccounts.get`
    async fn get_service_account(&self, email: &str) -> Result<ServiceAccount, CloudApiError>;
}
