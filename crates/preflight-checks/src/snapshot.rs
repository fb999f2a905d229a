//! Offline client provider backed by a recorded account state
//!
//! A snapshot document lists the resources and permissions of one account,
//! per cloud. Each cloud section is optional:
//!
//! ```yaml
//! aws:
//!   dynamodb_tables:
//!     - table_name: cdp-table
//!       table_status: ACTIVE
//!   s3_buckets: [cdp-logs]
//! azure:
//!   credentials: false        # get_client fails with a credentials error
//! gcp:
//!   buckets:
//!     - name: cdp-data
//!   service_accounts:
//!     - email: cdp@project.iam.gserviceaccount.com
//! ```
//!
//! A cloud missing from the document is reported as unsupported. Names listed
//! under `access_denied` answer every call with an access-denied error.

use async_trait::async_trait;
use preflight_core::client::{
    AwsApi, AzureApi, Bucket, GcpApi, GenericResource, RoleAssignment, RoleDefinition,
    ServiceAccount, TableDescription,
};
use preflight_core::{ClientError, ClientHandle, ClientProvider, CloudApiError, ConfigTree, Provider};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while loading a snapshot document
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot '{origin}': {message}")]
    Parse { origin: String, message: String },

    #[error("Unsupported snapshot format for '{}' (expected .json, .yaml or .yml)", .0.display())]
    UnsupportedFormat(PathBuf),
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp: Option<GcpSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsSnapshot {
    #[serde(default = "default_true")]
    pub credentials: bool,
    #[serde(default)]
    pub dynamodb_tables: Vec<TableDescription>,
    #[serde(default)]
    pub s3_buckets: Vec<String>,
    #[serde(default)]
    pub access_denied: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzureSnapshot {
    #[serde(default = "default_true")]
    pub credentials: bool,
    #[serde(default)]
    pub resources: Vec<GenericResource>,
    #[serde(default)]
    pub role_assignments: Vec<RoleAssignment>,
    #[serde(default)]
    pub role_definitions: Vec<RoleDefinition>,
    #[serde(default)]
    pub access_denied: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcpSnapshot {
    #[serde(default = "default_true")]
    pub credentials: bool,
    #[serde(default)]
    pub buckets: Vec<Bucket>,
    #[serde(default)]
    pub service_accounts: Vec<ServiceAccount>,
    #[serde(default)]
    pub access_denied: Vec<String>,
}

/// [`ClientProvider`] answering from a [`SnapshotDocument`]
#[derive(Debug, Clone)]
pub struct SnapshotClientProvider {
    document: Arc<SnapshotDocument>,
    origin: String,
}

impl SnapshotClientProvider {
    pub fn new(document: SnapshotDocument) -> Self {
        Self {
            document: Arc::new(document),
            origin: "<inline>".to_string(),
        }
    }

    /// Load a JSON or YAML snapshot, chosen by extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let content = || {
            std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        let origin = path.display().to_string();

        let document: SnapshotDocument = match ext.as_deref() {
            Some("json") => serde_json::from_str(&content()?).map_err(|e| SnapshotError::Parse {
                origin: origin.clone(),
                message: e.to_string(),
            })?,
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content()?).map_err(|e| SnapshotError::Parse {
                    origin: origin.clone(),
                    message: e.to_string(),
                })?
            }
            _ => return Err(SnapshotError::UnsupportedFormat(path.to_path_buf())),
        };

        tracing::debug!(snapshot = %origin, "loaded account snapshot");
        Ok(Self {
            document: Arc::new(document),
            origin,
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(content)
            .map(Self::new)
            .map_err(|e| SnapshotError::Parse {
                origin: "<inline>".to_string(),
                message: e.to_string(),
            })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, SnapshotError> {
        serde_yaml::from_str(content)
            .map(Self::new)
            .map_err(|e| SnapshotError::Parse {
                origin: "<inline>".to_string(),
                message: e.to_string(),
            })
    }

    pub fn document(&self) -> &SnapshotDocument {
        &self.document
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn credentials_error(&self, provider: Provider) -> ClientError {
        ClientError::Credentials {
            provider,
            message: format!("snapshot {} marks credentials as unavailable", self.origin),
        }
    }
}

#[async_trait]
impl ClientProvider for SnapshotClientProvider {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn get_client(
        &self,
        provider: Provider,
        _config: &ConfigTree,
    ) -> Result<ClientHandle, ClientError> {
        match provider {
            Provider::Aws => match &self.document.aws {
                Some(aws) if aws.credentials => Ok(ClientHandle::Aws(Arc::new(aws.clone()))),
                Some(_) => Err(self.credentials_error(provider)),
                None => Err(ClientError::Unsupported(provider)),
            },
            Provider::Azure => match &self.document.azure {
                Some(azure) if azure.credentials => Ok(ClientHandle::Azure(Arc::new(azure.clone()))),
                Some(_) => Err(self.credentials_error(provider)),
                None => Err(ClientError::Unsupported(provider)),
            },
            Provider::Gcp => match &self.document.gcp {
                Some(gcp) if gcp.credentials => Ok(ClientHandle::Gcp(Arc::new(gcp.clone()))),
                Some(_) => Err(self.credentials_error(provider)),
                None => Err(ClientError::Unsupported(provider)),
            },
        }
    }
}

fn guard(denied: &[String], name: &str) -> Result<(), CloudApiError> {
    if denied.iter().any(|d| d.eq_ignore_ascii_case(name)) {
        Err(CloudApiError::AccessDenied(name.to_string()))
    } else {
        Ok(())
    }
}

#[async_trait]
impl AwsApi for AwsSnapshot {
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription, CloudApiError> {
        guard(&self.access_denied, table_name)?;
        self.dynamodb_tables
            .iter()
            .find(|t| t.table_name == table_name)
            .cloned()
            .ok_or_else(|| CloudApiError::NotFound(format!("Requested resource not found: Table: {}", table_name)))
    }

    async fn head_bucket(&self, bucket_name: &str) -> Result<(), CloudApiError> {
        guard(&self.access_denied, bucket_name)?;
        if self.s3_buckets.iter().any(|b| b == bucket_name) {
            Ok(())
        } else {
            Err(CloudApiError::NotFound(format!("NoSuchBucket: {}", bucket_name)))
        }
    }
}

#[async_trait]
impl AzureApi for AzureSnapshot {
    async fn get_resource_by_id(&self, resource_id: &str) -> Result<GenericResource, CloudApiError> {
        guard(&self.access_denied, resource_id)?;
        self.resources
            .iter()
            .find(|r| r.id.eq_ignore_ascii_case(resource_id))
            .cloned()
            .ok_or_else(|| CloudApiError::NotFound(format!("ResourceNotFound: {}", resource_id)))
    }

    async fn list_role_assignments(
        &self,
        principal_id: &str,
    ) -> Result<Vec<RoleAssignment>, CloudApiError> {
        guard(&self.access_denied, principal_id)?;
        Ok(self
            .role_assignments
            .iter()
            .filter(|a| a.principal_id == principal_id)
            .cloned()
            .collect())
    }

    async fn get_role_definition(
        &self,
        role_definition_id: &str,
    ) -> Result<RoleDefinition, CloudApiError> {
        guard(&self.access_denied, role_definition_id)?;
        self.role_definitions
            .iter()
            .find(|d| d.id.eq_ignore_ascii_case(role_definition_id))
            .cloned()
            .ok_or_else(|| {
                CloudApiError::NotFound(format!("RoleDefinitionDoesNotExist: {}", role_definition_id))
            })
    }
}

#[async_trait]
impl GcpApi for GcpSnapshot {
    async fn get_bucket(&self, bucket_name: &str) -> Result<Bucket, CloudApiError> {
        guard(&self.access_denied, bucket_name)?;
        self.buckets
            .iter()
            .find(|b| b.name == bucket_name)
            .cloned()
            .ok_or_else(|| CloudApiError::NotFound(format!("bucket {}", bucket_name)))
    }

    async fn get_service_account(&self, email: &str) -> Result<ServiceAccount, CloudApiError> {
        guard(&self.access_denied, email)?;
        self.service_accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or_else(|| CloudApiError::NotFound(format!("service account {}", email)))
    }
}
