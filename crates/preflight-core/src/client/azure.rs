//! Azure read-only API surface
//!
//! Mirrors the parts of the Resource Manager and Authorization APIs used to
//! verify managed identity permissions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CloudApiError;

/// A resource fetched by id, with its free-form properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericResource {
    pub id: String,
    #[serde(default)]
    pub properties: serde_json::Value,
}

impl GenericResource {
    /// `properties.principalId` of a managed identity
    pub fn principal_id(&self) -> Option<&str> {
        self.properties.get("principalId").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub principal_id: String,
    pub role_definition_id: String,
    pub scope: String,
}

/// One permission block of a role definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub not_actions: Vec<String>,
    #[serde(default)]
    pub data_actions: Vec<String>,
    #[serde(default)]
    pub not_data_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub id: String,
    pub role_name: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[async_trait]
pub trait AzureApi: Send + Sync {
    /// `resources.get_by_id`
    async fn get_resource_by_id(&self, resource_id: &str) -> Result<GenericResource, CloudApiError>;

    /// `role_assignments.list` filtered to one principal
    async fn list_role_assignments(
        &self,
        principal_id: &str,
    ) -> Result<Vec<RoleAssignment>, CloudApiError>;

    /// `role_definitions.get_by_id`
    async fn get_role_definition(
        &self,
        role_definition_id: &str,
    ) -> Result<RoleDefinition, CloudApiError>;
}
