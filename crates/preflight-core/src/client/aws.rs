//! AWS read-only API surface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CloudApiError;

/// Subset of a DynamoDB `DescribeTable` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_arn: Option<String>,
}

impl TableDescription {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            table_status: None,
            table_arn: None,
        }
    }
}

#[async_trait]
pub trait AwsApi: Send + Sync {
    /// DynamoDB `DescribeTable`
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription, CloudApiError>;

    /// S3 `HeadBucket`
    async fn head_bucket(&self, bucket_name: &str) -> Result<(), CloudApiError>;
}
