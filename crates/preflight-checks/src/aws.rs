//! AWS infrastructure checks

use preflight_core::{CheckContext, CheckError, CheckOutcome};

pub const DYNAMODB_TABLE_NAME: &str = "infra:aws:dynamodb:table_name";
pub const S3_BUCKET_NAME: &str = "infra:aws:s3:bucket_name";

/// The configured DynamoDB table must exist
pub async fn aws_dynamodb_table_exists(ctx: CheckContext) -> CheckOutcome {
    let table_name = ctx.require_str(
        DYNAMODB_TABLE_NAME,
        "No table name was defined for config option: {0}",
        "No table name was provided for config option: {0}",
    )?;

    match ctx.aws().await?.describe_table(&table_name).await {
        Ok(table) => {
            tracing::debug!(table = %table.table_name, status = ?table.table_status, "found DynamoDB table");
            Ok(())
        }
        Err(err) if err.is_not_found() => Err(CheckError::fail(format!(
            "DynamoDB table ({}) does not exist.",
            table_name
        ))),
        Err(err) => Err(err.into()),
    }
}

/// The configured S3 bucket must exist
pub async fn aws_s3_bucket_exists(ctx: CheckContext) -> CheckOutcome {
    let bucket_name = ctx.require_str(
        S3_BUCKET_NAME,
        "No bucket name was defined for config option: {0}",
        "No bucket name was provided for config option: {0}",
    )?;

    match ctx.aws().await?.head_bucket(&bucket_name).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_not_found() => Err(CheckError::fail(format!(
            "S3 bucket ({}) does not exist.",
            bucket_name
        ))),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::context_with;
    use async_trait::async_trait;
    use mockall::mock;
    use preflight_core::client::{AwsApi, TableDescription};
    use preflight_core::{ClientHandle, CloudApiError, ConfigError};
    use serde_json::json;
    use std::sync::Arc;

    mock! {
        pub Aws {}

        #[async_trait]
        impl AwsApi for Aws {
            async fn describe_table(&self, table_name: &str) -> Result<TableDescription, CloudApiError>;
            async fn head_bucket(&self, bucket_name: &str) -> Result<(), CloudApiError>;
        }
    }

    fn table_config(name: &str) -> serde_json::Value {
        json!({"infra": {"aws": {"dynamodb": {"table_name": name}}}})
    }

    #[tokio::test]
    async fn test_table_exists() {
        let mut aws = MockAws::new();
        aws.expect_describe_table()
            .withf(|name: &str| name == "cdp-table")
            .times(1)
            .returning(|name: &str| Ok(TableDescription::new(name)));

        let ctx = context_with(table_config("cdp-table"), ClientHandle::Aws(Arc::new(aws)));
        assert!(aws_dynamodb_table_exists(ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_table_missing_is_assertion() {
        let mut aws = MockAws::new();
        aws.expect_describe_table()
            .returning(|name: &str| Err(CloudApiError::NotFound(name.to_string())));

        let ctx = context_with(table_config("gone"), ClientHandle::Aws(Arc::new(aws)));
        let err = aws_dynamodb_table_exists(ctx).await.unwrap_err();
        assert_eq!(err, CheckError::fail("DynamoDB table (gone) does not exist."));
    }

    #[tokio::test]
    async fn test_access_denied_is_cloud_error() {
        let mut aws = MockAws::new();
        aws.expect_describe_table()
            .returning(|_: &str| Err(CloudApiError::AccessDenied("dynamodb:DescribeTable".into())));

        let ctx = context_with(table_config("t"), ClientHandle::Aws(Arc::new(aws)));
        let err = aws_dynamodb_table_exists(ctx).await.unwrap_err();
        assert!(matches!(err, CheckError::Cloud(CloudApiError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_missing_table_name_skips_api_call() {
        let mut aws = MockAws::new();
        aws.expect_describe_table().never();

        let ctx = context_with(json!({"infra": {"aws": {}}}), ClientHandle::Aws(Arc::new(aws)));
        let err = aws_dynamodb_table_exists(ctx).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "No table name was defined for config option: infra:aws:dynamodb:table_name"
        );
        assert!(matches!(err, CheckError::Config(ConfigError::KeyMissing { .. })));
    }

    #[tokio::test]
    async fn test_bucket_missing() {
        let mut aws = MockAws::new();
        aws.expect_head_bucket()
            .returning(|name: &str| Err(CloudApiError::NotFound(name.to_string())));

        let ctx = context_with(
            json!({"infra": {"aws": {"s3": {"bucket_name": "cdp-logs"}}}}),
            ClientHandle::Aws(Arc::new(aws)),
        );
        let err = aws_s3_bucket_exists(ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "S3 bucket (cdp-logs) does not exist.");
    }
}
