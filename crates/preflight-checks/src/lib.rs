//! Cloud Preflight Checks
//!
//! The concrete checks run before provisioning, and an offline
//! [`SnapshotClientProvider`] that answers their cloud calls from a recorded
//! account state.
//!
//! | Check                                       | Tags                |
//! |---------------------------------------------|---------------------|
//! | `aws_dynamodb_table_exists`                 | `aws`, `infra`      |
//! | `aws_s3_bucket_exists`                      | `aws`, `infra`      |
//! | `azure_dladmin_logs_storage_actions`        | `azure`, `permissions` |
//! | `azure_dladmin_logs_storage_data_actions`   | `azure`, `permissions` |
//! | `azure_dladmin_data_storage_actions`        | `azure`, `permissions` |
//! | `azure_dladmin_data_storage_data_actions`   | `azure`, `permissions` |
//! | `gcp_storage_bucket_exists`                 | `gcp`, `infra`      |
//! | `gcp_service_account_exists`                | `gcp`, `identity`   |

pub mod aws;
pub mod azure;
pub mod gcp;
pub mod snapshot;

#[cfg(test)]
mod testing;

pub use snapshot::{SnapshotClientProvider, SnapshotDocument, SnapshotError};

use preflight_core::{CheckDescriptor, CheckRegistry, RegistryError};

/// Register every built-in check, in a fixed order
pub fn register_all(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    registry
        .register_descriptor(
            CheckDescriptor::from_fn("aws_dynamodb_table_exists", ["aws", "infra"], aws::aws_dynamodb_table_exists)
                .with_description("The DynamoDB table named in the configuration exists"),
        )?
        .register_descriptor(
            CheckDescriptor::from_fn("aws_s3_bucket_exists", ["aws", "infra"], aws::aws_s3_bucket_exists)
                .with_description("The S3 bucket named in the configuration exists"),
        )?
        .register_descriptor(
            CheckDescriptor::from_fn(
                "azure_dladmin_logs_storage_actions",
                ["azure", "permissions"],
                azure::azure_dladmin_logs_storage_actions,
            )
            .with_description("Data lake admin identity holds the required actions on the logs container"),
        )?
        .register_descriptor(
            CheckDescriptor::from_fn(
                "azure_dladmin_logs_storage_data_actions",
                ["azure", "permissions"],
                azure::azure_dladmin_logs_storage_data_actions,
            )
            .with_description("Data lake admin identity holds the required data actions on the logs container"),
        )?
        .register_descriptor(
            CheckDescriptor::from_fn(
                "azure_dladmin_data_storage_actions",
                ["azure", "permissions"],
                azure::azure_dladmin_data_storage_actions,
            )
            .with_description("Data lake admin identity holds the required actions on the data container"),
        )?
        .register_descriptor(
            CheckDescriptor::from_fn(
                "azure_dladmin_data_storage_data_actions",
                ["azure", "permissions"],
                azure::azure_dladmin_data_storage_data_actions,
            )
            .with_description("Data lake admin identity holds the required data actions on the data container"),
        )?
        .register_descriptor(
            CheckDescriptor::from_fn("gcp_storage_bucket_exists", ["gcp", "infra"], gcp::gcp_storage_bucket_exists)
                .with_description("The Cloud Storage bucket named in the configuration exists"),
        )?
        .register_descriptor(
            CheckDescriptor::from_fn("gcp_service_account_exists", ["gcp", "identity"], gcp::gcp_service_account_exists)
                .with_description("The configured service account exists and is enabled"),
        )?;
    Ok(())
}

/// A fresh registry holding every built-in check
pub fn default_registry() -> Result<CheckRegistry, RegistryError> {
    let mut registry = CheckRegistry::new();
    register_all(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflight_core::TagFilter;

    #[test]
    fn test_default_registry() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.len(), 8);
        assert_eq!(registry.list(&TagFilter::tag("azure")).len(), 4);
        assert_eq!(
            registry.get("aws_dynamodb_table_exists").unwrap().category(),
            Some("infra")
        );
    }

    #[test]
    fn test_register_all_twice_is_duplicate() {
        let mut registry = default_registry().unwrap();
        assert_eq!(
            register_all(&mut registry),
            Err(RegistryError::DuplicateName("aws_dynamodb_table_exists".into()))
        );
    }
}
