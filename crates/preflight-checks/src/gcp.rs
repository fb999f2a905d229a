//! GCP infrastructure checks

use preflight_core::{CheckContext, CheckError, CheckOutcome};

pub const STORAGE_BUCKET_NAME: &str = "infra:gcp:storage:bucket_name";
pub const SERVICE_ACCOUNT_EMAIL: &str = "env:gcp:service_account:email";

/// The configured Cloud Storage bucket must exist
pub async fn gcp_storage_bucket_exists(ctx: CheckContext) -> CheckOutcome {
    let bucket_name = ctx.require_str(
        STORAGE_BUCKET_NAME,
        "No bucket name was defined for config option: {0}",
        "No bucket name was provided for config option: {0}",
    )?;

    match ctx.gcp().await?.get_bucket(&bucket_name).await {
        Ok(_) => Ok(()),
        Err(err) if err.is_not_found() => Err(CheckError::fail(format!(
            "Cloud Storage bucket ({}) does not exist.",
            bucket_name
        ))),
        Err(err) => Err(err.into()),
    }
}

/// The configured service account must exist and be enabled
pub async fn gcp_service_account_exists(ctx: CheckContext) -> CheckOutcome {
    let email = ctx.require_str(
        SERVICE_ACCOUNT_EMAIL,
        "No service account was defined for config option: {0}",
        "No service account was provided for config option: {0}",
    )?;

    match ctx.gcp().await?.get_service_account(&email).await {
        Ok(account) if account.disabled => Err(CheckError::fail(format!(
            "Service account ({}) is disabled.",
            email
        ))),
        Ok(_) => Ok(()),
        Err(err) if err.is_not_found() => Err(CheckError::fail(format!(
            "Service account ({}) does not exist.",
            email
        ))),
        Err(err) => Err(err.into()),
    }
}
