//! Azure data lake admin identity permission checks
//!
//! The data lake admin is a user-assigned managed identity in the
//! environment's resource group. Each check resolves the identity's
//! principal, gathers the permissions of every role assignment whose scope
//! covers one storage container, and fails listing each required action the
//! identity is not granted.

use preflight_core::client::{AzureApi, Permission};
use preflight_core::{CheckContext, CheckError, CheckOutcome};
use std::collections::BTreeSet;

pub const SUBSCRIPTION_ID: &str = "infra:azure:subscription_id";
pub const RESOURCE_GROUP: &str = "infra:azure:metagroup:name";
pub const DATALAKE_ADMIN_IDENTITY: &str = "env:azure:role:name:datalake_admin";
pub const LOGS_STORAGE_PATH: &str = "env:azure:storage:path:logs";
pub const DATA_STORAGE_PATH: &str = "env:azure:storage:path:data";

/// Control-plane actions the data lake admin needs on a container
pub const REQUIRED_STORAGE_ACTIONS: &[&str] = &[
    "Microsoft.Storage/storageAccounts/blobServices/containers/delete",
    "Microsoft.Storage/storageAccounts/blobServices/containers/read",
    "Microsoft.Storage/storageAccounts/blobServices/containers/write",
    "Microsoft.Storage/storageAccounts/blobServices/generateUserDelegationKey/action",
];

/// Data-plane actions the data lake admin needs on a container
pub const REQUIRED_STORAGE_DATA_ACTIONS: &[&str] = &[
    "Microsoft.Storage/storageAccounts/blobServices/containers/blobs/delete",
    "Microsoft.Storage/storageAccounts/blobServices/containers/blobs/read",
    "Microsoft.Storage/storageAccounts/blobServices/containers/blobs/write",
    "Microsoft.Storage/storageAccounts/blobServices/containers/blobs/move/action",
    "Microsoft.Storage/storageAccounts/blobServices/containers/blobs/add/action",
];

/// Which half of a role definition's permissions to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Control,
    Data,
}

impl ActionKind {
    fn label(&self) -> &'static str {
        match self {
            ActionKind::Control => "actions",
            ActionKind::Data => "data actions",
        }
    }

    fn granted<'a>(&self, permission: &'a Permission) -> (&'a [String], &'a [String]) {
        match self {
            ActionKind::Control => (permission.actions.as_slice(), permission.not_actions.as_slice()),
            ActionKind::Data => (
                permission.data_actions.as_slice(),
                permission.not_data_actions.as_slice(),
            ),
        }
    }
}

/// Container and account parsed from `abfs://container@account.dfs.core.windows.net/...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbfsLocation {
    pub container: String,
    pub account: String,
}

impl AbfsLocation {
    pub fn parse(url: &str) -> Option<Self> {
        let rest = url
            .strip_prefix("abfs://")
            .or_else(|| url.strip_prefix("abfss://"))?;
        let authority = rest.split('/').next()?;
        let (container, host) = authority.split_once('@')?;
        let account = host.split('.').next()?;

        if container.is_empty() || account.is_empty() {
            return None;
        }
        Some(Self {
            container: container.to_string(),
            account: account.to_string(),
        })
    }
}

pub fn identity_resource_id(subscription_id: &str, resource_group: &str, identity: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ManagedIdentity/userAssignedIdentities/{}",
        subscription_id, resource_group, identity
    )
}

pub fn container_scope(subscription_id: &str, resource_group: &str, location: &AbfsLocation) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Storage/storageAccounts/{}/blobServices/default/containers/{}",
        subscription_id, resource_group, location.account, location.container
    )
}

/// Whether an assignment at `assignment_scope` applies to `target`
///
/// Scopes compare case-insensitively; an assignment applies to its own scope
/// and everything below it.
pub fn scope_covers(assignment_scope: &str, target: &str) -> bool {
    let scope = assignment_scope.trim_end_matches('/').to_ascii_lowercase();
    let target = target.trim_end_matches('/').to_ascii_lowercase();

    scope.is_empty() || target == scope || target.starts_with(&format!("{}/", scope))
}

/// Case-insensitive match of an action against a pattern with `*` wildcards
pub fn action_matches(pattern: &str, action: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let action = action.to_ascii_lowercase();

    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == action;
    }

    let (first, last) = (parts[0], parts[parts.len() - 1]);
    let Some(mut rest) = action.strip_prefix(first) else {
        return false;
    };
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(index) => rest = &rest[index + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

/// Required actions not granted by any permission block
///
/// Within one block an action is granted when an allow pattern matches it
/// and no deny pattern does.
pub fn missing_actions(permissions: &[Permission], required: &[&str], kind: ActionKind) -> Vec<String> {
    required
        .iter()
        .filter(|action| {
            !permissions.iter().any(|permission| {
                let (allowed, denied) = kind.granted(permission);
                allowed.iter().any(|p| action_matches(p, action))
                    && !denied.iter().any(|p| action_matches(p, action))
            })
        })
        .map(|action| action.to_string())
        .collect()
}

pub async fn azure_dladmin_logs_storage_actions(ctx: CheckContext) -> CheckOutcome {
    check_identity_permissions(&ctx, LOGS_STORAGE_PATH, ActionKind::Control, REQUIRED_STORAGE_ACTIONS).await
}

pub async fn azure_dladmin_logs_storage_data_actions(ctx: CheckContext) -> CheckOutcome {
    check_identity_permissions(&ctx, LOGS_STORAGE_PATH, ActionKind::Data, REQUIRED_STORAGE_DATA_ACTIONS).await
}

pub async fn azure_dladmin_data_storage_actions(ctx: CheckContext) -> CheckOutcome {
    check_identity_permissions(&ctx, DATA_STORAGE_PATH, ActionKind::Control, REQUIRED_STORAGE_ACTIONS).await
}

pub async fn azure_dladmin_data_storage_data_actions(ctx: CheckContext) -> CheckOutcome {
    check_identity_permissions(&ctx, DATA_STORAGE_PATH, ActionKind::Data, REQUIRED_STORAGE_DATA_ACTIONS).await
}

async fn check_identity_permissions(
    ctx: &CheckContext,
    storage_path_option: &str,
    kind: ActionKind,
    required: &[&str],
) -> CheckOutcome {
    let subscription_id = ctx.require_str(
        SUBSCRIPTION_ID,
        "No subscription id was defined for config option: {0}",
        "No subscription id was provided for config option: {0}",
    )?;
    let resource_group = ctx.require_str(
        RESOURCE_GROUP,
        "No resource group was defined for config option: {0}",
        "No resource group was provided for config option: {0}",
    )?;
    let identity = ctx.require_str(
        DATALAKE_ADMIN_IDENTITY,
        "No data lake admin identity was defined for config option: {0}",
        "No data lake admin identity was provided for config option: {0}",
    )?;
    let storage_path = ctx.require_str(
        storage_path_option,
        "No storage location was defined for config option: {0}",
        "No storage location was provided for config option: {0}",
    )?;

    let location = AbfsLocation::parse(&storage_path).ok_or_else(|| {
        CheckError::fail(format!(
            "Storage location ({}) for config option {} is not a valid abfs URL.",
            storage_path, storage_path_option
        ))
    })?;
    let scope = container_scope(&subscription_id, &resource_group, &location);

    let azure = ctx.azure().await?;
    let principal_id =
        identity_principal_id(azure.as_ref(), &subscription_id, &resource_group, &identity).await?;
    let permissions = permissions_at_scope(azure.as_ref(), &principal_id, &scope).await?;

    let missing = missing_actions(&permissions, required, kind);
    if missing.is_empty() {
        return Ok(());
    }

    Err(CheckError::fail(format!(
        "The {} identity is missing the following {} on {}: {}",
        identity,
        kind.label(),
        scope,
        missing.join(", ")
    )))
}

async fn identity_principal_id(
    azure: &dyn AzureApi,
    subscription_id: &str,
    resource_group: &str,
    identity: &str,
) -> Result<String, CheckError> {
    let resource_id = identity_resource_id(subscription_id, resource_group, identity);
    let resource = match azure.get_resource_by_id(&resource_id).await {
        Ok(resource) => resource,
        Err(err) if err.is_not_found() => {
            return Err(CheckError::fail(format!(
                "Managed identity ({}) does not exist in resource group ({}).",
                identity, resource_group
            )))
        }
        Err(err) => return Err(err.into()),
    };

    resource
        .principal_id()
        .map(str::to_string)
        .ok_or_else(|| {
            CheckError::fail(format!(
                "Unable to find the principal id of managed identity ({}).",
                identity
            ))
        })
}

async fn permissions_at_scope(
    azure: &dyn AzureApi,
    principal_id: &str,
    scope: &str,
) -> Result<Vec<Permission>, CheckError> {
    let definition_ids: BTreeSet<String> = azure
        .list_role_assignments(principal_id)
        .await?
        .into_iter()
        .filter(|a| a.principal_id == principal_id && scope_covers(&a.scope, scope))
        .map(|a| a.role_definition_id)
        .collect();

    tracing::debug!(principal_id, scope, roles = definition_ids.len(), "matched role assignments");

    let mut permissions = Vec::new();
    for id in &definition_ids {
        let definition = azure.get_role_definition(id).await?;
        permissions.extend(definition.permissions);
    }
    Ok(permissions)
}
