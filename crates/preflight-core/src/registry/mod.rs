//! Check registry
//!
//! An explicit, ordered collection of [`CheckDescriptor`]s. Registries are
//! ordinary values: build one at startup, pass it by reference to the
//! engine, and build another one for tests.
//!
//! ```
//! use preflight_core::{CheckContext, CheckOutcome, CheckRegistry, TagFilter};
//!
//! async fn aws_dynamodb_table_exists(_ctx: CheckContext) -> CheckOutcome {
//!     Ok(())
//! }
//!
//! let mut registry = CheckRegistry::new();
//! registry.register(["aws", "infra"], aws_dynamodb_table_exists).unwrap();
//!
//! let selected = registry.list(&TagFilter::tag("aws"));
//! assert_eq!(selected[0].name(), "aws_dynamodb_table_exists");
//! ```

mod descriptor;
mod filter;

pub use descriptor::CheckDescriptor;
pub use filter::TagFilter;

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::check::CheckFn;

/// Errors raised while building or querying a registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("A check named '{0}' is already registered")]
    DuplicateName(String),

    #[error("Invalid check name '{0}': use letters, digits, '_' or '-' (closures need register_named)")]
    InvalidName(String),

    #[error("Unknown check: {0}")]
    UnknownCheck(String),
}

impl RegistryError {
    /// Unknown names come from the caller's selection; the others are
    /// defects in how checks were assembled
    pub fn is_user_error(&self) -> bool {
        matches!(self, RegistryError::UnknownCheck(_))
    }
}

/// Ordered set of uniquely named checks
#[derive(Debug, Default)]
pub struct CheckRegistry {
    checks: Vec<Arc<CheckDescriptor>>,
    index: HashMap<String, usize>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function under its own name
    pub fn register<I, T, F>(&mut self, tags: I, body: F) -> Result<&mut Self, RegistryError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
        F: CheckFn + 'static,
    {
        let name = descriptor::function_name::<F>();
        self.register_descriptor(CheckDescriptor::from_fn(name, tags, body))
    }

    /// Register a body under an explicit name
    pub fn register_named<I, T, F>(
        &mut self,
        name: impl Into<String>,
        tags: I,
        body: F,
    ) -> Result<&mut Self, RegistryError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
        F: CheckFn + 'static,
    {
        self.register_descriptor(CheckDescriptor::from_fn(name, tags, body))
    }

    pub fn register_descriptor(
        &mut self,
        descriptor: CheckDescriptor,
    ) -> Result<&mut Self, RegistryError> {
        let name = descriptor.name().to_string();
        if !is_valid_name(&name) {
            return Err(RegistryError::InvalidName(name));
        }
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        tracing::trace!(check = %name, tags = ?descriptor.tags(), "registered check");
        self.index.insert(name, self.checks.len());
        self.checks.push(Arc::new(descriptor));
        Ok(self)
    }

    /// Checks selected by `filter`, in registration order
    pub fn list(&self, filter: &TagFilter) -> Vec<Arc<CheckDescriptor>> {
        self.list_where(|d| filter.matches(d))
    }

    pub fn list_where(&self, predicate: impl Fn(&CheckDescriptor) -> bool) -> Vec<Arc<CheckDescriptor>> {
        self.checks
            .iter()
            .filter(|d| predicate(d))
            .cloned()
            .collect()
    }

    /// Fail when the filter names a check that does not exist
    pub fn validate_filter(&self, filter: &TagFilter) -> Result<(), RegistryError> {
        match filter.names().iter().find(|n| !self.index.contains_key(n.as_str())) {
            Some(unknown) => Err(RegistryError::UnknownCheck(unknown.clone())),
            None => Ok(()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CheckDescriptor>> {
        self.index.get(name).map(|&i| &self.checks[i])
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// All checks in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CheckDescriptor>> {
        self.checks.iter()
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
