//! Configuration tree and path resolution
//!
//! A run loads one hierarchical configuration document into an immutable
//! [`ConfigTree`]. Checks then ask for individual paths such as
//! `infra:aws:dynamodb:table_name`; the framework never validates the
//! document as a whole.
//!
//! # Path Convention
//!
//! Segments are separated by `:` or `.`, and both may be mixed. A segment made
//! of digits indexes into an array. Keys are case-sensitive.
//!
//! # Missing vs Empty
//!
//! [`resolve`] distinguishes a path that does not exist at all
//! ([`ConfigError::KeyMissing`]) from one that exists but holds null, an empty
//! string or an empty collection ([`ConfigError::ValueMissing`]), each with its
//! own caller-supplied message.

mod loader;
mod node;
mod template;

pub use loader::{ConfigFormat, LoadError};
pub use node::ConfigNode;
pub use template::{MessageTemplate, TemplateError};

use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;

/// Failure kinds of a path resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No node exists at the path
    #[error("{message}")]
    KeyMissing { path: String, message: String },

    /// A node exists at the path but is null or empty
    #[error("{message}")]
    ValueMissing { path: String, message: String },
}

impl ConfigError {
    /// The path as the caller wrote it
    pub fn path(&self) -> &str {
        match self {
            ConfigError::KeyMissing { path, .. } | ConfigError::ValueMissing { path, .. } => path,
        }
    }

    /// The rendered caller message
    pub fn message(&self) -> &str {
        match self {
            ConfigError::KeyMissing { message, .. } | ConfigError::ValueMissing { message, .. } => {
                message
            }
        }
    }

    pub fn is_key_missing(&self) -> bool {
        matches!(self, ConfigError::KeyMissing { .. })
    }
}

/// Tri-state outcome of looking a path up
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Present(&'a ConfigNode),
    KeyMissing,
    ValueMissing,
}

impl<'a> Lookup<'a> {
    pub fn value(self) -> Option<&'a ConfigNode> {
        match self {
            Lookup::Present(node) => Some(node),
            _ => None,
        }
    }
}

/// Immutable configuration document shared by every check of one run
///
/// Cloning is cheap; all clones point at the same tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    root: Arc<ConfigNode>,
}

impl ConfigTree {
    pub fn new(root: ConfigNode) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    /// An empty object; every lookup is `KeyMissing`
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &ConfigNode {
        &self.root
    }

    /// Look a path up without producing messages
    pub fn lookup(&self, path: &str) -> Lookup<'_> {
        if path.is_empty() {
            return Lookup::KeyMissing;
        }

        let mut node = self.root.as_ref();
        for segment in split_path(path) {
            if segment.is_empty() {
                return Lookup::KeyMissing;
            }
            match node.child(segment) {
                Some(next) => node = next,
                None => return Lookup::KeyMissing,
            }
        }

        if node.is_empty_value() {
            Lookup::ValueMissing
        } else {
            Lookup::Present(node)
        }
    }

    /// Resolve a path, see [`resolve`]
    pub fn resolve(
        &self,
        path: &str,
        key_missing_message: &MessageTemplate,
        value_missing_message: &MessageTemplate,
    ) -> Result<&ConfigNode, ConfigError> {
        resolve(self, path, key_missing_message, value_missing_message)
    }

    /// Hex SHA-256 of the canonical JSON form of the tree
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        match serde_json::to_vec(self.root.as_ref()) {
            Ok(bytes) => hasher.update(&bytes),
            Err(_) => hasher.update(self.root.to_string().as_bytes()),
        }
        hex::encode(hasher.finalize())
    }
}

impl From<ConfigNode> for ConfigTree {
    fn from(root: ConfigNode) -> Self {
        ConfigTree::new(root)
    }
}

impl From<serde_json::Value> for ConfigTree {
    fn from(value: serde_json::Value) -> Self {
        ConfigTree::new(ConfigNode::from(value))
    }
}

/// Resolve `path` against `config`
///
/// Returns the leaf unchanged, or fails with `KeyMissing` / `ValueMissing`
/// carrying the matching template rendered with `path`.
pub fn resolve<'a>(
    config: &'a ConfigTree,
    path: &str,
    key_missing_message: &MessageTemplate,
    value_missing_message: &MessageTemplate,
) -> Result<&'a ConfigNode, ConfigError> {
    match config.lookup(path) {
        Lookup::Present(node) => Ok(node),
        Lookup::KeyMissing => {
            tracing::debug!(path, "config key missing");
            Err(ConfigError::KeyMissing {
                path: path.to_string(),
                message: key_missing_message.render(path),
            })
        }
        Lookup::ValueMissing => {
            tracing::debug!(path, "config value missing");
            Err(ConfigError::ValueMissing {
                path: path.to_string(),
                message: value_missing_message.render(path),
            })
        }
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split(|c: char| c == ':' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn templates() -> (MessageTemplate, MessageTemplate) {
        (
            MessageTemplate::new("key missing: {0}").unwrap(),
            MessageTemplate::new("value missing: {0}").unwrap(),
        )
    }

    #[test]
    fn test_empty_string_is_value_missing() {
        let (km, vm) = templates();
        let config = ConfigTree::from(json!({"a": {"b": ""}}));

        let err = config.resolve("a.b", &km, &vm).unwrap_err();
        assert!(matches!(err, ConfigError::ValueMissing { .. }));
        assert_eq!(err.message(), "value missing: a.b");
    }

    #[test]
    fn test_absent_sibling_is_key_missing() {
        let (km, vm) = templates();
        let config = ConfigTree::from(json!({"a": {"b": ""}}));

        let err = config.resolve("a.c", &km, &vm).unwrap_err();
        assert!(err.is_key_missing());
        assert_eq!(err.message(), "key missing: a.c");
        assert_eq!(err.path(), "a.c");
    }

    #[test]
    fn test_present_value_returned() {
        let (km, vm) = templates();
        let config = ConfigTree::from(json!({"a": {"b": "x"}}));

        let node = config.resolve("a.b", &km, &vm).unwrap();
        assert_eq!(node.as_str(), Some("x"));
    }

    #[test]
    fn test_zero_and_false_are_present() {
        let (km, vm) = templates();
        let config = ConfigTree::from(json!({"limits": {"retries": 0, "strict": false}}));

        assert_eq!(
            config.resolve("limits:retries", &km, &vm).unwrap(),
            &ConfigNode::Integer(0)
        );
        assert_eq!(
            config.resolve("limits:strict", &km, &vm).unwrap(),
            &ConfigNode::Bool(false)
        );
    }

    #[test]
    fn test_null_and_empty_collections_are_value_missing() {
        let config = ConfigTree::from(json!({"a": null, "b": [], "c": {}}));
        assert_eq!(config.lookup("a"), Lookup::ValueMissing);
        assert_eq!(config.lookup("b"), Lookup::ValueMissing);
        assert_eq!(config.lookup("c"), Lookup::ValueMissing);
    }

    #[test]
    fn test_separators_are_interchangeable() {
        let config = ConfigTree::from(json!({"infra": {"aws": {"dynamodb": {"table_name": "t"}}}}));
        let colon = config.lookup("infra:aws:dynamodb:table_name");
        let dot = config.lookup("infra.aws.dynamodb.table_name");
        let mixed = config.lookup("infra:aws.dynamodb:table_name");

        assert_eq!(colon.value().and_then(|n| n.as_str()), Some("t"));
        assert_eq!(colon, dot);
        assert_eq!(dot, mixed);
    }

    #[test]
    fn test_traversal_through_scalar_is_key_missing() {
        let config = ConfigTree::from(json!({"a": "scalar"}));
        assert_eq!(config.lookup("a.b"), Lookup::KeyMissing);
    }

    #[test]
    fn test_traversal_through_null_is_key_missing() {
        let config = ConfigTree::from(json!({"a": null}));
        assert_eq!(config.lookup("a.b"), Lookup::KeyMissing);
    }

    #[test]
    fn test_array_index_segments() {
        let config = ConfigTree::from(json!({"subnets": [{"id": "s-1"}, {"id": ""}]}));
        assert_eq!(
            config.lookup("subnets.0.id").value().and_then(|n| n.as_str()),
            Some("s-1")
        );
        assert_eq!(config.lookup("subnets.1.id"), Lookup::ValueMissing);
        assert_eq!(config.lookup("subnets.5.id"), Lookup::KeyMissing);
    }

    #[test]
    fn test_empty_paths_are_key_missing() {
        let config = ConfigTree::from(json!({"a": {"b": "x"}}));
        assert_eq!(config.lookup(""), Lookup::KeyMissing);
        assert_eq!(config.lookup("a..b"), Lookup::KeyMissing);
        assert_eq!(config.lookup("a.b."), Lookup::KeyMissing);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let config = ConfigTree::from(json!({"Infra": {"name": "x"}}));
        assert_eq!(config.lookup("infra.name"), Lookup::KeyMissing);
        assert!(config.lookup("Infra.name").value().is_some());
    }

    #[test]
    fn test_digest_is_stable() {
        let a = ConfigTree::from(json!({"b": 1, "a": 2}));
        let b = ConfigTree::from(json!({"a": 2, "b": 1}));
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
        assert_ne!(a.digest(), ConfigTree::empty().digest());
    }

    proptest! {
        #[test]
        fn prop_absent_path_is_key_missing(key in "[a-z]{1,8}", other in "[A-Z]{1,8}") {
            let (km, vm) = templates();
            let config = ConfigTree::from(json!({ key.clone(): "value" }));
            let path = format!("{}.{}", other, key);

            let err = config.resolve(&path, &km, &vm).unwrap_err();
            prop_assert!(err.is_key_missing());
            prop_assert!(err.message().contains(&path));
        }

        #[test]
        fn prop_numbers_and_booleans_resolve(n in any::<i64>(), b in any::<bool>()) {
            let (km, vm) = templates();
            let config = ConfigTree::from(json!({"x": {"n": n, "b": b}}));

            prop_assert_eq!(config.resolve("x:n", &km, &vm).unwrap(), &ConfigNode::Integer(n));
            prop_assert_eq!(config.resolve("x:b", &km, &vm).unwrap(), &ConfigNode::Bool(b));
        }

        #[test]
        fn prop_non_empty_strings_roundtrip(s in ".{1,32}") {
            let (km, vm) = templates();
            let config = ConfigTree::from(json!({"a": {"b": s.clone()}}));
            prop_assert_eq!(config.resolve("a.b", &km, &vm).unwrap().as_str(), Some(s.as_str()));
        }
    }
}
