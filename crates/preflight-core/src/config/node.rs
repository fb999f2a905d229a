//! Tagged configuration node

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A single node of a configuration document
///
/// Objects use a `BTreeMap` so serialization and iteration order are
/// deterministic regardless of the order keys appeared in the source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigNode {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<ConfigNode>),
    Object(BTreeMap<String, ConfigNode>),
}

impl ConfigNode {
    /// Whether this node counts as "present but empty"
    ///
    /// Null, the empty string and empty collections are empty. Zero and
    /// `false` are real values.
    pub fn is_empty_value(&self) -> bool {
        match self {
            ConfigNode::Null => true,
            ConfigNode::String(s) => s.is_empty(),
            ConfigNode::Array(items) => items.is_empty(),
            ConfigNode::Object(map) => map.is_empty(),
            ConfigNode::Bool(_) | ConfigNode::Integer(_) | ConfigNode::Float(_) => false,
        }
    }

    /// Step one path segment down from this node
    ///
    /// Objects are indexed by key, arrays by a decimal index. Scalars have no
    /// children.
    pub fn child(&self, segment: &str) -> Option<&ConfigNode> {
        match self {
            ConfigNode::Object(map) => map.get(segment),
            ConfigNode::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigNode::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigNode::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigNode::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigNode::Float(f) => Some(*f),
            ConfigNode::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ConfigNode]> {
        match self {
            ConfigNode::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, ConfigNode>> {
        match self {
            ConfigNode::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigNode::Null => "null",
            ConfigNode::Bool(_) => "boolean",
            ConfigNode::Integer(_) => "integer",
            ConfigNode::Float(_) => "float",
            ConfigNode::String(_) => "string",
            ConfigNode::Array(_) => "array",
            ConfigNode::Object(_) => "object",
        }
    }
}

impl Default for ConfigNode {
    fn default() -> Self {
        ConfigNode::Object(BTreeMap::new())
    }
}

impl fmt::Display for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigNode::Null => write!(f, "null"),
            ConfigNode::Bool(b) => write!(f, "{}", b),
            ConfigNode::Integer(i) => write!(f, "{}", i),
            ConfigNode::Float(x) => write!(f, "{}", x),
            ConfigNode::String(s) => write!(f, "{}", s),
            other => match serde_json::to_string(other) {
                Ok(json) => write!(f, "{}", json),
                Err(_) => write!(f, "<{}>", other.type_name()),
            },
        }
    }
}

impl From<serde_json::Value> for ConfigNode {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => ConfigNode::Null,
            Value::Bool(b) => ConfigNode::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ConfigNode::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    ConfigNode::Float(f)
                } else {
                    ConfigNode::String(n.to_string())
                }
            }
            Value::String(s) => ConfigNode::String(s),
            Value::Array(items) => {
                ConfigNode::Array(items.into_iter().map(ConfigNode::from).collect())
            }
            Value::Object(map) => ConfigNode::Object(
                map.into_iter()
                    .map(|(key, value)| (key, ConfigNode::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ConfigNode {
    fn from(value: &str) -> Self {
        ConfigNode::String(value.to_string())
    }
}

impl From<String> for ConfigNode {
    fn from(value: String) -> Self {
        ConfigNode::String(value)
    }
}

impl From<bool> for ConfigNode {
    fn from(value: bool) -> Self {
        ConfigNode::Bool(value)
    }
}

impl From<i64> for ConfigNode {
    fn from(value: i64) -> Self {
        ConfigNode::Integer(value)
    }
}
