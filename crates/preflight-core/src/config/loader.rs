//! Loading configuration documents from JSON, YAML and TOML files

use serde_json::Value as JsonValue;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{ConfigNode, ConfigTree};

/// Errors raised while loading a configuration document
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config '{origin}': {message}")]
    Parse {
        origin: String,
        format: ConfigFormat,
        message: String,
    },

    #[error("Unsupported config format for '{}' (expected .json, .yaml, .yml or .toml)", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFormat::Json => write!(f, "JSON"),
            ConfigFormat::Yaml => write!(f, "YAML"),
            ConfigFormat::Toml => write!(f, "TOML"),
        }
    }
}

impl ConfigTree {
    /// Load a document, detecting the format from the extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;

        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let tree = Self::parse(&content, format, &path.display().to_string())?;
        tracing::debug!(path = %path.display(), %format, digest = %tree.digest(), "loaded configuration");
        Ok(tree)
    }

    /// Parse a document held in memory
    pub fn from_str_with_format(content: &str, format: ConfigFormat) -> Result<Self, LoadError> {
        Self::parse(content, format, "<inline>")
    }

    pub fn from_json_str(content: &str) -> Result<Self, LoadError> {
        Self::from_str_with_format(content, ConfigFormat::Json)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, LoadError> {
        Self::from_str_with_format(content, ConfigFormat::Yaml)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, LoadError> {
        Self::from_str_with_format(content, ConfigFormat::Toml)
    }

    fn parse(content: &str, format: ConfigFormat, origin: &str) -> Result<Self, LoadError> {
        let parse_error = |message: String| LoadError::Parse {
            origin: origin.to_string(),
            format,
            message,
        };

        let value: JsonValue = match format {
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
            ConfigFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
        };

        Ok(ConfigTree::new(ConfigNode::from(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Lookup;
    use std::io::Write;

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("a.YML")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.ini")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_yaml_string() {
        let tree = ConfigTree::from_yaml_str(
            "infra:\n  aws:\n    dynamodb:\n      table_name: cdp-table\n    region: ''\n",
        )
        .unwrap();

        assert_eq!(
            tree.lookup("infra:aws:dynamodb:table_name")
                .value()
                .and_then(|n| n.as_str()),
            Some("cdp-table")
        );
        assert_eq!(tree.lookup("infra:aws:region"), Lookup::ValueMissing);
    }

    #[test]
    fn test_yaml_null_is_value_missing() {
        let tree = ConfigTree::from_yaml_str("env:\n  azure:\n    storage:\n").unwrap();
        assert_eq!(tree.lookup("env.azure.storage"), Lookup::ValueMissing);
    }

    #[test]
    fn test_toml_string() {
        let tree = ConfigTree::from_toml_str("[infra.gcp.storage]\nbucket_name = \"logs\"\n").unwrap();
        assert_eq!(
            tree.lookup("infra.gcp.storage.bucket_name")
                .value()
                .and_then(|n| n.as_str()),
            Some("logs")
        );
    }

    #[test]
    fn test_parse_error_names_format() {
        let err = ConfigTree::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, LoadError::Parse { format: ConfigFormat::Json, .. }));
        assert!(err.to_string().contains("JSON"));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"infra": {{"aws": {{"s3": {{"bucket_name": "b"}}}}}}}}"#).unwrap();

        let tree = ConfigTree::from_path(file.path()).unwrap();
        assert!(tree.lookup("infra.aws.s3.bucket_name").value().is_some());
    }

    #[test]
    fn test_from_path_unsupported_and_missing() {
        let err = ConfigTree::from_path("/nonexistent/config.ini").unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));

        let err = ConfigTree::from_path("/nonexistent/config.yaml").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
