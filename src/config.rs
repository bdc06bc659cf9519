//! Service configuration for smart-search.
//!
//! [`ServiceConfig`] describes the collection the service writes to, the
//! embedding dimension, and how to reach the vector backend. It can be
//! embedded in a larger configuration (the HTTP server nests it under
//! `service`) or loaded on its own from YAML.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! collection: "smart_search"
//! description: "Smart search collection"
//! dimension: 384
//! ensure_collection: true
//!
//! backend:
//!   mode: "http"
//!   base_url: "https://vectors.internal:8443"
//!   attempt_timeout_ms: 10000
//!   username: "admin"
//!   password: "secret"
//!   accept_invalid_certs: true
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// How the service reaches its vector backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Pooled HTTP client against `base_url`.
    #[default]
    Http,
    /// In-process fake store; no network.
    Memory,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default)]
    pub mode: BackendMode,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-attempt timeout during endpoint discovery
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl BackendSettings {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.attempt_timeout_ms == 0 {
            return Err(ConfigLoadError::Validation(
                "backend.attempt_timeout_ms must be > 0".into(),
            ));
        }

        if self.mode == BackendMode::Http
            && !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://"))
        {
            return Err(ConfigLoadError::Validation(format!(
                "backend.base_url must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }

        if self.password.is_some() && self.username.is_none() {
            return Err(ConfigLoadError::Validation(
                "backend.password requires backend.username".into(),
            ));
        }

        Ok(())
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            mode: BackendMode::Http,
            base_url: default_base_url(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            username: None,
            password: None,
            accept_invalid_certs: false,
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Backend collection all documents are written to
    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_description")]
    pub description: String,

    /// Embedding dimension; must match the collection's dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Try to create the collection during bootstrap
    #[serde(default = "true_value")]
    pub ensure_collection: bool,

    #[serde(default)]
    pub backend: BackendSettings,
}

impl ServiceConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: ServiceConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// In-process backend with the default collection and dimension.
    pub fn memory() -> Self {
        Self {
            backend: BackendSettings {
                mode: BackendMode::Memory,
                ..BackendSettings::default()
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.collection.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "collection must not be empty".into(),
            ));
        }

        if self.dimension == 0 {
            return Err(ConfigLoadError::Validation("dimension must be >= 1".into()));
        }

        self.backend.validate()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            description: default_description(),
            dimension: default_dimension(),
            ensure_collection: true,
            backend: BackendSettings::default(),
        }
    }
}

fn default_collection() -> String {
    "smart_search".to_string()
}
fn default_description() -> String {
    "Smart search collection".to_string()
}
fn default_dimension() -> usize {
    embed::DEFAULT_DIMENSION
}
fn true_value() -> bool {
    true
}
fn default_base_url() -> String {
    "http://127.0.0.1:8443".to_string()
}
fn default_attempt_timeout_ms() -> u64 {
    10_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.collection, "smart_search");
        assert_eq!(config.dimension, 384);
        assert!(config.ensure_collection);
        assert_eq!(config.backend.mode, BackendMode::Http);
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8443");
        assert_eq!(config.backend.attempt_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
collection: "articles"
dimension: 8
backend:
  mode: "memory"
  attempt_timeout_ms: 250
"#;

        let config = ServiceConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.collection, "articles");
        assert_eq!(config.dimension, 8);
        assert_eq!(config.backend.mode, BackendMode::Memory);
        assert_eq!(config.backend.attempt_timeout_ms, 250);
        assert_eq!(config.description, "Smart search collection");
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
collection: "from_file"
backend:
  base_url: "https://db.example:8443"
  username: "admin"
  password: "admin"
  accept_invalid_certs: true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = ServiceConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.collection, "from_file");
        assert_eq!(config.backend.username.as_deref(), Some("admin"));
        assert!(config.backend.accept_invalid_certs);
    }

    #[test]
    fn test_dimension_validation() {
        let result = ServiceConfig::from_yaml("dimension: 0\n");
        assert!(result.unwrap_err().to_string().contains("dimension"));
    }

    #[test]
    fn test_collection_validation() {
        let result = ServiceConfig::from_yaml("collection: \"  \"\n");
        assert!(result.unwrap_err().to_string().contains("collection"));
    }

    #[test]
    fn test_timeout_validation() {
        let result = ServiceConfig::from_yaml("backend:\n  attempt_timeout_ms: 0\n");
        assert!(result.unwrap_err().to_string().contains("attempt_timeout_ms"));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result = ServiceConfig::from_yaml("backend:\n  mode: \"grpc\"\n");
        assert!(matches!(result, Err(ConfigLoadError::YamlParse(_))));
    }

    #[test]
    fn test_base_url_scheme_validation() {
        let result = ServiceConfig::from_yaml("backend:\n  base_url: \"localhost:8443\"\n");
        assert!(result.unwrap_err().to_string().contains("base_url"));

        let memory = ServiceConfig::from_yaml(
            "backend:\n  mode: \"memory\"\n  base_url: \"unused\"\n",
        );
        assert!(memory.is_ok());
    }

    #[test]
    fn test_memory_preset() {
        let config = ServiceConfig::memory();
        assert_eq!(config.backend.mode, BackendMode::Memory);
        assert_eq!(config.collection, "smart_search");
    }
}
