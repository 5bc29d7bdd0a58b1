//! Effective configuration with provenance
//!
//! Records the merged configuration plus every file or flag set that
//! contributed to it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use settings_schema::toml_to_json;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use crate::store::{validate_key, Namespace};

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    User,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ConfigSource {
    fn inline(origin: ConfigOrigin) -> Self {
        Self {
            origin,
            path: None,
            digest: None,
        }
    }
}

/// `<config dir>/settings-dialog/config.toml`, when a config dir exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("settings-dialog").join("config.toml"))
}

/// Merged tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Build from the built-in defaults, an optional user file and CLI overrides.
    ///
    /// A user file that does not exist is skipped.
    pub fn build(user_config_path: Option<&Path>, cli_overrides: Option<Value>) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource::inline(ConfigOrigin::Builtin)];

        if let Some(path) = user_config_path.filter(|p| p.exists()) {
            let (value, digest) = load_toml_file(path)?;
            tracing::debug!(path = %path.display(), digest = %digest, "loaded user config");
            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::User,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource::inline(ConfigOrigin::Cli));
        }

        let config = merge_layers(layers);
        validate_config(&config)?;

        Ok(Self { config, sources })
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a config value by dot-separated path
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.config, |current, part| current.get(part))
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn namespace(&self) -> Namespace {
        Namespace::new(
            self.get_str("organization").unwrap_or_default(),
            self.get_str("application").unwrap_or_default(),
        )
    }

    pub fn store_key(&self) -> &str {
        self.get_str("store.key").unwrap_or_default()
    }

    pub fn store_dir(&self) -> Option<PathBuf> {
        self.get_str("store.dir").map(PathBuf::from)
    }

    pub fn schema_path(&self) -> Option<PathBuf> {
        self.get_str("schema").map(PathBuf::from)
    }
}

/// Read a TOML file, returning its JSON form and the digest of its bytes
fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path).map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
    let digest = hex::encode(Sha256::digest(&bytes));

    let contents = String::from_utf8(bytes)
        .map_err(|e| ConfigError::ParseError(format!("{}: invalid UTF-8: {}", path.display(), e)))?;
    let value: toml::Value = toml::from_str(&contents)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

    Ok((toml_to_json(value), digest))
}

fn validate_config(config: &Value) -> Result<(), ConfigError> {
    for field in ["organization", "application", "store.key"] {
        let value = field
            .split('.')
            .try_fold(config, |current, part| current.get(part))
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::ValidationError(format!("{} must be a string", field)))?;
        validate_key(value)
            .map_err(|_| ConfigError::ValidationError(format!("{} '{}' is not a valid name", field, value)))?;
    }

    for field in ["schema", "store.dir"] {
        let value = field.split('.').try_fold(config, |current, part| current.get(part));
        if let Some(v) = value {
            if !v.is_string() && !v.is_null() {
                return Err(ConfigError::ValidationError(format!("{} must be a path string", field)));
            }
        }
    }

    Ok(())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
