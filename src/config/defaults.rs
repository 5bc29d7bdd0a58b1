//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::store::{DEFAULT_APPLICATION, DEFAULT_ORGANIZATION, DEFAULT_STORE_KEY};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Organization directory (default: "settings-dialog")
    pub organization: String,

    /// Application directory (default: "settings-dialog")
    pub application: String,

    /// Store entry holding the settings document (default: "settings-dialog-key")
    pub store_key: String,

    /// Store root; the platform config dir when unset
    pub store_dir: Option<PathBuf>,

    /// Schema file; must come from a later layer when unset
    pub schema: Option<PathBuf>,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            organization: DEFAULT_ORGANIZATION.to_string(),
            application: DEFAULT_APPLICATION.to_string(),
            store_key: DEFAULT_STORE_KEY.to_string(),
            store_dir: None,
            schema: None,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging.
    ///
    /// Unset paths are omitted rather than written as null.
    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "organization": self.organization,
            "application": self.application,
            "store": {
                "key": self.store_key
            }
        });
        if let Some(dir) = &self.store_dir {
            value["store"]["dir"] = json!(dir.to_string_lossy());
        }
        if let Some(schema) = &self.schema {
            value["schema"] = json!(schema.to_string_lossy());
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.organization, "settings-dialog");
        assert_eq!(defaults.application, "settings-dialog");
        assert_eq!(defaults.store_key, "settings-dialog-key");
        assert!(defaults.store_dir.is_none());
    }

    #[test]
    fn test_to_value() {
        let value = BuiltinDefaults::default().to_value();
        assert_eq!(value["store"]["key"], "settings-dialog-key");
        assert!(value["store"].get("dir").is_none());
        assert!(value.get("schema").is_none());

        let value = BuiltinDefaults {
            schema: Some(PathBuf::from("schema.json")),
            ..BuiltinDefaults::default()
        }
        .to_value();
        assert_eq!(value["schema"], "schema.json");
    }
}
