//! Persistent key-value storage for committed settings
//!
//! The session talks to storage only through [`SettingsStore`]: one string
//! value per key, holding the committed settings tree as a JSON document.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default organization directory name
pub const DEFAULT_ORGANIZATION: &str = "settings-dialog";

/// Default application directory name
pub const DEFAULT_APPLICATION: &str = "settings-dialog";

/// Default entry key holding the settings document
pub const DEFAULT_STORE_KEY: &str = "settings-dialog-key";

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid store key '{0}'")]
    InvalidKey(String),

    #[error("Failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Save rejected: {0}")]
    Rejected(String),

    #[error("Stored document nests {depth} levels deep, at most {limit} can be loaded")]
    TooDeep { depth: usize, limit: usize },
}

/// String-keyed persistent storage, injected into a session.
pub trait SettingsStore {
    /// Return the stored document, or `None` when the key was never saved.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the stored document for `key`.
    fn save(&mut self, key: &str, contents: &str) -> Result<(), StoreError>;
}

impl<S: SettingsStore + ?Sized> SettingsStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, contents: &str) -> Result<(), StoreError> {
        (**self).save(key, contents)
    }
}

/// Reject keys that could escape the namespace directory.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty()
        || key == "."
        || key == ".."
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0')
    {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// In-memory store, used by tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_saves: bool,
    save_count: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one entry.
    pub fn with_entry(key: &str, contents: &str) -> Self {
        let mut store = Self::default();
        store.entries.insert(key.to_string(), contents.to_string());
        store
    }

    /// Make every subsequent save fail until switched off again.
    pub fn fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.save_count
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, contents: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        if self.fail_saves {
            return Err(StoreError::Rejected(format!("memory store refuses '{}'", key)));
        }
        self.entries.insert(key.to_string(), contents.to_string());
        self.save_count += 1;
        Ok(())
    }
}

/// Organization/application pair that scopes stored entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub organization: String,
    pub application: String,
}

impl Default for Namespace {
    fn default() -> Self {
        Self {
            organization: DEFAULT_ORGANIZATION.to_string(),
            application: DEFAULT_APPLICATION.to_string(),
        }
    }
}

impl Namespace {
    pub fn new(organization: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            application: application.into(),
        }
    }
}

/// File-backed store: `<root>/<organization>/<application>/<key>.json`.
///
/// Saves are atomic (write-then-rename), so a crash mid-save leaves the
/// previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Store rooted at `root`, scoped to `namespace`.
    pub fn new(root: &Path, namespace: &Namespace) -> Result<Self, StoreError> {
        validate_key(&namespace.organization)?;
        validate_key(&namespace.application)?;
        Ok(Self {
            dir: root
                .join(&namespace.organization)
                .join(&namespace.application),
        })
    }

    /// Store under the platform configuration directory.
    pub fn in_config_dir(namespace: &Namespace) -> Result<Self, StoreError> {
        Self::new(&default_root(), namespace)
    }

    /// Directory holding this namespace's entries
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path backing `key`
    pub fn entry_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

/// Platform configuration directory, falling back to the working directory.
pub fn default_root() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl SettingsStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn save(&mut self, key: &str, contents: &str) -> Result<(), StoreError> {
        let path = self.entry_path(key)?;
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;

        // Write to temp file first
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, contents).map_err(io_err(&temp_path))?;

        // Atomic rename
        fs::rename(&temp_path, &path).map_err(io_err(&path))?;

        tracing::debug!(path = %path.display(), bytes = contents.len(), "settings saved");
        Ok(())
    }
}
