//! Settings session: committed values, pending edits, and the change log
//!
//! A session holds three trees:
//! - the schema (read-only, decides shape, defaults and domains)
//! - committed settings (last applied, mirrored in the store)
//! - pending settings (edit buffer, equal to committed after apply/cancel)
//!
//! `edit` touches only the pending tree and the change log. `apply` is the
//! single commit point; `cancel` throws pending edits away. `write` bypasses
//! the edit buffer and commits one value immediately.
//!
//! Domain membership (ranges, choices) is not checked by the session. Callers
//! clamp or validate before calling `edit`/`write`; the form model does this
//! for interactive edits.
//!
//! Persistence failures never roll back memory: the trees are updated first,
//! and the failed save is reported with the change records it would have
//! made durable. The session stays usable.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use settings_schema::{describe, Category, Leaf, LeafKind};

use crate::change::{ChangeLog, ChangeRecord};
use crate::merge;
use crate::path::{self, KeyPath, PathError, SettingsTree};
use crate::store::{SettingsStore, StoreError};

/// Nesting any document may have, whatever the schema depth.
const BASE_DEPTH_LIMIT: usize = 128;

/// Observer invoked after `apply` with the committed change records.
pub type ApplyListener = Box<dyn FnMut(&[ChangeRecord])>;

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid path '{0}'")]
    InvalidPath(String),

    #[error("Path not found: {0}")]
    NotFound(KeyPath),

    #[error("Type mismatch at {path}: expected {expected}, got {found}")]
    TypeMismatch {
        path: KeyPath,
        expected: LeafKind,
        found: String,
    },

    /// The in-memory update succeeded but the durable save did not.
    #[error("Failed to persist settings: {source}")]
    Persistence {
        #[source]
        source: StoreError,
        changes: Vec<ChangeRecord>,
    },
}

impl From<PathError> for SessionError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::InvalidPath(p) => SessionError::InvalidPath(p),
            PathError::NotFound(p) => SessionError::NotFound(p),
        }
    }
}

impl SessionError {
    /// Change records committed in memory despite a failed save.
    pub fn committed_changes(&self) -> &[ChangeRecord] {
        match self {
            SessionError::Persistence { changes, .. } => changes,
            _ => &[],
        }
    }
}

/// Editing session over one store entry.
pub struct Session<S: SettingsStore> {
    schema: Category,
    store: S,
    key: String,
    committed: SettingsTree,
    pending: SettingsTree,
    changes: ChangeLog,
    listeners: Vec<ApplyListener>,
    persistence_warning: Option<StoreError>,
}

impl<S: SettingsStore> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.key)
            .field("committed", &self.committed)
            .field("pending_changes", &self.changes.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<S: SettingsStore> Session<S> {
    /// Merge the stored document for `key` with `schema` and persist the result.
    ///
    /// A missing entry starts from defaults. Stored text that is not valid
    /// JSON, or whose root is not an object, is discarded with a warning. A
    /// store that cannot be read fails construction, so unreadable data is
    /// never overwritten; the same holds for documents nested deeper than
    /// the schema could have produced. A failed save does not fail
    /// construction: it is kept for [`Session::take_persistence_warning`].
    pub fn init(schema: Category, store: S, key: impl Into<String>) -> Result<Self, SessionError> {
        let key = key.into();
        let raw = store
            .load(&key)
            .map_err(|source| SessionError::Persistence {
                source,
                changes: Vec::new(),
            })?;

        let persisted = match raw.as_deref() {
            None => Value::Object(SettingsTree::new()),
            Some(text) => {
                let limit = (schema.depth() + 1).max(BASE_DEPTH_LIMIT);
                parse_stored(text, limit)
                    .map_err(|source| SessionError::Persistence {
                        source,
                        changes: Vec::new(),
                    })?
                    .unwrap_or_else(|e| {
                        tracing::warn!(key = %key, error = %e, "stored settings are not valid JSON, starting from defaults");
                        Value::Object(SettingsTree::new())
                    })
            }
        };
        if !persisted.is_object() {
            tracing::warn!(key = %key, found = %describe(&persisted), "stored settings are not an object, starting from defaults");
        }

        for dropped in merge::dropped_keys(&schema, &persisted) {
            tracing::debug!(path = %dropped, "dropping stored value not in schema");
        }

        let committed = merge::merge(&schema, &persisted);
        let mut session = Self {
            pending: committed.clone(),
            committed,
            schema,
            store,
            key,
            changes: ChangeLog::new(),
            listeners: Vec::new(),
            persistence_warning: None,
        };

        if let Err(e) = session.persist() {
            tracing::warn!(key = %session.key, error = %e, "failed to persist merged settings");
            session.persistence_warning = Some(e);
        }
        Ok(session)
    }

    /// Committed value of a leaf.
    pub fn read(&self, path: &KeyPath) -> Result<Value, SessionError> {
        self.resolve_leaf(path)?;
        Ok(path::get(&self.committed, path)?.clone())
    }

    /// Committed value of a leaf, or `default` when it is absent.
    pub fn read_or(&self, path: &KeyPath, default: Value) -> Result<Value, SessionError> {
        self.resolve_leaf(path)?;
        Ok(path::get_or(&self.committed, path, default)?)
    }

    /// Pending (possibly edited) value of a leaf.
    pub fn pending(&self, path: &KeyPath) -> Result<&Value, SessionError> {
        self.resolve_leaf(path)?;
        Ok(path::get(&self.pending, path)?)
    }

    /// Commit one value immediately, bypassing the edit buffer.
    ///
    /// Sets committed and pending alike and persists. A pending edit of the
    /// same leaf is superseded and leaves the change log.
    pub fn write(&mut self, path: &KeyPath, value: Value) -> Result<(), SessionError> {
        self.check_value(path, &value)?;

        path::set_in(&mut self.committed, path, value.clone())?;
        path::set_in(&mut self.pending, path, value.clone())?;
        self.changes.remove(path);
        tracing::info!(path = %path, "setting written");

        self.persist().map_err(|source| {
            tracing::warn!(path = %path, error = %source, "write kept in memory only");
            SessionError::Persistence {
                source,
                changes: vec![ChangeRecord::new(path.clone(), value)],
            }
        })
    }

    /// Record an interactive edit in the pending tree and the change log.
    pub fn edit(&mut self, path: &KeyPath, value: Value) -> Result<(), SessionError> {
        self.check_value(path, &value)?;
        path::set_in(&mut self.pending, path, value.clone())?;
        self.changes.upsert(path.clone(), value);
        tracing::debug!(path = %path, pending = self.changes.len(), "setting edited");
        Ok(())
    }

    /// Promote pending to committed, persist, and return the change log.
    ///
    /// Listeners are notified whenever at least one change was committed,
    /// including when the save fails.
    pub fn apply(&mut self) -> Result<Vec<ChangeRecord>, SessionError> {
        self.committed = self.pending.clone();
        let changes = self.changes.drain();
        let saved = self.persist();

        if !changes.is_empty() {
            tracing::info!(count = changes.len(), "settings applied");
            for listener in &mut self.listeners {
                listener(&changes);
            }
        }

        match saved {
            Ok(()) => Ok(changes),
            Err(source) => {
                tracing::warn!(error = %source, "applied settings kept in memory only");
                Err(SessionError::Persistence { source, changes })
            }
        }
    }

    /// Discard pending edits. Nothing is persisted.
    pub fn cancel(&mut self) {
        if !self.changes.is_empty() {
            tracing::debug!(count = self.changes.len(), "pending edits discarded");
        }
        self.pending = self.committed.clone();
        self.changes.clear();
    }

    /// Record edits that reset every leaf under `scope` to its default.
    ///
    /// The empty path means the whole schema. Leaves already holding their
    /// default are skipped. Returns the number of edits recorded; they take
    /// effect on `apply` and vanish on `cancel` like any other edit.
    pub fn restore_defaults(&mut self, scope: &KeyPath) -> Result<usize, SessionError> {
        let category = self
            .schema
            .category_at(scope)
            .ok_or_else(|| SessionError::InvalidPath(scope.to_string()))?;

        let mut resets = Vec::new();
        category.walk_leaves(|relative, leaf| {
            let mut full = scope.clone();
            for key in relative.as_slice() {
                full.push(key.clone());
            }
            let default = leaf.default_value();
            if path::get(&self.pending, &full).ok() != Some(&default) {
                resets.push((full, default));
            }
        });

        let count = resets.len();
        for (full, default) in resets {
            path::set_in(&mut self.pending, &full, default.clone())?;
            self.changes.upsert(full, default);
        }
        Ok(count)
    }

    /// Register an observer for applied changes.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&[ChangeRecord]) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Pending edits in first-edit order.
    pub fn changes(&self) -> &[ChangeRecord] {
        self.changes.records()
    }

    /// Whether the pending tree differs from the committed one.
    pub fn is_dirty(&self) -> bool {
        self.pending != self.committed
    }

    /// Leaves whose pending value differs from the committed one, in schema order.
    pub fn diff(&self) -> Vec<ChangeRecord> {
        merge::diff(&self.schema, &self.committed, &self.pending)
    }

    pub fn schema(&self) -> &Category {
        &self.schema
    }

    pub fn committed(&self) -> &SettingsTree {
        &self.committed
    }

    pub fn pending_tree(&self) -> &SettingsTree {
        &self.pending
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Save failure left over from `init`, if any.
    pub fn take_persistence_warning(&mut self) -> Option<StoreError> {
        self.persistence_warning.take()
    }

    /// Leaf declared at `path`, or `InvalidPath`.
    pub fn resolve_leaf(&self, path: &KeyPath) -> Result<&Leaf, SessionError> {
        path.validate()?;
        self.schema
            .leaf_at(path)
            .ok_or_else(|| SessionError::InvalidPath(path.to_string()))
    }

    fn check_value(&self, path: &KeyPath, value: &Value) -> Result<(), SessionError> {
        let leaf = self.resolve_leaf(path)?;
        if !leaf.accepts(value) {
            return Err(SessionError::TypeMismatch {
                path: path.clone(),
                expected: leaf.kind(),
                found: describe(value),
            });
        }
        Ok(())
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.committed)?;
        self.store.save(&self.key, &json)
    }
}

/// Parse a stored document nested at most `limit` levels deep.
///
/// The outer error means the document is too deep to load; the inner one
/// means it is not JSON.
fn parse_stored(text: &str, limit: usize) -> Result<Result<Value, serde_json::Error>, StoreError> {
    let depth = nesting_depth(text);
    if depth > limit {
        return Err(StoreError::TooDeep { depth, limit });
    }

    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    Ok(Value::deserialize(&mut de).and_then(|value| de.end().map(|()| value)))
}

/// Deepest bracket nesting outside string literals.
fn nesting_depth(text: &str) -> usize {
    let (mut depth, mut deepest) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);
    for b in text.bytes() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use settings_schema::parse_value;
    use std::cell::RefCell;
    use std::rc::Rc;

    const KEY: &str = "test-key";

    fn schema() -> Category {
        parse_value(&json!({
            "General": {
                "Theme": {"choices": ["Light", "Dark", "System"], "default": "Light"},
                "Autosave": true
            },
            "Editor": {
                "FontSize": {"type": "int", "default": 12, "min": 6, "max": 72},
                "Zoom": {"type": "float", "default": 1.0, "min": 0.25, "max": 4.0},
                "Font": "Mono"
            }
        }))
        .unwrap()
    }

    fn session() -> Session<MemoryStore> {
        Session::init(schema(), MemoryStore::new(), KEY).unwrap()
    }

    fn theme() -> KeyPath {
        KeyPath::from(["General", "Theme"])
    }

    fn stored(session: &Session<MemoryStore>) -> Value {
        serde_json::from_str(session.store().get(KEY).unwrap()).unwrap()
    }

    #[test]
    fn test_init_persists_merged_defaults() {
        let session = session();
        assert_eq!(session.read(&theme()).unwrap(), json!("Light"));
        assert_eq!(stored(&session)["General"]["Theme"], "Light");
        assert_eq!(session.store().save_count(), 1);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_init_keeps_stored_values() {
        let store = MemoryStore::with_entry(KEY, r#"{"General": {"Theme": "System"}, "Stale": 1}"#);
        let session = Session::init(schema(), store, KEY).unwrap();
        assert_eq!(session.read(&theme()).unwrap(), json!("System"));
        assert!(stored(&session).get("Stale").is_none());
    }

    #[test]
    fn test_init_heals_corrupt_document() {
        let store = MemoryStore::with_entry(KEY, "{not json");
        let session = Session::init(schema(), store, KEY).unwrap();
        assert_eq!(session.read(&theme()).unwrap(), json!("Light"));
    }

    #[test]
    fn test_init_replaces_non_object_root() {
        let store = MemoryStore::with_entry(KEY, "[1, 2]");
        let session = Session::init(schema(), store, KEY).unwrap();
        assert_eq!(session.read(&theme()).unwrap(), json!("Light"));
        assert_eq!(stored(&session)["Editor"]["FontSize"], 12);
    }

    #[test]
    fn test_deep_settings_survive_reload() {
        let mut deep = Category::new().with("leaf", Leaf::Text { default: "default".into() });
        let mut parts = vec!["leaf".to_string()];
        for i in 0..130 {
            deep = Category::new().with(format!("k{}", i), deep);
            parts.insert(0, format!("k{}", i));
        }
        let leaf = KeyPath::new(parts);

        let mut session = Session::init(deep.clone(), MemoryStore::new(), KEY).unwrap();
        session.edit(&leaf, json!("user-data")).unwrap();
        session.apply().unwrap();
        let saved = session.store().get(KEY).unwrap().to_string();

        let reopened = Session::init(deep, MemoryStore::with_entry(KEY, &saved), KEY).unwrap();
        assert_eq!(reopened.read(&leaf).unwrap(), json!("user-data"));
    }

    #[test]
    fn test_init_refuses_overly_deep_document() {
        let store = MemoryStore::with_entry(KEY, &"[".repeat(300));
        let result = Session::init(schema(), store, KEY);
        assert!(matches!(
            result,
            Err(SessionError::Persistence {
                source: StoreError::TooDeep { depth: 300, limit: BASE_DEPTH_LIMIT },
                ..
            })
        ));
    }

    #[test]
    fn test_nesting_depth_ignores_strings() {
        assert_eq!(nesting_depth(r#"{"a": {"b": "[[{{"}}"#), 2);
        assert_eq!(nesting_depth(r#"{"a": "\"[", "b": [1]}"#), 2);
        assert_eq!(nesting_depth("true"), 0);
    }

    #[test]
    fn test_init_save_failure_is_a_warning() {
        let mut store = MemoryStore::new();
        store.fail_saves(true);
        let mut session = Session::init(schema(), store, KEY).unwrap();
        assert!(matches!(
            session.take_persistence_warning(),
            Some(StoreError::Rejected(_))
        ));
        assert!(session.take_persistence_warning().is_none());
        assert_eq!(session.read(&theme()).unwrap(), json!("Light"));
    }

    #[test]
    fn test_init_rejects_bad_key() {
        let result = Session::init(schema(), MemoryStore::new(), "a/b");
        assert!(matches!(result, Err(SessionError::Persistence { .. })));
    }

    #[test]
    fn test_edit_apply_round_trip() {
        let mut session = session();
        session.edit(&theme(), json!("Dark")).unwrap();

        assert_eq!(session.read(&theme()).unwrap(), json!("Light"));
        assert_eq!(session.pending(&theme()).unwrap(), &json!("Dark"));
        assert!(session.is_dirty());

        let changes = session.apply().unwrap();
        assert_eq!(changes, vec![ChangeRecord::new(theme(), json!("Dark"))]);
        assert_eq!(session.read(&theme()).unwrap(), json!("Dark"));
        assert_eq!(stored(&session), json!({
            "General": {"Theme": "Dark", "Autosave": true},
            "Editor": {"FontSize": 12, "Zoom": 1.0, "Font": "Mono"}
        }));
        assert!(session.changes().is_empty());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_cancel_discards() {
        let mut session = session();
        session.edit(&theme(), json!("Dark")).unwrap();
        session.cancel();

        assert_eq!(session.read(&theme()).unwrap(), json!("Light"));
        assert_eq!(session.pending(&theme()).unwrap(), &json!("Light"));
        assert!(session.apply().unwrap().is_empty());
    }

    #[test]
    fn test_cancel_does_not_persist() {
        let mut session = session();
        session.edit(&theme(), json!("Dark")).unwrap();
        session.cancel();
        assert_eq!(session.store().save_count(), 1);
    }

    #[test]
    fn test_upsert_by_path() {
        let mut session = session();
        let size = KeyPath::from(["Editor", "FontSize"]);
        session.edit(&theme(), json!("Dark")).unwrap();
        session.edit(&size, json!(14)).unwrap();
        session.edit(&theme(), json!("System")).unwrap();

        let changes = session.apply().unwrap();
        assert_eq!(
            changes,
            vec![
                ChangeRecord::new(theme(), json!("System")),
                ChangeRecord::new(size, json!(14)),
            ]
        );
    }

    #[test]
    fn test_write_commits_immediately() {
        let mut session = session();
        let autosave = KeyPath::from(["General", "Autosave"]);
        session.write(&autosave, json!(false)).unwrap();

        assert_eq!(session.read(&autosave).unwrap(), json!(false));
        assert_eq!(session.pending(&autosave).unwrap(), &json!(false));
        assert_eq!(stored(&session)["General"]["Autosave"], false);
        assert!(session.changes().is_empty());
    }

    #[test]
    fn test_write_supersedes_pending_edit() {
        let mut session = session();
        session.edit(&theme(), json!("Dark")).unwrap();
        session.write(&theme(), json!("System")).unwrap();

        assert!(session.changes().is_empty());
        assert!(session.apply().unwrap().is_empty());
        assert_eq!(session.read(&theme()).unwrap(), json!("System"));
    }

    #[test]
    fn test_invalid_paths() {
        let mut session = session();
        assert!(matches!(session.read(&KeyPath::root()), Err(SessionError::InvalidPath(_))));
        assert!(matches!(
            session.read(&KeyPath::from(["General"])),
            Err(SessionError::InvalidPath(_))
        ));
        assert!(matches!(
            session.edit(&KeyPath::from(["General", "Nope"]), json!(1)),
            Err(SessionError::InvalidPath(_))
        ));
        assert!(matches!(
            session.write(&KeyPath::from(["Nope"]), json!(1)),
            Err(SessionError::InvalidPath(_))
        ));
        assert!(matches!(
            session.read_or(&KeyPath::root(), json!(0)),
            Err(SessionError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let mut session = session();
        let err = session.edit(&KeyPath::from(["General", "Autosave"]), json!("yes")).unwrap_err();
        assert!(matches!(
            err,
            SessionError::TypeMismatch { expected: LeafKind::Bool, .. }
        ));
        assert!(session.edit(&KeyPath::from(["Editor", "FontSize"]), json!(1.5)).is_err());
        assert!(session.write(&theme(), json!(3)).is_err());
        assert!(session.changes().is_empty());
    }

    #[test]
    fn test_domain_not_checked() {
        let mut session = session();
        let size = KeyPath::from(["Editor", "FontSize"]);
        session.edit(&size, json!(1000)).unwrap();
        session.edit(&theme(), json!("Purple")).unwrap();
        assert_eq!(session.apply().unwrap().len(), 2);
        assert_eq!(session.read(&size).unwrap(), json!(1000));
    }

    #[test]
    fn test_int_accepted_for_float_leaf() {
        let mut session = session();
        let zoom = KeyPath::from(["Editor", "Zoom"]);
        session.edit(&zoom, json!(2)).unwrap();
        session.apply().unwrap();
        assert_eq!(session.read(&zoom).unwrap(), json!(2));
    }

    #[test]
    fn test_read_or_returns_value() {
        let session = session();
        assert_eq!(session.read_or(&theme(), json!("x")).unwrap(), json!("Light"));
    }

    #[test]
    fn test_apply_save_failure_keeps_memory_state() {
        let mut session = session();
        session.edit(&theme(), json!("Dark")).unwrap();
        session.store_mut().fail_saves(true);

        let err = session.apply().unwrap_err();
        assert_eq!(err.committed_changes(), &[ChangeRecord::new(theme(), json!("Dark"))]);
        assert_eq!(session.read(&theme()).unwrap(), json!("Dark"));
        assert!(!session.is_dirty());
        assert_eq!(stored(&session)["General"]["Theme"], "Light");

        session.store_mut().fail_saves(false);
        assert!(session.apply().unwrap().is_empty());
        assert_eq!(stored(&session)["General"]["Theme"], "Dark");
    }

    #[test]
    fn test_write_save_failure_reports_change() {
        let mut session = session();
        session.store_mut().fail_saves(true);
        let err = session.write(&theme(), json!("Dark")).unwrap_err();
        assert_eq!(err.committed_changes().len(), 1);
        assert_eq!(session.read(&theme()).unwrap(), json!("Dark"));
    }

    #[test]
    fn test_listeners_notified_on_apply() {
        let seen: Rc<RefCell<Vec<Vec<ChangeRecord>>>> = Rc::default();
        let mut session = session();
        let sink = Rc::clone(&seen);
        session.subscribe(move |changes| sink.borrow_mut().push(changes.to_vec()));

        session.apply().unwrap();
        session.write(&theme(), json!("System")).unwrap();
        assert!(seen.borrow().is_empty());

        session.edit(&theme(), json!("Dark")).unwrap();
        session.apply().unwrap();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0], vec![ChangeRecord::new(theme(), json!("Dark"))]);
    }

    #[test]
    fn test_restore_defaults_is_cancellable() {
        let mut session = session();
        let size = KeyPath::from(["Editor", "FontSize"]);
        session.write(&size, json!(20)).unwrap();
        session.write(&theme(), json!("Dark")).unwrap();

        assert_eq!(session.restore_defaults(&KeyPath::from(["Editor"])).unwrap(), 1);
        assert_eq!(session.pending(&size).unwrap(), &json!(12));
        assert_eq!(session.pending(&theme()).unwrap(), &json!("Dark"));
        session.cancel();
        assert_eq!(session.read(&size).unwrap(), json!(20));

        assert_eq!(session.restore_defaults(&KeyPath::root()).unwrap(), 2);
        let changes = session.apply().unwrap();
        assert_eq!(
            changes,
            vec![
                ChangeRecord::new(theme(), json!("Light")),
                ChangeRecord::new(size, json!(12)),
            ]
        );
    }

    #[test]
    fn test_restore_defaults_rejects_leaf_scope() {
        let mut session = session();
        assert!(matches!(
            session.restore_defaults(&theme()),
            Err(SessionError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_diff_tracks_net_changes() {
        let mut session = session();
        session.edit(&theme(), json!("Dark")).unwrap();
        session.edit(&theme(), json!("Light")).unwrap();
        assert_eq!(session.changes().len(), 1);
        assert!(session.diff().is_empty());
        assert!(!session.is_dirty());
    }
}
