//! Settings Dialog - schema-driven settings editor core
//!
//! Merges a declarative schema with persisted values, tracks pending edits
//! against committed settings, and commits or discards them transactionally.
//! Widgets are left to the embedding toolkit; [`form`] describes what to
//! render.

pub mod change;
pub mod config;
pub mod form;
pub mod merge;
pub mod path;
pub mod session;
pub mod store;

pub use change::{ChangeLog, ChangeRecord};
pub use config::{ConfigError, EffectiveConfig};
pub use form::{category_tree, leaves, BindError, Binding, CategoryEntry, Control, LeafView};
pub use path::{KeyPath, PathError, SettingsTree};
pub use session::{Session, SessionError};
pub use settings_schema::{Category, Leaf, LeafKind, SchemaError, SchemaNode};
pub use store::{JsonFileStore, MemoryStore, Namespace, SettingsStore, StoreError};
