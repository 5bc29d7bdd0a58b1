//! Declarative settings schema.
//!
//! A schema is a [`Category`] at the root: an ordered tree of categories whose
//! leaves are typed options (boolean, text, choice, bounded int, bounded float)
//! carrying a default and, where it applies, a valid domain. The schema is
//! immutable once loaded; it decides the shape of every settings tree built
//! from it.

mod key_path;
mod node;
mod parser;

pub use key_path::{KeyPath, PathError};
pub use node::{describe, Category, DomainError, Leaf, LeafKind, SchemaNode};
pub use parser::{load_file, parse_json, parse_toml, parse_value, toml_to_json, SchemaError};
