//! Path addressing over settings trees
//!
//! A settings tree is a JSON object of objects whose leaves are scalars.
//! Lookups walk one key per level; updates create missing intermediate
//! objects. Both are iterative, so nesting depth is unbounded.

use serde_json::{Map, Value};

pub use settings_schema::{KeyPath, PathError};

/// Settings tree: nested JSON objects mirroring the schema's categories.
pub type SettingsTree = Map<String, Value>;

/// Look up the value at `path`.
///
/// Fails with `InvalidPath` for the empty path and `NotFound` when a key is
/// missing or an intermediate value is not an object.
pub fn get<'a>(tree: &'a SettingsTree, path: &KeyPath) -> Result<&'a Value, PathError> {
    path.validate()?;
    let (last, prefix) = path
        .as_slice()
        .split_last()
        .ok_or_else(|| PathError::InvalidPath(path.to_string()))?;

    let mut current = tree;
    for key in prefix {
        current = current
            .get(key)
            .and_then(Value::as_object)
            .ok_or_else(|| PathError::NotFound(path.clone()))?;
    }
    current
        .get(last)
        .ok_or_else(|| PathError::NotFound(path.clone()))
}

/// Like [`get`], but a missing path yields `default` instead of `NotFound`.
pub fn get_or(tree: &SettingsTree, path: &KeyPath, default: Value) -> Result<Value, PathError> {
    match get(tree, path) {
        Ok(value) => Ok(value.clone()),
        Err(PathError::NotFound(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

/// Return `tree` with the leaf at `path` replaced by `value`.
///
/// The input tree is consumed, so callers never observe a half-updated
/// copy. Use [`set_in`] to update a tree held behind `&mut`.
pub fn set(mut tree: SettingsTree, path: &KeyPath, value: Value) -> Result<SettingsTree, PathError> {
    set_in(&mut tree, path, value)?;
    Ok(tree)
}

/// In-place variant of [`set`].
///
/// Missing intermediates are created as empty objects; an intermediate that
/// holds a scalar is replaced by an object.
pub fn set_in(tree: &mut SettingsTree, path: &KeyPath, value: Value) -> Result<(), PathError> {
    path.validate()?;
    let (last, prefix) = path
        .as_slice()
        .split_last()
        .ok_or_else(|| PathError::InvalidPath(path.to_string()))?;

    let mut current = tree;
    for key in prefix {
        let slot = current
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return Err(PathError::InvalidPath(path.to_string())),
        };
    }
    current.insert(last.clone(), value);
    Ok(())
}
