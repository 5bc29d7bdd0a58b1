//! Schema-driven settings merge
//!
//! Reconciles a schema with previously persisted values:
//! - Categories: recurse into the persisted object under the same key
//!   (anything that is not an object counts as empty)
//! - Leaves: the persisted value wins when present and not an object,
//!   otherwise the schema default is used
//! - Persisted keys the schema does not declare are dropped
//!
//! Persisted leaf values are taken as-is. Their kind and domain are not
//! checked here; the form model reports them when it binds a control.

use serde_json::{Map, Value};

use settings_schema::{Category, SchemaNode};

use crate::change::ChangeRecord;
use crate::path::{self, KeyPath, SettingsTree};

/// Build a complete settings tree shaped exactly like `schema`.
pub fn merge(schema: &Category, persisted: &Value) -> SettingsTree {
    let empty = Map::new();
    merge_category(schema, persisted.as_object().unwrap_or(&empty), &empty)
}

fn merge_category(
    schema: &Category,
    persisted: &Map<String, Value>,
    empty: &Map<String, Value>,
) -> SettingsTree {
    let mut merged = Map::new();
    for (key, node) in schema.iter() {
        let value = match node {
            SchemaNode::Category(child) => {
                let sub = persisted
                    .get(key)
                    .and_then(Value::as_object)
                    .unwrap_or(empty);
                Value::Object(merge_category(child, sub, empty))
            }
            SchemaNode::Leaf(leaf) => match persisted.get(key) {
                Some(v) if !v.is_object() => v.clone(),
                _ => leaf.default_value(),
            },
        };
        merged.insert(key.to_string(), value);
    }
    merged
}

/// Leaf paths, in schema order, whose value in `other` differs from `base`.
///
/// Each record carries the value found in `other`; leaves missing from
/// `other` are skipped.
pub fn diff(schema: &Category, base: &SettingsTree, other: &SettingsTree) -> Vec<ChangeRecord> {
    let mut changes = Vec::new();
    schema.walk_leaves(|leaf_path, _| {
        let Ok(new) = path::get(other, leaf_path) else {
            return;
        };
        if path::get(base, leaf_path).ok() != Some(new) {
            changes.push(ChangeRecord::new(leaf_path.clone(), new.clone()));
        }
    });
    changes
}

/// Persisted paths that [`merge`] discards, in persisted order.
///
/// Covers keys the schema does not declare and values whose shape collides
/// with the schema (an object where a leaf is declared, or a scalar where a
/// category is declared).
pub fn dropped_keys(schema: &Category, persisted: &Value) -> Vec<KeyPath> {
    let mut dropped = Vec::new();
    if let Some(map) = persisted.as_object() {
        collect_dropped(schema, map, &KeyPath::root(), &mut dropped);
    }
    dropped
}

fn collect_dropped(
    schema: &Category,
    persisted: &Map<String, Value>,
    prefix: &KeyPath,
    dropped: &mut Vec<KeyPath>,
) {
    for (key, value) in persisted {
        let here = prefix.child(key.clone());
        match (schema.get(key), value) {
            (None, _) => dropped.push(here),
            (Some(SchemaNode::Category(child)), Value::Object(sub)) => {
                collect_dropped(child, sub, &here, dropped);
            }
            (Some(SchemaNode::Category(_)), _) => dropped.push(here),
            (Some(SchemaNode::Leaf(_)), Value::Object(_)) => dropped.push(here),
            (Some(SchemaNode::Leaf(_)), _) => {}
        }
    }
}
