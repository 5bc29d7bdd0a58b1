//! Declarative schema loader.
//!
//! Accepted node forms:
//! - bare `bool` / string / integer / float: a leaf with that default
//! - non-empty array of strings: a choice leaf
//! - object with a string `"type"` or a `"choices"` array: an explicit leaf
//! - any other object: a category, even when it has a key named `default`

use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::node::{describe, Category, Leaf, SchemaNode};

/// Schema loading errors
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Schema root must be an object, got {0}")]
    RootNotObject(String),

    #[error("Empty key in category '{0}'")]
    EmptyKey(String),

    #[error("'{path}': unknown leaf type '{kind}'")]
    UnknownType { path: String, kind: String },

    #[error("'{path}': {reason}")]
    Invalid { path: String, reason: String },
}

fn invalid(path: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::Invalid {
        path: path.to_string(),
        reason: reason.into(),
    }
}

/// Load a schema file; `.toml` files are read as TOML, everything else as JSON.
pub fn load_file(path: &Path) -> Result<Category, SchemaError> {
    let contents = fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => parse_toml(&contents),
        _ => parse_json(&contents),
    }
}

pub fn parse_json(text: &str) -> Result<Category, SchemaError> {
    let value: Value = serde_json::from_str(text)?;
    parse_value(&value)
}

pub fn parse_toml(text: &str) -> Result<Category, SchemaError> {
    let value: toml::Value = toml::from_str(text)?;
    parse_value(&toml_to_json(value))
}

/// Build a schema from an already-parsed declaration.
pub fn parse_value(value: &Value) -> Result<Category, SchemaError> {
    match value {
        Value::Object(map) => parse_category("", map),
        other => Err(SchemaError::RootNotObject(describe(other))),
    }
}

/// Convert TOML Value to JSON Value
pub fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => {
            let map: Map<String, Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            Value::Object(map)
        }
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn parse_category(path: &str, map: &Map<String, Value>) -> Result<Category, SchemaError> {
    let mut category = Category::new();
    for (key, value) in map {
        if key.is_empty() {
            return Err(SchemaError::EmptyKey(path.to_string()));
        }
        let child_path = join(path, key);
        let node = parse_node(&child_path, value)?;
        category.insert(key.clone(), node);
    }
    Ok(category)
}

fn parse_node(path: &str, value: &Value) -> Result<SchemaNode, SchemaError> {
    let leaf = match value {
        Value::Object(map) if is_leaf_object(map) => parse_leaf_object(path, map)?,
        Value::Object(map) => return Ok(SchemaNode::Category(parse_category(path, map)?)),
        Value::Bool(b) => Leaf::Boolean { default: *b },
        Value::String(s) => Leaf::Text { default: s.clone() },
        Value::Number(n) if n.is_f64() => Leaf::BoundedFloat {
            default: n.as_f64().unwrap_or_default(),
            min: f64::MIN,
            max: f64::MAX,
        },
        Value::Number(n) => Leaf::BoundedInt {
            default: n
                .as_i64()
                .ok_or_else(|| invalid(path, format!("integer {} exceeds i64", n)))?,
            min: i64::MIN,
            max: i64::MAX,
        },
        Value::Array(items) => Leaf::Choice {
            choices: parse_choices(path, items)?,
        },
        Value::Null => return Err(invalid(path, "null is not a valid schema node")),
    };
    Ok(SchemaNode::Leaf(leaf))
}

fn is_leaf_object(map: &Map<String, Value>) -> bool {
    matches!(map.get("type"), Some(Value::String(_)))
        || matches!(map.get("choices"), Some(Value::Array(_)))
}

fn parse_leaf_object(path: &str, map: &Map<String, Value>) -> Result<Leaf, SchemaError> {
    let default = map.get("default");
    // Without a type, only a `choices` array makes an object a leaf.
    let kind = map.get("type").and_then(Value::as_str).unwrap_or("choice");

    match kind {
        "bool" => Ok(Leaf::Boolean {
            default: match default {
                None => false,
                Some(v) => v.as_bool().ok_or_else(|| wrong_default(path, "bool", v))?,
            },
        }),
        "text" => Ok(Leaf::Text {
            default: match default {
                None => String::new(),
                Some(v) => v
                    .as_str()
                    .ok_or_else(|| wrong_default(path, "string", v))?
                    .to_string(),
            },
        }),
        "choice" => {
            let items = map
                .get("choices")
                .and_then(Value::as_array)
                .ok_or_else(|| invalid(path, "choice leaf requires a 'choices' array"))?;
            let choices = parse_choices(path, items)?;
            if let Some(v) = default {
                let d = v.as_str().ok_or_else(|| wrong_default(path, "string", v))?;
                if choices.first().map(String::as_str) != Some(d) {
                    return Err(invalid(
                        path,
                        format!("default '{}' must be the first choice", d),
                    ));
                }
            }
            Ok(Leaf::Choice { choices })
        }
        "int" => {
            let min = int_field(path, map, "min")?.unwrap_or(i64::MIN);
            let max = int_field(path, map, "max")?.unwrap_or(i64::MAX);
            if min > max {
                return Err(invalid(path, format!("min {} > max {}", min, max)));
            }
            let default = int_field(path, map, "default")?.unwrap_or(if min > 0 { min } else { 0.min(max) });
            Ok(Leaf::BoundedInt { default, min, max })
        }
        "float" => {
            let min = float_field(path, map, "min")?.unwrap_or(f64::MIN);
            let max = float_field(path, map, "max")?.unwrap_or(f64::MAX);
            if min > max {
                return Err(invalid(path, format!("min {} > max {}", min, max)));
            }
            let default = float_field(path, map, "default")?.unwrap_or(if min > 0.0 { min } else { 0.0f64.min(max) });
            Ok(Leaf::BoundedFloat { default, min, max })
        }
        other => Err(SchemaError::UnknownType {
            path: path.to_string(),
            kind: other.to_string(),
        }),
    }
}

fn wrong_default(path: &str, expected: &str, got: &Value) -> SchemaError {
    invalid(
        path,
        format!("default must be {}, got {}", expected, describe(got)),
    )
}

fn parse_choices(path: &str, items: &[Value]) -> Result<Vec<String>, SchemaError> {
    if items.is_empty() {
        return Err(invalid(path, "choice list is empty"));
    }
    let mut choices: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let s = item
            .as_str()
            .ok_or_else(|| invalid(path, format!("choice must be a string, got {}", describe(item))))?;
        if choices.iter().any(|c| c == s) {
            return Err(invalid(path, format!("duplicate choice '{}'", s)));
        }
        choices.push(s.to_string());
    }
    Ok(choices)
}

fn int_field(path: &str, map: &Map<String, Value>, field: &str) -> Result<Option<i64>, SchemaError> {
    match map.get(field) {
        None => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid(path, format!("'{}' must be an integer, got {}", field, describe(v)))),
    }
}

fn float_field(path: &str, map: &Map<String, Value>, field: &str) -> Result<Option<f64>, SchemaError> {
    match map.get(field) {
        None => Ok(None),
        Some(Value::Null) => Err(invalid(path, format!("'{}' must be a finite number", field))),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| invalid(path, format!("'{}' must be a number, got {}", field, describe(v)))),
    }
}
