//! Schema node types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

use crate::key_path::KeyPath;

/// Name of a leaf variant, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafKind {
    Bool,
    Text,
    Choice,
    Int,
    Float,
}

impl LeafKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeafKind::Bool => "bool",
            LeafKind::Text => "text",
            LeafKind::Choice => "choice",
            LeafKind::Int => "int",
            LeafKind::Float => "float",
        }
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain violations reported by [`Leaf::check_domain`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("Expected a {expected} value, got {found}")]
    WrongKind { expected: LeafKind, found: String },

    #[error("Value {value} outside [{min}, {max}]")]
    OutOfRange { value: String, min: String, max: String },

    #[error("'{0}' is not one of the declared choices")]
    NotAChoice(String),
}

/// A single configurable option.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    Boolean { default: bool },
    Text { default: String },
    /// Candidates in display order; the first one is the default.
    Choice { choices: Vec<String> },
    BoundedInt { default: i64, min: i64, max: i64 },
    BoundedFloat { default: f64, min: f64, max: f64 },
}

impl Leaf {
    pub fn kind(&self) -> LeafKind {
        match self {
            Leaf::Boolean { .. } => LeafKind::Bool,
            Leaf::Text { .. } => LeafKind::Text,
            Leaf::Choice { .. } => LeafKind::Choice,
            Leaf::BoundedInt { .. } => LeafKind::Int,
            Leaf::BoundedFloat { .. } => LeafKind::Float,
        }
    }

    /// Value a fresh settings tree holds for this leaf.
    pub fn default_value(&self) -> Value {
        match self {
            Leaf::Boolean { default } => Value::Bool(*default),
            Leaf::Text { default } => Value::String(default.clone()),
            Leaf::Choice { choices } => {
                Value::String(choices.first().cloned().unwrap_or_default())
            }
            Leaf::BoundedInt { default, .. } => Value::from(*default),
            Leaf::BoundedFloat { default, .. } => float_value(*default),
        }
    }

    /// Kind check only. Ranges and choice membership are not inspected.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Leaf::Boolean { .. } => value.is_boolean(),
            Leaf::Text { .. } | Leaf::Choice { .. } => value.is_string(),
            Leaf::BoundedInt { .. } => value.as_i64().is_some(),
            Leaf::BoundedFloat { .. } => value.is_number(),
        }
    }

    /// Full check: kind, then range or membership.
    pub fn check_domain(&self, value: &Value) -> Result<(), DomainError> {
        if !self.accepts(value) {
            return Err(DomainError::WrongKind {
                expected: self.kind(),
                found: describe(value),
            });
        }
        match self {
            Leaf::Boolean { .. } | Leaf::Text { .. } => Ok(()),
            Leaf::Choice { choices } => {
                let s = value.as_str().unwrap_or_default();
                if choices.iter().any(|c| c == s) {
                    Ok(())
                } else {
                    Err(DomainError::NotAChoice(s.to_string()))
                }
            }
            Leaf::BoundedInt { min, max, .. } => match value.as_i64() {
                Some(v) if v >= *min && v <= *max => Ok(()),
                _ => Err(out_of_range(value, min, max)),
            },
            Leaf::BoundedFloat { min, max, .. } => match value.as_f64() {
                Some(v) if v >= *min && v <= *max => Ok(()),
                _ => Err(out_of_range(value, min, max)),
            },
        }
    }

    /// Clamp a numeric value into the leaf's range.
    ///
    /// Returns `None` for non-numeric leaves or values of the wrong kind.
    pub fn clamp(&self, value: &Value) -> Option<Value> {
        match self {
            Leaf::BoundedInt { min, max, .. } => {
                let v = value.as_i64()?;
                Some(Value::from(v.clamp(*min, (*max).max(*min))))
            }
            Leaf::BoundedFloat { min, max, .. } => {
                let v = value.as_f64()?;
                Some(float_value(v.clamp(*min, max.max(*min))))
            }
            _ => None,
        }
    }
}

fn out_of_range(value: &Value, min: &dyn fmt::Display, max: &dyn fmt::Display) -> DomainError {
    DomainError::OutOfRange {
        value: value.to_string(),
        min: min.to_string(),
        max: max.to_string(),
    }
}

fn float_value(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

/// Short JSON type name used in error messages.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Number(n) if n.is_f64() => "float".to_string(),
        Value::Number(_) => "int".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

/// Either a nested category or a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Category(Category),
    Leaf(Leaf),
}

impl SchemaNode {
    pub fn as_category(&self) -> Option<&Category> {
        match self {
            SchemaNode::Category(c) => Some(c),
            SchemaNode::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            SchemaNode::Leaf(l) => Some(l),
            SchemaNode::Category(_) => None,
        }
    }
}

impl From<Leaf> for SchemaNode {
    fn from(leaf: Leaf) -> Self {
        SchemaNode::Leaf(leaf)
    }
}

impl From<Category> for SchemaNode {
    fn from(category: Category) -> Self {
        SchemaNode::Category(category)
    }
}

/// Ordered mapping from key to child node. Declaration order is display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Category {
    entries: Vec<(String, SchemaNode)>,
}

impl Category {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, node: impl Into<SchemaNode>) -> Self {
        self.insert(key, node);
        self
    }

    /// Insert or replace a child. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, node: impl Into<SchemaNode>) -> Option<SchemaNode> {
        let key = key.into();
        let node = node.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, node)),
            None => {
                self.entries.push((key, node));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.entries.iter().map(|(k, n)| (k.as_str(), n))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Direct sub-categories, in order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &Category)> {
        self.iter()
            .filter_map(|(k, n)| n.as_category().map(|c| (k, c)))
    }

    /// Direct leaves, in order.
    pub fn leaves(&self) -> impl Iterator<Item = (&str, &Leaf)> {
        self.iter().filter_map(|(k, n)| n.as_leaf().map(|l| (k, l)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Node at a non-empty path.
    pub fn node_at(&self, path: &KeyPath) -> Option<&SchemaNode> {
        let (last, prefix) = path.as_slice().split_last()?;
        let mut current = self;
        for key in prefix {
            current = current.get(key)?.as_category()?;
        }
        current.get(last)
    }

    pub fn leaf_at(&self, path: &KeyPath) -> Option<&Leaf> {
        self.node_at(path)?.as_leaf()
    }

    /// Category at a path; the empty path is `self`.
    pub fn category_at(&self, path: &KeyPath) -> Option<&Category> {
        if path.is_empty() {
            return Some(self);
        }
        self.node_at(path)?.as_category()
    }

    /// Visit every leaf depth-first in declaration order.
    pub fn walk_leaves<F>(&self, mut visit: F)
    where
        F: FnMut(&KeyPath, &Leaf),
    {
        let mut path = KeyPath::root();
        self.walk_inner(&mut path, &mut visit);
    }

    fn walk_inner<F>(&self, path: &mut KeyPath, visit: &mut F)
    where
        F: FnMut(&KeyPath, &Leaf),
    {
        for (key, node) in &self.entries {
            path.push(key.clone());
            match node {
                SchemaNode::Category(c) => c.walk_inner(path, visit),
                SchemaNode::Leaf(l) => visit(path, l),
            }
            path.pop();
        }
    }

    /// Object nesting of a settings tree built from this category.
    ///
    /// A category holding only leaves has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.categories().map(|(_, c)| c.depth()).max().unwrap_or(0)
    }

    pub fn leaf_paths(&self) -> Vec<KeyPath> {
        let mut paths = Vec::new();
        self.walk_leaves(|p, _| paths.push(p.clone()));
        paths
    }

    /// Settings tree holding the declared default of every leaf.
    pub fn defaults(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(key, node)| {
                let value = match node {
                    SchemaNode::Category(c) => Value::Object(c.defaults()),
                    SchemaNode::Leaf(l) => l.default_value(),
                };
                (key.clone(), value)
            })
            .collect()
    }
}
