//! Form model: what a settings dialog renders for a schema and a session
//!
//! Widgets are out of scope. This module produces the data a toolkit needs:
//! the category tree for navigation, and one bound control per leaf of the
//! selected category. Control state converts back into a value for
//! [`Session::edit`](crate::session::Session::edit).

use serde_json::{Number, Value};

use settings_schema::{describe, Category, Leaf, LeafKind};

use crate::path::KeyPath;
use crate::session::{Session, SessionError};
use crate::store::SettingsStore;

/// Node of the navigable category tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEntry {
    pub key: String,
    pub path: KeyPath,
    pub children: Vec<CategoryEntry>,
}

/// Categories of `schema` in declaration order. Leaves are not listed.
pub fn category_tree(schema: &Category) -> Vec<CategoryEntry> {
    tree_under(schema, &KeyPath::root())
}

fn tree_under(category: &Category, prefix: &KeyPath) -> Vec<CategoryEntry> {
    category
        .categories()
        .map(|(key, child)| {
            let path = prefix.child(key);
            CategoryEntry {
                key: key.to_string(),
                children: tree_under(child, &path),
                path,
            }
        })
        .collect()
}

/// Input widget state for one leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Checkbox(bool),
    LineEdit(String),
    ComboBox { choices: Vec<String>, selected: usize },
    SpinBox { value: i64, min: i64, max: i64 },
    DoubleSpinBox { value: f64, min: f64, max: f64 },
}

impl Control {
    /// Value to hand back to the session for this control's current state.
    pub fn value(&self) -> Value {
        match self {
            Control::Checkbox(checked) => Value::Bool(*checked),
            Control::LineEdit(text) => Value::String(text.clone()),
            Control::ComboBox { choices, selected } => choices
                .get(*selected)
                .map(|c| Value::String(c.clone()))
                .unwrap_or(Value::Null),
            Control::SpinBox { value, .. } => Value::from(*value),
            Control::DoubleSpinBox { value, .. } => {
                Number::from_f64(*value).map(Value::Number).unwrap_or(Value::Null)
            }
        }
    }

    /// Human-readable domain, for controls that have one.
    pub fn domain(&self) -> Option<String> {
        match self {
            Control::Checkbox(_) | Control::LineEdit(_) => None,
            Control::ComboBox { choices, .. } => Some(choices.join(" | ")),
            Control::SpinBox { min, max, .. } => Some(format!("{}..={}", min, max)),
            Control::DoubleSpinBox { min, max, .. } => Some(format!("{}..={}", min, max)),
        }
    }
}

/// A control bound to a value, and whether the value had to be clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub control: Control,
    pub clamped: bool,
}

/// Why a stored value cannot be shown in its control.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: LeafKind, found: String },

    #[error("'{0}' is not one of the choices")]
    UnknownChoice(String),
}

/// Bind `value` to the control for `leaf`.
///
/// Numbers outside the leaf's range are clamped and flagged. The clamped
/// value is only shown; nothing is written back until the user edits.
pub fn bind(leaf: &Leaf, value: &Value) -> Result<Binding, BindError> {
    let mismatch = || BindError::TypeMismatch {
        expected: leaf.kind(),
        found: describe(value),
    };

    let unclamped = |control| Binding {
        control,
        clamped: false,
    };

    match leaf {
        Leaf::Boolean { .. } => value
            .as_bool()
            .map(|b| unclamped(Control::Checkbox(b)))
            .ok_or_else(mismatch),
        Leaf::Text { .. } => value
            .as_str()
            .map(|s| unclamped(Control::LineEdit(s.to_string())))
            .ok_or_else(mismatch),
        Leaf::Choice { choices } => {
            let s = value.as_str().ok_or_else(mismatch)?;
            let selected = choices
                .iter()
                .position(|c| c == s)
                .ok_or_else(|| BindError::UnknownChoice(s.to_string()))?;
            Ok(unclamped(Control::ComboBox {
                choices: choices.clone(),
                selected,
            }))
        }
        Leaf::BoundedInt { min, max, .. } => {
            let raw = value.as_i64().ok_or_else(mismatch)?;
            let bounded = raw.clamp(*min, (*max).max(*min));
            Ok(Binding {
                control: Control::SpinBox {
                    value: bounded,
                    min: *min,
                    max: *max,
                },
                clamped: bounded != raw,
            })
        }
        Leaf::BoundedFloat { min, max, .. } => {
            let raw = value.as_f64().ok_or_else(mismatch)?;
            let bounded = raw.clamp(*min, max.max(*min));
            Ok(Binding {
                control: Control::DoubleSpinBox {
                    value: bounded,
                    min: *min,
                    max: *max,
                },
                clamped: bounded != raw,
            })
        }
    }
}

/// One row of the leaf form.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafView {
    pub key: String,
    pub path: KeyPath,
    pub kind: LeafKind,
    pub binding: Result<Binding, BindError>,
}

/// Form rows for the leaves directly under `category`, bound to pending values.
///
/// Sub-categories are skipped; they appear in [`category_tree`].
pub fn leaves<S: SettingsStore>(
    session: &Session<S>,
    category: &KeyPath,
) -> Result<Vec<LeafView>, SessionError> {
    let node = session
        .schema()
        .category_at(category)
        .ok_or_else(|| SessionError::InvalidPath(category.to_string()))?;

    node.leaves()
        .map(|(key, leaf)| {
            let path = category.child(key);
            let value = session.pending(&path)?;
            Ok(LeafView {
                key: key.to_string(),
                kind: leaf.kind(),
                binding: bind(leaf, value),
                path,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use settings_schema::parse_value;

    fn schema() -> Category {
        parse_value(&json!({
            "General": {
                "Theme": ["Light", "Dark", "System"],
                "Autosave": true,
                "Network": {"Proxy": ""}
            },
            "Editor": {
                "FontSize": {"type": "int", "default": 12, "min": 6, "max": 72},
                "Zoom": {"type": "float", "default": 1.0, "min": 0.5, "max": 4.0}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_category_tree() {
        let tree = category_tree(&schema());
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].key, "General");
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].path, KeyPath::from(["General", "Network"]));
        assert_eq!(tree[1].key, "Editor");
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn test_leaves_bind_pending_values() {
        let mut session = Session::init(schema(), MemoryStore::new(), "k").unwrap();
        session.edit(&KeyPath::from(["General", "Theme"]), json!("Dark")).unwrap();

        let views = leaves(&session, &KeyPath::from(["General"])).unwrap();
        let keys: Vec<_> = views.iter().map(|v| v.key.as_str()).collect();
        assert_eq!(keys, vec!["Theme", "Autosave"]);
        assert_eq!(
            views[0].binding,
            Ok(Binding {
                control: Control::ComboBox {
                    choices: vec!["Light".into(), "Dark".into(), "System".into()],
                    selected: 1,
                },
                clamped: false,
            })
        );
        assert_eq!(views[1].kind, LeafKind::Bool);
    }

    #[test]
    fn test_leaves_rejects_non_category() {
        let session = Session::init(schema(), MemoryStore::new(), "k").unwrap();
        assert!(leaves(&session, &KeyPath::from(["General", "Theme"])).is_err());
        assert!(leaves(&session, &KeyPath::from(["Missing"])).is_err());
        assert!(leaves(&session, &KeyPath::root()).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let leaf = Leaf::BoundedInt { default: 12, min: 6, max: 72 };
        let binding = bind(&leaf, &json!(500)).unwrap();
        assert!(binding.clamped);
        assert_eq!(binding.control.value(), json!(72));

        let leaf = Leaf::BoundedFloat { default: 1.0, min: 0.5, max: 4.0 };
        let binding = bind(&leaf, &json!(0.1)).unwrap();
        assert!(binding.clamped);
        assert_eq!(binding.control.value(), json!(0.5));

        let binding = bind(&leaf, &json!(2)).unwrap();
        assert!(!binding.clamped);
    }

    #[test]
    fn test_bind_errors() {
        let choice = Leaf::Choice { choices: vec!["A".into(), "B".into()] };
        assert_eq!(bind(&choice, &json!("C")), Err(BindError::UnknownChoice("C".into())));
        assert!(matches!(
            bind(&choice, &json!(1)),
            Err(BindError::TypeMismatch { expected: LeafKind::Choice, .. })
        ));
        let flag = Leaf::Boolean { default: false };
        assert!(bind(&flag, &json!("true")).is_err());
    }

    #[test]
    fn test_stored_garbage_surfaces_as_bind_error() {
        let store = MemoryStore::with_entry("k", r#"{"Editor": {"FontSize": "huge"}}"#);
        let session = Session::init(schema(), store, "k").unwrap();
        let views = leaves(&session, &KeyPath::from(["Editor"])).unwrap();
        assert!(matches!(views[0].binding, Err(BindError::TypeMismatch { .. })));
        assert!(views[1].binding.is_ok());
    }

    #[test]
    fn test_control_value_feeds_edit() {
        let mut session = Session::init(schema(), MemoryStore::new(), "k").unwrap();
        let control = Control::ComboBox {
            choices: vec!["Light".into(), "Dark".into(), "System".into()],
            selected: 2,
        };
        let theme = KeyPath::from(["General", "Theme"]);
        session.edit(&theme, control.value()).unwrap();
        session.apply().unwrap();
        assert_eq!(session.read(&theme).unwrap(), json!("System"));
    }

    #[test]
    fn test_domain_text() {
        let spin = Control::SpinBox { value: 1, min: 0, max: 9 };
        assert_eq!(spin.domain().as_deref(), Some("0..=9"));
        assert_eq!(Control::Checkbox(true).domain(), None);
    }
}
