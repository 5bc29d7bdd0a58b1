//! Key paths into nested settings hierarchies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised when a path cannot be used for lookup or update.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("Invalid path '{0}'")]
    InvalidPath(String),

    #[error("Path not found: {0}")]
    NotFound(KeyPath),
}

/// Ordered sequence of string keys addressing a leaf or a subtree.
///
/// Serializes as a JSON array of strings so change records stay
/// unambiguous even when a key itself contains a dot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn new(parts: impl Into<Vec<String>>) -> Self {
        KeyPath(parts.into())
    }

    /// The empty path, addressing the root category.
    pub fn root() -> Self {
        KeyPath(Vec::new())
    }

    pub fn from_slice(parts: &[&str]) -> Self {
        KeyPath(parts.iter().map(|s| s.to_string()).collect())
    }

    /// Parse a dot-separated path such as `General.Theme`.
    ///
    /// An empty string parses to the root path; empty segments are rejected.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let parts: Vec<String> = text.split('.').map(str::to_string).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(PathError::InvalidPath(text.to_string()));
        }
        Ok(KeyPath(parts))
    }

    pub fn push(&mut self, part: impl Into<String>) {
        self.0.push(part.into());
    }

    /// Remove and return the last key.
    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    /// Return a new path extended by one key.
    pub fn child(&self, part: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.push(part);
        next
    }

    /// Path of the enclosing category, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(KeyPath(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &KeyPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Reject the empty path and paths with empty segments.
    pub fn validate(&self) -> Result<(), PathError> {
        if self.0.is_empty() || self.0.iter().any(|p| p.is_empty()) {
            return Err(PathError::InvalidPath(self.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&[&str]> for KeyPath {
    fn from(parts: &[&str]) -> Self {
        KeyPath::from_slice(parts)
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(parts: [&str; N]) -> Self {
        KeyPath::from_slice(&parts)
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(parts: Vec<String>) -> Self {
        KeyPath(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotted() {
        let path = KeyPath::parse("General.Theme").unwrap();
        assert_eq!(path, KeyPath::from(["General", "Theme"]));
        assert_eq!(path.to_string(), "General.Theme");
    }

    #[test]
    fn test_parse_rejects_empty_segment() {
        assert!(matches!(
            KeyPath::parse("General..Theme"),
            Err(PathError::InvalidPath(_))
        ));
        assert!(KeyPath::parse(".Theme").is_err());
    }

    #[test]
    fn test_parse_empty_is_root() {
        assert!(KeyPath::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(KeyPath::root().validate().is_err());
        assert!(KeyPath::new(vec![String::new()]).validate().is_err());
        assert!(KeyPath::from(["a"]).validate().is_ok());
    }

    #[test]
    fn test_parent_and_child() {
        let path = KeyPath::from(["a", "b"]);
        assert_eq!(path.parent(), Some(KeyPath::from(["a"])));
        assert_eq!(KeyPath::root().parent(), None);
        assert_eq!(path.child("c"), KeyPath::from(["a", "b", "c"]));
        assert_eq!(path.last(), Some("b"));
        assert!(path.child("c").starts_with(&path));
    }

    #[test]
    fn test_push_pop() {
        let mut path = KeyPath::from(["a"]);
        path.push("b");
        assert_eq!(path.pop().as_deref(), Some("b"));
        assert_eq!(path.pop().as_deref(), Some("a"));
        assert_eq!(path.pop(), None);
        assert!(path.is_empty());
    }

    #[test]
    fn test_serializes_as_array() {
        let path = KeyPath::from(["a.b", "c"]);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#"["a.b","c"]"#);
        let back: KeyPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
