//! Change records and the pending change log

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::path::KeyPath;

/// One leaf edit: the path and the value it was set to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub path: KeyPath,
    pub value: Value,
}

impl ChangeRecord {
    pub fn new(path: KeyPath, value: Value) -> Self {
        Self { path, value }
    }
}

/// Ordered log of pending edits, deduplicated by path.
///
/// Re-editing a path replaces the value of its existing record; the record
/// keeps the position of the first edit to that path.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    records: Vec<ChangeRecord>,
    index: HashMap<KeyPath, usize>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update the record for `path`.
    pub fn upsert(&mut self, path: KeyPath, value: Value) {
        match self.index.get(&path) {
            Some(&slot) => self.records[slot].value = value,
            None => {
                self.index.insert(path.clone(), self.records.len());
                self.records.push(ChangeRecord::new(path, value));
            }
        }
    }

    /// Drop the record for `path`, if any. Later records shift up one slot.
    pub fn remove(&mut self, path: &KeyPath) -> Option<ChangeRecord> {
        let slot = self.index.remove(path)?;
        let removed = self.records.remove(slot);
        for later in self.index.values_mut() {
            if *later > slot {
                *later -= 1;
            }
        }
        Some(removed)
    }

    pub fn get(&self, path: &KeyPath) -> Option<&ChangeRecord> {
        self.index.get(path).map(|&slot| &self.records[slot])
    }

    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove and return every record, leaving the log empty.
    pub fn drain(&mut self) -> Vec<ChangeRecord> {
        self.index.clear();
        std::mem::take(&mut self.records)
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.records.clear();
    }
}
