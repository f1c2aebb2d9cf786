// Closed Records - strict object validation shared by every per-entity validator
// Keys are looked up in a name -> slot map; anything else is surfaced to the caller

use super::context::ValidationContext;
use crate::core::FieldPath;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A closed object shape: the declared keys and what validates each one.
#[derive(Debug)]
pub struct ClosedRecord<S> {
    slots: HashMap<String, S>,
}

/// One key of an input object, classified against the record.
pub enum RecordEntry<'r, 'v, S> {
    Slot {
        key: &'v str,
        slot: &'r S,
        value: &'v Value,
    },
    Other {
        key: &'v str,
        value: &'v Value,
    },
}

impl<S> Default for ClosedRecord<S> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<S> ClosedRecord<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, slot: S) {
        self.slots.insert(name.to_string(), slot);
    }

    pub fn get(&self, name: &str) -> Option<&S> {
        self.slots.get(name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Classify each key of `object` in input order.
    pub fn entries<'r, 'v>(
        &'r self,
        object: &'v Map<String, Value>,
    ) -> impl Iterator<Item = RecordEntry<'r, 'v, S>> + 'r
    where
        'v: 'r,
    {
        object.iter().map(move |(key, value)| match self.slots.get(key) {
            Some(slot) => RecordEntry::Slot {
                key: key.as_str(),
                slot,
                value,
            },
            None => RecordEntry::Other {
                key: key.as_str(),
                value,
            },
        })
    }
}

/// Require an object, reporting a `TypeMismatch` otherwise.
pub fn expect_object<'v>(
    ctx: &mut ValidationContext<'_>,
    path: &FieldPath,
    value: &'v Value,
    expected: &str,
) -> Option<&'v Map<String, Value>> {
    match value {
        Value::Object(object) => Some(object),
        other => {
            ctx.type_mismatch(path, expected, other);
            None
        }
    }
}

/// Require a boolean, reporting a `TypeMismatch` otherwise.
pub fn expect_bool(ctx: &mut ValidationContext<'_>, path: &FieldPath, value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        other => {
            ctx.type_mismatch(path, "bool", other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entries_preserve_input_order() {
        let mut record = ClosedRecord::new();
        record.insert("b", 2);
        record.insert("a", 1);
        let input = json!({"b": true, "zz": 0, "a": false});
        let object = input.as_object().unwrap();
        let keys: Vec<(String, bool)> = record
            .entries(object)
            .map(|entry| match entry {
                RecordEntry::Slot { key, .. } => (key.to_string(), true),
                RecordEntry::Other { key, .. } => (key.to_string(), false),
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                ("b".to_string(), true),
                ("zz".to_string(), false),
                ("a".to_string(), true)
            ]
        );
    }
}
