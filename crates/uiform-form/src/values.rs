//! Form value store
//!
//! Holds the current field values of one form. Reads hand out immutable
//! snapshots, so a loader always sees the values as they were when its
//! request was dispatched.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use uiform_options::FormSnapshot;

/// Current values of a form
#[derive(Debug, Default)]
pub struct FormValueStore {
    current: RwLock<FormSnapshot>,
    initial: RwLock<FormSnapshot>,
}

impl FormValueStore {
    /// Create store seeded with `initial`
    #[must_use]
    pub fn new(initial: Map<String, Value>) -> Self {
        let initial = FormSnapshot::new(initial);
        Self {
            current: RwLock::new(initial.clone()),
            initial: RwLock::new(initial),
        }
    }

    /// Set one field; returns whether the value changed
    pub fn update_value(&self, name: &str, value: Value) -> bool {
        let mut current = self.current.write();
        if current.get(name) == Some(&value) {
            return false;
        }
        let mut values = current.values().clone();
        values.insert(name.to_string(), value);
        *current = FormSnapshot::new(values);
        true
    }

    /// Replace all values
    pub fn set_values(&self, values: Map<String, Value>) {
        *self.current.write() = FormSnapshot::new(values);
    }

    /// Replace the initial values and reset to them
    pub fn replace_initial(&self, values: Map<String, Value>) {
        let initial = FormSnapshot::new(values);
        *self.initial.write() = initial.clone();
        *self.current.write() = initial;
    }

    /// Restore the initial values
    pub fn reset(&self) {
        let initial = self.initial.read().clone();
        *self.current.write() = initial;
    }

    /// Value of one field
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.current.read().get(name).cloned()
    }

    /// Snapshot of the current values
    #[must_use]
    pub fn snapshot(&self) -> FormSnapshot {
        self.current.read().clone()
    }

    /// Snapshot of the initial values
    #[must_use]
    pub fn initial(&self) -> FormSnapshot {
        self.initial.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(raw: Value) -> Map<String, Value> {
        match raw {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn update_reports_changes() {
        let store = FormValueStore::new(map(json!({"country": "US"})));

        assert!(!store.update_value("country", json!("US")));
        assert!(store.update_value("country", json!("MX")));
        assert_eq!(store.get("country"), Some(json!("MX")));
    }

    #[test]
    fn snapshots_are_isolated_from_later_writes() {
        let store = FormValueStore::new(Map::new());
        store.update_value("a", json!(1));
        let before = store.snapshot();

        store.update_value("a", json!(2));

        assert_eq!(before.get("a"), Some(&json!(1)));
        assert_eq!(store.snapshot().get("a"), Some(&json!(2)));
    }

    #[test]
    fn reset_restores_initial() {
        let store = FormValueStore::new(map(json!({"a": 1})));
        store.set_values(map(json!({"a": 5, "b": 6})));
        store.reset();

        assert_eq!(store.snapshot(), store.initial());
        assert_eq!(store.get("b"), None);
    }

    #[test]
    fn replace_initial_resets_current() {
        let store = FormValueStore::new(Map::new());
        store.update_value("x", json!("typed"));
        store.replace_initial(map(json!({"x": "seed"})));

        assert_eq!(store.get("x"), Some(json!("seed")));
        store.update_value("x", json!("again"));
        store.reset();
        assert_eq!(store.get("x"), Some(json!("seed")));
    }
}
