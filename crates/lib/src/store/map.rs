//! String-keyed map objects.

use std::collections::BTreeMap;

use super::register::Register;
use crate::types::{OpId, Value};

/// A map object: each key holds a [`Register`] of concurrent values.
///
/// Keys whose register is emptied by a delete are removed, so iteration only
/// visits live keys, in lexicographic order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapObject {
    entries: BTreeMap<String, Register>,
}

impl MapObject {
    /// The winning value at `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).and_then(Register::value)
    }

    /// The register at `key`, including conflicting values.
    pub fn register(&self, key: &str) -> Option<&Register> {
        self.entries.get(key)
    }

    /// Live keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Live entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Register)> {
        self.entries
            .iter()
            .map(|(key, register)| (key.as_str(), register))
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no live keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn put(&mut self, key: &str, id: OpId, value: Value, pred: &[OpId]) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .put(id, value, pred);
    }

    pub(crate) fn delete(&mut self, key: &str, pred: &[OpId]) {
        if let Some(register) = self.entries.get_mut(key) {
            register.remove(pred);
            if register.is_empty() {
                self.entries.remove(key);
            }
        }
    }

    pub(crate) fn register_mut(&mut self, key: &str) -> Option<&mut Register> {
        self.entries.get_mut(key)
    }
}
