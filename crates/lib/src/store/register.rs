//! Multi-value register: the set of concurrent values at one map key or
//! list element.

use super::errors::StoreError;
use crate::types::{OpId, ScalarValue, Value};

/// Concurrent values of a single slot, sorted by [`OpId`].
///
/// Each write removes the values it saw (its `pred`) and adds itself, so
/// writes that did not see each other coexist. The greatest `OpId` is the
/// winner; the others are conflicts. An empty register means the slot was
/// deleted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Register {
    values: Vec<(OpId, Value)>,
}

impl Register {
    /// The winning value and the operation that wrote it.
    pub fn winner(&self) -> Option<(&OpId, &Value)> {
        self.values.last().map(|(id, value)| (id, value))
    }

    /// The winning value.
    pub fn value(&self) -> Option<&Value> {
        self.values.last().map(|(_, value)| value)
    }

    /// All concurrent values in ascending `OpId` order.
    pub fn values(&self) -> &[(OpId, Value)] {
        &self.values
    }

    /// IDs of the values currently held, used as `pred` by local writes.
    pub fn ids(&self) -> Vec<OpId> {
        self.values.iter().map(|(id, _)| id.clone()).collect()
    }

    /// Returns true if more than one concurrent value is held.
    pub fn has_conflict(&self) -> bool {
        self.values.len() > 1
    }

    /// Returns true if the slot holds no value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remove the values named in `pred`.
    pub(crate) fn remove(&mut self, pred: &[OpId]) {
        if !pred.is_empty() {
            self.values.retain(|(id, _)| !pred.contains(id));
        }
    }

    /// Remove the values named in `pred`, then add `value` written by `id`.
    pub(crate) fn put(&mut self, id: OpId, value: Value, pred: &[OpId]) {
        self.remove(pred);
        let position = self.values.partition_point(|(existing, _)| *existing < id);
        if self.values.get(position).map(|(existing, _)| existing) != Some(&id) {
            self.values.insert(position, (id, value));
        }
    }

    /// Add `by` to each counter named in `pred`.
    ///
    /// Counters that have since been overwritten or deleted are no longer
    /// present, and the increment is dropped for them.
    pub(crate) fn increment(&mut self, by: i64, pred: &[OpId]) -> Result<(), StoreError> {
        for (id, value) in self.values.iter_mut() {
            if !pred.contains(id) {
                continue;
            }
            match value {
                Value::Scalar(ScalarValue::Counter(total)) => *total = total.wrapping_add(by),
                other => {
                    return Err(StoreError::TypeMismatch {
                        expected: "counter",
                        actual: other.type_name(),
                    });
                }
            }
        }
        Ok(())
    }
}
