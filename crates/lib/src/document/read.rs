//! Read access shared by documents and transactions.

use crate::{
    Result,
    store::{Object, Register, Store, StoreError},
    types::{ObjId, ObjType, OpId, Prop, ScalarValue, Value},
};

/// Read operations over a materialized document tree.
///
/// Implemented by [`Document`](super::Document) and by
/// [`Transaction`](super::Transaction), which reads its own uncommitted
/// writes. Every method addresses an object by ID and fails with
/// `UnknownObject` if the object does not exist, or `TypeMismatch` if the
/// property kind does not fit the object (a key on a list, an index on a
/// map).
pub trait ReadDoc {
    /// The underlying store.
    fn store(&self) -> &Store;

    /// The kind of `obj`.
    fn object_type(&self, obj: &ObjId) -> Result<ObjType> {
        Ok(self.store().object(obj)?.obj_type())
    }

    /// The winning value at `prop`, or `None` if absent.
    fn get<P: Into<Prop>>(&self, obj: &ObjId, prop: P) -> Result<Option<Value>> {
        Ok(register_at(self.store(), obj, &prop.into())?.and_then(|r| r.value().cloned()))
    }

    /// Every concurrent value at `prop` with the operation that wrote it,
    /// in ascending operation order. The last entry is the winner.
    fn get_all<P: Into<Prop>>(&self, obj: &ObjId, prop: P) -> Result<Vec<(OpId, Value)>> {
        Ok(register_at(self.store(), obj, &prop.into())?
            .map(|r| r.values().to_vec())
            .unwrap_or_default())
    }

    /// The ID of the object at `prop`, if the winning value is an object.
    fn get_object_id<P: Into<Prop>>(&self, obj: &ObjId, prop: P) -> Result<Option<ObjId>> {
        Ok(self
            .get(obj, prop)?
            .and_then(|value| value.object_id().cloned()))
    }

    /// The value of the counter at `prop`, if the winning value is one.
    fn counter<P: Into<Prop>>(&self, obj: &ObjId, prop: P) -> Result<Option<i64>> {
        Ok(self.get(obj, prop)?.and_then(|value| value.as_counter()))
    }

    /// Keys of a map in lexicographic order. Empty for lists and text.
    fn keys(&self, obj: &ObjId) -> Result<Vec<String>> {
        Ok(match self.store().object(obj)? {
            Object::Map(map) => map.keys().map(str::to_string).collect(),
            _ => Vec::new(),
        })
    }

    /// Number of keys of a map, or visible elements of a list or text.
    fn length(&self, obj: &ObjId) -> Result<usize> {
        Ok(self.store().object(obj)?.len())
    }

    /// Map values in key order, or list elements in order.
    fn values(&self, obj: &ObjId) -> Result<Vec<Value>> {
        Ok(match self.store().object(obj)? {
            Object::Map(map) => map
                .iter()
                .filter_map(|(_, register)| register.value().cloned())
                .collect(),
            Object::List(seq) | Object::Text(seq) => {
                seq.visible().filter_map(|e| e.value().cloned()).collect()
            }
        })
    }

    /// The content of a text object.
    fn text(&self, obj: &ObjId) -> Result<String> {
        match self.store().object(obj)? {
            Object::Text(seq) => Ok(seq
                .visible()
                .filter_map(|e| match e.value() {
                    Some(Value::Scalar(ScalarValue::Str(s))) => Some(s.as_str()),
                    _ => None,
                })
                .collect()),
            other => Err(StoreError::TypeMismatch {
                expected: "text",
                actual: other.obj_type().name(),
            }
            .into()),
        }
    }
}

/// Resolve a property to its register, checking the property kind.
fn register_at<'a>(store: &'a Store, obj: &ObjId, prop: &Prop) -> Result<Option<&'a Register>> {
    match (store.object(obj)?, prop) {
        (Object::Map(map), Prop::Map(key)) => Ok(map.register(key)),
        (Object::List(seq) | Object::Text(seq), Prop::Seq(index)) => {
            Ok(seq.element_at(*index).map(|e| e.register()))
        }
        (Object::Map(_), Prop::Seq(_)) => Err(StoreError::TypeMismatch {
            expected: "key",
            actual: "index",
        }
        .into()),
        (_, Prop::Map(_)) => Err(StoreError::TypeMismatch {
            expected: "index",
            actual: "key",
        }
        .into()),
    }
}

impl ReadDoc for Store {
    fn store(&self) -> &Store {
        self
    }
}
