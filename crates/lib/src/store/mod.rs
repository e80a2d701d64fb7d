//! The materialized document tree.
//!
//! A [`Store`] is an arena of objects keyed by [`ObjId`]. Nested objects are
//! referenced from their parent by ID rather than owned, so every object is
//! addressable directly and keeps its identity wherever it sits in the tree.
//!
//! Objects are held behind `Arc`: cloning a store is cheap and edits go
//! through `Arc::make_mut`, copying only the objects they touch. Documents
//! use this to apply a change to a clone and keep the original on failure.
//!
//! The store is a pure function of the changes applied to it: replaying the
//! same changes in the same order from an empty store always produces an
//! identical store.

pub mod errors;
pub mod map;
pub mod register;
pub mod seq;

pub use errors::StoreError;
pub use map::MapObject;
pub use register::Register;
pub use seq::{Element, SeqObject};

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use tracing::trace;

use crate::{
    change::{Change, Op, OpAction},
    types::{ElemId, Key, ObjId, ObjType, OpId, ScalarValue, Value},
};

/// Object IDs modified by a change.
pub type Touched = BTreeSet<ObjId>;

/// A map, list or text object.
#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    Map(MapObject),
    List(SeqObject),
    Text(SeqObject),
}

impl Object {
    /// An empty object of the given kind.
    pub fn new(kind: ObjType) -> Self {
        match kind {
            ObjType::Map => Object::Map(MapObject::default()),
            ObjType::List => Object::List(SeqObject::default()),
            ObjType::Text => Object::Text(SeqObject::default()),
        }
    }

    /// The kind of this object.
    pub fn obj_type(&self) -> ObjType {
        match self {
            Object::Map(_) => ObjType::Map,
            Object::List(_) => ObjType::List,
            Object::Text(_) => ObjType::Text,
        }
    }

    /// The map, if this is one.
    pub fn as_map(&self) -> Option<&MapObject> {
        match self {
            Object::Map(map) => Some(map),
            _ => None,
        }
    }

    /// The sequence, if this is a list or text.
    pub fn as_seq(&self) -> Option<&SeqObject> {
        match self {
            Object::List(seq) | Object::Text(seq) => Some(seq),
            Object::Map(_) => None,
        }
    }

    /// Number of live keys or visible elements.
    pub fn len(&self) -> usize {
        match self {
            Object::Map(map) => map.len(),
            Object::List(seq) | Object::Text(seq) => seq.len(),
        }
    }

    /// Returns true if the object holds nothing visible.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Arena of all objects in a document.
#[derive(Clone, Debug, PartialEq)]
pub struct Store {
    objects: HashMap<ObjId, Arc<Object>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// A store holding only the empty root map.
    pub fn new() -> Self {
        let mut objects = HashMap::new();
        objects.insert(ObjId::Root, Arc::new(Object::new(ObjType::Map)));
        Self { objects }
    }

    /// Replay `changes` in order into a fresh store.
    pub fn from_changes<'a>(
        changes: impl IntoIterator<Item = &'a Change>,
    ) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for change in changes {
            store.apply_change(change)?;
        }
        Ok(store)
    }

    /// Look up an object.
    pub fn object(&self, obj: &ObjId) -> Result<&Object, StoreError> {
        self.objects
            .get(obj)
            .map(|object| &**object)
            .ok_or_else(|| StoreError::UnknownObject { obj: obj.clone() })
    }

    /// Returns true if the object exists, even when detached from the tree.
    pub fn contains(&self, obj: &ObjId) -> bool {
        self.objects.contains_key(obj)
    }

    /// Number of objects in the arena, root included.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if both stores hold the very same allocation for `obj`.
    ///
    /// Used to skip diffing objects a change did not copy.
    pub fn shares_object(&self, other: &Store, obj: &ObjId) -> bool {
        match (self.objects.get(obj), other.objects.get(obj)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Apply every operation of `change` in order.
    ///
    /// On error the store may hold some of the change's operations; callers
    /// apply to a clone and discard it.
    pub fn apply_change(&mut self, change: &Change) -> Result<Touched, StoreError> {
        let mut touched = Touched::new();
        for (id, op) in change.iter_ops() {
            self.apply_op(id, op)?;
            touched.insert(op.obj.clone());
        }
        trace!(change = %change.hash(), objects = touched.len(), "Applied change to store");
        Ok(touched)
    }

    /// Apply a single operation with the given ID.
    pub fn apply_op(&mut self, id: OpId, op: &Op) -> Result<(), StoreError> {
        if let OpAction::Set(scalar) = &op.action {
            check_scalar(scalar)?;
        }

        let target = Arc::make_mut(
            self.objects
                .get_mut(&op.obj)
                .ok_or_else(|| StoreError::UnknownObject { obj: op.obj.clone() })?,
        );

        match (target, &op.key) {
            (Object::Map(map), Key::Map(key)) => {
                if op.insert {
                    return Err(StoreError::TypeMismatch {
                        expected: "list or text",
                        actual: "map",
                    });
                }
                match &op.action {
                    OpAction::Set(scalar) => {
                        map.put(key, id.clone(), Value::Scalar(scalar.clone()), &op.pred)
                    }
                    OpAction::Make(kind) => {
                        map.put(key, id.clone(), make_value(*kind, &id), &op.pred)
                    }
                    OpAction::Delete => map.delete(key, &op.pred),
                    OpAction::Increment(by) => {
                        if let Some(register) = map.register_mut(key) {
                            register.increment(*by, &op.pred)?;
                        }
                    }
                }
            }
            (Object::List(seq), Key::Seq(elem)) => apply_seq(&op.obj, seq, id.clone(), elem, op)?,
            (Object::Text(seq), Key::Seq(elem)) => {
                match &op.action {
                    OpAction::Make(kind) => {
                        return Err(StoreError::TypeMismatch {
                            expected: "character",
                            actual: kind.name(),
                        });
                    }
                    OpAction::Set(ScalarValue::Str(text)) if text.chars().count() != 1 => {
                        return Err(StoreError::InvalidValue {
                            reason: format!("text elements hold one character, got {text:?}"),
                        });
                    }
                    OpAction::Set(scalar) if !matches!(scalar, ScalarValue::Str(_)) => {
                        return Err(StoreError::TypeMismatch {
                            expected: "str",
                            actual: scalar.type_name(),
                        });
                    }
                    _ => {}
                }
                apply_seq(&op.obj, seq, id.clone(), elem, op)?
            }
            (Object::Map(_), Key::Seq(_)) => {
                return Err(StoreError::TypeMismatch {
                    expected: "map key",
                    actual: "element",
                });
            }
            (Object::List(_) | Object::Text(_), Key::Map(_)) => {
                return Err(StoreError::TypeMismatch {
                    expected: "element",
                    actual: "map key",
                });
            }
        }

        if let OpAction::Make(kind) = op.action {
            self.objects
                .entry(ObjId::Op(id))
                .or_insert_with(|| Arc::new(Object::new(kind)));
        }

        Ok(())
    }
}

fn make_value(kind: ObjType, id: &OpId) -> Value {
    Value::Object(kind, ObjId::Op(id.clone()))
}

fn check_scalar(scalar: &ScalarValue) -> Result<(), StoreError> {
    if scalar.is_finite() {
        Ok(())
    } else {
        Err(StoreError::InvalidValue {
            reason: format!("non-finite float {scalar}"),
        })
    }
}

fn apply_seq(
    obj: &ObjId,
    seq: &mut SeqObject,
    id: OpId,
    elem: &ElemId,
    op: &Op,
) -> Result<(), StoreError> {
    if op.insert {
        let value = match &op.action {
            OpAction::Set(scalar) => Value::Scalar(scalar.clone()),
            OpAction::Make(kind) => make_value(*kind, &id),
            other => {
                return Err(StoreError::TypeMismatch {
                    expected: "set or make",
                    actual: other.name(),
                });
            }
        };
        if !seq.insert(elem, id.clone(), value) {
            return Err(missing(obj, elem, &id));
        }
        return Ok(());
    }

    let ElemId::Op(target) = elem else {
        return Err(StoreError::TypeMismatch {
            expected: "element",
            actual: "head",
        });
    };
    let register = seq
        .register_mut(target)
        .ok_or_else(|| missing(obj, elem, &id))?;

    match &op.action {
        OpAction::Set(scalar) => register.put(id, Value::Scalar(scalar.clone()), &op.pred),
        OpAction::Make(kind) => {
            let value = make_value(*kind, &id);
            register.put(id, value, &op.pred)
        }
        OpAction::Delete => register.remove(&op.pred),
        OpAction::Increment(by) => register.increment(*by, &op.pred)?,
    }
    Ok(())
}

fn missing(obj: &ObjId, elem: &ElemId, fallback: &OpId) -> StoreError {
    StoreError::MissingElement {
        obj: obj.clone(),
        elem: match elem {
            ElemId::Op(id) => id.clone(),
            ElemId::Head => fallback.clone(),
        },
    }
}
