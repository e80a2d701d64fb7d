//! Local edits, grouped into one change.
//!
//! A [`Transaction`] records operations against a private copy of the
//! document store, so reads inside the transaction see its own writes and a
//! failed transaction leaves the document untouched. Index-based edits are
//! translated into operations on stable element IDs as they are recorded.

use tracing::trace;

use super::{Document, ReadDoc};
use crate::{
    Result,
    change::{ChangeError, Op, OpAction},
    store::{Object, SeqObject, Store, StoreError, Touched},
    types::{ActorId, ElemId, ObjId, ObjType, OpId, Prop, ScalarValue},
};

/// A set of pending edits on top of a document.
///
/// Obtained through [`Document::change`] and friends.
pub struct Transaction<'a> {
    doc: &'a Document,
    store: Store,
    ops: Vec<Op>,
    next_counter: u64,
    touched: Touched,
}

impl<'a> Transaction<'a> {
    pub(super) fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            store: doc.store.clone(),
            ops: Vec::new(),
            next_counter: doc.log.max_op() + 1,
            touched: Touched::new(),
        }
    }

    pub(super) fn finish(self) -> (Vec<Op>, Store, Touched) {
        (self.ops, self.store, self.touched)
    }

    /// The actor the resulting change will be attributed to.
    pub fn actor(&self) -> &ActorId {
        self.doc.actor()
    }

    /// Number of operations recorded so far.
    pub fn pending_ops(&self) -> usize {
        self.ops.len()
    }

    /// Set a scalar at a map key or list index.
    pub fn put<P, V>(&mut self, obj: &ObjId, prop: P, value: V) -> Result<()>
    where
        P: Into<Prop>,
        V: Into<ScalarValue>,
    {
        let value = value.into();
        self.check_text_value(obj, &value)?;
        self.write(obj, prop.into(), OpAction::Set(value))?;
        Ok(())
    }

    /// Create a new object at a map key or list index and return its ID.
    pub fn put_object<P: Into<Prop>>(&mut self, obj: &ObjId, prop: P, kind: ObjType) -> Result<ObjId> {
        let id = self.write(obj, prop.into(), OpAction::Make(kind))?;
        Ok(ObjId::Op(id))
    }

    /// Insert a scalar into a list or text at `index`.
    pub fn insert<V: Into<ScalarValue>>(&mut self, obj: &ObjId, index: usize, value: V) -> Result<()> {
        let value = value.into();
        self.check_text_value(obj, &value)?;
        let anchor = self.anchor(obj, index)?;
        self.record(Op::insert_after(obj.clone(), anchor, OpAction::Set(value)))?;
        Ok(())
    }

    /// Insert a new object into a list at `index` and return its ID.
    pub fn insert_object(&mut self, obj: &ObjId, index: usize, kind: ObjType) -> Result<ObjId> {
        let anchor = self.anchor(obj, index)?;
        let id = self.record(Op::insert_after(obj.clone(), anchor, OpAction::Make(kind)))?;
        Ok(ObjId::Op(id))
    }

    /// Append a scalar to a list or text.
    pub fn push<V: Into<ScalarValue>>(&mut self, obj: &ObjId, value: V) -> Result<()> {
        let end = self.sequence(obj)?.len();
        self.insert(obj, end, value)
    }

    /// Append a new object to a list and return its ID.
    pub fn push_object(&mut self, obj: &ObjId, kind: ObjType) -> Result<ObjId> {
        let end = self.sequence(obj)?.len();
        self.insert_object(obj, end, kind)
    }

    /// Remove a map key or list element.
    ///
    /// Deleting a missing map key records nothing.
    pub fn delete<P: Into<Prop>>(&mut self, obj: &ObjId, prop: P) -> Result<()> {
        match prop.into() {
            Prop::Map(key) => {
                let pred = match self.map_pred(obj, &key)? {
                    Some(pred) => pred,
                    None => return Ok(()),
                };
                self.record(Op::map(obj.clone(), key, OpAction::Delete, pred))?;
            }
            Prop::Seq(index) => {
                let (elem, pred) = self.element(obj, index)?;
                self.record(Op::element(obj.clone(), elem, OpAction::Delete, pred))?;
            }
        }
        Ok(())
    }

    /// Add `by` to the counter at `prop`.
    ///
    /// # Errors
    /// `TypeMismatch` if the current value is not a counter, including when
    /// the property is missing.
    pub fn increment<P: Into<Prop>>(&mut self, obj: &ObjId, prop: P, by: i64) -> Result<()> {
        let prop = prop.into();
        let current = self.get_all(obj, prop.clone())?;
        let actual = current
            .last()
            .map(|(_, value)| value.type_name())
            .unwrap_or("nothing");
        let counters: Vec<OpId> = current
            .into_iter()
            .filter(|(_, value)| value.as_counter().is_some())
            .map(|(id, _)| id)
            .collect();
        if actual != "counter" {
            return Err(StoreError::TypeMismatch {
                expected: "counter",
                actual,
            }
            .into());
        }

        let op = match prop {
            Prop::Map(key) => Op::map(obj.clone(), key, OpAction::Increment(by), counters),
            Prop::Seq(index) => {
                let (elem, _) = self.element(obj, index)?;
                Op::element(obj.clone(), elem, OpAction::Increment(by), counters)
            }
        };
        self.record(op)?;
        Ok(())
    }

    /// Delete `delete` characters of a text object at `index`, then insert
    /// `text` there.
    pub fn splice_text(&mut self, obj: &ObjId, index: usize, delete: usize, text: &str) -> Result<()> {
        let seq = self.text_object(obj)?;
        let len = seq.len();
        if index.saturating_add(delete) > len {
            return Err(StoreError::IndexOutOfBounds {
                obj: obj.clone(),
                index: index.saturating_add(delete),
                len,
            }
            .into());
        }

        for _ in 0..delete {
            let (elem, pred) = self.element(obj, index)?;
            self.record(Op::element(obj.clone(), elem, OpAction::Delete, pred))?;
        }

        let mut anchor = self.anchor(obj, index)?;
        for c in text.chars() {
            let id = self.record(Op::insert_after(
                obj.clone(),
                anchor,
                OpAction::Set(c.to_string().into()),
            ))?;
            anchor = ElemId::Op(id);
        }
        Ok(())
    }

    /// Record an operation, applying it to the working store.
    fn record(&mut self, op: Op) -> Result<OpId> {
        let next = self
            .next_counter
            .checked_add(1)
            .ok_or_else(|| ChangeError::InvalidStructure {
                reason: "operation counters exhausted".to_string(),
            })?;
        let id = OpId::new(self.next_counter, self.doc.actor().clone());
        self.store.apply_op(id.clone(), &op)?;
        trace!(op = %id, action = op.action.name(), obj = %op.obj, "Recorded operation");
        self.touched.insert(op.obj.clone());
        self.ops.push(op);
        self.next_counter = next;
        Ok(id)
    }

    /// Record a set or make at a map key or existing list index.
    fn write(&mut self, obj: &ObjId, prop: Prop, action: OpAction) -> Result<OpId> {
        match prop {
            Prop::Map(key) => {
                let pred = self.map_pred(obj, &key)?.unwrap_or_default();
                self.record(Op::map(obj.clone(), key, action, pred))
            }
            Prop::Seq(index) => {
                let (elem, pred) = self.element(obj, index)?;
                self.record(Op::element(obj.clone(), elem, action, pred))
            }
        }
    }

    /// The values at a map key, or `None` if the key is absent.
    fn map_pred(&self, obj: &ObjId, key: &str) -> Result<Option<Vec<OpId>>> {
        match self.store.object(obj)? {
            Object::Map(map) => Ok(map.register(key).map(|register| register.ids())),
            other => Err(StoreError::TypeMismatch {
                expected: "map",
                actual: other.obj_type().name(),
            }
            .into()),
        }
    }

    fn sequence(&self, obj: &ObjId) -> Result<&SeqObject> {
        let object = self.store.object(obj)?;
        object.as_seq().ok_or_else(|| {
            StoreError::TypeMismatch {
                expected: "list or text",
                actual: object.obj_type().name(),
            }
            .into()
        })
    }

    fn text_object(&self, obj: &ObjId) -> Result<&SeqObject> {
        match self.store.object(obj)? {
            Object::Text(seq) => Ok(seq),
            other => Err(StoreError::TypeMismatch {
                expected: "text",
                actual: other.obj_type().name(),
            }
            .into()),
        }
    }

    /// The visible element at `index` and the values it holds.
    fn element(&self, obj: &ObjId, index: usize) -> Result<(OpId, Vec<OpId>)> {
        let seq = self.sequence(obj)?;
        let element = seq.element_at(index).ok_or_else(|| StoreError::IndexOutOfBounds {
            obj: obj.clone(),
            index,
            len: seq.len(),
        })?;
        Ok((element.id().clone(), element.register().ids()))
    }

    fn anchor(&self, obj: &ObjId, index: usize) -> Result<ElemId> {
        let seq = self.sequence(obj)?;
        seq.anchor_for(index).ok_or_else(|| {
            StoreError::IndexOutOfBounds {
                obj: obj.clone(),
                index,
                len: seq.len(),
            }
            .into()
        })
    }

    /// Text elements hold exactly one character.
    fn check_text_value(&self, obj: &ObjId, value: &ScalarValue) -> Result<()> {
        if self.store.object(obj)?.obj_type() != ObjType::Text {
            return Ok(());
        }
        match value {
            ScalarValue::Str(s) if s.chars().count() == 1 => Ok(()),
            ScalarValue::Str(s) => Err(StoreError::InvalidValue {
                reason: format!("text elements hold one character, got {:?}", s),
            }
            .into()),
            other => Err(StoreError::TypeMismatch {
                expected: "str",
                actual: other.type_name(),
            }
            .into()),
        }
    }
}

impl ReadDoc for Transaction<'_> {
    fn store(&self) -> &Store {
        &self.store
    }
}
