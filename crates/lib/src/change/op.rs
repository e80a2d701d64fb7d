//! Operations: the atomic edits carried by a change.

use serde::{Deserialize, Serialize};

use crate::types::{ElemId, Key, ObjId, ObjType, OpId, ScalarValue};

/// What an operation does to its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpAction {
    /// Write a scalar value
    Set(ScalarValue),
    /// Create a nested object; its ID is the ID of this operation
    Make(ObjType),
    /// Remove the values named in `pred`
    Delete,
    /// Add to the counters named in `pred`
    Increment(i64),
}

impl OpAction {
    /// Short lowercase name for logs and listings.
    pub fn name(&self) -> &'static str {
        match self {
            OpAction::Set(_) => "set",
            OpAction::Make(_) => "make",
            OpAction::Delete => "delete",
            OpAction::Increment(_) => "increment",
        }
    }

    /// Returns true if applying this action stores a new value.
    pub fn stores_value(&self) -> bool {
        matches!(self, OpAction::Set(_) | OpAction::Make(_))
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One atomic edit targeting an object.
///
/// The operation's own [`OpId`] is not stored: it is derived from its
/// position inside the enclosing change (`start_op + index`).
///
/// - Map edits use `Key::Map`.
/// - Sequence inserts use `Key::Seq(anchor)` with `insert = true`; the new
///   element goes after `anchor`.
/// - Sequence edits of an existing element use `Key::Seq(element)`.
/// - `pred` lists the operations this one supersedes (set, make, delete) or
///   the counters it increments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Op {
    /// Target object
    pub obj: ObjId,
    /// Property or element addressed
    pub key: Key,
    /// True if this operation inserts a new sequence element
    #[serde(default, skip_serializing_if = "is_false")]
    pub insert: bool,
    /// The edit itself
    pub action: OpAction,
    /// Operations overwritten or incremented by this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pred: Vec<OpId>,
}

impl Op {
    /// An edit of a map property.
    pub fn map(obj: ObjId, key: impl Into<String>, action: OpAction, pred: Vec<OpId>) -> Self {
        Self {
            obj,
            key: Key::Map(key.into()),
            insert: false,
            action,
            pred,
        }
    }

    /// An insert into a sequence, after `anchor`.
    pub fn insert_after(obj: ObjId, anchor: ElemId, action: OpAction) -> Self {
        Self {
            obj,
            key: Key::Seq(anchor),
            insert: true,
            action,
            pred: Vec::new(),
        }
    }

    /// An edit of an existing sequence element.
    pub fn element(obj: ObjId, elem: OpId, action: OpAction, pred: Vec<OpId>) -> Self {
        Self {
            obj,
            key: Key::Seq(ElemId::Op(elem)),
            insert: false,
            action,
            pred,
        }
    }
}
