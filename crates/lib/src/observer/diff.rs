//! Per-object diffs between two versions of a store.
//!
//! Sequence diffs are computed from stable element IDs rather than by
//! comparing visible values, so an element that was deleted and a different
//! one inserted at the same index are reported as exactly that. Patches of a
//! diff apply in order: each index refers to the sequence as modified by the
//! patches before it.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::{
    store::{MapObject, Object, Register, SeqObject, Store},
    types::{ObjId, ObjType, OpId, Value},
};

/// One edit within an object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Patch {
    /// A map key was created or its winning value changed
    PutMap {
        key: String,
        value: Value,
        /// True if concurrent values remain at this key
        conflict: bool,
    },
    /// A map key was removed
    DeleteMap { key: String },
    /// A list element was inserted
    Insert { index: usize, value: Value },
    /// The value of an existing list or text element changed
    PutSeq {
        index: usize,
        value: Value,
        conflict: bool,
    },
    /// A list element was removed
    DeleteSeq { index: usize },
    /// Characters were inserted into text
    SpliceText { index: usize, text: String },
    /// Characters were removed from text
    DeleteText { index: usize, len: usize },
}

/// The edits made to one object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectDiff {
    /// The modified object
    pub obj: ObjId,
    /// Its kind
    pub obj_type: ObjType,
    /// Edits in application order
    pub patches: Vec<Patch>,
}

/// Compute the diffs of every object in `objects`, skipping unchanged ones.
pub fn diff_objects(before: &Store, after: &Store, objects: &BTreeSet<ObjId>) -> Vec<ObjectDiff> {
    objects
        .iter()
        .filter_map(|obj| diff_object(before, after, obj))
        .collect()
}

/// Compute the edits that turn `obj` in `before` into `obj` in `after`.
///
/// An object missing from `before` is diffed against an empty object.
/// Returns `None` if the object is unchanged or missing from `after`.
pub fn diff_object(before: &Store, after: &Store, obj: &ObjId) -> Option<ObjectDiff> {
    if after.shares_object(before, obj) {
        return None;
    }
    let new = after.object(obj).ok()?;
    let empty;
    let old = match before.object(obj) {
        Ok(old) => old,
        Err(_) => {
            empty = Object::new(new.obj_type());
            &empty
        }
    };

    let patches = match (old, new) {
        (Object::Map(old), Object::Map(new)) => diff_map(old, new),
        (Object::List(old), Object::List(new)) => diff_seq(old, new, false),
        (Object::Text(old), Object::Text(new)) => diff_seq(old, new, true),
        // Object IDs are never reused for a different kind
        _ => return None,
    };

    if patches.is_empty() {
        return None;
    }
    Some(ObjectDiff {
        obj: obj.clone(),
        obj_type: new.obj_type(),
        patches,
    })
}

fn diff_map(old: &MapObject, new: &MapObject) -> Vec<Patch> {
    let keys: BTreeSet<&str> = old.keys().chain(new.keys()).collect();
    let mut patches = Vec::new();

    for key in keys {
        match (old.register(key), new.register(key)) {
            (Some(_), None) => patches.push(Patch::DeleteMap {
                key: key.to_string(),
            }),
            (before, Some(after)) if before != Some(after) => {
                if let Some(value) = after.value() {
                    patches.push(Patch::PutMap {
                        key: key.to_string(),
                        value: value.clone(),
                        conflict: after.has_conflict(),
                    });
                }
            }
            _ => {}
        }
    }

    patches
}

fn diff_seq(old: &SeqObject, new: &SeqObject, text: bool) -> Vec<Patch> {
    let previous: HashMap<&OpId, &Register> = old
        .elements()
        .iter()
        .map(|element| (element.id(), element.register()))
        .collect();

    let mut patches = Vec::new();
    let mut index = 0;

    for element in new.elements() {
        let before = previous.get(element.id()).copied();
        let was_visible = before.is_some_and(|register| !register.is_empty());
        let after = element.register();

        match (was_visible, after.value()) {
            (false, Some(value)) => {
                push_insert(&mut patches, index, value, text);
                index += 1;
            }
            (true, None) => push_delete(&mut patches, index, text),
            (true, Some(value)) => {
                if before != Some(after) {
                    patches.push(Patch::PutSeq {
                        index,
                        value: value.clone(),
                        conflict: after.has_conflict(),
                    });
                }
                index += 1;
            }
            (false, None) => {}
        }
    }

    patches
}

fn push_insert(patches: &mut Vec<Patch>, index: usize, value: &Value, text: bool) {
    if !text {
        patches.push(Patch::Insert {
            index,
            value: value.clone(),
        });
        return;
    }

    let chars = value.as_str().unwrap_or_default();
    if let Some(Patch::SpliceText {
        index: start,
        text: run,
    }) = patches.last_mut()
    {
        if *start + run.chars().count() == index {
            run.push_str(chars);
            return;
        }
    }
    patches.push(Patch::SpliceText {
        index,
        text: chars.to_string(),
    });
}

fn push_delete(patches: &mut Vec<Patch>, index: usize, text: bool) {
    if !text {
        patches.push(Patch::DeleteSeq { index });
        return;
    }

    if let Some(Patch::DeleteText { index: start, len }) = patches.last_mut() {
        if *start == index {
            *len += 1;
            return;
        }
    }
    patches.push(Patch::DeleteText { index, len: 1 });
}
