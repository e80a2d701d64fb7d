//! Ordered sequences for list and text objects.
//!
//! Elements are kept in RGA order and never removed: deleting an element
//! empties its register and leaves a tombstone, so element IDs used as
//! insertion anchors by concurrent edits stay resolvable.

use super::register::Register;
use crate::types::{ElemId, OpId, Value};

/// One slot of a sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    id: OpId,
    register: Register,
}

impl Element {
    /// The ID of the operation that inserted this element.
    pub fn id(&self) -> &OpId {
        &self.id
    }

    /// The winning value, or `None` for a tombstone.
    pub fn value(&self) -> Option<&Value> {
        self.register.value()
    }

    /// All concurrent values of this element.
    pub fn register(&self) -> &Register {
        &self.register
    }

    /// Returns true unless the element has been deleted.
    pub fn is_visible(&self) -> bool {
        !self.register.is_empty()
    }
}

/// Sequence of elements, including tombstones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeqObject {
    elements: Vec<Element>,
}

impl SeqObject {
    /// Number of visible elements.
    pub fn len(&self) -> usize {
        self.elements.iter().filter(|e| e.is_visible()).count()
    }

    /// Returns true if there are no visible elements.
    pub fn is_empty(&self) -> bool {
        !self.elements.iter().any(Element::is_visible)
    }

    /// Every element in order, tombstones included.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Visible elements in order.
    pub fn visible(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.is_visible())
    }

    /// The visible element at `index`.
    pub fn element_at(&self, index: usize) -> Option<&Element> {
        self.visible().nth(index)
    }

    /// The winning value of the visible element at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.element_at(index).and_then(Element::value)
    }

    /// Position of the element inserted by `id`, tombstones included.
    pub fn position_of(&self, id: &OpId) -> Option<usize> {
        self.elements.iter().position(|e| &e.id == id)
    }

    /// The insertion anchor for a new element at visible `index`.
    ///
    /// Returns `None` if `index` is past the end.
    pub fn anchor_for(&self, index: usize) -> Option<ElemId> {
        if index == 0 {
            return Some(ElemId::Head);
        }
        self.element_at(index - 1).map(|e| ElemId::Op(e.id.clone()))
    }

    /// Insert a new element after `anchor`.
    ///
    /// Starting right after the anchor, elements with a greater ID than the
    /// new one are skipped: they were inserted concurrently at the same spot
    /// (or after such an element) and win the position. Returns `false` if
    /// the anchor is unknown.
    pub(crate) fn insert(&mut self, anchor: &ElemId, id: OpId, value: Value) -> bool {
        let mut position = match anchor {
            ElemId::Head => 0,
            ElemId::Op(anchor) => match self.position_of(anchor) {
                Some(position) => position + 1,
                None => return false,
            },
        };

        while position < self.elements.len() && self.elements[position].id > id {
            position += 1;
        }

        let mut register = Register::default();
        register.put(id.clone(), value, &[]);
        self.elements.insert(position, Element { id, register });
        true
    }

    pub(crate) fn register_mut(&mut self, elem: &OpId) -> Option<&mut Register> {
        self.elements
            .iter_mut()
            .find(|e| &e.id == elem)
            .map(|e| &mut e.register)
    }
}
