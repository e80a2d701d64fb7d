//! Operation, object and element identifiers.
//!
//! Every operation is named by an [`OpId`]: a Lamport counter paired with the
//! actor that produced it. Objects and sequence elements reuse the ID of the
//! operation that created them, so their identity never depends on where they
//! sit in the document tree.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{actor::ActorId, errors::IdError};

/// Identifier of a single operation: `(counter, actor)`.
///
/// Ordering is by counter first, then actor. This is the total order used to
/// pick the winner among concurrent writes: the greatest `OpId` wins.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OpId {
    counter: u64,
    actor: ActorId,
}

impl OpId {
    /// Creates a new operation ID.
    pub fn new(counter: u64, actor: ActorId) -> Self {
        Self { counter, actor }
    }

    /// The Lamport counter of this operation.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// The actor that produced this operation.
    pub fn actor(&self) -> &ActorId {
        &self.actor
    }
}

impl Ord for OpId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.counter
            .cmp(&other.counter)
            .then_with(|| self.actor.cmp(&other.actor))
    }
}

impl PartialOrd for OpId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.counter, self.actor)
    }
}

impl fmt::Debug for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.counter, self.actor.short())
    }
}

impl FromStr for OpId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (counter, actor) = s
            .split_once('@')
            .ok_or_else(|| IdError::InvalidOpId(s.to_string()))?;
        let counter = counter
            .parse()
            .map_err(|_| IdError::InvalidOpId(s.to_string()))?;
        Ok(Self::new(counter, actor.parse()?))
    }
}

// Encoded as a `(counter, actor)` pair to keep persisted operations compact.
impl Serialize for OpId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.counter, &self.actor).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OpId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (counter, actor) = <(u64, ActorId)>::deserialize(deserializer)?;
        Ok(Self { counter, actor })
    }
}

/// Identifier of a map, list or text object.
///
/// The root map is [`ObjId::Root`]; every other object is identified by the
/// operation that created it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjId {
    /// The document's root map
    Root,
    /// An object created by the `Make` operation with this ID
    Op(OpId),
}

impl ObjId {
    /// Returns true for the root object.
    pub fn is_root(&self) -> bool {
        matches!(self, ObjId::Root)
    }

    /// Returns the creating operation, if this is not the root.
    pub fn op_id(&self) -> Option<&OpId> {
        match self {
            ObjId::Root => None,
            ObjId::Op(id) => Some(id),
        }
    }
}

impl From<OpId> for ObjId {
    fn from(id: OpId) -> Self {
        ObjId::Op(id)
    }
}

impl From<&ObjId> for ObjId {
    fn from(id: &ObjId) -> Self {
        id.clone()
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjId::Root => write!(f, "_root"),
            ObjId::Op(id) => write!(f, "{id}"),
        }
    }
}

impl fmt::Debug for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjId::Root => write!(f, "_root"),
            ObjId::Op(id) => write!(f, "{id:?}"),
        }
    }
}

impl FromStr for ObjId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "_root" {
            Ok(ObjId::Root)
        } else {
            Ok(ObjId::Op(s.parse()?))
        }
    }
}

/// Stable reference to a position in a list or text object.
///
/// `Head` refers to the position before the first element; every other
/// element is named by the operation that inserted it. Element IDs stay valid
/// under concurrent inserts and after the element is deleted.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElemId {
    /// Before the first element
    Head,
    /// The element inserted by this operation
    Op(OpId),
}

impl fmt::Debug for ElemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElemId::Head => write!(f, "_head"),
            ElemId::Op(id) => write!(f, "{id:?}"),
        }
    }
}

/// What an operation addresses inside its target object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// A property of a map
    Map(String),
    /// An element of a list or text (or the insertion anchor for inserts)
    Seq(ElemId),
}

/// A user-facing property: a map key or a visible list index.
///
/// Transactions translate indexes into stable [`ElemId`]s before recording
/// operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Prop {
    /// Map key
    Map(String),
    /// Index among the visible elements of a list or text
    Seq(usize),
}

impl fmt::Display for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::Map(key) => write!(f, "{key}"),
            Prop::Seq(index) => write!(f, "[{index}]"),
        }
    }
}

impl From<&str> for Prop {
    fn from(key: &str) -> Self {
        Prop::Map(key.to_string())
    }
}

impl From<String> for Prop {
    fn from(key: String) -> Self {
        Prop::Map(key)
    }
}

impl From<&String> for Prop {
    fn from(key: &String) -> Self {
        Prop::Map(key.clone())
    }
}

impl From<usize> for Prop {
    fn from(index: usize) -> Self {
        Prop::Seq(index)
    }
}
