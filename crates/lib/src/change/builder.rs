//! Builder for creating Change instances.

use super::{Change, ChangeError, HashedFields, Op, check_counters};
use crate::types::{ActorId, ChangeHash};

/// A builder for creating `Change` instances.
///
/// `ChangeBuilder` collects the fields of a change. `build()` sorts and
/// deduplicates the dependencies, validates the structure and computes the
/// hash, producing an immutable `Change`.
///
/// The builder supports two construction patterns:
/// 1. Ownership chaining: each method returns `self`.
/// 2. Mutable reference: methods ending in `_mut` modify the builder in place.
///
/// ```
/// use amalgam::{ActorId, Change, Op, OpAction, ROOT};
///
/// let actor = ActorId::random();
/// let first = Change::builder(actor.clone(), 1, 1)
///     .time(1000)
///     .op(Op::map(ROOT, "a", OpAction::Set(1i64.into()), vec![]))
///     .build()
///     .unwrap();
///
/// let mut builder = Change::builder(actor, 2, 2);
/// builder.add_dep_mut(first.hash());
/// builder.add_op_mut(Op::map(ROOT, "b", OpAction::Set(2i64.into()), vec![]));
/// let second = builder.time(1001).message("second").build().unwrap();
///
/// assert_eq!(second.deps(), &[first.hash()]);
/// assert_eq!(second.message(), Some("second"));
/// ```
#[derive(Clone, Debug)]
pub struct ChangeBuilder {
    actor: ActorId,
    seq: u64,
    start_op: u64,
    time: u64,
    message: Option<String>,
    deps: Vec<ChangeHash>,
    ops: Vec<Op>,
}

impl ChangeBuilder {
    /// Creates a new builder.
    ///
    /// Note: It's generally preferred to use `Change::builder()`.
    pub fn new(actor: ActorId, seq: u64, start_op: u64) -> Self {
        Self {
            actor,
            seq,
            start_op,
            time: 0,
            message: None,
            deps: Vec::new(),
            ops: Vec::new(),
        }
    }

    /// Set the wall-clock timestamp in milliseconds.
    pub fn time(mut self, millis: u64) -> Self {
        self.time = millis;
        self
    }

    /// Set the commit message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set an optional commit message.
    pub fn maybe_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    /// Replace the dependency set.
    pub fn deps(mut self, deps: impl IntoIterator<Item = ChangeHash>) -> Self {
        self.deps = deps.into_iter().collect();
        self
    }

    /// Add one dependency.
    pub fn add_dep(mut self, dep: ChangeHash) -> Self {
        self.deps.push(dep);
        self
    }

    /// Mutable reference version of add_dep.
    pub fn add_dep_mut(&mut self, dep: ChangeHash) -> &mut Self {
        self.deps.push(dep);
        self
    }

    /// Append one operation.
    pub fn op(mut self, op: Op) -> Self {
        self.ops.push(op);
        self
    }

    /// Mutable reference version of op.
    pub fn add_op_mut(&mut self, op: Op) -> &mut Self {
        self.ops.push(op);
        self
    }

    /// Replace the operation list.
    pub fn ops(mut self, ops: Vec<Op>) -> Self {
        self.ops = ops;
        self
    }

    /// Finalize the change and compute its hash.
    ///
    /// # Errors
    /// - `InvalidStructure` if `seq` or `start_op` is zero, or the operation
    ///   counters overflow.
    /// - `EncodingFailed` if an operation carries a value with no canonical
    ///   encoding (e.g. a NaN float).
    pub fn build(mut self) -> Result<Change, ChangeError> {
        check_counters(self.seq, self.start_op, self.ops.len())?;

        self.deps.sort();
        self.deps.dedup();

        let hash = HashedFields {
            actor: &self.actor,
            seq: self.seq,
            start_op: self.start_op,
            time: self.time,
            message: &self.message,
            deps: &self.deps,
            ops: &self.ops,
        }
        .hash()?;

        Ok(Change {
            actor: self.actor,
            seq: self.seq,
            start_op: self.start_op,
            time: self.time,
            message: self.message,
            deps: self.deps,
            ops: self.ops,
            hash,
        })
    }
}
