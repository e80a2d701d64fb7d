//! Defines the fundamental unit of history (`Change`) and the operations it carries.
//!
//! A `Change` is an immutable, content-addressed batch of operations made by
//! one actor in one transaction. Its hash covers every field, so two replicas
//! that build the same change independently (same actor, sequence number,
//! timestamp, dependencies and operations) agree on its identity. Seed
//! documents rely on this to share a common ancestor without coordination.

pub mod builder;
pub mod errors;
pub mod op;


pub use builder::ChangeBuilder;
pub use errors::ChangeError;
pub use op::{Op, OpAction};

use serde::{Deserialize, Serialize};

use crate::{
    clock::format_millis,
    types::{ActorId, ChangeHash, OpId},
};

/// The fields covered by a change hash, borrowed from the change itself.
#[derive(Serialize)]
struct HashedFields<'a> {
    actor: &'a ActorId,
    seq: u64,
    start_op: u64,
    time: u64,
    #[serde(skip_serializing_if = "no_message")]
    message: &'a Option<String>,
    deps: &'a [ChangeHash],
    ops: &'a [Op],
}

fn no_message(message: &&Option<String>) -> bool {
    message.is_none()
}

impl HashedFields<'_> {
    fn hash(&self) -> Result<ChangeHash, ChangeError> {
        let bytes =
            serde_ipld_dagcbor::to_vec(self).map_err(|e| ChangeError::EncodingFailed {
                reason: e.to_string(),
            })?;
        Ok(ChangeHash::digest(&bytes))
    }
}

/// Sequence numbers and operation counters start at 1, and the counter after
/// the last operation must still be representable so the log can continue.
fn check_counters(seq: u64, start_op: u64, ops: usize) -> Result<(), ChangeError> {
    if seq == 0 {
        return Err(ChangeError::InvalidStructure {
            reason: "sequence numbers start at 1".to_string(),
        });
    }
    if start_op == 0 {
        return Err(ChangeError::InvalidStructure {
            reason: "operation counters start at 1".to_string(),
        });
    }
    if start_op.checked_add(ops as u64).is_none() {
        return Err(ChangeError::InvalidStructure {
            reason: format!("operation counters overflow: start {start_op}, {ops} operations"),
        });
    }
    Ok(())
}

/// An immutable, hash-addressed batch of operations.
///
/// # Identity
///
/// - `actor` + `seq` name the change within its author's history.
/// - `start_op` is the Lamport counter of the first operation; operation `i`
///   has ID `(start_op + i, actor)`.
/// - `hash` is SHA-256 over the canonical encoding of all other fields.
///
/// # Example
///
/// ```
/// use amalgam::{ActorId, Change, Op, OpAction, ROOT};
///
/// let change = Change::builder(ActorId::seed(), 1, 1)
///     .time(0)
///     .op(Op::map(ROOT, "title", OpAction::Set("hello".into()), vec![]))
///     .build()
///     .unwrap();
///
/// let again = Change::builder(ActorId::seed(), 1, 1)
///     .time(0)
///     .op(Op::map(ROOT, "title", OpAction::Set("hello".into()), vec![]))
///     .build()
///     .unwrap();
///
/// assert_eq!(change.hash(), again.hash());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    actor: ActorId,
    seq: u64,
    start_op: u64,
    time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    /// Sorted and deduplicated by the builder.
    deps: Vec<ChangeHash>,
    ops: Vec<Op>,
    hash: ChangeHash,
}

impl Change {
    /// Creates a new `ChangeBuilder`.
    ///
    /// # Arguments
    /// * `actor` - The author of the change.
    /// * `seq` - The author's sequence number for this change, starting at 1.
    /// * `start_op` - The Lamport counter of the first operation.
    pub fn builder(actor: ActorId, seq: u64, start_op: u64) -> ChangeBuilder {
        ChangeBuilder::new(actor, seq, start_op)
    }

    /// The content hash of this change.
    pub fn hash(&self) -> ChangeHash {
        self.hash
    }

    /// The author of this change.
    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    /// The author's sequence number for this change.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The Lamport counter of the first operation.
    pub fn start_op(&self) -> u64 {
        self.start_op
    }

    /// The Lamport counter of the last operation, or `start_op - 1` if the
    /// change carries no operations.
    pub fn max_op(&self) -> u64 {
        self.start_op
            .saturating_add(self.ops.len() as u64)
            .saturating_sub(1)
    }

    /// Wall-clock timestamp in milliseconds since the Unix epoch.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Wall-clock timestamp rendered as RFC3339.
    pub fn time_rfc3339(&self) -> String {
        format_millis(self.time)
    }

    /// Optional commit message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Hashes of the changes this one depends on, sorted.
    pub fn deps(&self) -> &[ChangeHash] {
        &self.deps
    }

    /// The operations of this change, in application order.
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if the change carries no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterates the operations together with their derived IDs.
    pub fn iter_ops(&self) -> impl Iterator<Item = (OpId, &Op)> + '_ {
        self.ops
            .iter()
            .enumerate()
            .map(|(i, op)| {
                let counter = self.start_op.saturating_add(i as u64);
                (OpId::new(counter, self.actor.clone()), op)
            })
    }

    /// Checks the counters of a change that was decoded rather than built.
    ///
    /// # Errors
    /// `InvalidStructure` if `seq` or `start_op` is zero, or if the
    /// operation counters do not fit below `u64::MAX`.
    pub fn validate(&self) -> Result<(), ChangeError> {
        check_counters(self.seq, self.start_op, self.ops.len())
    }

    /// Recomputes the hash from the fields and compares it to the stored one.
    ///
    /// Used when changes arrive from outside the process, e.g. when loading
    /// persisted bytes.
    pub fn verify_hash(&self) -> Result<(), ChangeError> {
        let computed = self.fields().hash()?;
        if computed != self.hash {
            return Err(ChangeError::HashMismatch {
                stored: self.hash,
                computed,
            });
        }
        Ok(())
    }

    /// Replace the counters and recompute the hash without validating them.
    ///
    /// Stands in for changes crafted outside this crate, which reach
    /// `apply_changes` and `load` without passing through the builder.
    #[cfg(any(test, feature = "testing"))]
    #[doc(hidden)]
    pub fn reseal_unchecked(mut self, seq: u64, start_op: u64) -> Result<Change, ChangeError> {
        self.seq = seq;
        self.start_op = start_op;
        self.hash = self.fields().hash()?;
        Ok(self)
    }

    fn fields(&self) -> HashedFields<'_> {
        HashedFields {
            actor: &self.actor,
            seq: self.seq,
            start_op: self.start_op,
            time: self.time,
            message: &self.message,
            deps: &self.deps,
            ops: &self.ops,
        }
    }
}
