//! The append-only, causally ordered history of a document.
//!
//! A [`ChangeLog`] holds every [`Change`] a document has seen, keyed by hash,
//! together with the bookkeeping needed to extend it: the current heads, the
//! per-actor sequence index and the highest Lamport counter in use.
//!
//! Changes from one actor are totally ordered by `seq`. Changes from
//! different actors are only partially ordered, through their dependencies.

pub mod errors;
pub mod traversal;

pub use errors::LogError;
pub use traversal::canonical_order;

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use tracing::{debug, trace};

use crate::{
    Result,
    change::{Change, ChangeError, Op},
    types::{ActorId, ChangeHash},
};

/// Append-only store of changes with heads and per-actor indexes.
///
/// Changes are kept in application order: every change comes after all of
/// its dependencies. Changes are shared through `Arc`, so cloning a log
/// copies only pointers.
#[derive(Clone, Debug, Default)]
pub struct ChangeLog {
    changes: Vec<Arc<Change>>,
    index: HashMap<ChangeHash, usize>,
    heads: BTreeSet<ChangeHash>,
    /// Positions in `changes`, indexed by `seq - 1`
    actors: HashMap<ActorId, Vec<usize>>,
    max_op: u64,
}

impl ChangeLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a log by appending `changes` in the given order.
    pub fn from_changes<I>(changes: I) -> std::result::Result<Self, LogError>
    where
        I: IntoIterator<Item = Arc<Change>>,
    {
        let mut log = Self::new();
        for change in changes {
            log.append(change)?;
        }
        Ok(log)
    }

    /// Build the next change for `actor` on top of this log, without
    /// appending it.
    ///
    /// The sequence number continues the actor's history and the first
    /// operation gets the counter after the highest one in the log.
    ///
    /// # Errors
    /// - `UnknownDependency` if a dependency is not in the log
    /// - `ChangeError` if the change cannot be encoded
    pub fn create_change(
        &self,
        actor: &ActorId,
        deps: Vec<ChangeHash>,
        ops: Vec<Op>,
        time: u64,
        message: Option<String>,
    ) -> Result<Change> {
        let seq = self.seq_of(actor) + 1;
        let start_op = self.max_op + 1;

        let change = Change::builder(actor.clone(), seq, start_op)
            .time(time)
            .maybe_message(message)
            .deps(deps)
            .ops(ops)
            .build()?;

        self.check_dependencies(&change)?;
        Ok(change)
    }

    /// Append a change.
    ///
    /// Returns `Ok(false)` without modifying the log if a change with the
    /// same hash is already present.
    ///
    /// # Errors
    /// - `UnknownDependency` if a dependency is not in the log
    /// - `ActorSequenceGap` if the sequence number is not the actor's next
    /// - `InvalidChange` if the operation counters overflow or do not
    ///   exceed the counters of every dependency
    pub fn append(&mut self, change: impl Into<Arc<Change>>) -> std::result::Result<bool, LogError> {
        let change = change.into();
        let hash = change.hash();

        if self.index.contains_key(&hash) {
            trace!(change = %hash, "Skipping duplicate change");
            return Ok(false);
        }

        change.validate()?;
        self.check_dependencies(&change)?;

        let expected = self.seq_of(change.actor()) + 1;
        if change.seq() != expected {
            return Err(LogError::ActorSequenceGap {
                actor: change.actor().clone(),
                expected,
                found: change.seq(),
            });
        }
        self.check_lamport(&change)?;

        let position = self.changes.len();
        for dep in change.deps() {
            self.heads.remove(dep);
        }
        self.heads.insert(hash);
        self.index.insert(hash, position);
        self.actors
            .entry(change.actor().clone())
            .or_default()
            .push(position);
        self.max_op = self.max_op.max(change.max_op());

        debug!(
            change = %hash,
            actor = %change.actor(),
            seq = change.seq(),
            ops = change.len(),
            "Appended change"
        );

        self.changes.push(change);
        Ok(true)
    }

    fn check_dependencies(&self, change: &Change) -> std::result::Result<(), LogError> {
        match change.deps().iter().find(|dep| !self.index.contains_key(*dep)) {
            Some(missing) => Err(LogError::UnknownDependency {
                change: change.hash(),
                dependency: *missing,
            }),
            None => Ok(()),
        }
    }

    // Op ids order causally: every counter must exceed those of the deps.
    fn check_lamport(&self, change: &Change) -> std::result::Result<(), LogError> {
        let floor = change
            .deps()
            .iter()
            .filter_map(|dep| self.get(dep))
            .map(Change::max_op)
            .max()
            .unwrap_or(0);
        if change.start_op() <= floor {
            return Err(ChangeError::InvalidStructure {
                reason: format!(
                    "start_op {} does not exceed dependency max_op {floor}",
                    change.start_op()
                ),
            }
            .into());
        }
        Ok(())
    }

    /// Look up a change by hash.
    pub fn get(&self, hash: &ChangeHash) -> Option<&Change> {
        self.get_shared(hash).map(|change| &**change)
    }

    /// Look up a change by hash, returning the shared handle.
    pub fn get_shared(&self, hash: &ChangeHash) -> Option<&Arc<Change>> {
        self.index.get(hash).map(|&position| &self.changes[position])
    }

    /// Returns true if the log contains the change.
    pub fn contains(&self, hash: &ChangeHash) -> bool {
        self.index.contains_key(hash)
    }

    /// Hashes of the changes no other change depends on, sorted.
    pub fn heads(&self) -> Vec<ChangeHash> {
        self.heads.iter().copied().collect()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns true if the log holds no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Highest Lamport counter used by any operation in the log.
    pub fn max_op(&self) -> u64 {
        self.max_op
    }

    /// All changes in application order.
    pub fn changes(&self) -> &[Arc<Change>] {
        &self.changes
    }

    /// Changes that are not ancestors of `heads`, in application order.
    ///
    /// Hashes in `heads` the log does not know are ignored, so a peer that is
    /// ahead of us receives everything we have that it might lack.
    pub fn changes_since(&self, heads: &[ChangeHash]) -> Vec<Arc<Change>> {
        let known = self.ancestors(heads.iter().copied());
        self.changes
            .iter()
            .filter(|change| !known.contains(&change.hash()))
            .cloned()
            .collect()
    }

    /// The change with sequence number `seq` by `actor`.
    pub fn change_by(&self, actor: &ActorId, seq: u64) -> Option<&Change> {
        let index = usize::try_from(seq.checked_sub(1)?).ok()?;
        let position = *self.actors.get(actor)?.get(index)?;
        Some(&self.changes[position])
    }

    /// The most recent change by `actor`.
    pub fn last_change_by(&self, actor: &ActorId) -> Option<&Change> {
        let position = *self.actors.get(actor)?.last()?;
        Some(&self.changes[position])
    }

    /// Highest sequence number of `actor`, or 0 if it has no changes.
    pub fn seq_of(&self, actor: &ActorId) -> u64 {
        self.actors.get(actor).map_or(0, |positions| positions.len() as u64)
    }

    /// Every actor that authored a change, sorted.
    pub fn actors(&self) -> Vec<ActorId> {
        let mut actors: Vec<_> = self.actors.keys().cloned().collect();
        actors.sort();
        actors
    }

    /// The given changes and all of their transitive dependencies.
    pub fn ancestors(&self, hashes: impl IntoIterator<Item = ChangeHash>) -> HashSet<ChangeHash> {
        traversal::ancestors(hashes, |hash| self.get(hash))
    }

    /// Hashes of the changes with no dependencies, sorted.
    pub fn roots(&self) -> Vec<ChangeHash> {
        traversal::roots(self.changes.iter().map(|change| &**change))
    }

    /// Returns true if both logs contain at least one common change.
    ///
    /// Every change descends from a root, so two histories intersect exactly
    /// when they share a root.
    pub fn shares_history_with(&self, other: &ChangeLog) -> bool {
        self.roots().iter().any(|root| other.contains(root))
    }
}
