//! Merging two change histories into one.
//!
//! A merge takes the union of both change logs, orders it canonically and
//! rebuilds the document store by replaying it from empty. The result depends
//! only on the set of changes, which makes merge commutative, associative and
//! idempotent.
//!
//! Conflict policy is entirely in the store: map writes keep every concurrent
//! value and elect the greatest operation ID, list and text inserts keep
//! their position relative to stable element IDs, and counter increments
//! are summed.

pub mod errors;

pub use errors::MergeError;

use std::{collections::BTreeSet, sync::Arc};

use tracing::debug;

use crate::{
    Result,
    change::Change,
    log::{ChangeLog, canonical_order},
    store::{Store, StoreError, Touched},
};

/// Outcome of a merge.
#[derive(Clone, Debug)]
pub struct Merged {
    /// The union history, in canonical order
    pub log: ChangeLog,
    /// The store rebuilt from `log`
    pub store: Store,
    /// Changes from the other side that were not in ours, in canonical order
    pub new_changes: Vec<Arc<Change>>,
    /// Objects modified by `new_changes`
    pub touched: Touched,
}

/// Union two histories.
///
/// An empty history is compatible with any other. Two non-empty histories
/// must share at least one change.
///
/// # Errors
/// - `DisjointHistory` if the histories share nothing
pub fn merge_histories(ours: &ChangeLog, theirs: &ChangeLog) -> Result<ChangeLog> {
    check_shared_history(ours, theirs)?;

    let union = canonical_order(
        ours.changes()
            .iter()
            .chain(theirs.changes().iter())
            .cloned(),
    );
    Ok(ChangeLog::from_changes(union)?)
}

/// Replay a history from an empty store in canonical order.
pub fn rebuild(log: &ChangeLog) -> std::result::Result<Store, StoreError> {
    let ordered = canonical_order(log.changes().iter().cloned());
    Store::from_changes(ordered.iter().map(|change| &**change))
}

/// Merge `theirs` into `ours`, producing the unified history and store.
///
/// Neither input is modified; on error nothing is produced.
pub fn merge(ours: &ChangeLog, theirs: &ChangeLog) -> Result<Merged> {
    let log = merge_histories(ours, theirs)?;
    let store = rebuild(&log)?;

    let new_changes: Vec<Arc<Change>> = log
        .changes()
        .iter()
        .filter(|change| !ours.contains(&change.hash()))
        .cloned()
        .collect();
    let touched: Touched = new_changes
        .iter()
        .flat_map(|change| change.ops().iter().map(|op| op.obj.clone()))
        .collect::<BTreeSet<_>>();

    debug!(
        ours = ours.len(),
        theirs = theirs.len(),
        merged = log.len(),
        new = new_changes.len(),
        "Merged histories"
    );

    Ok(Merged {
        log,
        store,
        new_changes,
        touched,
    })
}

fn check_shared_history(ours: &ChangeLog, theirs: &ChangeLog) -> Result<()> {
    if ours.is_empty() || theirs.is_empty() || ours.shares_history_with(theirs) {
        return Ok(());
    }
    Err(MergeError::DisjointHistory {
        ours: ours.roots(),
        theirs: theirs.roots(),
    }
    .into())
}
