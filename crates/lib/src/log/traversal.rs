//! DAG traversal over change histories.
//!
//! Changes link to their dependencies by hash, forming a DAG. This module
//! provides the deterministic topological order used for replay and
//! persistence, and ancestor/root queries used by sync and merge.

use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    sync::Arc,
};

use tracing::warn;

use crate::{
    change::Change,
    types::{ActorId, ChangeHash},
};

/// Tie-break key among changes whose dependencies are all satisfied.
///
/// Lower logical timestamps replay first; actor, sequence number and finally
/// hash make the order total.
type OrderKey = (u64, ActorId, u64, ChangeHash);

fn order_key(change: &Change) -> OrderKey {
    (
        change.start_op(),
        change.actor().clone(),
        change.seq(),
        change.hash(),
    )
}

/// Sort changes into the canonical topological order.
///
/// Kahn's algorithm: a change becomes ready once every dependency that is
/// part of `changes` has been emitted. Dependencies outside the batch are
/// treated as already satisfied, so the function also orders incremental
/// batches. Among ready changes the smallest `(start_op, actor, seq, hash)`
/// goes first. Duplicates (same hash) are emitted once.
///
/// The result depends only on the set of changes, never on input order.
pub fn canonical_order<I>(changes: I) -> Vec<Arc<Change>>
where
    I: IntoIterator<Item = Arc<Change>>,
{
    let mut by_hash: HashMap<ChangeHash, Arc<Change>> = HashMap::new();
    for change in changes {
        by_hash.entry(change.hash()).or_insert(change);
    }

    // Dependents and in-batch indegree per change
    let mut dependents: HashMap<ChangeHash, Vec<ChangeHash>> = HashMap::new();
    let mut pending: HashMap<ChangeHash, usize> = HashMap::new();
    for (hash, change) in &by_hash {
        let inside = change
            .deps()
            .iter()
            .filter(|dep| by_hash.contains_key(*dep))
            .inspect(|dep| dependents.entry(**dep).or_default().push(*hash))
            .count();
        pending.insert(*hash, inside);
    }

    let mut ready: BTreeMap<OrderKey, ChangeHash> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(hash, _)| (order_key(&by_hash[hash]), *hash))
        .collect();

    let mut ordered = Vec::with_capacity(by_hash.len());
    while let Some((_, hash)) = ready.pop_first() {
        for dependent in dependents.get(&hash).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(order_key(&by_hash[dependent]), *dependent);
                }
            }
        }
        pending.remove(&hash);
        if let Some(change) = by_hash.remove(&hash) {
            ordered.push(change);
        }
    }

    // Only reachable with forged hashes: a cycle can never be built honestly.
    if !by_hash.is_empty() {
        warn!(
            remaining = by_hash.len(),
            "Cycle detected among changes, appending remainder in key order"
        );
        let mut rest: Vec<_> = by_hash.into_values().collect();
        rest.sort_by_key(|change| order_key(change));
        ordered.extend(rest);
    }

    ordered
}

/// Collect `start` and every change reachable from it through dependencies.
///
/// Hashes unknown to `lookup` are skipped.
pub fn ancestors<'a, F>(
    start: impl IntoIterator<Item = ChangeHash>,
    lookup: F,
) -> HashSet<ChangeHash>
where
    F: Fn(&ChangeHash) -> Option<&'a Change>,
{
    let mut seen = HashSet::new();
    let mut queue: VecDeque<ChangeHash> = start.into_iter().collect();

    while let Some(hash) = queue.pop_front() {
        if seen.contains(&hash) {
            continue;
        }
        let Some(change) = lookup(&hash) else {
            continue;
        };
        seen.insert(hash);
        queue.extend(change.deps().iter().copied().filter(|dep| !seen.contains(dep)));
    }

    seen
}

/// Hashes of the changes in `changes` that have no dependencies, sorted.
pub fn roots<'a>(changes: impl IntoIterator<Item = &'a Change>) -> Vec<ChangeHash> {
    let mut roots: Vec<ChangeHash> = changes
        .into_iter()
        .filter(|change| change.deps().is_empty())
        .map(|change| change.hash())
        .collect();
    roots.sort();
    roots
}
