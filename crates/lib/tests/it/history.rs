//! Change construction and change log behavior through the public API

use amalgam::{
    ActorId, Change, ChangeHash, Op, OpAction, ROOT, ReadDoc, ScalarValue,
    log::{ChangeLog, LogError, canonical_order},
};

use crate::helpers::*;

fn set(key: &str, value: i64) -> Op {
    Op::map(ROOT, key, OpAction::Set(ScalarValue::Int(value)), vec![])
}

#[test]
fn test_frozen_ancestor_hashes_match_across_instances() {
    let build = |log: &ChangeLog| {
        log.create_change(&ActorId::seed(), vec![], vec![set("version", 1)], 0, None)
            .unwrap()
    };
    let first = build(&ChangeLog::new());
    let second = build(&ChangeLog::new());
    assert_eq!(first.hash(), second.hash());
    assert_eq!(first.seq(), 1);
    assert_eq!(first.start_op(), 1);

    // Any difference in the fields changes the hash
    let other = ChangeLog::new()
        .create_change(&ActorId::seed(), vec![], vec![set("version", 2)], 0, None)
        .unwrap();
    assert_ne!(first.hash(), other.hash());
}

#[test]
fn test_documents_record_lamport_counters() {
    let a = fixed_doc(1, 0).change(|tx| tx.put(&ROOT, "x", 1i64)).unwrap();
    let b = fixed_doc(2, 0)
        .merge(&a)
        .unwrap()
        .change(|tx| {
            tx.put(&ROOT, "y", 2i64)?;
            tx.put(&ROOT, "z", 3i64)
        })
        .unwrap();

    let last = b.get_last_local_change().unwrap();
    assert_eq!(last.seq(), 1);
    assert_eq!(last.start_op(), 2);
    assert_eq!(last.max_op(), 3);
    assert_eq!(last.deps(), &a.heads()[..]);

    let ids: Vec<u64> = last.iter_ops().map(|(id, _)| id.counter()).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn test_log_rejects_out_of_order_input() {
    let (doc, items) = list_doc();
    let doc = push(&doc, &items, "a");
    let doc = push(&doc, &items, "b");
    let changes = doc.get_changes();

    let mut log = ChangeLog::new();
    let err = log.append(changes[1].clone()).unwrap_err();
    assert!(err.is_unknown_dependency());
    assert_eq!(err.missing_dependency(), Some(changes[0].hash()));
    assert!(log.is_empty());

    // Same actor, next seq expected to be 1
    let skipped = Change::builder(doc.actor().clone(), 2, 1).build().unwrap();
    let err = log.append(skipped).unwrap_err();
    assert!(matches!(
        err,
        LogError::ActorSequenceGap {
            expected: 1,
            found: 2,
            ..
        }
    ));
}

#[test]
fn test_log_queries() {
    let (doc, items) = list_doc();
    let fork = doc.fork();
    let left = push(&doc, &items, "left");
    let right = push(&fork, &items, "right");
    let merged = left.merge(&right).unwrap();
    let log = merged.log();

    assert_eq!(log.len(), 3);
    assert_eq!(log.heads().len(), 2);
    assert_eq!(log.roots(), doc.heads());
    assert_eq!(log.actors().len(), 2);
    assert_eq!(log.seq_of(left.actor()), 2);
    assert_eq!(log.seq_of(right.actor()), 1);
    assert!(log.change_by(right.actor(), 1).is_some());
    assert!(log.change_by(right.actor(), 2).is_none());

    let since_left: Vec<ChangeHash> = log
        .changes_since(&left.heads())
        .iter()
        .map(|c| c.hash())
        .collect();
    assert_eq!(since_left, vec![right.get_last_local_change().unwrap().hash()]);

    let ancestors = log.ancestors(left.heads());
    assert_eq!(ancestors.len(), 2);
    assert!(log.shares_history_with(doc.log()));
}

#[test]
fn test_canonical_order_is_input_independent() {
    let (docs, items) = replicas(3);
    let edited: Vec<_> = docs
        .iter()
        .enumerate()
        .map(|(i, doc)| push(doc, &items, &format!("from {i}")))
        .collect();
    let merged = edited
        .iter()
        .skip(1)
        .fold(edited[0].clone(), |acc, doc| acc.merge(doc).unwrap());

    let changes = merged.get_changes();
    let expected: Vec<ChangeHash> = canonical_order(changes.iter().cloned())
        .iter()
        .map(|c| c.hash())
        .collect();

    let mut rng = rng(7);
    for _ in 0..10 {
        let shuffled = random_causal_order(&changes, &mut rng);
        let order: Vec<ChangeHash> = canonical_order(shuffled).iter().map(|c| c.hash()).collect();
        assert_eq!(order, expected);
    }

    // Concurrent changes are ordered by start op, then actor
    let concurrent: Vec<_> = canonical_order(changes).into_iter().skip(1).collect();
    assert!(concurrent.windows(2).all(|w| w[0].actor() < w[1].actor()));
    assert_eq!(merged.length(&items).unwrap(), 3);
}

#[test]
fn test_change_json_shape() {
    let (doc, _) = list_doc();
    let change = doc.get_last_local_change().unwrap();
    let json = serde_json::to_value(change).unwrap();
    assert_eq!(json["seq"], 1);
    assert_eq!(json["start_op"], 1);
    assert_eq!(json["actor"], change.actor().to_string());
    assert_eq!(json["hash"], change.hash().to_string());
}
