//! Merging replicas and exchanging changes

use amalgam::{ActorId, Document, ObjType, ROOT, ReadDoc, ScalarValue, Value, merge};

use crate::helpers::*;

#[test]
fn test_merge_is_commutative() {
    let (docs, items) = replicas(2);
    let a = push(&docs[0], &items, "apples");
    let a = a.change(|tx| tx.put(&ROOT, "owner", "ann")).unwrap();
    let b = push(&docs[1], &items, "bananas");
    let b = b.change(|tx| tx.put(&ROOT, "owner", "ben")).unwrap();

    let ab = a.merge(&b).unwrap();
    let ba = b.merge(&a).unwrap();
    assert_eq!(ab, ba);
    assert_eq!(ab.to_json().unwrap(), ba.to_json().unwrap());
    assert_eq!(ab.save().unwrap(), ba.save().unwrap());

    // Concurrent inserts at the same position land in the same order
    assert_eq!(ab.length(&items).unwrap(), 2);
    assert_eq!(ab.values(&items).unwrap(), ba.values(&items).unwrap());
}

#[test]
fn test_merge_is_associative() {
    let (docs, items) = replicas(3);
    let a = push(&docs[0], &items, "a");
    let b = push(&docs[1], &items, "b");
    let c = docs[2].change(|tx| tx.insert(&items, 0, "c")).unwrap();

    let left = a.merge(&b).unwrap().merge(&c).unwrap();
    let right = a.merge(&b.merge(&c).unwrap()).unwrap();
    assert_eq!(left, right);
    assert_eq!(left.heads().len(), 3);
}

#[test]
fn test_merge_is_idempotent() {
    let (docs, items) = replicas(2);
    let a = push(&docs[0], &items, "a");
    let b = push(&docs[1], &items, "b");

    let once = a.merge(&b).unwrap();
    let twice = once.merge(&b).unwrap().merge(&a).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once.log().len(), twice.log().len());
}

#[test]
fn test_concurrent_counter_increments_sum() {
    let base = fixed_doc(1, 0)
        .change(|tx| tx.put(&ROOT, "count", ScalarValue::counter(0)))
        .unwrap();
    let plus3 = base
        .with_actor(ActorId::from_bytes([2; 16]).unwrap())
        .change(|tx| tx.increment(&ROOT, "count", 3))
        .unwrap();
    let plus5 = base
        .with_actor(ActorId::from_bytes([3; 16]).unwrap())
        .change(|tx| tx.increment(&ROOT, "count", 5))
        .unwrap();

    assert_eq!(plus3.merge(&plus5).unwrap().counter(&ROOT, "count").unwrap(), Some(8));
    assert_eq!(plus5.merge(&plus3).unwrap().counter(&ROOT, "count").unwrap(), Some(8));
}

#[test]
fn test_increment_of_overwritten_counter_is_dropped() {
    let base = fixed_doc(1, 0)
        .change(|tx| tx.put(&ROOT, "count", ScalarValue::counter(10)))
        .unwrap();
    let bump = base.fork().change(|tx| tx.increment(&ROOT, "count", 1)).unwrap();
    let reset = base.change(|tx| tx.put(&ROOT, "count", ScalarValue::counter(0))).unwrap();

    let merged = reset.merge(&bump).unwrap();
    let all = merged.get_all(&ROOT, "count").unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(merged.counter(&ROOT, "count").unwrap(), Some(0));
}

#[test]
fn test_disjoint_histories_are_rejected() {
    let a = fixed_doc(1, 0).change(|tx| tx.put(&ROOT, "k", "a")).unwrap();
    let b = fixed_doc(2, 0).change(|tx| tx.put(&ROOT, "k", "b")).unwrap();

    let err = a.merge(&b).unwrap_err();
    assert!(err.is_disjoint_history());
    assert_eq!(err.module(), "merge");

    // Neither input changed
    assert_eq!(a.get(&ROOT, "k").unwrap(), Some(Value::from("a")));
    assert_eq!(b.get(&ROOT, "k").unwrap(), Some(Value::from("b")));
    assert_eq!(a.log().len(), 1);

    let err = merge::merge(a.log(), b.log()).unwrap_err();
    assert!(err.is_disjoint_history());
}

#[test]
fn test_sync_by_exchanging_changes() {
    let (docs, items) = replicas(2);
    let a = push(&docs[0], &items, "a1");
    let a = push(&a, &items, "a2");
    let b = push(&docs[1], &items, "b1");

    let (b, applied) = b.apply_changes(a.get_changes_since(&b.heads())).unwrap();
    assert_eq!(applied, 2);
    let (a, applied) = a.apply_changes(b.get_changes_since(&a.heads())).unwrap();
    assert_eq!(applied, 1);

    assert_eq!(a, b);
    assert_eq!(a.merge(&b).unwrap(), b);
}

#[test]
fn test_unrelated_merges_keep_object_ids() {
    let (docs, items) = replicas(2);
    let (a, notes) = docs[0]
        .transact(|tx| tx.put_object(&ROOT, "notes", ObjType::Map))
        .unwrap();
    let b = push(&docs[1], &items, "b");

    let merged = a.merge(&b).unwrap();
    assert_eq!(merged.get_object_id(&ROOT, "notes").unwrap(), Some(notes));
    assert_eq!(merged.get_object_id(&ROOT, "items").unwrap(), Some(items));
}

#[test]
fn test_concurrent_text_edits_interleave_deterministically() {
    let (base, text) = Document::seed()
        .transact(|tx| {
            let text = tx.put_object(&ROOT, "text", ObjType::Text)?;
            tx.splice_text(&text, 0, 0, "ac")?;
            Ok(text)
        })
        .unwrap();

    let left = base.fork().change(|tx| tx.splice_text(&text, 1, 0, "b")).unwrap();
    let right = base.fork().change(|tx| tx.splice_text(&text, 2, 0, "d")).unwrap();

    let merged = left.merge(&right).unwrap();
    assert_eq!(merged.text(&text).unwrap(), "abcd");
    assert_eq!(right.merge(&left).unwrap().text(&text).unwrap(), "abcd");
}

#[test]
fn test_concurrent_delete_and_update_of_list_element() {
    let (docs, items) = replicas(2);
    let base = push(&docs[0], &items, "x");
    let other = docs[1].merge(&base).unwrap();

    let deleted = base.change(|tx| tx.delete(&items, 0)).unwrap();
    let updated = other.change(|tx| tx.put(&items, 0, "y")).unwrap();

    // The update survives a concurrent delete it did not see
    let merged = deleted.merge(&updated).unwrap();
    assert_eq!(merged.values(&items).unwrap(), vec![Value::from("y")]);
    assert_eq!(updated.merge(&deleted).unwrap(), merged);
}
