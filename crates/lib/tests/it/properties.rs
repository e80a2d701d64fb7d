//! Convergence properties over randomized workloads
//!
//! Every workload is driven by a seeded RNG so failures reproduce.

use amalgam::{Document, ObjId, ObjType, ROOT, ReadDoc, ScalarValue};
use rand::{Rng, rngs::StdRng};

use crate::helpers::*;

struct Ids {
    items: ObjId,
    text: ObjId,
}

fn base() -> (Document, Ids) {
    fixed_doc(1, 0)
        .transact(|tx| {
            let items = tx.put_object(&ROOT, "items", ObjType::List)?;
            let text = tx.put_object(&ROOT, "text", ObjType::Text)?;
            tx.put(&ROOT, "count", ScalarValue::counter(0))?;
            Ok(Ids { items, text })
        })
        .unwrap()
}

/// Apply one random edit.
fn edit(doc: &Document, ids: &Ids, rng: &mut StdRng) -> Document {
    let choice = rng.gen_range(0..6);
    let word = format!("w{}", rng.gen_range(0..100));
    doc.change(|tx| {
        let len = tx.length(&ids.items)?;
        let text_len = tx.length(&ids.text)?;
        match choice {
            0 => tx.push(&ids.items, word.as_str()),
            1 => tx.insert(&ids.items, rng.gen_range(0..=len), word.as_str()),
            2 if len > 0 => tx.delete(&ids.items, rng.gen_range(0..len)),
            3 => tx.put(&ROOT, format!("k{}", rng.gen_range(0..4)), word.as_str()),
            4 => tx.increment(&ROOT, "count", rng.gen_range(-5..=5)),
            _ => {
                let at = rng.gen_range(0..=text_len);
                let delete = rng.gen_range(0..=(text_len - at).min(2));
                tx.splice_text(&ids.text, at, delete, &word)
            }
        }
    })
    .unwrap()
}

/// Three replicas editing concurrently, occasionally syncing pairs.
fn workload(seed: u64, rounds: usize) -> Vec<Document> {
    let mut rng = rng(seed);
    let (base, ids) = base();
    let mut docs: Vec<Document> = (0..3u8).map(|_| base.fork()).collect();

    for _ in 0..rounds {
        let i = rng.gen_range(0..docs.len());
        docs[i] = edit(&docs[i], &ids, &mut rng);
        if rng.gen_bool(0.2) {
            let j = rng.gen_range(0..docs.len());
            docs[i] = docs[i].merge(&docs[j]).unwrap();
        }
    }
    docs
}

fn merge_all(docs: &[Document]) -> Document {
    docs.iter()
        .skip(1)
        .fold(docs[0].clone(), |acc, doc| acc.merge(doc).unwrap())
}

#[test]
fn test_any_causal_replay_order_converges() {
    for seed in 0..5 {
        let merged = merge_all(&workload(seed, 40));
        let changes = merged.get_changes();
        let expected = merged.save().unwrap();

        let mut rng = rng(seed + 100);
        for _ in 0..3 {
            let order = random_causal_order(&changes, &mut rng);
            let replayed = replay(&order);
            assert_eq!(replayed, merged, "seed {seed}");
            assert_eq!(replayed.to_json().unwrap(), merged.to_json().unwrap());
            assert_eq!(replayed.save().unwrap(), expected, "seed {seed}");
        }
    }
}

#[test]
fn test_merge_order_does_not_matter() {
    for seed in 10..15 {
        let docs = workload(seed, 30);
        let (a, b, c) = (&docs[0], &docs[1], &docs[2]);

        let ab = a.merge(b).unwrap();
        assert_eq!(ab, b.merge(a).unwrap(), "commutativity, seed {seed}");

        let left = ab.merge(c).unwrap();
        let right = a.merge(&b.merge(c).unwrap()).unwrap();
        assert_eq!(left, right, "associativity, seed {seed}");
        assert_eq!(left.merge(&right).unwrap(), left, "idempotence, seed {seed}");
    }
}

#[test]
fn test_round_trip_of_random_documents() {
    for seed in 20..25 {
        let doc = merge_all(&workload(seed, 30));
        let loaded = Document::load(&doc.save().unwrap()).unwrap();
        assert_eq!(loaded, doc, "seed {seed}");
        assert_eq!(loaded.get_changes().len(), doc.get_changes().len());
    }
}

#[test]
fn test_frozen_ancestors_make_independent_documents_mergeable() {
    let seed_json = serde_json::json!({"title": "shared", "items": []});
    let make = || {
        Document::seed()
            .change(|tx| tx.merge_json(&ROOT, seed_json.as_object().unwrap()))
            .unwrap()
    };

    let alice = make().fork();
    let bob = make().fork();
    assert_eq!(alice.heads(), bob.heads());

    let items = alice.get_object_id(&ROOT, "items").unwrap().unwrap();
    assert_eq!(bob.get_object_id(&ROOT, "items").unwrap(), Some(items.clone()));

    let alice = push(&alice, &items, "from alice");
    let bob = push(&bob, &items, "from bob");
    let merged = alice.merge(&bob).unwrap();
    assert_eq!(merged.length(&items).unwrap(), 2);
    assert_eq!(merged, bob.merge(&alice).unwrap());
}
