use std::{collections::HashSet, sync::Arc};

use amalgam::{
    ActorId, Change, ChangeHash, DocOptions, Document, FixedClock, ObjId, ObjType, ROOT,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

// ==========================
// DOCUMENT FACTORIES
// ==========================

/// A document with a fixed actor byte and a clock starting at `millis`.
pub fn fixed_doc(actor: u8, millis: u64) -> Document {
    Document::with_options(
        DocOptions::new()
            .actor(ActorId::from_bytes([actor; 16]).unwrap())
            .clock(Arc::new(FixedClock::new(millis))),
    )
}

/// A document holding an empty `items` list.
pub fn list_doc() -> (Document, ObjId) {
    fixed_doc(1, 1_000)
        .transact(|tx| tx.put_object(&ROOT, "items", ObjType::List))
        .unwrap()
}

/// `count` replicas sharing one base change, each with its own actor.
pub fn replicas(count: u8) -> (Vec<Document>, ObjId) {
    let (base, items) = list_doc();
    let docs = (0..count)
        .map(|i| base.with_actor(ActorId::from_bytes([0x10 + i; 16]).unwrap()))
        .collect();
    (docs, items)
}

/// Push `value` onto `list`.
pub fn push(doc: &Document, list: &ObjId, value: &str) -> Document {
    doc.change(|tx| tx.push(list, value)).unwrap()
}

// ==========================
// REPLAY ORDERS
// ==========================

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A random order of `changes` in which every change follows its
/// dependencies.
pub fn random_causal_order(changes: &[Arc<Change>], rng: &mut StdRng) -> Vec<Arc<Change>> {
    let in_batch: HashSet<ChangeHash> = changes.iter().map(|c| c.hash()).collect();
    let mut done: HashSet<ChangeHash> = HashSet::new();
    let mut pending: Vec<Arc<Change>> = changes.to_vec();
    let mut out = Vec::with_capacity(changes.len());

    while !pending.is_empty() {
        let ready: Vec<usize> = pending
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                c.deps()
                    .iter()
                    .all(|dep| done.contains(dep) || !in_batch.contains(dep))
            })
            .map(|(i, _)| i)
            .collect();
        assert!(!ready.is_empty(), "change set has a cycle");
        let pick = ready[rng.gen_range(0..ready.len())];
        let change = pending.swap_remove(pick);
        done.insert(change.hash());
        out.push(change);
    }
    out
}

/// Apply `changes` one at a time, in the given order.
pub fn replay(changes: &[Arc<Change>]) -> Document {
    changes.iter().fold(Document::new(), |doc, change| {
        let (doc, applied) = doc.apply_changes([change.clone()]).unwrap();
        assert_eq!(applied, 1);
        doc
    })
}
