//! The persisted chunk format

use std::sync::Arc;

use amalgam::{
    ActorId, Change, Document, Op, OpAction, ROOT, ReadDoc,
    codec::{self, ChunkKind},
    constants::CHUNK_MAGIC,
};

use crate::helpers::*;

fn saved() -> (Document, Vec<u8>) {
    let (doc, items) = list_doc();
    let doc = push(&doc, &items, "milk");
    let bytes = doc.save().unwrap();
    (doc, bytes)
}

#[test]
fn test_chunk_header_layout() {
    let (_, bytes) = saved();
    assert_eq!(&bytes[..4], &CHUNK_MAGIC);
    assert_eq!(bytes[4], 0, "format version");
    assert_eq!(bytes[5], 0, "full chunk");

    let len = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
    assert_eq!(bytes.len(), 14 + len);
}

#[test]
fn test_full_and_incremental_chunks_concatenate() {
    let (doc, items) = list_doc();
    let mut doc = doc;
    let mut bytes = doc.save().unwrap();
    doc.save_incremental().unwrap();

    let mut doc = push(&doc, &items, "milk");
    bytes.extend(doc.save_incremental().unwrap());

    let chunks = codec::decode_chunks(&bytes).unwrap();
    let kinds: Vec<ChunkKind> = chunks.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![ChunkKind::Full, ChunkKind::Incremental]);
    assert_eq!(chunks[0].changes.len(), 1);
    assert_eq!(chunks[1].changes.len(), 1);

    let loaded = Document::load(&bytes).unwrap();
    assert_eq!(loaded, doc);
    assert_eq!(loaded.get(&items, 0).unwrap().unwrap(), "milk");
}

#[test]
fn test_round_trip_preserves_history_and_ids() {
    let (doc, bytes) = saved();
    let loaded = Document::load(&bytes).unwrap();

    assert_eq!(loaded.heads(), doc.heads());
    assert_eq!(loaded.get_changes(), doc.get_changes());
    assert_eq!(
        loaded.get_object_id(&ROOT, "items").unwrap(),
        doc.get_object_id(&ROOT, "items").unwrap()
    );
    assert_eq!(loaded.to_json().unwrap(), doc.to_json().unwrap());
}

#[test]
fn test_corrupt_headers_are_rejected() {
    let (_, bytes) = saved();

    let mut bad_magic = bytes.clone();
    bad_magic[0] = b'X';
    let mut bad_version = bytes.clone();
    bad_version[4] = 9;
    let mut bad_kind = bytes.clone();
    bad_kind[5] = 7;
    let mut bad_checksum = bytes.clone();
    bad_checksum[10] ^= 0x01;
    let truncated = bytes[..bytes.len() - 1].to_vec();
    let short_header = bytes[..6].to_vec();

    for input in [bad_magic, bad_version, bad_kind, bad_checksum, truncated, short_header] {
        let err = Document::load(&input).unwrap_err();
        assert!(err.is_corrupt(), "unexpected error: {err}");
    }
}

#[test]
fn test_tampered_change_is_rejected() {
    let (doc, _) = saved();
    let change = doc.get_last_local_change().unwrap();

    // Re-encode the change with a different timestamp but the stale hash
    let mut json = serde_json::to_value(change).unwrap();
    json["time"] = serde_json::json!(123);
    let tampered: Change = serde_json::from_value(json).unwrap();
    assert!(tampered.verify_hash().is_err());

    let bytes = codec::encode_chunk(ChunkKind::Full, &[Arc::new(tampered)]).unwrap();
    let err = codec::decode_chunks(&bytes).unwrap_err();
    assert!(err.is_corrupt());
}

#[test]
fn test_history_with_gaps_fails_to_load() {
    let (doc, _) = saved();
    let tail = doc.get_changes()[1..].to_vec();
    let bytes = codec::encode_chunk(ChunkKind::Full, &tail).unwrap();

    let err = Document::load(&bytes).unwrap_err();
    assert!(err.is_corrupt());
}

#[test]
fn test_invalid_counters_fail_to_load() {
    let overflowing = Change::builder(ActorId::random(), 1, 1)
        .op(Op::map(ROOT, "k", OpAction::Set(1i64.into()), vec![]))
        .build()
        .unwrap()
        .reseal_unchecked(1, u64::MAX)
        .unwrap();
    let bytes = codec::encode_chunk(ChunkKind::Full, &[Arc::new(overflowing)]).unwrap();
    let err = Document::load(&bytes).unwrap_err();
    assert!(err.is_corrupt());

    // Counters that do not exceed those of a dependency
    let (doc, _) = saved();
    let stale = Change::builder(ActorId::random(), 1, 1)
        .deps(doc.heads())
        .op(Op::map(ROOT, "k", OpAction::Set(1i64.into()), vec![]))
        .build()
        .unwrap();
    let mut changes = doc.get_changes();
    changes.push(Arc::new(stale));
    let bytes = codec::encode_chunk(ChunkKind::Full, &changes).unwrap();
    let err = Document::load(&bytes).unwrap_err();
    assert!(err.is_corrupt());
}

#[test]
fn test_incremental_chunk_needs_its_base() {
    let (doc, items) = list_doc();
    let mut doc = doc;
    doc.save_incremental().unwrap();
    let mut doc = push(&doc, &items, "milk");
    let tail = doc.save_incremental().unwrap();

    let err = Document::new().load_incremental(&tail).unwrap_err();
    assert!(err.is_unknown_dependency());
    assert!(!err.is_corrupt());

    let mut damaged = tail.clone();
    let last = damaged.len() - 1;
    damaged[last] ^= 0xff;
    let err = doc.load_incremental(&damaged).unwrap_err();
    assert!(err.is_corrupt());
}
