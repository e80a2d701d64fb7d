//! Document editing through the public API

use std::thread;

use amalgam::{CommitOptions, Document, ObjType, ROOT, ReadDoc, Value};
use serde_json::json;

use crate::helpers::*;

#[test]
fn test_items_list_keeps_its_identity() {
    let doc = Document::new();
    let (doc, created) = doc
        .transact(|tx| tx.put_object(&ROOT, "items", ObjType::List))
        .unwrap();
    let items = doc.get_object_id(&ROOT, "items").unwrap().unwrap();
    assert_eq!(items, created);

    let doc2 = doc.change(|tx| tx.push(&items, "Cat food")).unwrap();
    assert_eq!(doc2.get_object_id(&ROOT, "items").unwrap(), Some(items.clone()));
    assert_eq!(doc2.get(&items, 0).unwrap(), Some(Value::from("Cat food")));

    // Replacing the list gives a new identity
    let doc3 = doc2
        .change(|tx| tx.put_object(&ROOT, "items", ObjType::List).map(|_| ()))
        .unwrap();
    let replaced = doc3.get_object_id(&ROOT, "items").unwrap().unwrap();
    assert_ne!(replaced, items);
    assert_eq!(doc3.length(&replaced).unwrap(), 0);
}

#[test]
fn test_old_versions_remain_readable() {
    let (v1, items) = list_doc();
    let v2 = push(&v1, &items, "milk");
    let v3 = push(&v2, &items, "eggs");

    assert_eq!(v1.length(&items).unwrap(), 0);
    assert_eq!(v2.length(&items).unwrap(), 1);
    assert_eq!(v3.length(&items).unwrap(), 2);
    assert_eq!(v2.to_json().unwrap(), json!({"items": ["milk"]}));
}

#[test]
fn test_documents_are_shared_across_threads() {
    let (doc, items) = list_doc();
    let doc = push(&doc, &items, "milk");

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let doc = doc.clone();
            let items = items.clone();
            thread::spawn(move || {
                let mine = doc.fork().change(|tx| tx.push(&items, i as i64)).unwrap();
                (doc.length(&items).unwrap(), mine.length(&items).unwrap())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), (1, 2));
    }
}

#[test]
fn test_json_import_and_export() {
    let seed = json!({
        "title": "Groceries",
        "items": ["milk", {"name": "cheese", "qty": 2}],
        "done": false,
        "ratio": 0.5,
        "nothing": null
    });
    let doc = Document::new()
        .change(|tx| tx.merge_json(&ROOT, seed.as_object().unwrap()))
        .unwrap();
    assert_eq!(doc.to_json().unwrap(), seed);

    let items = doc.get_object_id(&ROOT, "items").unwrap().unwrap();
    assert_eq!(doc.object_type(&items).unwrap(), ObjType::List);

    let doc = doc
        .change(|tx| tx.put_json(&ROOT, "tags", &json!(["a", "b"])))
        .unwrap();
    assert_eq!(doc.to_json().unwrap()["tags"], json!(["a", "b"]));
}

#[test]
fn test_commit_options_are_recorded() {
    let doc = fixed_doc(3, 5_000)
        .change_with(
            CommitOptions::new().message("initial import").time(86_400_000),
            |tx| tx.put(&ROOT, "k", "v"),
        )
        .unwrap();

    let change = doc.get_last_local_change().unwrap();
    assert_eq!(change.message(), Some("initial import"));
    assert_eq!(change.time(), 86_400_000);
    assert_eq!(change.time_rfc3339(), "1970-01-02T00:00:00+00:00");
}

#[test]
fn test_text_and_counters_together() {
    let (doc, note) = Document::new()
        .transact(|tx| {
            let note = tx.put_object(&ROOT, "note", ObjType::Text)?;
            tx.splice_text(&note, 0, 0, "héllo wörld")?;
            tx.put(&ROOT, "edits", amalgam::ScalarValue::counter(0))?;
            Ok(note)
        })
        .unwrap();
    let doc = doc
        .change(|tx| {
            tx.splice_text(&note, 0, 5, "hallo")?;
            tx.increment(&ROOT, "edits", 1)
        })
        .unwrap();

    assert_eq!(doc.text(&note).unwrap(), "hallo wörld");
    assert_eq!(doc.counter(&ROOT, "edits").unwrap(), Some(1));
    assert_eq!(doc.to_json().unwrap(), json!({"edits": 1, "note": "hallo wörld"}));
}
