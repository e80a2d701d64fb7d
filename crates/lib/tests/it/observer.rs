//! Change notifications

use std::sync::{Arc, Mutex};

use amalgam::{
    DocOptions, Document, ObjType, Observable, ObserveTarget, Patch, ROOT, ReadDoc, Value,
};

fn observed() -> (Observable, Document) {
    let observable = Observable::new();
    let doc = Document::with_options(DocOptions::new().observable(observable.clone()));
    (observable, doc)
}

#[test]
fn test_list_subscriber_sees_before_and_after() {
    let (observable, doc) = observed();
    let (doc, items) = doc
        .transact(|tx| {
            let items = tx.put_object(&ROOT, "items", ObjType::List)?;
            tx.push(&items, "milk")?;
            Ok(items)
        })
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let watched = items.clone();
    observable.observe(ObserveTarget::Object(items.clone()), move |n| {
        let before = n.before.length(&watched)?;
        let after = n.after.length(&watched)?;
        let patches = n.diff().map(|d| d.patches.clone()).unwrap_or_default();
        sink.lock().unwrap().push((before, after, patches, n.local));
        Ok(())
    });

    let doc2 = doc.change(|tx| tx.push(&items, "eggs")).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (before, after, patches, local) = &seen[0];
    assert_eq!((*before, *after), (1, 2));
    assert_eq!(
        patches,
        &vec![Patch::Insert {
            index: 1,
            value: Value::from("eggs"),
        }]
    );
    assert!(*local);
    assert_eq!(doc2.length(&items).unwrap(), 2);
}

#[test]
fn test_object_subscription_ignores_other_objects() {
    let (observable, doc) = observed();
    let (doc, items) = doc
        .transact(|tx| tx.put_object(&ROOT, "items", ObjType::List))
        .unwrap();

    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    observable.observe(ObserveTarget::Object(items.clone()), move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    let doc = doc.change(|tx| tx.put(&ROOT, "title", "list")).unwrap();
    assert_eq!(*calls.lock().unwrap(), 0);
    doc.change(|tx| tx.push(&items, "milk")).unwrap();
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn test_document_subscription_receives_every_modified_object() {
    let (observable, doc) = observed();
    let diffs = Arc::new(Mutex::new(Vec::new()));
    let sink = diffs.clone();
    observable.observe(ObserveTarget::Document, move |n| {
        sink.lock().unwrap().push((n.diffs.to_vec(), n.changes.len()));
        Ok(())
    });

    doc.change(|tx| {
        let note = tx.put_object(&ROOT, "note", ObjType::Text)?;
        tx.splice_text(&note, 0, 0, "hi")
    })
    .unwrap();

    let diffs = diffs.lock().unwrap();
    assert_eq!(diffs.len(), 1);
    let (objects, changes) = &diffs[0];
    assert_eq!(*changes, 1);
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].obj, ROOT);
    assert_eq!(objects[1].obj_type, ObjType::Text);
    assert_eq!(
        objects[1].patches,
        vec![Patch::SpliceText {
            index: 0,
            text: "hi".to_string(),
        }]
    );
}

#[test]
fn test_remote_changes_are_not_local() {
    let (observable, doc) = observed();
    let base = doc.change(|tx| tx.put(&ROOT, "k", "v")).unwrap();
    let remote = Document::new()
        .apply_changes(base.get_changes())
        .unwrap()
        .0
        .change(|tx| tx.put(&ROOT, "k", "w"))
        .unwrap();

    let flags = Arc::new(Mutex::new(Vec::new()));
    let sink = flags.clone();
    observable.observe(ObserveTarget::Document, move |n| {
        sink.lock().unwrap().push(n.local);
        Ok(())
    });

    let (applied, _) = base.apply_changes(remote.get_changes_since(&base.heads())).unwrap();
    assert_eq!(applied.get(&ROOT, "k").unwrap(), Some(Value::from("w")));
    let merged = base.merge(&remote).unwrap();
    assert_eq!(merged, applied);

    assert_eq!(*flags.lock().unwrap(), vec![false, false]);
}

#[test]
fn test_failing_callbacks_are_isolated() {
    let (observable, doc) = observed();
    let reached = Arc::new(Mutex::new(false));
    let flag = reached.clone();

    let erroring = observable.observe(ObserveTarget::Document, |_| Err("boom".into()));
    let panicking = observable.observe(ObserveTarget::Document, |_| panic!("callback exploded"));
    observable.observe(ObserveTarget::Document, move |_| {
        *flag.lock().unwrap() = true;
        Ok(())
    });

    let doc = doc.change(|tx| tx.put(&ROOT, "k", 1i64)).unwrap();
    assert_eq!(doc.get(&ROOT, "k").unwrap(), Some(Value::from(1i64)));
    assert!(*reached.lock().unwrap());

    let failures = observable.take_failures();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].subscription, erroring);
    assert_eq!(failures[0].message, "boom");
    assert!(!failures[0].panicked);
    assert_eq!(failures[1].subscription, panicking);
    assert_eq!(failures[1].message, "callback exploded");
    assert!(failures[1].panicked);
    assert!(observable.take_failures().is_empty());

    // A panicking callback stays subscribed and later commits still succeed
    doc.change(|tx| tx.put(&ROOT, "k", 2i64)).unwrap();
    assert_eq!(observable.take_failures().len(), 2);
}

#[test]
fn test_mutation_inside_callback_is_rejected() {
    let (observable, doc) = observed();
    let outcome = Arc::new(Mutex::new(None));
    let sink = outcome.clone();
    observable.observe(ObserveTarget::Document, move |n| {
        let result = n.after.change(|tx| tx.put(&ROOT, "echo", true));
        *sink.lock().unwrap() = Some(result.map(|_| ()).map_err(|e| e.is_reentrant_mutation()));
        Ok(())
    });

    let doc = doc.change(|tx| tx.put(&ROOT, "k", "v")).unwrap();
    assert_eq!(*outcome.lock().unwrap(), Some(Err(true)));
    assert_eq!(doc.get(&ROOT, "echo").unwrap(), None);
    assert!(!observable.is_dispatching());

    // Outside a callback the same document commits normally
    doc.change(|tx| tx.put(&ROOT, "later", true)).unwrap();
}

#[test]
fn test_unobserve_from_inside_callback() {
    let (observable, doc) = observed();
    let calls = Arc::new(Mutex::new(Vec::new()));

    let registry = observable.clone();
    let later = Arc::new(Mutex::new(None));
    let target = later.clone();
    let log = calls.clone();
    observable.observe(ObserveTarget::Document, move |_| {
        log.lock().unwrap().push("first");
        if let Some(id) = target.lock().unwrap().take() {
            assert!(registry.unobserve(id));
        }
        Ok(())
    });
    let log = calls.clone();
    let second = observable.observe(ObserveTarget::Document, move |_| {
        log.lock().unwrap().push("second");
        Ok(())
    });
    *later.lock().unwrap() = Some(second);

    let doc = doc.change(|tx| tx.put(&ROOT, "a", 1i64)).unwrap();
    doc.change(|tx| tx.put(&ROOT, "b", 2i64)).unwrap();

    assert_eq!(*calls.lock().unwrap(), vec!["first", "first"]);
    assert_eq!(observable.subscription_count(), 1);
    assert!(!observable.unobserve(second));
}

#[test]
fn test_unchanged_commits_do_not_notify() {
    let (observable, doc) = observed();
    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    observable.observe(ObserveTarget::Document, move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    let doc = doc.change(|_| Ok(())).unwrap();
    let doc = doc.merge(&doc.clone()).unwrap();
    doc.apply_changes(Vec::<amalgam::Change>::new()).unwrap();
    assert_eq!(*calls.lock().unwrap(), 0);
}
