//! User-facing documents.
//!
//! A [`Document`] bundles a change log with the store materialized from it.
//! Documents are values: [`change`](Document::change),
//! [`apply_changes`](Document::apply_changes) and [`merge`](Document::merge)
//! return a new document and leave the receiver untouched, sharing all
//! unmodified objects with it.
//!
//! ```
//! use amalgam::{Document, ObjType, ReadDoc, ROOT};
//!
//! let doc = Document::new();
//! let doc = doc
//!     .change(|tx| {
//!         let items = tx.put_object(&ROOT, "items", ObjType::List)?;
//!         tx.push(&items, "milk")?;
//!         tx.push(&items, "eggs")?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let items = doc.get_object_id(&ROOT, "items").unwrap().unwrap();
//! assert_eq!(doc.length(&items).unwrap(), 2);
//! assert_eq!(doc.to_json().unwrap()["items"][1], "eggs");
//! ```

pub mod json;
pub mod options;
pub mod persistence;
pub mod read;
pub mod transaction;


pub use options::{CommitOptions, DocOptions};
pub use read::ReadDoc;
pub use transaction::Transaction;

use std::sync::Arc;

use tracing::debug;

use crate::{
    Result,
    change::Change,
    clock::Clock,
    constants::ROOT,
    log::{ChangeLog, canonical_order},
    merge,
    observer::Observable,
    store::{Store, Touched},
    types::{ActorId, ChangeHash},
};

/// A replicated document: history plus materialized state.
#[derive(Clone, Debug)]
pub struct Document {
    actor: ActorId,
    log: ChangeLog,
    store: Store,
    clock: Arc<dyn Clock>,
    observable: Option<Observable>,
    /// Heads at the last `save_incremental` or load
    saved_heads: Vec<ChangeHash>,
}

/// Two documents are equal when they hold the same changes and state,
/// regardless of actor or configuration.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.heads() == other.heads() && self.store == other.store
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with a random actor and the system clock.
    pub fn new() -> Self {
        Self::with_options(DocOptions::new())
    }

    /// An empty document configured by `options`.
    pub fn with_options(options: DocOptions) -> Self {
        Self {
            actor: options.actor.unwrap_or_else(ActorId::random),
            log: ChangeLog::new(),
            store: Store::new(),
            clock: options.clock,
            observable: options.observable,
            saved_heads: Vec::new(),
        }
    }

    /// An empty document for building deterministic seed changes.
    ///
    /// Uses the reserved seed actor and a clock stopped at the epoch, so the
    /// same edits produce the same change hash everywhere. Switch to a real
    /// actor with [`fork`](Document::fork) before editing further.
    ///
    /// ```
    /// use amalgam::{Document, ObjType, ROOT};
    ///
    /// let make = || {
    ///     Document::seed()
    ///         .change(|tx| tx.put_object(&ROOT, "items", ObjType::List).map(|_| ()))
    ///         .unwrap()
    /// };
    /// assert_eq!(make().heads(), make().heads());
    /// ```
    pub fn seed() -> Self {
        Self::with_options(DocOptions::seed())
    }

    /// The actor local changes are attributed to.
    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    /// The clock local changes are stamped with.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The observer registry, if one is attached.
    pub fn observable(&self) -> Option<&Observable> {
        self.observable.as_ref()
    }

    /// The same document, edited from now on as `actor`.
    pub fn with_actor(&self, actor: ActorId) -> Document {
        Document {
            actor,
            ..self.clone()
        }
    }

    /// The same document, stamping changes with `clock`.
    pub fn with_clock(&self, clock: Arc<dyn Clock>) -> Document {
        Document {
            clock,
            ..self.clone()
        }
    }

    /// A copy of this document with a fresh random actor.
    pub fn fork(&self) -> Document {
        self.with_actor(ActorId::random())
    }

    /// The history.
    pub fn log(&self) -> &ChangeLog {
        &self.log
    }

    /// Hashes of the changes no other change depends on, sorted.
    pub fn heads(&self) -> Vec<ChangeHash> {
        self.log.heads()
    }

    /// Every change in application order.
    pub fn get_changes(&self) -> Vec<Arc<Change>> {
        self.log.changes().to_vec()
    }

    /// The changes that are not ancestors of `heads`. Unknown hashes in
    /// `heads` are ignored.
    pub fn get_changes_since(&self, heads: &[ChangeHash]) -> Vec<Arc<Change>> {
        self.log.changes_since(heads)
    }

    /// Look up a change by hash.
    pub fn get_change(&self, hash: &ChangeHash) -> Option<&Change> {
        self.log.get(hash)
    }

    /// The most recent change made by this document's actor.
    pub fn get_last_local_change(&self) -> Option<&Change> {
        self.log.last_change_by(&self.actor)
    }

    /// Materialize the document as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        json::object_to_json(&self.store, &ROOT)
    }

    /// Run `f` as a transaction and commit its operations as one change.
    ///
    /// If `f` fails, the error is returned and nothing is committed. A
    /// transaction that records no operations commits no change.
    pub fn change<F>(&self, f: F) -> Result<Document>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<()>,
    {
        Ok(self.transact_with(CommitOptions::default(), f)?.0)
    }

    /// Like [`change`](Document::change), with a message or timestamp.
    pub fn change_with<F>(&self, options: CommitOptions, f: F) -> Result<Document>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<()>,
    {
        Ok(self.transact_with(options, f)?.0)
    }

    /// Like [`change`](Document::change), also returning the value produced
    /// by `f`.
    pub fn transact<F, T>(&self, f: F) -> Result<(Document, T)>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T>,
    {
        self.transact_with(CommitOptions::default(), f)
    }

    /// Full-control transaction: options and a return value.
    pub fn transact_with<F, T>(&self, options: CommitOptions, f: F) -> Result<(Document, T)>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T>,
    {
        self.check_reentrancy()?;

        let mut tx = Transaction::new(self);
        let value = f(&mut tx)?;
        let (ops, store, touched) = tx.finish();
        if ops.is_empty() {
            return Ok((self.clone(), value));
        }

        let time = options.time.unwrap_or_else(|| self.clock.now_millis());
        let change = Arc::new(self.log.create_change(
            &self.actor,
            self.log.heads(),
            ops,
            time,
            options.message,
        )?);

        let mut log = self.log.clone();
        log.append(change.clone())?;
        let after = Document {
            log,
            store,
            ..self.clone()
        };

        debug!(
            change = %change.hash(),
            actor = %self.actor,
            seq = change.seq(),
            ops = change.len(),
            "Committed local change"
        );
        after.notify(self, &[change], &touched, true);
        Ok((after, value))
    }

    /// Apply changes received from another replica.
    ///
    /// Changes may arrive in any order within the batch; they are applied in
    /// canonical order. Changes already present are skipped. The batch is
    /// atomic: if any change is invalid or depends on a change that is
    /// neither present nor in the batch, nothing is applied.
    ///
    /// Returns the new document and the number of changes applied.
    pub fn apply_changes<I, C>(&self, changes: I) -> Result<(Document, usize)>
    where
        I: IntoIterator<Item = C>,
        C: Into<Arc<Change>>,
    {
        self.check_reentrancy()?;

        let incoming: Vec<Arc<Change>> = changes.into_iter().map(Into::into).collect();
        for change in &incoming {
            change.verify_hash()?;
        }

        let mut log = self.log.clone();
        let mut store = self.store.clone();
        let mut applied = Vec::new();
        let mut touched = Touched::new();
        for change in canonical_order(incoming) {
            if log.append(change.clone())? {
                touched.extend(store.apply_change(&change)?);
                applied.push(change);
            }
        }

        if applied.is_empty() {
            return Ok((self.clone(), 0));
        }

        let after = Document {
            log,
            store,
            ..self.clone()
        };
        debug!(applied = applied.len(), heads = after.log.heads().len(), "Applied changes");
        after.notify(self, &applied, &touched, false);
        Ok((after, applied.len()))
    }

    /// Merge another document's history into this one.
    ///
    /// The result keeps this document's actor and configuration. Merging
    /// is commutative, associative and idempotent in content.
    ///
    /// # Errors
    /// `DisjointHistory` if both documents have changes but share none.
    pub fn merge(&self, other: &Document) -> Result<Document> {
        self.check_reentrancy()?;

        let merged = merge::merge(&self.log, &other.log)?;
        if merged.new_changes.is_empty() {
            return Ok(self.clone());
        }

        let after = Document {
            log: merged.log,
            store: merged.store,
            ..self.clone()
        };
        after.notify(self, &merged.new_changes, &merged.touched, false);
        Ok(after)
    }

    fn check_reentrancy(&self) -> Result<()> {
        if let Some(observable) = &self.observable {
            observable.check_not_dispatching()?;
        }
        Ok(())
    }

    fn notify(&self, before: &Document, changes: &[Arc<Change>], touched: &Touched, local: bool) {
        if let Some(observable) = &self.observable {
            observable.notify(before, self, changes, touched, local);
        }
    }
}

impl ReadDoc for Document {
    fn store(&self) -> &Store {
        &self.store
    }
}
