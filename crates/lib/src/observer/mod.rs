//! Change observation.
//!
//! An [`Observable`] is a registry of callbacks shared by every document
//! derived from the one it was attached to. After each commit, apply or
//! merge the document notifies it synchronously: callbacks run in
//! subscription order on the committing thread, each receiving the diffs of
//! the objects it watches together with the document before and after.
//!
//! A callback that returns an error or panics is recorded as an
//! [`ObserverFailure`] and logged. It affects neither the other callbacks nor
//! the committed change.
//!
//! Committing to an observed document from inside one of its callbacks is
//! rejected with [`ObserverError::ReentrantMutation`]. Subscribing and
//! unsubscribing from a callback are allowed.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use amalgam::{DocOptions, Document, Observable, ObserveTarget, ROOT};
//!
//! let observable = Observable::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! observable.observe(ObserveTarget::Document, move |n| {
//!     sink.lock().unwrap().push(n.diffs.len());
//!     Ok(())
//! });
//!
//! let doc = Document::with_options(DocOptions::new().observable(observable));
//! let doc = doc.change(|tx| tx.put(&ROOT, "k", 1i64)).unwrap();
//!
//! assert_eq!(*seen.lock().unwrap(), vec![1]);
//! # drop(doc);
//! ```

pub mod diff;
pub mod errors;

pub use diff::{ObjectDiff, Patch};
pub use errors::ObserverError;

use std::{
    collections::HashSet,
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, ThreadId},
};

use tracing::{debug, error};

use crate::{
    change::Change,
    document::{Document, ReadDoc},
    store::Touched,
    types::ObjId,
};

/// Error type returned by observer callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

type Callback = dyn FnMut(&Notification<'_>) -> Result<(), BoxError> + Send;

/// What a subscription watches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserveTarget {
    /// Every change to the document
    Document,
    /// Only changes to this object's own keys or elements
    Object(ObjId),
}

/// Handle returned by [`Observable::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// What a callback receives.
pub struct Notification<'a> {
    /// Diffs of the watched objects. A document subscription gets one diff
    /// per modified object; an object subscription gets exactly one.
    pub diffs: &'a [ObjectDiff],
    /// The document before the commit
    pub before: &'a Document,
    /// The document after the commit
    pub after: &'a Document,
    /// True for local transactions, false for applied or merged changes
    pub local: bool,
    /// The changes that were committed
    pub changes: &'a [Arc<Change>],
}

impl Notification<'_> {
    /// The first diff, which for object subscriptions is the only one.
    pub fn diff(&self) -> Option<&ObjectDiff> {
        self.diffs.first()
    }
}

/// A recorded callback failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverFailure {
    /// The failing subscription
    pub subscription: SubscriptionId,
    /// Error message or panic payload
    pub message: String,
    /// True if the callback panicked rather than returning an error
    pub panicked: bool,
}

struct Subscription {
    id: SubscriptionId,
    target: ObserveTarget,
    callback: Arc<Mutex<Callback>>,
}

#[derive(Default)]
struct Registry {
    subscriptions: Mutex<Vec<Subscription>>,
    next_id: AtomicU64,
    failures: Mutex<Vec<ObserverFailure>>,
    dispatching: Mutex<HashSet<ThreadId>>,
}

/// Shared registry of change callbacks.
///
/// Cloning is cheap; clones refer to the same registry.
#[derive(Clone, Default)]
pub struct Observable {
    registry: Arc<Registry>,
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

// Panics inside callbacks are caught, so poisoned locks hold consistent data.
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Observable {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for changes matching `target`.
    pub fn observe<F>(&self, target: ObserveTarget, callback: F) -> SubscriptionId
    where
        F: FnMut(&Notification<'_>) -> Result<(), BoxError> + Send + 'static,
    {
        let id = SubscriptionId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(subscription = %id, ?target, "Registered observer");
        lock(&self.registry.subscriptions).push(Subscription {
            id,
            target,
            callback: Arc::new(Mutex::new(callback)),
        });
        id
    }

    /// Remove a subscription. Returns false if it was already removed.
    pub fn unobserve(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = lock(&self.registry.subscriptions);
        let before = subscriptions.len();
        subscriptions.retain(|sub| sub.id != id);
        before != subscriptions.len()
    }

    /// Number of active subscriptions.
    pub fn subscription_count(&self) -> usize {
        lock(&self.registry.subscriptions).len()
    }

    /// Drain the recorded callback failures.
    pub fn take_failures(&self) -> Vec<ObserverFailure> {
        std::mem::take(&mut *lock(&self.registry.failures))
    }

    /// Returns true if the current thread is running callbacks of this
    /// registry.
    pub fn is_dispatching(&self) -> bool {
        lock(&self.registry.dispatching).contains(&thread::current().id())
    }

    /// Fails with `ReentrantMutation` while the current thread is dispatching.
    pub(crate) fn check_not_dispatching(&self) -> Result<(), ObserverError> {
        if self.is_dispatching() {
            return Err(ObserverError::ReentrantMutation);
        }
        Ok(())
    }

    /// Returns true if both handles refer to the same registry.
    pub fn same_registry(&self, other: &Observable) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry)
    }

    /// Run the callbacks interested in a commit.
    pub(crate) fn notify(
        &self,
        before: &Document,
        after: &Document,
        changes: &[Arc<Change>],
        touched: &Touched,
        local: bool,
    ) {
        // Snapshot so callbacks may observe or unobserve while we iterate.
        let snapshot: Vec<(SubscriptionId, ObserveTarget, Arc<Mutex<Callback>>)> =
            lock(&self.registry.subscriptions)
                .iter()
                .map(|sub| (sub.id, sub.target.clone(), sub.callback.clone()))
                .collect();
        if snapshot.is_empty() || touched.is_empty() {
            return;
        }

        let diffs = diff::diff_objects(before.store(), after.store(), touched);
        if diffs.is_empty() {
            return;
        }

        let _guard = DispatchGuard::enter(&self.registry);
        for (id, target, callback) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            let selected = match &target {
                ObserveTarget::Document => &diffs[..],
                ObserveTarget::Object(obj) => match diffs.iter().position(|d| &d.obj == obj) {
                    Some(i) => &diffs[i..=i],
                    None => continue,
                },
            };

            let notification = Notification {
                diffs: selected,
                before,
                after,
                local,
                changes,
            };
            let mut callback = lock(&callback);
            let outcome = catch_unwind(AssertUnwindSafe(|| (*callback)(&notification)));
            drop(callback);

            let failure = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => ObserverFailure {
                    subscription: id,
                    message: err.to_string(),
                    panicked: false,
                },
                Err(payload) => ObserverFailure {
                    subscription: id,
                    message: panic_message(payload.as_ref()),
                    panicked: true,
                },
            };
            error!(
                subscription = %id,
                panicked = failure.panicked,
                error = %failure.message,
                "Observer callback failed"
            );
            lock(&self.registry.failures).push(failure);
        }
    }

    fn is_subscribed(&self, id: SubscriptionId) -> bool {
        lock(&self.registry.subscriptions)
            .iter()
            .any(|sub| sub.id == id)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "callback panicked".to_string()
    }
}

/// Marks the current thread as dispatching until dropped.
struct DispatchGuard<'a> {
    registry: &'a Registry,
    thread: ThreadId,
    entered: bool,
}

impl<'a> DispatchGuard<'a> {
    fn enter(registry: &'a Registry) -> Self {
        let thread = thread::current().id();
        let entered = lock(&registry.dispatching).insert(thread);
        Self {
            registry,
            thread,
            entered,
        }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if self.entered {
            lock(&self.registry.dispatching).remove(&self.thread);
        }
    }
}
