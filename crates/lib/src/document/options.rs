//! Document and commit configuration.

use std::sync::Arc;

use crate::{
    clock::{Clock, EpochClock, SystemClock},
    observer::Observable,
    types::ActorId,
};

/// Configuration for creating or loading a document.
///
/// ```
/// use std::sync::Arc;
/// use amalgam::{ActorId, DocOptions, Document, EpochClock};
///
/// let actor = ActorId::random();
/// let doc = Document::with_options(
///     DocOptions::new()
///         .actor(actor.clone())
///         .clock(Arc::new(EpochClock)),
/// );
/// assert_eq!(doc.actor(), &actor);
/// ```
#[derive(Clone, Debug)]
pub struct DocOptions {
    pub(crate) actor: Option<ActorId>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) observable: Option<Observable>,
}

impl Default for DocOptions {
    fn default() -> Self {
        Self {
            actor: None,
            clock: Arc::new(SystemClock),
            observable: None,
        }
    }
}

impl DocOptions {
    /// Random actor, system clock, no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for deterministic seed documents: the reserved seed actor and
    /// a clock stopped at the epoch.
    ///
    /// Two seed documents built by the same transaction produce changes with
    /// identical hashes, so documents forked from them can be merged.
    pub fn seed() -> Self {
        Self::new()
            .actor(ActorId::seed())
            .clock(Arc::new(EpochClock))
    }

    /// Use this actor instead of a random one.
    pub fn actor(mut self, actor: ActorId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Use this clock for change timestamps.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Notify this registry of every commit.
    pub fn observable(mut self, observable: Observable) -> Self {
        self.observable = Some(observable);
        self
    }
}

/// Per-commit settings for [`Document::change_with`](super::Document::change_with).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitOptions {
    pub(crate) message: Option<String>,
    pub(crate) time: Option<u64>,
}

impl CommitOptions {
    /// Default options: no message, time from the document clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a commit message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Override the timestamp, in milliseconds since the epoch.
    pub fn time(mut self, millis: u64) -> Self {
        self.time = Some(millis);
        self
    }
}
