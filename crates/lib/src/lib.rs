//!
//! Amalgam: mergeable JSON-like documents.
//! This library lets independent replicas edit the same document offline and
//! merge their histories deterministically, with no coordination.
//!
//! ## Core Concepts
//!
//! * **Documents (`document::Document`)**: An immutable value holding a change
//!   history and the state materialized from it. Every edit returns a new
//!   document that shares unmodified structure with the old one.
//! * **Changes (`change::Change`)**: The content-addressed unit of history.
//!   A change groups the operations of one transaction by one actor and names
//!   the changes it depends on, forming a hash DAG.
//! * **Change log (`log::ChangeLog`)**: The set of known changes, their heads
//!   and per-actor sequencing.
//! * **Store (`store::Store`)**: The object tree built by applying
//!   operations: maps with multi-value registers, and lists and text ordered
//!   by a replicated growable array.
//! * **Merge (`merge`)**: Union of two histories, replayed in a canonical
//!   order so every replica converges on the same state.
//! * **Observers (`observer::Observable`)**: Synchronous callbacks receiving
//!   per-object patches after each commit, apply or merge.
//! * **Codec (`codec`)**: The binary chunk format used by save and load.

pub mod change;
pub mod clock;
pub mod codec;
pub mod constants;
pub mod document;
pub mod log;
pub mod merge;
pub mod observer;
pub mod store;
pub mod types;

pub use change::{Change, ChangeBuilder, Op, OpAction};
#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use clock::{Clock, EpochClock, SystemClock};
pub use constants::ROOT;
pub use document::{CommitOptions, DocOptions, Document, ReadDoc, Transaction};
pub use observer::{
    Notification, ObjectDiff, Observable, ObserveTarget, ObserverFailure, Patch, SubscriptionId,
};
pub use types::{ActorId, ChangeHash, ElemId, ObjId, ObjType, OpId, Prop, ScalarValue, Value};

/// Result type used throughout the Amalgam library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Amalgam library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed identifiers
    #[error(transparent)]
    Id(types::IdError),

    /// Structured errors from building or verifying changes
    #[error(transparent)]
    Change(change::ChangeError),

    /// Structured errors from the change log
    #[error(transparent)]
    Log(log::LogError),

    /// Structured errors from applying operations
    #[error(transparent)]
    Store(store::StoreError),

    /// Structured errors from merging histories
    #[error(transparent)]
    Merge(merge::MergeError),

    /// Structured errors from the observer registry
    #[error(transparent)]
    Observer(observer::ObserverError),

    /// Structured errors from the persistence codec
    #[error(transparent)]
    Codec(codec::CodecError),

    /// A transaction was abandoned by its caller
    #[error("Transaction aborted: {0}")]
    Aborted(String),
}

impl Error {
    /// Abort a transaction from inside its closure with a reason.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Error::Aborted(reason.into())
    }

    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Id(_) => "types",
            Error::Change(_) => "change",
            Error::Log(_) => "log",
            Error::Store(_) => "store",
            Error::Merge(_) => "merge",
            Error::Observer(_) => "observer",
            Error::Codec(_) => "codec",
            Error::Aborted(_) => "document",
        }
    }

    /// Check if this error is a change depending on an unknown change.
    pub fn is_unknown_dependency(&self) -> bool {
        match self {
            Error::Log(log_err) => log_err.is_unknown_dependency(),
            _ => false,
        }
    }

    /// Check if this error is a per-actor sequencing violation.
    pub fn is_sequence_error(&self) -> bool {
        match self {
            Error::Log(log_err) => log_err.is_sequence_error(),
            _ => false,
        }
    }

    /// Check if this error is a value or property of the wrong kind.
    pub fn is_type_mismatch(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_type_error(),
            _ => false,
        }
    }

    /// Check if this error names an object that does not exist.
    pub fn is_unknown_object(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_unknown_object(),
            _ => false,
        }
    }

    /// Check if this error is an index outside a sequence or a missing
    /// element.
    pub fn is_position_error(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_position_error(),
            _ => false,
        }
    }

    /// Check if this error is a value that cannot be stored.
    pub fn is_invalid_value(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_value_error(),
            _ => false,
        }
    }

    /// Check if this error is a merge of unrelated histories.
    pub fn is_disjoint_history(&self) -> bool {
        match self {
            Error::Merge(merge_err) => merge_err.is_disjoint_history(),
            _ => false,
        }
    }

    /// Check if this error is a mutation from inside an observer callback.
    pub fn is_reentrant_mutation(&self) -> bool {
        match self {
            Error::Observer(observer_err) => observer_err.is_reentrant_mutation(),
            _ => false,
        }
    }

    /// Check if this error is persisted data that failed to decode or replay.
    pub fn is_corrupt(&self) -> bool {
        match self {
            Error::Codec(codec_err) => codec_err.is_corrupt(),
            _ => false,
        }
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        match self {
            Error::Change(change_err) => change_err.is_integrity_error(),
            Error::Codec(codec_err) => codec_err.is_corrupt(),
            _ => false,
        }
    }

    /// Check if this error is validation-related.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Change(change_err) => change_err.is_validation_error(),
            Error::Id(id_err) => id_err.is_parse_error(),
            Error::Log(_) => true,
            _ => false,
        }
    }

    /// Check if this error was raised by the caller aborting a transaction.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted(_))
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
