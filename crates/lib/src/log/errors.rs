//! Change log error types.

use thiserror::Error;

use crate::{
    change::ChangeError,
    types::{ActorId, ChangeHash},
};

/// Errors raised while growing a change log.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LogError {
    /// A change depends on a hash the log does not contain.
    #[error("Change {change} depends on unknown change {dependency}")]
    UnknownDependency {
        /// The change being appended
        change: ChangeHash,
        /// The missing dependency
        dependency: ChangeHash,
    },

    /// A change skips or reuses a sequence number of its actor.
    #[error("Actor {actor} expected sequence number {expected}, found {found}")]
    ActorSequenceGap {
        /// The author of the rejected change
        actor: ActorId,
        /// The next sequence number the log accepts for this actor
        expected: u64,
        /// The sequence number carried by the change
        found: u64,
    },

    /// A change is structurally unsound, e.g. its operation counters
    /// overflow or do not exceed those of its dependencies.
    #[error(transparent)]
    InvalidChange(#[from] ChangeError),
}

impl LogError {
    /// Check if this error is a missing dependency.
    pub fn is_unknown_dependency(&self) -> bool {
        matches!(self, LogError::UnknownDependency { .. })
    }

    /// Check if this error is a per-actor sequencing violation.
    pub fn is_sequence_error(&self) -> bool {
        matches!(self, LogError::ActorSequenceGap { .. })
    }

    /// Check if this error is a structurally invalid change.
    pub fn is_invalid_change(&self) -> bool {
        matches!(self, LogError::InvalidChange(_))
    }

    /// The dependency that was missing, if any.
    pub fn missing_dependency(&self) -> Option<ChangeHash> {
        match self {
            LogError::UnknownDependency { dependency, .. } => Some(*dependency),
            _ => None,
        }
    }
}

impl From<LogError> for crate::Error {
    fn from(err: LogError) -> Self {
        crate::Error::Log(err)
    }
}
