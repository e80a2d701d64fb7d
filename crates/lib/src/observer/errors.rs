//! Observer error types.

use thiserror::Error;

/// Errors raised by the change observer.
///
/// Failures of individual callbacks are not errors: they are recorded as
/// [`ObserverFailure`](super::ObserverFailure)s and never abort a commit.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ObserverError {
    /// A callback tried to commit to a document while its observers were
    /// being notified.
    #[error("Cannot commit from inside an observer callback")]
    ReentrantMutation,
}

impl ObserverError {
    /// Check if this error is a re-entrant mutation.
    pub fn is_reentrant_mutation(&self) -> bool {
        matches!(self, ObserverError::ReentrantMutation)
    }
}

impl From<ObserverError> for crate::Error {
    fn from(err: ObserverError) -> Self {
        crate::Error::Observer(err)
    }
}
