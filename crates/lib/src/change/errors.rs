//! Change-specific error types.

use thiserror::Error;

use crate::types::ChangeHash;

/// Errors that can occur while building or verifying a change.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ChangeError {
    /// Canonical encoding of the change failed
    #[error("Change encoding failed: {reason}")]
    EncodingFailed {
        /// Underlying encoder message
        reason: String,
    },

    /// The stored hash does not match the change contents
    #[error("Change hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch {
        /// Hash carried by the change
        stored: ChangeHash,
        /// Hash recomputed from its fields
        computed: ChangeHash,
    },

    /// Change structure is invalid
    #[error("Invalid change structure: {reason}")]
    InvalidStructure {
        /// Reason why the change structure is invalid
        reason: String,
    },
}

impl ChangeError {
    /// Check if this error is integrity-related.
    pub fn is_integrity_error(&self) -> bool {
        matches!(self, ChangeError::HashMismatch { .. })
    }

    /// Check if this error is validation-related.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, ChangeError::InvalidStructure { .. })
    }
}

impl From<ChangeError> for crate::Error {
    fn from(err: ChangeError) -> Self {
        crate::Error::Change(err)
    }
}
