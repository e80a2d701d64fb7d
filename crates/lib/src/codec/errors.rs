//! Persistence codec error types.

use thiserror::Error;

/// Errors raised while encoding or decoding persisted documents.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CodecError {
    /// Persisted bytes could not be turned back into a document.
    ///
    /// Covers bad framing, unsupported versions, checksum mismatches,
    /// undecodable payloads, tampered changes and histories that fail to
    /// replay.
    #[error("Corrupt persisted data: {reason}")]
    CorruptPersistedData {
        /// What was wrong with the input
        reason: String,
    },

    /// Changes could not be encoded.
    #[error("Encoding failed: {reason}")]
    EncodingFailed {
        /// Underlying encoder message
        reason: String,
    },
}

impl CodecError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        CodecError::CorruptPersistedData {
            reason: reason.into(),
        }
    }

    /// Check if this error reports unreadable input.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, CodecError::CorruptPersistedData { .. })
    }
}

impl From<CodecError> for crate::Error {
    fn from(err: CodecError) -> Self {
        crate::Error::Codec(err)
    }
}
