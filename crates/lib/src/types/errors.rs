//! Identifier parsing errors.

use thiserror::Error;

/// Errors raised while parsing or validating identifiers.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// Actor ID was empty
    #[error("Actor ID must not be empty")]
    EmptyActor,

    /// Text was not valid hexadecimal
    #[error("Invalid hex identifier: {0}")]
    InvalidHex(String),

    /// A change hash had the wrong number of bytes
    #[error("Invalid change hash length: expected 32 bytes, got {0}")]
    InvalidHashLength(usize),

    /// An operation ID string was malformed
    #[error("Invalid operation ID: {0}")]
    InvalidOpId(String),
}

impl IdError {
    /// Check if this error came from malformed text input.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, IdError::InvalidHex(_) | IdError::InvalidOpId(_))
    }
}

impl From<IdError> for crate::Error {
    fn from(err: IdError) -> Self {
        crate::Error::Id(err)
    }
}
