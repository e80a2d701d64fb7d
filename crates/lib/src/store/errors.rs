//! Error types for document store operations.
//!
//! Raised while applying operations to the materialized document tree,
//! whether they come from a local transaction or from a remote change.

use thiserror::Error;

use crate::types::{ObjId, OpId};

/// Structured error types for store operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// An operation targets an object the document does not contain
    #[error("Unknown object: {obj}")]
    UnknownObject { obj: ObjId },

    /// An operation is invalid for the kind of its target
    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// An operation references a list or text element that does not exist
    #[error("Missing element {elem} in {obj}")]
    MissingElement { obj: ObjId, elem: OpId },

    /// A local edit addressed an index past the end of a sequence
    #[error("Index {index} out of bounds for {obj} of length {len}")]
    IndexOutOfBounds { obj: ObjId, index: usize, len: usize },

    /// A value cannot be stored
    #[error("Invalid value: {reason}")]
    InvalidValue { reason: String },
}

impl StoreError {
    /// Check if this error is an unknown object reference
    pub fn is_unknown_object(&self) -> bool {
        matches!(self, StoreError::UnknownObject { .. })
    }

    /// Check if this error is related to type mismatches
    pub fn is_type_error(&self) -> bool {
        matches!(self, StoreError::TypeMismatch { .. })
    }

    /// Check if this error is an invalid element or index reference
    pub fn is_position_error(&self) -> bool {
        matches!(
            self,
            StoreError::MissingElement { .. } | StoreError::IndexOutOfBounds { .. }
        )
    }

    /// Check if this error is related to invalid values
    pub fn is_value_error(&self) -> bool {
        matches!(self, StoreError::InvalidValue { .. })
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
