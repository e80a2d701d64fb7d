//! Merge error types.

use thiserror::Error;

use crate::types::ChangeHash;

/// Errors that can occur while merging two histories.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MergeError {
    /// The two documents were not forked from a common ancestor.
    #[error("Histories share no change (ours rooted at {ours:?}, theirs at {theirs:?})")]
    DisjointHistory {
        /// Root changes of our history
        ours: Vec<ChangeHash>,
        /// Root changes of their history
        theirs: Vec<ChangeHash>,
    },
}

impl MergeError {
    /// Check if the merge was rejected for lack of a common ancestor.
    pub fn is_disjoint_history(&self) -> bool {
        matches!(self, MergeError::DisjointHistory { .. })
    }
}

impl From<MergeError> for crate::Error {
    fn from(err: MergeError) -> Self {
        crate::Error::Merge(err)
    }
}
