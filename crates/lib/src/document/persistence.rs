//! Saving and loading documents.

use std::{path::Path, sync::Arc};

use tracing::{debug, info};

use super::{DocOptions, Document};
use crate::{
    Error, Result,
    change::Change,
    codec::{self, ChunkKind, CodecError},
    log::{ChangeLog, canonical_order},
    merge::rebuild,
    types::ChangeHash,
};

impl Document {
    /// Encode the whole history as one full chunk.
    ///
    /// Changes are written in canonical order, so two documents holding the
    /// same changes save to identical bytes.
    pub fn save(&self) -> Result<Vec<u8>> {
        let ordered = canonical_order(self.log.changes().iter().cloned());
        let bytes = codec::encode_chunk(ChunkKind::Full, &ordered)?;
        debug!(changes = ordered.len(), bytes = bytes.len(), "Saved document");
        Ok(bytes)
    }

    /// Encode the changes added since the last call to `save_incremental`
    /// (or since the document was loaded) as an incremental chunk.
    ///
    /// Appending the result to earlier saved bytes yields bytes that load to
    /// this document.
    pub fn save_incremental(&mut self) -> Result<Vec<u8>> {
        let bytes = self.save_after(&self.saved_heads)?;
        self.saved_heads = self.heads();
        Ok(bytes)
    }

    /// Encode the changes that are not ancestors of `heads` as an
    /// incremental chunk.
    pub fn save_after(&self, heads: &[ChangeHash]) -> Result<Vec<u8>> {
        let ordered = canonical_order(self.log.changes_since(heads));
        Ok(codec::encode_chunk(ChunkKind::Incremental, &ordered)?)
    }

    /// Load a document with default options (random actor, system clock).
    pub fn load(bytes: &[u8]) -> Result<Document> {
        Self::load_with(bytes, DocOptions::new())
    }

    /// Load a document, taking the actor, clock and observers from
    /// `options`. The actor is not part of the persisted data.
    ///
    /// # Errors
    /// `CorruptPersistedData` if the bytes cannot be decoded or the decoded
    /// history cannot be replayed. No partial document is returned.
    pub fn load_with(bytes: &[u8], options: DocOptions) -> Result<Document> {
        let chunks = codec::decode_chunks(bytes)?;
        if chunks.is_empty() {
            return Err(CodecError::corrupt("no chunks in input").into());
        }
        let changes = chunks
            .into_iter()
            .flat_map(|chunk| chunk.changes)
            .map(Arc::new);

        let log = ChangeLog::from_changes(canonical_order(changes)).map_err(corrupt)?;
        let store = rebuild(&log).map_err(corrupt)?;

        let mut doc = Document::with_options(options);
        doc.saved_heads = log.heads();
        doc.log = log;
        doc.store = store;

        info!(changes = doc.log.len(), actor = %doc.actor, "Loaded document");
        Ok(doc)
    }

    /// Apply the changes persisted in `bytes` on top of this document.
    ///
    /// Returns the new document and the number of changes it did not
    /// already have. Observers are notified as for
    /// [`apply_changes`](Document::apply_changes).
    ///
    /// # Errors
    /// - `CorruptPersistedData` if the bytes are damaged or the changes
    ///   cannot be replayed.
    /// - Change log errors such as `UnknownDependency` are returned as they
    ///   are, e.g. when the chunk extends history this document lacks.
    pub fn load_incremental(&self, bytes: &[u8]) -> Result<(Document, usize)> {
        let changes: Vec<Change> = codec::decode_changes(bytes)?;
        self.apply_changes(changes).map_err(|err| match err {
            Error::Observer(_) | Error::Log(_) => err,
            other => corrupt(other),
        })
    }

    /// Save to a file, replacing its content.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.save()?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }

    /// Load a document from a file with default options.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Document> {
        Self::load_from_file_with(path, DocOptions::new())
    }

    /// Load a document from a file.
    pub fn load_from_file_with(path: impl AsRef<Path>, options: DocOptions) -> Result<Document> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::load_with(&bytes, options)
    }
}

fn corrupt(err: impl Into<Error>) -> Error {
    let err = err.into();
    match err {
        Error::Codec(_) => err,
        other => CodecError::corrupt(other.to_string()).into(),
    }
}
