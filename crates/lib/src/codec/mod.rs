//! Binary persistence format.
//!
//! A persisted document is a sequence of *chunks*. Each chunk frames a
//! DAG-CBOR encoded list of changes:
//!
//! ```text
//! magic    4 bytes  "AMLG"
//! version  1 byte   FORMAT_VERSION
//! kind     1 byte   0 = full, 1 = incremental
//! length   4 bytes  payload length, little endian
//! checksum 4 bytes  first bytes of SHA-256(payload)
//! payload  length bytes
//! ```
//!
//! A full chunk holds a whole history, an incremental chunk holds the
//! changes added since an earlier save. Chunks can be concatenated freely;
//! decoding returns the changes of all of them.
//!
//! Decoding verifies every change hash, so a payload that passes the
//! checksum but was built with tampered changes is still rejected.

pub mod errors;

pub use errors::CodecError;

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{
    change::Change,
    constants::{CHUNK_MAGIC, FORMAT_VERSION},
};

const HEADER_LEN: usize = 4 + 1 + 1 + 4 + 4;

/// The kind of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// A complete history
    Full,
    /// Changes added since a previous save
    Incremental,
}

impl ChunkKind {
    fn to_byte(self) -> u8 {
        match self {
            ChunkKind::Full => 0,
            ChunkKind::Incremental => 1,
        }
    }

    fn from_byte(byte: u8) -> Result<Self, CodecError> {
        match byte {
            0 => Ok(ChunkKind::Full),
            1 => Ok(ChunkKind::Incremental),
            other => Err(CodecError::corrupt(format!("unknown chunk kind {other}"))),
        }
    }
}

/// A decoded chunk.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Full or incremental
    pub kind: ChunkKind,
    /// The changes, in the order they were written
    pub changes: Vec<Change>,
}

fn checksum(payload: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(payload);
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Encode `changes` as one chunk.
///
/// The output is a pure function of the changes and their order; callers
/// that need canonical bytes pass changes in canonical order.
pub fn encode_chunk(kind: ChunkKind, changes: &[Arc<Change>]) -> Result<Vec<u8>, CodecError> {
    let list: Vec<&Change> = changes.iter().map(|change| &**change).collect();
    let payload = serde_ipld_dagcbor::to_vec(&list).map_err(|e| CodecError::EncodingFailed {
        reason: e.to_string(),
    })?;
    let length = u32::try_from(payload.len()).map_err(|_| CodecError::EncodingFailed {
        reason: format!("payload of {} bytes exceeds chunk limit", payload.len()),
    })?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&CHUNK_MAGIC);
    out.push(FORMAT_VERSION);
    out.push(kind.to_byte());
    out.extend_from_slice(&length.to_le_bytes());
    out.extend_from_slice(&checksum(&payload));
    out.extend_from_slice(&payload);

    debug!(?kind, changes = changes.len(), bytes = out.len(), "Encoded chunk");
    Ok(out)
}

/// Decode every chunk in `bytes`.
///
/// Empty input yields no chunks.
///
/// # Errors
/// `CorruptPersistedData` on bad magic, unsupported version or kind,
/// truncation, checksum mismatch, undecodable payload, or a change whose
/// hash does not match its contents or whose counters are invalid.
pub fn decode_chunks(mut bytes: &[u8]) -> Result<Vec<Chunk>, CodecError> {
    let mut chunks = Vec::new();
    while !bytes.is_empty() {
        let (chunk, rest) = decode_one(bytes).inspect_err(|err| {
            warn!(offset_from_end = bytes.len(), error = %err, "Rejected persisted chunk");
        })?;
        chunks.push(chunk);
        bytes = rest;
    }
    Ok(chunks)
}

/// Decode every chunk in `bytes` and return all of their changes.
pub fn decode_changes(bytes: &[u8]) -> Result<Vec<Change>, CodecError> {
    Ok(decode_chunks(bytes)?
        .into_iter()
        .flat_map(|chunk| chunk.changes)
        .collect())
}

fn decode_one(bytes: &[u8]) -> Result<(Chunk, &[u8]), CodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::corrupt(format!(
            "truncated chunk header: {} of {HEADER_LEN} bytes",
            bytes.len()
        )));
    }
    let (header, rest) = bytes.split_at(HEADER_LEN);

    if header[0..4] != CHUNK_MAGIC {
        return Err(CodecError::corrupt("bad magic bytes"));
    }
    if header[4] != FORMAT_VERSION {
        return Err(CodecError::corrupt(format!(
            "unsupported format version {}; only version {FORMAT_VERSION} is supported",
            header[4]
        )));
    }
    let kind = ChunkKind::from_byte(header[5])?;
    let length = u32::from_le_bytes([header[6], header[7], header[8], header[9]]) as usize;
    let stored_checksum = &header[10..14];

    if rest.len() < length {
        return Err(CodecError::corrupt(format!(
            "truncated payload: {} of {length} bytes",
            rest.len()
        )));
    }
    let (payload, rest) = rest.split_at(length);

    if checksum(payload) != stored_checksum {
        return Err(CodecError::corrupt("checksum mismatch"));
    }

    let changes: Vec<Change> = serde_ipld_dagcbor::from_slice(payload)
        .map_err(|e| CodecError::corrupt(format!("undecodable payload: {e}")))?;
    for change in &changes {
        change
            .verify_hash()
            .and_then(|()| change.validate())
            .map_err(|e| CodecError::corrupt(e.to_string()))?;
    }

    Ok((Chunk { kind, changes }, rest))
}
