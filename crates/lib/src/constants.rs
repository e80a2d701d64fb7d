//! Constants used throughout the Amalgam library.
//!
//! Reserved identifiers and persistence format markers live here so that every
//! module agrees on them.

use crate::types::ObjId;

/// Object ID of the root map of every document.
pub const ROOT: ObjId = ObjId::Root;

/// Length in bytes of randomly generated actor IDs.
pub const ACTOR_ID_LEN: usize = 16;

/// Reserved actor ID bytes for deterministic seed documents.
pub const SEED_ACTOR: [u8; ACTOR_ID_LEN] = [0; ACTOR_ID_LEN];

/// Magic bytes opening every persisted chunk.
pub const CHUNK_MAGIC: [u8; 4] = *b"AMLG";

/// Current persistence format version.
/// v0 indicates this is an unstable format subject to breaking changes.
pub const FORMAT_VERSION: u8 = 0;
