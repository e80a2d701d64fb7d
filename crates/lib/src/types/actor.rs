//! Actor identities.
//!
//! An [`ActorId`] names one writer. Every change is attributed to exactly one
//! actor, and operation IDs embed the actor that created them, so two
//! processes must never write concurrently under the same actor ID.

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::errors::IdError;
use crate::constants::SEED_ACTOR;

/// Opaque identifier of a writer.
///
/// Cloning is cheap: the bytes are shared. IDs order bytewise, which is the
/// tiebreak used between concurrent operations with equal counters.
///
/// # Examples
///
/// ```
/// use amalgam::ActorId;
///
/// let actor = ActorId::random();
/// let parsed: ActorId = actor.to_string().parse().unwrap();
/// assert_eq!(actor, parsed);
///
/// assert!(ActorId::seed().is_seed());
/// assert_eq!(ActorId::seed().to_string(), "00000000000000000000000000000000");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(Arc<[u8]>);

impl ActorId {
    /// Generates a fresh random actor ID.
    pub fn random() -> Self {
        Self(Arc::from(Uuid::new_v4().as_bytes().as_slice()))
    }

    /// The reserved actor ID for seed documents.
    pub fn seed() -> Self {
        Self(Arc::from(SEED_ACTOR.as_slice()))
    }

    /// Creates an actor ID from raw bytes.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, IdError> {
        let bytes = bytes.as_ref();
        if bytes.is_empty() {
            return Err(IdError::EmptyActor);
        }
        Ok(Self(Arc::from(bytes)))
    }

    /// Returns true if this is the reserved seed actor.
    pub fn is_seed(&self) -> bool {
        *self.0 == SEED_ACTOR
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns a short hex prefix for log output.
    pub fn short(&self) -> String {
        let hex = hex::encode(&self.0);
        hex.chars().take(8).collect()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", hex::encode(&self.0))
    }
}

impl FromStr for ActorId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| IdError::InvalidHex(s.to_string()))?;
        Self::from_bytes(bytes)
    }
}

impl TryFrom<&[u8]> for ActorId {
    type Error = IdError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl Serialize for ActorId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(&self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for ActorId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let bytes = serde_bytes::ByteBuf::deserialize(deserializer)?;
            ActorId::from_bytes(bytes.as_slice()).map_err(serde::de::Error::custom)
        }
    }
}
