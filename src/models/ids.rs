//! Entity identifiers and deterministic synthetic ids.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Prefix carried by every synthetic placeholder id.
pub const PLACEHOLDER_PREFIX: &str = "tbd:";

/// An entity id as supplied by the data source, or synthesized from a hash.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap a source id as-is.
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Hash input fields with SHA256 and keep the first 16 hex characters.
    pub fn generate(fields: &[&str]) -> Self {
        Self(slot_hash(fields))
    }

    /// Synthetic id for a side whose occupant is unknown.
    ///
    /// The hash covers the slot (match id and side key), never the team name,
    /// so placeholders cannot collide with real teams or with each other.
    pub fn placeholder(slot: &[&str]) -> Self {
        Self(format!("{}{}", PLACEHOLDER_PREFIX, slot_hash(slot)))
    }

    /// Check whether this id was minted by [`EntityId::placeholder`].
    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn slot_hash(fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            hasher.update(b"|");
        }
        hasher.update(field.as_bytes());
    }
    let hash = hex::encode(hasher.finalize());
    hash[..16].to_string()
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Type alias for team ids
pub type TeamId = EntityId;

/// Type alias for match ids
pub type MatchId = EntityId;

/// Type alias for player ids
pub type PlayerId = EntityId;
