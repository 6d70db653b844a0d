// axiom-core/src/types.rs

use axiom_crypto::Fingerprint;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Block height; genesis is 0.
pub type Height = u64;

/// Dense, per-node monotone fact identifier.
pub type FactId = u64;

/// UNIX seconds.
pub type Timestamp = u64;

/// Maximum number of facts a single block may contain (spec.md §4.C).
pub const MAX_FACTS_PER_BLOCK: usize = 512;

/// The relationship a [`FactLink`] expresses between two facts.
///
/// The spec leaves this taxonomy open ("can be extended without breaking
/// the protocol as long as unknown kinds round-trip"), so the closed,
/// named variants are kept alongside an `Other` catch-all rather than
/// rejecting anything outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationshipKind {
    Related,
    Causation,
    Chronology,
    Contrast,
    Elaboration,
    Other(String),
}

impl RelationshipKind {
    fn as_str(&self) -> &str {
        match self {
            RelationshipKind::Related => "related",
            RelationshipKind::Causation => "causation",
            RelationshipKind::Chronology => "chronology",
            RelationshipKind::Contrast => "contrast",
            RelationshipKind::Elaboration => "elaboration",
            RelationshipKind::Other(s) => s.as_str(),
        }
    }

    fn from_str_value(s: &str) -> Self {
        match s {
            "related" => RelationshipKind::Related,
            "causation" => RelationshipKind::Causation,
            "chronology" => RelationshipKind::Chronology,
            "contrast" => RelationshipKind::Contrast,
            "elaboration" => RelationshipKind::Elaboration,
            other => RelationshipKind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Serialized as a bare string so that a variant unknown to this build
// (an `Other(..)`) round-trips byte-for-byte through any peer, matching
// spec.md §9's instruction that the relationship taxonomy not be treated
// as closed at the wire level.
impl Serialize for RelationshipKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RelationshipKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(RelationshipKind::from_str_value(&s))
    }
}

/// A directed edge from one fact to another, tagged with its relationship kind.
///
/// `links` on a [`crate::fact::Fact`] is a multiset: the same `(target, kind)`
/// pair may legitimately appear more than once (e.g. re-derived by a later
/// extraction pass), so this is a plain `Vec`, not a `HashSet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactLink {
    pub target: FactId,
    pub kind: RelationshipKind,
}

/// Provenance of a fact: which domain it was retrieved from, and when.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceRecord {
    pub domain: String,
    pub retrieved_at: Timestamp,
}

/// Reputation is clamped to `[0, 1000]` by [`PeerRecord::adjust_reputation`].
pub const REPUTATION_MIN: i32 = 0;
pub const REPUTATION_MAX: i32 = 1000;

/// Reputation a freshly-admitted peer starts at. Must be strictly above
/// `REPUTATION_MIN` — a peer seeded at the floor would be disconnected by
/// its very first penalizing delta (even a single malformed message)
/// before it had any chance to demonstrate good behaviour.
pub const REPUTATION_INITIAL: i32 = 100;

/// A peer the local node knows about, maintained by `axiom-network` and
/// persisted by `axiom-storage`. Defined here (rather than in
/// `axiom-network`) so storage can hold it without depending on the
/// network crate — see DESIGN.md.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub network_address: SocketAddr,
    pub public_key: Fingerprint,
    pub first_seen: Timestamp,
    pub last_seen: Timestamp,
    pub reputation_score: i32,
}

impl PeerRecord {
    pub fn new(network_address: SocketAddr, public_key: Fingerprint, now: Timestamp) -> Self {
        Self { network_address, public_key, first_seen: now, last_seen: now, reputation_score: REPUTATION_INITIAL }
    }

    /// Apply a reputation delta, clamped to `[0, 1000]`.
    pub fn adjust_reputation(&mut self, delta: i32) {
        self.reputation_score = (self.reputation_score + delta).clamp(REPUTATION_MIN, REPUTATION_MAX);
    }
}

/// A validator's registered stake. `stake == 0` means "not an active
/// validator" (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidatorRecord {
    pub public_key_fingerprint: Fingerprint,
    pub stake: u64,
}

impl ValidatorRecord {
    pub fn is_active(&self) -> bool {
        self.stake > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_relationship_kind_round_trips() {
        let kind = RelationshipKind::Other("supersedes".into());
        let json = serde_json::to_string(&kind).unwrap();
        let back: RelationshipKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, back);
    }

    #[test]
    fn known_relationship_kind_round_trips() {
        for kind in [
            RelationshipKind::Related,
            RelationshipKind::Causation,
            RelationshipKind::Chronology,
            RelationshipKind::Contrast,
            RelationshipKind::Elaboration,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            let back: RelationshipKind = serde_json::from_str(&json).unwrap();
            assert_eq!(kind, back);
        }
    }
}
