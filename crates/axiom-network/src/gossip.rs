// axiom-network/src/gossip.rs
//
// Generalized from the teacher's `GossipService` (topic-keyed pub/sub
// stub over libp2p gossipsub). Axiom has no pluggable topic registry —
// spec.md §4.D only ever floods one thing, `BLOCK_ANNOUNCE` — so this
// module is a thin dedup gate in front of whatever broadcasts the p2p
// layer already does, rather than a generic pub/sub bus.

use axiom_crypto::Hash;
use axiom_storage::LruCache;
use std::time::Duration;

/// The one thing Axiom floods. Kept as an enum (not a bare constant) to
/// match the teacher's topic-keyed shape and leave room for a future
/// second broadcast topic without changing the dedup key type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GossipTopic {
    BlockAnnounce,
}

/// Deduplicates rebroadcasts of the same `(topic, hash)` pair within a
/// 10-minute window, sized to 4096 entries (spec.md §4.D).
pub struct GossipDedup {
    seen: LruCache<(GossipTopic, Hash)>,
}

impl Default for GossipDedup {
    fn default() -> Self {
        Self::new()
    }
}

impl GossipDedup {
    pub fn new() -> Self {
        Self { seen: LruCache::new(4096, Duration::from_secs(600)) }
    }

    /// Returns `true` if this is the first time `hash` has been seen
    /// under `topic` — i.e. the caller should actually broadcast it.
    pub fn should_broadcast(&mut self, topic: GossipTopic, hash: Hash) -> bool {
        !self.seen.insert((topic, hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_announcement_is_broadcast() {
        let mut dedup = GossipDedup::new();
        assert!(dedup.should_broadcast(GossipTopic::BlockAnnounce, Hash::zero()));
    }

    #[test]
    fn repeat_announcement_is_suppressed() {
        let mut dedup = GossipDedup::new();
        assert!(dedup.should_broadcast(GossipTopic::BlockAnnounce, Hash::zero()));
        assert!(!dedup.should_broadcast(GossipTopic::BlockAnnounce, Hash::zero()));
    }
}
