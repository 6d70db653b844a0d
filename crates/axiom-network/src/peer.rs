// axiom-network/src/peer.rs
//
// Generalized from the teacher's `PeerManager` (add/remove/reputation/
// ban/prune/best_peer over an in-memory `HashMap<PeerId, PeerInfo>`). The
// shape survives; what changes is what a peer *is* (`axiom_core::PeerRecord`
// keyed by `Fingerprint` rather than a random `PeerId`) and what moves its
// reputation (spec.md §4.D's fixed deltas rather than the teacher's
// open-ended scoring).

use axiom_core::PeerRecord;
use axiom_crypto::Fingerprint;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Hard cap on how many peers this node tracks concurrently (spec.md §4.D).
pub const MAX_PEERS: usize = 32;

/// How long a disconnected, misbehaving peer stays blacklisted.
pub const BLACKLIST_TTL: Duration = Duration::from_secs(3600);

/// Named reputation adjustments, spec.md §4.D's exact table. Kept as an
/// enum (rather than bare `i32` deltas scattered at call sites) so every
/// caller names *why* it's adjusting reputation, which is what the log
/// lines and any future audit of penalty application actually need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReputationDelta {
    ValidatedBlock,
    FactPull,
    MalformedMessage,
    BadSignatureOrAuthority,
    OversizeFrame,
    Timeout,
}

impl ReputationDelta {
    pub fn value(self) -> i32 {
        match self {
            ReputationDelta::ValidatedBlock => 1,
            ReputationDelta::FactPull => 1,
            ReputationDelta::MalformedMessage => -5,
            ReputationDelta::BadSignatureOrAuthority => -20,
            ReputationDelta::OversizeFrame => -20,
            ReputationDelta::Timeout => -1,
        }
    }
}

/// In-memory view over known peers, backed by `axiom_storage::Database`
/// for persistence (the caller is responsible for calling `upsert_peer`
/// after a mutation it wants to survive a restart).
pub struct PeerManager {
    peers: HashMap<Fingerprint, PeerRecord>,
    blacklist: HashMap<Fingerprint, Instant>,
}

impl Default for PeerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerManager {
    pub fn new() -> Self {
        Self { peers: HashMap::new(), blacklist: HashMap::new() }
    }

    pub fn load(records: Vec<PeerRecord>) -> Self {
        let mut manager = Self::new();
        for record in records {
            manager.peers.insert(record.public_key, record);
        }
        manager
    }

    /// Admits a newly-seen peer, refusing if the set is full or the peer
    /// is currently blacklisted.
    pub fn admit(&mut self, address: SocketAddr, fingerprint: Fingerprint, now: u64) -> Result<(), crate::NetworkError> {
        if self.is_blacklisted(&fingerprint) {
            return Err(crate::NetworkError::Blacklisted(fingerprint));
        }
        if self.peers.len() >= MAX_PEERS && !self.peers.contains_key(&fingerprint) {
            return Err(crate::NetworkError::PeerSetFull);
        }
        self.peers
            .entry(fingerprint)
            .and_modify(|p| p.last_seen = now)
            .or_insert_with(|| PeerRecord::new(address, fingerprint, now));
        Ok(())
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&PeerRecord> {
        self.peers.get(fingerprint)
    }

    pub fn all(&self) -> Vec<PeerRecord> {
        self.peers.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Applies a named delta. A peer whose reputation is driven to the
    /// floor is disconnected and blacklisted for `BLACKLIST_TTL` (spec.md
    /// §4.D: "reputation < 0" — reputation is stored clamped to
    /// `[0, 1000]`, so hitting the floor on a penalizing delta is the same
    /// event). New peers are seeded at `REPUTATION_INITIAL`, well above the
    /// floor, so this only fires after sustained bad behaviour rather than
    /// on a peer's very first infraction. The caller is responsible for
    /// actually closing the connection when this returns `true`.
    pub fn apply_reputation(&mut self, fingerprint: &Fingerprint, delta: ReputationDelta) -> bool {
        let Some(record) = self.peers.get_mut(fingerprint) else { return false };
        let penalizing = delta.value() < 0;
        record.adjust_reputation(delta.value());
        let disconnect = penalizing && record.reputation_score == 0;
        if disconnect {
            self.peers.remove(fingerprint);
            self.blacklist.insert(*fingerprint, Instant::now());
        }
        disconnect
    }

    pub fn is_blacklisted(&mut self, fingerprint: &Fingerprint) -> bool {
        self.prune_blacklist();
        self.blacklist.contains_key(fingerprint)
    }

    fn prune_blacklist(&mut self) {
        let now = Instant::now();
        self.blacklist.retain(|_, banned_at| now.duration_since(*banned_at) < BLACKLIST_TTL);
    }

    /// The peer with the highest reputation, used to pick a sync target.
    pub fn best_peer(&self) -> Option<&PeerRecord> {
        self.peers.values().max_by_key(|p| p.reputation_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(seed: u8) -> Fingerprint {
        Fingerprint::new([seed; 32])
    }

    fn addr() -> SocketAddr {
        "127.0.0.1:9000".parse().unwrap()
    }

    #[test]
    fn admit_adds_a_new_peer() {
        let mut mgr = PeerManager::new();
        mgr.admit(addr(), fp(1), 100).unwrap();
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn admit_rejects_when_full() {
        let mut mgr = PeerManager::new();
        for i in 0..MAX_PEERS {
            mgr.admit(addr(), fp(i as u8), 100).unwrap();
        }
        let result = mgr.admit(addr(), fp(250), 100);
        assert!(result.is_err());
    }

    #[test]
    fn a_single_minor_penalty_does_not_disconnect_a_fresh_peer() {
        let mut mgr = PeerManager::new();
        mgr.admit(addr(), fp(1), 100).unwrap();
        let disconnected = mgr.apply_reputation(&fp(1), ReputationDelta::MalformedMessage);
        assert!(!disconnected);
        assert!(mgr.get(&fp(1)).is_some());
    }

    #[test]
    fn reputation_floor_triggers_blacklist_and_removal() {
        let mut mgr = PeerManager::new();
        mgr.admit(addr(), fp(1), 100).unwrap();
        let mut disconnected = false;
        for _ in 0..5 {
            disconnected = mgr.apply_reputation(&fp(1), ReputationDelta::BadSignatureOrAuthority);
        }
        assert!(disconnected);
        assert!(mgr.get(&fp(1)).is_none());
        assert!(mgr.is_blacklisted(&fp(1)));
    }

    #[test]
    fn blacklisted_peer_is_refused_admission() {
        let mut mgr = PeerManager::new();
        mgr.admit(addr(), fp(1), 100).unwrap();
        for _ in 0..5 {
            mgr.apply_reputation(&fp(1), ReputationDelta::BadSignatureOrAuthority);
        }
        let result = mgr.admit(addr(), fp(1), 200);
        assert!(matches!(result, Err(crate::NetworkError::Blacklisted(_))));
    }

    #[test]
    fn best_peer_picks_highest_reputation() {
        let mut mgr = PeerManager::new();
        mgr.admit(addr(), fp(1), 100).unwrap();
        mgr.admit(addr(), fp(2), 100).unwrap();
        mgr.apply_reputation(&fp(2), ReputationDelta::ValidatedBlock);
        assert_eq!(mgr.best_peer().unwrap().public_key, fp(2));
    }
}
