// axiom-network/src/sync.rs
//
// Generalized from the teacher's `SyncManager` (strategy-selecting full/
// fast/warp sync state machine). Axiom has one sync strategy — pull
// blocks above the local tip from the best-reputed peer — so this module
// is reduced to tracking that one status and issuing the `REQUEST_BLOCKS`
// round trip; `axiom-consensus`'s `ConsensusLoop` drives it through the
// `PeerSync` trait rather than this module owning the timer itself.

use axiom_core::Height;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Local height is within one block of the best known peer height.
    Synced,
    /// Actively pulling blocks to catch up.
    Syncing { target_height: Height },
}

/// Tracks sync status derived from the highest chain height any
/// connected peer has advertised (via `HELLO` or `BLOCK_ANNOUNCE`).
#[derive(Debug, Default)]
pub struct SyncManager {
    max_peer_height: Option<Height>,
}

impl SyncManager {
    pub fn new() -> Self {
        Self { max_peer_height: None }
    }

    pub fn observe_peer_height(&mut self, height: Height) {
        self.max_peer_height = Some(self.max_peer_height.map_or(height, |current| current.max(height)));
    }

    pub fn max_known_height(&self) -> Option<Height> {
        self.max_peer_height
    }

    pub fn status(&self, local_height: Height) -> SyncStatus {
        match self.max_peer_height {
            Some(max) if local_height + 1 < max => SyncStatus::Syncing { target_height: max },
            _ => SyncStatus::Synced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synced_when_no_peers_known() {
        let sync = SyncManager::new();
        assert_eq!(sync.status(0), SyncStatus::Synced);
    }

    #[test]
    fn synced_within_one_block_of_peer_height() {
        let mut sync = SyncManager::new();
        sync.observe_peer_height(10);
        assert_eq!(sync.status(9), SyncStatus::Synced);
    }

    #[test]
    fn syncing_when_behind_by_more_than_one() {
        let mut sync = SyncManager::new();
        sync.observe_peer_height(10);
        assert_eq!(sync.status(5), SyncStatus::Syncing { target_height: 10 });
    }

    #[test]
    fn observe_peer_height_tracks_the_maximum() {
        let mut sync = SyncManager::new();
        sync.observe_peer_height(5);
        sync.observe_peer_height(10);
        sync.observe_peer_height(3);
        assert_eq!(sync.max_known_height(), Some(10));
    }
}
