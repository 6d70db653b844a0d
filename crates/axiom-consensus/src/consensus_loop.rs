// axiom-consensus/src/consensus_loop.rs
//
// The slot-driven state machine, generalized from the teacher's
// `PoASConsensus` (which combined proposer selection, block validation,
// fork bookkeeping and reward/slashing accounting into one struct). Axiom
// splits those concerns: leader selection lives in `leader`, validation
// lives in `axiom_core::Ledger`, storage in `axiom_storage::Database`, and
// this module is left with exactly what spec.md §4.E assigns to it — the
// state transitions and the single-vote guard around signing.
//
// This crate has no dependency on `axiom-network` (that would invert the
// documented dependency graph), so the loop reaches the outside world
// only through the two small traits below, which `axiom-node`'s runtime
// implements over the real transport.

use crate::leader::{slot_for, LeaderSelector, SLOT_DURATION_SECS};
use crate::validator_set::ValidatorSet;
use crate::{ConsensusError, ConsensusResult};
use async_trait::async_trait;
use axiom_core::{Block, BlockOutcome, Height, Ledger};
use axiom_crypto::{Fingerprint, KeyPair};
use axiom_storage::Database;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Outbound half of the network boundary: broadcasting a block this node
/// produced.
#[async_trait]
pub trait BlockSink: Send + Sync {
    async fn broadcast_block(&self, block: &Block);
}

/// Inbound half: what the rest of the network claims its chain height is,
/// and how to pull blocks to catch up to it.
#[async_trait]
pub trait PeerSync: Send + Sync {
    async fn max_known_height(&self) -> Option<Height>;
    async fn request_blocks(&self, since: Height) -> Vec<Block>;
}

/// Mirrors spec.md's `Init -> Syncing -> Ready <-> Proposing <-> Awaiting -> Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Init,
    Syncing,
    Ready,
    Proposing,
    Awaiting,
}

pub struct ConsensusLoop {
    db: Arc<Database>,
    ledger: Arc<Ledger>,
    keypair: Arc<KeyPair>,
    validators: Arc<RwLock<ValidatorSet>>,
    sink: Arc<dyn BlockSink>,
    peers: Arc<dyn PeerSync>,
    state: LoopState,
}

impl ConsensusLoop {
    pub fn new(
        db: Arc<Database>,
        ledger: Arc<Ledger>,
        keypair: Arc<KeyPair>,
        validators: Arc<RwLock<ValidatorSet>>,
        sink: Arc<dyn BlockSink>,
        peers: Arc<dyn PeerSync>,
    ) -> Self {
        Self { db, ledger, keypair, validators, sink, peers, state: LoopState::Init }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Runs forever, driven by a 1-second tick (fine-grained enough to
    /// notice slot boundaries and catch-up deadlines without busy-waiting)
    /// plus `BLOCK_COMMITTED` events from the ledger, which reset whatever
    /// the loop was doing back to `Ready` so the next slot starts clean.
    pub async fn run(mut self) {
        self.state = LoopState::Syncing;
        let mut committed = self.ledger.subscribe_committed();
        let mut ticker = tokio::time::interval(Duration::from_secs(1));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.on_tick().await {
                        tracing::warn!(error = %e, "consensus tick failed");
                    }
                }
                event = committed.recv() => {
                    if event.is_ok() {
                        self.state = LoopState::Ready;
                    }
                }
            }
        }
    }

    async fn on_tick(&mut self) -> ConsensusResult<()> {
        if self.is_behind().await {
            self.state = LoopState::Syncing;
            self.catch_up().await?;
            return Ok(());
        }

        if self.state == LoopState::Syncing {
            self.state = LoopState::Ready;
        }

        if self.state != LoopState::Ready {
            return Ok(());
        }

        self.try_propose().await
    }

    async fn is_behind(&self) -> bool {
        let local = self.db.chain_height().ok().flatten().unwrap_or(0);
        match self.peers.max_known_height().await {
            Some(max) => local + 1 < max,
            None => false,
        }
    }

    async fn catch_up(&mut self) -> ConsensusResult<()> {
        let local = self.db.chain_height().map_err(|e| ConsensusError::Storage(e.to_string()))?.unwrap_or(0);
        let blocks = self.peers.request_blocks(local).await;
        for block in blocks {
            let tip = self.db.chain_tip().map_err(|e| ConsensusError::Storage(e.to_string()))?;
            let validators = self.validators.read().await;
            let leader = Self::expected_leader(&tip, &block, &validators);
            drop(validators);
            let proposer_key = self.db.get_public_key(block.proposer).map_err(|e| ConsensusError::Storage(e.to_string()))?;
            let outcome = Ledger::validate_block(
                &block,
                &tip,
                proposer_key.as_ref(),
                leader.unwrap_or_else(Fingerprint::genesis),
                |h| self.db.get_fact_by_hash(*h).ok().flatten().is_some(),
                |h| self.db.is_sealed(*h).unwrap_or(false),
            );
            match outcome {
                BlockOutcome::Accepted => {
                    self.db.append_block(&block, &[]).await.map_err(|e| ConsensusError::Storage(e.to_string()))?;
                    self.ledger.notify_committed(block.height, block.hash);
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn expected_leader(previous: &Block, candidate: &Block, validators: &ValidatorSet) -> Option<Fingerprint> {
        let slot = slot_for(candidate.timestamp);
        LeaderSelector::leader_for(slot, previous.hash, validators.all())
    }

    async fn try_propose(&mut self) -> ConsensusResult<()> {
        let validators = self.validators.read().await;
        let fingerprint = self.keypair.fingerprint();
        if !validators.is_validator(&fingerprint) {
            return Ok(());
        }

        let tip = self.db.chain_tip().map_err(|e| ConsensusError::Storage(e.to_string()))?;
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let slot = slot_for(now);
        let leader = LeaderSelector::leader_for(slot, tip.hash, validators.all());
        drop(validators);

        if leader != Some(fingerprint) {
            return Ok(());
        }

        let next_height = tip.height + 1;
        if !self
            .db
            .record_signed_height(next_height)
            .await
            .map_err(|e| ConsensusError::Storage(e.to_string()))?
        {
            tracing::warn!(height = next_height, "refusing to sign: already signed at or above this height");
            return Ok(());
        }

        self.state = LoopState::Proposing;

        let candidates = self
            .db
            .list_unsealed_trusted_facts(axiom_core::MAX_FACTS_PER_BLOCK)
            .map_err(|e| ConsensusError::Storage(e.to_string()))?;
        let mut block = Ledger::propose_block(&candidates, &tip, fingerprint, now, slot);
        let signature = self.keypair.sign(block.hash.as_bytes()).map_err(|e| ConsensusError::Crypto(e.to_string()))?;
        block.signature = signature;

        self.db
            .append_block(&block, &candidates)
            .await
            .map_err(|e| ConsensusError::Storage(e.to_string()))?;
        self.ledger.notify_committed(block.height, block.hash);
        self.sink.broadcast_block(&block).await;

        self.state = LoopState::Awaiting;
        Ok(())
    }
}

/// Deterministic tie-break for two valid blocks proposed at the same
/// height: the lexicographically smaller hash wins. A node that already
/// committed the loser does not roll back — operators reconcile diverged
/// nodes manually (spec.md §4.E).
pub fn resolve_height_conflict(a: &Block, b: &Block) -> axiom_crypto::Hash {
    if a.hash < b.hash {
        a.hash
    } else {
        b.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_resolution_picks_smaller_hash() {
        let mut a = Block::genesis();
        a.hash = axiom_crypto::Hash::new([1u8; 32]);
        let mut b = Block::genesis();
        b.hash = axiom_crypto::Hash::new([2u8; 32]);
        assert_eq!(resolve_height_conflict(&a, &b), a.hash);
        assert_eq!(resolve_height_conflict(&b, &a), a.hash);
    }
}
