// axiom-node/src/wiring.rs
//
// `axiom-consensus` declares `BlockSink`/`PeerSync`, and `axiom-network`
// declares `BlockValidator`, rather than either depending on the other
// directly (see each crate's module doc). This is the composition root's
// half of both bridges: a thin wrapper around `axiom_network::NetworkHandle`
// satisfying the consensus-side traits, and a `BlockValidator` that closes
// the loop the other way — running `axiom_core::Ledger`'s checks and
// committing to `axiom_storage::Database` on behalf of the transport layer.

use async_trait::async_trait;
use axiom_consensus::{slot_for, BlockSink, EquivocationGuard, LeaderSelector, PeerSync, ValidatorSet};
use axiom_core::{Block, BlockOutcome, Height, Ledger};
use axiom_crypto::Fingerprint;
use axiom_network::{BlockValidator, BlockVerdict, NetworkHandle};
use axiom_storage::Database;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub struct NetworkBridge(pub NetworkHandle);

#[async_trait]
impl BlockSink for NetworkBridge {
    async fn broadcast_block(&self, block: &Block) {
        self.0.broadcast_block(block).await;
    }
}

#[async_trait]
impl PeerSync for NetworkBridge {
    async fn max_known_height(&self) -> Option<Height> {
        self.0.max_known_height().await
    }

    async fn request_blocks(&self, since: Height) -> Vec<Block> {
        self.0.request_blocks(since).await
    }
}

/// Runs spec.md §4.C's validation against a block received over gossip and,
/// if it passes, commits it and notifies the consensus loop's
/// `BLOCK_COMMITTED` subscribers — the same steps `ConsensusLoop::try_propose`
/// takes for a block this node produces itself.
pub struct LedgerBlockValidator {
    pub db: Arc<Database>,
    pub ledger: Arc<Ledger>,
    pub validators: Arc<RwLock<ValidatorSet>>,
    pub equivocation: Arc<Mutex<EquivocationGuard>>,
}

#[async_trait]
impl BlockValidator for LedgerBlockValidator {
    async fn validate_and_commit(&self, block: Block) -> BlockVerdict {
        // A second, differently-hashed block from the same proposer at a
        // height it already proposed is rejected outright, before the
        // ordinary checks run (spec.md §8 scenario 6).
        if self.equivocation.lock().await.record(block.proposer, block.height, block.hash) {
            tracing::warn!(proposer = %block.proposer, height = block.height, "rejected equivocating block");
            return BlockVerdict::RejectedAuthority;
        }

        let tip = match self.db.chain_tip() {
            Ok(tip) => tip,
            Err(e) => {
                tracing::warn!(error = %e, "could not read chain tip while validating announced block");
                return BlockVerdict::RejectedOther;
            }
        };

        let slot = slot_for(block.timestamp);
        let expected_leader = {
            let validators = self.validators.read().await;
            LeaderSelector::leader_for(slot, tip.hash, validators.all())
        };

        let proposer_key = match self.db.get_public_key(block.proposer) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(error = %e, "could not read proposer key while validating announced block");
                return BlockVerdict::RejectedOther;
            }
        };

        let outcome = Ledger::validate_block(
            &block,
            &tip,
            proposer_key.as_ref(),
            expected_leader.unwrap_or_else(Fingerprint::genesis),
            |h| self.db.get_fact_by_hash(*h).ok().flatten().is_some(),
            |h| self.db.is_sealed(*h).unwrap_or(false),
        );

        match outcome {
            BlockOutcome::Accepted => {
                if let Err(e) = self.db.append_block(&block, &[]).await {
                    tracing::warn!(error = %e, "failed to commit validated block");
                    return BlockVerdict::RejectedOther;
                }
                self.ledger.notify_committed(block.height, block.hash);
                BlockVerdict::Accepted
            }
            BlockOutcome::Pending => BlockVerdict::Pending,
            BlockOutcome::StaleDuplicate => BlockVerdict::Stale,
            BlockOutcome::Discarded => BlockVerdict::RejectedOther,
            BlockOutcome::Rejected(axiom_core::LedgerError::BadSignature)
            | BlockOutcome::Rejected(axiom_core::LedgerError::HashMismatch)
            | BlockOutcome::Rejected(axiom_core::LedgerError::NonCanonicalFactHashes) => BlockVerdict::RejectedTampered,
            BlockOutcome::Rejected(axiom_core::LedgerError::WrongLeader(_))
            | BlockOutcome::Rejected(axiom_core::LedgerError::WrongParent) => BlockVerdict::RejectedAuthority,
            BlockOutcome::Rejected(axiom_core::LedgerError::UnresolvedFact(hash)) => BlockVerdict::PendingFacts(vec![hash]),
            BlockOutcome::Rejected(_) => BlockVerdict::RejectedOther,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiom_consensus::ValidatorSet;
    use axiom_core::Block;
    use axiom_crypto::KeyPair;
    use axiom_storage::DatabaseConfig;

    async fn open_validator() -> (LedgerBlockValidator, KeyPair, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig { path: dir.path().join("db").to_string_lossy().into_owned(), ..Default::default() };
        let db = Arc::new(Database::open(config).unwrap());
        let ledger = Arc::new(Ledger::new(1));
        let keypair = KeyPair::generate().unwrap();

        let mut validators = ValidatorSet::load(&db).unwrap();
        validators.set_stake(keypair.fingerprint(), 100);
        let validators = Arc::new(RwLock::new(validators));

        let validator = LedgerBlockValidator {
            db: db.clone(),
            ledger,
            validators,
            equivocation: Arc::new(Mutex::new(EquivocationGuard::new())),
        };
        (validator, keypair, dir)
    }

    fn sign(keypair: &KeyPair, mut block: Block) -> Block {
        block.signature = keypair.sign(block.hash.as_bytes()).unwrap();
        block
    }

    #[tokio::test]
    async fn accepts_and_commits_a_well_formed_block() {
        let (validator, keypair, _dir) = open_validator().await;
        let genesis = Block::genesis();
        let block = sign(&keypair, Ledger::propose_block(&[], &genesis, keypair.fingerprint(), 100, 0));
        validator.db.put_public_key(keypair.fingerprint(), keypair.public_key()).await.unwrap();

        let verdict = validator.validate_and_commit(block.clone()).await;
        assert_eq!(verdict, BlockVerdict::Accepted);
        assert_eq!(validator.db.chain_height().unwrap(), Some(1));
    }

    #[tokio::test]
    async fn rejects_a_block_with_no_known_proposer_key() {
        let (validator, keypair, _dir) = open_validator().await;
        let genesis = Block::genesis();
        let block = sign(&keypair, Ledger::propose_block(&[], &genesis, keypair.fingerprint(), 100, 0));
        // No put_public_key call: the validator has no way to verify the signature.
        let verdict = validator.validate_and_commit(block).await;
        assert_eq!(verdict, BlockVerdict::RejectedTampered);
    }

    #[tokio::test]
    async fn a_block_citing_an_unknown_fact_hash_is_held_pending() {
        let (validator, keypair, _dir) = open_validator().await;
        validator.db.put_public_key(keypair.fingerprint(), keypair.public_key()).await.unwrap();
        let genesis = Block::genesis();

        let missing = axiom_crypto::Hash::from_slice(&[7u8; 32]).unwrap();
        let block = sign(&keypair, Block::new_unsigned(1, genesis.hash, vec![missing], keypair.fingerprint(), 100, 0));

        let verdict = validator.validate_and_commit(block).await;
        assert_eq!(verdict, BlockVerdict::PendingFacts(vec![missing]));
        assert_eq!(validator.db.chain_height().unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_an_equivocating_second_proposal() {
        let (validator, keypair, _dir) = open_validator().await;
        validator.db.put_public_key(keypair.fingerprint(), keypair.public_key()).await.unwrap();
        let genesis = Block::genesis();

        let first = sign(&keypair, Ledger::propose_block(&[], &genesis, keypair.fingerprint(), 100, 0));
        assert_eq!(validator.validate_and_commit(first).await, BlockVerdict::Accepted);

        let mut conflicting = Ledger::propose_block(&[], &genesis, keypair.fingerprint(), 100, 1);
        conflicting.height = 1;
        let conflicting = sign(&keypair, conflicting);
        assert_eq!(validator.validate_and_commit(conflicting).await, BlockVerdict::RejectedAuthority);
    }
}
