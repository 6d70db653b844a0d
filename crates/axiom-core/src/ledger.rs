// axiom-core/src/ledger.rs
//
// The fact-ledger algorithms: block construction and block validation.
//
// `Ledger` is deliberately storage-free. It never touches disk; callers
// (axiom-consensus's slot loop, axiom-network's block-announce handler) are
// responsible for querying axiom-storage::Database for whatever this
// module needs — the unsealed trusted fact set, the chain tip, the fact a
// hash resolves to — and pass the results in. This keeps axiom-core free of
// a dependency on axiom-storage (which itself depends on axiom-core for the
// `Block`/`Fact` types), and keeps the five validation checks in spec.md
// §4.C expressed as pure functions a unit test can drive without RocksDB.

use crate::block::Block;
use crate::fact::Fact;
use crate::types::{FactId, Height, SourceRecord, Timestamp, MAX_FACTS_PER_BLOCK};
use axiom_crypto::{Fingerprint, Hash, PublicKey};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Result of [`Ledger::ingest_fact`]: either a brand-new fact the caller
/// should persist, or a corroboration of a fact the caller already has by
/// id (the caller loads it, applies `Fact::corroborate`, and persists it).
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    New(Fact),
    Corroborated { id: FactId, source: SourceRecord },
    /// Content was empty after trimming; nothing to ingest.
    Empty,
}

/// Emitted on successful commit; the consensus loop subscribes to reset its
/// slot timer (spec.md §4.C "Commit").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCommitted {
    pub height: Height,
    pub hash: Hash,
}

/// Outcome of [`Ledger::validate_block`], mirroring spec.md §4.C step 2's
/// three-way split on `height` plus the terminal accept/reject outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockOutcome {
    /// Passed all five checks; the caller should commit it.
    Accepted,
    /// `height` is more than one past the local tip: hold it and start a
    /// chain-sync with the sender.
    Pending,
    /// `height <= tip.height` and it matches an already-committed block at
    /// that height: idempotent no-op.
    StaleDuplicate,
    /// `height <= tip.height` and it does not match history: ignore.
    Discarded,
    /// Failed a structural/authority/content/invariant check.
    Rejected(LedgerError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("signature does not verify against the declared proposer")]
    BadSignature,
    #[error("block hash does not match its own fields")]
    HashMismatch,
    #[error("fact_hashes are not sorted ascending or contain duplicates")]
    NonCanonicalFactHashes,
    #[error("previous_hash does not match the local chain tip")]
    WrongParent,
    #[error("proposer {0} is not the expected leader for this height")]
    WrongLeader(Fingerprint),
    #[error("block exceeds the {MAX_FACTS_PER_BLOCK}-fact limit")]
    TooManyFacts,
    #[error("fact hash {0} could not be resolved locally in time")]
    UnresolvedFact(Hash),
    #[error("fact hash {0} is already sealed in an ancestor block")]
    AlreadySealed(Hash),
}

/// The storage-free half of the fact ledger: block construction and
/// validation, plus the in-memory monotone fact-id counter and the
/// `BLOCK_COMMITTED` event bus.
pub struct Ledger {
    next_fact_id: AtomicU64,
    committed_tx: broadcast::Sender<BlockCommitted>,
}

impl Ledger {
    /// `next_id_seed` is the smallest unused fact id, derived by the caller
    /// from storage at startup (e.g. `max(existing ids) + 1`, or `1` for a
    /// fresh ledger).
    pub fn new(next_id_seed: u64) -> Self {
        let (committed_tx, _) = broadcast::channel(256);
        Self { next_fact_id: AtomicU64::new(next_id_seed), committed_tx }
    }

    pub fn subscribe_committed(&self) -> broadcast::Receiver<BlockCommitted> {
        self.committed_tx.subscribe()
    }

    pub fn notify_committed(&self, height: Height, hash: Hash) {
        // No receivers is fine (e.g. in tests); broadcast::Sender::send
        // only errors when the channel has no subscribers at all.
        let _ = self.committed_tx.send(BlockCommitted { height, hash });
    }

    /// Allocate the next dense, monotone fact id.
    pub fn next_fact_id(&self) -> u64 {
        self.next_fact_id.fetch_add(1, Ordering::SeqCst)
    }

    /// The ingestion port named in spec.md §1/§6.2. `content` is trimmed
    /// here (callers — including facts reconstructed from storage or the
    /// wire — never re-validate it, per [`Fact::new`]'s contract).
    /// `find_existing` resolves already-ingested content to its fact id
    /// (`axiom_storage::Database::find_fact_id_by_content`), so repeat
    /// content corroborates instead of minting a second fact (spec.md §8
    /// scenario 5, invariant 4).
    pub fn ingest_fact(
        &self,
        content: String,
        semantics: serde_json::Value,
        source: SourceRecord,
        now: Timestamp,
        find_existing: impl Fn(&str) -> Option<FactId>,
    ) -> IngestOutcome {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return IngestOutcome::Empty;
        }
        match find_existing(trimmed) {
            Some(id) => IngestOutcome::Corroborated { id, source },
            None => {
                let id = self.next_fact_id();
                IngestOutcome::New(Fact::new(id, trimmed.to_string(), semantics, source, now))
            }
        }
    }

    /// Block construction, spec.md §4.C:
    /// 1. `candidates` is assumed already filtered to unsealed, trusted,
    ///    non-disputed facts, ordered by id ascending (tie-break by hash) —
    ///    the caller gets this from `Database::list_unsealed_trusted_facts`.
    /// 2. Truncate to `MAX_FACTS_PER_BLOCK` and collect hashes.
    /// 3/4. Fill height/previous_hash/proposer/timestamp/nonce and hash.
    ///
    /// An empty `candidates` list is valid (§8 "empty proposal").
    pub fn propose_block(
        candidates: &[Fact],
        previous: &Block,
        proposer: Fingerprint,
        timestamp: u64,
        nonce: u64,
    ) -> Block {
        let fact_hashes: Vec<Hash> = candidates.iter().take(MAX_FACTS_PER_BLOCK).map(|f| f.hash).collect();
        Block::new_unsigned(previous.height + 1, previous.hash, fact_hashes, proposer, timestamp, nonce)
    }

    /// Block validation, spec.md §4.C, five ordered checks.
    ///
    /// - `local_tip`: the block at the local chain's current height.
    /// - `stale_lookup`: resolves `height -> hash` for already-committed
    ///   blocks at or before the tip, to distinguish `StaleDuplicate` from
    ///   `Discarded`.
    /// - `expected_leader`: precomputed by the caller via
    ///   `axiom_consensus::LeaderSelector` (core stays agnostic of the
    ///   stake-weighted selection algorithm).
    /// - `resolve_fact`: resolves a fact hash to a known `Fact`, after the
    ///   caller has already performed any `REQUEST_FACTS` pull with its own
    ///   `FACT_PULL_TIMEOUT` budget — by the time this runs, content
    ///   checking is synchronous.
    /// - `is_sealed`: true if the hash is already sealed in an ancestor.
    pub fn validate_block(
        block: &Block,
        local_tip: &Block,
        proposer_key: Option<&PublicKey>,
        expected_leader: Fingerprint,
        resolve_fact: impl Fn(&Hash) -> bool,
        is_sealed: impl Fn(&Hash) -> bool,
    ) -> BlockOutcome {
        // 1. Structural.
        if !block.hash_is_consistent() {
            return BlockOutcome::Rejected(LedgerError::HashMismatch);
        }
        if !block.fact_hashes_are_canonical() {
            return BlockOutcome::Rejected(LedgerError::NonCanonicalFactHashes);
        }
        if !block.is_genesis() {
            match proposer_key {
                Some(key) => match key.verify(block.hash.as_bytes(), &block.signature) {
                    Ok(true) => {}
                    _ => return BlockOutcome::Rejected(LedgerError::BadSignature),
                },
                None => return BlockOutcome::Rejected(LedgerError::BadSignature),
            }
        }

        // 2. Chain linkage.
        if block.height > local_tip.height + 1 {
            return BlockOutcome::Pending;
        }
        if block.height <= local_tip.height {
            return if is_sealed_block_match(block, local_tip) {
                BlockOutcome::StaleDuplicate
            } else {
                BlockOutcome::Discarded
            };
        }
        if block.previous_hash != local_tip.hash {
            return BlockOutcome::Rejected(LedgerError::WrongParent);
        }

        // 3. Authority.
        if !block.is_genesis() && block.proposer != expected_leader {
            return BlockOutcome::Rejected(LedgerError::WrongLeader(block.proposer));
        }

        // 5a. Size and duplicate checks (cheap, done before the content check).
        if block.fact_hashes.len() > MAX_FACTS_PER_BLOCK {
            return BlockOutcome::Rejected(LedgerError::TooManyFacts);
        }
        let mut seen = HashSet::with_capacity(block.fact_hashes.len());
        for h in &block.fact_hashes {
            if !seen.insert(*h) {
                return BlockOutcome::Rejected(LedgerError::NonCanonicalFactHashes);
            }
            if is_sealed(h) {
                return BlockOutcome::Rejected(LedgerError::AlreadySealed(*h));
            }
        }

        // 4. Content: every fact hash must resolve locally.
        for h in &block.fact_hashes {
            if !resolve_fact(h) {
                return BlockOutcome::Rejected(LedgerError::UnresolvedFact(*h));
            }
        }

        BlockOutcome::Accepted
    }
}

/// A block at or before the tip matches history only if it's literally the
/// tip itself (this crate is not handed the full historical index — the
/// caller who already knows the block's stored hash at that height should
/// prefer comparing against its own lookup; this conservative check covers
/// the common re-delivery-of-the-tip case cheaply).
fn is_sealed_block_match(block: &Block, local_tip: &Block) -> bool {
    block.height == local_tip.height && block.hash == local_tip.hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceRecord;
    use axiom_crypto::hash::Hashable;

    fn fact(id: u64) -> Fact {
        Fact::new(
            id,
            format!("fact number {id}"),
            serde_json::json!({}),
            SourceRecord { domain: "example.com".into(), retrieved_at: 1 },
            1,
        )
    }

    fn src(domain: &str) -> SourceRecord {
        SourceRecord { domain: domain.into(), retrieved_at: 1 }
    }

    #[test]
    fn ingest_fact_mints_a_new_fact_when_content_is_unseen() {
        let ledger = Ledger::new(1);
        let outcome = ledger.ingest_fact("  the sky is blue  ".into(), serde_json::json!({}), src("a.com"), 1, |_| None);
        match outcome {
            IngestOutcome::New(fact) => {
                assert_eq!(fact.content, "the sky is blue");
                assert_eq!(fact.id, 1);
            }
            other => panic!("expected New, got {other:?}"),
        }
    }

    #[test]
    fn ingest_fact_corroborates_when_content_already_known() {
        let ledger = Ledger::new(1);
        let outcome = ledger.ingest_fact("the sky is blue".into(), serde_json::json!({}), src("b.com"), 2, |_| Some(1));
        assert_eq!(outcome, IngestOutcome::Corroborated { id: 1, source: src("b.com") });
    }

    #[test]
    fn ingest_fact_rejects_blank_content() {
        let ledger = Ledger::new(1);
        let outcome = ledger.ingest_fact("   ".into(), serde_json::json!({}), src("a.com"), 1, |_| None);
        assert_eq!(outcome, IngestOutcome::Empty);
    }

    #[test]
    fn propose_block_sorts_and_caps() {
        let facts: Vec<Fact> = (1..=5).map(fact).collect();
        let genesis = Block::genesis();
        let block = Ledger::propose_block(&facts, &genesis, Fingerprint::genesis(), 100, 0);
        assert_eq!(block.height, 1);
        assert!(block.fact_hashes_are_canonical());
        assert_eq!(block.fact_hashes.len(), 5);
    }

    #[test]
    fn empty_proposal_is_valid() {
        let genesis = Block::genesis();
        let block = Ledger::propose_block(&[], &genesis, Fingerprint::genesis(), 100, 0);
        assert!(block.fact_hashes.is_empty());
    }

    #[test]
    fn validate_accepts_genesis_successor_with_known_facts() {
        let genesis = Block::genesis();
        let facts: Vec<Fact> = vec![fact(1)];
        let keypair = axiom_crypto::KeyPair::generate().unwrap();
        let mut block = Ledger::propose_block(&facts, &genesis, keypair.fingerprint(), 100, 0);
        block.signature = keypair.sign(block.hash.as_bytes()).unwrap();

        let outcome = Ledger::validate_block(
            &block,
            &genesis,
            Some(keypair.public_key()),
            keypair.fingerprint(),
            |h| *h == facts[0].hash,
            |_| false,
        );
        assert_eq!(outcome, BlockOutcome::Accepted);
    }

    #[test]
    fn validate_rejects_wrong_leader() {
        let genesis = Block::genesis();
        let keypair = axiom_crypto::KeyPair::generate().unwrap();
        let other = axiom_crypto::KeyPair::generate().unwrap();
        let mut block = Ledger::propose_block(&[], &genesis, keypair.fingerprint(), 100, 0);
        block.signature = keypair.sign(block.hash.as_bytes()).unwrap();

        let outcome = Ledger::validate_block(
            &block,
            &genesis,
            Some(keypair.public_key()),
            other.fingerprint(),
            |_| true,
            |_| false,
        );
        assert_eq!(outcome, BlockOutcome::Rejected(LedgerError::WrongLeader(keypair.fingerprint())));
    }

    #[test]
    fn validate_detects_tampered_hash() {
        let genesis = Block::genesis();
        let keypair = axiom_crypto::KeyPair::generate().unwrap();
        let mut block = Ledger::propose_block(&[], &genesis, keypair.fingerprint(), 100, 0);
        block.signature = keypair.sign(block.hash.as_bytes()).unwrap();
        block.nonce += 1; // tamper without recomputing hash

        let outcome = Ledger::validate_block(
            &block,
            &genesis,
            Some(keypair.public_key()),
            keypair.fingerprint(),
            |_| true,
            |_| false,
        );
        assert_eq!(outcome, BlockOutcome::Rejected(LedgerError::HashMismatch));
    }

    #[test]
    fn validate_defers_future_height_to_pending() {
        let genesis = Block::genesis();
        let keypair = axiom_crypto::KeyPair::generate().unwrap();
        let mut far = Block::new_unsigned(5, "deadbeef".as_bytes().hash(), vec![], keypair.fingerprint(), 100, 0);
        far.signature = keypair.sign(far.hash.as_bytes()).unwrap();

        let outcome = Ledger::validate_block(&far, &genesis, Some(keypair.public_key()), keypair.fingerprint(), |_| true, |_| false);
        assert_eq!(outcome, BlockOutcome::Pending);
    }

    #[test]
    fn validate_rejects_already_sealed_fact() {
        let genesis = Block::genesis();
        let keypair = axiom_crypto::KeyPair::generate().unwrap();
        let facts: Vec<Fact> = vec![fact(1)];
        let mut block = Ledger::propose_block(&facts, &genesis, keypair.fingerprint(), 100, 0);
        block.signature = keypair.sign(block.hash.as_bytes()).unwrap();

        let outcome = Ledger::validate_block(
            &block,
            &genesis,
            Some(keypair.public_key()),
            keypair.fingerprint(),
            |h| *h == facts[0].hash,
            |h| *h == facts[0].hash,
        );
        assert_eq!(outcome, BlockOutcome::Rejected(LedgerError::AlreadySealed(facts[0].hash)));
    }
}
