// axiom-core/src/block.rs

use crate::types::Height;
use axiom_crypto::hash::Hashable;
use axiom_crypto::{Fingerprint, Hash, Signature};
use serde::{Deserialize, Serialize};

/// A sealed batch of fact hashes, chained to its predecessor.
///
/// Canonical hash preimage is `(height, previous_hash, fact_hashes,
/// proposer, timestamp, nonce)` bincode-serialized and SHA-256'd — no
/// Merkle tree over `fact_hashes`, per spec.md §3: the block hash commits
/// directly to the sorted hash list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub height: Height,
    pub previous_hash: Hash,
    pub hash: Hash,
    pub fact_hashes: Vec<Hash>,
    pub proposer: Fingerprint,
    pub timestamp: u64,
    pub nonce: u64,
    pub signature: Signature,
}

/// The fields that go into a block's hash, in the exact order the spec
/// fixes: `{height, previous_hash, fact_hashes_sorted_ascending,
/// proposer_pubkey_fingerprint, timestamp, nonce}`.
#[derive(Serialize)]
struct Preimage<'a> {
    height: Height,
    previous_hash: Hash,
    fact_hashes: &'a [Hash],
    proposer: Fingerprint,
    timestamp: u64,
    nonce: u64,
}

impl Block {
    /// Build an unsigned block with freshly sorted `fact_hashes` and a
    /// computed `hash`, leaving `signature` empty until the consensus loop
    /// signs over `hash`.
    pub fn new_unsigned(
        height: Height,
        previous_hash: Hash,
        mut fact_hashes: Vec<Hash>,
        proposer: Fingerprint,
        timestamp: u64,
        nonce: u64,
    ) -> Self {
        fact_hashes.sort();
        let hash = Self::compute_hash(height, previous_hash, &fact_hashes, proposer, timestamp, nonce);
        Self {
            height,
            previous_hash,
            hash,
            fact_hashes,
            proposer,
            timestamp,
            nonce,
            signature: Signature::new(Vec::new()),
        }
    }

    pub fn compute_hash(
        height: Height,
        previous_hash: Hash,
        fact_hashes: &[Hash],
        proposer: Fingerprint,
        timestamp: u64,
        nonce: u64,
    ) -> Hash {
        let bytes = bincode::serialize(&Preimage { height, previous_hash, fact_hashes, proposer, timestamp, nonce })
            .expect("block preimage is always serializable");
        bytes.hash()
    }

    /// Recompute this block's hash from its own fields and compare.
    pub fn hash_is_consistent(&self) -> bool {
        self.hash
            == Self::compute_hash(
                self.height,
                self.previous_hash,
                &self.fact_hashes,
                self.proposer,
                self.timestamp,
                self.nonce,
            )
    }

    /// `fact_hashes` must be ascending with no duplicates.
    pub fn fact_hashes_are_canonical(&self) -> bool {
        self.fact_hashes.windows(2).all(|w| w[0] < w[1])
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.previous_hash == Hash::zero()
    }

    /// The well-known genesis block: height 0, zero previous_hash, no
    /// facts, proposer `"genesis"`, all-zero signature (spec.md §8).
    pub fn genesis() -> Self {
        let proposer = Fingerprint::genesis();
        let hash = Self::compute_hash(0, Hash::zero(), &[], proposer, 0, 0);
        Self {
            height: 0,
            previous_hash: Hash::zero(),
            hash,
            fact_hashes: Vec::new(),
            proposer,
            timestamp: 0,
            nonce: 0,
            signature: Signature::new(vec![0u8; 256]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_is_genesis() {
        let g = Block::genesis();
        assert!(g.is_genesis());
        assert_eq!(g.height, 0);
        assert!(g.fact_hashes.is_empty());
    }

    #[test]
    fn genesis_hash_is_deterministic() {
        assert_eq!(Block::genesis().hash, Block::genesis().hash);
    }

    #[test]
    fn new_unsigned_sorts_fact_hashes() {
        let a = "a".as_bytes().hash();
        let z = "z".as_bytes().hash();
        let block = Block::new_unsigned(1, Hash::zero(), vec![z, a], Fingerprint::genesis(), 100, 0);
        assert!(block.fact_hashes[0] < block.fact_hashes[1]);
        assert!(block.fact_hashes_are_canonical());
    }

    #[test]
    fn hash_consistency_detects_tampering() {
        let mut block = Block::new_unsigned(1, Hash::zero(), vec![], Fingerprint::genesis(), 100, 0);
        assert!(block.hash_is_consistent());
        block.nonce += 1;
        assert!(!block.hash_is_consistent());
    }

    #[test]
    fn empty_fact_hashes_is_canonical() {
        let block = Block::new_unsigned(1, Hash::zero(), vec![], Fingerprint::genesis(), 100, 0);
        assert!(block.fact_hashes_are_canonical());
    }
}
