// axiom-consensus/src/lib.rs

//! Leader rotation and the slot-driven consensus loop for Axiom.
//!
//! `axiom-core::Ledger` owns the storage-free validation algorithms;
//! `axiom-storage::Database` owns durability; this crate owns the parts
//! the spec actually assigns to "consensus" — deterministic leader
//! selection per slot, the validator set view, equivocation bookkeeping,
//! and the state machine that ties a tick timer and the ledger's commit
//! events into proposing/awaiting cycles.

pub mod consensus_loop;
pub mod equivocation;
pub mod leader;
pub mod validator_set;

pub use consensus_loop::{BlockSink, ConsensusLoop, LoopState, PeerSync};
pub use equivocation::EquivocationGuard;
pub use leader::{slot_for, LeaderSelector, SLOT_DURATION_SECS};
pub use validator_set::{SharedValidatorSet, ValidatorSet};

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;

/// Errors surfaced by the consensus crate, matching spec.md §7's
/// `axiom-consensus::ConsensusError` entry: invalid block, wrong leader,
/// equivocation attempt. A rejected block never panics the loop; the
/// caller (network layer) applies the reputation penalty.
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("ledger rejected block: {0}")]
    Ledger(#[from] axiom_core::LedgerError),

    #[error("validator {0} attempted to equivocate at a height it already signed")]
    Equivocation(axiom_crypto::Fingerprint),

    #[error("no active validators available to select a leader")]
    NoActiveValidators,
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_basic_imports() {}
}
