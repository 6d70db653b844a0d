// axiom-network/src/validate.rs
//
// The seam this crate uses to run spec.md §4.C's five validation checks
// against an announced block without depending on `axiom-consensus` (for
// leader selection) or reaching into `axiom-core::Ledger` and
// `axiom-storage::Database` commit logic directly from the transport
// layer. `axiom-node`'s runtime supplies the real implementation; tests
// here can supply a trivial one.

use async_trait::async_trait;
use axiom_core::Block;
use axiom_crypto::Hash;

/// What happened to a block handed to [`BlockValidator::validate_and_commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockVerdict {
    /// Passed validation and has been committed to storage.
    Accepted,
    /// Height is ahead of the local tip; held for catch-up, not a fault.
    Pending,
    /// Structurally and chain-linkage sound, but references a fact hash
    /// this node doesn't have yet. The caller should fetch `.0` from the
    /// sender with `REQUEST_FACTS` and retry within `FACT_PULL_TIMEOUT`
    /// (spec.md §4.C step 4) before giving up.
    PendingFacts(Vec<Hash>),
    /// Already known; not a fault.
    Stale,
    /// Hash/signature/structural check failed — the sender is either
    /// byzantine or forwarding a tampered block.
    RejectedTampered,
    /// Correctly formed but proposed by the wrong leader for its slot.
    RejectedAuthority,
    /// Any other rejection (unresolved content, already sealed, etc).
    RejectedOther,
}

#[async_trait]
pub trait BlockValidator: Send + Sync {
    async fn validate_and_commit(&self, block: Block) -> BlockVerdict;
}

/// Accepts nothing; used where a node runs the transport layer without a
/// consensus loop behind it (e.g. protocol-only tests).
pub struct NullBlockValidator;

#[async_trait]
impl BlockValidator for NullBlockValidator {
    async fn validate_and_commit(&self, _block: Block) -> BlockVerdict {
        BlockVerdict::RejectedOther
    }
}
