// axiom-core/src/lib.rs

//! Core data types and the fact-ledger algorithms for Axiom.
//!
//! This crate provides:
//! - `Fact` and `Block`, the ledger's two sealed record types
//! - canonical hashing/construction for both
//! - the storage-free block-construction and block-validation algorithms
//! - the `FactSource` ingestion port the external extraction pipeline drives
//!
//! It has no dependency on `axiom-storage`: `Ledger` takes whatever it
//! needs (candidate facts, the chain tip, fact/seal lookups) as arguments
//! supplied by the caller, so the algorithms here are unit-testable without
//! a database and without pulling storage into this crate's dependency
//! graph (which would otherwise be circular, since storage depends on the
//! `Block`/`Fact` types defined here).

pub mod block;
pub mod fact;
pub mod ledger;
pub mod source;
pub mod types;

pub use block::Block;
pub use fact::Fact;
pub use ledger::{BlockCommitted, BlockOutcome, IngestOutcome, Ledger, LedgerError};
pub use source::{CandidateFact, FactSource, NullFactSource};
pub use types::{
    FactId, FactLink, Height, PeerRecord, RelationshipKind, SourceRecord, Timestamp, ValidatorRecord,
    MAX_FACTS_PER_BLOCK,
};

#[cfg(test)]
mod tests {
    #[test]
    fn test_basic_imports() {}
}
