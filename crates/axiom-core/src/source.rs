// axiom-core/src/source.rs
//
// The narrow ingestion port named in spec.md §1/§6.2: the external
// extraction collaborator (NLP, entity recognition, subjectivity
// filtering, NLI contradiction check) is out of scope for this crate and
// is specified only by this trait's input/output contract.

use crate::types::SourceRecord;
use async_trait::async_trait;

/// A candidate fact handed to the ledger by the (external) extraction
/// pipeline, before it has been assigned an id or hashed.
#[derive(Debug, Clone)]
pub struct CandidateFact {
    pub content: String,
    pub semantics: serde_json::Value,
    pub source: SourceRecord,
}

/// Driven by `axiom-node`'s ingestion task; one item per call until the
/// source is exhausted or has nothing new, in which case it returns `None`
/// for this poll (not necessarily forever — the task polls again later).
#[async_trait]
pub trait FactSource: Send + Sync {
    async fn next_fact(&mut self) -> Option<CandidateFact>;
}

/// A `FactSource` that never produces anything. Used in tests and when a
/// node runs without an extraction pipeline attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFactSource;

#[async_trait]
impl FactSource for NullFactSource {
    async fn next_fact(&mut self) -> Option<CandidateFact> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_source_yields_nothing() {
        let mut source = NullFactSource;
        assert!(source.next_fact().await.is_none());
    }
}
