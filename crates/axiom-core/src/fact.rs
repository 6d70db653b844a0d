// axiom-core/src/fact.rs

use crate::types::{FactId, FactLink, SourceRecord, Timestamp};
use axiom_crypto::hash::Hashable;
use axiom_crypto::Hash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The minimum `score` at which a fact is considered corroborated (spec.md §3).
pub const CORROBORATION_THRESHOLD: u32 = 2;

/// An extracted objective statement, with provenance and a corroboration counter.
///
/// `Fact` has no `state` field: `ingested`/`corroborated`/`trusted`/`sealed`
/// are all derived from `score`, `disputed`, and (for `sealed`) whether the
/// storage layer's fact-seal index contains this hash — see
/// [`Fact::is_trusted`] and `axiom_storage::Database::is_sealed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub id: FactId,
    pub hash: Hash,
    pub content: String,
    pub semantics: serde_json::Value,
    pub disputed: bool,
    pub score: u32,
    pub links: Vec<FactLink>,
    pub sources: BTreeSet<SourceRecord>,
    pub created_at: Timestamp,
}

impl Fact {
    /// Construct a freshly ingested fact: `score = 1`, not disputed.
    ///
    /// `content` must already be trimmed and non-empty; this is enforced by
    /// the ingestion port (`axiom_core::ledger::Ledger::ingest_fact`), not
    /// here, so that a fact reconstructed from storage or the wire never
    /// has to re-validate content it already accepted once.
    pub fn new(
        id: FactId,
        content: String,
        semantics: serde_json::Value,
        source: SourceRecord,
        created_at: Timestamp,
    ) -> Self {
        let hash = Self::compute_hash(&content, id, created_at);
        let mut sources = BTreeSet::new();
        sources.insert(source);
        Self {
            id,
            hash,
            content,
            semantics,
            disputed: false,
            score: 1,
            links: Vec::new(),
            sources,
            created_at,
        }
    }

    /// Canonical hash preimage: `{content, id, created_at}`, SHA-256'd.
    ///
    /// Two facts with identical content ingested at different times hash
    /// differently — uniqueness (spec.md §8 scenario 5) is enforced by the
    /// ledger recognizing repeat *content* as corroboration before a second
    /// `Fact` is ever constructed, not by hash collision here.
    pub fn compute_hash(content: &str, id: FactId, created_at: Timestamp) -> Hash {
        #[derive(Serialize)]
        struct Preimage<'a> {
            content: &'a str,
            id: FactId,
            created_at: Timestamp,
        }
        let bytes = bincode::serialize(&Preimage { content, id, created_at })
            .expect("fact preimage is always serializable");
        bytes.hash()
    }

    pub fn is_corroborated(&self) -> bool {
        self.score >= CORROBORATION_THRESHOLD
    }

    /// Trusted: corroborated and not disputed. Eligible for sealing.
    pub fn is_trusted(&self) -> bool {
        self.is_corroborated() && !self.disputed
    }

    /// Record an independent repeat of this fact's content: `score += 1`
    /// and the new source is recorded. Per invariant 4, `score` only ever
    /// increases.
    pub fn corroborate(&mut self, source: SourceRecord) {
        self.score += 1;
        self.sources.insert(source);
    }

    /// One-way transition to disputed. Calling this twice is a no-op
    /// (invariant 4: a fact never un-disputes).
    pub fn mark_disputed(&mut self) {
        self.disputed = true;
    }

    pub fn add_link(&mut self, link: FactLink) {
        self.links.push(link);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src() -> SourceRecord {
        SourceRecord { domain: "example.com".into(), retrieved_at: 1_700_000_000 }
    }

    #[test]
    fn new_fact_is_ingested_not_trusted() {
        let f = Fact::new(1, "The sky is blue.".into(), serde_json::json!({}), src(), 1_700_000_000);
        assert_eq!(f.score, 1);
        assert!(!f.is_corroborated());
        assert!(!f.is_trusted());
    }

    #[test]
    fn corroboration_makes_fact_trusted() {
        let mut f = Fact::new(1, "The sky is blue.".into(), serde_json::json!({}), src(), 1_700_000_000);
        f.corroborate(SourceRecord { domain: "other.com".into(), retrieved_at: 1_700_000_100 });
        assert!(f.is_corroborated());
        assert!(f.is_trusted());
        assert_eq!(f.sources.len(), 2);
    }

    #[test]
    fn disputed_fact_is_never_trusted() {
        let mut f = Fact::new(1, "The sky is blue.".into(), serde_json::json!({}), src(), 1_700_000_000);
        f.corroborate(src());
        f.mark_disputed();
        assert!(!f.is_trusted());
        f.disputed = false; // simulate an attempted revert
        f.mark_disputed();
        assert!(f.disputed);
    }

    #[test]
    fn hash_is_stable_for_same_preimage() {
        let h1 = Fact::compute_hash("content", 1, 100);
        let h2 = Fact::compute_hash("content", 1, 100);
        assert_eq!(h1, h2);
    }

    #[test]
    fn hash_changes_with_id() {
        let h1 = Fact::compute_hash("content", 1, 100);
        let h2 = Fact::compute_hash("content", 2, 100);
        assert_ne!(h1, h2);
    }
}
