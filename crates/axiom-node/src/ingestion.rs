// axiom-node/src/ingestion.rs
//
// Drives a `FactSource` against the ledger and storage. The teacher has
// no analogous external-extraction port; this is grounded directly in
// spec.md §6.2's ingestion port contract and `axiom_core::Ledger::ingest_fact`.

use axiom_core::{CandidateFact, FactSource, IngestOutcome, Ledger};
use axiom_storage::Database;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Polls `source` forever, ingesting every candidate it yields; sleeps
/// briefly between empty polls so a `NullFactSource` (or a drained real
/// one) doesn't spin.
pub async fn run(db: Arc<Database>, ledger: Arc<Ledger>, mut source: Box<dyn FactSource>) {
    loop {
        match source.next_fact().await {
            Some(candidate) => {
                if let Err(e) = ingest_one(&db, &ledger, candidate).await {
                    tracing::warn!(error = %e, "failed to ingest candidate fact");
                }
            }
            None => {
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    }
}

async fn ingest_one(db: &Arc<Database>, ledger: &Arc<Ledger>, candidate: CandidateFact) -> anyhow::Result<()> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    let outcome = ledger.ingest_fact(candidate.content, candidate.semantics, candidate.source, now, |content| {
        db.find_fact_id_by_content(content).ok().flatten()
    });

    match outcome {
        IngestOutcome::New(fact) => {
            tracing::debug!(id = fact.id, hash = %fact.hash, "ingested new fact");
            db.put_fact(&fact).await?;
        }
        IngestOutcome::Corroborated { id, source } => {
            if let Some(mut fact) = db.get_fact_by_id(id)? {
                fact.corroborate(source);
                tracing::debug!(id, score = fact.score, "corroborated existing fact");
                db.put_fact(&fact).await?;
            }
        }
        IngestOutcome::Empty => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiom_core::SourceRecord;
    use axiom_storage::DatabaseConfig;

    fn open_db() -> (Arc<Database>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig { path: dir.path().join("db").to_string_lossy().into_owned(), ..Default::default() };
        (Arc::new(Database::open(config).unwrap()), dir)
    }

    #[tokio::test]
    async fn repeated_content_corroborates_instead_of_duplicating() {
        let (db, _dir) = open_db();
        let ledger = Arc::new(Ledger::new(1));

        ingest_one(
            &db,
            &ledger,
            CandidateFact {
                content: "the sky is blue".into(),
                semantics: serde_json::json!({}),
                source: SourceRecord { domain: "a.com".into(), retrieved_at: 1 },
            },
        )
        .await
        .unwrap();

        ingest_one(
            &db,
            &ledger,
            CandidateFact {
                content: "the sky is blue".into(),
                semantics: serde_json::json!({}),
                source: SourceRecord { domain: "b.com".into(), retrieved_at: 2 },
            },
        )
        .await
        .unwrap();

        let ids = db.list_fact_ids(10).unwrap();
        assert_eq!(ids.len(), 1);
        let fact = db.get_fact_by_id(ids[0]).unwrap().unwrap();
        assert!(fact.is_trusted());
        assert_eq!(fact.sources.len(), 2);
    }
}
