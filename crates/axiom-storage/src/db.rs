// axiom-storage/src/db.rs

use crate::{StorageError, StorageResult};
use axiom_core::{Block, Fact, FactId, Height, PeerRecord, ValidatorRecord};
use axiom_crypto::hash::Hashable;
use axiom_crypto::{Fingerprint, Hash, PublicKey};
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Content-index key: SHA-256 of trimmed content, independent of fact id
/// or timestamp so repeat content always maps to the same key.
fn content_key(content: &str) -> [u8; 32] {
    content.trim().hash().to_bytes()
}

/// Column families, generalized from the teacher's block/tx/state layout
/// to Axiom's schema (§4.A).
#[derive(Debug, Clone, Copy)]
pub enum ColumnFamily {
    /// `fact.hash -> Fact` (bincode)
    Facts,
    /// `fact.id (BE bytes) -> fact.hash`
    FactsById,
    /// `block.hash -> Block` (bincode)
    Blocks,
    /// `height (BE bytes) -> block.hash`
    BlocksByHeight,
    /// `fact.hash -> height` — the block that sealed it (invariant 3)
    FactSeals,
    /// `sha256(trimmed content) -> fact.id` — lets the ingestion path
    /// recognize repeat content as corroboration instead of minting a
    /// second `Fact` (spec.md §8 scenario 5).
    ContentIndex,
    /// `address string -> PeerRecord`
    Peers,
    /// `"current" -> Vec<ValidatorRecord>` (bincode)
    Validators,
    /// `fingerprint -> PublicKey` (bincode) — learned from each peer's
    /// `HELLO`, since a fingerprint alone is one-way and block-signature
    /// verification needs the actual key (§4.C step 1).
    PublicKeys,
    /// `"chain_height"`, `"last_signed_height"`, etc.
    Meta,
}

impl ColumnFamily {
    fn as_str(&self) -> &'static str {
        match self {
            ColumnFamily::Facts => "facts",
            ColumnFamily::FactsById => "facts_by_id",
            ColumnFamily::Blocks => "blocks",
            ColumnFamily::BlocksByHeight => "blocks_by_height",
            ColumnFamily::FactSeals => "fact_seals",
            ColumnFamily::ContentIndex => "content_index",
            ColumnFamily::Peers => "peers",
            ColumnFamily::Validators => "validators",
            ColumnFamily::PublicKeys => "public_keys",
            ColumnFamily::Meta => "meta",
        }
    }

    fn all() -> Vec<Self> {
        vec![
            Self::Facts,
            Self::FactsById,
            Self::Blocks,
            Self::BlocksByHeight,
            Self::FactSeals,
            Self::ContentIndex,
            Self::Peers,
            Self::Validators,
            Self::PublicKeys,
            Self::Meta,
        ]
    }
}

const META_CHAIN_HEIGHT: &[u8] = b"chain_height";
const META_LAST_SIGNED_HEIGHT: &[u8] = b"last_signed_height";
const VALIDATORS_KEY: &[u8] = b"current";

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
    pub create_if_missing: bool,
    pub max_open_files: i32,
    pub cache_size: usize,
    pub write_buffer_size: usize,
    pub max_write_buffer_number: i32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "./data/ledger.db".to_string(),
            create_if_missing: true,
            max_open_files: 1024,
            cache_size: 512 * 1024 * 1024,
            write_buffer_size: 64 * 1024 * 1024,
            max_write_buffer_number: 3,
        }
    }
}

/// The node's single source of truth. Every multi-row mutation goes
/// through one `WriteBatch`; the logical write path additionally takes
/// `write_guard` before building that batch, so two concurrent callers of
/// e.g. `append_block` never interleave (§4.A, §5).
pub struct Database {
    db: Arc<DB>,
    write_guard: Mutex<()>,
}

impl Database {
    pub fn open(config: DatabaseConfig) -> StorageResult<Self> {
        if let Some(parent) = Path::new(&config.path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(config.max_open_files);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.increase_parallelism(num_cpus::get() as i32);

        let cfs: Vec<&str> = ColumnFamily::all().iter().map(|cf| cf.as_str()).collect();
        let db = DB::open_cf(&opts, &config.path, &cfs).map_err(|e| StorageError::Database(e.to_string()))?;

        tracing::info!(path = %config.path, "ledger database opened");

        let db = Self { db: Arc::new(db), write_guard: Mutex::new(()) };
        db.ensure_genesis()?;
        Ok(db)
    }

    /// Persists the well-known genesis block (spec.md §8: "accepted only
    /// if absent locally") the first time this data directory is opened.
    /// Without this, `chain_height()` stays `None` until the first real
    /// block commits at height 1, leaving height 0 unwritten in
    /// `BlocksByHeight` — `invariant_check`'s height walk would then see a
    /// gap at height 0 on every later startup. Written directly, bypassing
    /// `write_guard`/`append_block`'s async lock, since `open` runs before
    /// any subsystem that could write concurrently.
    fn ensure_genesis(&self) -> StorageResult<()> {
        if self.chain_height()?.is_some() {
            return Ok(());
        }

        let genesis = Block::genesis();
        let block_bytes = bincode::serialize(&genesis).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let cf_blocks = self.cf(ColumnFamily::Blocks)?;
        let cf_by_height = self.cf(ColumnFamily::BlocksByHeight)?;
        let cf_meta = self.cf(ColumnFamily::Meta)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_blocks, genesis.hash.as_bytes(), &block_bytes);
        batch.put_cf(cf_by_height, genesis.height.to_be_bytes(), genesis.hash.as_bytes());
        batch.put_cf(cf_meta, META_CHAIN_HEIGHT, genesis.height.to_be_bytes());

        self.db.write(batch).map_err(|e| StorageError::Database(e.to_string()))?;
        tracing::info!(hash = %genesis.hash, "genesis block persisted");
        Ok(())
    }

    fn cf(&self, which: ColumnFamily) -> StorageResult<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(which.as_str())
            .ok_or_else(|| StorageError::Database(format!("missing column family {}", which.as_str())))
    }

    // ==================== BLOCKS ====================

    /// Atomic: writes the block row, any not-yet-present fact rows, and the
    /// fact-seal join rows in one `WriteBatch`. A second call with the same
    /// block hash is a verified no-op (idempotence law, spec.md §8).
    pub async fn append_block(&self, block: &Block, facts: &[Fact]) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;

        if self.get_block_by_hash(block.hash)?.is_some() {
            tracing::debug!(hash = %block.hash, "append_block: already committed, no-op");
            return Ok(());
        }

        let block_bytes = bincode::serialize(block).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let cf_blocks = self.cf(ColumnFamily::Blocks)?;
        let cf_by_height = self.cf(ColumnFamily::BlocksByHeight)?;
        let cf_facts = self.cf(ColumnFamily::Facts)?;
        let cf_facts_by_id = self.cf(ColumnFamily::FactsById)?;
        let cf_seals = self.cf(ColumnFamily::FactSeals)?;
        let cf_meta = self.cf(ColumnFamily::Meta)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_blocks, block.hash.as_bytes(), &block_bytes);
        batch.put_cf(cf_by_height, block.height.to_be_bytes(), block.hash.as_bytes());
        batch.put_cf(cf_meta, META_CHAIN_HEIGHT, block.height.to_be_bytes());

        for fact in facts {
            if self.db.get_cf(cf_facts, fact.hash.as_bytes()).map_err(|e| StorageError::Database(e.to_string()))?.is_none() {
                let fact_bytes = bincode::serialize(fact).map_err(|e| StorageError::Serialization(e.to_string()))?;
                batch.put_cf(cf_facts, fact.hash.as_bytes(), &fact_bytes);
                batch.put_cf(cf_facts_by_id, fact.id.to_be_bytes(), fact.hash.as_bytes());
            }
            batch.put_cf(cf_seals, fact.hash.as_bytes(), block.height.to_be_bytes());
        }

        self.db.write(batch).map_err(|e| StorageError::Database(e.to_string()))?;
        tracing::debug!(height = block.height, hash = %block.hash, facts = facts.len(), "block appended");
        Ok(())
    }

    pub fn get_block_by_height(&self, height: Height) -> StorageResult<Option<Block>> {
        let cf_by_height = self.cf(ColumnFamily::BlocksByHeight)?;
        let hash_bytes = match self.db.get_cf(cf_by_height, height.to_be_bytes()).map_err(|e| StorageError::Database(e.to_string()))? {
            Some(b) => b,
            None => return Ok(None),
        };
        let hash = Hash::from_slice(&hash_bytes).map_err(|e| StorageError::Database(e.to_string()))?;
        self.get_block_by_hash(hash)
    }

    pub fn get_block_by_hash(&self, hash: Hash) -> StorageResult<Option<Block>> {
        let cf = self.cf(ColumnFamily::Blocks)?;
        match self.db.get_cf(cf, hash.as_bytes()).map_err(|e| StorageError::Database(e.to_string()))? {
            Some(bytes) => {
                let block = bincode::deserialize(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(block))
            }
            None => Ok(None),
        }
    }

    /// Current chain height. `None` only before `ensure_genesis` has run
    /// against this meta column family (it always has by the time
    /// `Database::open` returns).
    pub fn chain_height(&self) -> StorageResult<Option<Height>> {
        let cf = self.cf(ColumnFamily::Meta)?;
        match self.db.get_cf(cf, META_CHAIN_HEIGHT).map_err(|e| StorageError::Database(e.to_string()))? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| StorageError::Database("corrupt chain_height".into()))?;
                Ok(Some(Height::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    /// The block at the current chain height, or the well-known genesis
    /// block if nothing has been committed yet.
    pub fn chain_tip(&self) -> StorageResult<Block> {
        match self.chain_height()? {
            Some(h) => self
                .get_block_by_height(h)?
                .ok_or_else(|| StorageError::Invariant(format!("chain_height={h} but no block stored at it"))),
            None => Ok(Block::genesis()),
        }
    }

    // ==================== FACTS ====================

    pub fn get_fact_by_hash(&self, hash: Hash) -> StorageResult<Option<Fact>> {
        let cf = self.cf(ColumnFamily::Facts)?;
        match self.db.get_cf(cf, hash.as_bytes()).map_err(|e| StorageError::Database(e.to_string()))? {
            Some(bytes) => {
                let fact = bincode::deserialize(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(fact))
            }
            None => Ok(None),
        }
    }

    pub fn is_sealed(&self, hash: Hash) -> StorageResult<bool> {
        let cf = self.cf(ColumnFamily::FactSeals)?;
        Ok(self.db.get_cf(cf, hash.as_bytes()).map_err(|e| StorageError::Database(e.to_string()))?.is_some())
    }

    /// `score >= 2 && !disputed && !sealed`, ordered by id ascending
    /// (tie-broken by hash, but ids are already unique so this reduces to
    /// id order), capped at `limit` (spec.md §4.C step 1).
    pub fn list_unsealed_trusted_facts(&self, limit: usize) -> StorageResult<Vec<Fact>> {
        let cf_by_id = self.cf(ColumnFamily::FactsById)?;
        let mut out = Vec::new();
        for item in self.db.iterator_cf(cf_by_id, IteratorMode::Start) {
            let (_, hash_bytes) = item.map_err(|e| StorageError::Database(e.to_string()))?;
            let hash = Hash::from_slice(&hash_bytes).map_err(|e| StorageError::Database(e.to_string()))?;
            if self.is_sealed(hash)? {
                continue;
            }
            if let Some(fact) = self.get_fact_by_hash(hash)? {
                if fact.is_trusted() {
                    out.push(fact);
                    if out.len() >= limit {
                        break;
                    }
                }
            }
        }
        Ok(out)
    }

    pub fn get_fact_by_id(&self, id: FactId) -> StorageResult<Option<Fact>> {
        let cf_by_id = self.cf(ColumnFamily::FactsById)?;
        match self.db.get_cf(cf_by_id, id.to_be_bytes()).map_err(|e| StorageError::Database(e.to_string()))? {
            Some(hash_bytes) => {
                let hash = Hash::from_slice(&hash_bytes).map_err(|e| StorageError::Database(e.to_string()))?;
                self.get_fact_by_hash(hash)
            }
            None => Ok(None),
        }
    }

    /// All known fact ids, ascending, capped at `limit`.
    pub fn list_fact_ids(&self, limit: usize) -> StorageResult<Vec<FactId>> {
        let cf_by_id = self.cf(ColumnFamily::FactsById)?;
        let mut ids = Vec::new();
        for item in self.db.iterator_cf(cf_by_id, IteratorMode::Start) {
            let (id_bytes, _) = item.map_err(|e| StorageError::Database(e.to_string()))?;
            let arr: [u8; 8] = id_bytes.as_ref().try_into().map_err(|_| StorageError::Database("corrupt fact id".into()))?;
            ids.push(FactId::from_be_bytes(arr));
            if ids.len() >= limit {
                break;
            }
        }
        Ok(ids)
    }

    /// Insert or update a fact row directly (used by the ingestion path,
    /// which writes outside `append_block` since ingested facts are not
    /// yet sealed into any block).
    pub async fn put_fact(&self, fact: &Fact) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        let cf_facts = self.cf(ColumnFamily::Facts)?;
        let cf_by_id = self.cf(ColumnFamily::FactsById)?;
        let cf_content = self.cf(ColumnFamily::ContentIndex)?;
        let fact_bytes = bincode::serialize(fact).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_facts, fact.hash.as_bytes(), &fact_bytes);
        batch.put_cf(cf_by_id, fact.id.to_be_bytes(), fact.hash.as_bytes());
        batch.put_cf(cf_content, content_key(&fact.content), fact.id.to_be_bytes());
        self.db.write(batch).map_err(|e| StorageError::Database(e.to_string()))
    }

    /// Resolves previously ingested content to the fact id it was stored
    /// under, so the ingestion path can corroborate instead of duplicate.
    pub fn find_fact_id_by_content(&self, content: &str) -> StorageResult<Option<FactId>> {
        let cf = self.cf(ColumnFamily::ContentIndex)?;
        match self.db.get_cf(cf, content_key(content)).map_err(|e| StorageError::Database(e.to_string()))? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.as_slice().try_into().map_err(|_| StorageError::Database("corrupt fact id".into()))?;
                Ok(Some(FactId::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    /// The smallest fact id not yet assigned, derived from the highest
    /// stored id. Used to seed `axiom_core::Ledger`'s in-memory counter at
    /// startup.
    pub fn next_fact_id_seed(&self) -> StorageResult<FactId> {
        let cf = self.cf(ColumnFamily::FactsById)?;
        match self.db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (id_bytes, _) = item.map_err(|e| StorageError::Database(e.to_string()))?;
                let arr: [u8; 8] = id_bytes.as_ref().try_into().map_err(|_| StorageError::Database("corrupt fact id".into()))?;
                Ok(FactId::from_be_bytes(arr) + 1)
            }
            None => Ok(1),
        }
    }

    // ==================== PEERS ====================

    pub async fn upsert_peer(&self, record: &PeerRecord) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        let cf = self.cf(ColumnFamily::Peers)?;
        let key = record.network_address.to_string();
        let bytes = bincode::serialize(record).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.db.put_cf(cf, key.as_bytes(), bytes).map_err(|e| StorageError::Database(e.to_string()))
    }

    /// Peers with `reputation_score >= min_reputation`, ordered by
    /// reputation descending, capped at `limit`.
    pub fn list_peers(&self, min_reputation: i32, limit: usize) -> StorageResult<Vec<PeerRecord>> {
        let cf = self.cf(ColumnFamily::Peers)?;
        let mut peers = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, bytes) = item.map_err(|e| StorageError::Database(e.to_string()))?;
            let record: PeerRecord = bincode::deserialize(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))?;
            if record.reputation_score >= min_reputation {
                peers.push(record);
            }
        }
        peers.sort_by(|a, b| b.reputation_score.cmp(&a.reputation_score));
        peers.truncate(limit);
        Ok(peers)
    }

    // ==================== VALIDATORS ====================

    pub async fn put_validators(&self, validators: &[ValidatorRecord]) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        let cf = self.cf(ColumnFamily::Validators)?;
        let bytes = bincode::serialize(validators).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.db.put_cf(cf, VALIDATORS_KEY, bytes).map_err(|e| StorageError::Database(e.to_string()))
    }

    pub fn get_validators(&self) -> StorageResult<Vec<ValidatorRecord>> {
        let cf = self.cf(ColumnFamily::Validators)?;
        match self.db.get_cf(cf, VALIDATORS_KEY).map_err(|e| StorageError::Database(e.to_string()))? {
            Some(bytes) => bincode::deserialize(&bytes).map_err(|e| StorageError::Serialization(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    // ==================== PUBLIC KEYS ====================

    /// Remembers a peer's public key under its fingerprint, learned once at
    /// `HELLO` time. A fingerprint is a one-way hash, so this is the only
    /// way to recover a key for block-signature verification later (§4.C).
    pub async fn put_public_key(&self, fingerprint: Fingerprint, key: &PublicKey) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        let cf = self.cf(ColumnFamily::PublicKeys)?;
        let bytes = bincode::serialize(key).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.db.put_cf(cf, fingerprint.as_bytes(), bytes).map_err(|e| StorageError::Database(e.to_string()))
    }

    pub fn get_public_key(&self, fingerprint: Fingerprint) -> StorageResult<Option<PublicKey>> {
        let cf = self.cf(ColumnFamily::PublicKeys)?;
        match self.db.get_cf(cf, fingerprint.as_bytes()).map_err(|e| StorageError::Database(e.to_string()))? {
            Some(bytes) => bincode::deserialize(&bytes).map(Some).map_err(|e| StorageError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    // ==================== SINGLE-VOTE RULE ====================

    /// Transactionally persists `last_signed_height` iff `height` is
    /// strictly greater than the stored value. Returns `false` (and does
    /// not persist) otherwise — the storage-layer half of the single-vote
    /// rule (§4.E).
    pub async fn record_signed_height(&self, height: Height) -> StorageResult<bool> {
        let _guard = self.write_guard.lock().await;
        let cf = self.cf(ColumnFamily::Meta)?;
        let current = match self.db.get_cf(cf, META_LAST_SIGNED_HEIGHT).map_err(|e| StorageError::Database(e.to_string()))? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| StorageError::Database("corrupt last_signed_height".into()))?;
                Some(Height::from_be_bytes(arr))
            }
            None => None,
        };

        if let Some(current) = current {
            if height <= current {
                return Ok(false);
            }
        }

        self.db
            .put_cf(cf, META_LAST_SIGNED_HEIGHT, height.to_be_bytes())
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(true)
    }

    pub fn last_signed_height(&self) -> StorageResult<Option<Height>> {
        let cf = self.cf(ColumnFamily::Meta)?;
        match self.db.get_cf(cf, META_LAST_SIGNED_HEIGHT).map_err(|e| StorageError::Database(e.to_string()))? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| StorageError::Database("corrupt last_signed_height".into()))?;
                Ok(Some(Height::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    // ==================== INVARIANT CHECK ====================

    /// Walks the chain tail verifying: no height gap up to the recorded
    /// `chain_height`, `previous_hash` linkage, and that every fact hash
    /// referenced by the tip block resolves locally. Run at startup; a
    /// violation is fatal (exit code 2 at the binary edge).
    pub fn invariant_check(&self) -> StorageResult<()> {
        let height = match self.chain_height()? {
            Some(h) => h,
            None => return Ok(()),
        };

        let mut previous: Option<Block> = None;
        for h in 0..=height {
            let block = self
                .get_block_by_height(h)?
                .ok_or_else(|| StorageError::Invariant(format!("height gap: missing block at height {h}")))?;

            if let Some(prev) = &previous {
                if block.previous_hash != prev.hash {
                    return Err(StorageError::Invariant(format!(
                        "broken chain link at height {h}: previous_hash {} != parent hash {}",
                        block.previous_hash, prev.hash
                    )));
                }
            }

            for fact_hash in &block.fact_hashes {
                if self.get_fact_by_hash(*fact_hash)?.is_none() {
                    return Err(StorageError::Invariant(format!(
                        "block {h} references fact {fact_hash} which is not present locally"
                    )));
                }
            }

            previous = Some(block);
        }

        Ok(())
    }

    /// Coarse counts surfaced by `axiom db stats`, not used by any other
    /// code path — cheap to compute (bounded column-family iterations),
    /// not tracked incrementally.
    pub fn stats(&self) -> StorageResult<DatabaseStats> {
        Ok(DatabaseStats {
            chain_height: self.chain_height()?,
            fact_count: self.list_fact_ids(usize::MAX)?.len(),
            validator_count: self.get_validators()?.len(),
            peer_count: self.list_peers(i32::MIN, usize::MAX)?.len(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    pub chain_height: Option<Height>,
    pub fact_count: usize,
    pub validator_count: usize,
    pub peer_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiom_core::SourceRecord;

    fn open_test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig { path: dir.path().join("ledger.db").to_string_lossy().to_string(), ..Default::default() };
        (Database::open(config).unwrap(), dir)
    }

    #[tokio::test]
    async fn append_block_is_idempotent() {
        let (db, _dir) = open_test_db();
        let genesis = Block::genesis();
        db.append_block(&genesis, &[]).await.unwrap();
        db.append_block(&genesis, &[]).await.unwrap();
        assert_eq!(db.chain_height().unwrap(), Some(0));
    }

    #[tokio::test]
    async fn append_block_stores_facts_and_seals() {
        let (db, _dir) = open_test_db();
        let genesis = Block::genesis();
        db.append_block(&genesis, &[]).await.unwrap();

        let fact = Fact::new(1, "a fact".into(), serde_json::json!({}), SourceRecord { domain: "x.com".into(), retrieved_at: 1 }, 1);
        let block = Block::new_unsigned(1, genesis.hash, vec![fact.hash], axiom_crypto::Fingerprint::genesis(), 100, 0);

        db.append_block(&block, &[fact.clone()]).await.unwrap();
        assert!(db.get_fact_by_hash(fact.hash).unwrap().is_some());
        assert!(db.is_sealed(fact.hash).unwrap());
        assert_eq!(db.chain_height().unwrap(), Some(1));
    }

    #[tokio::test]
    async fn record_signed_height_enforces_single_vote() {
        let (db, _dir) = open_test_db();
        assert!(db.record_signed_height(5).await.unwrap());
        assert!(!db.record_signed_height(5).await.unwrap());
        assert!(!db.record_signed_height(4).await.unwrap());
        assert!(db.record_signed_height(6).await.unwrap());
    }

    #[tokio::test]
    async fn list_unsealed_trusted_facts_excludes_disputed_and_sealed() {
        let (db, _dir) = open_test_db();
        let mut trusted = Fact::new(1, "trusted".into(), serde_json::json!({}), SourceRecord { domain: "x.com".into(), retrieved_at: 1 }, 1);
        trusted.corroborate(SourceRecord { domain: "y.com".into(), retrieved_at: 2 });
        let mut disputed = Fact::new(2, "disputed".into(), serde_json::json!({}), SourceRecord { domain: "x.com".into(), retrieved_at: 1 }, 1);
        disputed.corroborate(SourceRecord { domain: "y.com".into(), retrieved_at: 2 });
        disputed.mark_disputed();

        db.put_fact(&trusted).await.unwrap();
        db.put_fact(&disputed).await.unwrap();

        let unsealed = db.list_unsealed_trusted_facts(10).unwrap();
        assert_eq!(unsealed.len(), 1);
        assert_eq!(unsealed[0].id, 1);
    }

    #[test]
    fn invariant_check_passes_on_empty_db() {
        let (db, _dir) = open_test_db();
        assert!(db.invariant_check().is_ok());
    }

    #[tokio::test]
    async fn list_fact_ids_and_get_fact_by_id_roundtrip() {
        let (db, _dir) = open_test_db();
        let a = Fact::new(1, "a".into(), serde_json::json!({}), SourceRecord { domain: "x.com".into(), retrieved_at: 1 }, 1);
        let b = Fact::new(2, "b".into(), serde_json::json!({}), SourceRecord { domain: "x.com".into(), retrieved_at: 1 }, 1);
        db.put_fact(&a).await.unwrap();
        db.put_fact(&b).await.unwrap();

        assert_eq!(db.list_fact_ids(10).unwrap(), vec![1, 2]);
        assert_eq!(db.get_fact_by_id(2).unwrap().unwrap().content, "b");
        assert!(db.get_fact_by_id(99).unwrap().is_none());
    }

    #[tokio::test]
    async fn public_key_roundtrips_by_fingerprint() {
        let (db, _dir) = open_test_db();
        let keypair = axiom_crypto::KeyPair::generate().unwrap();
        let fingerprint = keypair.fingerprint();

        assert!(db.get_public_key(fingerprint).unwrap().is_none());
        db.put_public_key(fingerprint, keypair.public_key()).await.unwrap();
        let stored = db.get_public_key(fingerprint).unwrap().unwrap();
        assert_eq!(&stored, keypair.public_key());
    }

    #[tokio::test]
    async fn content_index_resolves_repeat_content_to_same_id() {
        let (db, _dir) = open_test_db();
        let a = Fact::new(1, "the sky is blue".into(), serde_json::json!({}), SourceRecord { domain: "x.com".into(), retrieved_at: 1 }, 1);
        db.put_fact(&a).await.unwrap();

        assert_eq!(db.find_fact_id_by_content("the sky is blue").unwrap(), Some(1));
        assert_eq!(db.find_fact_id_by_content("  the sky is blue  ").unwrap(), Some(1));
        assert_eq!(db.find_fact_id_by_content("unrelated").unwrap(), None);
    }
}
