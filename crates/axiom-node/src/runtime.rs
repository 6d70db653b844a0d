// axiom-node/src/runtime.rs
//
// Composition root, generalized from the teacher's `Node` (which owned a
// `Blockchain`/`TransactionPool`/`ForkResolver` plus optional network/rpc
// services and drove a handful of background tasks off one struct).
// Axiom's subsystems are already full crates with their own `run()`
// loops (`axiom_network::NetworkService`, `axiom_consensus::ConsensusLoop`,
// `axiom_api::ApiServer`); `Runtime` exists to open storage once, wire
// the few cross-crate handles together, spawn each loop, and hold the
// join handles so `main` can wait on a shutdown signal.

use crate::wiring::{LedgerBlockValidator, NetworkBridge};
use crate::NodeConfig;
use axiom_api::{ApiConfig, ApiServer, ApiState};
use axiom_consensus::{ConsensusLoop, ValidatorSet};
use axiom_core::{FactSource, Ledger, NullFactSource};
use axiom_crypto::KeyPair;
use axiom_network::{NetworkConfig, NetworkService};
use axiom_storage::{Database, DatabaseConfig};
use std::sync::Arc;

pub struct Runtime {
    config: NodeConfig,
    db: Arc<Database>,
    keypair: Arc<KeyPair>,
}

impl Runtime {
    /// Opens storage and loads the node's identity. Does not start any
    /// subsystem yet — that happens in [`Runtime::run`], so constructing
    /// a `Runtime` is cheap enough to use from `axiom db`/`axiom identity`.
    pub fn open(config: NodeConfig) -> anyhow::Result<Self> {
        let db_config = DatabaseConfig { path: config.ledger_db_path().to_string_lossy().into_owned(), ..Default::default() };
        let db = Arc::new(Database::open(db_config)?);

        if let Err(e) = db.invariant_check() {
            tracing::error!(error = %e, "ledger invariant violated at startup");
            std::process::exit(2);
        }

        let keypair = Arc::new(crate::identity::load_or_generate_identity(&config)?);
        Ok(Self { config, db, keypair })
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn keypair(&self) -> &Arc<KeyPair> {
        &self.keypair
    }

    /// Runs the node until `shutdown` resolves: spawns the network
    /// service, the consensus loop, the HTTP API server, and the
    /// ingestion task, then waits.
    pub async fn run(self, fact_source: Box<dyn FactSource>) -> anyhow::Result<()> {
        let Runtime { config, db, keypair } = self;

        let ledger = Arc::new(Ledger::new(db.next_fact_id_seed()?));
        let validators = Arc::new(tokio::sync::RwLock::new(ValidatorSet::load(&db)?));

        let validator = Arc::new(LedgerBlockValidator {
            db: db.clone(),
            ledger: ledger.clone(),
            validators: validators.clone(),
            equivocation: Arc::new(tokio::sync::Mutex::new(axiom_consensus::EquivocationGuard::new())),
        });
        let network_config = NetworkConfig { listen_addr: config.p2p_addr()?, bootstrap_peers: config.bootstrap_peers.clone() };
        let (network_service, network_handle) = NetworkService::new(network_config, keypair.clone(), db.clone(), validator)?;
        let network_task = tokio::spawn(network_service.run());

        let bridge = Arc::new(NetworkBridge(network_handle.clone()));
        let consensus_loop = ConsensusLoop::new(db.clone(), ledger.clone(), keypair.clone(), validators.clone(), bridge.clone(), bridge);
        let consensus_task = tokio::spawn(consensus_loop.run());

        let api_state = Arc::new(ApiState {
            db: db.clone(),
            network: network_handle,
            validators,
            ledger: ledger.clone(),
            keypair: keypair.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            debug_enabled: config.debug,
        });
        let api_config = ApiConfig { listen_addr: config.api_addr()?, ..Default::default() };
        let api_task = tokio::spawn(ApiServer::new(api_config, api_state).run());

        let ingestion_task = tokio::spawn(crate::ingestion::run(db, ledger, fact_source));

        tracing::info!(
            p2p = %config.p2p_addr()?,
            api = %config.api_addr()?,
            fingerprint = %keypair.fingerprint().to_hex(),
            "axiom node running"
        );

        tokio::select! {
            result = network_task => log_task_exit("network", result),
            result = consensus_task => log_task_exit("consensus", result),
            result = api_task => log_task_exit("api", result),
            result = ingestion_task => log_task_exit("ingestion", result),
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
            }
        }

        Ok(())
    }

    /// A node started without an extraction pipeline attached uses
    /// `NullFactSource` (spec.md §6.2).
    pub fn default_fact_source() -> Box<dyn FactSource> {
        Box::new(NullFactSource)
    }
}

fn log_task_exit(name: &str, result: Result<anyhow::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => tracing::warn!(task = name, "subsystem exited"),
        Ok(Err(e)) => tracing::error!(task = name, error = %e, "subsystem failed"),
        Err(e) => tracing::error!(task = name, error = %e, "subsystem task panicked"),
    }
}
