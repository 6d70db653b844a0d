// axiom-node/src/main.rs
//
// The CLI surface, spec.md §6: `--p2p-port`, `--api-port`, `--host`,
// `--bootstrap-peer` (repeatable), `--data-dir`, `--identity`,
// `--shared-keys`, layered over `AXIOM_DATA_DIR`/`AXIOM_SHARED_KEYS`/
// `AXIOM_LOG_LEVEL` and exit codes 0/1/2/3 (§6). `axiom init` is the
// companion subcommand that mints the identity and TLS material a plain
// `axiom start` refuses to generate implicitly — generalized from the
// teacher's `init`/`start` split, which did the analogous thing for a
// chain data directory and a validator keypair.

use axiom_node::{NodeConfig, Runtime};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "axiom", about = "Axiom distributed fact-ledger node", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the node: P2P transport, consensus loop, ingestion, HTTP API.
    Start {
        #[arg(long)]
        p2p_port: u16,
        #[arg(long)]
        api_port: u16,
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Repeatable: `--bootstrap-peer <addr>` once per peer.
        #[arg(long = "bootstrap-peer")]
        bootstrap_peer: Vec<SocketAddr>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        identity: Option<PathBuf>,
        /// Test-only: all nodes started with this flag share one keypair.
        #[arg(long)]
        shared_keys: bool,
    },
    /// Create `data-dir` and mint a fresh identity + TLS material in it.
    Init {
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
    /// Identity-related debugging commands.
    Identity {
        #[command(subcommand)]
        command: IdentityCommands,
    },
    /// Storage-related debugging commands, usable without starting the
    /// full node.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Subcommand)]
enum IdentityCommands {
    /// Print the node's public-key fingerprint.
    Show {
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Print coarse counts (chain height, fact/validator/peer counts).
    Stats {
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
    /// Run the startup invariant checker without starting the node.
    Verify {
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_level = std::env::var("AXIOM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("axiom_node={log_level},axiom_network={log_level},axiom_consensus={log_level},hyper=warn").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Start { p2p_port, api_port, host, bootstrap_peer, data_dir, identity, shared_keys } => {
            run_start(p2p_port, api_port, host, bootstrap_peer, data_dir, identity, shared_keys).await
        }
        Commands::Init { data_dir } => run_init(data_dir),
        Commands::Identity { command } => match command {
            IdentityCommands::Show { data_dir } => run_identity_show(data_dir),
        },
        Commands::Db { command } => match command {
            DbCommands::Stats { data_dir } => run_db_stats(data_dir),
            DbCommands::Verify { data_dir } => run_db_verify(data_dir),
        },
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "fatal error");
        std::process::exit(exit_code_for(&e));
    }
    Ok(())
}

/// Maps the top-level error to spec.md §6's exit codes: 1 configuration,
/// 2 storage invariant violation, 3 unrecoverable I/O. `Runtime::open`
/// already calls `std::process::exit(2)` directly for an invariant
/// violation (so a corrupt ledger can never be swallowed by `anyhow`'s
/// `Display`), so this mapping only has to distinguish 1 from 3 for
/// whatever reaches here instead.
fn exit_code_for(e: &anyhow::Error) -> i32 {
    if e.downcast_ref::<std::io::Error>().is_some() {
        3
    } else {
        1
    }
}

async fn run_start(
    p2p_port: u16,
    api_port: u16,
    host: String,
    bootstrap_peers: Vec<SocketAddr>,
    data_dir: Option<PathBuf>,
    identity: Option<PathBuf>,
    shared_keys: bool,
) -> anyhow::Result<()> {
    let env_data_dir = std::env::var("AXIOM_DATA_DIR").ok().map(PathBuf::from);
    let env_shared_keys = std::env::var("AXIOM_SHARED_KEYS").map(|v| v == "true").unwrap_or(false);
    let debug = std::env::var("AXIOM_DEBUG").map(|v| v == "true").unwrap_or(false);

    let config = NodeConfig {
        host,
        p2p_port,
        api_port,
        bootstrap_peers,
        data_dir: data_dir.or(env_data_dir).unwrap_or_else(|| PathBuf::from("./data")),
        identity_path: identity,
        shared_keys: shared_keys || env_shared_keys,
        debug,
    };

    let runtime = Runtime::open(config)?;
    runtime.run(Runtime::default_fact_source()).await
}

fn run_init(data_dir: PathBuf) -> anyhow::Result<()> {
    std::fs::create_dir_all(&data_dir)?;

    let config = NodeConfig { data_dir, ..NodeConfig::default() };
    axiom_node::identity::init_identity(&config)?;
    tracing::info!(data_dir = %config.data_dir.display(), "initialized axiom node identity and TLS material");
    Ok(())
}

/// `axiom identity show`: prints the fingerprint an `axiom run` against
/// this same `data-dir` would advertise, without opening storage or
/// starting any subsystem.
fn run_identity_show(data_dir: PathBuf) -> anyhow::Result<()> {
    let config = NodeConfig { data_dir, ..NodeConfig::default() };
    let keypair = axiom_node::identity::load_or_generate_identity(&config)?;
    println!("{}", keypair.fingerprint().to_hex());
    Ok(())
}

/// `axiom db stats`: opens storage read-only-in-spirit (no subsystem
/// spawned) and prints the same counters `GET /status` derives from.
fn run_db_stats(data_dir: PathBuf) -> anyhow::Result<()> {
    let config = NodeConfig { data_dir, ..NodeConfig::default() };
    let db_config = axiom_storage::DatabaseConfig {
        path: config.ledger_db_path().to_string_lossy().into_owned(),
        ..Default::default()
    };
    let db = axiom_storage::Database::open(db_config)?;
    let stats = db.stats()?;
    println!("chain_height: {:?}", stats.chain_height);
    println!("fact_count: {}", stats.fact_count);
    println!("validator_count: {}", stats.validator_count);
    println!("peer_count: {}", stats.peer_count);
    Ok(())
}

/// `axiom db verify`: runs the same startup invariant checker `axiom run`
/// would, but as a standalone command — lets an operator audit a data
/// directory without the side effect of actually starting a node.
fn run_db_verify(data_dir: PathBuf) -> anyhow::Result<()> {
    let config = NodeConfig { data_dir, ..NodeConfig::default() };
    let db_config = axiom_storage::DatabaseConfig {
        path: config.ledger_db_path().to_string_lossy().into_owned(),
        ..Default::default()
    };
    let db = axiom_storage::Database::open(db_config)?;
    match db.invariant_check() {
        Ok(()) => {
            println!("ok: ledger invariants hold");
            Ok(())
        }
        Err(e) => {
            eprintln!("invariant violation: {e}");
            std::process::exit(2);
        }
    }
}
