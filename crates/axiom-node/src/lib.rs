// axiom-node/src/lib.rs

pub mod config;
pub mod identity;
pub mod ingestion;
pub mod runtime;
pub mod wiring;

pub use config::NodeConfig;
pub use runtime::Runtime;

/// Errors surfaced at the binary edge (spec.md §7's
/// `axiom-node::ConfigError`). Always fatal at startup, exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
