// axiom-network/src/lib.rs

//! TLS transport, peer management and gossip for Axiom.
//!
//! Grounded in the teacher's `networking` crate layout (`protocol` /
//! `peer` / `p2p` / `gossip` / `sync` as separate modules feeding one
//! `NetworkService`), but the teacher's modules were a libp2p-flavored
//! stub with no real socket code. This crate implements the transport
//! for real: TLS 1.2+ over TCP, length-prefixed JSON frames, and a
//! closed message set, per spec.md §4.D.
//!
//! Deliberately has no dependency on `axiom-consensus` — `ConsensusLoop`
//! reaches this crate's capabilities through the `BlockSink`/`PeerSync`
//! traits it defines itself, so this crate stays a pure transport layer.

pub mod gossip;
pub mod p2p;
pub mod peer;
pub mod protocol;
pub mod sync;
pub mod validate;

pub use gossip::GossipTopic;
pub use p2p::{NetworkConfig, NetworkHandle, NetworkService};
pub use axiom_core::PeerRecord;
pub use peer::{PeerManager, ReputationDelta};
pub use protocol::{body, MessageEnvelope, MessageType};
pub use sync::{SyncManager, SyncStatus};
pub use validate::{BlockValidator, BlockVerdict, NullBlockValidator};

/// Result type threaded through the whole crate.
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors surfaced by the network crate. Matches spec.md §7's
/// `axiom-network::NetworkError` entry (`ProtocolError`, `TimeoutError`)
/// plus the connection-lifecycle variants any real socket layer needs
/// that the distilled spec didn't spell out.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("protocol violation: {0}")]
    ProtocolError(String),

    #[error("operation timed out")]
    TimeoutError,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("tls error: {0}")]
    Tls(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("peer {0} is blacklisted")]
    Blacklisted(axiom_crypto::Fingerprint),

    #[error("peer set is full")]
    PeerSetFull,

    #[error("storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_basic_imports() {}
}
