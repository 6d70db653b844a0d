// axiom-network/src/protocol.rs
//
// Wire format, generalized from the teacher's `networking::protocol`
// (which modeled an open-ended Ethereum-style `ProtocolMessage` enum
// carrying whole `Block`/`Transaction` payloads). Axiom's wire format is
// a closed, JSON-bodied envelope — spec.md §4.D is explicit that an
// unrecognized `type` string is a `ProtocolError`, so `MessageType`
// cannot be an open/extensible enum the way `RelationshipKind` is.

use crate::{NetworkError, NetworkResult};
use axiom_crypto::Fingerprint;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Oversize frames drop the connection and cost the sender −20 reputation.
pub const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Hello,
    HelloAck,
    PeerRequest,
    PeerList,
    BlockAnnounce,
    RequestBlocks,
    Blocks,
    RequestFacts,
    Facts,
    Ping,
    Pong,
}

/// `{type, id, from, body}` exactly as spec.md §4.D. `id` correlates a
/// reply to its request; `from` is the sender's fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    pub id: u128,
    pub from: Fingerprint,
    pub body: serde_json::Value,
}

impl MessageEnvelope {
    pub fn new(msg_type: MessageType, id: u128, from: Fingerprint, body: serde_json::Value) -> Self {
        Self { msg_type, id, from, body }
    }

    pub fn request_id() -> u128 {
        // No access to a real RNG is required for correlation ids; a
        // random u128 collision is astronomically unlikely and the
        // consequence of one is just a confusing log line, not a
        // protocol violation.
        rand::random()
    }
}

/// Reads one `[4-byte BE length][JSON payload]` frame. Returns
/// `NetworkError::ProtocolError` if the declared length exceeds
/// `MAX_FRAME_BYTES`, or `NetworkError::ConnectionClosed` on EOF.
pub async fn read_frame<R: tokio::io::AsyncRead + Unpin>(reader: &mut R) -> NetworkResult<MessageEnvelope> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(|_| NetworkError::ConnectionClosed)?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_BYTES {
        return Err(NetworkError::ProtocolError(format!("frame of {len} bytes exceeds {MAX_FRAME_BYTES}-byte cap")));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await.map_err(|_| NetworkError::ConnectionClosed)?;

    serde_json::from_slice(&payload).map_err(|e| NetworkError::ProtocolError(e.to_string()))
}

/// Writes `envelope` as one length-prefixed frame.
pub async fn write_frame<W: tokio::io::AsyncWrite + Unpin>(writer: &mut W, envelope: &MessageEnvelope) -> NetworkResult<()> {
    let payload = serde_json::to_vec(envelope).map_err(|e| NetworkError::ProtocolError(e.to_string()))?;
    if payload.len() as u64 > MAX_FRAME_BYTES as u64 {
        return Err(NetworkError::ProtocolError("outbound frame exceeds the frame cap".into()));
    }
    writer.write_all(&(payload.len() as u32).to_be_bytes()).await.map_err(|e| NetworkError::Io(e.to_string()))?;
    writer.write_all(&payload).await.map_err(|e| NetworkError::Io(e.to_string()))?;
    writer.flush().await.map_err(|e| NetworkError::Io(e.to_string()))?;
    Ok(())
}

/// Bodies for the messages that carry structured payloads (spec.md §4.D
/// table). `BlockAnnounce`/`Blocks`/`Facts` carry `axiom_core` types
/// directly via `serde_json::to_value`/`from_value` at the call site,
/// since those types already derive `Serialize`/`Deserialize`.
pub mod body {
    use serde::{Deserialize, Serialize};
    use std::net::SocketAddr;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Hello {
        pub pubkey: String,
        pub listen_addr: SocketAddr,
        pub chain_height: u64,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PeerRequest {}

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PeerListEntry {
        pub addr: SocketAddr,
        pub pubkey: String,
        pub last_seen: u64,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PeerList {
        pub peers: Vec<PeerListEntry>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RequestBlocks {
        pub since_height: u64,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RequestFacts {
        pub hashes: Vec<String>,
    }

    #[derive(Debug, Clone, Copy, Serialize, Deserialize)]
    pub struct Ping {
        pub ts: u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn envelope() -> MessageEnvelope {
        MessageEnvelope::new(
            MessageType::Ping,
            1,
            Fingerprint::new([7u8; 32]),
            serde_json::to_value(body::Ping { ts: 100 }).unwrap(),
        )
    }

    #[tokio::test]
    async fn frame_round_trips() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &envelope()).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded = read_frame(&mut cursor).await.unwrap();
        assert_eq!(decoded.msg_type, MessageType::Ping);
        assert_eq!(decoded.id, 1);
    }

    #[tokio::test]
    async fn oversize_frame_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_FRAME_BYTES + 1).to_be_bytes());
        let mut cursor = Cursor::new(buf);
        let result = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(NetworkError::ProtocolError(_))));
    }

    #[tokio::test]
    async fn truncated_frame_is_connection_closed() {
        let mut cursor = Cursor::new(vec![0u8, 0, 0, 10]);
        let result = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(NetworkError::ConnectionClosed)));
    }

    #[test]
    fn message_type_serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&MessageType::BlockAnnounce).unwrap();
        assert_eq!(json, "\"BLOCK_ANNOUNCE\"");
    }

    #[test]
    fn unknown_message_type_is_a_deserialize_error() {
        let result: Result<MessageType, _> = serde_json::from_str("\"NOT_A_REAL_TYPE\"");
        assert!(result.is_err());
    }
}
