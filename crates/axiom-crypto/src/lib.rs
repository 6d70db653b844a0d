// axiom-crypto/src/lib.rs

//! Cryptographic primitives for the Axiom node identity and fact ledger.
//!
//! This crate provides:
//! - SHA-256 canonical hashing
//! - RSA-2048 key pairs, signing and verification
//! - Fingerprint derivation for node identity
//! - Self-signed TLS certificate material for the P2P transport

pub mod hash;
pub mod keypair;
pub mod signature;
pub mod tls;

pub use hash::{Hash, Hashable};
pub use keypair::{Fingerprint, KeyPair, PublicKey, SecretKey, KEY_BITS};
pub use signature::Signature;
pub use tls::generate_self_signed_cert;

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid secret key")]
    InvalidSecretKey,

    #[error("invalid hash")]
    InvalidHash,

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("random number generation failed: {0}")]
    RngError(String),

    #[error("certificate generation failed: {0}")]
    CertificateError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_basics() {
        let keypair = KeyPair::generate().unwrap();
        let message = b"a fact worth signing over";
        let signature = keypair.sign(message).unwrap();
        assert!(keypair.public_key().verify(message, &signature).unwrap());
    }
}
