// axiom-crypto/src/signature.rs

use rsa::pkcs1v15::Pkcs1v15Sign;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A PKCS#1 v1.5 RSA signature over the SHA-256 digest of a message.
#[derive(Clone, Serialize, Deserialize)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl Signature {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, crate::CryptoError> {
        let bytes = hex::decode(s).map_err(|e| crate::CryptoError::DeserializationError(e.to_string()))?;
        Ok(Self::new(bytes))
    }

    /// Verify this signature is valid for `message` under `public_key`.
    pub fn verify(&self, message: &[u8], public_key: &crate::PublicKey) -> Result<bool, crate::CryptoError> {
        let digest = Sha256::digest(message);
        let rsa_key = public_key.rsa()?;
        Ok(rsa_key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &self.bytes)
            .is_ok())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.bytes[..8.min(self.bytes.len())]))
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Signature {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn test_signature_verify_roundtrip() {
        let keypair = KeyPair::generate().unwrap();
        let message = b"Test message";

        let signature = keypair.sign(message).unwrap();
        assert!(signature.verify(message, keypair.public_key()).unwrap());

        let wrong_message = b"Wrong message";
        assert!(!signature.verify(wrong_message, keypair.public_key()).unwrap());
    }

    #[test]
    fn test_signature_hex_roundtrip() {
        let keypair = KeyPair::generate().unwrap();
        let sig = keypair.sign(b"Test").unwrap();

        let hex = sig.to_hex();
        let parsed = Signature::from_hex(&hex).unwrap();

        assert_eq!(sig, parsed);
    }
}
