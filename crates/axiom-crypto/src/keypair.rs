// axiom-crypto/src/keypair.rs

use crate::{CryptoError, CryptoResult, Signature};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::pkcs1v15::Pkcs1v15Sign;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroize;

/// RSA modulus size mandated for node identity keys.
pub const KEY_BITS: usize = 2048;

/// An RSA-2048 public key, the identity a node presents to its peers.
#[derive(Clone, Serialize, Deserialize)]
pub struct PublicKey {
    der: Vec<u8>,
    #[serde(skip)]
    inner: Option<RsaPublicKey>,
}

impl PublicKey {
    fn from_rsa(key: RsaPublicKey) -> CryptoResult<Self> {
        let der = key
            .to_public_key_der()
            .map_err(|e| CryptoError::SerializationError(e.to_string()))?
            .as_bytes()
            .to_vec();
        Ok(Self { der, inner: Some(key) })
    }

    pub(crate) fn rsa(&self) -> CryptoResult<RsaPublicKey> {
        if let Some(k) = &self.inner {
            return Ok(k.clone());
        }
        RsaPublicKey::from_public_key_der(&self.der).map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// DER-encoded SubjectPublicKeyInfo bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.der
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.der)
    }

    pub fn from_der(der: Vec<u8>) -> CryptoResult<Self> {
        let key = RsaPublicKey::from_public_key_der(&der).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self { der, inner: Some(key) })
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let der = hex::decode(s).map_err(|e| CryptoError::DeserializationError(e.to_string()))?;
        Self::from_der(der)
    }

    /// Verify a signature over `message` produced by the holder of the matching secret key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> CryptoResult<bool> {
        signature.verify(message, self)
    }

    /// Derive this key's stable fingerprint: SHA-256 of its DER encoding.
    pub fn to_fingerprint(&self) -> Fingerprint {
        Fingerprint::from_public_key(self)
    }

    /// PEM-encoded SubjectPublicKeyInfo, carried in `HELLO`/`HELLO_ACK`
    /// bodies (spec.md §4.D) so a peer can verify this node's block
    /// signatures without a separate key-fetch round trip.
    pub fn to_pem(&self) -> CryptoResult<String> {
        self.rsa()?
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::SerializationError(e.to_string()))
    }

    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        let key = RsaPublicKey::from_public_key_pem(pem).map_err(|_| CryptoError::InvalidPublicKey)?;
        Self::from_rsa(key)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}...)", hex::encode(&self.der[..8.min(self.der.len())]))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for PublicKey {}

/// An RSA-2048 secret key. Key material is zeroed on drop.
pub struct SecretKey {
    der: Vec<u8>,
    inner: RsaPrivateKey,
}

impl SecretKey {
    fn from_rsa(key: RsaPrivateKey) -> CryptoResult<Self> {
        let der = key
            .to_pkcs8_der()
            .map_err(|e| CryptoError::SerializationError(e.to_string()))?
            .as_bytes()
            .to_vec();
        Ok(Self { der, inner: key })
    }

    pub fn to_pem(&self) -> CryptoResult<String> {
        self.inner
            .to_pkcs8_pem(LineEnding::LF)
            .map(|p| p.to_string())
            .map_err(|e| CryptoError::SerializationError(e.to_string()))
    }

    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        let inner = RsaPrivateKey::from_pkcs8_pem(pem).map_err(|_| CryptoError::InvalidSecretKey)?;
        Self::from_rsa(inner)
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.der.zeroize();
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

/// A node's identity: its RSA-2048 key pair.
pub struct KeyPair {
    public_key: PublicKey,
    secret_key: SecretKey,
}

impl KeyPair {
    /// Generate a fresh RSA-2048 key pair.
    pub fn generate() -> CryptoResult<Self> {
        let mut rng = rand::thread_rng();
        let secret = RsaPrivateKey::new(&mut rng, KEY_BITS)
            .map_err(|e| CryptoError::RngError(e.to_string()))?;
        let public = RsaPublicKey::from(&secret);

        Ok(Self {
            public_key: PublicKey::from_rsa(public)?,
            secret_key: SecretKey::from_rsa(secret)?,
        })
    }

    /// Reconstruct a key pair from a PKCS#8 PEM-encoded secret key.
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        let secret_key = SecretKey::from_pem(pem)?;
        let public = RsaPublicKey::from(&secret_key.inner);
        Ok(Self {
            public_key: PublicKey::from_rsa(public)?,
            secret_key,
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.public_key.to_fingerprint()
    }

    /// Sign the SHA-256 digest of `message` with PKCS#1 v1.5.
    pub fn sign(&self, message: &[u8]) -> CryptoResult<Signature> {
        let digest = Sha256::digest(message);
        let bytes = self
            .secret_key
            .inner
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|_| CryptoError::InvalidSignature)?;
        Ok(Signature::new(bytes))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Stable identifier for a node's identity: SHA-256 of its public key's DER encoding, hex-encoded.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_public_key(public_key: &PublicKey) -> Self {
        use crate::hash::Hashable;
        let hash = public_key.as_bytes().hash();
        Self(hash.to_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::DeserializationError(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(CryptoError::DeserializationError("invalid fingerprint length".into()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The sentinel fingerprint used only by the genesis block.
    pub fn genesis() -> Self {
        Self::from_hex(&"0".repeat(64)).expect("zero hex is always valid")
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation_is_unique() {
        let kp1 = KeyPair::generate().unwrap();
        let kp2 = KeyPair::generate().unwrap();
        assert_ne!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_sign_verify() {
        let keypair = KeyPair::generate().unwrap();
        let message = b"a fact worth signing over";

        let signature = keypair.sign(message).unwrap();
        assert!(keypair.public_key().verify(message, &signature).unwrap());
    }

    #[test]
    fn test_verify_rejects_tampered_message() {
        let keypair = KeyPair::generate().unwrap();
        let signature = keypair.sign(b"original").unwrap();
        assert!(!keypair.public_key().verify(b"tampered", &signature).unwrap());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let keypair = KeyPair::generate().unwrap();
        let f1 = keypair.fingerprint();
        let f2 = Fingerprint::from_public_key(keypair.public_key());
        assert_eq!(f1, f2);
    }

    #[test]
    fn test_public_key_pem_roundtrip() {
        let keypair = KeyPair::generate().unwrap();
        let pem = keypair.public_key().to_pem().unwrap();
        let restored = PublicKey::from_pem(&pem).unwrap();
        assert_eq!(keypair.public_key(), &restored);
        assert_eq!(restored.to_fingerprint(), keypair.fingerprint());
    }

    #[test]
    fn test_fingerprint_hex_roundtrip() {
        let keypair = KeyPair::generate().unwrap();
        let fp = keypair.fingerprint();
        let parsed = Fingerprint::from_hex(&fp.to_hex()).unwrap();
        assert_eq!(fp, parsed);
    }

    #[test]
    fn test_pem_roundtrip_preserves_identity() {
        let keypair = KeyPair::generate().unwrap();
        let pem = keypair.secret_key().to_pem().unwrap();
        let restored = KeyPair::from_pem(&pem).unwrap();
        assert_eq!(keypair.public_key(), restored.public_key());
    }
}
