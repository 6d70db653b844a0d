// axiom-crypto/src/tls.rs
//
// Self-signed TLS certificate material for the node-to-node transport.
// Axiom nodes authenticate each other at the application layer (message
// signatures, fingerprints) rather than via a certificate authority, so a
// fresh self-signed certificate per node identity is sufficient — TLS here
// provides transport confidentiality and integrity, not peer authentication.

use crate::{CryptoError, CryptoResult, Fingerprint};

/// DER-encoded certificate and PKCS#8 private key for `tokio-rustls`, plus
/// their PEM forms for the files `axiom init` writes under `tls/`.
pub struct TlsMaterial {
    pub cert_der: Vec<u8>,
    pub key_der: Vec<u8>,
    pub cert_pem: String,
    pub key_pem: String,
}

/// Generate a self-signed certificate binding a human-readable subject name
/// derived from `fingerprint` to a freshly generated key pair.
pub fn generate_self_signed_cert(fingerprint: &Fingerprint) -> CryptoResult<TlsMaterial> {
    let subject_alt_names = vec![format!("axiom-{}", fingerprint.to_hex())];
    let rcgen::CertifiedKey { cert, key_pair } = rcgen::generate_simple_self_signed(subject_alt_names)
        .map_err(|e| CryptoError::CertificateError(e.to_string()))?;

    Ok(TlsMaterial {
        cert_der: cert.der().to_vec(),
        key_der: key_pair.serialize_der(),
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn test_generate_self_signed_cert() {
        let keypair = KeyPair::generate().unwrap();
        let material = generate_self_signed_cert(&keypair.fingerprint()).unwrap();
        assert!(!material.cert_der.is_empty());
        assert!(!material.key_der.is_empty());
    }
}
