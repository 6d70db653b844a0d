// axiom-node/src/identity.rs
//
// Loads or mints the node's RSA-2048 identity and the TLS material
// derived from it, and writes both to the persisted layout spec.md §6
// names (`identity.pem` at 0600, `tls/node.crt`/`tls/node.key`).
//
// `KeyPair::generate` has no seeded/deterministic variant, so
// `--shared-keys` is implemented as "load the keypair from one fixed
// path outside any node's own `--data-dir`, generating it once if it
// doesn't exist yet" — every local process started with the flag
// converges on whichever one got there first, which is what spec.md
// §8's multi-node seed tests need a "known validator identity" for.

use crate::config::NodeConfig;
use axiom_crypto::{tls::generate_self_signed_cert, KeyPair};
use std::path::Path;

pub fn load_or_generate_identity(config: &NodeConfig) -> anyhow::Result<KeyPair> {
    if config.shared_keys {
        return load_or_generate_at(&NodeConfig::shared_identity_file());
    }

    let path = config.identity_file();
    if !path.exists() {
        anyhow::bail!("no identity at {} — run `axiom init --data-dir <dir>` first", path.display());
    }
    let pem = std::fs::read_to_string(&path)?;
    Ok(KeyPair::from_pem(&pem)?)
}

fn load_or_generate_at(path: &Path) -> anyhow::Result<KeyPair> {
    if path.exists() {
        let pem = std::fs::read_to_string(path)?;
        return Ok(KeyPair::from_pem(&pem)?);
    }
    let keypair = KeyPair::generate()?;
    write_pem_0600(path, &keypair.secret_key().to_pem()?)?;
    Ok(keypair)
}

/// `axiom init`: generates a fresh identity and self-signed TLS material
/// and writes both under `data_dir`. Errors if an identity already
/// exists, so re-running `init` never silently discards one.
pub fn init_identity(config: &NodeConfig) -> anyhow::Result<KeyPair> {
    let identity_path = config.identity_file();
    if identity_path.exists() {
        anyhow::bail!("identity already exists at {}", identity_path.display());
    }

    let keypair = KeyPair::generate()?;
    write_pem_0600(&identity_path, &keypair.secret_key().to_pem()?)?;

    let tls_dir = config.tls_cert_path().parent().map(Path::to_path_buf).unwrap_or_default();
    std::fs::create_dir_all(&tls_dir)?;
    let material = generate_self_signed_cert(&keypair.fingerprint())?;
    std::fs::write(config.tls_cert_path(), &material.cert_pem)?;
    write_pem_0600(&config.tls_key_path(), &material.key_pem)?;

    Ok(keypair)
}

#[cfg(unix)]
fn write_pem_0600(path: &Path, contents: &str) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn write_pem_0600(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_then_load_round_trips_the_same_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NodeConfig::default();
        config.data_dir = dir.path().to_path_buf();

        let generated = init_identity(&config).unwrap();
        let loaded = load_or_generate_identity(&config).unwrap();
        assert_eq!(generated.fingerprint(), loaded.fingerprint());

        assert!(config.tls_cert_path().exists());
        assert!(config.tls_key_path().exists());
    }

    #[test]
    fn init_twice_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NodeConfig::default();
        config.data_dir = dir.path().to_path_buf();

        init_identity(&config).unwrap();
        assert!(init_identity(&config).is_err());
    }

    #[test]
    fn shared_keys_converge_on_one_identity() {
        let shared_path = NodeConfig::shared_identity_file();
        let _ = std::fs::remove_file(&shared_path);

        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let mut config_a = NodeConfig::default();
        config_a.data_dir = dir_a.path().to_path_buf();
        config_a.shared_keys = true;
        let mut config_b = config_a.clone();
        config_b.data_dir = dir_b.path().to_path_buf();

        let key_a = load_or_generate_identity(&config_a).unwrap();
        let key_b = load_or_generate_identity(&config_b).unwrap();
        assert_eq!(key_a.fingerprint(), key_b.fingerprint());

        let _ = std::fs::remove_file(&shared_path);
    }
}
