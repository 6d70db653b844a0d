// axiom-node/src/config.rs
//
// Runtime configuration, generalized from the teacher's `NodeConfig`
// (which nested per-subsystem structs for network/rpc/consensus/storage).
// Axiom's subsystems take far fewer knobs, so this is one flat struct
// with the CLI/env surface spec.md §6 names, plus the path helpers that
// turn `data_dir` into the persisted layout it also names.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub host: String,
    pub p2p_port: u16,
    pub api_port: u16,
    pub bootstrap_peers: Vec<SocketAddr>,
    pub data_dir: PathBuf,
    /// Overrides the default `<data_dir>/identity.pem` location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_path: Option<PathBuf>,
    /// Test-only: load/save identity material from a fixed path outside
    /// `data_dir` so that several node processes converge on the same
    /// keypair instead of each minting its own. `KeyPair::generate` has
    /// no seeded variant, so this is the only way multiple local
    /// processes can share a known validator identity (spec.md §8's
    /// multi-node seed tests use it for exactly that).
    #[serde(default)]
    pub shared_keys: bool,
    /// Gates `POST /debug/propose_block`.
    #[serde(default)]
    pub debug: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            p2p_port: 7700,
            api_port: 8080,
            bootstrap_peers: Vec::new(),
            data_dir: PathBuf::from("./data"),
            identity_path: None,
            shared_keys: false,
            debug: false,
        }
    }
}

impl NodeConfig {
    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn p2p_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.p2p_port).parse()?)
    }

    pub fn api_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.api_port).parse()?)
    }

    pub fn identity_file(&self) -> PathBuf {
        self.identity_path.clone().unwrap_or_else(|| self.data_dir.join("identity.pem"))
    }

    /// Fixed path used instead of `identity_file()` when `shared_keys` is
    /// set, so sibling node processes pick up the same identity the first
    /// one to start generates.
    pub fn shared_identity_file() -> PathBuf {
        std::env::temp_dir().join("axiom-shared-identity.pem")
    }

    pub fn ledger_db_path(&self) -> PathBuf {
        self.data_dir.join("ledger.db")
    }

    pub fn tls_cert_path(&self) -> PathBuf {
        self.data_dir.join("tls").join("node.crt")
    }

    pub fn tls_key_path(&self) -> PathBuf {
        self.data_dir.join("tls").join("node.key")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_addresses_parse() {
        let config = NodeConfig::default();
        assert_eq!(config.p2p_addr().unwrap().port(), 7700);
        assert_eq!(config.api_addr().unwrap().port(), 8080);
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = NodeConfig::default();
        config.p2p_port = 9001;
        config.to_file(&path).unwrap();

        let loaded = NodeConfig::from_file(&path).unwrap();
        assert_eq!(loaded.p2p_port, 9001);
    }

    #[test]
    fn identity_file_defaults_under_data_dir() {
        let mut config = NodeConfig::default();
        config.data_dir = PathBuf::from("/tmp/axiom-test-data");
        assert_eq!(config.identity_file(), PathBuf::from("/tmp/axiom-test-data/identity.pem"));
    }
}
