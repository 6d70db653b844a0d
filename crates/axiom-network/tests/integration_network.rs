use axiom_crypto::KeyPair;
use axiom_network::{NetworkConfig, NetworkService, NullBlockValidator};
use axiom_storage::{Database, DatabaseConfig};
use std::sync::Arc;
use std::time::Duration;

fn open_db(path: &std::path::Path) -> Arc<Database> {
    let config = DatabaseConfig {
        path: path.to_string_lossy().into_owned(),
        create_if_missing: true,
        max_open_files: 64,
        cache_size: 8 * 1024 * 1024,
        write_buffer_size: 8 * 1024 * 1024,
        max_write_buffer_number: 2,
    };
    Arc::new(Database::open(config).expect("open test db"))
}

/// Two nodes, one dialing the other's bootstrap address, complete a TLS
/// handshake and each end up with the other in its connected peer set.
#[tokio::test]
async fn two_nodes_complete_handshake_and_admit_each_other() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let db_a = open_db(dir_a.path());
    let db_b = open_db(dir_b.path());

    let key_a = Arc::new(KeyPair::generate().unwrap());
    let key_b = Arc::new(KeyPair::generate().unwrap());

    let addr_a: std::net::SocketAddr = "127.0.0.1:19801".parse().unwrap();
    let addr_b: std::net::SocketAddr = "127.0.0.1:19802".parse().unwrap();

    let (service_a, handle_a) = NetworkService::new(
        NetworkConfig { listen_addr: addr_a, bootstrap_peers: vec![] },
        key_a,
        db_a,
        Arc::new(NullBlockValidator),
    )
    .unwrap();
    let (service_b, handle_b) = NetworkService::new(
        NetworkConfig { listen_addr: addr_b, bootstrap_peers: vec![addr_a] },
        key_b,
        db_b,
        Arc::new(NullBlockValidator),
    )
    .unwrap();

    tokio::spawn(service_a.run());
    tokio::spawn(service_b.run());

    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(handle_a.connected_peer_count().await, 1);
    assert_eq!(handle_b.connected_peer_count().await, 1);
}

/// A node with no bootstrap link never admits an uninvited peer.
#[tokio::test]
async fn a_node_without_a_bootstrap_link_stays_isolated() {
    let dir_a = tempfile::tempdir().unwrap();
    let db_a = open_db(dir_a.path());
    let key_a = Arc::new(KeyPair::generate().unwrap());
    let addr_a: std::net::SocketAddr = "127.0.0.1:19803".parse().unwrap();

    let (service_a, handle_a) = NetworkService::new(
        NetworkConfig { listen_addr: addr_a, bootstrap_peers: vec![] },
        key_a,
        db_a,
        Arc::new(NullBlockValidator),
    )
    .unwrap();

    tokio::spawn(service_a.run());
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(handle_a.connected_peer_count().await, 0);
}
