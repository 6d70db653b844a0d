// axiom-api/src/state.rs
//
// Everything a handler needs to answer a request, generalized from the
// teacher's `RpcMethods::new(blockchain, database)` constructor — except
// Axiom's handlers also need the validator set (for `/status` and
// `/validator/stake`), the node's own keypair (to sign a forced debug
// proposal) and a network handle (for peer counts and broadcasting).

use axiom_consensus::SharedValidatorSet;
use axiom_core::Ledger;
use axiom_crypto::KeyPair;
use axiom_network::NetworkHandle;
use axiom_storage::Database;
use std::sync::Arc;

pub struct ApiState {
    pub db: Arc<Database>,
    pub network: NetworkHandle,
    pub validators: SharedValidatorSet,
    pub ledger: Arc<Ledger>,
    pub keypair: Arc<KeyPair>,
    pub version: String,
    /// Gates `POST /debug/propose_block`; set from `AXIOM_DEBUG=true`.
    pub debug_enabled: bool,
}
