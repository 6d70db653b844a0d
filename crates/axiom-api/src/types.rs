// axiom-api/src/types.rs
//
// Request/response DTOs for the REST surface, spec.md §6's table. `Block`
// and `Fact` already derive `Serialize`/`Deserialize` in `axiom-core`, so
// routes that return them embed those types directly rather than
// duplicating their fields here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct FactsByIdRequest {
    pub fact_ids: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StakeRequest {
    pub stake_amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[allow(dead_code)]
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeerView {
    pub addr: String,
    pub pubkey: String,
    pub reputation: i32,
    pub last_seen: u64,
}
