// axiom-api/src/handlers.rs
//
// One function per route, generalized from the teacher's
// `RpcMethods::handle` dispatch table (one function per JSON-RPC verb,
// each reading straight off `Blockchain`/`Database`) to Axiom's REST
// surface — each function here reads off `axiom_storage::Database`
// and, where the route needs it, the validator set or network handle,
// through `ApiState`.

use crate::state::ApiState;
use crate::types::{FactsByIdRequest, PeerView, StakeRequest};
use crate::ApiError;
use axiom_core::{Block, Fact, Height, Ledger, MAX_FACTS_PER_BLOCK};
use serde_json::{json, Value};
use std::sync::Arc;

/// spec.md §6: `/get_blocks` returns "up to 100" blocks per page.
const MAX_BLOCKS_PER_PAGE: usize = 100;
/// A generous cap on `/get_fact_ids`, which has no pagination in the spec.
const MAX_FACT_IDS_LISTED: usize = 10_000;

pub async fn status(state: &Arc<ApiState>) -> Result<Value, ApiError> {
    let chain_height = state.db.chain_height()?.unwrap_or(0);
    let peer_count = state.network.connected_peer_count().await;
    let fingerprint = state.keypair.fingerprint();
    let stake = {
        let validators = state.validators.read().await;
        validators.get(&fingerprint).map(|v| v.stake).unwrap_or(0)
    };

    Ok(json!({
        "status": "ok",
        "version": state.version,
        "chain_height": chain_height,
        "peer_count": peer_count,
        "validator": { "stake": stake, "is_validator": stake > 0 },
    }))
}

pub async fn chain_height(state: &Arc<ApiState>) -> Result<Value, ApiError> {
    let height = state.db.chain_height()?.unwrap_or(0);
    Ok(json!({ "status": "ok", "height": height }))
}

pub async fn get_blocks(state: &Arc<ApiState>, since: Height) -> Result<Value, ApiError> {
    let tip = state.db.chain_height()?.unwrap_or(0);
    let mut blocks: Vec<Block> = Vec::new();
    let mut height = since;
    while height <= tip && blocks.len() < MAX_BLOCKS_PER_PAGE {
        if let Some(block) = state.db.get_block_by_height(height)? {
            blocks.push(block);
        }
        height += 1;
    }
    Ok(json!({ "status": "ok", "blocks": blocks }))
}

pub async fn get_peers(state: &Arc<ApiState>) -> Result<Value, ApiError> {
    let peers = state.db.list_peers(0, 256)?;
    let views: Vec<PeerView> = peers
        .into_iter()
        .map(|p| PeerView {
            addr: p.network_address.to_string(),
            pubkey: p.public_key.to_hex(),
            reputation: p.reputation_score,
            last_seen: p.last_seen,
        })
        .collect();
    Ok(json!({ "status": "ok", "peers": views }))
}

pub async fn get_fact_ids(state: &Arc<ApiState>) -> Result<Value, ApiError> {
    let ids = state.db.list_fact_ids(MAX_FACT_IDS_LISTED)?;
    Ok(json!({ "status": "ok", "ids": ids }))
}

pub async fn get_facts_by_id(state: &Arc<ApiState>, body: Value) -> Result<Value, ApiError> {
    let request: FactsByIdRequest =
        serde_json::from_value(body).map_err(|_| ApiError::BadRequest("expected { fact_ids: [int] }".into()))?;

    let mut facts: Vec<Fact> = Vec::with_capacity(request.fact_ids.len());
    for id in request.fact_ids {
        if let Some(fact) = state.db.get_fact_by_id(id)? {
            facts.push(fact);
        }
    }
    Ok(json!({ "status": "ok", "facts": facts }))
}

/// `POST /validator/stake`: adds `stake_amount` to this node's own stake
/// and persists the updated validator set.
pub async fn validator_stake(state: &Arc<ApiState>, body: Value) -> Result<Value, ApiError> {
    let request: StakeRequest =
        serde_json::from_value(body).map_err(|_| ApiError::BadRequest("expected { stake_amount: int }".into()))?;

    let fingerprint = state.keypair.fingerprint();
    let total_stake = {
        let mut validators = state.validators.write().await;
        let current = validators.get(&fingerprint).map(|v| v.stake).unwrap_or(0);
        let total = current + request.stake_amount;
        validators.set_stake(fingerprint, total);
        validators.save(&state.db).await?;
        total
    };

    Ok(json!({ "status": "ok", "ok": true, "total_stake": total_stake }))
}

/// `POST /chat` delegates to the external search collaborator, which has
/// no implementation in this build — the route exists only so the
/// surface is complete (spec.md §6).
pub async fn chat(_state: &Arc<ApiState>, _body: Value) -> Result<Value, ApiError> {
    Err(ApiError::NotImplemented("the search collaborator is not part of this build".into()))
}

/// `POST /debug/propose_block`, gated on `AXIOM_DEBUG=true`. Builds and
/// commits a block from whatever trusted facts are currently unsealed,
/// exactly as `axiom_consensus::ConsensusLoop::try_propose` would, but
/// without waiting for this node's leader slot — it exists purely to let
/// an operator or test harness force chain progress.
pub async fn debug_propose_block(state: &Arc<ApiState>) -> Result<Value, ApiError> {
    if !state.debug_enabled {
        return Err(ApiError::NotFound("no such route: /debug/propose_block".into()));
    }

    let tip = state.db.chain_tip()?;
    let next_height = tip.height + 1;
    if !state.db.record_signed_height(next_height).await? {
        return Ok(json!({
            "status": "ok",
            "proposed": false,
            "reason": "already signed at or above this height",
        }));
    }

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let slot = axiom_consensus::slot_for(now);
    let fingerprint = state.keypair.fingerprint();

    let candidates = state.db.list_unsealed_trusted_facts(MAX_FACTS_PER_BLOCK)?;
    let mut block = Ledger::propose_block(&candidates, &tip, fingerprint, now, slot);
    block.signature = state.keypair.sign(block.hash.as_bytes()).map_err(|e| ApiError::Internal(e.to_string()))?;

    state.db.append_block(&block, &candidates).await?;
    state.ledger.notify_committed(block.height, block.hash);
    state.network.broadcast_block(&block).await;

    Ok(json!({ "status": "ok", "proposed": true, "height": block.height, "hash": block.hash.to_hex() }))
}
