// axiom-api/src/server.rs
//
// Generalized from the teacher's `RpcServer` (hyper `Server::bind` plus
// a CORS-wrapped JSON-RPC dispatch loop) to REST path+method routing.
// The "fixed worker pool of 16" from spec.md §5 isn't a distinct thread
// pool in hyper's model — it's realized as a `tokio::sync::Semaphore`
// acquired once per request, bounding how many handlers run at once
// regardless of how many connections hyper has multiplexed in.

use crate::state::ApiState;
use crate::{handlers, ApiError};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen_addr: SocketAddr,
    pub worker_permits: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { listen_addr: "127.0.0.1:8080".parse().unwrap(), worker_permits: 16 }
    }
}

pub struct ApiServer {
    config: ApiConfig,
    state: Arc<ApiState>,
    permits: Arc<Semaphore>,
}

impl ApiServer {
    pub fn new(config: ApiConfig, state: Arc<ApiState>) -> Self {
        let permits = Arc::new(Semaphore::new(config.worker_permits));
        Self { config, state, permits }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let state = self.state;
        let permits = self.permits;

        let make_svc = make_service_fn(move |_conn| {
            let state = state.clone();
            let permits = permits.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    let state = state.clone();
                    let permits = permits.clone();
                    async move {
                        let _permit = permits.acquire_owned().await.expect("worker semaphore never closes");
                        Ok::<_, Infallible>(route(req, state).await)
                    }
                }))
            }
        });

        tracing::info!(addr = %self.config.listen_addr, "api server listening");
        Server::bind(&self.config.listen_addr).serve(make_svc).await?;
        Ok(())
    }
}

async fn route(req: Request<Body>, state: Arc<ApiState>) -> Response<Body> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();

    match dispatch(method, &path, &query, req, &state).await {
        Ok(value) => json_response(StatusCode::OK, &value),
        Err(err) => {
            tracing::warn!(kind = err.kind(), message = %err, path = %path, "api request failed");
            let body = serde_json::json!({ "status": "error", "kind": err.kind(), "message": err.to_string() });
            json_response(err.status_code(), &body)
        }
    }
}

async fn dispatch(
    method: Method,
    path: &str,
    query: &str,
    req: Request<Body>,
    state: &Arc<ApiState>,
) -> Result<serde_json::Value, ApiError> {
    match (method, path) {
        (Method::GET, "/status") => handlers::status(state).await,
        (Method::GET, "/get_chain_height") => handlers::chain_height(state).await,
        (Method::GET, "/get_blocks") => {
            let since = query_param(query, "since").and_then(|v| v.parse().ok()).unwrap_or(0);
            handlers::get_blocks(state, since).await
        }
        (Method::GET, "/get_peers") => handlers::get_peers(state).await,
        (Method::GET, "/get_fact_ids") => handlers::get_fact_ids(state).await,
        (Method::POST, "/get_facts_by_id") => handlers::get_facts_by_id(state, read_json(req).await?).await,
        (Method::POST, "/validator/stake") => handlers::validator_stake(state, read_json(req).await?).await,
        (Method::POST, "/chat") => handlers::chat(state, read_json(req).await?).await,
        (Method::POST, "/debug/propose_block") => handlers::debug_propose_block(state).await,
        _ => Err(ApiError::NotFound(format!("no such route: {path}"))),
    }
}

fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let k = parts.next()?;
        let v = parts.next().unwrap_or("");
        (k == key).then_some(v)
    })
}

async fn read_json(req: Request<Body>) -> Result<serde_json::Value, ApiError> {
    let bytes = hyper::body::to_bytes(req.into_body())
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read request body: {e}")))?;
    if bytes.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("invalid json body: {e}")))
}

fn json_response(status: StatusCode, value: &serde_json::Value) -> Response<Body> {
    let bytes = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_finds_value() {
        assert_eq!(query_param("since=5&foo=bar", "since"), Some("5"));
        assert_eq!(query_param("foo=bar", "since"), None);
        assert_eq!(query_param("", "since"), None);
    }
}
