//! mpunks-gateway
//!
//! Axum HTTP service for local miners: nonce checks, work submission,
//! mining-input snapshots and miner heartbeats. Every response is wrapped
//! in the `{status: success|error, payload}` envelope the miner tooling
//! expects. The pooled-miner watcher lives in [`pool`].

pub mod config;
pub mod pool;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use ethers::types::{Address, U256};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use mpunks_chain::{
    check_gas_price, check_nonce, get_mining_inputs, submit_mint, ChainError, ChainGateway,
    GasStatus, LegacyPunkIndex, MiningInputs, NonceStatus,
};

/// How long a mining-inputs snapshot may be served from cache.
pub const MINING_INPUTS_TTL: Duration = Duration::from_secs(30);

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<dyn ChainGateway>,
    pub legacy: Arc<LegacyPunkIndex>,
    /// Address requests are evaluated for; absent when neither a key nor
    /// a wallet address was configured.
    pub sender: Option<Address>,
    /// Whether a signing key is available for submission.
    pub can_sign: bool,
    pub max_gas_gwei: String,
    inputs_cache: Arc<RwLock<Option<(Instant, MiningInputs)>>>,
}

impl AppState {
    pub fn new(
        chain: Arc<dyn ChainGateway>,
        legacy: Arc<LegacyPunkIndex>,
        sender: Option<Address>,
        can_sign: bool,
        max_gas_gwei: String,
    ) -> Self {
        Self {
            chain,
            legacy,
            sender,
            can_sign,
            max_gas_gwei,
            inputs_cache: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build the router.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/check-nonce", get(check_nonce_handler))
        .route("/submit-work", post(submit_work_handler))
        .route("/mining-inputs", get(mining_inputs_handler))
        .route("/heartbeat", get(heartbeat_handler))
        .layer(cors)
        .with_state(state)
}

/// Parse a nonce from its decimal or 0x-hex string form, capped at the
/// contract's 88-bit width.
pub fn parse_nonce(raw: &str) -> Result<U256, ChainError> {
    // U256::from_dec_str accepts "" as zero; an absent digit string is
    // caller error, not nonce 0.
    if raw.is_empty() || raw == "0x" {
        return Err(ChainError::InvalidInput("empty nonce".into()));
    }
    let nonce = if let Some(hex) = raw.strip_prefix("0x") {
        U256::from_str_radix(hex, 16)
            .map_err(|e| ChainError::InvalidInput(format!("invalid nonce {raw:?}: {e}")))?
    } else {
        U256::from_dec_str(raw)
            .map_err(|e| ChainError::InvalidInput(format!("invalid nonce {raw:?}: {e}")))?
    };

    if nonce.bits() > 88 {
        return Err(ChainError::InvalidInput(format!(
            "nonce {raw} exceeds 88 bits"
        )));
    }
    Ok(nonce)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SubmitWorkQuery {
    nonce: Option<String>,
}

async fn check_nonce_handler(
    State(state): State<AppState>,
    Query(query): Query<SubmitWorkQuery>,
) -> Result<Json<Value>, ApiError> {
    let nonce = require_nonce(query.nonce.as_deref())?;
    let sender = require_sender(&state)?;

    let nonce_status = check_nonce(state.chain.as_ref(), &state.legacy, nonce, sender).await?;
    info!(%nonce, status = %nonce_status, "checked nonce");

    Ok(success(json!({ "nonceStatus": nonce_status })))
}

async fn submit_work_handler(
    State(state): State<AppState>,
    Query(query): Query<SubmitWorkQuery>,
) -> Result<Json<Value>, ApiError> {
    if !state.can_sign {
        return Err(ApiError::bad_request(
            "PRIVATE_KEY must be set to use this endpoint",
        ));
    }
    let nonce = require_nonce(query.nonce.as_deref())?;
    let sender = require_sender(&state)?;

    // Status is recomputed here even if the client checked moments ago:
    // remote state may have advanced in between.
    let nonce_status = check_nonce(state.chain.as_ref(), &state.legacy, nonce, sender).await?;
    if nonce_status != NonceStatus::Valid {
        info!(%nonce, status = %nonce_status, "nonce will not be submitted");
        return Ok(failure(json!({ "nonceStatus": nonce_status })));
    }

    let gas_status = check_gas_price(state.chain.as_ref(), &state.max_gas_gwei).await?;
    if gas_status == GasStatus::GasTooHigh {
        info!(
            max_gas_gwei = %state.max_gas_gwei,
            "nonce is valid, but gas price is above the configured ceiling"
        );
        return Ok(failure(
            json!({ "nonceStatus": nonce_status, "gasStatus": gas_status }),
        ));
    }

    let tx_hash = submit_mint(state.chain.as_ref(), nonce).await?;
    Ok(success(json!({
        "nonceStatus": nonce_status,
        "gasStatus": gas_status,
        "txHash": format!("{tx_hash:?}"),
    })))
}

async fn mining_inputs_handler(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let sender = require_sender(&state)?;

    if let Some((fetched_at, inputs)) = state.inputs_cache.read().await.clone() {
        if fetched_at.elapsed() <= MINING_INPUTS_TTL {
            return Ok(success(serde_json::to_value(inputs).map_err(internal)?));
        }
    }

    let inputs = get_mining_inputs(state.chain.as_ref(), sender).await?;
    *state.inputs_cache.write().await = Some((Instant::now(), inputs.clone()));
    info!("served fresh mining inputs");

    Ok(success(serde_json::to_value(inputs).map_err(internal)?))
}

#[derive(Debug, Deserialize)]
struct HeartbeatQuery {
    hashrate: Option<f64>,
}

async fn heartbeat_handler(Query(query): Query<HeartbeatQuery>) -> Json<Value> {
    match query.hashrate {
        Some(hashrate) => info!(hashrate, "miner heartbeat"),
        None => info!("miner heartbeat"),
    }
    success(json!({}))
}

fn require_nonce(raw: Option<&str>) -> Result<U256, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::bad_request("missing nonce query parameter"))?;
    parse_nonce(raw).map_err(ApiError::from)
}

fn require_sender(state: &AppState) -> Result<Address, ApiError> {
    state.sender.ok_or_else(|| {
        ApiError::bad_request(
            "PRIVATE_KEY or a wallet address must be configured to use this endpoint",
        )
    })
}

// ---------------------------------------------------------------------------
// Envelope & errors
// ---------------------------------------------------------------------------

fn success(payload: Value) -> Json<Value> {
    Json(json!({ "status": "success", "payload": payload }))
}

/// Error envelope for classified (non-transport) outcomes; answered 200.
fn failure(payload: Value) -> Json<Value> {
    Json(json!({ "status": "error", "payload": payload }))
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        let status = match err {
            ChainError::Config(_) | ChainError::InvalidInput(_) | ChainError::Wallet(_) => {
                StatusCode::BAD_REQUEST
            }
            ChainError::Rpc(_) | ChainError::Feed(_) | ChainError::Submission(_) => {
                StatusCode::BAD_GATEWAY
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({
            "status": "error",
            "payload": { "message": self.message },
        });
        (self.status, Json(body)).into_response()
    }
}

fn internal(err: serde_json::Error) -> ApiError {
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: err.to_string(),
    }
}
