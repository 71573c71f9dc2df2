//! Write endpoints forwarded to the node
//!
//! Every write is validated client-side first, then signed by the node. The
//! node's reply text (a txid or status message) is passed back unchanged.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use wallet_core::{PeerLimits, WalletError};
use wallet_node::{AssetTransferRequest, NodeReply, QxOrderAction, QxOrderRequest, TransferRequest};

use super::ApiError;
use crate::AppState;

/// Ticks ahead of the latest tick a transaction is scheduled for
pub const EXPIRATION_OFFSET: u64 = 10;

/// Unlock duration when the request does not give one
const DEFAULT_UNLOCK_MS: u64 = 60_000;

// ============================================================================
// Types
// ============================================================================

/// Request to send native coins
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferBody {
    pub source: String,
    pub destination: String,
    pub amount: i64,
    /// Defaults to the latest tick plus [`EXPIRATION_OFFSET`]
    pub expiration_tick: Option<u64>,
    pub password: Option<String>,
}

/// Request to send shares of an asset
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransferBody {
    pub asset: String,
    /// Looked up from the issued asset list when omitted
    pub issuer: Option<String>,
    pub source: String,
    pub destination: String,
    pub amount: i64,
    pub expiration_tick: Option<u64>,
    pub password: Option<String>,
}

/// Request to place or remove a QX order
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBody {
    pub asset: String,
    /// Looked up from the issued asset list when omitted
    pub issuer: Option<String>,
    pub action: QxOrderAction,
    pub address: String,
    pub price: i64,
    pub amount: i64,
    pub tick: Option<u64>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordBody {
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportIdentityBody {
    pub seed: String,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedBody {
    pub seed: String,
}

#[derive(Debug, Serialize)]
pub struct SeedIdentityResponse {
    pub identity: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordQuery {
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddPeerBody {
    /// `ip:port`
    pub address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockBody {
    pub password: String,
    pub duration_ms: Option<u64>,
}

/// Create write routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transfers", post(submit_transfer))
        .route("/assets/transfers", post(submit_asset_transfer))
        .route("/orders", post(submit_order))
        .route("/identities", post(create_identity))
        .route("/identities/import", post(import_identity))
        .route("/identities/from-seed", post(identity_from_seed))
        .route("/identities/{id}", delete(delete_identity))
        .route("/peers", post(add_peer))
        .route("/peers/{id}", delete(delete_peer))
        .route("/peers/limits", post(set_peer_limits))
        .route("/wallet/master-password", post(set_master_password))
        .route("/wallet/encrypt", post(encrypt_wallet))
        .route("/wallet/unlock", post(unlock_wallet))
}

/// Latest tick plus the scheduling offset
async fn default_expiration(state: &AppState) -> Result<u64, ApiError> {
    let tick = match state.poller.latest_tick() {
        Some(tick) => tick,
        None => state.node.latest_tick().await?,
    };
    Ok(tick + EXPIRATION_OFFSET)
}

/// Issuer from the request, or from the latest issued asset list
fn resolve_issuer(state: &AppState, asset: &str, issuer: Option<String>) -> Result<String, ApiError> {
    match issuer {
        Some(issuer) => Ok(issuer),
        None => state
            .poller
            .snapshot()
            .issuer_of(asset)
            .map(str::to_string)
            .ok_or_else(|| ApiError(WalletError::validation(format!("Unknown asset: {}", asset)))),
    }
}

fn required_password(password: Option<String>) -> Result<String, ApiError> {
    password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError(WalletError::validation("Password is required")))
}

// ============================================================================
// Transactions
// ============================================================================

/// POST /api/transfers
async fn submit_transfer(
    State(state): State<AppState>,
    Json(body): Json<TransferBody>,
) -> Result<Json<NodeReply>, ApiError> {
    let expiration_tick = match body.expiration_tick {
        Some(tick) => tick,
        None => default_expiration(&state).await?,
    };

    let request = TransferRequest {
        source: body.source,
        destination: body.destination,
        amount: body.amount,
        expiration_tick,
        password: body.password,
    };

    let reply = state.node.transfer(&request).await?;
    info!("Transfer queued for tick {}: {}", expiration_tick, reply.message);
    Ok(Json(reply))
}

/// POST /api/assets/transfers
async fn submit_asset_transfer(
    State(state): State<AppState>,
    Json(body): Json<AssetTransferBody>,
) -> Result<Json<NodeReply>, ApiError> {
    let asset = body.asset.trim().to_uppercase();
    let issuer = resolve_issuer(&state, &asset, body.issuer)?;

    let expiration_tick = match body.expiration_tick {
        Some(tick) => tick,
        None => default_expiration(&state).await?,
    };

    let request = AssetTransferRequest {
        asset,
        issuer,
        source: body.source,
        destination: body.destination,
        amount: body.amount,
        expiration_tick,
        password: body.password,
    };

    let reply = state.node.transfer_asset(&request).await?;
    info!(
        "{} transfer queued for tick {}: {}",
        request.asset, expiration_tick, reply.message
    );
    Ok(Json(reply))
}

/// POST /api/orders
async fn submit_order(
    State(state): State<AppState>,
    Json(body): Json<OrderBody>,
) -> Result<Json<NodeReply>, ApiError> {
    let asset = body.asset.trim().to_uppercase();

    let issuer = resolve_issuer(&state, &asset, body.issuer)?;

    let tick = match body.tick {
        Some(tick) => tick,
        None => default_expiration(&state).await?,
    };

    let request = QxOrderRequest {
        tick,
        issuer,
        asset,
        action: body.action,
        address: body.address,
        price: body.price,
        amount: body.amount,
        password: body.password,
    };

    let reply = state.node.place_order(&request).await?;
    Ok(Json(reply))
}

// ============================================================================
// Identities
// ============================================================================

/// POST /api/identities
async fn create_identity(
    State(state): State<AppState>,
    Json(body): Json<PasswordBody>,
) -> Result<Json<NodeReply>, ApiError> {
    let password = body.password.filter(|p| !p.is_empty());
    Ok(Json(state.node.create_identity(password.as_deref()).await?))
}

/// POST /api/identities/import
async fn import_identity(
    State(state): State<AppState>,
    Json(body): Json<ImportIdentityBody>,
) -> Result<Json<NodeReply>, ApiError> {
    let seed = body.seed.trim();
    Ok(Json(state.node.add_identity(seed, body.password.as_deref()).await?))
}

/// POST /api/identities/from-seed
///
/// The seed travels in the body so it stays out of request logs.
async fn identity_from_seed(
    State(state): State<AppState>,
    Json(body): Json<SeedBody>,
) -> Result<Json<SeedIdentityResponse>, ApiError> {
    let identity = state.node.identity_from_seed(body.seed.trim()).await?;
    Ok(Json(SeedIdentityResponse { identity }))
}

/// DELETE /api/identities/{id}
async fn delete_identity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PasswordQuery>,
) -> Result<Json<NodeReply>, ApiError> {
    Ok(Json(state.node.delete_identity(&id, query.password.as_deref()).await?))
}

// ============================================================================
// Peers
// ============================================================================

/// POST /api/peers
async fn add_peer(
    State(state): State<AppState>,
    Json(body): Json<AddPeerBody>,
) -> Result<Json<NodeReply>, ApiError> {
    Ok(Json(state.node.add_peer(body.address.trim()).await?))
}

/// DELETE /api/peers/{id}
async fn delete_peer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NodeReply>, ApiError> {
    Ok(Json(state.node.delete_peer(&id).await?))
}

/// POST /api/peers/limits
async fn set_peer_limits(
    State(state): State<AppState>,
    Json(limits): Json<PeerLimits>,
) -> Result<Json<PeerLimits>, ApiError> {
    state.node.set_peer_limits(limits).await?;
    Ok(Json(limits))
}

// ============================================================================
// Wallet Security
// ============================================================================

/// POST /api/wallet/master-password
async fn set_master_password(
    State(state): State<AppState>,
    Json(body): Json<PasswordBody>,
) -> Result<Json<NodeReply>, ApiError> {
    let password = required_password(body.password)?;
    Ok(Json(state.node.set_master_password(&password).await?))
}

/// POST /api/wallet/encrypt
async fn encrypt_wallet(
    State(state): State<AppState>,
    Json(body): Json<PasswordBody>,
) -> Result<Json<NodeReply>, ApiError> {
    let password = required_password(body.password)?;
    Ok(Json(state.node.encrypt_wallet(&password).await?))
}

/// POST /api/wallet/unlock
async fn unlock_wallet(
    State(state): State<AppState>,
    Json(body): Json<UnlockBody>,
) -> Result<Json<NodeReply>, ApiError> {
    let password = required_password(Some(body.password))?;
    let duration = Duration::from_millis(body.duration_ms.unwrap_or(DEFAULT_UNLOCK_MS));
    Ok(Json(state.node.unlock_wallet(&password, duration).await?))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{json, offline_app, send};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json as body;

    fn identity(c: char) -> String {
        c.to_string().repeat(60)
    }

    #[tokio::test]
    async fn test_transfer_validation_before_node() {
        let (status, response) = send(
            offline_app(),
            json(
                "POST",
                "/api/transfers",
                body!({
                    "source": identity('A'),
                    "destination": identity('B'),
                    "amount": 0,
                    "expirationTick": 120,
                }),
            ),
        )
        .await;
        assert_eq!(status, 400);
        assert!(response["error"].as_str().unwrap().contains("amount"));
    }

    #[tokio::test]
    async fn test_transfer_without_tick_needs_node() {
        let (status, _) = send(
            offline_app(),
            json(
                "POST",
                "/api/transfers",
                body!({
                    "source": identity('A'),
                    "destination": identity('B'),
                    "amount": 5,
                }),
            ),
        )
        .await;
        assert_eq!(status, 502);
    }

    #[tokio::test]
    async fn test_order_for_unknown_asset() {
        let (status, response) = send(
            offline_app(),
            json(
                "POST",
                "/api/orders",
                body!({
                    "asset": "qx",
                    "action": "bid",
                    "address": identity('A'),
                    "price": 10,
                    "amount": 1,
                    "tick": 50,
                }),
            ),
        )
        .await;
        assert_eq!(status, 400);
        assert!(response["error"].as_str().unwrap().contains("QX"));
    }

    #[tokio::test]
    async fn test_asset_transfer_routes() {
        let transfer = |asset: &str, amount: i64| {
            body!({
                "asset": asset,
                "issuer": identity('I'),
                "source": identity('A'),
                "destination": identity('B'),
                "amount": amount,
                "expirationTick": 200,
            })
        };

        let (status, response) = send(
            offline_app(),
            json("POST", "/api/assets/transfers", transfer("qx", 0)),
        )
        .await;
        assert_eq!(status, 400);
        assert!(response["error"].as_str().unwrap().contains("amount"));

        let (status, _) = send(
            offline_app(),
            json("POST", "/api/assets/transfers", transfer("TOOLONGNAME", 4)),
        )
        .await;
        assert_eq!(status, 400);

        // valid request reaches the node, which is not running
        let (status, _) = send(
            offline_app(),
            json("POST", "/api/assets/transfers", transfer("qx", 4)),
        )
        .await;
        assert_eq!(status, 502);

        let (status, response) = send(
            offline_app(),
            json(
                "POST",
                "/api/assets/transfers",
                body!({
                    "asset": "cfb",
                    "source": identity('A'),
                    "destination": identity('B'),
                    "amount": 1,
                }),
            ),
        )
        .await;
        assert_eq!(status, 400);
        assert!(response["error"].as_str().unwrap().contains("CFB"));
    }

    #[tokio::test]
    async fn test_identity_from_seed() {
        let (status, response) = send(
            offline_app(),
            json("POST", "/api/identities/from-seed", body!({ "seed": "NOTASEED" })),
        )
        .await;
        assert_eq!(status, 400);
        assert!(response["error"].as_str().unwrap().contains("seed"));

        let seed = "a".repeat(55);
        let (status, _) = send(
            offline_app(),
            json("POST", "/api/identities/from-seed", body!({ "seed": seed })),
        )
        .await;
        assert_eq!(status, 502);
    }

    #[tokio::test]
    async fn test_identity_routes_validate() {
        let (status, _) = send(
            offline_app(),
            json("POST", "/api/identities/import", body!({ "seed": "tooshort" })),
        )
        .await;
        assert_eq!(status, 400);

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/identities/NOTANIDENTITY")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(offline_app(), request).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_wallet_security_requires_password() {
        let (status, _) = send(
            offline_app(),
            json("POST", "/api/wallet/encrypt", body!({ "password": "" })),
        )
        .await;
        assert_eq!(status, 400);

        let (status, _) = send(
            offline_app(),
            json("POST", "/api/wallet/master-password", body!({})),
        )
        .await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_peer_routes() {
        let (status, _) = send(
            offline_app(),
            json("POST", "/api/peers/limits", body!({ "min": 8, "max": 2 })),
        )
        .await;
        assert_eq!(status, 400);

        let (status, response) = send(
            offline_app(),
            json("POST", "/api/peers", body!({ "address": "10.0.0.1:21841" })),
        )
        .await;
        assert_eq!(status, 502);
        assert!(response["error"].as_str().unwrap().starts_with("Network error"));
    }
}
