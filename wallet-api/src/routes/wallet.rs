//! Read endpoints backed by the latest poll snapshot

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use wallet_core::{IdentitySummary, OrderBook, OrderSide, Peer, PeerLimits, PortfolioTotals, WalletSnapshot};
use wallet_services::Selection;

use super::ApiError;
use crate::AppState;

/// Response for the identity list
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitiesResponse {
    pub identities: Vec<IdentitySummary>,
    pub totals: PortfolioTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value_usd: Option<Decimal>,
    pub count: usize,
}

/// Query parameters for the order book
#[derive(Debug, Deserialize)]
pub struct OrderBookQuery {
    /// Fetch this asset live instead of the polled selection
    pub asset: Option<String>,
}

/// Response for the order book
#[derive(Debug, Serialize)]
pub struct OrderBookResponse {
    pub selection: Selection,
    pub orderbook: Option<OrderBook>,
    /// Best ask minus best bid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<i64>,
}

/// Response for the peer list
#[derive(Debug, Serialize)]
pub struct PeersResponse {
    pub peers: Vec<Peer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<PeerLimits>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct TickResponse {
    pub tick: Option<u64>,
}

/// Wallet security state
#[derive(Debug, Serialize)]
pub struct WalletStatusResponse {
    pub encrypted: bool,
    pub unlocked: bool,
}

/// Request to change the selected asset
#[derive(Debug, Deserialize)]
pub struct SelectAssetRequest {
    pub asset: Option<String>,
}

/// Create wallet read routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/snapshot", get(get_snapshot))
        .route("/identities", get(list_identities))
        .route("/orderbook", get(get_orderbook))
        .route("/peers", get(list_peers))
        .route("/tick", get(get_tick))
        .route("/wallet/status", get(wallet_status))
        .route("/selection/asset", post(select_asset))
}

/// GET /api/snapshot
async fn get_snapshot(State(state): State<AppState>) -> Json<Arc<WalletSnapshot>> {
    Json(state.poller.snapshot())
}

/// GET /api/identities
async fn list_identities(State(state): State<AppState>) -> Json<IdentitiesResponse> {
    let snapshot = state.poller.snapshot();

    Json(IdentitiesResponse {
        identities: snapshot.identities.clone(),
        totals: snapshot.totals.clone(),
        total_value_usd: snapshot.total_value_usd,
        count: snapshot.identities.len(),
    })
}

/// GET /api/orderbook
async fn get_orderbook(
    State(state): State<AppState>,
    Query(query): Query<OrderBookQuery>,
) -> Result<Json<OrderBookResponse>, ApiError> {
    let selection = state.poller.selection().await;

    let orderbook = match query.asset.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        Some(asset) => {
            let asset = asset.to_uppercase();
            debug!("Fetching live order book for {}", asset);
            let limit = state.poller.config().orderbook_limit;
            let (asks, bids) = tokio::join!(
                state.node.orderbook_side(&asset, OrderSide::Ask, limit, 0),
                state.node.orderbook_side(&asset, OrderSide::Bid, limit, 0),
            );
            Some(OrderBook::from_node_rows(asset, asks?, bids?))
        }
        None => state.poller.snapshot().orderbook.clone(),
    };

    Ok(Json(OrderBookResponse {
        selection,
        spread: orderbook.as_ref().and_then(OrderBook::spread),
        orderbook,
    }))
}

/// GET /api/peers
async fn list_peers(State(state): State<AppState>) -> Json<PeersResponse> {
    let peers = state.poller.snapshot().peers.clone();

    let limits = match state.node.peer_limits().await {
        Ok(limits) => Some(limits),
        Err(e) => {
            warn!("Failed to fetch peer limits: {}", e);
            None
        }
    };

    Json(PeersResponse {
        count: peers.len(),
        peers,
        limits,
    })
}

/// GET /api/tick
async fn get_tick(State(state): State<AppState>) -> Json<TickResponse> {
    Json(TickResponse {
        tick: state.poller.latest_tick(),
    })
}

/// GET /api/wallet/status
async fn wallet_status(State(state): State<AppState>) -> Result<Json<WalletStatusResponse>, ApiError> {
    let (encrypted, unlocked) = tokio::join!(
        state.node.wallet_is_encrypted(),
        state.node.wallet_unlocked(),
    );

    Ok(Json(WalletStatusResponse {
        encrypted: encrypted?,
        unlocked: unlocked?,
    }))
}

/// POST /api/selection/asset
async fn select_asset(
    State(state): State<AppState>,
    Json(request): Json<SelectAssetRequest>,
) -> Result<Json<Selection>, ApiError> {
    let selection = state.poller.select_asset(request.asset.as_deref()).await?;

    // Refresh now so the new book shows up before the next scheduled cycle
    let poller = state.poller.clone();
    tokio::spawn(async move {
        poller.refresh_snapshot().await;
    });

    Ok(Json(selection))
}
