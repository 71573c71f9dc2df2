//! Ledger Wallet API Server
//!
//! Local HTTP API that polls the wallet node and serves resolved balances,
//! order books and node actions to the browser UI.

mod config;
mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wallet_node::{NodeClient, PriceClient};
use wallet_services::WalletPoller;

use crate::config::WalletConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Background poller holding the latest snapshot
    pub poller: Arc<WalletPoller>,
    /// Direct node access for writes and on-demand reads
    pub node: Arc<NodeClient>,
}

/// Build the HTTP router
pub fn build_router(state: AppState) -> Router {
    // Configure CORS for the browser UI
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,wallet_api=debug")),
        )
        .init();

    info!("Starting Ledger Wallet API");

    let config = WalletConfig::from_env()?;
    info!(
        "Node at {} (quorum {}%, min {} reports)",
        config.node_url, config.quorum_threshold, config.quorum_min_samples
    );

    let node = Arc::new(NodeClient::new(&config.node_url, config.request_timeout)?);

    let mut poller = WalletPoller::new(node.clone(), config.poller_config());
    if config.price_feed {
        match PriceClient::new(config.request_timeout) {
            Ok(feed) => {
                info!("USD price feed enabled");
                poller = poller.with_price_feed(feed);
            }
            Err(e) => warn!("Price feed unavailable: {}", e),
        }
    } else {
        info!("USD price feed disabled (WALLET_PRICE_FEED=off)");
    }

    // Start polling in background
    let poller = Arc::new(poller);
    let _poll_tasks = poller.clone().start();

    let state = AppState { poller, node };
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server_port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
