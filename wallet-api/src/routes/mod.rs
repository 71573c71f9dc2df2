//! API route definitions

mod actions;
mod error;
mod health;
mod wallet;

use axum::Router;
use crate::AppState;

pub use error::ApiError;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(wallet::routes())
        .merge(actions::routes())
}
