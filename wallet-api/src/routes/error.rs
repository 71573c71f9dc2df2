//! Mapping from wallet errors to HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};
use wallet_core::WalletError;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error carrying a [`WalletError`]
#[derive(Debug)]
pub struct ApiError(pub WalletError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            WalletError::Rejected(_) | WalletError::Validation(_) => StatusCode::BAD_REQUEST,
            WalletError::NotFound(_) => StatusCode::NOT_FOUND,
            WalletError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            WalletError::Network(_) | WalletError::Api(_) | WalletError::Parse(_) => {
                StatusCode::BAD_GATEWAY
            }
            WalletError::Config(_) | WalletError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WalletError> for ApiError {
    fn from(e: WalletError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request refused: {}", self.0);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
