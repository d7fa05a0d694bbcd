//! Health check endpoints.

use axum::{extract::State, http::StatusCode};

use crate::api::ProductQuery;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Fetches a one-item product page (bypassing the category cache) and
/// returns 503 Service Unavailable if the remote API does not answer.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let probe = ProductQuery {
        page: 1,
        per_page: 1,
        search: None,
        category: None,
    };
    match state.api().list_products(&probe).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
