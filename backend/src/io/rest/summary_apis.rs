//! # REST API for the Dashboard Summary

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use tracing::{error, info};

use crate::io::rest::mappers::summary_mapper::SummaryMapper;
use crate::io::rest::{credentials_from_headers, error_response};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_summary))
}

/// Aggregated view of the scope's expenses plus the current month's reconciliation
pub async fn get_summary(State(state): State<AppState>, headers: HeaderMap) -> Response {
    info!("GET /api/summary");

    let scope = match state.identity_service.resolve(&credentials_from_headers(&headers)).await {
        Ok(scope) => scope,
        Err(e) => return error_response(e),
    };

    match state.summary_service.get_summary(&scope).await {
        Ok(summary) => (StatusCode::OK, Json(SummaryMapper::to_response(summary))).into_response(),
        Err(e) => {
            error!("Failed to build summary: {}", e);
            error_response(e)
        }
    }
}
