//! # REST API for Salaries
//!
//! Per-period salary history of the requesting owner scope and monthly
//! reconciliation against its expenses.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use shared::SetSalaryRequest;
use tracing::{error, info};

use crate::io::rest::mappers::salary_mapper::SalaryMapper;
use crate::io::rest::{credentials_from_headers, error_response, parse_month};
use crate::AppState;

/// Create a router for salary related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_salary_history).put(set_salary))
        .route("/:year/:month/reconciliation", get(get_reconciliation))
}

pub async fn get_salary_history(State(state): State<AppState>, headers: HeaderMap) -> Response {
    info!("GET /api/salaries");

    let scope = match state.identity_service.resolve(&credentials_from_headers(&headers)).await {
        Ok(scope) => scope,
        Err(e) => return error_response(e),
    };

    match state.salary_service.get_salary_history(scope.key()).await {
        Ok(history) => (StatusCode::OK, Json(SalaryMapper::to_history_response(&history))).into_response(),
        Err(e) => {
            error!("Failed to load salary history: {}", e);
            error_response(e)
        }
    }
}

/// Upsert the salary of one (month, year)
pub async fn set_salary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SetSalaryRequest>,
) -> Response {
    info!("PUT /api/salaries - request: {:?}", request);

    let month = match parse_month(&request.month) {
        Ok(month) => month,
        Err(e) => return error_response(e),
    };

    let scope = match state.identity_service.resolve(&credentials_from_headers(&headers)).await {
        Ok(scope) => scope,
        Err(e) => return error_response(e),
    };

    match state
        .salary_service
        .set_salary_for_period(scope.key(), month, request.year, request.amount)
        .await
    {
        Ok(history) => (StatusCode::OK, Json(SalaryMapper::to_history_response(&history))).into_response(),
        Err(e) => {
            error!("Failed to set salary: {}", e);
            error_response(e)
        }
    }
}

pub async fn get_reconciliation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((year, month)): Path<(i32, String)>,
) -> Response {
    info!("GET /api/salaries/{}/{}/reconciliation", year, month);

    let month = match parse_month(&month) {
        Ok(month) => month,
        Err(e) => return error_response(e),
    };

    let scope = match state.identity_service.resolve(&credentials_from_headers(&headers)).await {
        Ok(scope) => scope,
        Err(e) => return error_response(e),
    };

    match state.summary_service.reconcile_period(&scope, month, year).await {
        Ok(reconciliation) => (
            StatusCode::OK,
            Json(SalaryMapper::to_reconciliation_response(reconciliation)),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to reconcile {} {}: {}", month, year, e);
            error_response(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentityStrategy;
    use crate::io::rest::test_support::{body_json, test_state};
    use shared::{Month, ReconciliationResponse, SalaryHistoryResponse};

    fn salary(month: &str, year: i32, amount: f64) -> Json<SetSalaryRequest> {
        Json(SetSalaryRequest {
            month: month.to_string(),
            year,
            amount,
        })
    }

    #[tokio::test]
    async fn test_set_salary_twice_keeps_one_entry() {
        let (state, _temp) = test_state(IdentityStrategy::Anonymous);

        let response = set_salary(State(state.clone()), HeaderMap::new(), salary("March", 2026, 5000.0)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = set_salary(State(state.clone()), HeaderMap::new(), salary("march", 2026, 6000.0)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get_salary_history(State(state), HeaderMap::new()).await;
        let history: SalaryHistoryResponse = body_json(response).await;
        assert_eq!(history.monthly_salaries.len(), 1);
        assert_eq!(history.monthly_salaries[0].month, Month::March);
        assert_eq!(history.current_salary, 6000.0);
    }

    #[tokio::test]
    async fn test_invalid_salary_requests() {
        let (state, _temp) = test_state(IdentityStrategy::Anonymous);

        let negative = set_salary(State(state.clone()), HeaderMap::new(), salary("March", 2026, -1.0)).await;
        assert_eq!(negative.status(), StatusCode::BAD_REQUEST);

        let bad_month = set_salary(State(state), HeaderMap::new(), salary("Smarch", 2026, 1.0)).await;
        assert_eq!(bad_month.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reconciliation_without_data() {
        let (state, _temp) = test_state(IdentityStrategy::Anonymous);

        let response = get_reconciliation(
            State(state),
            HeaderMap::new(),
            Path((2026, "3".to_string())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: ReconciliationResponse = body_json(response).await;
        assert_eq!(body.month, Month::March);
        assert_eq!(body.salary, 0.0);
        assert_eq!(body.remaining, 0.0);
    }
}
