//! # REST API for Data Export
//!
//! Returns the scope's expenses as CSV content with a dated filename.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use shared::ExportDataResponse;
use tracing::{error, info};

use crate::io::rest::{credentials_from_headers, error_response};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(export_expenses_csv))
}

pub async fn export_expenses_csv(State(state): State<AppState>, headers: HeaderMap) -> Response {
    info!("GET /api/export");

    let scope = match state.identity_service.resolve(&credentials_from_headers(&headers)).await {
        Ok(scope) => scope,
        Err(e) => return error_response(e),
    };

    let expenses = match state.expense_service.list_expenses(&scope).await {
        Ok(expenses) => expenses,
        Err(e) => {
            error!("Failed to load expenses for export: {}", e);
            return error_response(e);
        }
    };

    match state.export_service.export_expenses_csv(&expenses) {
        Ok(export) => (
            StatusCode::OK,
            Json(ExportDataResponse {
                csv_content: export.csv_content,
                filename: export.filename,
                expense_count: export.expense_count,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to export expenses: {}", e);
            error_response(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentityStrategy;
    use crate::io::rest::expense_apis::create_expense;
    use crate::io::rest::test_support::{body_json, test_state};
    use shared::CreateExpenseRequest;

    #[tokio::test]
    async fn test_export_endpoint() {
        let (state, _temp) = test_state(IdentityStrategy::Anonymous);

        for (amount, date) in [(10.0, "2026-09-01"), (20.0, "2026-09-03")] {
            let request = CreateExpenseRequest {
                amount,
                category: "Transport".to_string(),
                description: Some("Train".to_string()),
                date: Some(date.to_string()),
            };
            create_expense(State(state.clone()), HeaderMap::new(), Json(request)).await;
        }

        let response = export_expenses_csv(State(state), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let export: ExportDataResponse = body_json(response).await;
        assert_eq!(export.expense_count, 2);
        assert!(export.filename.starts_with("Expenses_"));
        let lines: Vec<&str> = export.csv_content.lines().collect();
        assert_eq!(lines[0], "Date,Category,Description,Amount");
        assert_eq!(lines[1], "2026-09-03,Transport,Train,20.00");
        assert_eq!(lines[2], "2026-09-01,Transport,Train,10.00");
    }
}
