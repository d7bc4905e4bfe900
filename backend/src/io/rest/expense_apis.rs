//! # REST API for Expenses
//!
//! List, create and delete expenses of the requesting owner scope.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use shared::{CreateExpenseRequest, DeleteExpenseResponse, ExpenseListResponse, ExpenseResponse};
use tracing::{error, info};

use crate::io::rest::mappers::expense_mapper::ExpenseMapper;
use crate::io::rest::{credentials_from_headers, error_response};
use crate::AppState;

/// Create a router for expense related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_expenses).post(create_expense))
        .route("/:id", delete(delete_expense))
}

/// All expenses of the scope, newest first
pub async fn list_expenses(State(state): State<AppState>, headers: HeaderMap) -> Response {
    info!("GET /api/expenses");

    let scope = match state.identity_service.resolve(&credentials_from_headers(&headers)).await {
        Ok(scope) => scope,
        Err(e) => return error_response(e),
    };

    match state.expense_service.list_expenses(&scope).await {
        Ok(expenses) => {
            let data = ExpenseMapper::to_dto_list(expenses);
            let response = ExpenseListResponse {
                success: true,
                count: data.len(),
                data,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to list expenses: {}", e);
            error_response(e)
        }
    }
}

pub async fn create_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateExpenseRequest>,
) -> Response {
    info!("POST /api/expenses - request: {:?}", request);

    let scope = match state.identity_service.resolve(&credentials_from_headers(&headers)).await {
        Ok(scope) => scope,
        Err(e) => return error_response(e),
    };

    match state.expense_service.create_expense(&scope, request).await {
        Ok(expense) => {
            let response = ExpenseResponse {
                success: true,
                data: ExpenseMapper::to_dto(expense),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to create expense: {}", e);
            error_response(e)
        }
    }
}

pub async fn delete_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    info!("DELETE /api/expenses/{}", id);

    let scope = match state.identity_service.resolve(&credentials_from_headers(&headers)).await {
        Ok(scope) => scope,
        Err(e) => return error_response(e),
    };

    match state.expense_service.delete_expense(&scope, &id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(DeleteExpenseResponse {
                success: true,
                deleted_id: id,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to delete expense {}: {}", id, e);
            error_response(e)
        }
    }
}
