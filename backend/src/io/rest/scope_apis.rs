//! # REST API for the Owner Scope
//!
//! Shows which scope requests resolve to and, with anonymous identity, links
//! this installation to another device's sync key.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use shared::{LinkScopeRequest, ScopeResponse};
use tracing::{error, info};

use crate::domain::models::owner::OwnerScope;
use crate::io::rest::{credentials_from_headers, error_response};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_scope).put(link_scope))
}

fn scope_response(scope: &OwnerScope) -> ScopeResponse {
    ScopeResponse {
        strategy: scope.strategy().to_string(),
        scope_key: scope.key().to_string(),
    }
}

pub async fn get_scope(State(state): State<AppState>, headers: HeaderMap) -> Response {
    info!("GET /api/scope");

    match state.identity_service.resolve(&credentials_from_headers(&headers)).await {
        Ok(scope) => (StatusCode::OK, Json(scope_response(&scope))).into_response(),
        Err(e) => error_response(e),
    }
}

/// Replace the active sync key; the dashboard re-fetches from scratch
pub async fn link_scope(
    State(state): State<AppState>,
    Json(request): Json<LinkScopeRequest>,
) -> Response {
    info!("PUT /api/scope - request: {:?}", request);

    match state.identity_service.link_scope(&request.sync_key).await {
        Ok(scope) => (StatusCode::OK, Json(scope_response(&scope))).into_response(),
        Err(e) => {
            error!("Failed to link sync key: {}", e);
            error_response(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentityStrategy;
    use crate::io::rest::expense_apis::{create_expense, list_expenses};
    use crate::io::rest::test_support::{body_json, test_state};
    use shared::{CreateExpenseRequest, ExpenseListResponse};

    #[tokio::test]
    async fn test_get_scope_is_stable() {
        let (state, _temp) = test_state(IdentityStrategy::Anonymous);

        let first: ScopeResponse = body_json(get_scope(State(state.clone()), HeaderMap::new()).await).await;
        let second: ScopeResponse = body_json(get_scope(State(state), HeaderMap::new()).await).await;

        assert_eq!(first.strategy, "anonymous");
        assert_eq!(first.scope_key, second.scope_key);
    }

    #[tokio::test]
    async fn test_link_scope_switches_data_and_keeps_old() {
        let (state, _temp) = test_state(IdentityStrategy::Anonymous);
        let original: ScopeResponse =
            body_json(get_scope(State(state.clone()), HeaderMap::new()).await).await;

        let request = CreateExpenseRequest {
            amount: 10.0,
            category: "Food".to_string(),
            description: None,
            date: None,
        };
        create_expense(State(state.clone()), HeaderMap::new(), Json(request)).await;

        let link = LinkScopeRequest {
            sync_key: "other-device".to_string(),
        };
        let response = link_scope(State(state.clone()), Json(link)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let listed: ExpenseListResponse =
            body_json(list_expenses(State(state.clone()), HeaderMap::new()).await).await;
        assert_eq!(listed.count, 0);

        // Linking back shows the original data again
        let back = LinkScopeRequest {
            sync_key: original.scope_key,
        };
        link_scope(State(state.clone()), Json(back)).await;
        let listed: ExpenseListResponse =
            body_json(list_expenses(State(state), HeaderMap::new()).await).await;
        assert_eq!(listed.count, 1);
    }

    #[tokio::test]
    async fn test_link_scope_rejected_when_authenticated() {
        let (state, _temp) = test_state(IdentityStrategy::Authenticated);

        let link = LinkScopeRequest {
            sync_key: "other-device".to_string(),
        };
        let response = link_scope(State(state), Json(link)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
