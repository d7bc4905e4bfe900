//! # REST API Interface Layer
//!
//! HTTP endpoints of the expense tracker, one module per resource. Each module
//! exposes a `router()` that is nested under `/api` by [`crate::create_router`].
//!
//! Domain errors map to status codes as follows:
//!
//! | Error        | Status |
//! |--------------|--------|
//! | Validation   | 400    |
//! | Auth         | 401    |
//! | NotFound     | 404    |
//! | Conflict     | 409    |
//! | StaleScope   | 409    |
//! | Server       | 500    |

pub mod auth_apis;
pub mod expense_apis;
pub mod export_apis;
pub mod mappers;
pub mod salary_apis;
pub mod scope_apis;
pub mod summary_apis;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use shared::{ErrorResponse, Month};
use tracing::error;

use crate::domain::errors::ExpenseError;
use crate::domain::identity::RequestCredentials;

pub fn status_for(error: &ExpenseError) -> StatusCode {
    match error {
        ExpenseError::Validation(_) => StatusCode::BAD_REQUEST,
        ExpenseError::Auth(_) => StatusCode::UNAUTHORIZED,
        ExpenseError::NotFound(_) => StatusCode::NOT_FOUND,
        ExpenseError::Conflict(_) | ExpenseError::StaleScope(_) => StatusCode::CONFLICT,
        ExpenseError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error body with the status matching the error
pub fn error_response(error: ExpenseError) -> Response {
    let status = status_for(&error);
    let message = match &error {
        ExpenseError::Server(inner) => {
            error!("Internal error: {:?}", inner);
            "Internal server error".to_string()
        }
        other => other.to_string(),
    };

    (
        status,
        Json(ErrorResponse {
            success: false,
            error: message,
        }),
    )
        .into_response()
}

/// Bearer token from the `Authorization` header, if any
pub fn credentials_from_headers(headers: &HeaderMap) -> RequestCredentials {
    let bearer_token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let (scheme, token) = value.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim().to_string())
        })
        .filter(|token| !token.is_empty());

    RequestCredentials { bearer_token }
}

/// Accepts a month name ("September") or number ("9")
pub fn parse_month(raw: &str) -> Result<Month, ExpenseError> {
    let raw = raw.trim();
    match raw.parse::<u32>() {
        Ok(number) => Month::from_number(number)
            .ok_or_else(|| ExpenseError::validation(format!("Month {} is out of range", number))),
        Err(_) => raw.parse::<Month>().map_err(ExpenseError::Validation),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::response::Response;
    use serde::de::DeserializeOwned;
    use tempfile::TempDir;

    use crate::config::{AppConfig, IdentityStrategy};
    use crate::{initialize_backend, AppState};

    /// Application state backed by a fresh temporary data directory
    pub fn test_state(identity_strategy: IdentityStrategy) -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = AppConfig {
            data_directory: temp_dir.path().to_path_buf(),
            identity_strategy,
            ..AppConfig::default()
        };
        let state = initialize_backend(config).expect("Failed to initialize backend");
        (state, temp_dir)
    }

    pub async fn body_json<T: DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        serde_json::from_slice(&bytes).expect("Response body is not the expected JSON")
    }
}
