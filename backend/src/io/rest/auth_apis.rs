//! # REST API for Authentication
//!
//! Registration, login, logout and profile salary updates. Tokens returned
//! here are sent back as `Authorization: Bearer <token>`.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{post, put},
    Router,
};
use shared::{AuthResponse, CredentialsRequest, LogoutResponse, ProfileResponse, UpdateProfileRequest};
use tracing::{error, info};

use crate::domain::auth_service::AuthSession;
use crate::domain::errors::ExpenseError;
use crate::io::rest::mappers::user_mapper::UserMapper;
use crate::io::rest::{credentials_from_headers, error_response, parse_month};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/profile", put(update_profile))
}

fn auth_response(session: AuthSession) -> AuthResponse {
    AuthResponse {
        success: true,
        token: session.token,
        user: UserMapper::to_profile(session.user, &session.salary_history),
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Response {
    info!("POST /api/auth/register - username: {}", request.username);

    match state.auth_service.register(&request.username, &request.password).await {
        Ok(session) => (StatusCode::CREATED, Json(auth_response(session))).into_response(),
        Err(e) => {
            error!("Registration failed: {}", e);
            error_response(e)
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Response {
    info!("POST /api/auth/login - username: {}", request.username);

    match state.auth_service.login(&request.username, &request.password).await {
        Ok(session) => (StatusCode::OK, Json(auth_response(session))).into_response(),
        Err(e) => {
            error!("Login failed: {}", e);
            error_response(e)
        }
    }
}

/// Revoke the bearer token and clear the cached dashboard
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    info!("POST /api/auth/logout");

    let revoked_user = credentials_from_headers(&headers)
        .bearer_token
        .and_then(|token| state.auth_service.logout(&token));
    if let Some(user_id) = &revoked_user {
        state.identity_service.session().invalidate(user_id);
    }

    (
        StatusCode::OK,
        Json(LogoutResponse {
            success: true,
            revoked: revoked_user.is_some(),
        }),
    )
        .into_response()
}

pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UpdateProfileRequest>,
) -> Response {
    info!("PUT /api/auth/profile - request: {:?}", request);

    let period = match (request.month.as_deref(), request.year) {
        (Some(month), Some(year)) => match parse_month(month) {
            Ok(month) => Some((month, year)),
            Err(e) => return error_response(e),
        },
        (None, None) => None,
        _ => {
            return error_response(ExpenseError::validation(
                "Month and year must be given together",
            ))
        }
    };

    let credentials = credentials_from_headers(&headers);
    let Some(token) = credentials.bearer_token.as_deref() else {
        return error_response(ExpenseError::Auth("Missing bearer token".to_string()));
    };

    let user = match state.auth_service.verify_token(token).await {
        Ok(user) => user,
        Err(e) => {
            if e.is_auth() {
                state.identity_service.invalidate_credentials(&credentials);
            }
            return error_response(e);
        }
    };

    match state.auth_service.update_profile(&user.id, request.salary, period).await {
        Ok((user, history)) => (
            StatusCode::OK,
            Json(ProfileResponse {
                success: true,
                user: UserMapper::to_profile(user, &history),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to update profile: {}", e);
            error_response(e)
        }
    }
}
