//! # Expense Tracker Backend
//!
//! Records expenses per owner scope, aggregates them into monthly, daily and
//! yearly views and reconciles monthly spend against per-period salaries.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, mappers)
//!     ↓
//! Domain Layer (services, aggregation, identity, dashboard session)
//!     ↓
//! Storage Layer (CSV and YAML files per owner scope)
//! ```
//!
//! The owner scope of a request is decided by the configured
//! [`IdentityStrategy`]: an anonymous sync key generated for this
//! installation, or the user behind a bearer token.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::{AppConfig, IdentityStrategy};
use crate::domain::{
    AggregationService, AnonymousKeyResolver, AuthService, AuthenticatedResolver, DashboardSession,
    ExpenseService, ExportService, IdentityService, SalaryService, ScopeResolver, SummaryService,
};
use crate::io::rest;
use crate::storage::csv::CsvConnection;

/// Services shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub expense_service: ExpenseService<CsvConnection>,
    pub salary_service: SalaryService<CsvConnection>,
    pub summary_service: SummaryService<CsvConnection>,
    pub auth_service: AuthService<CsvConnection>,
    pub identity_service: IdentityService,
    pub export_service: ExportService,
}

/// Initialize the backend with all required services
pub fn initialize_backend(config: AppConfig) -> Result<AppState> {
    info!("Setting up storage in {}", config.data_directory.display());
    let connection = Arc::new(CsvConnection::new(&config.data_directory)?);

    info!("Setting up domain model");
    let expense_service = ExpenseService::new(connection.clone());
    let salary_service = SalaryService::new(connection.clone());
    let auth_service = AuthService::new(connection.clone(), salary_service.clone(), config.token_ttl());
    let session = DashboardSession::new();

    let resolver: Arc<dyn ScopeResolver> = match config.identity_strategy {
        IdentityStrategy::Anonymous => Arc::new(AnonymousKeyResolver::new(connection.clone())),
        IdentityStrategy::Authenticated => Arc::new(AuthenticatedResolver::new(auth_service.clone())),
    };
    info!("Identity strategy: {}", resolver.strategy());

    let summary_service = SummaryService::new(
        expense_service.clone(),
        salary_service.clone(),
        AggregationService::new(),
        session.clone(),
    );

    info!("Setting up application state");
    Ok(AppState {
        config: Arc::new(config),
        expense_service,
        salary_service,
        summary_service,
        auth_service,
        identity_service: IdentityService::new(resolver, session),
        export_service: ExportService::new(),
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Result<Router> {
    let origin = app_state
        .config
        .allowed_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid allowed origin '{}'", app_state.config.allowed_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest("/expenses", rest::expense_apis::router())
        .nest("/salaries", rest::salary_apis::router())
        .nest("/summary", rest::summary_apis::router())
        .nest("/auth", rest::auth_apis::router())
        .nest("/scope", rest::scope_apis::router())
        .nest("/export", rest::export_apis::router());

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state))
}
