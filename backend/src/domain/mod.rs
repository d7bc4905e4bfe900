//! # Domain Module
//!
//! Business logic of the expense tracker, independent of HTTP and of the
//! storage backend.
//!
//! ## Module Organization
//!
//! - **aggregation**: grand total, category totals, month/day buckets and the
//!   yearly chart series computed from an owner's records
//! - **salary_service**: per-period salary history and monthly reconciliation
//! - **expense_service**: validated create, list and delete of expenses
//! - **identity**: the scope resolver for the configured identity strategy
//! - **session**: dashboard session with scope generations and the
//!   last-known-good snapshot
//! - **summary_service**: fetch, aggregate and reconcile for the dashboard
//! - **auth_service**: registration, login, tokens and profile salary
//! - **export_service**: CSV export of an owner's expenses
//!
//! ## Business Rules
//!
//! - Every record belongs to exactly one owner scope and is only ever read
//!   or deleted through that scope
//! - Expense amounts are positive; salaries are non-negative
//! - At most one salary per (month, year); setting it again replaces it
//! - Bucket ordering always comes from the date value, never from labels

pub mod aggregation;
pub mod auth_service;
pub mod errors;
pub mod expense_service;
pub mod export_service;
pub mod identity;
pub mod models;
pub mod salary_service;
pub mod session;
pub mod summary_service;

pub use aggregation::AggregationService;
pub use auth_service::AuthService;
pub use errors::{DomainResult, ExpenseError};
pub use expense_service::ExpenseService;
pub use export_service::ExportService;
pub use identity::{AnonymousKeyResolver, AuthenticatedResolver, IdentityService, RequestCredentials, ScopeResolver};
pub use salary_service::{reconcile, Reconciliation, SalaryService};
pub use session::{DashboardSession, DashboardSnapshot, FetchTicket};
pub use summary_service::{DashboardSummary, SummaryService};
