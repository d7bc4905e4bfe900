//! # Storage Traits
//!
//! Storage abstraction used by the domain layer. Every record query is keyed
//! by an owner key, so the domain never reaches across owners.

use anyhow::Result;
use async_trait::async_trait;
use shared::Month;
use thiserror::Error;

use crate::domain::models::expense::Expense;
use crate::domain::models::salary::MonthlySalary;
use crate::domain::models::user::User;
use crate::storage::csv::GlobalConfigStorage;

/// Trait defining the interface for expense storage operations
#[async_trait]
pub trait ExpenseStorage: Send + Sync {
    /// Store a new expense under its `owner_id`
    async fn store_expense(&self, expense: &Expense) -> Result<()>;

    /// All expenses of an owner, date descending then `created_at` descending
    async fn list_expenses(&self, owner_key: &str) -> Result<Vec<Expense>>;

    /// Delete a single expense.
    /// Returns true if the expense was found and deleted, false otherwise
    async fn delete_expense(&self, owner_key: &str, expense_id: &str) -> Result<bool>;
}

/// Trait defining the interface for per-period salary storage
#[async_trait]
pub trait SalaryStorage: Send + Sync {
    /// Full history of an owner, empty when nothing was ever stored
    async fn get_salary_history(&self, owner_key: &str) -> Result<Vec<MonthlySalary>>;

    /// Set the amount of one (month, year), replacing an existing entry or
    /// appending a new one, as a single atomic read-modify-write. Returns the
    /// full history after the change.
    async fn upsert_salary(
        &self,
        owner_key: &str,
        month: Month,
        year: i32,
        amount: f64,
    ) -> Result<Vec<MonthlySalary>>;
}

/// Returned by [`UserStorage::store_user`] when the id or username is taken
#[derive(Debug, Error)]
#[error("User '{0}' already exists")]
pub struct DuplicateUserError(pub String);

/// Trait defining the interface for registered principals
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Fails with [`DuplicateUserError`] if the id or username is taken
    async fn store_user(&self, user: &User) -> Result<()>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    /// Usernames compare case-insensitively
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Set the denormalised salary on the stored user, re-read under the write
    /// lock. `None` if the user does not exist.
    async fn update_user_salary(&self, user_id: &str, salary: f64) -> Result<Option<User>>;
}

/// Trait defining the interface for storage connections
///
/// Abstracts the concrete backend and hands out repositories, so the domain
/// services work with any storage implementation.
pub trait Connection: Send + Sync + Clone + 'static {
    type ExpenseRepository: ExpenseStorage + Clone;
    type SalaryRepository: SalaryStorage + Clone;
    type UserRepository: UserStorage + Clone;
    type GlobalConfigRepository: GlobalConfigStorage + Clone;

    fn create_expense_repository(&self) -> Self::ExpenseRepository;

    fn create_salary_repository(&self) -> Self::SalaryRepository;

    fn create_user_repository(&self) -> Self::UserRepository;

    fn create_global_config_repository(&self) -> Self::GlobalConfigRepository;
}
