//! Expense service domain logic.
//!
//! Validates incoming expenses before anything is stored and keeps every
//! operation inside the owner scope it was called with.

use chrono::{Local, Utc};
use shared::{CreateExpenseRequest, ExpenseCategory};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use crate::domain::errors::{DomainResult, ExpenseError};
use crate::domain::models::expense::{parse_expense_date, Expense};
use crate::domain::models::owner::OwnerScope;
use crate::storage::{Connection, ExpenseStorage};

pub const MAX_DESCRIPTION_LENGTH: usize = 256;

#[derive(Clone)]
pub struct ExpenseService<C: Connection> {
    expense_repository: C::ExpenseRepository,
}

impl<C: Connection> ExpenseService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            expense_repository: connection.create_expense_repository(),
        }
    }

    pub async fn create_expense(
        &self,
        scope: &OwnerScope,
        request: CreateExpenseRequest,
    ) -> DomainResult<Expense> {
        info!("Creating expense for owner {}: {:?}", scope.key(), request);

        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(ExpenseError::validation("Amount must be a positive number"));
        }

        let category = request
            .category
            .parse::<ExpenseCategory>()
            .map_err(ExpenseError::Validation)?;

        let date = match request.date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                if parse_expense_date(raw).is_none() {
                    return Err(ExpenseError::validation(format!(
                        "Invalid date '{}', expected YYYY-MM-DD or an RFC 3339 timestamp",
                        raw
                    )));
                }
                raw.to_string()
            }
            _ => Local::now().format("%Y-%m-%d").to_string(),
        };

        let description = match request.description.as_deref().map(str::trim) {
            Some(text) if text.chars().count() > MAX_DESCRIPTION_LENGTH => {
                return Err(ExpenseError::validation(format!(
                    "Description cannot exceed {} characters",
                    MAX_DESCRIPTION_LENGTH
                )));
            }
            Some(text) if !text.is_empty() => Some(text.to_string()),
            _ => None,
        };

        let now_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(anyhow::Error::from)?
            .as_millis() as u64;

        let expense = Expense {
            id: Expense::generate_id(now_millis),
            owner_id: scope.key().to_string(),
            amount: request.amount,
            category,
            description,
            date,
            created_at: Utc::now(),
        };

        self.expense_repository.store_expense(&expense).await?;
        Ok(expense)
    }

    /// All expenses of the scope, newest first
    pub async fn list_expenses(&self, scope: &OwnerScope) -> DomainResult<Vec<Expense>> {
        Ok(self.expense_repository.list_expenses(scope.key()).await?)
    }

    pub async fn delete_expense(&self, scope: &OwnerScope, expense_id: &str) -> DomainResult<()> {
        if self
            .expense_repository
            .delete_expense(scope.key(), expense_id)
            .await?
        {
            Ok(())
        } else {
            warn!("Expense {} not found for owner {}", expense_id, scope.key());
            Err(ExpenseError::NotFound(format!("Expense '{}' not found", expense_id)))
        }
    }
}
