//! Salary service: per-period salary history and monthly reconciliation.
//!
//! The per-period history is the source of truth. The "current salary" shown
//! on summaries and user profiles is always read from the latest period.

use shared::Month;
use std::sync::Arc;
use tracing::info;

use crate::domain::aggregation::AggregationService;
use crate::domain::errors::DomainResult;
use crate::domain::models::expense::Expense;
use crate::domain::models::salary::{validate_salary_amount, SalaryHistory};
use crate::storage::{Connection, SalaryStorage};

/// Salary, spend and what is left of it for one calendar month
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub month: Month,
    pub year: i32,
    pub salary: f64,
    pub spend: f64,
    /// `salary - spend`, negative on overspend
    pub remaining: f64,
}

/// Reconcile a month's salary against the expenses dated in that month
pub fn reconcile(month: Month, year: i32, records: &[Expense], history: &SalaryHistory) -> Reconciliation {
    let spend = AggregationService::new().month_total(records, month, year);
    Reconciliation {
        month,
        year,
        salary: history.salary_for(month, year),
        spend,
        remaining: history.remaining_balance(month, year, spend),
    }
}

#[derive(Clone)]
pub struct SalaryService<C: Connection> {
    salary_repository: C::SalaryRepository,
}

impl<C: Connection> SalaryService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            salary_repository: connection.create_salary_repository(),
        }
    }

    pub async fn get_salary_history(&self, owner_key: &str) -> DomainResult<SalaryHistory> {
        let entries = self.salary_repository.get_salary_history(owner_key).await?;
        Ok(SalaryHistory::new(entries))
    }

    /// Stored salary for the period, 0 when never set
    pub async fn get_salary_for_period(&self, owner_key: &str, month: Month, year: i32) -> DomainResult<f64> {
        Ok(self.get_salary_history(owner_key).await?.salary_for(month, year))
    }

    /// Upsert the salary for one period and return the full history
    pub async fn set_salary_for_period(
        &self,
        owner_key: &str,
        month: Month,
        year: i32,
        amount: f64,
    ) -> DomainResult<SalaryHistory> {
        validate_salary_amount(amount)?;

        let entries = self
            .salary_repository
            .upsert_salary(owner_key, month, year, amount)
            .await?;
        let history = SalaryHistory::new(entries);

        info!("Set salary for {} {} of owner {} to {:.2}", month, year, owner_key, amount);
        Ok(history)
    }

    pub async fn current_salary(&self, owner_key: &str) -> DomainResult<f64> {
        Ok(self.get_salary_history(owner_key).await?.current_salary())
    }
}
