//! Domain model for the per-period salary history.
use serde::{Deserialize, Serialize};
use shared::Month;

use crate::domain::errors::{DomainResult, ExpenseError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySalary {
    pub month: Month,
    pub year: i32,
    pub amount: f64,
}

impl MonthlySalary {
    fn period(&self) -> (i32, Month) {
        (self.year, self.month)
    }
}

/// Salary history of one owner, at most one entry per (month, year).
/// Entries keep the order in which their periods were first set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryHistory {
    pub entries: Vec<MonthlySalary>,
}

impl SalaryHistory {
    pub fn new(entries: Vec<MonthlySalary>) -> Self {
        Self { entries }
    }

    /// Stored amount for the exact period, 0 when the period was never set
    pub fn salary_for(&self, month: Month, year: i32) -> f64 {
        self.entries
            .iter()
            .find(|entry| entry.month == month && entry.year == year)
            .map(|entry| entry.amount)
            .unwrap_or(0.0)
    }

    /// Replace the amount of an existing period in place, or append a new entry
    pub fn upsert(&mut self, month: Month, year: i32, amount: f64) -> DomainResult<()> {
        validate_salary_amount(amount)?;

        match self
            .entries
            .iter_mut()
            .find(|entry| entry.month == month && entry.year == year)
        {
            Some(existing) => existing.amount = amount,
            None => self.entries.push(MonthlySalary { month, year, amount }),
        }
        Ok(())
    }

    /// Entry with the greatest (year, month)
    pub fn latest(&self) -> Option<&MonthlySalary> {
        self.entries.iter().max_by_key(|entry| entry.period())
    }

    /// Amount of the most recent period, used for summary display
    pub fn current_salary(&self) -> f64 {
        self.latest().map(|entry| entry.amount).unwrap_or(0.0)
    }

    /// Salary for the period minus what was spent in it; negative means overspend
    pub fn remaining_balance(&self, month: Month, year: i32, monthly_expense_total: f64) -> f64 {
        self.salary_for(month, year) - monthly_expense_total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn validate_salary_amount(amount: f64) -> DomainResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ExpenseError::validation(
            "Salary must be a non-negative number",
        ));
    }
    Ok(())
}
