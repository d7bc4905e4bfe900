//! # Salary Repository
//!
//! Stores each owner's salary history as `owners/<owner>/salaries.yaml`:
//!
//! ```yaml
//! - month: March
//!   year: 2026
//!   amount: 6000.0
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::Month;
use std::fs;
use tracing::{debug, info};

use super::connection::CsvConnection;
use crate::domain::models::salary::{MonthlySalary, SalaryHistory};
use crate::storage::traits::SalaryStorage;

#[derive(Clone)]
pub struct SalaryRepository {
    connection: CsvConnection,
}

impl SalaryRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_history(&self, owner_key: &str) -> Result<Vec<MonthlySalary>> {
        let path = self.connection.get_salaries_file_path(owner_key);
        if !path.exists() {
            debug!("No salary history for owner {}", owner_key);
            return Ok(Vec::new());
        }

        let yaml_content = fs::read_to_string(&path)?;
        serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn write_history(&self, owner_key: &str, entries: &[MonthlySalary]) -> Result<()> {
        let path = self.connection.get_salaries_file_path(owner_key);
        let yaml_content = serde_yaml::to_string(entries)?;
        CsvConnection::write_atomically(&path, yaml_content.as_bytes())
    }
}

#[async_trait]
impl SalaryStorage for SalaryRepository {
    async fn get_salary_history(&self, owner_key: &str) -> Result<Vec<MonthlySalary>> {
        self.read_history(owner_key)
    }

    async fn upsert_salary(
        &self,
        owner_key: &str,
        month: Month,
        year: i32,
        amount: f64,
    ) -> Result<Vec<MonthlySalary>> {
        let _guard = self.connection.lock_writes();

        let mut history = SalaryHistory::new(self.read_history(owner_key)?);
        history.upsert(month, year, amount)?;
        self.write_history(owner_key, &history.entries)?;

        info!(
            "Stored {} salary entries for owner {}",
            history.entries.len(),
            owner_key
        );
        Ok(history.entries)
    }
}
