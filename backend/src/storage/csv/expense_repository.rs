use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::{Reader, StringRecord, Writer};
use shared::ExpenseCategory;
use std::fs::File;
use std::io::BufReader;
use tracing::{debug, info};

use super::connection::CsvConnection;
use crate::domain::models::expense::{sort_newest_first, Expense};
use crate::storage::traits::ExpenseStorage;

const HEADER: [&str; 7] = [
    "id",
    "owner_id",
    "date",
    "category",
    "description",
    "amount",
    "created_at",
];

/// CSV-based expense repository, one `expenses.csv` per owner
#[derive(Clone)]
pub struct ExpenseRepository {
    connection: CsvConnection,
}

impl ExpenseRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Read all expenses of an owner in file order
    fn read_expenses(&self, owner_key: &str) -> Result<Vec<Expense>> {
        let file_path = self.connection.get_expenses_file_path(owner_key);
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        let mut expenses = Vec::new();
        for (index, result) in csv_reader.records().enumerate() {
            let record = result?;
            let expense = Self::parse_record(&record)
                .with_context(|| format!("Bad row {} in {}", index + 1, file_path.display()))?;
            expenses.push(expense);
        }

        Ok(expenses)
    }

    fn parse_record(record: &StringRecord) -> Result<Expense> {
        let field = |index: usize| record.get(index).unwrap_or("");

        let category = field(3)
            .parse::<ExpenseCategory>()
            .map_err(|e| anyhow!(e))?;
        let amount = field(5)
            .parse::<f64>()
            .with_context(|| format!("Invalid amount '{}'", field(5)))?;
        let created_at = DateTime::parse_from_rfc3339(field(6))
            .with_context(|| format!("Invalid created_at '{}'", field(6)))?
            .with_timezone(&Utc);
        let description = match field(4) {
            "" => None,
            text => Some(text.to_string()),
        };

        Ok(Expense {
            id: field(0).to_string(),
            owner_id: field(1).to_string(),
            date: field(2).to_string(),
            category,
            description,
            amount,
            created_at,
        })
    }

    /// Replace the owner's expenses file with `expenses`
    fn write_expenses(&self, owner_key: &str, expenses: &[Expense]) -> Result<()> {
        self.connection.ensure_expenses_file_exists(owner_key)?;

        let mut csv_writer = Writer::from_writer(Vec::new());
        csv_writer.write_record(HEADER)?;

        for expense in expenses {
            let amount = expense.amount.to_string();
            let created_at = expense.created_at.to_rfc3339();
            csv_writer.write_record([
                expense.id.as_str(),
                expense.owner_id.as_str(),
                expense.date.as_str(),
                expense.category.as_str(),
                expense.description.as_deref().unwrap_or(""),
                amount.as_str(),
                created_at.as_str(),
            ])?;
        }

        let content = csv_writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush expenses CSV: {}", e.error()))?;
        let file_path = self.connection.get_expenses_file_path(owner_key);
        CsvConnection::write_atomically(&file_path, &content)
    }
}

#[async_trait]
impl ExpenseStorage for ExpenseRepository {
    async fn store_expense(&self, expense: &Expense) -> Result<()> {
        let _guard = self.connection.lock_writes();

        let mut expenses = self.read_expenses(&expense.owner_id)?;
        expenses.push(expense.clone());
        self.write_expenses(&expense.owner_id, &expenses)?;

        info!("Stored expense {} for owner {}", expense.id, expense.owner_id);
        Ok(())
    }

    async fn list_expenses(&self, owner_key: &str) -> Result<Vec<Expense>> {
        let mut expenses = self.read_expenses(owner_key)?;
        sort_newest_first(&mut expenses);
        debug!("Loaded {} expenses for owner {}", expenses.len(), owner_key);
        Ok(expenses)
    }

    async fn delete_expense(&self, owner_key: &str, expense_id: &str) -> Result<bool> {
        let _guard = self.connection.lock_writes();

        let mut expenses = self.read_expenses(owner_key)?;
        let before = expenses.len();
        expenses.retain(|e| e.id != expense_id);

        if expenses.len() == before {
            return Ok(false);
        }

        self.write_expenses(owner_key, &expenses)?;
        info!("Deleted expense {} for owner {}", expense_id, owner_key);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::RepositoryTestHelper;
    use chrono::TimeZone;

    fn expense(id: &str, owner: &str, date: &str, created_second: u32) -> Expense {
        Expense {
            id: id.to_string(),
            owner_id: owner.to_string(),
            amount: 12.5,
            category: ExpenseCategory::Transport,
            description: Some("Bus, return".to_string()),
            date: date.to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, created_second).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_store_and_list_expense() {
        let helper = RepositoryTestHelper::new().unwrap();
        let repo = &helper.expense_repo;

        let stored = expense("exp-1", "device-a", "2026-09-01", 0);
        repo.store_expense(&stored).await.unwrap();

        let listed = repo.list_expenses("device-a").await.unwrap();
        assert_eq!(listed, vec![stored]);
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let helper = RepositoryTestHelper::new().unwrap();
        let repo = &helper.expense_repo;

        repo.store_expense(&expense("old", "o", "2026-08-15", 0)).await.unwrap();
        repo.store_expense(&expense("new_first", "o", "2026-09-02", 1)).await.unwrap();
        repo.store_expense(&expense("new_second", "o", "2026-09-02", 2)).await.unwrap();

        let ids: Vec<String> = repo
            .list_expenses("o")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["new_second", "new_first", "old"]);
    }

    #[tokio::test]
    async fn test_owners_are_isolated() {
        let helper = RepositoryTestHelper::new().unwrap();
        let repo = &helper.expense_repo;

        repo.store_expense(&expense("a1", "owner-a", "2026-09-01", 0)).await.unwrap();
        repo.store_expense(&expense("b1", "owner-b", "2026-09-01", 0)).await.unwrap();

        assert_eq!(repo.list_expenses("owner-a").await.unwrap().len(), 1);
        assert!(repo.list_expenses("owner-a").await.unwrap().iter().all(|e| e.id != "b1"));
        assert!(repo.list_expenses("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_expense() {
        let helper = RepositoryTestHelper::new().unwrap();
        let repo = &helper.expense_repo;

        repo.store_expense(&expense("keep", "o", "2026-09-01", 0)).await.unwrap();
        repo.store_expense(&expense("drop", "o", "2026-09-01", 1)).await.unwrap();

        assert!(repo.delete_expense("o", "drop").await.unwrap());
        assert!(!repo.delete_expense("o", "drop").await.unwrap());

        let remaining = repo.list_expenses("o").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "keep");
    }

    #[tokio::test]
    async fn test_missing_description_round_trips_as_none() {
        let helper = RepositoryTestHelper::new().unwrap();
        let repo = &helper.expense_repo;

        let mut bare = expense("bare", "o", "2026-09-01T10:00:00+02:00", 0);
        bare.description = None;
        repo.store_expense(&bare).await.unwrap();

        let loaded = repo.list_expenses("o").await.unwrap().remove(0);
        assert_eq!(loaded.description, None);
        assert_eq!(loaded.date, "2026-09-01T10:00:00+02:00");
    }

    #[tokio::test]
    async fn test_corrupt_row_is_an_error() {
        let helper = RepositoryTestHelper::new().unwrap();
        let connection = &helper.env.connection;
        connection.ensure_expenses_file_exists("o").unwrap();
        std::fs::write(
            connection.get_expenses_file_path("o"),
            "id,owner_id,date,category,description,amount,created_at\n\
             x,o,2026-09-01,Food,,not-a-number,2026-09-01T00:00:00+00:00\n",
        )
        .unwrap();

        assert!(helper.expense_repo.list_expenses("o").await.is_err());
    }
}
