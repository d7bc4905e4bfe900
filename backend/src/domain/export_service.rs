//! Export service: renders an owner's expenses as a CSV artifact.

use anyhow::anyhow;
use chrono::{Local, NaiveDate};
use tracing::info;

use crate::domain::errors::DomainResult;
use crate::domain::models::expense::Expense;

const EXPORT_HEADER: [&str; 4] = ["Date", "Category", "Description", "Amount"];

/// Rendered export, ready to be handed to the client
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseExport {
    pub csv_content: String,
    pub filename: String,
    pub expense_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// Export stamped with today's local date
    pub fn export_expenses_csv(&self, expenses: &[Expense]) -> DomainResult<ExpenseExport> {
        self.export_expenses_csv_on(expenses, Local::now().date_naive())
    }

    /// One row per expense, in the order given
    pub fn export_expenses_csv_on(
        &self,
        expenses: &[Expense],
        export_date: NaiveDate,
    ) -> DomainResult<ExpenseExport> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(EXPORT_HEADER).map_err(anyhow::Error::from)?;

        for expense in expenses {
            let date = expense
                .calendar_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| expense.date.clone());
            let amount = format!("{:.2}", expense.amount);

            writer
                .write_record([
                    date.as_str(),
                    expense.category.as_str(),
                    expense.description.as_deref().unwrap_or(""),
                    amount.as_str(),
                ])
                .map_err(anyhow::Error::from)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to finish export: {}", e.error()))?;
        let csv_content = String::from_utf8(bytes).map_err(anyhow::Error::from)?;
        let filename = format!("Expenses_{}.csv", export_date.format("%Y-%m-%d"));

        info!("Exported {} expenses as {}", expenses.len(), filename);
        Ok(ExpenseExport {
            csv_content,
            filename,
            expense_count: expenses.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shared::ExpenseCategory;

    fn expense(amount: f64, category: ExpenseCategory, description: Option<&str>, date: &str) -> Expense {
        Expense {
            id: format!("exp-{}", date),
            owner_id: "o".to_string(),
            amount,
            category,
            description: description.map(str::to_string),
            date: date.to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_export_rows_and_filename() {
        let expenses = vec![
            expense(50.0, ExpenseCategory::Food, Some("Pizza, large"), "2026-09-02"),
            expense(200.0, ExpenseCategory::Bills, None, "2026-08-15T09:30:00+02:00"),
        ];
        let export = ExportService::new()
            .export_expenses_csv_on(&expenses, NaiveDate::from_ymd_opt(2026, 10, 17).unwrap())
            .unwrap();

        assert_eq!(export.filename, "Expenses_2026-10-17.csv");
        assert_eq!(export.expense_count, 2);
        assert_eq!(
            export.csv_content,
            "Date,Category,Description,Amount\n\
             2026-09-02,Food,\"Pizza, large\",50.00\n\
             2026-08-15,Bills,,200.00\n"
        );
    }

    #[test]
    fn test_export_keeps_unparseable_date_text() {
        let expenses = vec![expense(1.5, ExpenseCategory::Other, Some("?"), "someday")];
        let export = ExportService::new()
            .export_expenses_csv_on(&expenses, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .unwrap();

        assert!(export.csv_content.ends_with("someday,Other,?,1.50\n"));
    }

    #[test]
    fn test_export_empty() {
        let export = ExportService::new().export_expenses_csv(&[]).unwrap();
        assert_eq!(export.csv_content, "Date,Category,Description,Amount\n");
        assert_eq!(export.expense_count, 0);
        assert!(export.filename.starts_with("Expenses_"));
    }
}
