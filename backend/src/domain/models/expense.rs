//! Domain model for an expense record.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::ExpenseCategory;
use std::cmp::Ordering;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub owner_id: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub description: Option<String>,
    /// Date text as supplied; see `parse_expense_date`
    pub date: String,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Generate a unique expense ID.
    /// Format: exp-<timestamp_ms>-<8 hex chars>
    pub fn generate_id(timestamp_ms: u64) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("exp-{}-{}", timestamp_ms, &suffix[..8])
    }

    /// Local calendar date of the record, `None` if the stored text is unparseable
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        parse_expense_date(&self.date)
    }
}

/// Parse a stored expense date into the calendar date it was written for.
///
/// RFC 3339 timestamps yield the date in their own offset, never shifted to UTC,
/// so "2026-09-01T00:30:00+05:30" is September 1st.
pub fn parse_expense_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date_time) = DateTime::parse_from_rfc3339(raw) {
        return Some(date_time.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|date_time| date_time.date())
}

/// Order records newest first: by calendar date descending, then by creation
/// time descending. Records with unparseable dates sort last.
pub fn sort_newest_first(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| {
        let date_order = match (a.calendar_date(), b.calendar_date()) {
            (Some(date_a), Some(date_b)) => date_b.cmp(&date_a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        date_order.then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn expense(id: &str, date: &str, created_second: u32) -> Expense {
        Expense {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            amount: 10.0,
            category: ExpenseCategory::Food,
            description: None,
            date: date.to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, created_second).unwrap(),
        }
    }

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(
            parse_expense_date("2026-09-01"),
            NaiveDate::from_ymd_opt(2026, 9, 1)
        );
    }

    #[test]
    fn test_parse_rfc3339_keeps_local_date() {
        // 00:30 in +05:30 is still the previous day in UTC
        assert_eq!(
            parse_expense_date("2026-09-01T00:30:00+05:30"),
            NaiveDate::from_ymd_opt(2026, 9, 1)
        );
        assert_eq!(
            parse_expense_date("2026-08-31T23:30:00-05:00"),
            NaiveDate::from_ymd_opt(2026, 8, 31)
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_expense_date("yesterday"), None);
        assert_eq!(parse_expense_date("2026-13-01"), None);
        assert_eq!(parse_expense_date(""), None);
    }

    #[test]
    fn test_generate_id_is_unique() {
        let first = Expense::generate_id(1_700_000_000_000);
        let second = Expense::generate_id(1_700_000_000_000);
        assert!(first.starts_with("exp-1700000000000-"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_sort_newest_first_uses_created_at_tiebreak() {
        let mut expenses = vec![
            expense("old", "2026-09-01", 0),
            expense("same_day_first", "2026-09-02", 1),
            expense("bad", "not a date", 9),
            expense("same_day_second", "2026-09-02", 5),
        ];
        sort_newest_first(&mut expenses);

        let ids: Vec<&str> = expenses.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["same_day_second", "same_day_first", "old", "bad"]);
    }
}
