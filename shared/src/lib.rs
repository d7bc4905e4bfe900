use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use chrono::Datelike;

/// Fixed set of expense categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Food,
    Transport,
    Shopping,
    Bills,
    Entertainment,
    Health,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 7] = [
        ExpenseCategory::Food,
        ExpenseCategory::Transport,
        ExpenseCategory::Shopping,
        ExpenseCategory::Bills,
        ExpenseCategory::Entertainment,
        ExpenseCategory::Health,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Food => "Food",
            ExpenseCategory::Transport => "Transport",
            ExpenseCategory::Shopping => "Shopping",
            ExpenseCategory::Bills => "Bills",
            ExpenseCategory::Entertainment => "Entertainment",
            ExpenseCategory::Health => "Health",
            ExpenseCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ExpenseCategory::ALL
            .iter()
            .copied()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("Unknown category '{}'", trimmed))
    }
}

/// Calendar month, serialized by its canonical English name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// 1-based month number (January = 1)
    pub fn number(&self) -> u32 {
        *self as u32 + 1
    }

    pub fn from_number(number: u32) -> Option<Month> {
        if (1..=12).contains(&number) {
            Some(Month::ALL[(number - 1) as usize])
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    /// Three-letter label used on chart axes
    pub fn short_name(&self) -> &'static str {
        &self.name()[..3]
    }

    /// Month of today's local date
    pub fn current() -> Month {
        let now = chrono::Local::now();
        Month::ALL[now.month0() as usize]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Month::ALL
            .iter()
            .copied()
            .find(|month| month.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("Unknown month '{}'", trimmed))
    }
}

/// Expense record as exposed over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    /// Sync key or user id owning this record
    pub owner_id: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub description: Option<String>,
    /// Calendar date as stored (YYYY-MM-DD or RFC 3339)
    pub date: String,
    /// Server timestamp (RFC 3339)
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateExpenseRequest {
    pub amount: f64,
    /// Category name, validated against `ExpenseCategory`
    pub category: String,
    pub description: Option<String>,
    /// Optional date (YYYY-MM-DD or RFC 3339) - defaults to today
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Expense>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseResponse {
    pub success: bool,
    pub data: Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteExpenseResponse {
    pub success: bool,
    pub deleted_id: String,
}

/// One salary entry in the per-period history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySalary {
    pub month: Month,
    pub year: i32,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSalaryRequest {
    pub month: String,
    pub year: i32,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryHistoryResponse {
    /// Amount of the most recent period, 0 when no history exists
    pub current_salary: f64,
    pub monthly_salaries: Vec<MonthlySalary>,
}

/// Salary against spend for a single period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResponse {
    pub month: Month,
    pub year: i32,
    pub salary: f64,
    pub spend: f64,
    /// Negative when the period is overspent
    pub remaining: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    /// e.g. "Friday, 12th"
    pub label: String,
    /// YYYY-MM-DD
    pub date: String,
    pub total: f64,
    pub expenses: Vec<Expense>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBucket {
    /// e.g. "September 2026"
    pub label: String,
    pub month: Month,
    pub year: i32,
    pub total: f64,
    pub expense_count: usize,
    pub days: Vec<DayBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySlot {
    pub month: Month,
    /// Short axis label, e.g. "Jan"
    pub label: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySeries {
    pub year: i32,
    pub slots: Vec<YearlySlot>,
    /// Largest slot, floored at the chart baseline
    pub max_amount: f64,
    /// Upper bound for the chart axis, with headroom
    pub chart_ceiling: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummaryResponse {
    pub grand_total: f64,
    pub category_totals: Vec<CategoryTotal>,
    pub top_category: Option<ExpenseCategory>,
    pub month_buckets: Vec<MonthBucket>,
    pub yearly_series: YearlySeries,
    /// Records whose date could not be parsed (counted in totals only)
    pub undated_expense_ids: Vec<String>,
    pub current_salary: f64,
    pub current_period: ReconciliationResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeResponse {
    /// "anonymous" or "authenticated"
    pub strategy: String,
    pub scope_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkScopeRequest {
    pub sync_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub salary: f64,
    pub monthly_salaries: Vec<MonthlySalary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub salary: f64,
    pub month: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDataResponse {
    pub csv_content: String,
    pub filename: String,
    pub expense_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
    /// False when the token was unknown or already revoked
    pub revoked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing_is_case_insensitive() {
        assert_eq!("food".parse::<ExpenseCategory>(), Ok(ExpenseCategory::Food));
        assert_eq!(" Bills ".parse::<ExpenseCategory>(), Ok(ExpenseCategory::Bills));
        assert!("Groceries".parse::<ExpenseCategory>().is_err());
    }

    #[test]
    fn test_month_numbers_round_trip() {
        for (index, month) in Month::ALL.iter().enumerate() {
            assert_eq!(month.number(), index as u32 + 1);
            assert_eq!(Month::from_number(month.number()), Some(*month));
        }
        assert_eq!(Month::from_number(0), None);
        assert_eq!(Month::from_number(13), None);
    }

    #[test]
    fn test_month_names() {
        assert_eq!("september".parse::<Month>(), Ok(Month::September));
        assert_eq!(Month::September.short_name(), "Sep");
        assert!("Sept".parse::<Month>().is_err());
    }

    #[test]
    fn test_month_serializes_by_name() {
        let entry = MonthlySalary {
            month: Month::March,
            year: 2026,
            amount: 5000.0,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"March\""));
    }
}
