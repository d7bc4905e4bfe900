//! Expense aggregation for the dashboard.
//!
//! Turns the flat, newest-first list of an owner's expenses into the grouped
//! views the dashboard renders: grand total, category totals, month buckets
//! with day sub-buckets, and the twelve-slot series for the yearly chart.
//!
//! Everything here is pure and synchronous. Buckets carry the date value they
//! were built from and are ordered on it; display labels are never parsed back.

use chrono::{Datelike, Local, NaiveDate, Weekday};
use shared::{ExpenseCategory, Month};
use std::collections::HashMap;
use tracing::warn;

use crate::domain::models::expense::Expense;

/// Floor for the yearly chart maximum, so an empty year still has a scale
pub const YEARLY_CHART_BASELINE: f64 = 1000.0;
/// Multiplier applied to the maximum to leave room above the tallest bar
pub const CHART_HEADROOM: f64 = 1.2;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub label: String,
    pub total: f64,
    pub records: Vec<Expense>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthBucket {
    pub year: i32,
    pub month: Month,
    pub label: String,
    pub total: f64,
    pub records: Vec<Expense>,
    pub days: Vec<DayBucket>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearlySeries {
    pub year: i32,
    /// January..December
    pub slots: [f64; 12],
    pub max_amount: f64,
    pub chart_ceiling: f64,
}

impl YearlySeries {
    pub fn total(&self) -> f64 {
        self.slots.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseSummary {
    pub grand_total: f64,
    /// In order of each category's first occurrence in the input
    pub category_totals: Vec<CategoryTotal>,
    pub top_category: Option<ExpenseCategory>,
    /// Newest period first
    pub month_buckets: Vec<MonthBucket>,
    pub yearly_series: YearlySeries,
    /// Records left out of the time-bucketed views
    pub undated_expense_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AggregationService;

impl AggregationService {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate against the current local year
    pub fn aggregate(&self, records: &[Expense]) -> ExpenseSummary {
        self.aggregate_for_year(records, Local::now().year())
    }

    pub fn aggregate_for_year(&self, records: &[Expense], current_year: i32) -> ExpenseSummary {
        let category_totals = self.category_totals(records);
        let top_category = Self::top_category(&category_totals);
        let (month_buckets, undated_expense_ids) = self.month_buckets(records);

        ExpenseSummary {
            grand_total: self.grand_total(records),
            category_totals,
            top_category,
            month_buckets,
            yearly_series: self.yearly_series(records, current_year),
            undated_expense_ids,
        }
    }

    pub fn grand_total(&self, records: &[Expense]) -> f64 {
        records.iter().map(|expense| expense.amount).sum()
    }

    pub fn category_totals(&self, records: &[Expense]) -> Vec<CategoryTotal> {
        let mut totals: Vec<CategoryTotal> = Vec::new();

        for expense in records {
            match totals.iter_mut().find(|t| t.category == expense.category) {
                Some(existing) => existing.total += expense.amount,
                None => totals.push(CategoryTotal {
                    category: expense.category,
                    total: expense.amount,
                }),
            }
        }

        totals
    }

    /// Category with the largest total; on a tie the one listed first wins
    pub fn top_category(totals: &[CategoryTotal]) -> Option<ExpenseCategory> {
        let mut best: Option<&CategoryTotal> = None;
        for candidate in totals {
            match best {
                Some(current) if candidate.total <= current.total => {}
                _ => best = Some(candidate),
            }
        }
        best.map(|t| t.category)
    }

    /// Partition records by calendar month. Returns the buckets, newest first,
    /// and the ids of records whose date could not be parsed.
    pub fn month_buckets(&self, records: &[Expense]) -> (Vec<MonthBucket>, Vec<String>) {
        let mut buckets: Vec<MonthBucket> = Vec::new();
        let mut index_by_period: HashMap<(i32, u32), usize> = HashMap::new();
        let mut dated: Vec<Vec<(NaiveDate, Expense)>> = Vec::new();
        let mut undated = Vec::new();

        for expense in records {
            let Some(date) = expense.calendar_date() else {
                warn!(
                    "Expense {} has unparseable date '{}', leaving it out of time buckets",
                    expense.id, expense.date
                );
                undated.push(expense.id.clone());
                continue;
            };

            let period = (date.year(), date.month());
            let index = *index_by_period.entry(period).or_insert_with(|| {
                let month = Month::ALL[date.month0() as usize];
                buckets.push(MonthBucket {
                    year: date.year(),
                    month,
                    label: month_label(month, date.year()),
                    total: 0.0,
                    records: Vec::new(),
                    days: Vec::new(),
                });
                dated.push(Vec::new());
                buckets.len() - 1
            });

            buckets[index].total += expense.amount;
            buckets[index].records.push(expense.clone());
            dated[index].push((date, expense.clone()));
        }

        for (bucket, entries) in buckets.iter_mut().zip(dated) {
            bucket.days = Self::day_buckets(entries);
        }

        // Stable sort keeps same-period input order intact
        buckets.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));

        (buckets, undated)
    }

    /// Partition one month's dated records by day, newest day first
    pub fn day_buckets(entries: Vec<(NaiveDate, Expense)>) -> Vec<DayBucket> {
        let mut days: Vec<DayBucket> = Vec::new();

        for (date, expense) in entries {
            match days.iter_mut().find(|day| day.date == date) {
                Some(day) => {
                    day.total += expense.amount;
                    day.records.push(expense);
                }
                None => days.push(DayBucket {
                    date,
                    label: day_label(date),
                    total: expense.amount,
                    records: vec![expense],
                }),
            }
        }

        days.sort_by(|a, b| b.date.cmp(&a.date));
        days
    }

    /// Twelve monthly totals for `year`; records from other years are ignored
    pub fn yearly_series(&self, records: &[Expense], year: i32) -> YearlySeries {
        let mut slots = [0.0_f64; 12];

        for expense in records {
            if let Some(date) = expense.calendar_date() {
                if date.year() == year {
                    slots[date.month0() as usize] += expense.amount;
                }
            }
        }

        let max_amount = slots.iter().copied().fold(YEARLY_CHART_BASELINE, f64::max);

        YearlySeries {
            year,
            slots,
            max_amount,
            chart_ceiling: max_amount * CHART_HEADROOM,
        }
    }

    /// Spend within one calendar month
    pub fn month_total(&self, records: &[Expense], month: Month, year: i32) -> f64 {
        records
            .iter()
            .filter(|expense| {
                expense
                    .calendar_date()
                    .map(|date| date.year() == year && date.month() == month.number())
                    .unwrap_or(false)
            })
            .map(|expense| expense.amount)
            .sum()
    }
}

/// "September 2026"
pub fn month_label(month: Month, year: i32) -> String {
    format!("{} {}", month.name(), year)
}

/// "Friday, 12th"
pub fn day_label(date: NaiveDate) -> String {
    format!(
        "{}, {}{}",
        weekday_name(date.weekday()),
        date.day(),
        ordinal_suffix(date.day())
    )
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}
