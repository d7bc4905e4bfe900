use shared::{
    CategoryTotal as SharedCategoryTotal, DayBucket as SharedDayBucket, ExpenseSummaryResponse,
    MonthBucket as SharedMonthBucket, YearlySeries as SharedYearlySeries, YearlySlot,
};
use shared::Month;

use crate::domain::aggregation::{
    CategoryTotal, DayBucket, ExpenseSummary, MonthBucket, YearlySeries,
};
use crate::domain::summary_service::DashboardSummary;
use crate::io::rest::mappers::expense_mapper::ExpenseMapper;
use crate::io::rest::mappers::salary_mapper::SalaryMapper;

pub struct SummaryMapper;

impl SummaryMapper {
    pub fn to_response(dashboard: DashboardSummary) -> ExpenseSummaryResponse {
        let ExpenseSummary {
            grand_total,
            category_totals,
            top_category,
            month_buckets,
            yearly_series,
            undated_expense_ids,
        } = dashboard.snapshot.summary;

        ExpenseSummaryResponse {
            grand_total,
            category_totals: category_totals.into_iter().map(Self::category_total_to_dto).collect(),
            top_category,
            month_buckets: month_buckets.into_iter().map(Self::month_bucket_to_dto).collect(),
            yearly_series: Self::yearly_series_to_dto(yearly_series),
            undated_expense_ids,
            current_salary: dashboard.current_salary,
            current_period: SalaryMapper::to_reconciliation_response(dashboard.current_period),
        }
    }

    fn category_total_to_dto(total: CategoryTotal) -> SharedCategoryTotal {
        SharedCategoryTotal {
            category: total.category,
            total: total.total,
        }
    }

    fn month_bucket_to_dto(bucket: MonthBucket) -> SharedMonthBucket {
        SharedMonthBucket {
            label: bucket.label,
            month: bucket.month,
            year: bucket.year,
            total: bucket.total,
            expense_count: bucket.records.len(),
            days: bucket.days.into_iter().map(Self::day_bucket_to_dto).collect(),
        }
    }

    fn day_bucket_to_dto(bucket: DayBucket) -> SharedDayBucket {
        SharedDayBucket {
            label: bucket.label,
            date: bucket.date.format("%Y-%m-%d").to_string(),
            total: bucket.total,
            expenses: ExpenseMapper::to_dto_list(bucket.records),
        }
    }

    fn yearly_series_to_dto(series: YearlySeries) -> SharedYearlySeries {
        SharedYearlySeries {
            year: series.year,
            slots: Month::ALL
                .iter()
                .zip(series.slots.iter())
                .map(|(month, amount)| YearlySlot {
                    month: *month,
                    label: month.short_name().to_string(),
                    amount: *amount,
                })
                .collect(),
            max_amount: series.max_amount,
            chart_ceiling: series.chart_ceiling,
        }
    }
}
