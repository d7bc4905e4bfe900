use shared::{MonthlySalary as SharedMonthlySalary, ReconciliationResponse, SalaryHistoryResponse};

use crate::domain::models::salary::{MonthlySalary as DomainMonthlySalary, SalaryHistory};
use crate::domain::salary_service::Reconciliation;

pub struct SalaryMapper;

impl SalaryMapper {
    pub fn to_dto(domain: &DomainMonthlySalary) -> SharedMonthlySalary {
        SharedMonthlySalary {
            month: domain.month,
            year: domain.year,
            amount: domain.amount,
        }
    }

    pub fn to_dto_list(history: &SalaryHistory) -> Vec<SharedMonthlySalary> {
        history.entries.iter().map(Self::to_dto).collect()
    }

    pub fn to_history_response(history: &SalaryHistory) -> SalaryHistoryResponse {
        SalaryHistoryResponse {
            current_salary: history.current_salary(),
            monthly_salaries: Self::to_dto_list(history),
        }
    }

    pub fn to_reconciliation_response(reconciliation: Reconciliation) -> ReconciliationResponse {
        ReconciliationResponse {
            month: reconciliation.month,
            year: reconciliation.year,
            salary: reconciliation.salary,
            spend: reconciliation.spend,
            remaining: reconciliation.remaining,
        }
    }
}
