use shared::Expense as SharedExpense;

use crate::domain::models::expense::Expense as DomainExpense;

pub struct ExpenseMapper;

impl ExpenseMapper {
    pub fn to_dto(domain: DomainExpense) -> SharedExpense {
        SharedExpense {
            id: domain.id,
            owner_id: domain.owner_id,
            amount: domain.amount,
            category: domain.category,
            description: domain.description,
            date: domain.date,
            created_at: domain.created_at.to_rfc3339(),
        }
    }

    pub fn to_dto_list(domain_expenses: Vec<DomainExpense>) -> Vec<SharedExpense> {
        domain_expenses.into_iter().map(Self::to_dto).collect()
    }
}
