//! Dashboard summary: fetch the scope's records through the session, aggregate
//! them, and reconcile the current month against its salary.

use chrono::{Datelike, Local};
use shared::Month;
use tracing::{info, warn};

use crate::domain::aggregation::AggregationService;
use crate::domain::errors::{DomainResult, ExpenseError};
use crate::domain::expense_service::ExpenseService;
use crate::domain::models::owner::OwnerScope;
use crate::domain::salary_service::{reconcile, Reconciliation, SalaryService};
use crate::domain::session::{DashboardSession, DashboardSnapshot};
use crate::storage::Connection;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub snapshot: DashboardSnapshot,
    pub current_salary: f64,
    pub current_period: Reconciliation,
}

#[derive(Clone)]
pub struct SummaryService<C: Connection> {
    expense_service: ExpenseService<C>,
    salary_service: SalaryService<C>,
    aggregation_service: AggregationService,
    session: DashboardSession,
}

impl<C: Connection> SummaryService<C> {
    pub fn new(
        expense_service: ExpenseService<C>,
        salary_service: SalaryService<C>,
        aggregation_service: AggregationService,
        session: DashboardSession,
    ) -> Self {
        Self {
            expense_service,
            salary_service,
            aggregation_service,
            session,
        }
    }

    /// Summary with the current local month as the reconciled period
    pub async fn get_summary(&self, scope: &OwnerScope) -> DomainResult<DashboardSummary> {
        let today = Local::now().date_naive();
        self.get_summary_for_period(scope, Month::ALL[today.month0() as usize], today.year())
            .await
    }

    pub async fn get_summary_for_period(
        &self,
        scope: &OwnerScope,
        month: Month,
        year: i32,
    ) -> DomainResult<DashboardSummary> {
        info!("Building summary for owner {} ({} {})", scope.key(), month, year);

        let ticket = self.session.begin_fetch(scope)?;
        let fetched = self.expense_service.list_expenses(scope).await;

        let snapshot = match self
            .session
            .complete_fetch(ticket, fetched, &self.aggregation_service)
        {
            Ok(snapshot) => snapshot,
            Err(ExpenseError::Server(e)) => match self.session.snapshot(scope.principal_key()) {
                Some(cached) if cached.scope_key == scope.key() => {
                    warn!(
                        "Serving summary from snapshot of {} after fetch failure: {}",
                        cached.fetched_at, e
                    );
                    cached
                }
                _ => return Err(ExpenseError::Server(e)),
            },
            Err(e) => return Err(e),
        };

        let history = self.salary_service.get_salary_history(scope.key()).await?;
        let current_period = reconcile(month, year, &snapshot.records, &history);

        Ok(DashboardSummary {
            current_salary: history.current_salary(),
            current_period,
            snapshot,
        })
    }

    /// Reconcile any period without touching the dashboard snapshot
    pub async fn reconcile_period(
        &self,
        scope: &OwnerScope,
        month: Month,
        year: i32,
    ) -> DomainResult<Reconciliation> {
        let records = self.expense_service.list_expenses(scope).await?;
        let history = self.salary_service.get_salary_history(scope.key()).await?;
        Ok(reconcile(month, year, &records, &history))
    }
}
