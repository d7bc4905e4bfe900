//! Dashboard session state.
//!
//! Every principal has its own slot: the anonymous device shares one slot
//! across its sync keys, each authenticated user gets a slot of their own.
//! A slot holds the active owner scope, the generation it was activated in,
//! and the last snapshot of records plus their aggregation fetched
//! successfully for that scope.
//!
//! A fetch is tagged with a [`FetchTicket`] when it starts. When it finishes,
//! its result is only accepted if its slot saw no scope change in between, so
//! a slow response for an old scope can never overwrite the view of the new
//! one. Only [`DashboardSession::switch_scope`] replaces an active scope; a
//! fetch or activation for any other scope is refused as stale.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::domain::aggregation::{AggregationService, ExpenseSummary};
use crate::domain::errors::{DomainResult, ExpenseError};
use crate::domain::models::expense::Expense;
use crate::domain::models::owner::OwnerScope;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub scope_key: String,
    pub records: Vec<Expense>,
    pub summary: ExpenseSummary,
    pub fetched_at: DateTime<Utc>,
}

/// Identifies one fetch against the scope that was active when it started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub scope: OwnerScope,
    pub generation: u64,
}

#[derive(Debug, Default)]
struct SessionSlot {
    active_scope: Option<OwnerScope>,
    generation: u64,
    snapshot: Option<DashboardSnapshot>,
}

#[derive(Debug, Default)]
struct SessionRegistry {
    /// Process-wide counter so a generation is never reused by any slot
    last_generation: u64,
    slots: HashMap<String, SessionSlot>,
}

impl SessionRegistry {
    /// Give the principal's slot a fresh generation and drop its snapshot;
    /// pending fetches of that slot become stale
    fn reset(&mut self, principal: &str, scope: Option<OwnerScope>) -> &mut SessionSlot {
        self.last_generation += 1;
        let generation = self.last_generation;
        let slot = self.slots.entry(principal.to_string()).or_default();
        slot.generation = generation;
        slot.active_scope = scope;
        slot.snapshot = None;
        slot
    }
}

#[derive(Clone, Default)]
pub struct DashboardSession {
    state: Arc<Mutex<SessionRegistry>>,
}

impl DashboardSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionRegistry> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn active_scope(&self, principal: &str) -> Option<OwnerScope> {
        self.lock()
            .slots
            .get(principal)
            .and_then(|slot| slot.active_scope.clone())
    }

    pub fn generation(&self, principal: &str) -> u64 {
        self.lock()
            .slots
            .get(principal)
            .map(|slot| slot.generation)
            .unwrap_or(0)
    }

    pub fn snapshot(&self, principal: &str) -> Option<DashboardSnapshot> {
        self.lock()
            .slots
            .get(principal)
            .and_then(|slot| slot.snapshot.clone())
    }

    /// Replace the active scope of the scope's principal. The snapshot is
    /// cleared before any fetch for the new scope can start.
    pub fn switch_scope(&self, scope: OwnerScope) {
        let mut state = self.lock();
        let principal = scope.principal_key().to_string();
        info!(
            "Switching dashboard scope of '{}' from {:?} to '{}'",
            principal,
            state
                .slots
                .get(&principal)
                .and_then(|slot| slot.active_scope.as_ref())
                .map(|s| s.key().to_string()),
            scope.key()
        );
        state.reset(&principal, Some(scope));
    }

    /// Make `scope` active when its principal has no active scope yet.
    /// Returns false if a different scope is active; that scope stays.
    pub fn activate(&self, scope: &OwnerScope) -> bool {
        let mut state = self.lock();
        let principal = scope.principal_key();
        match state.slots.get(principal).and_then(|slot| slot.active_scope.as_ref()) {
            Some(active) => active == scope,
            None => {
                debug!("Activating dashboard scope '{}'", scope.key());
                state.reset(principal, Some(scope.clone()));
                true
            }
        }
    }

    /// Drop the principal's active scope and cached records, e.g. on logout
    /// or an authentication failure. Other principals are untouched.
    pub fn invalidate(&self, principal: &str) {
        let mut state = self.lock();
        let had_state = state
            .slots
            .get(principal)
            .map(|slot| slot.active_scope.is_some() || slot.snapshot.is_some())
            .unwrap_or(false);
        if had_state {
            info!("Invalidating dashboard session of '{}'", principal);
            state.reset(principal, None);
        }
    }

    /// Start a fetch for `scope`. A principal without an active scope
    /// activates it; a fetch for a scope that has since been replaced is
    /// refused with `StaleScope`.
    pub fn begin_fetch(&self, scope: &OwnerScope) -> DomainResult<FetchTicket> {
        let mut state = self.lock();
        let principal = scope.principal_key();
        let active = state
            .slots
            .get(principal)
            .and_then(|slot| slot.active_scope.as_ref().map(|active| (active == scope, slot.generation)));

        let generation = match active {
            Some((true, generation)) => generation,
            Some((false, _)) => {
                warn!("Refusing fetch for replaced scope '{}'", scope.key());
                return Err(ExpenseError::StaleScope(scope.key().to_string()));
            }
            None => state.reset(principal, Some(scope.clone())).generation,
        };

        Ok(FetchTicket {
            scope: scope.clone(),
            generation,
        })
    }

    /// Finish a fetch. On success the records are aggregated and become the
    /// new snapshot. A result for a superseded ticket is discarded with
    /// `StaleScope`; an auth failure clears the principal's slot; any other
    /// failure leaves the previous snapshot in place.
    pub fn complete_fetch(
        &self,
        ticket: FetchTicket,
        result: DomainResult<Vec<Expense>>,
        aggregation: &AggregationService,
    ) -> DomainResult<DashboardSnapshot> {
        // Aggregate outside the lock
        let result = result.map(|records| {
            let summary = aggregation.aggregate(&records);
            (records, summary)
        });

        let mut state = self.lock();
        let principal = ticket.scope.principal_key();
        let current = state.slots.get(principal).and_then(|slot| {
            (slot.active_scope.as_ref() == Some(&ticket.scope)).then_some(slot.generation)
        });
        if current != Some(ticket.generation) {
            warn!(
                "Discarding fetch for scope '{}' (generation {} superseded)",
                ticket.scope.key(),
                ticket.generation
            );
            return Err(ExpenseError::StaleScope(ticket.scope.key().to_string()));
        }

        match result {
            Ok((records, summary)) => {
                let snapshot = DashboardSnapshot {
                    scope_key: ticket.scope.key().to_string(),
                    records,
                    summary,
                    fetched_at: Utc::now(),
                };
                if let Some(slot) = state.slots.get_mut(principal) {
                    slot.snapshot = Some(snapshot.clone());
                }
                Ok(snapshot)
            }
            Err(e) if e.is_auth() => {
                warn!("Authentication failed during fetch, clearing session: {}", e);
                state.reset(principal, None);
                Err(e)
            }
            Err(e) => {
                warn!("Fetch failed, keeping last known snapshot: {}", e);
                Err(e)
            }
        }
    }
}
