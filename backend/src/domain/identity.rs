//! Identity resolution: which owner scope a request addresses.
//!
//! One [`ScopeResolver`] is chosen at startup from the configured
//! [`IdentityStrategy`]:
//!
//! - [`AnonymousKeyResolver`] hands out a locally generated sync key that is
//!   persisted in the global config and can be replaced to link another device.
//! - [`AuthenticatedResolver`] maps a bearer token to its user.
//!
//! [`IdentityService`] ties the resolver to the [`DashboardSession`] so that
//! scope changes and authentication failures reset the dashboard.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::IdentityStrategy;
use crate::domain::auth_service::AuthService;
use crate::domain::errors::{DomainResult, ExpenseError};
use crate::domain::models::owner::OwnerScope;
use crate::domain::session::DashboardSession;
use crate::storage::csv::GlobalConfigStorage;
use crate::storage::Connection;

pub const MAX_SYNC_KEY_LENGTH: usize = 64;

/// Credentials carried by an incoming request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCredentials {
    pub bearer_token: Option<String>,
}

impl RequestCredentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
        }
    }
}

#[async_trait]
pub trait ScopeResolver: Send + Sync {
    fn strategy(&self) -> IdentityStrategy;

    /// The scope the request should operate on
    async fn resolve(&self, credentials: &RequestCredentials) -> DomainResult<OwnerScope>;

    /// Principal the credentials were issued to, known even when they no
    /// longer verify. Used to clear only that principal's session.
    fn credential_subject(&self, _credentials: &RequestCredentials) -> Option<String> {
        None
    }

    /// Replace the active scope with another device's key
    async fn link_scope(&self, _new_key: &str) -> DomainResult<OwnerScope> {
        Err(ExpenseError::validation(format!(
            "Linking a sync key is not available with {} identity",
            self.strategy()
        )))
    }
}

/// Sync keys are 1-64 characters of `[A-Za-z0-9_-]`
pub fn validate_sync_key(key: &str) -> DomainResult<()> {
    let valid_chars = key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if key.is_empty() || key.len() > MAX_SYNC_KEY_LENGTH || !valid_chars {
        return Err(ExpenseError::validation(format!(
            "Sync key must be 1-{} characters of letters, digits, '-' or '_'",
            MAX_SYNC_KEY_LENGTH
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct AnonymousKeyResolver<C: Connection> {
    global_config_repository: C::GlobalConfigRepository,
    key_lock: Arc<Mutex<()>>,
}

impl<C: Connection> AnonymousKeyResolver<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            global_config_repository: connection.create_global_config_repository(),
            key_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The persisted key, generated and stored on first use
    fn active_key(&self) -> DomainResult<String> {
        let _guard = self
            .key_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let config = self.global_config_repository.get_global_config()?;
        if let Some(key) = config.active_sync_key {
            return Ok(key);
        }

        let key = Uuid::new_v4().to_string();
        self.global_config_repository
            .set_active_sync_key(Some(key.clone()))?;
        info!("Generated new anonymous sync key {}", key);
        Ok(key)
    }
}

#[async_trait]
impl<C: Connection> ScopeResolver for AnonymousKeyResolver<C> {
    fn strategy(&self) -> IdentityStrategy {
        IdentityStrategy::Anonymous
    }

    async fn resolve(&self, _credentials: &RequestCredentials) -> DomainResult<OwnerScope> {
        Ok(OwnerScope::SyncKey(self.active_key()?))
    }

    async fn link_scope(&self, new_key: &str) -> DomainResult<OwnerScope> {
        let new_key = new_key.trim();
        validate_sync_key(new_key)?;

        let _guard = self
            .key_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.global_config_repository
            .set_active_sync_key(Some(new_key.to_string()))?;

        info!("Linked to sync key {}", new_key);
        Ok(OwnerScope::SyncKey(new_key.to_string()))
    }
}

#[derive(Clone)]
pub struct AuthenticatedResolver<C: Connection> {
    auth_service: AuthService<C>,
}

impl<C: Connection> AuthenticatedResolver<C> {
    pub fn new(auth_service: AuthService<C>) -> Self {
        Self { auth_service }
    }
}

#[async_trait]
impl<C: Connection> ScopeResolver for AuthenticatedResolver<C> {
    fn strategy(&self) -> IdentityStrategy {
        IdentityStrategy::Authenticated
    }

    fn credential_subject(&self, credentials: &RequestCredentials) -> Option<String> {
        credentials
            .bearer_token
            .as_deref()
            .and_then(|token| self.auth_service.token_subject(token))
    }

    async fn resolve(&self, credentials: &RequestCredentials) -> DomainResult<OwnerScope> {
        let token = credentials
            .bearer_token
            .as_deref()
            .ok_or_else(|| ExpenseError::Auth("Missing bearer token".to_string()))?;

        let user = self.auth_service.verify_token(token).await?;
        Ok(OwnerScope::User {
            id: user.id,
            username: user.username,
        })
    }
}

/// Resolver plus dashboard session
#[derive(Clone)]
pub struct IdentityService {
    resolver: Arc<dyn ScopeResolver>,
    session: DashboardSession,
}

impl IdentityService {
    pub fn new(resolver: Arc<dyn ScopeResolver>, session: DashboardSession) -> Self {
        Self { resolver, session }
    }

    pub fn strategy(&self) -> IdentityStrategy {
        self.resolver.strategy()
    }

    pub fn session(&self) -> &DashboardSession {
        &self.session
    }

    /// Resolve the request's scope and activate it if its principal has no
    /// active scope yet. An authentication failure clears the session of the
    /// principal the credential was issued to, and nobody else's.
    pub async fn resolve(&self, credentials: &RequestCredentials) -> DomainResult<OwnerScope> {
        match self.resolver.resolve(credentials).await {
            Ok(scope) => {
                if !self.session.activate(&scope) {
                    debug!("Scope '{}' resolved after it was replaced", scope.key());
                }
                Ok(scope)
            }
            Err(e) => {
                if e.is_auth() {
                    self.invalidate_credentials(credentials);
                }
                Err(e)
            }
        }
    }

    /// Clear the dashboard session of whoever the credentials belong to
    pub fn invalidate_credentials(&self, credentials: &RequestCredentials) {
        if let Some(principal) = self.resolver.credential_subject(credentials) {
            self.session.invalidate(&principal);
        }
    }

    /// Link another device's key. The dashboard is reset even when the key is
    /// unchanged, forcing a full re-fetch. Data of the old key stays on disk.
    pub async fn link_scope(&self, new_key: &str) -> DomainResult<OwnerScope> {
        let scope = self.resolver.link_scope(new_key).await?;
        self.session.switch_scope(scope.clone());
        Ok(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregation::AggregationService;
    use crate::domain::models::owner::ANONYMOUS_PRINCIPAL;
    use crate::domain::salary_service::SalaryService;
    use crate::storage::csv::test_utils::TestEnvironment;
    use crate::storage::csv::CsvConnection;
    use chrono::Duration;

    fn anonymous(env: &TestEnvironment) -> AnonymousKeyResolver<CsvConnection> {
        AnonymousKeyResolver::new(Arc::new(env.connection.clone()))
    }

    #[tokio::test]
    async fn test_anonymous_key_is_generated_once() {
        let env = TestEnvironment::new().unwrap();
        let resolver = anonymous(&env);

        let first = resolver.resolve(&RequestCredentials::default()).await.unwrap();
        let second = resolver.resolve(&RequestCredentials::default()).await.unwrap();
        assert_eq!(first, second);
        assert!(Uuid::parse_str(first.key()).is_ok());

        // Survives a restart
        let reopened = anonymous(&env);
        let third = reopened.resolve(&RequestCredentials::default()).await.unwrap();
        assert_eq!(first, third);
    }

    #[tokio::test]
    async fn test_link_scope_replaces_key() {
        let env = TestEnvironment::new().unwrap();
        let resolver = anonymous(&env);

        resolver.resolve(&RequestCredentials::default()).await.unwrap();
        let linked = resolver.link_scope("other-device_01").await.unwrap();
        assert_eq!(linked, OwnerScope::SyncKey("other-device_01".to_string()));

        let resolved = resolver.resolve(&RequestCredentials::default()).await.unwrap();
        assert_eq!(resolved, linked);
    }

    #[tokio::test]
    async fn test_link_scope_rejects_bad_keys() {
        let env = TestEnvironment::new().unwrap();
        let resolver = anonymous(&env);

        let too_long = "k".repeat(MAX_SYNC_KEY_LENGTH + 1);
        for bad in ["", "../escape", "has space", too_long.as_str()] {
            assert!(matches!(
                resolver.link_scope(bad).await,
                Err(ExpenseError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_authenticated_resolver() {
        let env = TestEnvironment::new().unwrap();
        let connection = Arc::new(env.connection.clone());
        let auth = AuthService::new(
            connection.clone(),
            SalaryService::new(connection),
            Duration::days(30),
        );
        let session = auth.register("alice", "pw").await.unwrap();
        let resolver = AuthenticatedResolver::new(auth);

        let scope = resolver
            .resolve(&RequestCredentials::bearer(session.token))
            .await
            .unwrap();
        assert_eq!(scope.key(), session.user.id);

        assert!(matches!(
            resolver.resolve(&RequestCredentials::default()).await,
            Err(ExpenseError::Auth(_))
        ));
        assert!(matches!(
            resolver.link_scope("anything").await,
            Err(ExpenseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_identity_service_resets_session() {
        let env = TestEnvironment::new().unwrap();
        let connection = Arc::new(env.connection.clone());
        let auth = AuthService::new(
            connection.clone(),
            SalaryService::new(connection),
            Duration::days(30),
        );
        let registered = auth.register("alice", "pw").await.unwrap();
        let identity = IdentityService::new(
            Arc::new(AuthenticatedResolver::new(auth.clone())),
            DashboardSession::new(),
        );

        let scope = identity
            .resolve(&RequestCredentials::bearer(registered.token.clone()))
            .await
            .unwrap();
        let principal = registered.user.id.as_str();
        assert_eq!(identity.session().active_scope(principal), Some(scope.clone()));

        // Unknown token: nobody's session is touched
        let failed = identity.resolve(&RequestCredentials::bearer("stale")).await;
        assert!(matches!(failed, Err(ExpenseError::Auth(_))));
        assert_eq!(identity.session().active_scope(principal), Some(scope));

        // The user's own token expiring clears their session
        auth.expire_token(&registered.token);
        let failed = identity
            .resolve(&RequestCredentials::bearer(registered.token))
            .await;
        assert!(matches!(failed, Err(ExpenseError::Auth(_))));
        assert_eq!(identity.session().active_scope(principal), None);
    }

    #[tokio::test]
    async fn test_anonymous_request_leaves_other_users_fetch_intact() {
        let env = TestEnvironment::new().unwrap();
        let connection = Arc::new(env.connection.clone());
        let auth = AuthService::new(
            connection.clone(),
            SalaryService::new(connection),
            Duration::days(30),
        );
        let alice = auth.register("alice", "pw").await.unwrap();
        let bob = auth.register("bob", "pw").await.unwrap();
        let identity = IdentityService::new(
            Arc::new(AuthenticatedResolver::new(auth)),
            DashboardSession::new(),
        );

        let alice_scope = identity
            .resolve(&RequestCredentials::bearer(alice.token))
            .await
            .unwrap();
        let ticket = identity.session().begin_fetch(&alice_scope).unwrap();

        // Requests without a token and from another user happen meanwhile
        assert!(identity.resolve(&RequestCredentials::default()).await.is_err());
        let bob_scope = identity
            .resolve(&RequestCredentials::bearer(bob.token))
            .await
            .unwrap();
        identity.session().begin_fetch(&bob_scope).unwrap();

        let snapshot = identity
            .session()
            .complete_fetch(ticket, Ok(Vec::new()), &AggregationService::new())
            .unwrap();
        assert_eq!(snapshot.scope_key, alice.user.id);
        assert_eq!(identity.session().active_scope(&alice.user.id), Some(alice_scope));
        assert_eq!(identity.session().active_scope(&bob.user.id), Some(bob_scope));
    }

    #[tokio::test]
    async fn test_identity_service_link_switches_scope() {
        let env = TestEnvironment::new().unwrap();
        let identity = IdentityService::new(Arc::new(anonymous(&env)), DashboardSession::new());

        let original = identity.resolve(&RequestCredentials::default()).await.unwrap();
        let generation = identity.session().generation(ANONYMOUS_PRINCIPAL);

        let linked = identity.link_scope("device-b").await.unwrap();
        assert_eq!(identity.session().active_scope(ANONYMOUS_PRINCIPAL), Some(linked.clone()));
        assert!(identity.session().generation(ANONYMOUS_PRINCIPAL) > generation);

        // A request that resolved the old key cannot switch the session back
        assert!(matches!(
            identity.session().begin_fetch(&original),
            Err(ExpenseError::StaleScope(_))
        ));
        assert_eq!(identity.session().active_scope(ANONYMOUS_PRINCIPAL), Some(linked));
    }
}
