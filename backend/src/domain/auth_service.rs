//! Credential handling for the authenticated identity strategy.
//!
//! Passwords are stored as bcrypt hashes; hashing and verification run on the
//! blocking pool. Tokens are random opaque strings kept in memory with an
//! expiry; a restart logs everyone out.

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use shared::Month;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainResult, ExpenseError};
use crate::domain::models::salary::{validate_salary_amount, SalaryHistory};
use crate::domain::models::user::User;
use crate::domain::salary_service::SalaryService;
use crate::storage::{Connection, DuplicateUserError, UserStorage};

const TOKEN_BYTES: usize = 32;
const PASSWORD_HASH_COST: u32 = if cfg!(test) { 4 } else { bcrypt::DEFAULT_COST };

#[derive(Debug, Clone)]
struct IssuedToken {
    user_id: String,
    expires_at: DateTime<Utc>,
}

/// Result of a successful register or login
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
    pub salary_history: SalaryHistory,
}

#[derive(Clone)]
pub struct AuthService<C: Connection> {
    user_repository: C::UserRepository,
    salary_service: SalaryService<C>,
    tokens: Arc<Mutex<HashMap<String, IssuedToken>>>,
    token_ttl: Duration,
}

impl<C: Connection> AuthService<C> {
    pub fn new(connection: Arc<C>, salary_service: SalaryService<C>, token_ttl: Duration) -> Self {
        Self {
            user_repository: connection.create_user_repository(),
            salary_service,
            tokens: Arc::new(Mutex::new(HashMap::new())),
            token_ttl,
        }
    }

    fn tokens(&self) -> MutexGuard<'_, HashMap<String, IssuedToken>> {
        self.tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn register(&self, username: &str, password: &str) -> DomainResult<AuthSession> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ExpenseError::validation("Username and password are required"));
        }

        let taken = || ExpenseError::Conflict(format!("Username '{}' is already taken", username));
        if self.user_repository.get_user_by_username(username).await?.is_some() {
            return Err(taken());
        }

        let now_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(anyhow::Error::from)?
            .as_millis() as u64;
        let now = Utc::now();

        let user = User {
            id: User::generate_id(now_millis),
            username: username.to_string(),
            password_hash: hash_password(password).await?,
            salary: 0.0,
            created_at: now,
            updated_at: now,
        };

        // A concurrent registration may have taken the name since the check
        if let Err(e) = self.user_repository.store_user(&user).await {
            if e.downcast_ref::<DuplicateUserError>().is_some() {
                return Err(taken());
            }
            return Err(e.into());
        }
        info!("Registered user {} ({})", user.username, user.id);

        Ok(AuthSession {
            token: self.issue_token(&user.id),
            user,
            salary_history: SalaryHistory::default(),
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> DomainResult<AuthSession> {
        let invalid = || ExpenseError::Auth("Invalid username or password".to_string());

        let user = self
            .user_repository
            .get_user_by_username(username)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash).await? {
            warn!("Failed login for user {}", user.username);
            return Err(invalid());
        }

        let salary_history = self.salary_service.get_salary_history(&user.id).await?;
        info!("User {} logged in", user.username);

        Ok(AuthSession {
            token: self.issue_token(&user.id),
            user,
            salary_history,
        })
    }

    /// Resolve a bearer token to its user. Unknown or expired tokens are an
    /// `Auth` error.
    pub async fn verify_token(&self, token: &str) -> DomainResult<User> {
        let issued = self
            .tokens()
            .get(token)
            .cloned()
            .ok_or_else(|| ExpenseError::Auth("Invalid or missing token".to_string()))?;

        if issued.expires_at <= Utc::now() {
            return Err(ExpenseError::Auth("Token expired".to_string()));
        }

        self.user_repository
            .get_user(&issued.user_id)
            .await?
            .ok_or_else(|| ExpenseError::Auth("Token refers to an unknown user".to_string()))
    }

    /// User a token was issued to, whether or not it is still valid
    pub fn token_subject(&self, token: &str) -> Option<String> {
        self.tokens().get(token).map(|issued| issued.user_id.clone())
    }

    /// Revoke a token. Returns the user it belonged to, `None` if it was not known.
    pub fn logout(&self, token: &str) -> Option<String> {
        self.tokens().remove(token).map(|issued| issued.user_id)
    }

    pub async fn salary_history(&self, user: &User) -> DomainResult<SalaryHistory> {
        self.salary_service.get_salary_history(&user.id).await
    }

    /// Update the salary on a user profile. With a period the per-period
    /// history is upserted and the profile salary follows the latest period;
    /// without one the profile salary is set directly. The stored user is
    /// re-read under the write lock, so only the salary changes.
    pub async fn update_profile(
        &self,
        user_id: &str,
        salary: f64,
        period: Option<(Month, i32)>,
    ) -> DomainResult<(User, SalaryHistory)> {
        validate_salary_amount(salary)?;

        let (profile_salary, history) = match period {
            Some((month, year)) => {
                let history = self
                    .salary_service
                    .set_salary_for_period(user_id, month, year, salary)
                    .await?;
                (history.current_salary(), history)
            }
            None => (salary, self.salary_service.get_salary_history(user_id).await?),
        };

        let updated = self
            .user_repository
            .update_user_salary(user_id, profile_salary)
            .await?
            .ok_or_else(|| ExpenseError::NotFound(format!("User '{}' not found", user_id)))?;

        info!("Updated profile salary of {} to {:.2}", updated.username, updated.salary);
        Ok((updated, history))
    }

    fn issue_token(&self, user_id: &str) -> String {
        let token = random_hex(TOKEN_BYTES);
        let now = Utc::now();

        let mut tokens = self.tokens();
        let before = tokens.len();
        tokens.retain(|_, issued| issued.expires_at > now);
        if tokens.len() < before {
            debug!("Pruned {} expired tokens", before - tokens.len());
        }
        tokens.insert(
            token.clone(),
            IssuedToken {
                user_id: user_id.to_string(),
                expires_at: now + self.token_ttl,
            },
        );
        token
    }

    #[cfg(test)]
    pub(crate) fn expire_token(&self, token: &str) {
        if let Some(issued) = self.tokens().get_mut(token) {
            issued.expires_at = Utc::now() - Duration::seconds(1);
        }
    }

    #[cfg(test)]
    fn token_count(&self) -> usize {
        self.tokens().len()
    }
}

async fn hash_password(password: &str) -> anyhow::Result<String> {
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, PASSWORD_HASH_COST))
        .await
        .context("Password hashing task failed")??;
    Ok(hashed)
}

async fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .context("Password verification task failed")??;
    Ok(matches)
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
