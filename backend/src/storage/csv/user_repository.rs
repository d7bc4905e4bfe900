//! # User Repository
//!
//! Registered principals live in a single `users.yaml` at the root of the
//! data directory. Usernames are matched case-insensitively.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::fs;
use tracing::info;

use super::connection::CsvConnection;
use crate::domain::models::user::User;
use crate::storage::traits::{DuplicateUserError, UserStorage};

#[derive(Clone)]
pub struct UserRepository {
    connection: CsvConnection,
}

impl UserRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_users(&self) -> Result<Vec<User>> {
        let path = self.connection.get_users_file_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let yaml_content = fs::read_to_string(&path)?;
        serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn write_users(&self, users: &[User]) -> Result<()> {
        let yaml_content = serde_yaml::to_string(users)?;
        CsvConnection::write_atomically(&self.connection.get_users_file_path(), yaml_content.as_bytes())
    }
}

#[async_trait]
impl UserStorage for UserRepository {
    async fn store_user(&self, user: &User) -> Result<()> {
        let _guard = self.connection.lock_writes();

        let mut users = self.read_users()?;
        if users
            .iter()
            .any(|u| u.id == user.id || u.username.eq_ignore_ascii_case(&user.username))
        {
            return Err(DuplicateUserError(user.username.clone()).into());
        }

        users.push(user.clone());
        self.write_users(&users)?;
        info!("Stored user {} ({})", user.username, user.id);
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.read_users()?.into_iter().find(|u| u.id == user_id))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.trim();
        Ok(self
            .read_users()?
            .into_iter()
            .find(|u| u.username.eq_ignore_ascii_case(username)))
    }

    async fn update_user_salary(&self, user_id: &str, salary: f64) -> Result<Option<User>> {
        let _guard = self.connection.lock_writes();

        let mut users = self.read_users()?;
        let Some(existing) = users.iter_mut().find(|u| u.id == user_id) else {
            return Ok(None);
        };
        existing.salary = salary;
        existing.updated_at = Utc::now();
        let updated = existing.clone();

        self.write_users(&users)?;
        info!("Updated salary of user {}", user_id);
        Ok(Some(updated))
    }
}
