//! Domain model for a registered principal.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    /// bcrypt hash, salt and cost included
    pub password_hash: String,
    /// Denormalised amount of the latest salary period
    pub salary: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn generate_id(timestamp_millis: u64) -> String {
        format!("user-{}-{}", timestamp_millis, uuid::Uuid::new_v4().simple())
    }
}
