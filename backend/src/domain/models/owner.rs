//! Owner scope: whose expenses a request addresses.
use serde::{Deserialize, Serialize};

use crate::config::IdentityStrategy;

/// Dashboard session slot shared by every sync key of this installation
pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerScope {
    /// Anonymous per-device sync key
    SyncKey(String),
    /// Authenticated principal
    User { id: String, username: String },
}

impl OwnerScope {
    /// Key used to partition stored records
    pub fn key(&self) -> &str {
        match self {
            OwnerScope::SyncKey(key) => key,
            OwnerScope::User { id, .. } => id,
        }
    }

    /// Whose dashboard session the scope lives in. All sync keys belong to the
    /// one device; each user has their own.
    pub fn principal_key(&self) -> &str {
        match self {
            OwnerScope::SyncKey(_) => ANONYMOUS_PRINCIPAL,
            OwnerScope::User { id, .. } => id,
        }
    }

    pub fn strategy(&self) -> IdentityStrategy {
        match self {
            OwnerScope::SyncKey(_) => IdentityStrategy::Anonymous,
            OwnerScope::User { .. } => IdentityStrategy::Authenticated,
        }
    }
}
