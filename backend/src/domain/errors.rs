//! Error taxonomy shared by the domain services.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExpenseError {
    /// Bad input, rejected before any mutation is attempted
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// Missing, invalid or expired credential
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Conflict(String),
    /// A fetch finished after its owner scope had been replaced
    #[error("Scope '{0}' was replaced before the fetch completed")]
    StaleScope(String),
    /// Storage or transport failure
    #[error(transparent)]
    Server(#[from] anyhow::Error),
}

impl ExpenseError {
    pub fn validation(message: impl Into<String>) -> Self {
        ExpenseError::Validation(message.into())
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ExpenseError::Auth(_))
    }
}

pub type DomainResult<T> = std::result::Result<T, ExpenseError>;
