//! The module contains the errors the engine can return.
//!
//! Validation errors are always returned before anything is written. Only
//! two kinds mean that the store may have been left half-way:
//!
//! - [`LedgerInconsistent`] a transaction row may exist without the matching
//!   balance update.
//! - [`PurgeIncomplete`] the auth identity is gone but the profile data was
//!   not removed.
//!
//! Both need manual reconciliation.
//!
//!  [`LedgerInconsistent`]: EngineError::LedgerInconsistent
//!  [`PurgeIncomplete`]: EngineError::PurgeIncomplete
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),
    #[error("Concurrent update: {0}")]
    ConcurrentUpdate(String),
    #[error("Ledger inconsistent: {0}")]
    LedgerInconsistent(String),
    #[error("User has active commitments: {0}")]
    HasActiveCommitments(String),
    #[error("Purge incomplete: {0}")]
    PurgeIncomplete(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid role: {0}")]
    InvalidRole(String),
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Identity provider error: {0}")]
    Identity(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error(transparent)]
    Database(DbErr),
}

impl EngineError {
    /// `true` when nothing was written and the caller can simply retry or
    /// fix the request.
    pub fn is_clean_failure(&self) -> bool {
        !matches!(
            self,
            Self::LedgerInconsistent(_) | Self::PurgeIncomplete(_)
        )
    }
}

impl From<DbErr> for EngineError {
    fn from(value: DbErr) -> Self {
        match value {
            DbErr::ConnectionAcquire(err) => Self::StoreUnavailable(err.to_string()),
            DbErr::Conn(err) => Self::StoreUnavailable(err.to_string()),
            other => Self::Database(other),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::InsufficientPermissions(a), Self::InsufficientPermissions(b)) => a == b,
            (Self::ProfileNotFound(a), Self::ProfileNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::WalletNotFound(a), Self::WalletNotFound(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::ConfirmationRequired(a), Self::ConfirmationRequired(b)) => a == b,
            (Self::ConcurrentUpdate(a), Self::ConcurrentUpdate(b)) => a == b,
            (Self::LedgerInconsistent(a), Self::LedgerInconsistent(b)) => a == b,
            (Self::HasActiveCommitments(a), Self::HasActiveCommitments(b)) => a == b,
            (Self::PurgeIncomplete(a), Self::PurgeIncomplete(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidRole(a), Self::InvalidRole(b)) => a == b,
            (Self::InvalidStatus(a), Self::InvalidStatus(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::Identity(a), Self::Identity(b)) => a == b,
            (Self::StoreUnavailable(a), Self::StoreUnavailable(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_partial_writes_are_unclean() {
        assert!(EngineError::InsufficientFunds("w".to_string()).is_clean_failure());
        assert!(EngineError::HasActiveCommitments("u".to_string()).is_clean_failure());
        assert!(!EngineError::LedgerInconsistent("w".to_string()).is_clean_failure());
        assert!(!EngineError::PurgeIncomplete("u".to_string()).is_clean_failure());
    }

    #[test]
    fn query_errors_stay_database_errors() {
        let err = EngineError::from(DbErr::Custom("boom".to_string()));
        assert_eq!(err, EngineError::Database(DbErr::Custom("boom".to_string())));
    }
}
