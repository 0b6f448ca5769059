use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: Uuid,
    },

    #[error("invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("{entity} transition {from} -> {to} rejected: {reason}")]
    GuardRejected {
        entity: &'static str,
        from: String,
        to: String,
        reason: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("invalid amount {amount}: {message}")]
    InvalidAmount {
        amount: Money,
        message: String,
    },

    #[error("invalid deduction {category}: amount {amount} is negative")]
    InvalidDeduction {
        category: String,
        amount: Money,
    },

    #[error("invalid deposit: {amount} is negative")]
    InvalidDeposit {
        amount: Money,
    },

    #[error("lease {lease_id} is already terminated")]
    AlreadyTerminated {
        lease_id: Uuid,
    },

    #[error("lease {lease_id} is already checked out")]
    AlreadyCheckedOut {
        lease_id: Uuid,
    },

    #[error("concurrent modification of {entity} {id}: expected version {expected:?}, found {found:?}")]
    ConcurrentModification {
        entity: &'static str,
        id: Uuid,
        expected: Option<u64>,
        found: Option<u64>,
    },

    #[error("{entity} {id} is written more than once in one commit")]
    DuplicateWrite {
        entity: &'static str,
        id: Uuid,
    },

    #[error("expiration notice already recorded for lease {lease_id} at {threshold_days} days")]
    DuplicateNotice {
        lease_id: Uuid,
        threshold_days: u32,
    },

    #[error("notification failed: {message}")]
    NotificationFailed {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("serialization error: {message}")]
    Serialization {
        message: String,
    },
}

impl LifecycleError {
    /// helper for date validation failures
    pub fn invalid_date(message: impl Into<String>) -> Self {
        LifecycleError::InvalidDate {
            message: message.into(),
        }
    }

    /// end date must come strictly after the reference date
    pub fn ensure_after(end: NaiveDate, reference: NaiveDate, what: &str) -> Result<()> {
        if end <= reference {
            return Err(LifecycleError::invalid_date(format!(
                "{what} {end} must be after {reference}"
            )));
        }
        Ok(())
    }

    /// true for optimistic-lock style conflicts the caller may retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LifecycleError::ConcurrentModification { .. } | LifecycleError::DuplicateNotice { .. }
        )
    }
}

impl From<serde_json::Error> for LifecycleError {
    fn from(err: serde_json::Error) -> Self {
        LifecycleError::Serialization {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
