//! Engine error taxonomy.
//!
//! Three caller-visible classes, matching how the ledger reports failures:
//!
//! - `Validation` — rejected before anything was published; never reaches
//!   the channel.
//! - `Rejected` — a business precondition failed (locked, deleted,
//!   missing, insufficient funds); terminal for that request.
//! - `Transport` — publishing failed; retryable, and because nothing is
//!   mutated before a successful publish, retrying is always safe.

use thiserror::Error;

use ledgerflow_core::DomainError;
use ledgerflow_store::{RejectReason, StoreError};

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("transaction rejected: {0}")]
    Rejected(RejectReason),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error(transparent)]
    Store(StoreError),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Whether retrying the same call can succeed without anything else
    /// changing first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Transport(_))
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            // A missing account on the synchronous path is a business
            // rejection, not an infrastructure fault.
            StoreError::NotFound => EngineError::Rejected(RejectReason::AccountNotFound),
            other => EngineError::Store(other),
        }
    }
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound => EngineError::Rejected(RejectReason::AccountNotFound),
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                EngineError::Validation(msg)
            }
        }
    }
}
