//! Store infrastructure errors.
//!
//! Business rejections (insufficient funds, locked account, ...) are *not*
//! errors; they are the [`crate::MutationOutcome::Rejected`] signal. This
//! enum covers the infrastructure failures around them.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced row does not exist (read path).
    #[error("not found")]
    NotFound,

    /// The backend failed (lock poisoned, connection lost, ...).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
