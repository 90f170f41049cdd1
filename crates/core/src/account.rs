//! The account aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::AccountId;
use crate::money::Money;

/// Currency code carried on accounts and intents.
///
/// Stored as an opaque lowercase code; conversion between currencies is out
/// of scope for the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An account whose balance is mutated only by the settlement consumer.
///
/// The balance invariant (never negative after a committed mutation) is
/// enforced by the store's conditional updates, not here; this type is the
/// persisted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: Money,
    pub currency: Currency,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Whether the account may participate in transactions.
    pub fn is_active(&self) -> bool {
        !self.is_locked && self.deleted_at.is_none()
    }
}
