//! Transaction intents (wire events) and settled records.
//!
//! An intent is a requested, not-yet-settled operation placed on the event
//! channel. A record is the immutable row appended to the transaction log
//! after the balance mutation durably committed.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::id::{AccountId, RecordId};
use crate::money::Money;

/// Closed set of operations the ledger settles.
///
/// The wire form is the lowercase string; anything else fails at
/// deserialization time rather than falling through a runtime string match.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    Transfer,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 3] = [
        TransactionKind::Deposit,
        TransactionKind::Withdraw,
        TransactionKind::Transfer,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
            TransactionKind::Transfer => "transfer",
        }
    }

    /// Channel topic that carries intents of this kind.
    pub const fn topic(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "account-deposit",
            TransactionKind::Withdraw => "account-withdraw",
            TransactionKind::Transfer => "account-transfer",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdraw" => Ok(TransactionKind::Withdraw),
            "transfer" => Ok(TransactionKind::Transfer),
            other => Err(DomainError::validation(format!(
                "unknown transaction type: {other}"
            ))),
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire event describing a requested transaction.
///
/// `event_id` is the idempotency key: delivery is at-least-once, and the
/// settlement consumer uses it to skip redelivered intents it has already
/// applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub event_id: Uuid,
    pub account_id: AccountId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_account: Option<AccountId>,
    pub amount: Money,
    pub transaction_type: TransactionKind,
    pub created_at: DateTime<Utc>,
}

impl TransactionIntent {
    pub fn deposit(account_id: AccountId, amount: Money) -> Self {
        Self::new(TransactionKind::Deposit, account_id, None, amount)
    }

    pub fn withdraw(account_id: AccountId, amount: Money) -> Self {
        Self::new(TransactionKind::Withdraw, account_id, None, amount)
    }

    pub fn transfer(from: AccountId, to: AccountId, amount: Money) -> Self {
        Self::new(TransactionKind::Transfer, from, Some(to), amount)
    }

    fn new(
        kind: TransactionKind,
        account_id: AccountId,
        related_account: Option<AccountId>,
        amount: Money,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            account_id,
            related_account,
            amount,
            transaction_type: kind,
            created_at: Utc::now(),
        }
    }

    /// Intents are keyed by source account so a given account's intents
    /// stay ordered within a topic.
    pub fn partition_key(&self) -> String {
        self.account_id.partition_key()
    }
}

/// An immutable, settled transaction row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: RecordId,
    pub account_id: AccountId,
    pub amount: Money,
    pub transaction_type: TransactionKind,
    pub event_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TransactionRecord {
    /// The view returned synchronously before settlement confirms; the log
    /// has not assigned an id yet.
    pub fn provisional(intent: &TransactionIntent) -> Self {
        Self {
            id: RecordId::UNASSIGNED,
            account_id: intent.account_id,
            amount: intent.amount,
            transaction_type: intent.transaction_type,
            event_id: intent.event_id,
            created_at: intent.created_at,
            deleted_at: None,
        }
    }

    /// A settled row for one leg of an intent, ready for the log to assign
    /// an id.
    pub fn settled(intent: &TransactionIntent, account_id: AccountId) -> Self {
        Self {
            id: RecordId::UNASSIGNED,
            account_id,
            amount: intent.amount,
            transaction_type: intent.transaction_type,
            event_id: intent.event_id,
            created_at: intent.created_at,
            deleted_at: None,
        }
    }
}
