//! Account store contract.

use ledgerflow_core::{Account, AccountId, Currency, Money};

use crate::error::StoreResult;

/// Why a conditional mutation had no effect.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RejectReason {
    InsufficientFunds,
    AccountLocked,
    AccountDeleted,
    AccountNotFound,
}

impl core::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            RejectReason::InsufficientFunds => "insufficient funds",
            RejectReason::AccountLocked => "account is locked",
            RejectReason::AccountDeleted => "account is deleted",
            RejectReason::AccountNotFound => "account not found",
        };
        f.write_str(msg)
    }
}

/// Result of a conditional mutation.
///
/// `Rejected` is a business outcome, distinct from infrastructure errors:
/// the guard predicate did not hold, the store was untouched, and retrying
/// the same intent will not help.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use = "a rejected mutation left the store untouched"]
pub enum MutationOutcome {
    Applied,
    Rejected(RejectReason),
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied)
    }
}

/// Persists accounts and exposes atomic conditional balance mutations.
///
/// The conditional operations are the ledger's per-row lock: concurrent
/// settlement partitions touching different accounts are serialized only
/// here. `transfer` runs both legs in one atomic unit so no reader ever
/// observes a half-applied transfer.
pub trait AccountStore: Send + Sync {
    fn get(&self, id: AccountId) -> StoreResult<Account>;

    /// Add `amount` iff the account exists, is unlocked and not deleted.
    fn conditional_credit(&self, id: AccountId, amount: Money) -> StoreResult<MutationOutcome>;

    /// Subtract `amount` iff the account exists, is unlocked, not deleted,
    /// and its balance covers `amount`. Balances never go negative;
    /// violating debits are rejected, never clamped.
    fn conditional_debit(&self, id: AccountId, amount: Money) -> StoreResult<MutationOutcome>;

    /// One debit on `from` plus one credit on `to`, atomically: either both
    /// legs commit or neither is visible.
    fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Money,
    ) -> StoreResult<MutationOutcome>;

    // Account lifecycle, driven by the external CRUD surface.

    fn create(&self, currency: Currency, opening_balance: Money) -> StoreResult<Account>;

    fn soft_delete(&self, id: AccountId) -> StoreResult<()>;

    fn list(&self, offset: usize, limit: usize) -> StoreResult<(Vec<Account>, usize)>;
}
