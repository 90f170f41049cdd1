//! In-memory store backends.
//!
//! Reference semantics for the storage contracts. Atomicity comes from
//! holding one write guard across a whole mutation: a transfer's two legs
//! run under a single guard, so readers see both or neither.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use ledgerflow_core::{Account, AccountId, Currency, Money, RecordId, TransactionRecord};

use crate::account::{AccountStore, MutationOutcome, RejectReason};
use crate::error::{StoreError, StoreResult};
use crate::log::TransactionLog;

#[derive(Debug, Default)]
struct AccountsState {
    accounts: HashMap<AccountId, Account>,
    next_id: i64,
}

/// In-memory account store.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    inner: RwLock<AccountsState>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock or unlock an account. Admin-surface operation; locked accounts
    /// reject every conditional mutation.
    pub fn set_locked(&self, id: AccountId, locked: bool) -> StoreResult<()> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        let account = state.accounts.get_mut(&id).ok_or(StoreError::NotFound)?;
        account.is_locked = locked;
        Ok(())
    }

    /// Guard check shared by debit and credit; `None` means the guards
    /// hold and the mutation may proceed.
    fn check_active(account: Option<&Account>) -> Option<RejectReason> {
        match account {
            None => Some(RejectReason::AccountNotFound),
            Some(a) if a.deleted_at.is_some() => Some(RejectReason::AccountDeleted),
            Some(a) if a.is_locked => Some(RejectReason::AccountLocked),
            Some(_) => None,
        }
    }

    fn debit_in_place(
        state: &mut AccountsState,
        id: AccountId,
        amount: Money,
    ) -> StoreResult<MutationOutcome> {
        if let Some(reason) = Self::check_active(state.accounts.get(&id)) {
            return Ok(MutationOutcome::Rejected(reason));
        }
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or_else(|| StoreError::backend("account vanished under write guard"))?;
        if account.balance < amount {
            return Ok(MutationOutcome::Rejected(RejectReason::InsufficientFunds));
        }
        account.balance = account
            .balance
            .checked_sub(amount)
            .ok_or_else(|| StoreError::backend("balance underflow"))?;
        Ok(MutationOutcome::Applied)
    }

    fn credit_in_place(
        state: &mut AccountsState,
        id: AccountId,
        amount: Money,
    ) -> StoreResult<MutationOutcome> {
        if let Some(reason) = Self::check_active(state.accounts.get(&id)) {
            return Ok(MutationOutcome::Rejected(reason));
        }
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or_else(|| StoreError::backend("account vanished under write guard"))?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| StoreError::backend("balance overflow"))?;
        Ok(MutationOutcome::Applied)
    }
}

impl AccountStore for InMemoryAccountStore {
    fn get(&self, id: AccountId) -> StoreResult<Account> {
        let state = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        state.accounts.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn conditional_credit(&self, id: AccountId, amount: Money) -> StoreResult<MutationOutcome> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Self::credit_in_place(&mut state, id, amount)
    }

    fn conditional_debit(&self, id: AccountId, amount: Money) -> StoreResult<MutationOutcome> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Self::debit_in_place(&mut state, id, amount)
    }

    fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Money,
    ) -> StoreResult<MutationOutcome> {
        // Both legs under one write guard: the transaction boundary.
        let mut state = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        // Validate the credit leg before touching the debit leg so a
        // failure leaves nothing applied.
        if let Some(reason) = Self::check_active(state.accounts.get(&to)) {
            return Ok(MutationOutcome::Rejected(reason));
        }

        match Self::debit_in_place(&mut state, from, amount)? {
            MutationOutcome::Applied => {}
            rejected => return Ok(rejected),
        }
        match Self::credit_in_place(&mut state, to, amount)? {
            MutationOutcome::Applied => Ok(MutationOutcome::Applied),
            // Unreachable given the pre-check; undo the debit to keep the
            // all-or-nothing guarantee regardless.
            rejected => {
                Self::credit_in_place(&mut state, from, amount)?;
                Ok(rejected)
            }
        }
    }

    fn create(&self, currency: Currency, opening_balance: Money) -> StoreResult<Account> {
        if opening_balance.is_negative() {
            return Err(StoreError::backend("opening balance cannot be negative"));
        }
        let mut state = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        state.next_id += 1;
        let account = Account {
            id: AccountId::new(state.next_id),
            balance: opening_balance,
            currency,
            is_locked: false,
            created_at: Utc::now(),
            deleted_at: None,
        };
        state.accounts.insert(account.id, account.clone());
        debug!(account_id = %account.id, "account created");
        Ok(account)
    }

    fn soft_delete(&self, id: AccountId) -> StoreResult<()> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        let account = state.accounts.get_mut(&id).ok_or(StoreError::NotFound)?;
        account.deleted_at = Some(Utc::now());
        Ok(())
    }

    fn list(&self, offset: usize, limit: usize) -> StoreResult<(Vec<Account>, usize)> {
        let state = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        let total = state.accounts.len();
        let mut accounts: Vec<Account> = state.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok((accounts.into_iter().skip(offset).take(limit).collect(), total))
    }
}

#[derive(Debug, Default)]
struct LogState {
    records: Vec<TransactionRecord>,
    applied_events: HashSet<Uuid>,
    next_id: i64,
}

/// In-memory append-only transaction log.
#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    inner: RwLock<LogState>,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionLog for InMemoryTransactionLog {
    fn append(&self, mut record: TransactionRecord) -> StoreResult<RecordId> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        state.next_id += 1;
        record.id = RecordId::new(state.next_id);
        let id = record.id;
        state.applied_events.insert(record.event_id);
        state.records.push(record);
        Ok(id)
    }

    fn list_by_account(&self, id: AccountId, limit: usize) -> StoreResult<Vec<TransactionRecord>> {
        let state = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        // Append order is chronological; walk it backwards for
        // most-recent-first.
        Ok(state
            .records
            .iter()
            .rev()
            .filter(|r| r.account_id == id && r.deleted_at.is_none())
            .take(limit)
            .cloned()
            .collect())
    }

    fn has_event(&self, event_id: Uuid) -> StoreResult<bool> {
        let state = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(state.applied_events.contains(&event_id))
    }
}
