//! Ledger facade: the synchronous entry point the REST layer calls.
//!
//! Writes validate and publish, returning a provisional record before
//! settlement; reads go straight to the stores and never touch the
//! channel.

use std::sync::Arc;

use ledgerflow_core::{Account, AccountId, Money, TransactionRecord};
use ledgerflow_events::EventChannel;
use ledgerflow_store::{AccountStore, TransactionLog, log::DEFAULT_LIST_LIMIT};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::publisher::IntentPublisher;

pub struct LedgerFacade<C> {
    publisher: IntentPublisher<C>,
    accounts: Arc<dyn AccountStore>,
    log: Arc<dyn TransactionLog>,
}

impl<C: EventChannel> LedgerFacade<C> {
    pub fn new(
        channel: C,
        accounts: Arc<dyn AccountStore>,
        log: Arc<dyn TransactionLog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            publisher: IntentPublisher::new(channel, accounts.clone(), config),
            accounts,
            log,
        }
    }

    /// Queue a deposit; the returned record is provisional until settled.
    pub fn deposit(&self, account_id: AccountId, amount: Money) -> EngineResult<TransactionRecord> {
        self.publisher.deposit(account_id, amount)
    }

    /// Queue a withdrawal; the returned record is provisional until
    /// settled. Insufficient funds at settlement time surface only through
    /// later queries.
    pub fn withdraw(
        &self,
        account_id: AccountId,
        amount: Money,
    ) -> EngineResult<TransactionRecord> {
        self.publisher.withdraw(account_id, amount)
    }

    /// Queue a transfer between two distinct active accounts.
    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Money,
    ) -> EngineResult<TransactionRecord> {
        self.publisher.transfer(from, to, amount)
    }

    /// Settled history for an account, most recent first.
    pub fn list_transactions(&self, account_id: AccountId) -> EngineResult<Vec<TransactionRecord>> {
        Ok(self.log.list_by_account(account_id, DEFAULT_LIST_LIMIT)?)
    }

    pub fn get_account(&self, account_id: AccountId) -> EngineResult<Account> {
        Ok(self.accounts.get(account_id)?)
    }
}
