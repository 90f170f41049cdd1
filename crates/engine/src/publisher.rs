//! Intent publisher.
//!
//! Validates a requested operation against current account state, then
//! publishes the serialized intent keyed by source account. The ordering
//! of those two steps is the publisher's whole contract: **no store
//! mutation happens before a successful durable publish**, so a lost
//! intent can never corrupt the ledger. Settlement re-checks the same
//! preconditions because it can run arbitrarily later.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use ledgerflow_core::{AccountId, Money, TransactionIntent, TransactionRecord};
use ledgerflow_events::EventChannel;
use ledgerflow_store::{AccountStore, RejectReason, StoreError};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

pub struct IntentPublisher<C> {
    channel: C,
    accounts: Arc<dyn AccountStore>,
    config: EngineConfig,
}

impl<C: EventChannel> IntentPublisher<C> {
    pub fn new(channel: C, accounts: Arc<dyn AccountStore>, config: EngineConfig) -> Self {
        Self {
            channel,
            accounts,
            config,
        }
    }

    pub fn deposit(&self, account_id: AccountId, amount: Money) -> EngineResult<TransactionRecord> {
        ensure_positive(amount, "deposit")?;
        self.check_account_active(account_id)?;
        self.publish_intent(TransactionIntent::deposit(account_id, amount))
    }

    pub fn withdraw(
        &self,
        account_id: AccountId,
        amount: Money,
    ) -> EngineResult<TransactionRecord> {
        ensure_positive(amount, "withdraw")?;
        self.check_account_active(account_id)?;
        self.publish_intent(TransactionIntent::withdraw(account_id, amount))
    }

    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Money,
    ) -> EngineResult<TransactionRecord> {
        ensure_positive(amount, "transfer")?;
        if from == to {
            return Err(EngineError::validation("cannot transfer to the same account"));
        }
        self.check_account_active(from)?;
        self.check_account_active(to)?;
        self.publish_intent(TransactionIntent::transfer(from, to, amount))
    }

    fn publish_intent(&self, intent: TransactionIntent) -> EngineResult<TransactionRecord> {
        let payload = serde_json::to_vec(&intent)
            .map_err(|e| EngineError::transport(format!("serialize intent: {e}")))?;

        let topic = intent.transaction_type.topic();
        let started = Instant::now();
        self.channel
            .publish(topic, &intent.partition_key(), &payload)
            .map_err(|e| {
                warn!(topic, error = %e, "intent publish failed");
                EngineError::transport(e.to_string())
            })?;

        let elapsed = started.elapsed();
        if elapsed > self.config.publish_timeout {
            warn!(
                topic,
                elapsed_ms = elapsed.as_millis() as u64,
                "publish exceeded the configured bound"
            );
        }
        info!(
            topic,
            event_id = %intent.event_id,
            account_id = %intent.account_id,
            amount = %intent.amount,
            "intent published"
        );

        Ok(TransactionRecord::provisional(&intent))
    }

    /// The publisher-side precondition: the account exists, is unlocked
    /// and not soft-deleted. Settlement duplicates this check because
    /// state can change between publish and apply.
    fn check_account_active(&self, id: AccountId) -> EngineResult<()> {
        let account = match self.accounts.get(id) {
            Ok(account) => account,
            Err(StoreError::NotFound) => {
                debug!(account_id = %id, "publish rejected: account not found");
                return Err(EngineError::Rejected(RejectReason::AccountNotFound));
            }
            Err(other) => return Err(EngineError::Store(other)),
        };

        if account.deleted_at.is_some() {
            return Err(EngineError::Rejected(RejectReason::AccountDeleted));
        }
        if account.is_locked {
            return Err(EngineError::Rejected(RejectReason::AccountLocked));
        }
        Ok(())
    }
}

fn ensure_positive(amount: Money, operation: &str) -> EngineResult<()> {
    if !amount.is_positive() {
        return Err(EngineError::validation(format!(
            "{operation} amount must be greater than zero"
        )));
    }
    Ok(())
}
