//! Per-delivery settlement logic.
//!
//! [`SettlementProcessor::process`] is the pure(ish) core the worker loops
//! drive: it deserializes one intent, applies it through the account
//! store's conditional mutations and appends the settled record(s). It is
//! deliberately side-effect free on every skip path, which is what makes
//! at-least-once delivery safe to sit in front of it.

use std::sync::Arc;

use tracing::{error, info, warn};

use ledgerflow_core::{TransactionIntent, TransactionKind, TransactionRecord};
use ledgerflow_store::{AccountStore, MutationOutcome, RejectReason, StoreError, TransactionLog};

/// Why a delivery was consumed without mutating any balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Payload did not deserialize into an intent.
    Malformed(String),
    /// The intent's event id was already applied (at-least-once
    /// redelivery).
    Duplicate,
    /// A business precondition failed at settlement time. Intentionally
    /// not retried: funds state may have changed since publish, and blind
    /// retry of a stale intent is unsafe.
    Rejected(RejectReason),
}

/// Outcome of processing one delivery.
///
/// Both variants mean the delivery is done and may be committed;
/// infrastructure failures surface as `Err` instead, leaving the delivery
/// uncommitted for redelivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    Applied,
    Skipped(SkipReason),
}

pub struct SettlementProcessor {
    accounts: Arc<dyn AccountStore>,
    log: Arc<dyn TransactionLog>,
}

impl SettlementProcessor {
    pub fn new(accounts: Arc<dyn AccountStore>, log: Arc<dyn TransactionLog>) -> Self {
        Self { accounts, log }
    }

    /// Apply one raw delivery payload.
    ///
    /// Dedup happens before the mutation: if the log already holds a record
    /// for this event id the delivery is a redelivery and is skipped, so a
    /// crash between processing and commit does not double-apply. A crash
    /// between the balance commit and the record append is the residual
    /// window; see the drift note on [`Self::append_records`].
    pub fn process(&self, payload: &[u8]) -> Result<SettlementOutcome, StoreError> {
        let intent: TransactionIntent = match serde_json::from_slice(payload) {
            Ok(intent) => intent,
            Err(e) => {
                warn!(error = %e, "skipping malformed intent payload");
                return Ok(SettlementOutcome::Skipped(SkipReason::Malformed(
                    e.to_string(),
                )));
            }
        };

        if self.log.has_event(intent.event_id)? {
            info!(event_id = %intent.event_id, "skipping duplicate intent delivery");
            return Ok(SettlementOutcome::Skipped(SkipReason::Duplicate));
        }

        let outcome = match intent.transaction_type {
            TransactionKind::Deposit => {
                self.accounts.conditional_credit(intent.account_id, intent.amount)?
            }
            TransactionKind::Withdraw => {
                self.accounts.conditional_debit(intent.account_id, intent.amount)?
            }
            TransactionKind::Transfer => {
                let Some(to) = intent.related_account else {
                    warn!(
                        event_id = %intent.event_id,
                        "skipping transfer intent without related account"
                    );
                    return Ok(SettlementOutcome::Skipped(SkipReason::Malformed(
                        "transfer intent missing related_account".to_string(),
                    )));
                };
                self.accounts.transfer(intent.account_id, to, intent.amount)?
            }
        };

        match outcome {
            MutationOutcome::Applied => {
                self.append_records(&intent);
                info!(
                    event_id = %intent.event_id,
                    kind = %intent.transaction_type,
                    account_id = %intent.account_id,
                    amount = %intent.amount,
                    "intent settled"
                );
                Ok(SettlementOutcome::Applied)
            }
            MutationOutcome::Rejected(reason) => {
                warn!(
                    event_id = %intent.event_id,
                    kind = %intent.transaction_type,
                    account_id = %intent.account_id,
                    %reason,
                    "intent rejected at settlement"
                );
                Ok(SettlementOutcome::Skipped(SkipReason::Rejected(reason)))
            }
        }
    }

    /// Append the settled record(s): one for deposit/withdraw, one per leg
    /// for transfer, all sharing the intent's event id.
    ///
    /// The balance has already committed when this runs. An append failure
    /// here is tolerated as drift rather than rolled back: it is logged at
    /// error level and the delivery still commits, so the balance stays
    /// authoritative and only the history row is missing.
    fn append_records(&self, intent: &TransactionIntent) {
        let mut legs = vec![intent.account_id];
        if intent.transaction_type == TransactionKind::Transfer {
            if let Some(to) = intent.related_account {
                legs.push(to);
            }
        }

        for account_id in legs {
            let record = TransactionRecord::settled(intent, account_id);
            if let Err(e) = self.log.append(record) {
                error!(
                    event_id = %intent.event_id,
                    account_id = %account_id,
                    error = %e,
                    "balance committed but record append failed; history is missing a row"
                );
            }
        }
    }
}
