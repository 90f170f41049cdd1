//! Integration tests for the full settlement pipeline.
//!
//! Facade → IntentPublisher → EventChannel → SettlementProcessor →
//! AccountStore + TransactionLog, covering the ledger's correctness
//! guarantees: non-negative balances, all-or-nothing transfers,
//! per-account ordering, and duplicate-redelivery skipping.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ledgerflow_core::{AccountId, Currency, Money, TransactionKind};
use ledgerflow_events::{EventChannel, InMemoryChannel, Subscription};
use ledgerflow_store::{
    AccountStore, InMemoryAccountStore, InMemoryTransactionLog, RejectReason, TransactionLog,
};

use crate::config::EngineConfig;
use crate::consumer::SettlementConsumer;
use crate::error::EngineError;
use crate::facade::LedgerFacade;
use crate::settlement::{SettlementOutcome, SettlementProcessor, SkipReason};

const GROUP: &str = "test-settlement";

struct Harness {
    channel: Arc<InMemoryChannel>,
    accounts: Arc<InMemoryAccountStore>,
    log: Arc<InMemoryTransactionLog>,
    facade: LedgerFacade<Arc<InMemoryChannel>>,
    processor: SettlementProcessor,
}

fn setup() -> Harness {
    ledgerflow_observability::init_with_filter("warn");
    let channel = Arc::new(InMemoryChannel::new());
    let accounts = Arc::new(InMemoryAccountStore::new());
    let log = Arc::new(InMemoryTransactionLog::new());

    let accounts_dyn: Arc<dyn AccountStore> = accounts.clone();
    let log_dyn: Arc<dyn TransactionLog> = log.clone();

    let facade = LedgerFacade::new(
        channel.clone(),
        accounts_dyn.clone(),
        log_dyn.clone(),
        EngineConfig::default().with_consumer_group(GROUP),
    );
    let processor = SettlementProcessor::new(accounts_dyn, log_dyn);

    Harness {
        channel,
        accounts,
        log,
        facade,
        processor,
    }
}

impl Harness {
    fn open_account(&self, balance_minor: i64) -> AccountId {
        self.accounts
            .create(Currency::new("usd"), Money::from_minor_units(balance_minor))
            .unwrap()
            .id
    }

    fn balance(&self, id: AccountId) -> Money {
        self.accounts.get(id).unwrap().balance
    }

    /// Drain and settle everything currently queued, committing each
    /// delivery, the way a healthy worker would.
    fn settle_all(&self) {
        for kind in TransactionKind::ALL {
            let sub = self.channel.subscribe(kind.topic(), GROUP);
            while let Ok(delivery) = sub.try_recv() {
                self.processor.process(delivery.payload()).unwrap();
                delivery.commit().unwrap();
            }
        }
    }
}

fn money(major: f64) -> Money {
    Money::from_major(major).unwrap()
}

#[test]
fn withdraw_settles_and_appends_one_record() -> anyhow::Result<()> {
    let h = setup();
    let account = h.open_account(10_000); // 100.00

    let provisional = h.facade.withdraw(account, money(50.0))?;
    assert!(!provisional.id.is_assigned());
    assert_eq!(provisional.amount, money(50.0));

    // Not settled yet: reads bypass the queue and still see 100.00.
    assert_eq!(h.balance(account), money(100.0));

    h.settle_all();

    assert_eq!(h.balance(account), money(50.0));
    let history = h.facade.list_transactions(account)?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].transaction_type, TransactionKind::Withdraw);
    assert_eq!(history[0].amount, money(50.0));
    assert!(history[0].id.is_assigned());
    Ok(())
}

#[test]
fn insufficient_funds_at_settlement_drops_the_intent() {
    let h = setup();
    let account = h.open_account(1_000); // 10.00

    // The publisher cannot see insufficient funds (only settlement can),
    // so the synchronous call succeeds with a provisional record.
    h.facade.withdraw(account, money(50.0)).unwrap();
    h.settle_all();

    assert_eq!(h.balance(account), money(10.0));
    assert!(h.facade.list_transactions(account).unwrap().is_empty());
}

#[test]
fn transfer_applies_both_legs_and_records_each() {
    let h = setup();
    let a = h.open_account(10_000); // 100.00
    let b = h.open_account(0);

    h.facade.transfer(a, b, money(30.0)).unwrap();
    h.settle_all();

    assert_eq!(h.balance(a), money(70.0));
    assert_eq!(h.balance(b), money(30.0));

    let a_history = h.facade.list_transactions(a).unwrap();
    let b_history = h.facade.list_transactions(b).unwrap();
    assert_eq!(a_history.len(), 1);
    assert_eq!(b_history.len(), 1);
    assert_eq!(a_history[0].transaction_type, TransactionKind::Transfer);
    assert_eq!(b_history[0].transaction_type, TransactionKind::Transfer);
    assert_eq!(a_history[0].event_id, b_history[0].event_id);
}

#[test]
fn rejected_transfer_is_all_or_nothing() {
    let h = setup();
    let a = h.open_account(1_000); // 10.00
    let b = h.open_account(0);

    h.facade.transfer(a, b, money(50.0)).unwrap();
    h.settle_all();

    assert_eq!(h.balance(a), money(10.0));
    assert_eq!(h.balance(b), money(0.0));
    assert!(h.facade.list_transactions(a).unwrap().is_empty());
    assert!(h.facade.list_transactions(b).unwrap().is_empty());
}

#[test]
fn negative_deposit_is_rejected_before_publish() {
    let h = setup();
    let account = h.open_account(0);

    let err = h.facade.deposit(account, money(-5.0)).unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // Nothing reached the channel.
    assert_eq!(h.channel.topic_len(TransactionKind::Deposit.topic()), 0);
}

#[test]
fn self_transfer_is_rejected_before_publish() {
    let h = setup();
    let account = h.open_account(10_000);

    let err = h.facade.transfer(account, account, money(10.0)).unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("cannot transfer to the same account".to_string())
    );
    assert_eq!(h.channel.topic_len(TransactionKind::Transfer.topic()), 0);
}

#[test]
fn publish_is_rejected_for_missing_or_inactive_accounts() {
    let h = setup();
    let missing = AccountId::new(404);
    let err = h.facade.deposit(missing, money(1.0)).unwrap_err();
    assert_eq!(err, EngineError::Rejected(RejectReason::AccountNotFound));

    let deleted = h.open_account(0);
    h.accounts.soft_delete(deleted).unwrap();
    let err = h.facade.deposit(deleted, money(1.0)).unwrap_err();
    assert_eq!(err, EngineError::Rejected(RejectReason::AccountDeleted));

    let locked = h.open_account(0);
    h.accounts.set_locked(locked, true).unwrap();
    let err = h.facade.withdraw(locked, money(1.0)).unwrap_err();
    assert_eq!(err, EngineError::Rejected(RejectReason::AccountLocked));
}

#[test]
fn account_deleted_between_publish_and_settlement_is_dropped() {
    let h = setup();
    let account = h.open_account(10_000);

    h.facade.withdraw(account, money(10.0)).unwrap();
    // Settlement can run arbitrarily later; state changed meanwhile.
    h.accounts.soft_delete(account).unwrap();
    h.settle_all();

    assert_eq!(h.balance(account), money(100.0));
    assert!(h.facade.list_transactions(account).unwrap().is_empty());
}

#[test]
fn same_account_intents_settle_in_publish_order() {
    let h = setup();
    let account = h.open_account(10_000); // 100.00

    // Two withdrawals on one topic, keyed to the same account. Settled in
    // publish order, the 60.00 applies and the 50.00 is rejected; the
    // reverse order would leave a different balance (50.00), so this pins
    // the ordering guarantee.
    h.facade.withdraw(account, money(60.0)).unwrap();
    h.facade.withdraw(account, money(50.0)).unwrap();
    h.settle_all();

    assert_eq!(h.balance(account), money(40.0));
    let history = h.facade.list_transactions(account).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].amount, money(60.0));
}

#[test]
fn history_lists_settlements_most_recent_first() {
    let h = setup();
    let account = h.open_account(0);

    h.facade.deposit(account, money(10.0)).unwrap();
    h.facade.deposit(account, money(20.0)).unwrap();
    h.settle_all();

    let history = h.facade.list_transactions(account).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].amount, money(20.0));
    assert_eq!(history[1].amount, money(10.0));
}

#[test]
fn duplicate_redelivery_is_skipped_not_double_applied() {
    let h = setup();
    let account = h.open_account(0);
    h.facade.deposit(account, money(25.0)).unwrap();

    let topic = TransactionKind::Deposit.topic();
    let sub: Subscription = h.channel.subscribe(topic, GROUP);

    // Process the delivery but crash before committing it.
    let delivery = sub.try_recv().unwrap();
    let outcome = h.processor.process(delivery.payload()).unwrap();
    assert_eq!(outcome, SettlementOutcome::Applied);
    drop(delivery);

    // The transport redelivers; the idempotency key skips the replay.
    h.channel.redeliver_uncommitted(topic, GROUP).unwrap();
    let redelivered = sub.try_recv().unwrap();
    let outcome = h.processor.process(redelivered.payload()).unwrap();
    assert_eq!(outcome, SettlementOutcome::Skipped(SkipReason::Duplicate));
    redelivered.commit().unwrap();

    assert_eq!(h.balance(account), money(25.0));
    assert_eq!(h.facade.list_transactions(account).unwrap().len(), 1);
}

#[test]
fn malformed_payload_is_skipped_and_the_partition_continues() {
    let h = setup();
    let account = h.open_account(0);

    let topic = TransactionKind::Deposit.topic();
    h.channel.publish(topic, "1", b"{ not json").unwrap();
    h.facade.deposit(account, money(5.0)).unwrap();

    let sub = h.channel.subscribe(topic, GROUP);

    let bad = sub.try_recv().unwrap();
    let outcome = h.processor.process(bad.payload()).unwrap();
    assert!(matches!(
        outcome,
        SettlementOutcome::Skipped(SkipReason::Malformed(_))
    ));
    bad.commit().unwrap();

    let good = sub.try_recv().unwrap();
    assert_eq!(
        h.processor.process(good.payload()).unwrap(),
        SettlementOutcome::Applied
    );
    good.commit().unwrap();

    assert_eq!(h.balance(account), money(5.0));
}

#[test]
fn transfer_intent_without_related_account_is_skipped() {
    let h = setup();
    let account = h.open_account(10_000);

    // Hand-crafted wire payload missing related_account.
    let raw = format!(
        r#"{{
            "event_id": "018f0000-0000-7000-8000-000000000001",
            "account_id": {account},
            "amount": 10.0,
            "transaction_type": "transfer",
            "created_at": "2026-01-01T00:00:00Z"
        }}"#
    );
    let outcome = h.processor.process(raw.as_bytes()).unwrap();
    assert!(matches!(
        outcome,
        SettlementOutcome::Skipped(SkipReason::Malformed(_))
    ));
    assert_eq!(h.balance(account), money(100.0));
}

#[test]
fn spawned_workers_settle_and_shut_down_cleanly() {
    let h = setup();
    let account = h.open_account(0);

    let config = EngineConfig::default()
        .with_consumer_group(GROUP)
        .with_poll_tick(Duration::from_millis(5));
    let accounts_dyn: Arc<dyn AccountStore> = h.accounts.clone();
    let log_dyn: Arc<dyn TransactionLog> = h.log.clone();
    let processor = Arc::new(SettlementProcessor::new(accounts_dyn, log_dyn));
    let handle = SettlementConsumer::spawn(&h.channel, processor, &config);

    // Two deposits: workers for different topics run concurrently, so the
    // assertion must not depend on cross-topic ordering.
    h.facade.deposit(account, money(7.5)).unwrap();
    h.facade.deposit(account, money(2.5)).unwrap();

    // Workers settle asynchronously; poll with a deadline.
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if h.balance(account) == money(10.0) {
            break;
        }
        assert!(Instant::now() < deadline, "workers did not settle in time");
        std::thread::sleep(Duration::from_millis(5));
    }

    handle.shutdown();
    assert_eq!(h.facade.list_transactions(account).unwrap().len(), 2);
}
