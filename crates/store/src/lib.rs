//! `ledgerflow-store` — account and transaction-log persistence.
//!
//! Two storage contracts back the settlement pipeline:
//!
//! - [`AccountStore`]: the account aggregate plus atomic conditional
//!   balance mutations (the only way balances change).
//! - [`TransactionLog`]: the append-only record of settled transactions.
//!
//! Both are traits so backends can be swapped; the in-memory
//! implementations here are the test/dev backend and the reference
//! semantics.

pub mod account;
pub mod error;
pub mod log;
pub mod memory;

pub use account::{AccountStore, MutationOutcome, RejectReason};
pub use error::{StoreError, StoreResult};
pub use log::TransactionLog;
pub use memory::{InMemoryAccountStore, InMemoryTransactionLog};
