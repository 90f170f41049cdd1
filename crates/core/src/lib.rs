//! `ledgerflow-core` — domain foundation for the ledger.
//!
//! This crate contains **pure domain** types (no infrastructure concerns):
//! identifiers, fixed-point money, the account aggregate, and the
//! transaction intent/record model shared by the publisher and the
//! settlement consumer.

pub mod account;
pub mod error;
pub mod id;
pub mod money;
pub mod transaction;

pub use account::{Account, Currency};
pub use error::{DomainError, DomainResult};
pub use id::{AccountId, RecordId};
pub use money::Money;
pub use transaction::{TransactionIntent, TransactionKind, TransactionRecord};
