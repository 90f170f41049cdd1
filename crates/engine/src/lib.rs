//! `ledgerflow-engine` — the event-driven settlement pipeline.
//!
//! Writes flow through the engine asynchronously:
//!
//! ```text
//! Facade ── validate ──> IntentPublisher ── publish ──> EventChannel
//!                                                            │
//!                                      per-topic worker loop │ (at-least-once)
//!                                                            ▼
//!                          SettlementProcessor ── conditional mutation ──> AccountStore
//!                                   │
//!                                   └── append record ──> TransactionLog
//! ```
//!
//! Callers get a *provisional* record back immediately; a later settlement
//! failure is observable only through subsequent balance and history
//! queries. That eventual-consistency trade-off is deliberate. Reads
//! bypass the channel entirely.

pub mod config;
pub mod consumer;
pub mod error;
pub mod facade;
pub mod publisher;
pub mod settlement;

#[cfg(test)]
mod pipeline_tests;

pub use config::EngineConfig;
pub use consumer::{ConsumerHandle, SettlementConsumer};
pub use error::{EngineError, EngineResult};
pub use facade::LedgerFacade;
pub use publisher::IntentPublisher;
pub use settlement::{SettlementOutcome, SettlementProcessor, SkipReason};
