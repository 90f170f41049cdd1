//! `ledgerflow-events` — transaction intent transport.
//!
//! A partitioned, at-least-once publish/subscribe channel: intents are
//! published to a topic keyed by account, and consumer groups receive them
//! as [`Delivery`]s carrying an explicit commit handle. This crate is
//! transport only; intent semantics live in `ledgerflow-core` and
//! settlement lives in `ledgerflow-engine`.

pub mod channel;
pub mod memory;

pub use channel::{ChannelError, Delivery, EventChannel, Subscription};
pub use memory::InMemoryChannel;
