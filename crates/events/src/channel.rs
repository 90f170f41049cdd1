//! Event channel contract (mechanics only).
//!
//! The channel is the transport between the intent publisher and the
//! settlement consumer. It makes deliberately few promises:
//!
//! - **Durable publish**: `publish` returns only after the message is
//!   accepted by the transport; a failed publish leaves the ledger
//!   untouched because nothing is mutated before publishing.
//! - **At-least-once delivery**: a delivery is only consumed once its
//!   commit handle is invoked. A consumer that crashes mid-processing
//!   leaves the message uncommitted, and the transport redelivers it.
//! - **Per-key ordering**: messages published with the same partition key
//!   on the same topic are delivered in publish order.
//!
//! Consumers therefore must tolerate duplicates; the ledger does so with
//! the intent's idempotency key.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use thiserror::Error;

/// Transport-level failure. These are retryable from the consumer loop's
/// perspective; they never describe a business outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel (or its internal lock) is no longer usable.
    #[error("channel closed")]
    Closed,

    /// Internal state was poisoned by a panicking writer.
    #[error("channel state poisoned")]
    Poisoned,

    /// A commit referenced a topic/group the channel does not know.
    #[error("unknown subscription: topic={topic} group={group}")]
    UnknownSubscription { topic: String, group: String },
}

/// Commit callback invoked when a delivery has been fully processed.
pub(crate) type CommitFn = Box<dyn FnOnce() -> Result<(), ChannelError> + Send>;

/// A single received message plus its acknowledgment handle.
///
/// Dropping a delivery without calling [`Delivery::commit`] leaves it
/// uncommitted: the transport will present it again (redelivery). Commit
/// only after every side effect of processing has been applied.
pub struct Delivery {
    key: String,
    payload: Vec<u8>,
    commit: CommitFn,
}

impl Delivery {
    pub(crate) fn new(key: String, payload: Vec<u8>, commit: CommitFn) -> Self {
        Self {
            key,
            payload,
            commit,
        }
    }

    /// Partition key the message was published with.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Acknowledge the delivery. Consumes the handle; a delivery is
    /// committed at most once.
    pub fn commit(self) -> Result<(), ChannelError> {
        (self.commit)()
    }
}

impl core::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Delivery")
            .field("key", &self.key)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

/// A consumer-group subscription to one topic.
///
/// Designed for a single sequential receive-process loop: `recv_timeout`
/// lets the loop wake up periodically to observe a cancellation signal
/// between receives.
#[derive(Debug)]
pub struct Subscription {
    receiver: Receiver<Delivery>,
}

impl Subscription {
    pub fn new(receiver: Receiver<Delivery>) -> Self {
        Self { receiver }
    }

    /// Block until the next delivery is available.
    pub fn recv(&self) -> Result<Delivery, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a delivery without blocking.
    pub fn try_recv(&self) -> Result<Delivery, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a delivery.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Delivery, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Ordered, partitioned, at-least-once intent transport.
pub trait EventChannel: Send + Sync {
    /// Publish `payload` to `topic` under a partition key. Returning `Ok`
    /// is the durable-publish acknowledgment.
    fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), ChannelError>;

    /// Join `group` on `topic`. Messages the group has not committed yet
    /// are delivered first, then live messages as they are published.
    fn subscribe(&self, topic: &str, group: &str) -> Subscription;
}

impl<C> EventChannel for Arc<C>
where
    C: EventChannel + ?Sized,
{
    fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), ChannelError> {
        (**self).publish(topic, key, payload)
    }

    fn subscribe(&self, topic: &str, group: &str) -> Subscription {
        (**self).subscribe(topic, group)
    }
}
