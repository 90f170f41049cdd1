//! In-memory event channel for tests/dev.
//!
//! Each topic keeps an append-only message log; each consumer group keeps a
//! committed offset into that log. Subscribing replays everything after the
//! committed offset before streaming live messages, which is what makes
//! crash-and-resubscribe behave like broker redelivery. A single subscriber
//! per group per topic consumes sequentially, so total log order subsumes
//! per-key order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc};

use tracing::debug;

use crate::channel::{ChannelError, Delivery, EventChannel, Subscription};

#[derive(Debug, Clone)]
struct Message {
    key: String,
    payload: Vec<u8>,
}

#[derive(Debug, Default)]
struct GroupState {
    /// Offset of the first uncommitted message in the topic log.
    committed: usize,
    subscriber: Option<mpsc::Sender<Delivery>>,
}

#[derive(Debug, Default)]
struct TopicState {
    log: Vec<Message>,
    groups: HashMap<String, GroupState>,
}

#[derive(Debug, Default)]
struct State {
    topics: HashMap<String, TopicState>,
}

/// In-memory at-least-once channel.
///
/// Not optimized for throughput; it exists so the settlement pipeline can
/// be exercised end to end without a broker.
#[derive(Debug, Default)]
pub struct InMemoryChannel {
    state: Arc<Mutex<State>>,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-send every uncommitted message for `group` on `topic` to its
    /// current subscriber, returning how many were re-sent.
    ///
    /// This simulates what a broker does after a consumer crashes between
    /// processing and commit.
    pub fn redeliver_uncommitted(&self, topic: &str, group: &str) -> Result<usize, ChannelError> {
        let mut state = self.state.lock().map_err(|_| ChannelError::Poisoned)?;
        let topic_state = state
            .topics
            .get_mut(topic)
            .ok_or_else(|| unknown(topic, group))?;

        let committed = topic_state
            .groups
            .get(group)
            .ok_or_else(|| unknown(topic, group))?
            .committed;

        let pending: Vec<(usize, Message)> = topic_state
            .log
            .iter()
            .enumerate()
            .skip(committed)
            .map(|(offset, m)| (offset, m.clone()))
            .collect();

        let count = pending.len();
        for (offset, message) in pending {
            Self::send_to_group(&self.state, topic, group, topic_state, offset, &message);
        }

        debug!(topic, group, count, "redelivered uncommitted messages");
        Ok(count)
    }

    /// Number of messages ever published to `topic`.
    pub fn topic_len(&self, topic: &str) -> usize {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.topics.get(topic).map(|t| t.log.len()))
            .unwrap_or(0)
    }

    fn send_to_group(
        state: &Arc<Mutex<State>>,
        topic: &str,
        group: &str,
        topic_state: &mut TopicState,
        offset: usize,
        message: &Message,
    ) {
        let Some(group_state) = topic_state.groups.get_mut(group) else {
            return;
        };
        let Some(tx) = &group_state.subscriber else {
            return;
        };

        let delivery = Delivery::new(
            message.key.clone(),
            message.payload.clone(),
            make_commit(state.clone(), topic.to_string(), group.to_string(), offset),
        );

        // Drop dead subscribers; the group keeps its committed offset and
        // picks up from there on the next subscribe.
        if tx.send(delivery).is_err() {
            group_state.subscriber = None;
        }
    }
}

fn unknown(topic: &str, group: &str) -> ChannelError {
    ChannelError::UnknownSubscription {
        topic: topic.to_string(),
        group: group.to_string(),
    }
}

fn make_commit(
    state: Arc<Mutex<State>>,
    topic: String,
    group: String,
    offset: usize,
) -> crate::channel::CommitFn {
    Box::new(move || {
        let mut state = state.lock().map_err(|_| ChannelError::Poisoned)?;
        let group_state = state
            .topics
            .get_mut(&topic)
            .and_then(|t| t.groups.get_mut(&group))
            .ok_or_else(|| unknown(&topic, &group))?;

        // Sequential consumption commits in order; guard against a stale
        // handle from an already-redelivered message moving the offset back.
        if offset + 1 > group_state.committed {
            group_state.committed = offset + 1;
        }
        Ok(())
    })
}

impl EventChannel for InMemoryChannel {
    fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), ChannelError> {
        let mut state = self.state.lock().map_err(|_| ChannelError::Poisoned)?;
        let shared = self.state.clone();

        let topic_state = state.topics.entry(topic.to_string()).or_default();
        let message = Message {
            key: key.to_string(),
            payload: payload.to_vec(),
        };
        topic_state.log.push(message.clone());
        let offset = topic_state.log.len() - 1;

        let groups: Vec<String> = topic_state.groups.keys().cloned().collect();
        for group in groups {
            Self::send_to_group(&shared, topic, &group, topic_state, offset, &message);
        }

        Ok(())
    }

    fn subscribe(&self, topic: &str, group: &str) -> Subscription {
        let (tx, rx) = mpsc::channel();

        // If the lock is poisoned the subscription is still returned; it
        // just never receives messages.
        if let Ok(mut state) = self.state.lock() {
            let shared = self.state.clone();
            let topic_state = state.topics.entry(topic.to_string()).or_default();
            let group_state = topic_state
                .groups
                .entry(group.to_string())
                .or_default();
            group_state.subscriber = Some(tx);

            // Replay the uncommitted backlog before live traffic.
            let committed = topic_state.groups[group].committed;
            let backlog: Vec<(usize, Message)> = topic_state
                .log
                .iter()
                .enumerate()
                .skip(committed)
                .map(|(offset, m)| (offset, m.clone()))
                .collect();
            for (offset, message) in backlog {
                Self::send_to_group(&shared, topic, group, topic_state, offset, &message);
            }
        }

        Subscription::new(rx)
    }
}
