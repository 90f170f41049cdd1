//! Settlement consumer: one worker loop per intent topic.
//!
//! Each topic (deposit, withdraw, transfer) gets a dedicated sequential
//! receive-process loop on its own thread. Sequential processing within a
//! loop is what preserves per-account ordering; across loops the account
//! store's conditional updates are the only serialization point. Each loop
//! observes a shutdown signal between receives and lets an in-flight
//! delivery finish before exiting.

use std::sync::{Arc, mpsc};
use std::thread;

use tracing::{info, warn};

use ledgerflow_core::TransactionKind;
use ledgerflow_events::{EventChannel, Subscription};

use crate::config::EngineConfig;
use crate::settlement::SettlementProcessor;

struct Worker {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

/// Handle to the running settlement workers.
#[derive(Default)]
pub struct ConsumerHandle {
    workers: Vec<Worker>,
}

impl ConsumerHandle {
    /// Request graceful shutdown and wait for every loop to stop.
    pub fn shutdown(mut self) {
        for worker in &self.workers {
            let _ = worker.shutdown.send(());
        }
        for worker in &mut self.workers {
            if let Some(join) = worker.join.take() {
                let _ = join.join();
            }
        }
    }
}

pub struct SettlementConsumer;

impl SettlementConsumer {
    /// Subscribe to every intent topic and spawn one worker per topic.
    pub fn spawn<C: EventChannel>(
        channel: &C,
        processor: Arc<SettlementProcessor>,
        config: &EngineConfig,
    ) -> ConsumerHandle {
        let mut handle = ConsumerHandle::default();

        for kind in TransactionKind::ALL {
            let topic = kind.topic();
            let subscription = channel.subscribe(topic, &config.consumer_group);
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
            let processor = processor.clone();
            let tick = config.poll_tick;

            let join = thread::Builder::new()
                .name(topic.to_string())
                .spawn(move || worker_loop(topic, subscription, shutdown_rx, &processor, tick))
                .expect("failed to spawn settlement worker thread");

            handle.workers.push(Worker {
                shutdown: shutdown_tx,
                join: Some(join),
            });
        }

        handle
    }
}

fn worker_loop(
    topic: &'static str,
    subscription: Subscription,
    shutdown_rx: mpsc::Receiver<()>,
    processor: &SettlementProcessor,
    tick: std::time::Duration,
) {
    info!(topic, "settlement worker started");

    loop {
        // Shutdown check between receives (non-blocking); an in-flight
        // delivery below always finishes first.
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match subscription.recv_timeout(tick) {
            Ok(delivery) => {
                match processor.process(delivery.payload()) {
                    Ok(_) => {
                        // Commit only after processing completed; a crash
                        // before this point leaves the message for
                        // redelivery.
                        if let Err(e) = delivery.commit() {
                            warn!(topic, error = %e, "failed to commit delivery");
                        }
                    }
                    Err(e) => {
                        // Infrastructure failure: leave uncommitted so the
                        // transport redelivers.
                        warn!(topic, error = %e, "settlement failed, delivery left uncommitted");
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    info!(topic, "settlement worker stopped");
}
