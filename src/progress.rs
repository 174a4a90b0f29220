//! Progress tracking for the crawl
//!
//! The tracker subscribes to the queue's lifecycle signals and keeps its own
//! accumulator of submitted/waiting/running/finished counts, emitting a
//! human-readable snapshot through `tracing` on a fixed interval. It has no
//! effect on admission order or task outcomes; it exists purely for
//! observability. Teardown is the owner's call: the queue broadcasts Drained
//! at every transition to idle, including momentary lulls mid-crawl, so the
//! tracker runs until [`ProgressTracker::stop`] tells it the run is over.

use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;

use crate::queue::{BoundedQueue, QueueSignal, QueueStats};

/// Background task mirroring queue lifecycle signals into counters
///
/// Constructed by the assembler and handed the queue by reference; the
/// accumulator lives inside the spawned task, scoped to one crawl run.
/// Dropping the tracker without calling [`stop`](Self::stop) also ends the
/// task, via the closed stop channel.
pub struct ProgressTracker {
    snapshot_rx: watch::Receiver<QueueStats>,
    stop_tx: watch::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl ProgressTracker {
    /// Spawn a tracker on the given queue, emitting every `period`
    pub fn spawn(queue: &BoundedQueue, period: Duration) -> Self {
        // Subscription and initial counters are taken as one consistent
        // snapshot; replaying the receiver on top of them stays exact.
        let (mut signals, initial) = queue.subscribe_with_stats();
        let queue = queue.clone();
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (stop_tx, mut stop_rx) = watch::channel(());

        let handle = tokio::spawn(async move {
            let mut counters = initial;
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of a tokio interval completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    signal = signals.recv() => match signal {
                        Ok(QueueSignal::Enqueued) => {
                            counters.submitted += 1;
                            counters.waiting += 1;
                        }
                        Ok(QueueSignal::Started) => {
                            counters.waiting -= 1;
                            counters.running += 1;
                        }
                        Ok(QueueSignal::Finished) => {
                            counters.running -= 1;
                            counters.finished += 1;
                        }
                        Ok(QueueSignal::Drained) => {
                            // The queue goes idle whenever a fetch finishes
                            // before its children are enqueued; not terminal.
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            // Fell behind the signal stream; resynchronize
                            // from the queue's own accounting.
                            tracing::warn!(missed, "progress tracker lagged, resyncing counters");
                            counters = queue.stats();
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    // Fires on an explicit stop() and when the tracker
                    // handle is dropped without one.
                    _ = stop_rx.changed() => {
                        counters = queue.stats();
                        let _ = snapshot_tx.send(counters);
                        tracing::debug!(
                            finished = counters.finished,
                            "progress tracker stopped"
                        );
                        break;
                    }
                    _ = ticker.tick() => {
                        tracing::info!(
                            submitted = counters.submitted,
                            waiting = counters.waiting,
                            running = counters.running,
                            finished = counters.finished,
                            "crawl progress"
                        );
                    }
                }
                let _ = snapshot_tx.send(counters);
            }
        });

        Self {
            snapshot_rx,
            stop_tx,
            handle,
        }
    }

    /// Most recent counter snapshot observed by the tracker
    pub fn snapshot(&self) -> QueueStats {
        *self.snapshot_rx.borrow()
    }

    /// Stop the tracker and wait for its task to finish
    ///
    /// The final snapshot is resynchronized from the queue's own counters
    /// before the task exits, so calling this after the queue has drained
    /// yields exact end-of-run numbers.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        // An aborted or panicked tracker is an observability loss, not a
        // crawl failure.
        let _ = self.handle.await;
    }
}
