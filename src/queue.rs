//! Bounded task queue with lifecycle signals
//!
//! Every remote call in the crawler is admitted through one [`BoundedQueue`]:
//! at most `concurrency` tasks run at once, the rest wait in arrival order.
//! The queue broadcasts a [`QueueSignal`] at each lifecycle transition so the
//! progress tracker (and tests) can observe it without touching admission
//! state.
//!
//! A task whose body fails resolves its submitted future with that failure
//! and nothing else: the queue never aborts sibling tasks or itself.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::{Semaphore, broadcast};

/// Broadcast channel capacity for lifecycle signals
///
/// Sized so a subscriber that keeps up with the single-threaded signal
/// stream never lags; the tracker resynchronizes from [`BoundedQueue::stats`]
/// if it does.
const SIGNAL_CHANNEL_CAPACITY: usize = 1024;

/// Lifecycle signal emitted by [`BoundedQueue`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueSignal {
    /// A task was accepted into the waiting set
    Enqueued,
    /// A waiting task was promoted to running
    Started,
    /// A running task completed, successfully or not
    Finished,
    /// No waiting and no running tasks remain
    Drained,
}

/// Point-in-time queue counters
///
/// `submitted == waiting + running + finished` holds at every observation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Tasks accepted so far
    pub submitted: usize,
    /// Tasks waiting for an admission slot
    pub waiting: usize,
    /// Tasks currently running
    pub running: usize,
    /// Tasks that have completed
    pub finished: usize,
}

impl QueueStats {
    /// True when no task is waiting or running
    pub fn is_idle(&self) -> bool {
        self.waiting == 0 && self.running == 0
    }
}

/// Task queue admitting at most a fixed number of tasks concurrently
///
/// Cloning is cheap; all clones share the same admission state, so every
/// component holding a handle competes for the same global ceiling.
#[derive(Clone, Debug)]
pub struct BoundedQueue {
    /// Admission slots; tokio's semaphore is fair, so waiters are admitted
    /// in arrival order (FIFO)
    permits: Arc<Semaphore>,
    /// Counter state, serialized under one lock so drain detection is exact
    /// on a multi-threaded runtime
    stats: Arc<Mutex<QueueStats>>,
    /// Lifecycle signal broadcast (multiple subscribers supported)
    signal_tx: broadcast::Sender<QueueSignal>,
}

impl BoundedQueue {
    /// Create a queue with the given concurrency ceiling
    pub fn new(concurrency: usize) -> Self {
        let (signal_tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        Self {
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            stats: Arc::new(Mutex::new(QueueStats::default())),
            signal_tx,
        }
    }

    /// Subscribe to lifecycle signals
    pub fn subscribe(&self) -> broadcast::Receiver<QueueSignal> {
        self.signal_tx.subscribe()
    }

    /// Subscribe to lifecycle signals together with a consistent counter
    /// snapshot
    ///
    /// Signals are emitted under the counter lock, so every signal is
    /// either already reflected in the returned snapshot or will arrive on
    /// the returned receiver — never both. An accumulator seeded from the
    /// snapshot and updated from the receiver stays exact.
    pub fn subscribe_with_stats(&self) -> (broadcast::Receiver<QueueSignal>, QueueStats) {
        let stats = match self.stats.lock() {
            Ok(stats) => stats,
            Err(poisoned) => poisoned.into_inner(),
        };
        (self.signal_tx.subscribe(), *stats)
    }

    /// Current counter snapshot
    pub fn stats(&self) -> QueueStats {
        match self.stats.lock() {
            Ok(stats) => *stats,
            // A task panicked while holding the lock; the counters it left
            // behind are still the best available observation.
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// True when no task is waiting or running
    pub fn is_idle(&self) -> bool {
        self.stats().is_idle()
    }

    /// Submit a task and await its result
    ///
    /// The task is accepted immediately (Enqueued), runs once one of the
    /// admission slots frees up (Started), and resolves with whatever its
    /// body produced (Finished). Waiting consumes no slot and does not block
    /// a worker thread.
    ///
    /// Cancellation-safe: dropping the returned future mid-flight still
    /// completes the lifecycle, so counters and drain detection stay intact
    /// for callers racing it in `select!` or a timeout.
    pub async fn submit<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let mut lifecycle = LifecycleGuard::new(self);
        lifecycle.enqueued();

        // The semaphore is never closed while a queue handle exists; if
        // acquisition fails anyway, run the task rather than lose it.
        let _permit = self.permits.clone().acquire_owned().await.ok();
        lifecycle.started();

        let output = task.await;

        lifecycle.finished();
        output
    }

    /// Wait until the queue reports no waiting and no running tasks
    ///
    /// Returns immediately if the queue is already idle.
    pub async fn drained(&self) {
        let mut signals = self.subscribe();
        // Subscribe before checking so a drain between the check and the
        // first recv is not missed.
        if self.is_idle() {
            return;
        }
        loop {
            match signals.recv().await {
                Ok(QueueSignal::Drained) if self.is_idle() => return,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    if self.is_idle() {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }

    /// Apply one lifecycle transition and broadcast it
    ///
    /// Counter update and signal emission happen under the same lock so
    /// subscribers observe signals in the order the counters changed, and
    /// [`subscribe_with_stats`](Self::subscribe_with_stats) snapshots are
    /// consistent. A Finished transition that empties the queue also emits
    /// Drained. Sends to a channel with no subscribers are ignored.
    fn transition(&self, signal: QueueSignal) {
        let mut stats = match self.stats.lock() {
            Ok(stats) => stats,
            Err(poisoned) => poisoned.into_inner(),
        };
        match signal {
            QueueSignal::Enqueued => {
                stats.submitted += 1;
                stats.waiting += 1;
            }
            QueueSignal::Started => {
                stats.waiting -= 1;
                stats.running += 1;
            }
            QueueSignal::Finished => {
                stats.running -= 1;
                stats.finished += 1;
            }
            QueueSignal::Drained => {}
        }
        let _ = self.signal_tx.send(signal);
        if matches!(signal, QueueSignal::Finished) && stats.is_idle() {
            let _ = self.signal_tx.send(QueueSignal::Drained);
        }
    }
}

/// How far a submitted task has progressed through its lifecycle
#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
    Created,
    Waiting,
    Running,
    Done,
}

/// Completes the lifecycle of a submission dropped mid-flight
///
/// If the `submit` future is dropped between Enqueued and Finished, the
/// remaining transitions run here, so the counters stay balanced and a
/// pending drain still fires.
struct LifecycleGuard<'a> {
    queue: &'a BoundedQueue,
    stage: Stage,
}

impl<'a> LifecycleGuard<'a> {
    fn new(queue: &'a BoundedQueue) -> Self {
        Self {
            queue,
            stage: Stage::Created,
        }
    }

    fn enqueued(&mut self) {
        self.queue.transition(QueueSignal::Enqueued);
        self.stage = Stage::Waiting;
    }

    fn started(&mut self) {
        self.queue.transition(QueueSignal::Started);
        self.stage = Stage::Running;
    }

    fn finished(&mut self) {
        self.queue.transition(QueueSignal::Finished);
        self.stage = Stage::Done;
    }
}

impl Drop for LifecycleGuard<'_> {
    fn drop(&mut self) {
        match self.stage {
            // Signals stay paired: every Enqueued is followed by a Started
            // and a Finished, even for a task that never ran.
            Stage::Waiting => {
                self.queue.transition(QueueSignal::Started);
                self.queue.transition(QueueSignal::Finished);
            }
            Stage::Running => self.queue.transition(QueueSignal::Finished),
            Stage::Created | Stage::Done => {}
        }
    }
}
