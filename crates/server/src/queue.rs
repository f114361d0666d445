//! Bounded FIFO job queue.
//!
//! The single shared mutable structure in the service. The transport
//! endpoint enqueues decoded jobs; worker tasks dequeue them in insertion
//! order. Built on a bounded `tokio::sync::mpsc` channel plus a
//! [`CancellationToken`]:
//!
//! - [`JobQueue::enqueue`] applies the configured [`OverflowPolicy`] when
//!   the queue is at capacity.
//! - [`JobReceiver::dequeue`] drains buffered jobs even after shutdown has
//!   been initiated, and yields `None` once the queue is empty and the
//!   token has fired — so in-flight work finishes while blocked and future
//!   dequeues observe the shutdown.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use baler_core::{Job, ServiceError};

/// One queued unit of work: the job plus the handle the response line is
/// sent down once the job is terminal.
#[derive(Debug)]
pub struct QueuedJob {
    pub job: Job,
    /// Per-connection response channel (serialized envelope lines).
    pub reply: mpsc::Sender<String>,
}

/// What `enqueue` does when the queue is at capacity.
///
/// A configuration choice (`--overflow`), never decided ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OverflowPolicy {
    /// Await space in the queue (backpressure on the transport).
    Block,
    /// Fail immediately with [`ServiceError::QueueFull`].
    Reject,
}

/// Producer half, held by the transport endpoint.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<QueuedJob>,
    policy: OverflowPolicy,
    shutdown: CancellationToken,
}

/// Consumer half, shared by all workers.
#[derive(Clone)]
pub struct JobReceiver {
    rx: Arc<Mutex<mpsc::Receiver<QueuedJob>>>,
    shutdown: CancellationToken,
}

impl JobQueue {
    /// Create a queue with the given capacity and overflow policy.
    ///
    /// Cancelling `shutdown` stops admission (enqueues fail with
    /// [`ServiceError::ShutdownInProgress`]) and makes dequeues return
    /// `None` once the buffer is drained. Cancellation is idempotent and
    /// observed by all blocked and future calls.
    pub fn bounded(
        capacity: usize,
        policy: OverflowPolicy,
        shutdown: CancellationToken,
    ) -> (JobQueue, JobReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            JobQueue {
                tx,
                policy,
                shutdown: shutdown.clone(),
            },
            JobReceiver {
                rx: Arc::new(Mutex::new(rx)),
                shutdown,
            },
        )
    }

    /// Add a job to the back of the queue.
    ///
    /// At capacity, behaves per the configured [`OverflowPolicy`]. After
    /// shutdown has been initiated, fails with `ShutdownInProgress`.
    pub async fn enqueue(&self, job: QueuedJob) -> Result<(), ServiceError> {
        if self.shutdown.is_cancelled() {
            return Err(ServiceError::ShutdownInProgress);
        }
        match self.policy {
            OverflowPolicy::Block => {
                tokio::select! {
                    _ = self.shutdown.cancelled() => Err(ServiceError::ShutdownInProgress),
                    sent = self.tx.send(job) => {
                        sent.map_err(|_| ServiceError::ShutdownInProgress)
                    }
                }
            }
            OverflowPolicy::Reject => self.tx.try_send(job).map_err(|e| match e {
                TrySendError::Full(_) => ServiceError::QueueFull,
                TrySendError::Closed(_) => ServiceError::ShutdownInProgress,
            }),
        }
    }
}

impl JobReceiver {
    /// Take the next job in FIFO order.
    ///
    /// Awaits until a job is available. Returns `None` once shutdown has
    /// been initiated and the buffer is empty; buffered jobs are still
    /// handed out after cancellation so the drain window can complete them.
    pub async fn dequeue(&self) -> Option<QueuedJob> {
        let mut rx = self.rx.lock().await;

        // Hand out buffered work before honouring the shutdown token.
        match rx.try_recv() {
            Ok(job) => return Some(job),
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => return None,
        }

        tokio::select! {
            _ = self.shutdown.cancelled() => None,
            job = rx.recv() => job,
        }
    }

    /// Close the queue and take every job still buffered.
    ///
    /// Called after the workers have stopped; the caller fails the
    /// remaining jobs with [`ServiceError::ShutdownInProgress`].
    pub async fn drain(&self) -> Vec<QueuedJob> {
        let mut rx = self.rx.lock().await;
        rx.close();
        let mut out = Vec::new();
        while let Ok(job) = rx.try_recv() {
            out.push(job);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
