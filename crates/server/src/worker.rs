//! Supervised worker pool.
//!
//! A fixed number of tokio tasks drawing from the shared [`JobReceiver`].
//! Each worker repeatedly dequeues a job, runs the requested engine
//! operation, records the terminal outcome on the job, and sends the
//! encoded response down the job's reply handle.
//!
//! A job failure never terminates a worker: the error is captured on the
//! job and the worker moves on to the next dequeue. A worker panic is
//! isolated to that worker — the pool supervisor logs it and spawns a
//! replacement, bounded by a restart budget so a deterministic crash
//! cannot loop forever.

use std::sync::Arc;

use tokio::task::JoinSet;

use baler_core::{encode_response, ServiceError};
use baler_engine::AlgorithmRegistry;

use crate::queue::{JobReceiver, QueuedJob};

/// How many panicked workers the supervisor will replace before giving up.
const MAX_WORKER_RESTARTS: usize = 8;

/// Fixed-size pool of job-processing tasks.
pub struct WorkerPool {
    tasks: JoinSet<()>,
    registry: Arc<AlgorithmRegistry>,
    receiver: JobReceiver,
    max_decompressed_size: usize,
    next_worker_id: usize,
    restarts_left: usize,
}

impl WorkerPool {
    /// Spawn `count` workers.
    ///
    /// The registry is shared read-only; `max_decompressed_size` bounds
    /// every decompression the pool performs.
    pub fn spawn(
        count: usize,
        registry: Arc<AlgorithmRegistry>,
        receiver: JobReceiver,
        max_decompressed_size: usize,
    ) -> Self {
        let mut pool = Self {
            tasks: JoinSet::new(),
            registry,
            receiver,
            max_decompressed_size,
            next_worker_id: 0,
            restarts_left: MAX_WORKER_RESTARTS,
        };
        for _ in 0..count {
            pool.spawn_worker();
        }
        tracing::info!(workers = count, "Worker pool started");
        pool
    }

    fn spawn_worker(&mut self) {
        let worker_id = self.next_worker_id;
        self.next_worker_id += 1;

        let registry = Arc::clone(&self.registry);
        let receiver = self.receiver.clone();
        let max = self.max_decompressed_size;
        self.tasks
            .spawn(worker_loop(worker_id, registry, receiver, max));
    }

    /// Supervise the pool until every worker has exited.
    ///
    /// Workers exit cleanly once the queue signals shutdown. A panicked
    /// worker is replaced while the restart budget lasts; other workers
    /// and the queue are unaffected either way.
    pub async fn run(mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    tracing::error!(error = %e, "Worker panicked");
                    if self.restarts_left > 0 {
                        self.restarts_left -= 1;
                        tracing::warn!(
                            restarts_left = self.restarts_left,
                            "Spawning replacement worker"
                        );
                        self.spawn_worker();
                    } else {
                        tracing::error!("Worker restart budget exhausted");
                    }
                }
            }
        }
        tracing::info!("Worker pool stopped");
    }
}

/// One worker: dequeue → execute → respond, until shutdown.
async fn worker_loop(
    worker_id: usize,
    registry: Arc<AlgorithmRegistry>,
    receiver: JobReceiver,
    max_decompressed_size: usize,
) {
    tracing::debug!(worker_id, "Worker started");
    while let Some(queued) = receiver.dequeue().await {
        process_job(worker_id, &registry, max_decompressed_size, queued).await;
    }
    tracing::debug!(worker_id, "Worker stopped");
}

/// Run one job to its terminal state and deliver the response.
async fn process_job(
    worker_id: usize,
    registry: &AlgorithmRegistry,
    max_decompressed_size: usize,
    queued: QueuedJob,
) {
    let QueuedJob { mut job, reply } = queued;

    record_transition(job.start(), &job.id);
    tracing::debug!(
        worker_id,
        job_id = %job.id,
        operation = ?job.operation,
        algorithm = %job.algorithm,
        input_bytes = job.payload.len(),
        "Job started"
    );

    // A panicking algorithm must not lose the response or the worker: it
    // is caught here and recorded as an internal failure on the job.
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        baler_engine::execute(
            registry,
            job.operation,
            &job.algorithm,
            &job.payload,
            max_decompressed_size,
        )
    }))
    .unwrap_or_else(|panic| Err(internal_panic_error(panic)));
    match outcome {
        Ok(bytes) => {
            tracing::debug!(
                worker_id,
                job_id = %job.id,
                output_bytes = bytes.len(),
                "Job completed"
            );
            record_transition(job.complete(bytes), &job.id);
        }
        Err(error) => {
            tracing::debug!(
                worker_id,
                job_id = %job.id,
                kind = error.kind(),
                error = %error,
                "Job failed"
            );
            record_transition(job.fail(error), &job.id);
        }
    }

    if reply.send(encode_response(&job)).await.is_err() {
        tracing::warn!(
            job_id = %job.id,
            "Client went away before the response could be delivered"
        );
    }
}

fn record_transition(result: Result<(), ServiceError>, job_id: &str) {
    if let Err(e) = result {
        tracing::error!(job_id = %job_id, error = %e, "Rejected job state transition");
    }
}

fn internal_panic_error(panic: Box<dyn std::any::Any + Send>) -> ServiceError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    ServiceError::Internal(format!("engine panicked: {message}"))
}
