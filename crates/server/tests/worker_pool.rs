//! Worker pool tests.
//!
//! Exercise the pool directly against a queue and the built-in registry,
//! without the TCP transport: fan-out across workers, failure isolation,
//! and shutdown draining.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use baler_core::{Job, Operation, PayloadEncoding};
use baler_engine::AlgorithmRegistry;
use baler_server::{JobQueue, OverflowPolicy, QueuedJob, WorkerPool};

const MAX_DECOMPRESSED: usize = 1024 * 1024;

fn compress_job(id: &str, algorithm: &str, payload: Vec<u8>) -> Job {
    Job::new(
        Some(id.into()),
        Operation::Compress,
        algorithm.into(),
        payload,
        PayloadEncoding::Base64,
    )
}

async fn next_response(rx: &mut mpsc::Receiver<String>) -> serde_json::Value {
    let line = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("response within deadline")
        .expect("response channel open");
    serde_json::from_str(&line).expect("response is valid JSON")
}

// ---------------------------------------------------------------------------
// Test: N jobs across fewer workers all get exactly one response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn more_jobs_than_workers_all_answered() {
    const JOBS: usize = 24;
    const WORKERS: usize = 3;

    let shutdown = CancellationToken::new();
    let (queue, receiver) = JobQueue::bounded(JOBS, OverflowPolicy::Block, shutdown.clone());
    let pool = WorkerPool::spawn(
        WORKERS,
        Arc::new(AlgorithmRegistry::builtin()),
        receiver,
        MAX_DECOMPRESSED,
    );
    let pool_handle = tokio::spawn(pool.run());

    let (reply_tx, mut reply_rx) = mpsc::channel(JOBS);
    for i in 0..JOBS {
        let payload = format!("payload {i} ").repeat(i + 1).into_bytes();
        queue
            .enqueue(QueuedJob {
                job: compress_job(&format!("job-{i}"), "gzip", payload),
                reply: reply_tx.clone(),
            })
            .await
            .expect("enqueue");
    }
    drop(reply_tx);

    let mut seen = HashSet::new();
    for _ in 0..JOBS {
        let response = next_response(&mut reply_rx).await;
        assert_eq!(response["status"], "completed");
        let id = response["id"].as_str().expect("id is a string").to_string();
        assert!(seen.insert(id.clone()), "duplicate response for {id}");
    }
    assert_eq!(seen.len(), JOBS);

    // No extra responses: every sender is gone once the jobs are done.
    assert!(reply_rx.recv().await.is_none());

    shutdown.cancel();
    pool_handle.await.expect("pool joins cleanly");
}

// ---------------------------------------------------------------------------
// Test: a failed job does not terminate the worker
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_job_does_not_kill_the_worker() {
    let shutdown = CancellationToken::new();
    let (queue, receiver) = JobQueue::bounded(4, OverflowPolicy::Block, shutdown.clone());
    let pool = WorkerPool::spawn(
        1,
        Arc::new(AlgorithmRegistry::builtin()),
        receiver,
        MAX_DECOMPRESSED,
    );
    let pool_handle = tokio::spawn(pool.run());

    let (reply_tx, mut reply_rx) = mpsc::channel(4);

    // Unknown algorithm: fails on the single worker.
    queue
        .enqueue(QueuedJob {
            job: compress_job("bad", "lzma", b"x".to_vec()),
            reply: reply_tx.clone(),
        })
        .await
        .expect("enqueue");
    // Then a valid job on the same worker.
    queue
        .enqueue(QueuedJob {
            job: compress_job("good", "gzip", b"y".to_vec()),
            reply: reply_tx.clone(),
        })
        .await
        .expect("enqueue");
    drop(reply_tx);

    let first = next_response(&mut reply_rx).await;
    assert_eq!(first["id"], "bad");
    assert_eq!(first["status"], "failed");
    assert_eq!(first["error"]["kind"], "UnsupportedAlgorithm");

    let second = next_response(&mut reply_rx).await;
    assert_eq!(second["id"], "good");
    assert_eq!(second["status"], "completed");

    shutdown.cancel();
    pool_handle.await.expect("pool joins cleanly");
}

// ---------------------------------------------------------------------------
// Test: corrupt decompression input yields CorruptPayload, not a crash
// ---------------------------------------------------------------------------

#[tokio::test]
async fn corrupt_payload_is_reported_not_fatal() {
    let shutdown = CancellationToken::new();
    let (queue, receiver) = JobQueue::bounded(4, OverflowPolicy::Block, shutdown.clone());
    let pool = WorkerPool::spawn(
        1,
        Arc::new(AlgorithmRegistry::builtin()),
        receiver,
        MAX_DECOMPRESSED,
    );
    let pool_handle = tokio::spawn(pool.run());

    let (reply_tx, mut reply_rx) = mpsc::channel(4);
    queue
        .enqueue(QueuedJob {
            job: Job::new(
                Some("corrupt".into()),
                Operation::Decompress,
                "gzip".into(),
                vec![0xFF, 0xFE, 0x00, 0x01],
                PayloadEncoding::Base64,
            ),
            reply: reply_tx.clone(),
        })
        .await
        .expect("enqueue");
    drop(reply_tx);

    let response = next_response(&mut reply_rx).await;
    assert_eq!(response["id"], "corrupt");
    assert_eq!(response["error"]["kind"], "CorruptPayload");

    shutdown.cancel();
    pool_handle.await.expect("pool joins cleanly");
}

// ---------------------------------------------------------------------------
// Test: a panicking algorithm still produces a failed response
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Boom;

impl baler_engine::Algorithm for Boom {
    fn name(&self) -> &'static str {
        "boom"
    }

    fn compress(&self, _data: &[u8]) -> Result<Vec<u8>, baler_core::ServiceError> {
        panic!("boom");
    }

    fn decompress(
        &self,
        _data: &[u8],
        _max_size: usize,
    ) -> Result<Vec<u8>, baler_core::ServiceError> {
        panic!("boom");
    }
}

#[tokio::test]
async fn panicking_algorithm_is_reported_not_fatal() {
    let mut registry = AlgorithmRegistry::builtin();
    registry.register(Arc::new(Boom));

    let shutdown = CancellationToken::new();
    let (queue, receiver) = JobQueue::bounded(4, OverflowPolicy::Block, shutdown.clone());
    let pool = WorkerPool::spawn(1, Arc::new(registry), receiver, MAX_DECOMPRESSED);
    let pool_handle = tokio::spawn(pool.run());

    let (reply_tx, mut reply_rx) = mpsc::channel(4);
    queue
        .enqueue(QueuedJob {
            job: compress_job("explodes", "boom", b"x".to_vec()),
            reply: reply_tx.clone(),
        })
        .await
        .expect("enqueue");
    queue
        .enqueue(QueuedJob {
            job: compress_job("survives", "gzip", b"y".to_vec()),
            reply: reply_tx.clone(),
        })
        .await
        .expect("enqueue");
    drop(reply_tx);

    let first = next_response(&mut reply_rx).await;
    assert_eq!(first["id"], "explodes");
    assert_eq!(first["status"], "failed");
    assert_eq!(first["error"]["kind"], "Internal");

    let second = next_response(&mut reply_rx).await;
    assert_eq!(second["id"], "survives");
    assert_eq!(second["status"], "completed");

    shutdown.cancel();
    pool_handle.await.expect("pool joins cleanly");
}

// ---------------------------------------------------------------------------
// Test: jobs queued before shutdown are still executed during the drain
// ---------------------------------------------------------------------------

#[tokio::test]
async fn buffered_jobs_finish_during_drain() {
    let shutdown = CancellationToken::new();
    let (queue, receiver) = JobQueue::bounded(8, OverflowPolicy::Block, shutdown.clone());

    let (reply_tx, mut reply_rx) = mpsc::channel(8);
    for i in 0..4 {
        queue
            .enqueue(QueuedJob {
                job: compress_job(&format!("drain-{i}"), "lz4", b"data".to_vec()),
                reply: reply_tx.clone(),
            })
            .await
            .expect("enqueue");
    }
    drop(reply_tx);

    // Workers start only after shutdown has been initiated.
    shutdown.cancel();
    let pool = WorkerPool::spawn(
        2,
        Arc::new(AlgorithmRegistry::builtin()),
        receiver,
        MAX_DECOMPRESSED,
    );
    let pool_handle = tokio::spawn(pool.run());

    let mut seen = HashSet::new();
    for _ in 0..4 {
        let response = next_response(&mut reply_rx).await;
        assert_eq!(response["status"], "completed");
        seen.insert(response["id"].as_str().expect("id").to_string());
    }
    assert_eq!(seen.len(), 4);

    // With the buffer drained and the token cancelled, the pool exits.
    tokio::time::timeout(Duration::from_secs(5), pool_handle)
        .await
        .expect("pool exits after drain")
        .expect("pool joins cleanly");
}
