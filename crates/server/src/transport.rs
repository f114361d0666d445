//! TCP transport endpoint.
//!
//! Newline-delimited JSON framing: one request envelope per line in, one
//! response envelope per line out. Each accepted connection gets a reader
//! task and a writer task joined by an mpsc channel, so any number of
//! requests may be in flight per connection and responses are written as
//! workers finish them — possibly out of request order, correlated by id.
//!
//! A frame that cannot be decoded is answered immediately with a failed
//! envelope; other in-flight jobs on the connection are unaffected. Every
//! accepted request yields exactly one correlated response.

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use baler_core::{RequestEnvelope, ResponseEnvelope, ServiceError};

use crate::queue::{JobQueue, QueuedJob};

/// Per-connection buffer of encoded responses awaiting the writer.
const REPLY_BUFFER: usize = 64;

/// Accept connections until the shutdown token fires.
pub async fn run(listener: TcpListener, queue: JobQueue, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Transport accept loop shutting down");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::debug!(%peer, "Client connected");
                    tokio::spawn(handle_connection(
                        stream,
                        peer,
                        queue.clone(),
                        shutdown.clone(),
                    ));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

/// Drive one client connection to completion.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    queue: JobQueue,
    shutdown: CancellationToken,
) {
    let (read_half, write_half) = stream.into_split();
    let (reply_tx, reply_rx) = mpsc::channel::<String>(REPLY_BUFFER);

    // The writer outlives the reader: queued jobs hold reply handles, and
    // the writer only finishes once the last of them has responded.
    let writer = tokio::spawn(write_responses(write_half, reply_rx, peer));

    read_requests(read_half, reply_tx, &queue, &shutdown).await;

    if let Err(e) = writer.await {
        tracing::warn!(%peer, error = %e, "Connection writer task failed");
    }
    tracing::debug!(%peer, "Client disconnected");
}

/// Read request frames until EOF, an IO error, or shutdown.
async fn read_requests(
    read_half: OwnedReadHalf,
    reply: mpsc::Sender<String>,
    queue: &JobQueue,
    shutdown: &CancellationToken,
) {
    let mut lines = BufReader::new(read_half).lines();

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            read = lines.next_line() => match read {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read request frame");
                    break;
                }
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let envelope = match RequestEnvelope::parse(&line) {
            Ok(envelope) => envelope,
            Err(error) => {
                // The id is unrecoverable from an unparseable frame.
                send_failure(&reply, String::new(), &error).await;
                continue;
            }
        };

        let id_hint = envelope.id.clone().unwrap_or_default();
        let job = match envelope.into_job() {
            Ok(job) => job,
            Err(error) => {
                send_failure(&reply, id_hint, &error).await;
                continue;
            }
        };

        let job_id = job.id.clone();
        let queued = QueuedJob {
            job,
            reply: reply.clone(),
        };
        if let Err(error) = queue.enqueue(queued).await {
            tracing::warn!(job_id = %job_id, kind = error.kind(), "Job not admitted");
            send_failure(&reply, job_id, &error).await;
        }
    }
}

/// Write response frames until every reply handle is gone.
async fn write_responses(
    write_half: OwnedWriteHalf,
    mut replies: mpsc::Receiver<String>,
    peer: SocketAddr,
) {
    let mut writer = BufWriter::new(write_half);
    while let Some(line) = replies.recv().await {
        let written = async {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        }
        .await;
        if let Err(e) = written {
            tracing::warn!(%peer, error = %e, "Failed to write response frame");
            break;
        }
    }
}

/// Reply with a failed envelope for a request that never became a job.
async fn send_failure(reply: &mpsc::Sender<String>, id: String, error: &ServiceError) {
    let line = ResponseEnvelope::failure(id, error).to_line();
    if reply.send(line).await.is_err() {
        tracing::debug!("Client went away before the failure could be delivered");
    }
}
