//! Job model and lifecycle.
//!
//! A [`Job`] is created when a request envelope is decoded, owned by the
//! queue until a worker dequeues it, and destroyed once its response has
//! been handed back to the transport. Status transitions are monotonic:
//!
//! ```text
//! Pending → Running → { Completed | Failed }
//! Pending → Failed            (rejected before execution)
//! ```
//!
//! `result` and `error` are mutually exclusive and each set exactly once,
//! enforced by [`Job::complete`] and [`Job::fail`] being the only mutators
//! of the terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::PayloadEncoding;
use crate::error::ServiceError;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// The two operations a job can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Compress,
    Decompress,
}

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the status is a terminal state (no further transitions).
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether a transition from `self` to `next` is allowed.
    ///
    /// Transitions are strictly forward: Pending → Running →
    /// {Completed | Failed}. A pending job may also fail directly
    /// (queue rejection, shutdown before execution). Everything else is
    /// rejected.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One compress/decompress work unit with an identity and a terminal outcome.
#[derive(Debug, Clone)]
pub struct Job {
    /// Correlation id. Supplied by the client or assigned on receipt.
    pub id: String,
    pub operation: Operation,
    /// Registry key naming the algorithm to run.
    pub algorithm: String,
    /// Decoded payload bytes.
    pub payload: Vec<u8>,
    /// Text encoding the request used; the response mirrors it.
    pub encoding: PayloadEncoding,
    status: JobStatus,
    result: Option<Vec<u8>>,
    error: Option<ServiceError>,
    /// When the request was decoded (UTC).
    pub received_at: DateTime<Utc>,
}

impl Job {
    /// Create a pending job.
    ///
    /// When the client did not supply an `id`, a UUIDv7 is assigned so the
    /// response can still be correlated.
    pub fn new(
        id: Option<String>,
        operation: Operation,
        algorithm: String,
        payload: Vec<u8>,
        encoding: PayloadEncoding,
    ) -> Self {
        Self {
            id: id.unwrap_or_else(|| Uuid::now_v7().to_string()),
            operation,
            algorithm,
            payload,
            encoding,
            status: JobStatus::Pending,
            result: None,
            error: None,
            received_at: Utc::now(),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// The result bytes, populated only when the job has completed.
    pub fn result(&self) -> Option<&[u8]> {
        self.result.as_deref()
    }

    /// The failure detail, populated only when the job has failed.
    pub fn error(&self) -> Option<&ServiceError> {
        self.error.as_ref()
    }

    /// Mark the job running (Pending → Running).
    pub fn start(&mut self) -> Result<(), ServiceError> {
        self.transition(JobStatus::Running)
    }

    /// Mark the job completed with its result bytes (Running → Completed).
    pub fn complete(&mut self, result: Vec<u8>) -> Result<(), ServiceError> {
        self.transition(JobStatus::Completed)?;
        self.result = Some(result);
        Ok(())
    }

    /// Mark the job failed with the specific error (Running or Pending → Failed).
    pub fn fail(&mut self, error: ServiceError) -> Result<(), ServiceError> {
        self.transition(JobStatus::Failed)?;
        self.error = Some(error);
        Ok(())
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), ServiceError> {
        if !self.status.can_transition_to(next) {
            return Err(ServiceError::Internal(format!(
                "Invalid job transition: {:?} → {next:?}",
                self.status
            )));
        }
        self.status = next;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
