//! Service error taxonomy.
//!
//! Every failure a job can hit maps to exactly one variant. Per-job errors
//! are recovered locally — captured on the job and turned into an error
//! envelope — and never crash the process. [`ServiceError::kind`] is the
//! stable identifier carried in the envelope's `error.kind` field.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The request frame is not valid JSON or is missing a required field.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The payload field is not valid text-safe encoded binary.
    #[error("Invalid payload encoding: {0}")]
    InvalidEncoding(String),

    /// No algorithm is registered under the requested identifier.
    #[error("Unsupported algorithm: \"{0}\"")]
    UnsupportedAlgorithm(String),

    /// The compressed payload is truncated or corrupt.
    #[error("Corrupt payload: {0}")]
    CorruptPayload(String),

    /// Decompressed output would exceed the configured size bound.
    #[error("Decompressed payload exceeds the {limit}-byte limit")]
    PayloadTooLarge { limit: usize },

    /// The job queue is at capacity (reject overflow policy).
    #[error("Job queue is full")]
    QueueFull,

    /// The service is shutting down and no longer accepts or runs jobs.
    #[error("Service is shutting down")]
    ShutdownInProgress,

    /// An unexpected internal fault (invalid state, resource exhaustion).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable wire identifier for the envelope's `error.kind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::MalformedEnvelope(_) => "MalformedEnvelope",
            ServiceError::InvalidEncoding(_) => "InvalidEncoding",
            ServiceError::UnsupportedAlgorithm(_) => "UnsupportedAlgorithm",
            ServiceError::CorruptPayload(_) => "CorruptPayload",
            ServiceError::PayloadTooLarge { .. } => "PayloadTooLarge",
            ServiceError::QueueFull => "QueueFull",
            ServiceError::ShutdownInProgress => "ShutdownInProgress",
            ServiceError::Internal(_) => "Internal",
        }
    }
}
