//! Wire envelopes and the payload text codec.
//!
//! One JSON object per frame, in either direction:
//!
//! ```text
//! request:  { "id"?, "operation", "algorithm", "payload", "encoding"? }
//! response: { "id", "status", "result"? | "error"? }
//! ```
//!
//! `payload` and `result` carry binary data through JSON as base64
//! (default) or lowercase hex; the response is encoded with whatever
//! encoding the request used. Envelopes are stateless serialization views —
//! decoding and encoding are pure functions with no side effects.

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::job::{Job, JobStatus, Operation};

// ---------------------------------------------------------------------------
// PayloadEncoding
// ---------------------------------------------------------------------------

/// Text-safe binary encoding used for the `payload` / `result` fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    #[default]
    Base64,
    Hex,
}

impl PayloadEncoding {
    /// Encode raw bytes into the text representation.
    pub fn encode(self, data: &[u8]) -> String {
        match self {
            PayloadEncoding::Base64 => B64.encode(data),
            PayloadEncoding::Hex => hex::encode(data),
        }
    }

    /// Decode the text representation back into raw bytes.
    pub fn decode(self, text: &str) -> Result<Vec<u8>, ServiceError> {
        match self {
            PayloadEncoding::Base64 => B64
                .decode(text)
                .map_err(|e| ServiceError::InvalidEncoding(format!("invalid base64: {e}"))),
            PayloadEncoding::Hex => hex::decode(text)
                .map_err(|e| ServiceError::InvalidEncoding(format!("invalid hex: {e}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// RequestEnvelope
// ---------------------------------------------------------------------------

/// Incoming request frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Client-chosen correlation id. Assigned on receipt when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub operation: Operation,
    pub algorithm: String,
    /// Text-encoded payload bytes.
    pub payload: String,
    /// Payload encoding; defaults to base64.
    #[serde(default)]
    pub encoding: PayloadEncoding,
}

impl RequestEnvelope {
    /// Parse a raw frame into an envelope.
    ///
    /// Fails with [`ServiceError::MalformedEnvelope`] when the frame is not
    /// valid JSON or a required field (`operation`, `algorithm`, `payload`)
    /// is missing or has the wrong type.
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        serde_json::from_str(raw).map_err(|e| ServiceError::MalformedEnvelope(e.to_string()))
    }

    /// Decode the payload and build the pending [`Job`].
    ///
    /// Fails with [`ServiceError::InvalidEncoding`] when the payload field
    /// is not valid base64/hex.
    pub fn into_job(self) -> Result<Job, ServiceError> {
        let payload = self.encoding.decode(&self.payload)?;
        Ok(Job::new(
            self.id,
            self.operation,
            self.algorithm,
            payload,
            self.encoding,
        ))
    }
}

/// Parse and decode a raw request frame in one step.
pub fn decode_request(raw: &str) -> Result<Job, ServiceError> {
    RequestEnvelope::parse(raw)?.into_job()
}

// ---------------------------------------------------------------------------
// ResponseEnvelope
// ---------------------------------------------------------------------------

/// Structured failure detail carried in failed responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error identifier, see [`ServiceError::kind`].
    pub kind: String,
    /// Human-readable description.
    pub message: String,
}

impl From<&ServiceError> for ErrorDetail {
    fn from(err: &ServiceError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Outgoing response frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: String,
    pub status: JobStatus,
    /// Text-encoded result bytes, present only when `status` is completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Failure detail, present only when `status` is failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl ResponseEnvelope {
    /// Build a failed response for a request that never became a job
    /// (malformed frame, queue rejection, shutdown).
    pub fn failure(id: impl Into<String>, error: &ServiceError) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Failed,
            result: None,
            error: Some(ErrorDetail::from(error)),
        }
    }

    /// Build the response for a terminal job.
    ///
    /// A job that somehow reaches this point without a terminal status is
    /// reported as an internal failure rather than dropped, so the client
    /// still receives exactly one correlated response.
    pub fn from_job(job: &Job) -> Self {
        match (job.status(), job.result(), job.error()) {
            (JobStatus::Completed, Some(result), _) => Self {
                id: job.id.clone(),
                status: JobStatus::Completed,
                result: Some(job.encoding.encode(result)),
                error: None,
            },
            (JobStatus::Failed, _, Some(error)) => Self::failure(job.id.clone(), error),
            _ => Self::failure(
                job.id.clone(),
                &ServiceError::Internal(format!(
                    "job finished in non-terminal state {:?}",
                    job.status()
                )),
            ),
        }
    }

    /// Serialize to a single-line JSON frame.
    pub fn to_line(&self) -> String {
        // Serialization of string/enum fields cannot fail.
        serde_json::to_string(self).expect("response envelope serialization")
    }
}

/// Encode a terminal job into a single-line JSON response frame.
pub fn encode_response(job: &Job) -> String {
    ResponseEnvelope::from_job(job).to_line()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
