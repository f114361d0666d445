//! Baler domain types and wire codec.
//!
//! Building blocks shared by the engine and server crates:
//!
//! - [`Job`] — one compress/decompress work unit and its lifecycle.
//! - [`ServiceError`] — the error taxonomy carried on failed jobs and
//!   surfaced in error envelopes.
//! - [`envelope`] — the JSON request/response envelopes and the
//!   text-safe payload codec (base64 / hex).
//!
//! This crate has no internal dependencies.

pub mod envelope;
pub mod error;
pub mod job;

pub use envelope::{
    decode_request, encode_response, ErrorDetail, PayloadEncoding, RequestEnvelope,
    ResponseEnvelope,
};
pub use error::ServiceError;
pub use job::{Job, JobStatus, Operation};
