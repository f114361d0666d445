//! Built-in compression algorithm implementations.
//!
//! Each implementation is deterministic for a fixed input: the gzip encoder
//! uses the default header with a zero mtime, zstd runs at a fixed level,
//! and lz4 uses size-prepended framing.

use std::io::Read;

use baler_core::ServiceError;

pub mod gzip;
pub mod lz4;
pub mod zstd;

pub use gzip::Gzip;
pub use lz4::Lz4;
pub use zstd::Zstd;

/// A compression capability.
///
/// Implementations must be safe to share across worker tasks and must never
/// panic or hang on corrupt input.
pub trait Algorithm: Send + Sync + std::fmt::Debug {
    /// Registry key for this implementation.
    fn name(&self) -> &'static str;

    /// Compress `data`.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, ServiceError>;

    /// Decompress `data`, producing at most `max_size` bytes.
    ///
    /// Fails with [`ServiceError::CorruptPayload`] on malformed input and
    /// with [`ServiceError::PayloadTooLarge`] when the output would exceed
    /// the bound. Length fields inside `data` are untrusted; no
    /// implementation allocates output sized from them beyond `max_size`.
    fn decompress(&self, data: &[u8], max_size: usize) -> Result<Vec<u8>, ServiceError>;
}

/// Read a decoder to the end, bounding the output at `max_size` bytes.
///
/// The reader is capped at `max_size + 1` so an oversized stream is detected
/// without ever buffering more than one byte past the limit.
pub(crate) fn read_bounded<R: Read>(reader: R, max_size: usize) -> Result<Vec<u8>, ServiceError> {
    let mut limited = reader.take((max_size as u64).saturating_add(1));
    let mut out = Vec::new();
    limited
        .read_to_end(&mut out)
        .map_err(|e| ServiceError::CorruptPayload(e.to_string()))?;
    if out.len() > max_size {
        return Err(ServiceError::PayloadTooLarge { limit: max_size });
    }
    Ok(out)
}
