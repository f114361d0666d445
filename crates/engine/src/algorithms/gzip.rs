//! gzip via `flate2`.

use std::io::Read;

use baler_core::ServiceError;
use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;

use super::{read_bounded, Algorithm};

/// gzip (RFC 1952) at the default compression level.
///
/// The read-side encoder emits a header with a zero mtime, so output is
/// deterministic for a fixed input.
#[derive(Debug)]
pub struct Gzip;

impl Algorithm for Gzip {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let mut encoder = GzEncoder::new(data, Compression::default());
        let mut compressed = Vec::new();
        encoder
            .read_to_end(&mut compressed)
            .map_err(|e| ServiceError::Internal(format!("gzip compression failed: {e}")))?;
        Ok(compressed)
    }

    fn decompress(&self, data: &[u8], max_size: usize) -> Result<Vec<u8>, ServiceError> {
        read_bounded(GzDecoder::new(data), max_size)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const MAX: usize = 1024 * 1024;

    #[test]
    fn round_trip() {
        let data = b"Baler gzip round trip test data.".repeat(20);
        let compressed = Gzip.compress(&data).expect("compress");
        let restored = Gzip.decompress(&compressed, MAX).expect("decompress");
        assert_eq!(restored, data);
    }

    #[test]
    fn round_trip_empty() {
        let compressed = Gzip.compress(b"").expect("compress");
        assert_eq!(Gzip.decompress(&compressed, MAX).expect("decompress"), b"");
    }

    #[test]
    fn deterministic_output() {
        let data = b"same bytes in, same bytes out";
        assert_eq!(
            Gzip.compress(data).expect("first"),
            Gzip.compress(data).expect("second")
        );
    }

    #[test]
    fn corrupt_input_fails() {
        let corrupted = [0xFF, 0xFE, 0x00, 0x01, 0x02, 0x03];
        assert_matches!(
            Gzip.decompress(&corrupted, MAX),
            Err(ServiceError::CorruptPayload(_))
        );
    }

    #[test]
    fn truncated_input_fails() {
        let data = b"truncation target".repeat(10);
        let compressed = Gzip.compress(&data).expect("compress");
        let truncated = &compressed[..compressed.len() / 2];
        assert_matches!(
            Gzip.decompress(truncated, MAX),
            Err(ServiceError::CorruptPayload(_))
        );
    }

    #[test]
    fn output_bound_is_enforced() {
        // Highly compressible input: expands far past the bound.
        let data = vec![0u8; 1024 * 1024];
        let compressed = Gzip.compress(&data).expect("compress");
        assert_matches!(
            Gzip.decompress(&compressed, 1024),
            Err(ServiceError::PayloadTooLarge { limit: 1024 })
        );
    }
}
