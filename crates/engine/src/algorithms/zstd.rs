//! Zstandard via the `zstd` crate.

use baler_core::ServiceError;

use super::{read_bounded, Algorithm};

/// Compression level passed to the zstd encoder.
const LEVEL: i32 = 3;

/// Zstandard at a fixed compression level.
#[derive(Debug)]
pub struct Zstd;

impl Algorithm for Zstd {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, ServiceError> {
        zstd::encode_all(data, LEVEL)
            .map_err(|e| ServiceError::Internal(format!("zstd compression failed: {e}")))
    }

    fn decompress(&self, data: &[u8], max_size: usize) -> Result<Vec<u8>, ServiceError> {
        // The streaming decoder validates frame headers incrementally, so a
        // lying frame-content-size field cannot trigger an allocation.
        let decoder = zstd::stream::read::Decoder::new(data)
            .map_err(|e| ServiceError::CorruptPayload(e.to_string()))?;
        read_bounded(decoder, max_size)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const MAX: usize = 1024 * 1024;

    #[test]
    fn round_trip() {
        let data = b"Baler zstd round trip test data.".repeat(20);
        let compressed = Zstd.compress(&data).expect("compress");
        let restored = Zstd.decompress(&compressed, MAX).expect("decompress");
        assert_eq!(restored, data);
    }

    #[test]
    fn round_trip_empty() {
        let compressed = Zstd.compress(b"").expect("compress");
        assert_eq!(Zstd.decompress(&compressed, MAX).expect("decompress"), b"");
    }

    #[test]
    fn deterministic_output() {
        let data = b"same bytes in, same bytes out";
        assert_eq!(
            Zstd.compress(data).expect("first"),
            Zstd.compress(data).expect("second")
        );
    }

    #[test]
    fn corrupt_input_fails() {
        let corrupted = [0xAB, 0xCD, 0xEF, 0x00, 0x11, 0x22];
        assert_matches!(
            Zstd.decompress(&corrupted, MAX),
            Err(ServiceError::CorruptPayload(_))
        );
    }

    #[test]
    fn truncated_input_fails() {
        let data = b"truncation target".repeat(10);
        let compressed = Zstd.compress(&data).expect("compress");
        let truncated = &compressed[..compressed.len() / 2];
        assert_matches!(
            Zstd.decompress(truncated, MAX),
            Err(ServiceError::CorruptPayload(_))
        );
    }

    #[test]
    fn output_bound_is_enforced() {
        let data = vec![0u8; 1024 * 1024];
        let compressed = Zstd.compress(&data).expect("compress");
        assert_matches!(
            Zstd.decompress(&compressed, 1024),
            Err(ServiceError::PayloadTooLarge { limit: 1024 })
        );
    }
}
