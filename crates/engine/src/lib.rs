//! Baler compression engine.
//!
//! Pluggable compression behind a capability trait:
//!
//! - [`Algorithm`] — the `compress` / `decompress` interface every
//!   implementation exposes.
//! - [`algorithms`] — the built-in gzip, zstd, and lz4 implementations.
//! - [`AlgorithmRegistry`] — immutable name → implementation lookup, built
//!   once at startup and shared read-only with the workers.
//! - [`execute`] — dispatch one job body against the registry.
//!
//! Decompression never trusts length information in the payload: output is
//! bounded by the caller-supplied `max_size` and implementations fail with
//! [`ServiceError::PayloadTooLarge`] instead of allocating past it.

pub mod algorithms;
pub mod registry;

pub use algorithms::Algorithm;
pub use registry::AlgorithmRegistry;

use baler_core::{Operation, ServiceError};

/// Run one operation against the registry.
///
/// Looks up `algorithm` and applies the requested operation to `payload`.
/// `max_size` bounds the decompressed output size; it is not consulted for
/// compression.
pub fn execute(
    registry: &AlgorithmRegistry,
    operation: Operation,
    algorithm: &str,
    payload: &[u8],
    max_size: usize,
) -> Result<Vec<u8>, ServiceError> {
    let algo = registry.get(algorithm)?;
    match operation {
        Operation::Compress => algo.compress(payload),
        Operation::Decompress => algo.decompress(payload, max_size),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const MAX: usize = 1024 * 1024;

    #[test]
    fn execute_compress_then_decompress_round_trips() {
        let registry = AlgorithmRegistry::builtin();
        let input = b"the quick brown fox jumps over the lazy dog".repeat(50);

        for name in registry.names() {
            let compressed =
                execute(&registry, Operation::Compress, name, &input, MAX).expect("compress");
            let restored =
                execute(&registry, Operation::Decompress, name, &compressed, MAX)
                    .expect("decompress");
            assert_eq!(restored, input, "round trip failed for {name}");
        }
    }

    #[test]
    fn execute_unknown_algorithm_fails() {
        let registry = AlgorithmRegistry::builtin();
        assert_matches!(
            execute(&registry, Operation::Compress, "lzma", b"x", MAX),
            Err(ServiceError::UnsupportedAlgorithm(name)) if name == "lzma"
        );
    }
}
