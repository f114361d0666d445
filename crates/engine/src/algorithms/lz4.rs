//! LZ4 via `lz4_flex`, size-prepended framing.

use baler_core::ServiceError;

use super::Algorithm;

/// Width of the little-endian length prefix in the framing.
const SIZE_PREFIX_LEN: usize = 4;

/// LZ4 block compression with a 4-byte decompressed-size prefix.
#[derive(Debug)]
pub struct Lz4;

impl Algorithm for Lz4 {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, ServiceError> {
        Ok(lz4_flex::compress_prepend_size(data))
    }

    fn decompress(&self, data: &[u8], max_size: usize) -> Result<Vec<u8>, ServiceError> {
        // The size prefix comes from the wire and is untrusted: validate it
        // against the bound before lz4_flex allocates the output buffer.
        let prefix: [u8; SIZE_PREFIX_LEN] = data
            .get(..SIZE_PREFIX_LEN)
            .and_then(|p| p.try_into().ok())
            .ok_or_else(|| {
                ServiceError::CorruptPayload("missing decompressed-size prefix".into())
            })?;
        let declared = u32::from_le_bytes(prefix) as usize;
        if declared > max_size {
            return Err(ServiceError::PayloadTooLarge { limit: max_size });
        }

        lz4_flex::decompress_size_prepended(data)
            .map_err(|e| ServiceError::CorruptPayload(e.to_string()))
    }
}
