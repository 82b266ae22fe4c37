//! Packed chunk voxel payloads.
//!
//! Chunks handed over mid-generation keep their voxels as a zstd-compressed
//! bincode payload guarded by a CRC32. Decoding happens lazily the first
//! time a reader needs the voxels.

use crc32fast::Hasher;
use thiserror::Error;

use crate::chunk::{Voxel, CHUNK_VOLUME};

/// zstd level used for packed chunks (balanced speed/compression).
const PACK_LEVEL: i32 = 3;

/// Errors raised while packing or unpacking chunk voxels.
#[derive(Debug, Error)]
pub enum ChunkCodecError {
    #[error("failed to serialize voxels: {0}")]
    Serialize(#[source] bincode::Error),
    #[error("failed to compress voxels: {0}")]
    Compress(#[source] std::io::Error),
    #[error("CRC32 mismatch: expected {expected:08X}, got {actual:08X}")]
    Checksum { expected: u32, actual: u32 },
    #[error("failed to decompress voxels: {0}")]
    Decompress(#[source] std::io::Error),
    #[error("failed to deserialize voxels: {0}")]
    Deserialize(#[source] bincode::Error),
    #[error("voxel payload has {actual} entries, expected {expected}")]
    Length { expected: usize, actual: usize },
}

/// Compressed voxel payload plus checksum.
#[derive(Debug, Clone)]
pub struct PackedVoxels {
    crc32: u32,
    payload: Vec<u8>,
}

impl PackedVoxels {
    /// Compressed size in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Rebuild from raw parts (e.g., read back from disk or the network).
    pub fn from_parts(crc32: u32, payload: Vec<u8>) -> Self {
        Self { crc32, payload }
    }

    pub fn crc32(&self) -> u32 {
        self.crc32
    }
}

fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Serialize and compress a chunk's voxels.
pub fn encode_voxels(voxels: &[Voxel]) -> Result<PackedVoxels, ChunkCodecError> {
    let serialized = bincode::serialize(voxels).map_err(ChunkCodecError::Serialize)?;
    let payload =
        zstd::encode_all(&serialized[..], PACK_LEVEL).map_err(ChunkCodecError::Compress)?;
    Ok(PackedVoxels {
        crc32: checksum(&payload),
        payload,
    })
}

/// Verify, decompress and deserialize a packed payload.
pub fn decode_voxels(packed: &PackedVoxels) -> Result<Vec<Voxel>, ChunkCodecError> {
    let actual = checksum(&packed.payload);
    if actual != packed.crc32 {
        return Err(ChunkCodecError::Checksum {
            expected: packed.crc32,
            actual,
        });
    }

    let decompressed =
        zstd::decode_all(&packed.payload[..]).map_err(ChunkCodecError::Decompress)?;
    let voxels: Vec<Voxel> =
        bincode::deserialize(&decompressed).map_err(ChunkCodecError::Deserialize)?;

    if voxels.len() != CHUNK_VOLUME {
        return Err(ChunkCodecError::Length {
            expected: CHUNK_VOLUME,
            actual: voxels.len(),
        });
    }
    Ok(voxels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_payload_is_smaller_than_raw() {
        let mut voxels = vec![Voxel::default(); CHUNK_VOLUME];
        voxels[100] = Voxel::block(4);
        let packed = encode_voxels(&voxels).unwrap();
        assert!(packed.len() < CHUNK_VOLUME);
        assert_eq!(decode_voxels(&packed).unwrap()[100].id, 4);
    }

    #[test]
    fn corrupted_payload_fails_checksum() {
        let voxels = vec![Voxel::block(1); CHUNK_VOLUME];
        let packed = encode_voxels(&voxels).unwrap();
        let mut bytes = packed.payload.clone();
        bytes[0] ^= 0xFF;
        let corrupted = PackedVoxels::from_parts(packed.crc32(), bytes);
        assert!(matches!(
            decode_voxels(&corrupted),
            Err(ChunkCodecError::Checksum { .. })
        ));
    }

    #[test]
    fn truncated_voxel_array_is_rejected() {
        let short = vec![Voxel::default(); 10];
        let packed = encode_voxels(&short).unwrap();
        assert!(matches!(
            decode_voxels(&packed),
            Err(ChunkCodecError::Length { actual: 10, .. })
        ));
    }
}
