#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod herd;
pub mod registry;

use rand::{rngs::StdRng, SeedableRng};

pub use herd::{HerdId, HerdIdAllocator};
pub use registry::{wildcard_match, RegistryKey, RegistryKeyError, DEFAULT_NAMESPACE};

/// Offset subtracted from the world seed to derive the worldgen spawn stream.
pub const WORLDGEN_SPAWN_SEED_OFFSET: u64 = 18722;

/// Derive the reproducible RNG used by worldgen spawning.
///
/// The stream is seeded once per world load (`world_seed - offset`, wrapping)
/// and is never reseeded per chunk.
pub fn worldgen_rng(world_seed: u64, offset: u64) -> StdRng {
    StdRng::seed_from_u64(world_seed.wrapping_sub(offset))
}
