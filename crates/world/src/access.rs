//! Read access to terrain spanning two chunk stores.
//!
//! Chunks still being generated live in a [`GenerationBuffer`]; finished
//! chunks live in the world's [`ChunkStorage`]. Spawning near a column edge
//! can touch either, so reads go through a [`WorldView`] that prefers the
//! generating copy and falls back to the live one.

use std::collections::BTreeMap;

use tracing::warn;

use crate::blocks::{BlockDescriptor, BlockRegistry};
use crate::chunk::{Chunk, ChunkPos, LocalPos, Voxel};
use crate::config::WorldBounds;
use crate::storage::ChunkStorage;

/// Anything that can hand out chunks by position.
pub trait ChunkSource {
    fn chunk(&self, pos: ChunkPos) -> Option<&Chunk>;
}

/// Which store a chunk was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPath {
    Generating,
    Live,
}

/// Chunks currently mid-generation, keyed by position.
#[derive(Default)]
pub struct GenerationBuffer {
    chunks: BTreeMap<ChunkPos, Chunk>,
}

impl GenerationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chunk: Chunk) -> Option<Chunk> {
        self.chunks.insert(chunk.position(), chunk)
    }

    pub fn get(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    pub fn get_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        self.chunks.get_mut(&pos)
    }

    pub fn remove(&mut self, pos: ChunkPos) -> Option<Chunk> {
        self.chunks.remove(&pos)
    }

    /// Move a finished chunk into the live world.
    pub fn promote(&mut self, pos: ChunkPos, live: &mut ChunkStorage) -> bool {
        match self.chunks.remove(&pos) {
            Some(chunk) => {
                live.insert(chunk);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter_positions(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.chunks.keys().copied()
    }
}

impl ChunkSource for GenerationBuffer {
    fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.get(pos)
    }
}

/// Combined read view over generating and live chunks.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    generating: &'a dyn ChunkSource,
    live: &'a dyn ChunkSource,
    blocks: &'a BlockRegistry,
    bounds: WorldBounds,
}

impl<'a> WorldView<'a> {
    pub fn new(
        generating: &'a dyn ChunkSource,
        live: &'a dyn ChunkSource,
        blocks: &'a BlockRegistry,
        bounds: WorldBounds,
    ) -> Self {
        Self {
            generating,
            live,
            blocks,
            bounds,
        }
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    pub fn blocks(&self) -> &'a BlockRegistry {
        self.blocks
    }

    /// Whether the chunk is held by the generation buffer.
    pub fn is_generating(&self, pos: ChunkPos) -> bool {
        self.generating.chunk(pos).is_some()
    }

    /// Find a chunk, preferring the generating copy.
    pub fn resolve(&self, pos: ChunkPos) -> Option<(&'a Chunk, AccessPath)> {
        if let Some(chunk) = self.generating.chunk(pos) {
            return Some((chunk, AccessPath::Generating));
        }
        self.live.chunk(pos).map(|chunk| (chunk, AccessPath::Live))
    }

    /// Voxel at a world block position.
    ///
    /// `None` when the position is outside the world height, no store holds
    /// its chunk, or the chunk's packed payload is corrupt.
    pub fn voxel_at(&self, x: i32, y: i32, z: i32) -> Option<Voxel> {
        let (chunk_pos, local) = LocalPos::from_world(x, y, z)?;
        let (chunk, _) = self.resolve(chunk_pos)?;
        match chunk.voxels() {
            Ok(voxels) => Some(voxels[local.index()]),
            Err(err) => {
                warn!(chunk = %chunk_pos, %err, "Chunk payload failed to decode");
                None
            }
        }
    }

    /// Block descriptor at a world block position (`None` for unknown ids too).
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> Option<&'a BlockDescriptor> {
        let voxel = self.voxel_at(x, y, z)?;
        self.blocks.descriptor(voxel.id)
    }

    /// Max of sky and block light at a position.
    pub fn light_level(&self, x: i32, y: i32, z: i32) -> Option<u8> {
        self.voxel_at(x, y, z).map(|v| v.max_light())
    }

    /// Worldgen terrain height of the column containing `(x, z)`.
    pub fn terrain_height(&self, x: i32, z: i32) -> Option<i32> {
        let (chunk, _) = self.resolve(ChunkPos::containing(x, z))?;
        Some(chunk.heightmap().at_world(x, z))
    }
}
