use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::codec::{self, ChunkCodecError, PackedVoxels};
use crate::heightmap::Heightmap;

/// Chunk width (X axis) in voxels.
pub const CHUNK_SIZE_X: usize = 16;
/// Chunk height (Y axis) in voxels. A chunk spans the full world height.
pub const CHUNK_SIZE_Y: usize = 256;
/// Chunk depth (Z axis) in voxels.
pub const CHUNK_SIZE_Z: usize = 16;
/// Total voxel count per chunk.
pub const CHUNK_VOLUME: usize = CHUNK_SIZE_X * CHUNK_SIZE_Y * CHUNK_SIZE_Z;

/// Block identifier referencing the [`crate::BlockRegistry`].
pub type BlockId = u16;

/// Reserved ID for air.
pub const BLOCK_AIR: BlockId = 0;

/// Chunk-local position (X, Y, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl LocalPos {
    /// Convert to a linear index within the voxel array.
    pub fn index(self) -> usize {
        debug_assert!(self.x < CHUNK_SIZE_X);
        debug_assert!(self.y < CHUNK_SIZE_Y);
        debug_assert!(self.z < CHUNK_SIZE_Z);
        (self.y * CHUNK_SIZE_Z + self.z) * CHUNK_SIZE_X + self.x
    }

    /// Split a world block position into its chunk and local offset.
    ///
    /// Returns `None` when `y` is outside the world height.
    pub fn from_world(x: i32, y: i32, z: i32) -> Option<(ChunkPos, LocalPos)> {
        if y < 0 || y >= CHUNK_SIZE_Y as i32 {
            return None;
        }
        let local = LocalPos {
            x: x.rem_euclid(CHUNK_SIZE_X as i32) as usize,
            y: y as usize,
            z: z.rem_euclid(CHUNK_SIZE_Z as i32) as usize,
        };
        Some((ChunkPos::containing(x, z), local))
    }
}

/// Chunk coordinate (X,Z) in chunk space.
/// Implements Ord for deterministic iteration in BTreeMap/BTreeSet (sorts by x, then z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the world block column `(x, z)`.
    pub fn containing(x: i32, z: i32) -> Self {
        Self {
            x: x.div_euclid(CHUNK_SIZE_X as i32),
            z: z.div_euclid(CHUNK_SIZE_Z as i32),
        }
    }

    /// Chunk containing a continuous world position.
    pub fn containing_point(x: f64, z: f64) -> Self {
        Self::containing(x.floor() as i32, z.floor() as i32)
    }

    /// World-space block coordinates of this chunk's minimum corner.
    pub fn origin(self) -> (i32, i32) {
        (self.x * CHUNK_SIZE_X as i32, self.z * CHUNK_SIZE_Z as i32)
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Per-voxel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Voxel {
    pub id: BlockId,
    pub state: u16,
    pub light_sky: u8,
    pub light_block: u8,
}

impl Voxel {
    /// Voxel of block `id` with no light.
    pub const fn block(id: BlockId) -> Self {
        Self {
            id,
            state: 0,
            light_sky: 0,
            light_block: 0,
        }
    }

    #[inline]
    pub fn is_air(&self) -> bool {
        self.id == BLOCK_AIR
    }

    /// Brightest of the two light channels (full daylight assumed for sky light).
    #[inline]
    pub fn max_light(&self) -> u8 {
        self.light_sky.max(self.light_block)
    }
}

/// A full-height chunk column.
///
/// Chunks that are still mid-generation may arrive packed (compressed voxel
/// payload). Readers go through [`Chunk::voxels`], which decodes the payload
/// on first access, so a packed chunk never has to be unpacked up front.
pub struct Chunk {
    position: ChunkPos,
    heightmap: Heightmap,
    voxels: OnceLock<Vec<Voxel>>,
    packed: Option<PackedVoxels>,
}

impl Chunk {
    /// Allocate a fresh chunk filled with air.
    pub fn new(position: ChunkPos) -> Self {
        Self {
            position,
            heightmap: Heightmap::flat(0),
            voxels: OnceLock::from(vec![Voxel::default(); CHUNK_VOLUME]),
            packed: None,
        }
    }

    /// Build an unpacked chunk from `voxel(x, y, z)` at every local position.
    pub fn from_fn(
        position: ChunkPos,
        heightmap: Heightmap,
        mut voxel: impl FnMut(usize, usize, usize) -> Voxel,
    ) -> Self {
        let mut voxels = vec![Voxel::default(); CHUNK_VOLUME];
        for y in 0..CHUNK_SIZE_Y {
            for z in 0..CHUNK_SIZE_Z {
                for x in 0..CHUNK_SIZE_X {
                    voxels[LocalPos { x, y, z }.index()] = voxel(x, y, z);
                }
            }
        }
        Self {
            position,
            heightmap,
            voxels: OnceLock::from(voxels),
            packed: None,
        }
    }

    /// Wrap a packed payload; voxels are decoded lazily.
    pub fn from_packed(position: ChunkPos, heightmap: Heightmap, packed: PackedVoxels) -> Self {
        Self {
            position,
            heightmap,
            voxels: OnceLock::new(),
            packed: Some(packed),
        }
    }

    #[inline]
    pub fn position(&self) -> ChunkPos {
        self.position
    }

    /// Worldgen terrain height map for this column.
    pub fn heightmap(&self) -> &Heightmap {
        &self.heightmap
    }

    pub fn set_heightmap(&mut self, heightmap: Heightmap) {
        self.heightmap = heightmap;
    }

    /// Whether voxel data is still waiting to be decoded.
    pub fn is_packed(&self) -> bool {
        self.voxels.get().is_none()
    }

    /// Borrow voxel storage, decoding a packed payload on first access.
    pub fn voxels(&self) -> Result<&[Voxel], ChunkCodecError> {
        if let Some(voxels) = self.voxels.get() {
            return Ok(voxels.as_slice());
        }
        let decoded = match &self.packed {
            Some(packed) => codec::decode_voxels(packed)?,
            None => vec![Voxel::default(); CHUNK_VOLUME],
        };
        Ok(self.voxels.get_or_init(|| decoded).as_slice())
    }

    /// Fetch a voxel copy.
    pub fn voxel(&self, x: usize, y: usize, z: usize) -> Result<Voxel, ChunkCodecError> {
        let idx = LocalPos { x, y, z }.index();
        Ok(self.voxels()?[idx])
    }

    /// Decode the payload now (no-op for unpacked chunks).
    pub fn unpack(&mut self) -> Result<(), ChunkCodecError> {
        self.voxels().map(|_| ())
    }

    /// Set a voxel, decoding a packed payload first.
    ///
    /// Fails only when the packed payload cannot be decoded; the chunk is
    /// left untouched in that case.
    pub fn set_voxel(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        voxel: Voxel,
    ) -> Result<(), ChunkCodecError> {
        let idx = LocalPos { x, y, z }.index();
        let mut voxels = match self.voxels.take() {
            Some(voxels) => voxels,
            None => match &self.packed {
                Some(packed) => codec::decode_voxels(packed)?,
                None => vec![Voxel::default(); CHUNK_VOLUME],
            },
        };
        voxels[idx] = voxel;
        self.voxels = OnceLock::from(voxels);
        // The payload no longer matches; pack() re-encodes from the voxels.
        self.packed = None;
        Ok(())
    }

    /// Compress voxel data and drop the decoded copy.
    pub fn pack(&mut self) -> Result<(), ChunkCodecError> {
        if let Some(voxels) = self.voxels.get() {
            self.packed = Some(codec::encode_voxels(voxels)?);
            self.voxels = OnceLock::new();
        }
        Ok(())
    }

    /// Recompute the height map as the topmost voxel for which `is_ground`
    /// holds in each column (0 when the column is empty).
    pub fn recompute_heightmap(
        &mut self,
        is_ground: impl Fn(BlockId) -> bool,
    ) -> Result<(), ChunkCodecError> {
        let voxels = self.voxels()?;
        let heightmap = Heightmap::from_fn(|x, z| {
            (0..CHUNK_SIZE_Y)
                .rev()
                .find(|&y| is_ground(voxels[LocalPos { x, y, z }.index()].id))
                .map_or(0, |y| y as i32)
        });
        self.heightmap = heightmap;
        Ok(())
    }
}
