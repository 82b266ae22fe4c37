//! Flat-world fixtures for spawn worldtests.

use herdgen_core::RegistryKey;
use herdgen_world::{
    descale_temperature, pack_climate, BlockDescriptor, BlockId, BlockRegistry, Chunk,
    ChunkPos, ChunkStorage, ClimateMap, ColumnContext, CreatureSpawnRule, CreatureTypeDef,
    GenerationBuffer, GenerationPass, Heightmap, NatFloat, PlayStyleFlags, SpawnConfig,
    SpawnPlanner, Voxel, WorldView,
    WorldgenSpawnConditions, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z,
};

/// Air.
pub const AIR: BlockId = 0;
/// Full solid block creatures may stand on.
pub const STONE: BlockId = 1;
/// Top soil; same collision as stone.
pub const SOIL: BlockId = 2;
/// Plant without collision.
pub const TALLGRASS: BlockId = 3;
/// Solid block nothing may spawn on.
pub const ICE: BlockId = 4;

/// Parse a registry key, panicking on malformed input (fixtures only).
pub fn key(code: &str) -> RegistryKey {
    RegistryKey::parse(code).unwrap_or_else(|err| panic!("bad fixture key {code}: {err}"))
}

/// Block registry matching the fixture block ids.
pub fn fixture_blocks() -> BlockRegistry {
    BlockRegistry::new(vec![
        BlockDescriptor::passable(key("air")),
        BlockDescriptor::solid(key("stone")),
        BlockDescriptor::solid(key("soil-medium")),
        BlockDescriptor::passable(key("tallgrass-short")),
        BlockDescriptor::solid(key("ice")).with_spawn_rule(CreatureSpawnRule::Never),
    ])
}

/// Climate code decoding to `celsius` at sea level with medium rain.
pub fn mild_climate_code(celsius: f32) -> u32 {
    pack_climate(descale_temperature(celsius), 128, 128)
}

/// A creature that leads surface groups.
pub fn surface_creature(
    code: &str,
    tries_per_chunk: f32,
    group_size: f32,
    companions: &[&str],
) -> CreatureTypeDef {
    CreatureTypeDef::new(key(code))
        .with_hitbox(0.9, 1.2)
        .with_worldgen(WorldgenSpawnConditions {
            try_only_surface: true,
            tries_per_chunk: NatFloat::constant(tries_per_chunk),
            group_size: NatFloat::constant(group_size),
            companions: companions.iter().map(|c| key(c)).collect(),
            ..Default::default()
        })
}

/// Chunk with stone up to `surface - 1`, soil at `surface`, and sky-lit air above.
pub fn flat_chunk(pos: ChunkPos, surface: i32) -> Chunk {
    let surface = surface.clamp(0, CHUNK_SIZE_Y as i32 - 2) as usize;
    Chunk::from_fn(pos, Heightmap::flat(surface as i32), |_, y, _| {
        if y < surface {
            Voxel::block(STONE)
        } else if y == surface {
            Voxel::block(SOIL)
        } else {
            Voxel {
                light_sky: 15,
                ..Voxel::block(AIR)
            }
        }
    })
}

/// A flat world split into generating and live chunk stores.
pub struct FlatWorld {
    /// Top solid block Y of every column.
    pub surface: i32,
    /// Block descriptors for [`AIR`], [`STONE`], [`SOIL`], [`TALLGRASS`], [`ICE`].
    pub blocks: BlockRegistry,
    /// Chunks still being generated.
    pub generating: GenerationBuffer,
    /// Fully generated chunks.
    pub live: ChunkStorage,
    /// Region climate grid.
    pub climate: ClimateMap,
    /// Planner configuration used for views.
    pub config: SpawnConfig,
    /// Play style the world was created with.
    pub play_style: PlayStyleFlags,
}

impl FlatWorld {
    /// Empty world with surface at `surface` and a uniform 15 °C climate.
    pub fn new(surface: i32) -> Self {
        Self {
            surface,
            blocks: fixture_blocks(),
            generating: GenerationBuffer::new(),
            live: ChunkStorage::new(4096),
            climate: ClimateMap::uniform(32, 1, mild_climate_code(15.0)),
            config: SpawnConfig::default(),
            play_style: PlayStyleFlags::SURVIVE_AND_BUILD,
        }
    }

    /// Whether the pipeline would run the creature spawn pass for this world.
    pub fn runs_spawn_pass(&self) -> bool {
        SpawnPlanner::runs_for(GenerationPass::PreDone, self.play_style)
    }

    /// Add a flat chunk to the generation buffer.
    pub fn generate(&mut self, pos: ChunkPos) {
        self.generating.insert(flat_chunk(pos, self.surface));
    }

    /// Add every chunk within `radius` of `center` to the generation buffer.
    pub fn generate_area(&mut self, center: ChunkPos, radius: i32) {
        for x in center.x - radius..=center.x + radius {
            for z in center.z - radius..=center.z + radius {
                self.generate(ChunkPos::new(x, z));
            }
        }
    }

    /// Add a flat chunk to the live world.
    pub fn add_live(&mut self, pos: ChunkPos) {
        self.live.insert(flat_chunk(pos, self.surface));
    }

    /// Write a block in whichever store holds its chunk.
    ///
    /// Returns false when neither store has the chunk or `y` is outside the world.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: BlockId) -> bool {
        if y < 0 || y >= CHUNK_SIZE_Y as i32 {
            return false;
        }
        let pos = ChunkPos::containing(x, z);
        let local_x = x.rem_euclid(CHUNK_SIZE_X as i32) as usize;
        let local_z = z.rem_euclid(CHUNK_SIZE_Z as i32) as usize;
        let chunk = match self.generating.get_mut(pos) {
            Some(chunk) => chunk,
            None => match self.live.get_mut(pos) {
                Some(chunk) => chunk,
                None => return false,
            },
        };
        chunk
            .set_voxel(local_x, y as usize, local_z, Voxel::block(id))
            .is_ok()
    }

    /// Read view over both stores.
    pub fn view(&self) -> WorldView<'_> {
        WorldView::new(
            &self.generating,
            &self.live,
            &self.blocks,
            self.config.world_bounds,
        )
    }

    /// Column context for a generating chunk.
    pub fn column(&self, pos: ChunkPos) -> Option<ColumnContext<'_>> {
        self.generating
            .get(pos)
            .map(|chunk| ColumnContext::new(chunk, &self.climate))
    }
}
