//! Noise terrain and climate for previews.

use std::collections::BTreeMap;

use herdgen_world::{
    descale_temperature, pack_climate, BlockId, Chunk, ChunkPos, ClimateMap, Heightmap, Voxel,
    CHUNK_SIZE_X, CHUNK_SIZE_Y,
};
use noise::{NoiseFn, Perlin};

pub const AIR: BlockId = 0;
pub const STONE: BlockId = 1;
pub const SOIL: BlockId = 2;
pub const SAND: BlockId = 3;
pub const WATER: BlockId = 4;

/// Climate cells per region edge.
const CLIMATE_CELLS: usize = 32;

/// Multi-octave Perlin field normalised to [-1, 1].
struct Octaves {
    perlin: Perlin,
    octaves: u32,
    frequency: f64,
}

impl Octaves {
    fn new(seed: u32, octaves: u32, frequency: f64) -> Self {
        Self {
            perlin: Perlin::new(seed),
            octaves,
            frequency,
        }
    }

    fn sample(&self, x: f64, z: f64) -> f64 {
        let (mut value, mut amplitude, mut frequency, mut max) = (0.0, 1.0, self.frequency, 0.0);
        for _ in 0..self.octaves {
            value += self.perlin.get([x * frequency, z * frequency]) * amplitude;
            max += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        value / max
    }
}

/// Rolling hills with a water line at sea level.
pub struct NoiseTerrain {
    height: Octaves,
    temperature: Octaves,
    rain: Octaves,
    sea_level: i32,
    region_size: i32,
    climate_cache: BTreeMap<(i32, i32), ClimateMap>,
}

impl NoiseTerrain {
    pub fn new(seed: u64, sea_level: i32, region_size: i32) -> Self {
        let seed = seed as u32;
        Self {
            height: Octaves::new(seed, 4, 0.01),
            temperature: Octaves::new(seed.wrapping_add(3000), 3, 0.002),
            rain: Octaves::new(seed.wrapping_add(4000), 3, 0.002),
            sea_level,
            region_size: region_size.max(CHUNK_SIZE_X as i32),
            climate_cache: BTreeMap::new(),
        }
    }

    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        let n = self.height.sample(x as f64, z as f64);
        let h = self.sea_level as f64 + 4.0 + n * 18.0;
        (h as i32).clamp(1, CHUNK_SIZE_Y as i32 - 2)
    }

    /// Fill a chunk: stone, then soil (sand at the shore), water up to sea level.
    pub fn generate_chunk(&self, pos: ChunkPos) -> Chunk {
        let (ox, oz) = pos.origin();
        let heightmap = Heightmap::from_fn(|x, z| self.surface_height(ox + x as i32, oz + z as i32));
        let tops = heightmap.clone();

        Chunk::from_fn(pos, heightmap, |x, y, z| {
            let top = tops.get(x, z);
            let y = y as i32;
            if y < top {
                Voxel::block(STONE)
            } else if y == top {
                Voxel::block(if top <= self.sea_level + 1 { SAND } else { SOIL })
            } else if y <= self.sea_level {
                Voxel {
                    light_sky: 12,
                    ..Voxel::block(WATER)
                }
            } else {
                Voxel {
                    light_sky: 15,
                    ..Voxel::block(AIR)
                }
            }
        })
    }

    /// Climate grid for the region containing `chunk`.
    pub fn climate_for(&mut self, chunk: ChunkPos) -> &ClimateMap {
        let region_chunks = self.region_size / CHUNK_SIZE_X as i32;
        let region = (chunk.x.div_euclid(region_chunks), chunk.z.div_euclid(region_chunks));
        let region_size = self.region_size;
        let (temperature, rain) = (&self.temperature, &self.rain);
        self.climate_cache.entry(region).or_insert_with(|| {
            let cell = region_size as f64 / CLIMATE_CELLS as f64;
            let origin = (region.0 as f64 * region_size as f64, region.1 as f64 * region_size as f64);
            ClimateMap::from_fn(CLIMATE_CELLS, 1, |cx, cz| {
                let wx = origin.0 + cx as f64 * cell;
                let wz = origin.1 + cz as f64 * cell;
                let celsius = 12.0 + temperature.sample(wx, wz) * 20.0;
                let wetness = ((rain.sample(wx, wz) + 1.0) * 127.5).clamp(0.0, 255.0);
                pack_climate(descale_temperature(celsius as f32), wetness as u8, 128)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terrain_is_deterministic() {
        let a = NoiseTerrain::new(7, 64, 512);
        let b = NoiseTerrain::new(7, 64, 512);
        for x in [-100, 0, 37, 900] {
            assert_eq!(a.surface_height(x, x / 2), b.surface_height(x, x / 2));
        }
    }

    #[test]
    fn generated_chunk_matches_heightmap() {
        let terrain = NoiseTerrain::new(7, 64, 512);
        let chunk = terrain.generate_chunk(ChunkPos::new(-2, 3));
        let top = chunk.heightmap().get(5, 9);
        assert_eq!(top, terrain.surface_height(-32 + 5, 48 + 9));
        assert_ne!(chunk.voxel(5, top as usize, 9).unwrap().id, AIR);
        assert!(matches!(chunk.voxel(5, top as usize + 1, 9).unwrap().id, AIR | WATER));
    }

    #[test]
    fn climate_maps_are_cached_per_region() {
        let mut terrain = NoiseTerrain::new(7, 64, 512);
        let first = terrain.climate_for(ChunkPos::new(0, 0)).clone();
        let same_region = terrain.climate_for(ChunkPos::new(31, 31)).clone();
        assert_eq!(first, same_region);
        assert_eq!(terrain.climate_cache.len(), 1);
        terrain.climate_for(ChunkPos::new(-1, 0));
        assert_eq!(terrain.climate_cache.len(), 2);
    }
}
