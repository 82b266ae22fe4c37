//! Worldgen terrain height maps.
//!
//! Each chunk column carries the height of its topmost terrain block per
//! (x, z), recorded by the generator. Spawning reads it to place
//! surface-only creatures one block above the ground.

use crate::chunk::{CHUNK_SIZE_X, CHUNK_SIZE_Z};

/// Heightmap for a single chunk (16x16).
///
/// Each value represents the topmost solid block Y coordinate at that (x, z) position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heightmap {
    /// Indexed as heights[z][x] for cache-friendly iteration.
    heights: [[i32; CHUNK_SIZE_X]; CHUNK_SIZE_Z],
}

impl Heightmap {
    /// Every column at the same height.
    pub fn flat(height: i32) -> Self {
        Self {
            heights: [[height; CHUNK_SIZE_X]; CHUNK_SIZE_Z],
        }
    }

    /// Build from a `(local_x, local_z) -> height` function.
    pub fn from_fn(mut f: impl FnMut(usize, usize) -> i32) -> Self {
        let mut heights = [[0i32; CHUNK_SIZE_X]; CHUNK_SIZE_Z];
        for (local_z, row) in heights.iter_mut().enumerate() {
            for (local_x, cell) in row.iter_mut().enumerate() {
                *cell = f(local_x, local_z);
            }
        }
        Self { heights }
    }

    /// Wrap a raw `[z][x]` array.
    pub fn from_heights(heights: [[i32; CHUNK_SIZE_X]; CHUNK_SIZE_Z]) -> Self {
        Self { heights }
    }

    /// Get the height at a specific local (x, z) coordinate within the chunk.
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds.
    pub fn get(&self, local_x: usize, local_z: usize) -> i32 {
        assert!(local_x < CHUNK_SIZE_X, "local_x out of bounds");
        assert!(local_z < CHUNK_SIZE_Z, "local_z out of bounds");
        self.heights[local_z][local_x]
    }

    /// Height under a world block column, wrapping into this chunk's footprint.
    pub fn at_world(&self, world_x: i32, world_z: i32) -> i32 {
        let local_x = world_x.rem_euclid(CHUNK_SIZE_X as i32) as usize;
        let local_z = world_z.rem_euclid(CHUNK_SIZE_Z as i32) as usize;
        self.heights[local_z][local_x]
    }

    pub fn set(&mut self, local_x: usize, local_z: usize, height: i32) {
        self.heights[local_z][local_x] = height;
    }

    /// Indexed as [z][x].
    pub fn heights(&self) -> &[[i32; CHUNK_SIZE_X]; CHUNK_SIZE_Z] {
        &self.heights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fn_is_indexed_x_then_z() {
        let map = Heightmap::from_fn(|x, z| (x * 100 + z) as i32);
        assert_eq!(map.get(3, 7), 307);
        assert_eq!(map.heights()[7][3], 307);
    }

    #[test]
    fn at_world_wraps_negative_coordinates() {
        let mut map = Heightmap::flat(64);
        map.set(15, 0, 80);
        assert_eq!(map.at_world(-1, 16), 80);
        assert_eq!(map.at_world(31, 0), 80);
        assert_eq!(map.at_world(0, 0), 64);
    }

    #[test]
    #[should_panic(expected = "local_x out of bounds")]
    fn get_panics_out_of_bounds() {
        Heightmap::flat(0).get(CHUNK_SIZE_X, 0);
    }
}
