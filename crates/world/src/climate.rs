//! Region climate grids and the per-column corner sample used by spawning.
//!
//! Climate cells pack three bytes as `0xTTRRFF`: temperature, rain and
//! fertility. Values between cells are interpolated channel by channel.

use crate::chunk::{ChunkPos, CHUNK_SIZE_X, CHUNK_SIZE_Z};

/// Padded square grid of packed climate codes covering one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClimateMap {
    inner_size: usize,
    padding: usize,
    data: Vec<u32>,
}

impl ClimateMap {
    /// Wrap a `(inner_size + 2 * padding)^2` row-major grid.
    ///
    /// Returns `None` when the data length does not match.
    pub fn new(inner_size: usize, padding: usize, data: Vec<u32>) -> Option<Self> {
        let size = inner_size + 2 * padding;
        (inner_size > 0 && data.len() == size * size).then_some(Self {
            inner_size,
            padding,
            data,
        })
    }

    /// Grid with one code everywhere.
    pub fn uniform(inner_size: usize, padding: usize, code: u32) -> Self {
        let size = inner_size.max(1) + 2 * padding;
        Self {
            inner_size: inner_size.max(1),
            padding,
            data: vec![code; size * size],
        }
    }

    /// Build the unpadded cells from a function; padding copies the nearest edge.
    pub fn from_fn(inner_size: usize, padding: usize, mut f: impl FnMut(usize, usize) -> u32) -> Self {
        let inner_size = inner_size.max(1);
        let size = inner_size + 2 * padding;
        let mut data = Vec::with_capacity(size * size);
        for z in 0..size {
            for x in 0..size {
                let ix = x.saturating_sub(padding).min(inner_size - 1);
                let iz = z.saturating_sub(padding).min(inner_size - 1);
                data.push(f(ix, iz));
            }
        }
        Self {
            inner_size,
            padding,
            data,
        }
    }

    pub fn inner_size(&self) -> usize {
        self.inner_size
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    fn size(&self) -> usize {
        self.inner_size + 2 * self.padding
    }

    /// Read a cell in unpadded coordinates, clamping into the padded grid.
    pub fn get_unpadded(&self, x: i32, z: i32) -> u32 {
        let max = self.size() as i64 - 1;
        let px = (x as i64 + self.padding as i64).clamp(0, max) as usize;
        let pz = (z as i64 + self.padding as i64).clamp(0, max) as usize;
        self.data[pz * self.size() + px]
    }
}

/// Decoded climate at one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Climate {
    /// Degrees Celsius, height-adjusted.
    pub temperature: f32,
    /// 0..=1
    pub rain: f32,
    /// 0..=1
    pub fertility: f32,
}

/// The four climate cells around one chunk column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimateSample {
    pub up_left: u32,
    pub up_right: u32,
    pub bot_left: u32,
    pub bot_right: u32,
}

impl ClimateSample {
    /// Same code at every corner.
    pub fn uniform(code: u32) -> Self {
        Self {
            up_left: code,
            up_right: code,
            bot_left: code,
            bot_right: code,
        }
    }

    /// Corner sample for a chunk column, given the region grid it lies in.
    pub fn for_chunk(map: &ClimateMap, chunk: ChunkPos, region_size_in_chunks: i32) -> Self {
        let region_chunks = region_size_in_chunks.max(1);
        let rel_x = chunk.x.rem_euclid(region_chunks) as f32;
        let rel_z = chunk.z.rem_euclid(region_chunks) as f32;
        let factor = map.inner_size() as f32 / region_chunks as f32;

        let cell = |x: f32, z: f32| map.get_unpadded(x as i32, z as i32);
        Self {
            up_left: cell(rel_x * factor, rel_z * factor),
            up_right: cell(rel_x * factor + factor, rel_z * factor),
            bot_left: cell(rel_x * factor, rel_z * factor + factor),
            bot_right: cell(rel_x * factor + factor, rel_z * factor + factor),
        }
    }

    /// Packed code at a fractional offset `(fx, fz)` in `[0, 1)` within the column.
    pub fn at(&self, fx: f32, fz: f32) -> u32 {
        bilerp_packed(
            fx,
            fz,
            self.up_left,
            self.up_right,
            self.bot_left,
            self.bot_right,
        )
    }

    /// Decoded climate at a world position.
    pub fn climate_at(&self, x: f64, y: f64, z: f64, sea_level: i32) -> Climate {
        let fx = x.rem_euclid(CHUNK_SIZE_X as f64) as f32 / CHUNK_SIZE_X as f32;
        let fz = z.rem_euclid(CHUNK_SIZE_Z as f64) as f32 / CHUNK_SIZE_Z as f32;
        let code = self.at(fx, fz);
        let dist = y.floor() as i32 - sea_level;
        Climate {
            temperature: scaled_temperature(channel(code, 16), dist),
            rain: channel(code, 8) as f32 / 255.0,
            fertility: channel(code, 0) as f32 / 255.0,
        }
    }
}

#[inline]
fn channel(code: u32, shift: u32) -> u8 {
    ((code >> shift) & 0xFF) as u8
}

/// Pack temperature, rain and fertility bytes into one code.
pub fn pack_climate(temperature: u8, rain: u8, fertility: u8) -> u32 {
    (temperature as u32) << 16 | (rain as u32) << 8 | fertility as u32
}

/// Height-adjusted temperature in °C from a scaled byte.
pub fn scaled_temperature(raw: u8, dist_to_sea_level: i32) -> f32 {
    ((raw as f32 - dist_to_sea_level as f32 / 1.5) / 4.25 - 20.0).clamp(-20.0, 40.0)
}

/// Inverse of [`scaled_temperature`] at sea level.
pub fn descale_temperature(celsius: f32) -> u8 {
    ((celsius + 20.0) * 4.25).round().clamp(0.0, 255.0) as u8
}

fn bilerp_packed(fx: f32, fz: f32, ul: u32, ur: u32, bl: u32, br: u32) -> u32 {
    let mut out = 0u32;
    for shift in [0u32, 8, 16, 24] {
        let lerp = |a: u32, b: u32, t: f32| {
            let (a, b) = (channel(a, shift) as f32, channel(b, shift) as f32);
            a + (b - a) * t
        };
        let top = lerp(ul, ur, fx);
        let bottom = lerp(bl, br, fx);
        let value = top + (bottom - top) * fz;
        out |= (value as u32 & 0xFF) << shift;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_scaling_matches_reference_points() {
        assert_eq!(scaled_temperature(85, 0), 0.0);
        assert_eq!(scaled_temperature(0, 0), -20.0);
        assert_eq!(scaled_temperature(255, 0), 40.0);
        // 60 blocks above sea level cools by 40 / 4.25 degrees.
        let cooled = scaled_temperature(170, 60);
        assert!((cooled - (130.0 / 4.25 - 20.0)).abs() < 1e-4);
        assert_eq!(descale_temperature(0.0), 85);
    }

    #[test]
    fn bilerp_interpolates_each_channel() {
        let sample = ClimateSample {
            up_left: pack_climate(0, 0, 0),
            up_right: pack_climate(200, 100, 0),
            bot_left: pack_climate(0, 0, 0),
            bot_right: pack_climate(200, 100, 0),
        };
        assert_eq!(sample.at(0.0, 0.0), pack_climate(0, 0, 0));
        assert_eq!(sample.at(0.5, 0.3), pack_climate(100, 50, 0));
        // Rain must not bleed into temperature.
        assert_eq!(channel(sample.at(0.5, 0.5), 16), 100);
    }

    #[test]
    fn climate_at_decodes_rain_and_height() {
        let sample = ClimateSample::uniform(pack_climate(85, 255, 51));
        let at_sea = sample.climate_at(3.5, 64.005, -7.5, 64);
        assert_eq!(at_sea.temperature, 0.0);
        assert_eq!(at_sea.rain, 1.0);
        assert!((at_sea.fertility - 0.2).abs() < 1e-6);

        let high = sample.climate_at(3.5, 124.0, -7.5, 64);
        assert!(high.temperature < at_sea.temperature);
    }

    #[test]
    fn unpadded_reads_clamp_to_grid() {
        let map = ClimateMap::from_fn(4, 1, |x, z| (z * 4 + x) as u32);
        assert_eq!(map.get_unpadded(0, 0), 0);
        assert_eq!(map.get_unpadded(3, 3), 15);
        assert_eq!(map.get_unpadded(4, 0), 3);
        assert_eq!(map.get_unpadded(100, 100), 15);
        assert_eq!(map.get_unpadded(-5, 0), 0);
    }

    #[test]
    fn for_chunk_wraps_negative_chunks_into_region() {
        let map = ClimateMap::from_fn(32, 1, |x, z| pack_climate(x as u8, z as u8, 0));
        let pos = ClimateSample::for_chunk(&map, ChunkPos::new(1, 2), 32);
        let wrapped = ClimateSample::for_chunk(&map, ChunkPos::new(1 - 32, 2 - 64), 32);
        assert_eq!(pos, wrapped);
        assert_eq!(pos.up_left, pack_climate(1, 2, 0));
        assert_eq!(pos.bot_right, pack_climate(2, 3, 0));
    }

    #[test]
    fn new_rejects_wrong_length() {
        assert!(ClimateMap::new(4, 1, vec![0; 36]).is_some());
        assert!(ClimateMap::new(4, 1, vec![0; 16]).is_none());
    }
}
