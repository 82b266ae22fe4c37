//! Spawn planner configuration.
//!
//! Global numbers the planner consumes (seed offset, region size, sea level,
//! world bounds, attempt budgets). Loaded from TOML before world load
//! completes; every field has a default so partial files are fine.

use std::fs;
use std::path::Path;

use herdgen_core::{RegistryKeyError, WORLDGEN_SPAWN_SEED_OFFSET};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::chunk::{CHUNK_SIZE_X, CHUNK_SIZE_Y};

/// Errors emitted while loading spawn configuration or definitions.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Wrap IO errors when reading files.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// JSON definitions (creatures, blocks) failed to parse.
    #[error("failed to parse definitions: {0}")]
    Json(#[from] serde_json::Error),
    /// TOML planner config failed to parse.
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    /// A registry key in the definitions was malformed.
    #[error("invalid registry key: {0}")]
    Key(#[from] RegistryKeyError),
    /// A value parsed but is out of its allowed range.
    #[error("invalid {what}: {reason}")]
    Invalid { what: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            what: what.into(),
            reason: reason.into(),
        }
    }
}

/// Valid block coordinate range of the world.
///
/// Horizontal bounds are half-open (`min <= v < max`); vertical is `0 <= y < height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_z: i32,
    pub max_z: i32,
    pub height: i32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min_x: -30_000_000,
            max_x: 30_000_000,
            min_z: -30_000_000,
            max_z: 30_000_000,
            height: CHUNK_SIZE_Y as i32,
        }
    }
}

impl WorldBounds {
    /// Whether a block position lies inside the world.
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        (self.min_x..self.max_x).contains(&x)
            && (self.min_z..self.max_z).contains(&z)
            && (0..self.height).contains(&y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Subtracted from the world seed to seed the spawn RNG stream.
    pub seed_offset: u64,
    /// Climate region edge length in blocks (multiple of the chunk size).
    pub region_size: i32,
    /// Y level temperatures are referenced against.
    pub sea_level: i32,
    pub world_bounds: WorldBounds,
    /// Clearance added around a creature's hit-box (not below it).
    pub collision_margin: f64,
    /// How often the group size is redrawn while it rounds to zero.
    pub group_size_resamples: u32,
    /// Max block offset of the group-formation walk from its origin.
    pub walk_radius: i32,
    /// Attempt budget is `attempts_per_member * target + extra_attempts`.
    pub attempts_per_member: u32,
    pub extra_attempts: u32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            seed_offset: WORLDGEN_SPAWN_SEED_OFFSET,
            region_size: 512,
            sea_level: 64,
            world_bounds: WorldBounds::default(),
            collision_margin: 0.1,
            group_size_resamples: 10,
            walk_radius: 5,
            attempts_per_member: 4,
            extra_attempts: 5,
        }
    }
}

impl SpawnConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: SpawnConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, returning errors to the caller.
    pub fn load_strict(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Load from a TOML file, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match Self::load_strict(path) {
            Ok(config) => config,
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Spawn config not found at {}. Using defaults",
                    path.display()
                );
                Self::default()
            }
            Err(err) => {
                warn!("Failed to load {}: {err}. Using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Region size expressed in chunks.
    pub fn region_size_in_chunks(&self) -> i32 {
        self.region_size / CHUNK_SIZE_X as i32
    }

    /// Attempt budget for a group of `target` members.
    pub fn attempt_budget(&self, target: u32) -> u32 {
        target
            .saturating_mul(self.attempts_per_member)
            .saturating_add(self.extra_attempts)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let chunk = CHUNK_SIZE_X as i32;
        if self.region_size < chunk || self.region_size % chunk != 0 {
            return Err(ConfigError::invalid(
                "region_size",
                format!("{} is not a positive multiple of {chunk}", self.region_size),
            ));
        }
        let bounds = &self.world_bounds;
        if bounds.height <= 0 || bounds.height > CHUNK_SIZE_Y as i32 {
            return Err(ConfigError::invalid(
                "world_bounds.height",
                format!("{} is outside 1..={CHUNK_SIZE_Y}", bounds.height),
            ));
        }
        if bounds.min_x >= bounds.max_x || bounds.min_z >= bounds.max_z {
            return Err(ConfigError::invalid("world_bounds", "empty horizontal range"));
        }
        if !(self.collision_margin.is_finite() && self.collision_margin >= 0.0) {
            return Err(ConfigError::invalid(
                "collision_margin",
                "must be finite and >= 0",
            ));
        }
        if self.walk_radius < 0 {
            return Err(ConfigError::invalid("walk_radius", "must be >= 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SpawnConfig::default();
        config.validate().unwrap();
        assert_eq!(config.seed_offset, 18722);
        assert_eq!(config.region_size_in_chunks(), 32);
        assert_eq!(config.attempt_budget(3), 17);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SpawnConfig::from_toml_str(
            r#"
            sea_level = 110

            [world_bounds]
            height = 128
            "#,
        )
        .unwrap();
        assert_eq!(config.sea_level, 110);
        assert_eq!(config.world_bounds.height, 128);
        assert_eq!(config.world_bounds.min_x, WorldBounds::default().min_x);
        assert_eq!(config.walk_radius, 5);
    }

    #[test]
    fn rejects_region_size_not_multiple_of_chunk() {
        let err = SpawnConfig::from_toml_str("region_size = 100").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref what, .. } if what == "region_size"));
    }

    #[test]
    fn rejects_oversized_world_height() {
        assert!(SpawnConfig::from_toml_str("[world_bounds]\nheight = 1024").is_err());
    }

    #[test]
    fn lenient_loader_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("herdgen-missing-spawn-config.toml");
        let _ = fs::remove_file(&path);
        assert_eq!(SpawnConfig::load_from_path(&path), SpawnConfig::default());
    }

    #[test]
    fn world_bounds_are_half_open() {
        let bounds = WorldBounds {
            min_x: 0,
            max_x: 10,
            min_z: 0,
            max_z: 10,
            height: 5,
        };
        assert!(bounds.contains(0, 0, 0));
        assert!(bounds.contains(9, 4, 9));
        assert!(!bounds.contains(10, 0, 0));
        assert!(!bounds.contains(0, 5, 0));
        assert!(!bounds.contains(0, -1, 0));
    }
}
