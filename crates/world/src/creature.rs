//! Creature type definitions and their worldgen spawn conditions.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use herdgen_core::RegistryKey;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Shape of a [`NatFloat`] around its average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    #[default]
    Uniform,
    /// Mean of two uniform draws.
    Triangle,
    /// Mean of three uniform draws.
    Gaussian,
    /// Mean of six uniform draws.
    NarrowGaussian,
    /// Gaussian folded so values cluster at the edges.
    InverseGaussian,
    /// Always the average.
    Dirac,
}

/// A random number described by average, variance and distribution.
///
/// Samples fall in `avg ± var`. Accepts either a bare number (constant) or
/// `{ "avg": 1.0, "var": 0.5, "dist": "gaussian" }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "NatFloatRepr")]
pub struct NatFloat {
    pub avg: f32,
    pub var: f32,
    pub dist: DistributionKind,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NatFloatRepr {
    Constant(f32),
    Full {
        #[serde(default)]
        avg: f32,
        #[serde(default)]
        var: f32,
        #[serde(default)]
        dist: DistributionKind,
    },
}

impl From<NatFloatRepr> for NatFloat {
    fn from(repr: NatFloatRepr) -> Self {
        match repr {
            NatFloatRepr::Constant(avg) => NatFloat::constant(avg),
            NatFloatRepr::Full { avg, var, dist } => NatFloat { avg, var, dist },
        }
    }
}

impl NatFloat {
    pub const ZERO: NatFloat = NatFloat::constant(0.0);
    pub const ONE: NatFloat = NatFloat::constant(1.0);

    pub const fn constant(avg: f32) -> Self {
        Self {
            avg,
            var: 0.0,
            dist: DistributionKind::Uniform,
        }
    }

    pub const fn new(avg: f32, var: f32, dist: DistributionKind) -> Self {
        Self { avg, var, dist }
    }

    /// Draw one value.
    ///
    /// Every kind except `Dirac` consumes at least one draw, even when `var`
    /// is zero, so the stream position does not depend on the variance.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let mut mean_of = |n: u32| (0..n).map(|_| rng.gen::<f32>()).sum::<f32>() / n as f32;
        let unit = match self.dist {
            DistributionKind::Uniform => mean_of(1),
            DistributionKind::Triangle => mean_of(2),
            DistributionKind::Gaussian => mean_of(3),
            DistributionKind::NarrowGaussian => mean_of(6),
            DistributionKind::InverseGaussian => {
                let v = mean_of(3);
                if v > 0.5 {
                    v - 0.5
                } else {
                    v + 0.5
                }
            }
            DistributionKind::Dirac => return self.avg,
        };
        self.avg + self.var * (2.0 * unit - 1.0)
    }

    pub fn max(&self) -> f32 {
        self.avg + self.var.abs()
    }
}

/// Hit-box size; centred horizontally on the entity position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub width: f64,
    pub height: f64,
}

impl Default for Hitbox {
    fn default() -> Self {
        Self {
            width: 0.5,
            height: 0.5,
        }
    }
}

/// Largest group size a definition may roll.
pub const MAX_GROUP_SIZE: f32 = 1024.0;

fn default_inside_block_codes() -> Vec<String> {
    vec!["air".to_string()]
}

/// Where and how often a creature appears during world generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldgenSpawnConditions {
    pub min_light_level: u8,
    pub max_light_level: u8,
    /// Degrees Celsius.
    pub min_temp: f32,
    pub max_temp: f32,
    pub min_rain: f32,
    pub max_rain: f32,
    /// Wildcard patterns the block at the spawn position must match.
    pub inside_block_codes: Vec<String>,
    /// Place on the terrain surface instead of anywhere in the column.
    pub try_only_surface: bool,
    pub tries_per_chunk: NatFloat,
    pub group_size: NatFloat,
    /// Creature codes that may join a group led by this type.
    pub companions: Vec<RegistryKey>,
}

impl Default for WorldgenSpawnConditions {
    fn default() -> Self {
        Self {
            min_light_level: 0,
            max_light_level: 15,
            min_temp: -40.0,
            max_temp: 40.0,
            min_rain: 0.0,
            max_rain: 1.0,
            inside_block_codes: default_inside_block_codes(),
            try_only_surface: false,
            tries_per_chunk: NatFloat::ZERO,
            group_size: NatFloat::ONE,
            companions: Vec::new(),
        }
    }
}

impl WorldgenSpawnConditions {
    pub fn light_in_range(&self, light: u8) -> bool {
        (self.min_light_level..=self.max_light_level).contains(&light)
    }

    pub fn temperature_in_range(&self, celsius: f32) -> bool {
        celsius >= self.min_temp && celsius <= self.max_temp
    }

    pub fn rain_in_range(&self, rain: f32) -> bool {
        rain >= self.min_rain && rain <= self.max_rain
    }

    fn validate(&self, code: &RegistryKey) -> Result<(), ConfigError> {
        let what = || format!("worldgen conditions of {code}");
        if self.min_light_level > self.max_light_level {
            return Err(ConfigError::invalid(what(), "min_light_level > max_light_level"));
        }
        if !(self.min_temp <= self.max_temp) {
            return Err(ConfigError::invalid(what(), "min_temp > max_temp"));
        }
        if !(self.min_rain <= self.max_rain) {
            return Err(ConfigError::invalid(what(), "min_rain > max_rain"));
        }
        let largest = self.group_size.max();
        if !(largest.is_finite() && largest <= MAX_GROUP_SIZE) {
            return Err(ConfigError::invalid(
                what(),
                format!("group_size may reach {largest}, above {MAX_GROUP_SIZE}"),
            ));
        }
        Ok(())
    }
}

fn default_class() -> String {
    "agent".to_string()
}

/// Immutable description of one creature type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureTypeDef {
    pub code: RegistryKey,
    /// Entity class tag, resolved against the class registry.
    #[serde(default = "default_class")]
    pub class: String,
    #[serde(default)]
    pub hitbox: Hitbox,
    #[serde(default)]
    pub worldgen: Option<WorldgenSpawnConditions>,
}

impl CreatureTypeDef {
    pub fn new(code: RegistryKey) -> Self {
        Self {
            code,
            class: default_class(),
            hitbox: Hitbox::default(),
            worldgen: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn with_hitbox(mut self, width: f64, height: f64) -> Self {
        self.hitbox = Hitbox { width, height };
        self
    }

    pub fn with_worldgen(mut self, conditions: WorldgenSpawnConditions) -> Self {
        self.worldgen = Some(conditions);
        self
    }
}

/// Parse a JSON array of creature definitions.
pub fn parse_creature_defs(input: &str) -> Result<Vec<CreatureTypeDef>, ConfigError> {
    let defs: Vec<CreatureTypeDef> = serde_json::from_str(input)?;
    let mut seen = BTreeSet::new();
    for def in &defs {
        if !seen.insert(&def.code) {
            return Err(ConfigError::invalid(
                "creatures",
                format!("duplicate code {}", def.code),
            ));
        }
        let hitbox = def.hitbox;
        if !(hitbox.width > 0.0 && hitbox.height > 0.0) {
            return Err(ConfigError::invalid(
                format!("hitbox of {}", def.code),
                "width and height must be positive",
            ));
        }
        if let Some(conditions) = &def.worldgen {
            conditions.validate(&def.code)?;
        }
    }
    Ok(defs)
}

pub fn load_creature_defs(path: &Path) -> Result<Vec<CreatureTypeDef>, ConfigError> {
    parse_creature_defs(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn nat_float_stays_within_variance() {
        let mut rng = StdRng::seed_from_u64(7);
        for dist in [
            DistributionKind::Uniform,
            DistributionKind::Triangle,
            DistributionKind::Gaussian,
            DistributionKind::NarrowGaussian,
            DistributionKind::InverseGaussian,
        ] {
            let nf = NatFloat::new(3.0, 2.0, dist);
            for _ in 0..500 {
                let v = nf.sample(&mut rng);
                assert!((1.0..=5.0).contains(&v), "{dist:?} produced {v}");
            }
        }
    }

    #[test]
    fn constant_still_consumes_a_draw() {
        let mut a = StdRng::seed_from_u64(1);
        let mut b = StdRng::seed_from_u64(1);
        assert_eq!(NatFloat::constant(3.0).sample(&mut a), 3.0);
        let _: f32 = b.gen();
        assert_eq!(a.gen::<u64>(), b.gen::<u64>());
    }

    #[test]
    fn dirac_consumes_nothing() {
        let mut a = StdRng::seed_from_u64(1);
        let mut b = StdRng::seed_from_u64(1);
        let nf = NatFloat::new(2.5, 9.0, DistributionKind::Dirac);
        assert_eq!(nf.sample(&mut a), 2.5);
        assert_eq!(a.gen::<u64>(), b.gen::<u64>());
    }

    #[test]
    fn nat_float_accepts_number_or_object() {
        let nf: NatFloat = serde_json::from_str("2.5").unwrap();
        assert_eq!(nf, NatFloat::constant(2.5));
        let nf: NatFloat =
            serde_json::from_str(r#"{ "avg": 4, "var": 1, "dist": "narrowgaussian" }"#).unwrap();
        assert_eq!(nf, NatFloat::new(4.0, 1.0, DistributionKind::NarrowGaussian));
        assert_eq!(nf.max(), 5.0);
    }

    #[test]
    fn parses_definitions_with_defaults() {
        let defs = parse_creature_defs(
            r#"[
                {
                    "code": "wolf-male",
                    "hitbox": { "width": 1.2, "height": 1.0 },
                    "worldgen": {
                        "try_only_surface": true,
                        "tries_per_chunk": { "avg": 0.1, "var": 0 },
                        "group_size": { "avg": 3, "var": 1 },
                        "companions": ["wolf-female", "wolf-pup"]
                    }
                },
                { "code": "wolf-female", "class": "EntityAgent" },
                { "code": "mymod:pebble", "class": "item" }
            ]"#,
        )
        .unwrap();
        assert_eq!(defs.len(), 3);
        let wolf = &defs[0];
        assert_eq!(wolf.class, "agent");
        let conditions = wolf.worldgen.as_ref().unwrap();
        assert!(conditions.try_only_surface);
        assert_eq!(conditions.inside_block_codes, vec!["air".to_string()]);
        assert_eq!(conditions.max_light_level, 15);
        assert_eq!(conditions.companions.len(), 2);
        assert_eq!(conditions.companions[1].to_string(), "game:wolf-pup");
        assert!(defs[1].worldgen.is_none());
        assert_eq!(defs[2].hitbox, Hitbox::default());
    }

    #[test]
    fn rejects_duplicates_and_inverted_ranges() {
        assert!(parse_creature_defs(r#"[{ "code": "deer" }, { "code": "game:deer" }]"#).is_err());
        assert!(parse_creature_defs(
            r#"[{ "code": "deer", "worldgen": { "min_temp": 10, "max_temp": 0 } }]"#
        )
        .is_err());
        assert!(parse_creature_defs(r#"[{ "code": "deer", "hitbox": { "width": 0, "height": 1 } }]"#)
            .is_err());
    }

    #[test]
    fn rejects_unbounded_group_sizes() {
        assert!(parse_creature_defs(
            r#"[{ "code": "deer", "worldgen": { "group_size": 4294967296.0 } }]"#
        )
        .is_err());
        assert!(parse_creature_defs(
            r#"[{ "code": "deer", "worldgen": { "group_size": { "avg": 1000, "var": 100 } } }]"#
        )
        .is_err());
        assert!(parse_creature_defs(
            r#"[{ "code": "deer", "worldgen": { "group_size": { "avg": 8, "var": 4 } } }]"#
        )
        .is_ok());
    }

    #[test]
    fn range_checks_are_inclusive() {
        let conditions = WorldgenSpawnConditions {
            min_light_level: 7,
            max_light_level: 7,
            min_rain: 0.5,
            max_rain: 0.5,
            ..Default::default()
        };
        assert!(conditions.light_in_range(7));
        assert!(!conditions.light_in_range(8));
        assert!(conditions.rain_in_range(0.5));
        assert!(conditions.temperature_in_range(40.0));
        assert!(!conditions.temperature_in_range(40.5));
    }
}
