//! Block descriptors consumed by spawning: collision geometry and whether
//! creatures may stand on the block.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glam::DVec3;
use herdgen_core::RegistryKey;
use herdgen_physics::Aabb;
use serde::Deserialize;

use crate::chunk::BlockId;
use crate::config::ConfigError;

/// Which creatures may spawn on top of a block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CreatureSpawnRule {
    #[default]
    Any,
    Never,
    /// Only creatures whose code matches one of these wildcard patterns.
    Only(Vec<String>),
}

impl CreatureSpawnRule {
    pub fn allows(&self, creature: &RegistryKey) -> bool {
        match self {
            CreatureSpawnRule::Any => true,
            CreatureSpawnRule::Never => false,
            CreatureSpawnRule::Only(patterns) => patterns.iter().any(|p| creature.matches(p)),
        }
    }
}

/// Block metadata loaded from `blocks.json`.
#[derive(Debug, Clone)]
pub struct BlockDescriptor {
    pub code: RegistryKey,
    /// Collision boxes in block-local coordinates (unit cell at the origin).
    pub collision_boxes: Vec<Aabb>,
    pub creature_spawn: CreatureSpawnRule,
}

impl BlockDescriptor {
    /// Full-cube solid block that any creature may stand on.
    pub fn solid(code: RegistryKey) -> Self {
        Self {
            code,
            collision_boxes: vec![Aabb::unit()],
            creature_spawn: CreatureSpawnRule::Any,
        }
    }

    /// Block without collision geometry (air, plants, fluids).
    pub fn passable(code: RegistryKey) -> Self {
        Self {
            code,
            collision_boxes: Vec::new(),
            creature_spawn: CreatureSpawnRule::Never,
        }
    }

    pub fn with_spawn_rule(mut self, rule: CreatureSpawnRule) -> Self {
        self.creature_spawn = rule;
        self
    }

    pub fn with_collision_boxes(mut self, boxes: Vec<Aabb>) -> Self {
        self.collision_boxes = boxes;
        self
    }

    /// Whether some collision box covers the whole footprint and reaches the
    /// top of the cell.
    pub fn has_solid_top(&self) -> bool {
        const EPS: f64 = 1e-6;
        self.collision_boxes.iter().any(|b| {
            b.min.x <= EPS
                && b.min.z <= EPS
                && b.max.x >= 1.0 - EPS
                && b.max.z >= 1.0 - EPS
                && b.max.y >= 1.0 - EPS
        })
    }

    /// Whether a creature may spawn standing on this block.
    pub fn can_creature_spawn_on(&self, creature: &RegistryKey) -> bool {
        self.has_solid_top() && self.creature_spawn.allows(creature)
    }

    /// Whether this block's code matches any of the wildcard patterns.
    pub fn matches_any<S: AsRef<str>>(&self, patterns: &[S]) -> bool {
        patterns.iter().any(|p| self.code.matches(p.as_ref()))
    }
}

/// Registry storing block descriptors keyed by id (position in the list).
pub struct BlockRegistry {
    descriptors: Vec<BlockDescriptor>,
    code_to_id: BTreeMap<RegistryKey, BlockId>,
}

impl BlockRegistry {
    pub fn new(descriptors: Vec<BlockDescriptor>) -> Self {
        let code_to_id = descriptors
            .iter()
            .enumerate()
            .map(|(id, desc)| (desc.code.clone(), id as BlockId))
            .collect();
        Self {
            descriptors,
            code_to_id,
        }
    }

    /// Parse a JSON array of block definitions. Ids follow array order.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let defs: Vec<BlockDefinition> = serde_json::from_str(input)?;
        if defs.len() > BlockId::MAX as usize + 1 {
            return Err(ConfigError::invalid(
                "blocks",
                format!("{} definitions exceed the block id space", defs.len()),
            ));
        }
        let descriptors = defs
            .into_iter()
            .map(BlockDefinition::into_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(descriptors))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn descriptor(&self, id: BlockId) -> Option<&BlockDescriptor> {
        self.descriptors.get(id as usize)
    }

    pub fn id_by_code(&self, code: &RegistryKey) -> Option<BlockId> {
        self.code_to_id.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CollisionPreset {
    Full,
    None,
}

#[derive(Debug, Deserialize)]
struct BoxDefinition {
    min: [f64; 3],
    max: [f64; 3],
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CollisionDefinition {
    Preset(CollisionPreset),
    Boxes(Vec<BoxDefinition>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SpawnKeyword {
    Any,
    Never,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpawnRuleDefinition {
    Keyword(SpawnKeyword),
    Only(Vec<String>),
}

/// JSON form of a block.
#[derive(Debug, Deserialize)]
struct BlockDefinition {
    code: RegistryKey,
    #[serde(default = "default_collision")]
    collision: CollisionDefinition,
    #[serde(default)]
    creature_spawn: Option<SpawnRuleDefinition>,
}

fn default_collision() -> CollisionDefinition {
    CollisionDefinition::Preset(CollisionPreset::Full)
}

impl BlockDefinition {
    fn into_descriptor(self) -> Result<BlockDescriptor, ConfigError> {
        let collision_boxes = match self.collision {
            CollisionDefinition::Preset(CollisionPreset::Full) => vec![Aabb::unit()],
            CollisionDefinition::Preset(CollisionPreset::None) => Vec::new(),
            CollisionDefinition::Boxes(boxes) => boxes
                .into_iter()
                .map(|b| {
                    let (min, max) = (DVec3::from_array(b.min), DVec3::from_array(b.max));
                    if min.cmple(max).all() {
                        Ok(Aabb::new(min, max))
                    } else {
                        Err(ConfigError::invalid(
                            format!("collision box of {}", self.code),
                            "min exceeds max",
                        ))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        let creature_spawn = match self.creature_spawn {
            Some(SpawnRuleDefinition::Keyword(SpawnKeyword::Any)) => CreatureSpawnRule::Any,
            Some(SpawnRuleDefinition::Keyword(SpawnKeyword::Never)) => CreatureSpawnRule::Never,
            Some(SpawnRuleDefinition::Only(patterns)) => CreatureSpawnRule::Only(patterns),
            // Blocks without geometry never carry creatures.
            None if collision_boxes.is_empty() => CreatureSpawnRule::Never,
            None => CreatureSpawnRule::Any,
        };
        Ok(BlockDescriptor {
            code: self.code,
            collision_boxes,
            creature_spawn,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> RegistryKey {
        RegistryKey::parse(s).unwrap()
    }

    const BLOCKS: &str = r#"[
        { "code": "air", "collision": "none" },
        { "code": "stone" },
        { "code": "slab", "collision": [{ "min": [0, 0, 0], "max": [1, 0.5, 1] }] },
        { "code": "tallgrass-short", "collision": "none" },
        { "code": "mymod:moss", "creature_spawn": ["game:deer-*"] },
        { "code": "lava", "creature_spawn": "never" }
    ]"#;

    #[test]
    fn loads_definitions_in_order() {
        let registry = BlockRegistry::from_json_str(BLOCKS).unwrap();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.id_by_code(&key("stone")), Some(1));
        assert_eq!(registry.id_by_code(&key("mymod:moss")), Some(4));
        assert!(registry.descriptor(6).is_none());
        assert!(registry.descriptor(0).unwrap().collision_boxes.is_empty());
    }

    #[test]
    fn spawn_on_requires_solid_top() {
        let registry = BlockRegistry::from_json_str(BLOCKS).unwrap();
        let wolf = key("wolf-male");
        let stone = registry.descriptor(1).unwrap();
        let slab = registry.descriptor(2).unwrap();
        let grass = registry.descriptor(3).unwrap();
        assert!(stone.can_creature_spawn_on(&wolf));
        assert!(!slab.has_solid_top());
        assert!(!slab.can_creature_spawn_on(&wolf));
        assert!(!grass.can_creature_spawn_on(&wolf));
    }

    #[test]
    fn spawn_rule_filters_creatures() {
        let registry = BlockRegistry::from_json_str(BLOCKS).unwrap();
        let moss = registry.descriptor(4).unwrap();
        let lava = registry.descriptor(5).unwrap();
        assert!(moss.can_creature_spawn_on(&key("deer-female")));
        assert!(!moss.can_creature_spawn_on(&key("wolf-male")));
        assert!(!lava.can_creature_spawn_on(&key("deer-female")));
    }

    #[test]
    fn matches_inside_block_patterns() {
        let grass = BlockDescriptor::passable(key("tallgrass-short"));
        assert!(grass.matches_any(&["air", "tallgrass-*"]));
        assert!(!grass.matches_any(&["air"]));
        assert!(!grass.matches_any::<&str>(&[]));
    }

    #[test]
    fn rejects_inverted_box() {
        let err = BlockRegistry::from_json_str(
            r#"[{ "code": "bad", "collision": [{ "min": [0, 1, 0], "max": [1, 0, 1] }] }]"#,
        );
        assert!(matches!(err, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_malformed_code() {
        assert!(BlockRegistry::from_json_str(r#"[{ "code": "Stone" }]"#).is_err());
    }
}
