//! Spawn group catalog.
//!
//! Every creature type with worldgen spawn conditions leads one group; its
//! companion codes are resolved against the same definition set. Built once
//! per world load and shared read-only between planners.

use std::collections::BTreeMap;
use std::sync::Arc;

use herdgen_core::RegistryKey;
use rand::Rng;
use tracing::{debug, warn};

use crate::creature::{CreatureTypeDef, WorldgenSpawnConditions};
use crate::entity::{EntityCapabilities, EntityClassRegistry};

/// Upper bound on the chance that a non-leading attempt proposes a companion.
pub const MAX_COMPANION_CHANCE: f32 = 0.2;

/// A creature type with its entity class already resolved.
#[derive(Debug, Clone)]
pub struct ResolvedType {
    pub def: Arc<CreatureTypeDef>,
    pub capabilities: EntityCapabilities,
}

impl ResolvedType {
    pub fn code(&self) -> &RegistryKey {
        &self.def.code
    }
}

/// A dominant creature type and the companions that may join its groups.
#[derive(Debug, Clone)]
pub struct SpawnGroup {
    pub dominant: ResolvedType,
    pub companions: Vec<ResolvedType>,
    /// The dominant type's conditions; they govern the whole group.
    pub conditions: WorldgenSpawnConditions,
}

impl SpawnGroup {
    /// Chance that an attempt after the first proposes a companion.
    pub fn companion_chance(&self) -> f32 {
        if self.companions.is_empty() {
            0.0
        } else {
            MAX_COMPANION_CHANCE.min(1.0 / self.companions.len() as f32)
        }
    }

    /// Type proposed for attempt `attempt` of a formation search.
    ///
    /// The first attempt is always the dominant type; groups without
    /// companions never draw from `rng` here.
    pub fn pick_type<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> &ResolvedType {
        if attempt == 0 || self.companions.is_empty() {
            return &self.dominant;
        }
        if rng.gen::<f32>() < self.companion_chance() {
            &self.companions[rng.gen_range(0..self.companions.len())]
        } else {
            &self.dominant
        }
    }
}

/// All spawn groups, ordered by dominant code.
#[derive(Debug, Clone, Default)]
pub struct SpawnCatalog {
    groups: BTreeMap<RegistryKey, SpawnGroup>,
}

impl SpawnCatalog {
    /// Build the catalog from raw definitions. Rebuilding from the same
    /// input yields the same catalog.
    pub fn build(defs: &[CreatureTypeDef], classes: &EntityClassRegistry) -> Self {
        let mut resolved: BTreeMap<RegistryKey, ResolvedType> = BTreeMap::new();
        for def in defs {
            match classes.resolve(&def.class) {
                Some(capabilities) => {
                    resolved.insert(
                        def.code.clone(),
                        ResolvedType {
                            def: Arc::new(def.clone()),
                            capabilities,
                        },
                    );
                }
                None => warn!(
                    code = %def.code,
                    class = %def.class,
                    "Unregistered entity class; creature left out of spawn catalog"
                ),
            }
        }

        let mut groups = BTreeMap::new();
        for (code, dominant) in &resolved {
            let Some(conditions) = &dominant.def.worldgen else {
                continue;
            };
            let companions = conditions
                .companions
                .iter()
                .filter_map(|companion| {
                    let found = resolved.get(companion).cloned();
                    if found.is_none() {
                        debug!(group = %code, %companion, "Dropping unknown companion");
                    }
                    found
                })
                .collect();
            groups.insert(
                code.clone(),
                SpawnGroup {
                    dominant: dominant.clone(),
                    companions,
                    conditions: conditions.clone(),
                },
            );
        }

        debug!(groups = groups.len(), types = resolved.len(), "Built spawn catalog");
        Self { groups }
    }

    pub fn get(&self, dominant: &RegistryKey) -> Option<&SpawnGroup> {
        self.groups.get(dominant)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in dominant-code order.
    pub fn groups(&self) -> impl Iterator<Item = &SpawnGroup> + '_ {
        self.groups.values()
    }
}
