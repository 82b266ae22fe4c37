//! Spawned entities and where they are inserted.

use std::collections::BTreeMap;

use herdgen_core::{HerdId, RegistryKey};
use serde::Serialize;
use tracing::trace;

use crate::access::AccessPath;
use crate::chunk::ChunkPos;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    /// What an entity class can do once instantiated.
    pub struct EntityCapabilities: u8 {
        /// Has AI and joins herds.
        const AGENT = 0b0000_0001;
        /// Simulated by physics (falls, collides).
        const PHYSICS = 0b0000_0010;
    }
}

/// Entity class tag to capability lookup. Tags are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct EntityClassRegistry {
    classes: BTreeMap<String, EntityCapabilities>,
}

impl EntityClassRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in classes.
    pub fn standard() -> Self {
        let agent = EntityCapabilities::AGENT | EntityCapabilities::PHYSICS;
        let mut registry = Self::new();
        registry.register("agent", agent);
        registry.register("entityagent", agent);
        registry.register("item", EntityCapabilities::PHYSICS);
        registry.register("entityitem", EntityCapabilities::PHYSICS);
        registry
    }

    pub fn register(&mut self, tag: &str, capabilities: EntityCapabilities) {
        self.classes.insert(tag.trim().to_lowercase(), capabilities);
    }

    pub fn resolve(&self, tag: &str) -> Option<EntityCapabilities> {
        self.classes.get(&tag.trim().to_lowercase()).copied()
    }
}

/// An entity instantiated by the spawn planner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnedEntity {
    pub code: RegistryKey,
    pub class: String,
    #[serde(skip)]
    pub capabilities: EntityCapabilities,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Radians in `[0, 2π)`.
    pub yaw: f32,
    /// Set on agents only.
    pub herd_id: Option<HerdId>,
}

impl SpawnedEntity {
    pub fn chunk(&self) -> ChunkPos {
        ChunkPos::containing_point(self.x, self.z)
    }

    pub fn is_agent(&self) -> bool {
        self.capabilities.contains(EntityCapabilities::AGENT)
    }
}

/// Sink for entities produced by the planner.
pub trait EntityInserter {
    fn insert(&mut self, entity: SpawnedEntity);
}

/// Entities waiting for their chunk to finish generating.
#[derive(Debug, Default)]
pub struct PendingEntities {
    by_chunk: BTreeMap<ChunkPos, Vec<SpawnedEntity>>,
}

impl PendingEntities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand over a chunk's entities once it is promoted to the live world.
    pub fn take(&mut self, pos: ChunkPos) -> Vec<SpawnedEntity> {
        self.by_chunk.remove(&pos).unwrap_or_default()
    }

    pub fn get(&self, pos: ChunkPos) -> &[SpawnedEntity] {
        self.by_chunk.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_chunk.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_chunk.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpawnedEntity> + '_ {
        self.by_chunk.values().flatten()
    }
}

impl EntityInserter for PendingEntities {
    fn insert(&mut self, entity: SpawnedEntity) {
        trace!(code = %entity.code, chunk = %entity.chunk(), "Queued entity for generating chunk");
        self.by_chunk.entry(entity.chunk()).or_default().push(entity);
    }
}

/// Entities added straight to the running world, in insertion order.
#[derive(Debug, Default)]
pub struct LiveEntities {
    entities: Vec<SpawnedEntity>,
}

impl LiveEntities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpawnedEntity> + '_ {
        self.entities.iter()
    }

    /// Move entities handed over from [`PendingEntities::take`].
    pub fn extend(&mut self, entities: impl IntoIterator<Item = SpawnedEntity>) {
        self.entities.extend(entities);
    }
}

impl EntityInserter for LiveEntities {
    fn insert(&mut self, entity: SpawnedEntity) {
        self.entities.push(entity);
    }
}

/// The two insertion sinks a spawn pass writes into.
pub struct SpawnTargets<'a> {
    pub generating: &'a mut dyn EntityInserter,
    pub live: &'a mut dyn EntityInserter,
}

impl<'a> SpawnTargets<'a> {
    pub fn new(generating: &'a mut dyn EntityInserter, live: &'a mut dyn EntityInserter) -> Self {
        Self { generating, live }
    }

    pub fn insert(&mut self, path: AccessPath, entity: SpawnedEntity) {
        match path {
            AccessPath::Generating => self.generating.insert(entity),
            AccessPath::Live => self.live.insert(entity),
        }
    }
}
