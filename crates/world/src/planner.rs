//! Worldgen creature group spawning.
//!
//! Once a chunk column's terrain is generated, the planner rolls how many
//! group origins each catalog group gets in that column, then grows a group
//! around every origin with a short random walk. A group is emitted only when
//! it reaches its drawn size; otherwise it leaves no trace.
//!
//! All randomness comes from one seeded stream owned by the planner and
//! consumed in a fixed order, so the same world seed, catalog and column
//! order always produce the same creatures.

use std::f32::consts::TAU;
use std::sync::Arc;

use glam::DVec3;
use herdgen_core::{worldgen_rng, HerdId, HerdIdAllocator, RegistryKey};
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, instrument, trace};

use crate::access::{AccessPath, WorldView};
use crate::catalog::{ResolvedType, SpawnCatalog, SpawnGroup};
use crate::chunk::{Chunk, ChunkPos, CHUNK_SIZE_X, CHUNK_SIZE_Z};
use crate::climate::{ClimateMap, ClimateSample};
use crate::config::SpawnConfig;
use crate::creature::NatFloat;
use crate::entity::{SpawnTargets, SpawnedEntity};
use crate::heightmap::Heightmap;
use crate::pass::{GenerationPass, HookRegistration, PlayStyleFlags};
use crate::suitability::check_spawn;

/// Small lift so creatures start just above the floor they stand on.
const SPAWN_Y_OFFSET: f64 = 0.005;

/// The column a spawn pass runs for.
#[derive(Clone, Copy)]
pub struct ColumnContext<'a> {
    pub chunk: ChunkPos,
    /// Worldgen terrain heights of this column.
    pub heightmap: &'a Heightmap,
    /// Climate grid of the region containing the column.
    pub climate: &'a ClimateMap,
}

impl<'a> ColumnContext<'a> {
    pub fn new(chunk: &'a Chunk, climate: &'a ClimateMap) -> Self {
        Self {
            chunk: chunk.position(),
            heightmap: chunk.heightmap(),
            climate,
        }
    }
}

/// A creature accepted during a formation search.
#[derive(Debug, Clone)]
pub struct SpawnCandidate {
    pub creature: ResolvedType,
    pub pos: DVec3,
}

/// Progress of one formation search.
#[derive(Debug, Clone)]
pub struct SpawnAttemptState {
    pub origin: DVec3,
    pub target: u32,
    pub budget: u32,
    pub attempts: u32,
    pub candidates: Vec<SpawnCandidate>,
}

impl SpawnAttemptState {
    pub fn new(origin: DVec3, target: u32, budget: u32) -> Self {
        Self {
            origin,
            target,
            budget,
            attempts: 0,
            candidates: Vec::with_capacity(target.min(budget) as usize),
        }
    }

    pub fn accepted(&self) -> u32 {
        self.candidates.len() as u32
    }

    pub fn is_complete(&self) -> bool {
        self.accepted() >= self.target
    }

    /// Whether another attempt may run.
    pub fn can_continue(&self) -> bool {
        self.attempts < self.budget && !self.is_complete()
    }
}

/// Summary of an emitted group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupEmission {
    pub dominant: RegistryKey,
    pub herd_id: HerdId,
    pub origin: [f64; 3],
    pub entities: Vec<SpawnedEntity>,
}

/// What came of one group origin.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome {
    /// The drawn group size was not positive; nothing was attempted.
    NoTarget,
    /// Fewer creatures fit than the drawn size; nothing was emitted.
    Undersized {
        target: u32,
        accepted: u32,
        /// Attempts spent, including ones skipped over unloaded chunks.
        attempts: u32,
    },
    Emitted(GroupEmission),
}

/// Per-column counters returned by [`SpawnPlanner::on_chunk_column_ready`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnReport {
    pub chunk: ChunkPos,
    /// Group origins tried across all catalog groups.
    pub tries: u32,
    pub groups_discarded: u32,
    pub emissions: Vec<GroupEmission>,
}

impl ColumnReport {
    fn new(chunk: ChunkPos) -> Self {
        Self {
            chunk,
            tries: 0,
            groups_discarded: 0,
            emissions: Vec::new(),
        }
    }

    pub fn entity_count(&self) -> usize {
        self.emissions.iter().map(|e| e.entities.len()).sum()
    }
}

/// Decides which creature groups appear in freshly generated columns.
///
/// Owns the spawn random stream; one planner serves one generation worker.
pub struct SpawnPlanner {
    config: SpawnConfig,
    catalog: Arc<SpawnCatalog>,
    herds: Arc<HerdIdAllocator>,
    rng: StdRng,
}

impl SpawnPlanner {
    /// The spawn pass runs once terrain is final, in survival-style worlds only.
    pub const HOOK: HookRegistration = HookRegistration {
        pass: GenerationPass::PreDone,
        play_styles: PlayStyleFlags::SURVIVE_AND_AUTOMATE
            .union(PlayStyleFlags::SURVIVE_AND_BUILD)
            .union(PlayStyleFlags::WILDERNESS_SURVIVAL),
    };

    /// Whether the pipeline should call [`Self::on_chunk_column_ready`] for
    /// `pass` in a world of `play_style`.
    pub fn runs_for(pass: GenerationPass, play_style: PlayStyleFlags) -> bool {
        Self::HOOK.runs_for(pass, play_style)
    }

    /// Seed the spawn stream from the world seed. The stream is never reseeded.
    pub fn new(
        world_seed: u64,
        config: SpawnConfig,
        catalog: Arc<SpawnCatalog>,
        herds: Arc<HerdIdAllocator>,
    ) -> Self {
        let rng = worldgen_rng(world_seed, config.seed_offset);
        Self {
            config,
            catalog,
            herds,
            rng,
        }
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<SpawnCatalog> {
        &self.catalog
    }

    /// Swap in a rebuilt catalog (e.g., after definitions were reloaded).
    pub fn set_catalog(&mut self, catalog: Arc<SpawnCatalog>) {
        self.catalog = catalog;
    }

    /// Run the spawn pass for one freshly generated column.
    #[instrument(skip_all, fields(chunk = %ctx.chunk))]
    pub fn on_chunk_column_ready(
        &mut self,
        ctx: &ColumnContext<'_>,
        world: &WorldView<'_>,
        targets: &mut SpawnTargets<'_>,
    ) -> ColumnReport {
        let mut report = ColumnReport::new(ctx.chunk);
        let climate = ClimateSample::for_chunk(
            ctx.climate,
            ctx.chunk,
            self.config.region_size_in_chunks(),
        );
        let catalog = Arc::clone(&self.catalog);

        for group in catalog.groups() {
            let mut tries = group.conditions.tries_per_chunk.sample(&mut self.rng);
            while tries > self.rng.gen::<f32>() {
                tries -= 1.0;
                report.tries += 1;
                let origin = self.draw_origin(ctx, group);
                match self.try_spawn_group_at(group, origin, &climate, world, targets) {
                    GroupOutcome::Emitted(emission) => report.emissions.push(emission),
                    GroupOutcome::Undersized { .. } => report.groups_discarded += 1,
                    GroupOutcome::NoTarget => {}
                }
            }
        }

        if report.emissions.is_empty() {
            debug!(tries = report.tries, "No creature groups spawned");
        } else {
            info!(
                tries = report.tries,
                groups = report.emissions.len(),
                entities = report.entity_count(),
                discarded = report.groups_discarded,
                "Spawned creature groups"
            );
        }
        report
    }

    /// Random origin inside the column for one group try.
    fn draw_origin(&mut self, ctx: &ColumnContext<'_>, group: &SpawnGroup) -> DVec3 {
        let dx = self.rng.gen_range(0..CHUNK_SIZE_X);
        let dz = self.rng.gen_range(0..CHUNK_SIZE_Z);
        let y = if group.conditions.try_only_surface {
            ctx.heightmap.get(dx, dz) + 1
        } else {
            self.rng.gen_range(0..self.config.world_bounds.height.max(1))
        };
        let (ox, oz) = ctx.chunk.origin();
        block_center(ox + dx as i32, y, oz + dz as i32)
    }

    /// Draw a group size: resample while it rounds to zero or below.
    pub fn draw_group_size(&mut self, size: &NatFloat) -> u32 {
        for _ in 0..self.config.group_size_resamples {
            let value = size.sample(&mut self.rng);
            let whole = value.trunc();
            let round_up = value - whole > self.rng.gen::<f32>();
            let drawn = whole as i64 + i64::from(round_up);
            if drawn > 0 {
                return u32::try_from(drawn).unwrap_or(u32::MAX);
            }
        }
        0
    }

    /// Grow one group around `origin` and emit it if it reaches full size.
    ///
    /// `climate` is the corner sample of the column the origin lies in.
    pub fn try_spawn_group_at(
        &mut self,
        group: &SpawnGroup,
        origin: DVec3,
        climate: &ClimateSample,
        world: &WorldView<'_>,
        targets: &mut SpawnTargets<'_>,
    ) -> GroupOutcome {
        let target = self.draw_group_size(&group.conditions.group_size);
        if target == 0 {
            trace!(group = %group.dominant.code(), "Group size rolled zero");
            return GroupOutcome::NoTarget;
        }

        let mut state = SpawnAttemptState::new(origin, target, self.config.attempt_budget(target));
        let origin_block = origin.floor();
        let (mut x, mut y, mut z) = (
            origin_block.x as i32,
            origin_block.y as i32,
            origin_block.z as i32,
        );

        while state.can_continue() {
            let creature = group.pick_type(state.attempts, &mut self.rng);

            match world.resolve(ChunkPos::containing(x, z)) {
                Some((chunk, _)) => {
                    if group.conditions.try_only_surface {
                        y = chunk.heightmap().at_world(x, z) + 1;
                    }
                    let pos = block_center(x, y, z);
                    let local_climate =
                        climate.climate_at(pos.x, pos.y, pos.z, self.config.sea_level);
                    match check_spawn(
                        world,
                        &creature.def,
                        &group.conditions,
                        &local_climate,
                        pos,
                        self.config.collision_margin,
                    ) {
                        Ok(()) => state.candidates.push(SpawnCandidate {
                            creature: creature.clone(),
                            pos,
                        }),
                        Err(rejection) => trace!(
                            code = %creature.code(),
                            x, y, z,
                            reason = rejection.as_str(),
                            "Spawn attempt rejected"
                        ),
                    }
                }
                None => trace!(x, z, "Spawn attempt skipped; chunk not loaded"),
            }

            let radius = self.config.walk_radius;
            x = origin_block.x as i32 + self.walk_offset(radius);
            z = origin_block.z as i32 + self.walk_offset(radius);
            state.attempts += 1;
        }

        if !state.is_complete() {
            debug!(
                group = %group.dominant.code(),
                target,
                accepted = state.accepted(),
                attempts = state.attempts,
                "Discarding undersized group"
            );
            return GroupOutcome::Undersized {
                target,
                accepted: state.accepted(),
                attempts: state.attempts,
            };
        }

        GroupOutcome::Emitted(self.emit(group, state, world, targets))
    }

    /// Mean of two uniform offsets, truncated toward zero.
    fn walk_offset(&mut self, radius: i32) -> i32 {
        let a = self.rng.gen_range(-radius..=radius);
        let b = self.rng.gen_range(-radius..=radius);
        (a + b) / 2
    }

    fn emit(
        &mut self,
        group: &SpawnGroup,
        state: SpawnAttemptState,
        world: &WorldView<'_>,
        targets: &mut SpawnTargets<'_>,
    ) -> GroupEmission {
        let herd_id = self.herds.next();
        let mut entities = Vec::with_capacity(state.candidates.len());
        for candidate in state.candidates {
            let yaw = self.rng.gen_range(0.0..TAU);
            let def = &candidate.creature.def;
            let mut entity = SpawnedEntity {
                code: def.code.clone(),
                class: def.class.clone(),
                capabilities: candidate.creature.capabilities,
                x: candidate.pos.x,
                y: candidate.pos.y,
                z: candidate.pos.z,
                yaw,
                herd_id: None,
            };
            if entity.is_agent() {
                entity.herd_id = Some(herd_id);
            }
            let path = if world.is_generating(entity.chunk()) {
                AccessPath::Generating
            } else {
                AccessPath::Live
            };
            targets.insert(path, entity.clone());
            entities.push(entity);
        }

        debug!(
            group = %group.dominant.code(),
            %herd_id,
            size = entities.len(),
            "Emitted creature group"
        );
        GroupEmission {
            dominant: group.dominant.code().clone(),
            herd_id,
            origin: state.origin.to_array(),
            entities,
        }
    }
}

fn block_center(x: i32, y: i32, z: i32) -> DVec3 {
    DVec3::new(x as f64 + 0.5, y as f64 + SPAWN_Y_OFFSET, z as f64 + 0.5)
}
