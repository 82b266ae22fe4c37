//! Whether a creature may be placed at a position.

use glam::DVec3;
use herdgen_physics::Aabb;

use crate::access::WorldView;
use crate::climate::Climate;
use crate::collision::is_colliding;
use crate::creature::{CreatureTypeDef, WorldgenSpawnConditions};

/// The first check a spawn position failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rejection {
    OutOfBounds,
    LightUnavailable,
    Light,
    Temperature,
    Rain,
    /// The block below cannot carry this creature.
    Surface,
    /// The block at the position is not one of the allowed inside blocks.
    InsideBlock,
    Collision,
}

impl Rejection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Rejection::OutOfBounds => "out_of_bounds",
            Rejection::LightUnavailable => "light_unavailable",
            Rejection::Light => "light",
            Rejection::Temperature => "temperature",
            Rejection::Rain => "rain",
            Rejection::Surface => "surface",
            Rejection::InsideBlock => "inside_block",
            Rejection::Collision => "collision",
        }
    }
}

/// Run every spawn check for `creature` at `pos`, cheapest first.
///
/// `conditions` and `climate` belong to the group being formed; the hit-box
/// and surface rule use the candidate's own type.
pub fn check_spawn(
    world: &WorldView<'_>,
    creature: &CreatureTypeDef,
    conditions: &WorldgenSpawnConditions,
    climate: &Climate,
    pos: DVec3,
    collision_margin: f64,
) -> Result<(), Rejection> {
    let block = pos.floor();
    let (x, y, z) = (block.x as i32, block.y as i32, block.z as i32);
    if !world.bounds().contains(x, y, z) {
        return Err(Rejection::OutOfBounds);
    }

    let light = world.light_level(x, y, z).ok_or(Rejection::LightUnavailable)?;
    if !conditions.light_in_range(light) {
        return Err(Rejection::Light);
    }
    if !conditions.temperature_in_range(climate.temperature) {
        return Err(Rejection::Temperature);
    }
    if !conditions.rain_in_range(climate.rain) {
        return Err(Rejection::Rain);
    }

    let below = world.block_at(x, y - 1, z).ok_or(Rejection::Surface)?;
    if !below.can_creature_spawn_on(&creature.code) {
        return Err(Rejection::Surface);
    }
    let inside = world.block_at(x, y, z).ok_or(Rejection::InsideBlock)?;
    if !inside.matches_any(&conditions.inside_block_codes) {
        return Err(Rejection::InsideBlock);
    }

    let hitbox = Aabb::hitbox(creature.hitbox.width, creature.hitbox.height)
        .grow_except_down(collision_margin);
    if is_colliding(world, &hitbox, pos) {
        return Err(Rejection::Collision);
    }
    Ok(())
}

/// Boolean form of [`check_spawn`].
pub fn can_spawn_at(
    world: &WorldView<'_>,
    creature: &CreatureTypeDef,
    conditions: &WorldgenSpawnConditions,
    climate: &Climate,
    pos: DVec3,
    collision_margin: f64,
) -> bool {
    check_spawn(world, creature, conditions, climate, pos, collision_margin).is_ok()
}
