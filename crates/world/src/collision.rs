//! Entity box versus voxel geometry.

use glam::DVec3;
use herdgen_physics::Aabb;
use tracing::trace;

use crate::access::WorldView;

/// Whether `hitbox` placed at `pos` overlaps any block collision box.
///
/// Unresolvable cells (no chunk in either store, outside the world height,
/// corrupt payload, unknown block id) count as colliding.
pub fn is_colliding(world: &WorldView<'_>, hitbox: &Aabb, pos: DVec3) -> bool {
    let placed = hitbox.translate(pos);
    let (min, max) = placed.cell_range();

    for y in min[1]..=max[1] {
        for x in min[0]..=max[0] {
            for z in min[2]..=max[2] {
                let Some(voxel) = world.voxel_at(x, y, z) else {
                    trace!(x, y, z, "Unresolvable cell treated as solid");
                    return true;
                };
                let Some(block) = world.blocks().descriptor(voxel.id) else {
                    trace!(x, y, z, id = voxel.id, "Unknown block treated as solid");
                    return true;
                };
                let cell = DVec3::new(x as f64, y as f64, z as f64);
                if block
                    .collision_boxes
                    .iter()
                    .any(|b| b.translate(cell).intersects(&placed))
                {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::GenerationBuffer;
    use crate::blocks::{BlockDescriptor, BlockRegistry};
    use crate::chunk::{Chunk, ChunkPos, Voxel};
    use crate::config::WorldBounds;
    use crate::storage::ChunkStorage;
    use herdgen_core::RegistryKey;

    const STONE: u16 = 1;
    const SLAB: u16 = 2;

    fn registry() -> BlockRegistry {
        BlockRegistry::new(vec![
            BlockDescriptor::passable(RegistryKey::parse("air").unwrap()),
            BlockDescriptor::solid(RegistryKey::parse("stone").unwrap()),
            BlockDescriptor::solid(RegistryKey::parse("slab").unwrap()).with_collision_boxes(vec![
                Aabb::new(DVec3::ZERO, DVec3::new(1.0, 0.5, 1.0)),
            ]),
        ])
    }

    fn floor_chunk(pos: ChunkPos) -> Chunk {
        let mut chunk = Chunk::new(pos);
        for x in 0..16 {
            for z in 0..16 {
                chunk.set_voxel(x, 63, z, Voxel::block(STONE)).unwrap();
            }
        }
        chunk
    }

    #[test]
    fn box_resting_on_floor_does_not_collide() {
        let mut generating = GenerationBuffer::new();
        generating.insert(floor_chunk(ChunkPos::new(0, 0)));
        let live = ChunkStorage::new(1);
        let blocks = registry();
        let view = WorldView::new(&generating, &live, &blocks, WorldBounds::default());

        let hitbox = Aabb::hitbox(0.9, 1.4).grow_except_down(0.1);
        assert!(!is_colliding(&view, &hitbox, DVec3::new(8.5, 64.0, 8.5)));
        // Sinking into the floor collides.
        assert!(is_colliding(&view, &hitbox, DVec3::new(8.5, 63.9, 8.5)));
    }

    #[test]
    fn missing_neighbour_chunk_fails_closed() {
        let mut generating = GenerationBuffer::new();
        generating.insert(floor_chunk(ChunkPos::new(0, 0)));
        let live = ChunkStorage::new(1);
        let blocks = registry();
        let view = WorldView::new(&generating, &live, &blocks, WorldBounds::default());

        let hitbox = Aabb::hitbox(0.9, 1.4);
        // Box straddles x = 16 into the unloaded chunk (1, 0).
        assert!(is_colliding(&view, &hitbox, DVec3::new(15.8, 64.0, 8.5)));
    }

    #[test]
    fn live_neighbour_is_consulted() {
        let mut generating = GenerationBuffer::new();
        generating.insert(floor_chunk(ChunkPos::new(0, 0)));
        let mut live = ChunkStorage::new(4);
        live.insert(floor_chunk(ChunkPos::new(1, 0)));
        let blocks = registry();
        let view = WorldView::new(&generating, &live, &blocks, WorldBounds::default());

        let hitbox = Aabb::hitbox(0.9, 1.4);
        assert!(!is_colliding(&view, &hitbox, DVec3::new(15.8, 64.0, 8.5)));
    }

    #[test]
    fn partial_boxes_use_their_geometry() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0));
        chunk.set_voxel(4, 64, 4, Voxel::block(SLAB)).unwrap();
        let mut generating = GenerationBuffer::new();
        generating.insert(chunk);
        let live = ChunkStorage::new(1);
        let blocks = registry();
        let view = WorldView::new(&generating, &live, &blocks, WorldBounds::default());

        let hitbox = Aabb::hitbox(0.5, 0.5);
        assert!(!is_colliding(&view, &hitbox, DVec3::new(4.5, 64.5, 4.5)));
        assert!(is_colliding(&view, &hitbox, DVec3::new(4.5, 64.25, 4.5)));
    }

    #[test]
    fn unknown_block_id_is_solid() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0));
        chunk.set_voxel(2, 64, 2, Voxel::block(99)).unwrap();
        let mut generating = GenerationBuffer::new();
        generating.insert(chunk);
        let live = ChunkStorage::new(1);
        let blocks = registry();
        let view = WorldView::new(&generating, &live, &blocks, WorldBounds::default());
        assert!(is_colliding(&view, &Aabb::hitbox(0.5, 0.5), DVec3::new(2.5, 64.2, 2.5)));
    }

    #[test]
    fn block_id_zero_follows_its_registry_entry() {
        let blocks = BlockRegistry::from_json_str(
            r#"[{"code":"stone"},{"code":"air","collision":"none"}]"#,
        )
        .unwrap();
        let mut chunk = Chunk::new(ChunkPos::new(0, 0));
        for x in 0..16 {
            for z in 0..16 {
                for y in 60..70 {
                    chunk.set_voxel(x, y, z, Voxel::block(1)).unwrap();
                }
            }
        }
        chunk.set_voxel(8, 65, 8, Voxel::block(0)).unwrap();
        let mut generating = GenerationBuffer::new();
        generating.insert(chunk);
        let live = ChunkStorage::new(1);
        let view = WorldView::new(&generating, &live, &blocks, WorldBounds::default());

        let hitbox = Aabb::hitbox(0.9, 1.2);
        assert!(is_colliding(&view, &hitbox, DVec3::new(8.5, 64.005, 8.5)));
        assert!(!is_colliding(&view, &hitbox, DVec3::new(3.5, 64.005, 3.5)));
    }

    #[test]
    fn packed_chunk_is_decoded_on_demand() {
        let mut chunk = floor_chunk(ChunkPos::new(0, 0));
        chunk.set_voxel(8, 64, 8, Voxel::block(STONE)).unwrap();
        chunk.pack().unwrap();
        let mut generating = GenerationBuffer::new();
        generating.insert(chunk);
        let live = ChunkStorage::new(1);
        let blocks = registry();
        let view = WorldView::new(&generating, &live, &blocks, WorldBounds::default());

        let hitbox = Aabb::hitbox(0.5, 0.5);
        assert!(is_colliding(&view, &hitbox, DVec3::new(8.5, 64.0, 8.5)));
        assert!(!is_colliding(&view, &hitbox, DVec3::new(3.5, 64.0, 3.5)));
    }
}
