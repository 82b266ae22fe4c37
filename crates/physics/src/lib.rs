#![warn(missing_docs)]
//! Physics primitives (AABB, collisions, etc.).

use glam::DVec3;

/// Axis-aligned bounding box used for collisions.
///
/// Boxes are usually authored relative to an origin (a block corner or an
/// entity's feet) and translated into world space before testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y, z).
    pub min: DVec3,
    /// Maximum corner (x, y, z).
    pub max: DVec3,
}

impl Aabb {
    /// Create a new AABB ensuring min <= max per axis.
    pub fn new(min: DVec3, max: DVec3) -> Self {
        debug_assert!(min.cmple(max).all());
        Self { min, max }
    }

    /// The full unit cube occupied by a solid block.
    pub const fn unit() -> Self {
        Self {
            min: DVec3::ZERO,
            max: DVec3::ONE,
        }
    }

    /// Box for a creature hit-box: `width` wide on X and Z, centered on the
    /// origin horizontally, `height` tall starting at the feet.
    pub fn hitbox(width: f64, height: f64) -> Self {
        let half = width / 2.0;
        Self::new(DVec3::new(-half, 0.0, -half), DVec3::new(half, height, half))
    }

    /// Translate by `offset`.
    pub fn translate(&self, offset: DVec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Grow by `amount` on every face except the bottom one.
    ///
    /// Keeps the box resting on the same floor while adding clearance
    /// sideways and overhead.
    pub fn grow_except_down(&self, amount: f64) -> Self {
        Self {
            min: DVec3::new(self.min.x - amount, self.min.y, self.min.z - amount),
            max: self.max + DVec3::splat(amount),
        }
    }

    /// Tests strict intersection with another AABB.
    ///
    /// Boxes that only share a face do not intersect, so a creature standing
    /// exactly on a block top does not collide with it.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Integer cell range `(min, max)` (inclusive) touched by this box.
    ///
    /// Uses floor for the lower corner and ceil for the upper corner, so a box
    /// ending exactly on a cell boundary still reports the next cell.
    pub fn cell_range(&self) -> ([i32; 3], [i32; 3]) {
        let lo = self.min.floor();
        let hi = self.max.ceil();
        (
            [lo.x as i32, lo.y as i32, lo.z as i32],
            [hi.x as i32, hi.y as i32, hi.z as i32],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hitbox_is_centered() {
        let b = Aabb::hitbox(0.8, 1.5);
        assert_eq!(b.min, DVec3::new(-0.4, 0.0, -0.4));
        assert_eq!(b.max, DVec3::new(0.4, 1.5, 0.4));
    }

    #[test]
    fn grow_keeps_floor() {
        let b = Aabb::hitbox(1.0, 1.0).grow_except_down(0.1);
        assert_eq!(b.min.y, 0.0);
        assert!((b.min.x + 0.6).abs() < 1e-12);
        assert!((b.max.y - 1.1).abs() < 1e-12);
        assert!((b.max.z - 0.6).abs() < 1e-12);
    }

    #[test]
    fn touching_faces_do_not_intersect() {
        let floor = Aabb::unit();
        let above = Aabb::unit().translate(DVec3::Y);
        assert!(!floor.intersects(&above));
        let overlapping = Aabb::unit().translate(DVec3::new(0.0, 0.999, 0.0));
        assert!(floor.intersects(&overlapping));
    }

    #[test]
    fn cell_range_floors_and_ceils() {
        let b = Aabb::hitbox(1.0, 2.0).translate(DVec3::new(-3.2, 64.005, 10.5));
        let (lo, hi) = b.cell_range();
        assert_eq!(lo, [-4, 64, 10]);
        assert_eq!(hi, [-2, 67, 11]);
    }

    proptest! {
        #[test]
        fn intersection_is_symmetric(
            ax in -10.0f64..10.0, ay in -10.0f64..10.0, az in -10.0f64..10.0,
            bx in -10.0f64..10.0, by in -10.0f64..10.0, bz in -10.0f64..10.0,
            w in 0.1f64..3.0, h in 0.1f64..3.0,
        ) {
            let a = Aabb::hitbox(w, h).translate(DVec3::new(ax, ay, az));
            let b = Aabb::unit().translate(DVec3::new(bx, by, bz));
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }

        #[test]
        fn box_lies_inside_its_cell_range(
            x in -100.0f64..100.0, y in 0.0f64..200.0, z in -100.0f64..100.0,
            w in 0.1f64..3.0, h in 0.1f64..3.0,
        ) {
            let b = Aabb::hitbox(w, h).translate(DVec3::new(x, y, z));
            let (lo, hi) = b.cell_range();
            prop_assert!(lo[0] as f64 <= b.min.x && b.max.x <= hi[0] as f64);
            prop_assert!(lo[1] as f64 <= b.min.y && b.max.y <= hi[1] as f64);
            prop_assert!(lo[2] as f64 <= b.min.z && b.max.z <= hi[2] as f64);
        }
    }
}
