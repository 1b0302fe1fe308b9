//! Axis-aligned bounding box

use crate::core::types::Vec3;

/// Axis-aligned bounding box defined by min and max corners, in local scene
/// coordinates (origin at the map origin).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Get center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get size (max - min)
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Check if point is inside AABB
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    /// Check if two AABBs intersect
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Return merged AABB containing both
    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Distance from a point to the box (0 when the point is inside)
    pub fn distance_to_point(&self, p: Vec3) -> f32 {
        let clamped = p.clamp(self.min, self.max);
        (p - clamped).length()
    }

    /// Get child quadrant AABB for quadtree subdivision in the ground plane.
    ///
    /// Terrain tiles subdivide in X and Z only; the vertical span is
    /// inherited from the parent. index: 0-3 (bit 0 = +x half, bit 1 = +z half).
    pub fn child_quadrant(&self, index: u8) -> Aabb {
        debug_assert!(index < 4);
        let center = self.center();
        let (min, max) = (self.min, self.max);

        let (x0, x1) = if index & 1 != 0 { (center.x, max.x) } else { (min.x, center.x) };
        let (z0, z1) = if index & 2 != 0 { (center.z, max.z) } else { (min.z, center.z) };

        Aabb::new(Vec3::new(x0, min.y, z0), Vec3::new(x1, max.y, z1))
    }

    /// All eight corners, for projection and debug overlays
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_accessors() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(aabb.center(), Vec3::splat(0.5));
        assert_eq!(aabb.size(), Vec3::ONE);
    }

    #[test]
    fn test_contains_point() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(aabb.contains_point(Vec3::splat(0.5)));
        assert!(!aabb.contains_point(Vec3::splat(2.0)));
    }

    #[test]
    fn test_intersects() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(0.5), Vec3::splat(1.5));
        let c = Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_distance_to_point() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(aabb.distance_to_point(Vec3::splat(0.5)), 0.0);
        assert_eq!(aabb.distance_to_point(Vec3::new(2.0, 0.5, 0.5)), 1.0);
    }

    #[test]
    fn test_child_quadrants_cover_parent() {
        let parent = Aabb::new(Vec3::new(-2.0, 0.0, -2.0), Vec3::new(2.0, 5.0, 2.0));
        let mut merged = parent.child_quadrant(0);
        for i in 1..4 {
            merged = merged.merged(&parent.child_quadrant(i));
        }
        assert_eq!(merged, parent);

        // quadrants keep the full vertical span
        for i in 0..4 {
            let child = parent.child_quadrant(i);
            assert_eq!(child.min.y, parent.min.y);
            assert_eq!(child.max.y, parent.max.y);
        }
    }

    #[test]
    fn test_child_quadrants_disjoint_footprints() {
        let parent = Aabb::new(Vec3::ZERO, Vec3::new(4.0, 1.0, 4.0));
        let c0 = parent.child_quadrant(0);
        let c3 = parent.child_quadrant(3);
        assert_eq!(c0.max.x, 2.0);
        assert_eq!(c3.min.x, 2.0);
        assert_eq!(c0.max.z, 2.0);
        assert_eq!(c3.min.z, 2.0);
    }
}
