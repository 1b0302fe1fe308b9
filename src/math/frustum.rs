//! View frustum for culling

use crate::core::types::{Vec3, Vec4, Mat4};
use super::aabb::Aabb;

/// A plane defined by normal and distance from origin
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    /// Signed distance from point to plane (positive = in front)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    fn from_coefficients(coeffs: Vec4) -> Self {
        let normal = Vec3::new(coeffs.x, coeffs.y, coeffs.z);
        let len = normal.length();
        Self {
            normal: normal / len,
            distance: coeffs.w / len,
        }
    }
}

/// View frustum with 6 planes extracted from a view-projection matrix
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix
    /// (Gribb/Hartmann row combinations of the transposed matrix).
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let t = vp.transpose();
        let rows = [t.x_axis, t.y_axis, t.z_axis, t.w_axis];

        let planes = [
            Plane::from_coefficients(rows[3] + rows[0]), // left
            Plane::from_coefficients(rows[3] - rows[0]), // right
            Plane::from_coefficients(rows[3] + rows[1]), // bottom
            Plane::from_coefficients(rows[3] - rows[1]), // top
            Plane::from_coefficients(rows[3] + rows[2]), // near
            Plane::from_coefficients(rows[3] - rows[2]), // far
        ];

        Self { planes }
    }

    /// Check if point is inside frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.distance_to_point(point) >= 0.0)
    }

    /// Check if AABB intersects frustum (conservative p-vertex test)
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            // Corner most aligned with the plane normal
            let p = Vec3::new(
                if plane.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frustum() -> Frustum {
        let proj = Mat4::perspective_rh(45.0_f32.to_radians(), 1.0, 0.1, 1000.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        Frustum::from_view_projection(&(proj * view))
    }

    #[test]
    fn test_contains_point() {
        let frustum = test_frustum();
        assert!(frustum.contains_point(Vec3::ZERO));
        // behind the camera
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 20.0)));
    }

    #[test]
    fn test_intersects_aabb() {
        let frustum = test_frustum();
        let visible = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let behind = Aabb::new(Vec3::new(-1.0, -1.0, 20.0), Vec3::new(1.0, 1.0, 30.0));
        assert!(frustum.intersects_aabb(&visible));
        assert!(!frustum.intersects_aabb(&behind));
    }

    #[test]
    fn test_aabb_straddling_plane_counts_as_visible() {
        let frustum = test_frustum();
        // Huge box containing the whole frustum
        let huge = Aabb::new(Vec3::splat(-10_000.0), Vec3::splat(10_000.0));
        assert!(frustum.intersects_aabb(&huge));
    }
}
