/// Frustum - six clipping planes plus the eight world-space corners.
///
/// Each plane is a Vec4 (A, B, C, D): (A, B, C) is the inward-pointing unit
/// normal and a point P is inside when `dot(plane, P_homogeneous) >= 0` for
/// all planes. Clip-space depth follows glam's `*_rh` projections (0..1).
///
/// `intersects_aabb` combines the plane test (box fully outside one plane)
/// with a corner test (frustum fully outside one box face), which removes
/// most of the false positives large boxes get from planes alone.

use glam::{Mat4, Vec3, Vec4};
use crate::scene::AABB;

/// Result of a 3-way frustum/AABB classification.
///
/// Used by the octree for hierarchical culling:
/// - `Outside` → skip the entire subtree
/// - `Inside` → collect all objects without further testing
/// - `Partial` → test individual objects and recurse into children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// AABB is entirely outside the frustum
    Outside,
    /// AABB is entirely inside the frustum
    Inside,
    /// AABB partially overlaps the frustum
    Partial,
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
    /// World-space corners; bit 0 = right, bit 1 = top, bit 2 = far
    pub corners: [Vec3; 8],
}

impl Frustum {
    /// Extract the frustum of a view-projection matrix.
    ///
    /// Planes use the Gribb & Hartmann method; corners unproject the clip
    /// cube through the inverse matrix. Works for perspective and
    /// orthographic projections.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();

        let mut planes = [
            // Left:   row3 + row0
            Vec4::new(m[0][3] + m[0][0], m[1][3] + m[1][0], m[2][3] + m[2][0], m[3][3] + m[3][0]),
            // Right:  row3 - row0
            Vec4::new(m[0][3] - m[0][0], m[1][3] - m[1][0], m[2][3] - m[2][0], m[3][3] - m[3][0]),
            // Bottom: row3 + row1
            Vec4::new(m[0][3] + m[0][1], m[1][3] + m[1][1], m[2][3] + m[2][1], m[3][3] + m[3][1]),
            // Top:    row3 - row1
            Vec4::new(m[0][3] - m[0][1], m[1][3] - m[1][1], m[2][3] - m[2][1], m[3][3] - m[3][1]),
            // Near:   row2 (0..1 clip depth)
            Vec4::new(m[0][2], m[1][2], m[2][2], m[3][2]),
            // Far:    row3 - row2
            Vec4::new(m[0][3] - m[0][2], m[1][3] - m[1][2], m[2][3] - m[2][2], m[3][3] - m[3][2]),
        ];

        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        let inverse = vp.inverse();
        let corners = std::array::from_fn(|i| {
            let ndc = Vec3::new(
                if i & 1 == 0 { -1.0 } else { 1.0 },
                if i & 2 == 0 { -1.0 } else { 1.0 },
                if i & 4 == 0 { 0.0 } else { 1.0 },
            );
            inverse.project_point3(ndc)
        });

        Self { planes, corners }
    }

    /// Test if an AABB (potentially) overlaps this frustum.
    ///
    /// Conservative: may return false positives, never false negatives.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        for plane in &self.planes {
            if Self::distance(plane, Self::p_vertex(plane, aabb)) < 0.0 {
                return false;
            }
        }

        // Frustum entirely on the far side of one box face
        for axis in 0..3 {
            if self.corners.iter().all(|c| c[axis] > aabb.max[axis])
                || self.corners.iter().all(|c| c[axis] < aabb.min[axis])
            {
                return false;
            }
        }

        true
    }

    /// Classify an AABB against the frustum planes (3-way test).
    ///
    /// - If the p-vertex is outside any plane → `Outside` (early out)
    /// - If the n-vertex is outside any plane → at least `Partial`
    /// - If all n-vertices are inside all planes → `Inside`
    pub fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        let mut all_inside = true;

        for plane in &self.planes {
            if Self::distance(plane, Self::p_vertex(plane, aabb)) < 0.0 {
                return FrustumTest::Outside;
            }
            if Self::distance(plane, Self::n_vertex(plane, aabb)) < 0.0 {
                all_inside = false;
            }
        }

        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }

    /// Whether a point is inside all six planes
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| Self::distance(plane, point) >= 0.0)
    }

    fn distance(plane: &Vec4, point: Vec3) -> f32 {
        plane.truncate().dot(point) + plane.w
    }

    /// Corner most aligned with the plane normal
    fn p_vertex(plane: &Vec4, aabb: &AABB) -> Vec3 {
        Vec3::new(
            if plane.x >= 0.0 { aabb.max.x } else { aabb.min.x },
            if plane.y >= 0.0 { aabb.max.y } else { aabb.min.y },
            if plane.z >= 0.0 { aabb.max.z } else { aabb.min.z },
        )
    }

    /// Corner least aligned with the plane normal
    fn n_vertex(plane: &Vec4, aabb: &AABB) -> Vec3 {
        Vec3::new(
            if plane.x >= 0.0 { aabb.min.x } else { aabb.max.x },
            if plane.y >= 0.0 { aabb.min.y } else { aabb.max.y },
            if plane.z >= 0.0 { aabb.min.z } else { aabb.max.z },
        )
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
