/// Axis-Aligned Bounding Box
///
/// Local-space bounds are attached to renderers; world-space bounds are
/// derived from them every tick and fed to the octree.

use glam::{Affine3A, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl AABB {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self { min: center - half_extents, max: center + half_extents }
    }

    /// Inverted box that any `union` replaces
    pub fn empty() -> Self {
        Self { min: Vec3::splat(f32::INFINITY), max: Vec3::splat(f32::NEG_INFINITY) }
    }

    /// `false` for the `empty()` box
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Largest half extent
    pub fn radius(&self) -> f32 {
        self.half_extents().max_element()
    }

    pub fn union(&self, other: &AABB) -> AABB {
        AABB { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    /// The 8 corners; bit 0 selects x, bit 1 y, bit 2 z (0 = min, 1 = max)
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| Vec3::new(
            if i & 1 == 0 { self.min.x } else { self.max.x },
            if i & 2 == 0 { self.min.y } else { self.max.y },
            if i & 4 == 0 { self.min.z } else { self.max.z },
        ))
    }

    /// Transform this box by an affine matrix, returning the enclosing box.
    ///
    /// Uses the Arvo method: projects each matrix axis onto the box extents
    /// for a tight result without transforming all 8 corners.
    pub fn transformed(&self, matrix: &Affine3A) -> AABB {
        let translation = Vec3::from(matrix.translation);
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = Vec3::from(matrix.matrix3.col(i));
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        AABB { min: new_min, max: new_max }
    }

    /// Whether `other` lies entirely within `self`
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    /// Whether the boxes overlap or touch
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }
}
