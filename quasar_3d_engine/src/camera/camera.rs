/// Camera - low-level passive data container.
///
/// The caller computes and sets every field (view, projection, clip range,
/// viewport). The engine does NOT store or manage cameras; they are passed
/// to `Engine::render_tick` each frame.
///
/// `depth` and `layer` end up in bytes 0 and 1 of every key the camera
/// records, so they order whole cameras against each other.

use glam::{Mat4, Vec3};
use crate::render::{ClearFlags, Viewport};
use super::frustum::Frustum;

/// What to clear at the start of a camera's commands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearSettings {
    pub flags: ClearFlags,
    /// RGBA8
    pub color: [u8; 4],
    pub depth: f32,
    pub stencil: u8,
}

impl Default for ClearSettings {
    fn default() -> Self {
        Self {
            flags: ClearFlags::COLOR | ClearFlags::DEPTH,
            color: [0, 0, 0, 255],
            depth: 1.0,
            stencil: 0,
        }
    }
}

/// Low-level camera. A passive data container.
#[derive(Debug, Clone)]
pub struct Camera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
    near: f32,
    far: f32,
    viewport: Viewport,
    depth: u8,
    layer: u8,
    render_target: Option<u16>,
    clear: Option<ClearSettings>,
    culling_mask: u32,
}

impl Camera {
    /// Create a camera rendering to the default target, clearing color and depth.
    ///
    /// `near` / `far` must match the projection; they normalize draw depths.
    pub fn new(view: Mat4, projection: Mat4, near: f32, far: f32, viewport: Viewport) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
            near,
            far,
            viewport,
            depth: 0,
            layer: 0,
            render_target: None,
            clear: Some(ClearSettings::default()),
            culling_mask: u32::MAX,
        }
    }

    // ===== GETTERS =====

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix (perspective or orthographic).
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Frustum of the current view-projection
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection_matrix())
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Camera ordering, lower renders first
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Camera layer (0..16), orders cameras of equal depth
    pub fn layer(&self) -> u8 {
        self.layer
    }

    /// Off-screen target, `None` for the default target
    pub fn render_target(&self) -> Option<u16> {
        self.render_target
    }

    pub fn clear_settings(&self) -> Option<&ClearSettings> {
        self.clear.as_ref()
    }

    /// Bitmask of renderer layers this camera draws
    pub fn culling_mask(&self) -> u32 {
        self.culling_mask
    }

    /// Whether renderers on `layer` (0..32) are drawn by this camera
    pub fn sees_layer(&self, layer: u8) -> bool {
        layer < 32 && self.culling_mask & (1 << layer) != 0
    }

    /// View-space distance of a world point, mapped from `[near, far]` to `[0, 1]`
    pub fn normalized_depth(&self, world_point: Vec3) -> f32 {
        let view_z = -self.view_matrix.transform_point3(world_point).z;
        let range = self.far - self.near;
        if range <= 0.0 {
            return 0.0;
        }
        ((view_z - self.near) / range).clamp(0.0, 1.0)
    }

    // ===== SETTERS (store only) =====

    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    pub fn set_projection(&mut self, matrix: Mat4, near: f32, far: f32) {
        self.projection_matrix = matrix;
        self.near = near;
        self.far = far;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_depth(&mut self, depth: u8) {
        self.depth = depth;
    }

    /// Camera layer, `0..16`
    pub fn set_layer(&mut self, layer: u8) {
        debug_assert!(layer < 16, "camera layer out of range: {}", layer);
        self.layer = layer;
    }

    pub fn set_render_target(&mut self, render_target: Option<u16>) {
        self.render_target = render_target;
    }

    /// `None` disables clearing
    pub fn set_clear(&mut self, clear: Option<ClearSettings>) {
        self.clear = clear;
    }

    pub fn set_culling_mask(&mut self, mask: u32) {
        self.culling_mask = mask;
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
