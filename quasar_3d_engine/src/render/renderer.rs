/// Renderer trait - the backend a `RenderQueue` replays into.
///
/// Any graphics API can implement it. Calls arrive in sorted key order
/// between `begin_frame` and `end_frame`. Resource-dependent calls report
/// failure through their `bool` return instead of aborting the frame.

use super::key::{ClearFlags, Viewport};
use super::material_params::MaterialParamsBlock;

// ============================================================================
// Frame statistics
// ============================================================================

/// Counters gathered while replaying one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Number of keys replayed
    pub commands: u32,
    /// Draw calls accepted by the backend
    pub draw_calls: u32,
    /// Draw calls skipped (pass bind failed or mesh rejected)
    pub skipped_draw_calls: u32,
    /// Compute dispatches accepted by the backend
    pub dispatches: u32,
    /// Compute dispatches rejected by the backend
    pub skipped_dispatches: u32,
}

// ============================================================================
// Renderer trait
// ============================================================================

/// Backend interface driven by [`RenderQueue::render_frame`](super::RenderQueue::render_frame)
pub trait Renderer: Send {
    /// Start recording a frame
    fn begin_frame(&mut self);

    /// Finish and submit the frame
    fn end_frame(&mut self);

    /// Bind the default render target
    fn reset_render_target(&mut self);

    /// Bind an off-screen render target by backend id
    fn set_render_target(&mut self, render_target: u16);

    fn set_viewport(&mut self, viewport: Viewport);

    fn clear(&mut self, flags: ClearFlags, color: [u8; 4], depth: f32, stencil: u8);

    /// Bind a material pass.
    ///
    /// Returns `false` if the material or pass is unavailable; the dependent
    /// draw is then skipped.
    fn set_material_pass(&mut self, material: u16, pass: u8) -> bool;

    /// Draw one sub-mesh with the currently bound material pass
    fn draw_mesh(&mut self, mesh: u16, sub_mesh: u8, params: Option<&MaterialParamsBlock>) -> bool;

    /// Run a compute shader
    fn dispatch(&mut self, shader: u16, groups: [u16; 3], params: Option<&MaterialParamsBlock>) -> bool;
}
