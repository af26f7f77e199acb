/// Mock Renderer for unit tests (no GPU required)
///
/// Records every backend call in order so tests can assert on the replayed
/// sequence. Individual materials, meshes and shaders can be marked as
/// failing to exercise the skip paths.

use rustc_hash::FxHashSet;
use super::key::{ClearFlags, Viewport};
use super::material_params::{MaterialParamsBlock, ParamValue};
use super::renderer::Renderer;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    BeginFrame,
    EndFrame,
    ResetRenderTarget,
    SetRenderTarget(u16),
    SetViewport(Viewport),
    Clear { flags: ClearFlags, color: [u8; 4], depth: f32, stencil: u8 },
    SetMaterialPass { material: u16, pass: u8 },
    /// `params` holds a copy of the block contents, if one was attached
    DrawMesh { mesh: u16, sub_mesh: u8, params: Option<Vec<(String, ParamValue)>> },
    Dispatch { shader: u16, groups: [u16; 3], params: Option<Vec<(String, ParamValue)>> },
}

#[derive(Debug, Default)]
pub struct MockRenderer {
    pub calls: Vec<MockCall>,
    pub failing_materials: FxHashSet<u16>,
    pub failing_meshes: FxHashSet<u16>,
    pub failing_shaders: FxHashSet<u16>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the draw calls, in replay order
    pub fn draws(&self) -> Vec<&MockCall> {
        self.calls.iter()
            .filter(|call| matches!(call, MockCall::DrawMesh { .. }))
            .collect()
    }

    fn snapshot(params: Option<&MaterialParamsBlock>) -> Option<Vec<(String, ParamValue)>> {
        params.map(|block| block.iter().map(|(n, v)| (n.to_string(), *v)).collect())
    }
}

impl Renderer for MockRenderer {
    fn begin_frame(&mut self) {
        self.calls.push(MockCall::BeginFrame);
    }

    fn end_frame(&mut self) {
        self.calls.push(MockCall::EndFrame);
    }

    fn reset_render_target(&mut self) {
        self.calls.push(MockCall::ResetRenderTarget);
    }

    fn set_render_target(&mut self, render_target: u16) {
        self.calls.push(MockCall::SetRenderTarget(render_target));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.calls.push(MockCall::SetViewport(viewport));
    }

    fn clear(&mut self, flags: ClearFlags, color: [u8; 4], depth: f32, stencil: u8) {
        self.calls.push(MockCall::Clear { flags, color, depth, stencil });
    }

    fn set_material_pass(&mut self, material: u16, pass: u8) -> bool {
        self.calls.push(MockCall::SetMaterialPass { material, pass });
        !self.failing_materials.contains(&material)
    }

    fn draw_mesh(&mut self, mesh: u16, sub_mesh: u8, params: Option<&MaterialParamsBlock>) -> bool {
        self.calls.push(MockCall::DrawMesh { mesh, sub_mesh, params: Self::snapshot(params) });
        !self.failing_meshes.contains(&mesh)
    }

    fn dispatch(&mut self, shader: u16, groups: [u16; 3], params: Option<&MaterialParamsBlock>) -> bool {
        self.calls.push(MockCall::Dispatch { shader, groups, params: Self::snapshot(params) });
        !self.failing_shaders.contains(&shader)
    }
}
