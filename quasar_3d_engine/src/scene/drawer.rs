/// Drawing strategies.
///
/// A Drawer culls the renderers against one camera and records the
/// resulting keys into the render queue. Implementations range from simple
/// forward rendering to instanced approaches.

use glam::Mat4;
use crate::camera::Camera;
use crate::render::{DrawCall, Key, RenderQueue};
use crate::engine_warn;
use super::mesh_renderer::{MAX_PASSES, MAX_SUB_MESHES};
use super::renderers_manager::RenderersManager;

const SOURCE: &str = "quasar3d::ForwardDrawer";

/// Strategy for recording one camera's commands.
///
/// Called between `begin_frame_commands` and `end_frame_commands`.
/// `&self` because drawing is stateless; the same Drawer can be
/// reused across cameras and frames.
pub trait Drawer: Send + Sync {
    /// Record the camera's commands. Returns the number of draw calls sent.
    fn draw(&self, camera: &Camera, renderers: &mut RenderersManager, queue: &mut RenderQueue) -> usize;
}

/// Forward drawer: one draw call per visible renderer, sub-mesh and pass.
///
/// Per camera it records, in sequence order: the render target binding,
/// the viewport, the optional clear. Each draw gets a params block holding
/// `u_Model` (world matrix) and `u_Depth` (normalized view depth).
pub struct ForwardDrawer;

impl ForwardDrawer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ForwardDrawer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drawer for ForwardDrawer {
    fn draw(&self, camera: &Camera, renderers: &mut RenderersManager, queue: &mut RenderQueue) -> usize {
        let base = Key::new(camera.depth(), camera.layer());

        // Camera state, before any draw of the same camera
        match camera.render_target() {
            Some(target) => queue.send_command(base.sequence(0).set_render_target(target)),
            None => queue.send_command(base.sequence(0).reset_render_target()),
        }
        queue.send_command(base.sequence(1).set_viewport(camera.viewport()));
        if let Some(clear) = camera.clear_settings() {
            queue.send_command(base.sequence(2).clear(clear.flags, clear.color, clear.depth, clear.stencil));
        }

        renderers.query_renderers(&camera.view_projection_matrix());

        let mut sent = 0;
        for &handle in renderers.visible_renderers() {
            let Some(renderer) = renderers.renderer(handle) else {
                continue;
            };
            if !camera.sees_layer(renderer.layer()) {
                continue;
            }
            if renderer.sub_meshes().len() > MAX_SUB_MESHES {
                engine_warn!(
                    SOURCE, "Renderer {:?}: only the first {} of {} sub-meshes are drawn",
                    handle, MAX_SUB_MESHES, renderer.sub_meshes().len()
                );
            }

            let model = Mat4::from(*renderer.world_matrix());
            let view_depth = camera.normalized_depth(renderer.world_bounds().center());

            for (sub_mesh_index, sub_mesh) in renderer.sub_meshes().iter().take(MAX_SUB_MESHES).enumerate() {
                for pass in 0..sub_mesh.pass_count.min(MAX_PASSES) {
                    let (params_id, params) = queue.allocate_params_block();
                    params.set_mat4("u_Model", model).set_float("u_Depth", view_depth);

                    let draw = DrawCall::new(sub_mesh.translucency, sub_mesh.material, renderer.mesh())
                        .sorting_order(renderer.sorting_order())
                        .pass(pass)
                        .sub_mesh(sub_mesh_index as u8)
                        .depth(view_depth)
                        .params(params_id);
                    queue.send_command(base.draw_call(draw));
                    sent += 1;
                }
            }
        }

        sent
    }
}

#[cfg(test)]
#[path = "drawer_tests.rs"]
mod tests;
