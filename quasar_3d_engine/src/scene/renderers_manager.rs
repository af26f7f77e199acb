/// RenderersManager - owns every mesh renderer and culls them per camera.
///
/// `update` runs once per tick: it refreshes world bounds from the
/// transforms and rebuilds the octree from scratch. Each camera then calls
/// `query_renderers`, which overwrites the shared visible list.

use glam::{Affine3A, Mat4};
use crate::camera::Frustum;
use crate::config::OctreeConfig;
use crate::error::Result;
use crate::transform::TransformsManager;
use crate::utils::{Handle, Pool};
use crate::{engine_bail, engine_debug, engine_warn};
use super::aabb::AABB;
use super::mesh_renderer::MeshRenderer;
use super::octree::Octree;

const SOURCE: &str = "quasar3d::RenderersManager";

pub struct RenderersManager {
    renderers: Pool<MeshRenderer>,
    octree: Octree<Handle<MeshRenderer>>,
    /// Reused between rebuilds
    build_entries: Vec<(Handle<MeshRenderer>, AABB)>,
    /// Result of the last query
    visible: Vec<Handle<MeshRenderer>>,
}

impl RenderersManager {
    pub fn new() -> Self {
        Self::with_config(&OctreeConfig::default())
    }

    pub fn with_config(config: &OctreeConfig) -> Self {
        Self {
            renderers: Pool::new(),
            octree: Octree::new(config.max_depth),
            build_entries: Vec::new(),
            visible: Vec::new(),
        }
    }

    // ===== REGISTRATION =====

    pub fn register_renderer(&mut self, renderer: MeshRenderer) -> Handle<MeshRenderer> {
        let handle = self.renderers.allocate(renderer);
        engine_debug!(SOURCE, "Registered renderer {:?}", handle);
        handle
    }

    /// Remove a renderer, returning it.
    ///
    /// It disappears from the visible list immediately; the octree forgets
    /// it on the next `update`.
    pub fn unregister_renderer(&mut self, handle: Handle<MeshRenderer>) -> Result<MeshRenderer> {
        let Some(renderer) = self.renderers.free(handle) else {
            engine_bail!(SOURCE, InvalidHandle, "unregister_renderer: {:?} is not registered", handle);
        };
        self.visible.retain(|&h| h != handle);
        engine_debug!(SOURCE, "Unregistered renderer {:?}", handle);
        Ok(renderer)
    }

    pub fn renderer(&self, handle: Handle<MeshRenderer>) -> Option<&MeshRenderer> {
        self.renderers.get(handle)
    }

    pub fn renderer_mut(&mut self, handle: Handle<MeshRenderer>) -> Option<&mut MeshRenderer> {
        self.renderers.get_mut(handle)
    }

    pub fn contains(&self, handle: Handle<MeshRenderer>) -> bool {
        self.renderers.contains(handle)
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<MeshRenderer>, &MeshRenderer)> + '_ {
        self.renderers.iter()
    }

    // ===== PER-TICK UPDATE =====

    /// Refresh world bounds and rebuild the octree.
    ///
    /// Renderers without a transform sit at the origin. Renderers whose
    /// transform is no longer registered are skipped for this tick.
    /// Returns the number of renderers placed in the octree.
    pub fn update(&mut self, transforms: &mut TransformsManager) -> usize {
        self.build_entries.clear();
        self.visible.clear();

        for (handle, renderer) in self.renderers.iter_mut() {
            if !renderer.is_enabled() {
                continue;
            }

            let world = match renderer.transform() {
                None => Affine3A::IDENTITY,
                Some(id) => match transforms.world_matrix(id) {
                    Some(world) => world,
                    None => {
                        engine_warn!(SOURCE, "Renderer {:?} references unknown transform {:?}, skipped", handle, id);
                        continue;
                    }
                },
            };

            renderer.update_world(world);
            self.build_entries.push((handle, *renderer.world_bounds()));
        }

        let placed = self.octree.build(&self.build_entries);
        if placed < self.build_entries.len() {
            engine_warn!(
                SOURCE,
                "{} renderer(s) with invalid world bounds left out of the octree",
                self.build_entries.len() - placed
            );
        }
        placed
    }

    // ===== VISIBILITY =====

    /// Fill the visible list with renderers inside the frustum of `view_projection`.
    pub fn query_renderers(&mut self, view_projection: &Mat4) -> usize {
        let frustum = Frustum::from_view_projection(view_projection);
        self.query_frustum(&frustum)
    }

    pub fn query_frustum(&mut self, frustum: &Frustum) -> usize {
        self.visible.clear();
        self.octree.query(frustum, &mut self.visible);
        self.visible.len()
    }

    /// Entry `index` of the last query result
    pub fn visible_renderer(&self, index: usize) -> Option<Handle<MeshRenderer>> {
        self.visible.get(index).copied()
    }

    pub fn visible_renderers(&self) -> &[Handle<MeshRenderer>] {
        &self.visible
    }

    pub fn octree(&self) -> &Octree<Handle<MeshRenderer>> {
        &self.octree
    }
}

impl Default for RenderersManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "renderers_manager_tests.rs"]
mod tests;
