/// MeshRenderer - a drawable mesh placed in the world through a transform.
///
/// The renderer only stores backend ids (mesh, materials); the resources
/// themselves live in the backend. Its local bounds are transformed into
/// world bounds by `RenderersManager::update` every tick.

use glam::Affine3A;
use crate::render::Translucency;
use crate::transform::TransformId;
use super::aabb::AABB;

/// Sub-meshes and passes beyond this index cannot be encoded in a key
pub const MAX_SUB_MESHES: usize = 16;
pub const MAX_PASSES: u8 = 16;

/// Material assignment of one sub-mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubMeshMaterial {
    pub material: u16,
    /// Number of material passes, each drawn separately
    pub pass_count: u8,
    pub translucency: Translucency,
}

impl SubMeshMaterial {
    /// Single-pass opaque material
    pub fn opaque(material: u16) -> Self {
        Self { material, pass_count: 1, translucency: Translucency::Opaque }
    }

    pub fn with_passes(mut self, pass_count: u8) -> Self {
        self.pass_count = pass_count;
        self
    }

    pub fn with_translucency(mut self, translucency: Translucency) -> Self {
        self.translucency = translucency;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MeshRenderer {
    transform: Option<TransformId>,
    local_bounds: AABB,
    mesh: u16,
    sub_meshes: Vec<SubMeshMaterial>,
    sorting_order: u8,
    layer: u8,
    enabled: bool,
    // Cached by RenderersManager::update
    world_matrix: Affine3A,
    world_bounds: AABB,
}

impl MeshRenderer {
    /// Enabled renderer at the origin, layer 0, without sub-meshes.
    pub fn new(mesh: u16, local_bounds: AABB) -> Self {
        Self {
            transform: None,
            local_bounds,
            mesh,
            sub_meshes: Vec::new(),
            sorting_order: 0,
            layer: 0,
            enabled: true,
            world_matrix: Affine3A::IDENTITY,
            world_bounds: local_bounds,
        }
    }

    // ===== BUILDERS =====

    pub fn with_transform(mut self, transform: TransformId) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_sub_mesh(mut self, sub_mesh: SubMeshMaterial) -> Self {
        self.sub_meshes.push(sub_mesh);
        self
    }

    pub fn with_sorting_order(mut self, sorting_order: u8) -> Self {
        self.sorting_order = sorting_order;
        self
    }

    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    // ===== ACCESSORS =====

    /// Driving transform, `None` places the renderer at the origin
    pub fn transform(&self) -> Option<TransformId> {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Option<TransformId>) {
        self.transform = transform;
    }

    pub fn local_bounds(&self) -> &AABB {
        &self.local_bounds
    }

    pub fn set_local_bounds(&mut self, bounds: AABB) {
        self.local_bounds = bounds;
    }

    pub fn mesh(&self) -> u16 {
        self.mesh
    }

    pub fn set_mesh(&mut self, mesh: u16) {
        self.mesh = mesh;
    }

    pub fn sub_meshes(&self) -> &[SubMeshMaterial] {
        &self.sub_meshes
    }

    pub fn sub_meshes_mut(&mut self) -> &mut Vec<SubMeshMaterial> {
        &mut self.sub_meshes
    }

    pub fn sorting_order(&self) -> u8 {
        self.sorting_order
    }

    pub fn set_sorting_order(&mut self, sorting_order: u8) {
        self.sorting_order = sorting_order;
    }

    /// Layer index (0..32) matched against a camera's culling mask
    pub fn layer(&self) -> u8 {
        self.layer
    }

    pub fn set_layer(&mut self, layer: u8) {
        self.layer = layer;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabled renderers are left out of the octree
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// World matrix as of the last update
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    /// World bounds as of the last update
    pub fn world_bounds(&self) -> &AABB {
        &self.world_bounds
    }

    pub(crate) fn update_world(&mut self, world_matrix: Affine3A) {
        self.world_matrix = world_matrix;
        self.world_bounds = self.local_bounds.transformed(&world_matrix);
    }
}
