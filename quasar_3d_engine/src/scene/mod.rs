//! Scene module
//!
//! Mesh renderers, their world bounds, the per-frame octree used for
//! frustum culling, and the drawing strategy that turns visible renderers
//! into render keys.

mod aabb;
mod mesh_renderer;
mod octree;
mod renderers_manager;
mod drawer;

pub use aabb::AABB;
pub use mesh_renderer::{MeshRenderer, SubMeshMaterial, MAX_SUB_MESHES, MAX_PASSES};
pub use octree::Octree;
pub use renderers_manager::RenderersManager;
pub use drawer::{Drawer, ForwardDrawer};
