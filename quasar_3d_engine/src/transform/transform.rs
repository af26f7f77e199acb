/// Transform - component-facing view over one `TransformsManager` entry.
///
/// Caches the decomposed world placement (position, rotation, scale) and
/// the `local_to_world` / `world_to_local` matrices. The cache is refreshed
/// lazily on read whenever the manager's resolved world differs from it.
///
/// The manager is always passed in explicitly; a `Transform` holds no
/// reference to it.

use glam::{Affine3A, Mat4, Quat, Vec3};
use crate::error::Result;
use super::transforms_manager::{TransformId, TransformsManager};

/// Cached, component-side handle to a registered transform
#[derive(Debug, Clone)]
pub struct Transform {
    id: TransformId,
    needs_update: bool,
    world: Affine3A,
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    local_to_world: Mat4,
    world_to_local: Mat4,
}

impl Transform {
    /// Register a new transform placed at `world`, optionally under `parent`
    pub fn new(
        manager: &mut TransformsManager,
        world: Affine3A,
        parent: Option<&Transform>,
    ) -> Result<Self> {
        let id = manager.register_transform(world, parent.map(|p| p.id))?;
        let mut transform = Self {
            id,
            needs_update: true,
            world,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_to_world: Mat4::IDENTITY,
            world_to_local: Mat4::IDENTITY,
        };
        transform.refresh(manager);
        Ok(transform)
    }

    /// Id of the underlying manager entry
    pub fn id(&self) -> TransformId {
        self.id
    }

    /// Unregister from the manager; children keep their world placement
    pub fn destroy(self, manager: &mut TransformsManager) -> Result<()> {
        manager.unregister_transform(self.id)
    }

    // ===== HIERARCHY =====

    pub fn set_parent(
        &mut self,
        manager: &mut TransformsManager,
        parent: Option<&Transform>,
    ) -> Result<()> {
        manager.set_parent(self.id, parent.map(|p| p.id))?;
        self.needs_update = true;
        Ok(())
    }

    pub fn parent(&self, manager: &TransformsManager) -> Option<TransformId> {
        manager.parent(self.id)
    }

    // ===== SETTERS =====

    pub fn set_local_matrix(&mut self, manager: &mut TransformsManager, local: Affine3A) -> Result<()> {
        manager.set_local_matrix(self.id, local)?;
        self.needs_update = true;
        Ok(())
    }

    pub fn set_world_matrix(&mut self, manager: &mut TransformsManager, world: Affine3A) -> Result<()> {
        manager.set_world_matrix(self.id, world)?;
        self.needs_update = true;
        Ok(())
    }

    /// Move to a world-space position, keeping world rotation and scale
    pub fn set_position(&mut self, manager: &mut TransformsManager, position: Vec3) -> Result<()> {
        self.refresh(manager);
        let world = Affine3A::from_scale_rotation_translation(self.scale, self.rotation, position);
        self.set_world_matrix(manager, world)
    }

    /// Set the world-space rotation, keeping world position and scale
    pub fn set_rotation(&mut self, manager: &mut TransformsManager, rotation: Quat) -> Result<()> {
        self.refresh(manager);
        let world = Affine3A::from_scale_rotation_translation(self.scale, rotation, self.position);
        self.set_world_matrix(manager, world)
    }

    /// Set the world-space scale, keeping world position and rotation
    pub fn set_scale(&mut self, manager: &mut TransformsManager, scale: Vec3) -> Result<()> {
        self.refresh(manager);
        let world = Affine3A::from_scale_rotation_translation(scale, self.rotation, self.position);
        self.set_world_matrix(manager, world)
    }

    // ===== GETTERS =====

    pub fn local_matrix(&self, manager: &TransformsManager) -> Option<Affine3A> {
        manager.local_matrix(self.id)
    }

    pub fn world_matrix(&mut self, manager: &mut TransformsManager) -> Affine3A {
        self.refresh(manager);
        self.world
    }

    pub fn world_position(&mut self, manager: &mut TransformsManager) -> Vec3 {
        self.refresh(manager);
        self.position
    }

    pub fn world_rotation(&mut self, manager: &mut TransformsManager) -> Quat {
        self.refresh(manager);
        self.rotation
    }

    pub fn world_scale(&mut self, manager: &mut TransformsManager) -> Vec3 {
        self.refresh(manager);
        self.scale
    }

    pub fn local_to_world(&mut self, manager: &mut TransformsManager) -> Mat4 {
        self.refresh(manager);
        self.local_to_world
    }

    pub fn world_to_local(&mut self, manager: &mut TransformsManager) -> Mat4 {
        self.refresh(manager);
        self.world_to_local
    }

    /// Whether the entry changed since the manager's last `clear_changed`
    pub fn has_changed(&self, manager: &TransformsManager) -> bool {
        manager.has_changed(self.id)
    }

    /// Re-sync the cache with the manager. A stale id keeps the last cache.
    fn refresh(&mut self, manager: &mut TransformsManager) {
        let Some(world) = manager.world_matrix(self.id) else {
            return;
        };
        if !self.needs_update && world == self.world {
            return;
        }

        let (scale, rotation, position) = world.to_scale_rotation_translation();
        self.world = world;
        self.position = position;
        self.rotation = rotation;
        self.scale = scale;
        self.local_to_world = Mat4::from(world);
        self.world_to_local = Mat4::from(world.inverse());
        self.needs_update = false;
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
