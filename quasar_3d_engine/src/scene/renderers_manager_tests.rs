use glam::{Affine3A, Mat4, Vec3};
use crate::config::OctreeConfig;
use crate::error::Error;
use crate::transform::TransformsManager;
use super::*;

fn unit_bounds() -> AABB {
    AABB::new(Vec3::splat(-0.5), Vec3::splat(0.5))
}

/// Looking down -Z from the origin
fn forward_view_projection() -> Mat4 {
    let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
    let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y);
    proj * view
}

fn renderer_at(transforms: &mut TransformsManager, position: Vec3) -> MeshRenderer {
    let id = transforms
        .register_transform(Affine3A::from_translation(position), None)
        .unwrap();
    MeshRenderer::new(1, unit_bounds()).with_transform(id)
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_register_and_lookup() {
    let mut manager = RenderersManager::new();
    let handle = manager.register_renderer(MeshRenderer::new(7, unit_bounds()));

    assert_eq!(manager.len(), 1);
    assert!(manager.contains(handle));
    assert_eq!(manager.renderer(handle).unwrap().mesh(), 7);

    manager.renderer_mut(handle).unwrap().set_mesh(8);
    assert_eq!(manager.renderer(handle).unwrap().mesh(), 8);
}

#[test]
fn test_unregister_renderer() {
    let mut manager = RenderersManager::new();
    let handle = manager.register_renderer(MeshRenderer::new(7, unit_bounds()));

    let removed = manager.unregister_renderer(handle).unwrap();
    assert_eq!(removed.mesh(), 7);
    assert!(manager.is_empty());
    assert!(manager.renderer(handle).is_none());
}

#[test]
fn test_unregister_unknown_handle_fails() {
    let mut manager = RenderersManager::new();
    let handle = manager.register_renderer(MeshRenderer::new(7, unit_bounds()));
    manager.unregister_renderer(handle).unwrap();

    let result = manager.unregister_renderer(handle);
    assert!(matches!(result, Err(Error::InvalidHandle(_))));
}

// ============================================================================
// Update
// ============================================================================

#[test]
fn test_update_computes_world_bounds() {
    let mut transforms = TransformsManager::new();
    let mut manager = RenderersManager::new();
    let handle = manager.register_renderer(renderer_at(&mut transforms, Vec3::new(3.0, 0.0, 0.0)));

    assert_eq!(manager.update(&mut transforms), 1);

    let renderer = manager.renderer(handle).unwrap();
    assert!(renderer.world_bounds().min.abs_diff_eq(Vec3::new(2.5, -0.5, -0.5), 1e-5));
    assert!(renderer.world_bounds().max.abs_diff_eq(Vec3::new(3.5, 0.5, 0.5), 1e-5));
    assert_eq!(manager.octree().item_count(), 1);
}

#[test]
fn test_update_follows_parent_transform() {
    let mut transforms = TransformsManager::new();
    let parent = transforms
        .register_transform(Affine3A::from_translation(Vec3::new(0.0, 10.0, 0.0)), None)
        .unwrap();
    let child = transforms
        .register_transform(Affine3A::from_translation(Vec3::new(1.0, 10.0, 0.0)), Some(parent))
        .unwrap();

    let mut manager = RenderersManager::new();
    let handle = manager.register_renderer(MeshRenderer::new(1, unit_bounds()).with_transform(child));
    manager.update(&mut transforms);

    let center = manager.renderer(handle).unwrap().world_bounds().center();
    assert!(center.abs_diff_eq(Vec3::new(1.0, 10.0, 0.0), 1e-5));

    transforms
        .set_world_matrix(parent, Affine3A::from_translation(Vec3::new(0.0, 20.0, 0.0)))
        .unwrap();
    manager.update(&mut transforms);

    let center = manager.renderer(handle).unwrap().world_bounds().center();
    assert!(center.abs_diff_eq(Vec3::new(1.0, 20.0, 0.0), 1e-5));
}

#[test]
fn test_renderer_without_transform_sits_at_origin() {
    let mut transforms = TransformsManager::new();
    let mut manager = RenderersManager::new();
    let handle = manager.register_renderer(MeshRenderer::new(1, unit_bounds()));

    manager.update(&mut transforms);
    assert_eq!(*manager.renderer(handle).unwrap().world_bounds(), unit_bounds());
}

#[test]
fn test_stale_transform_is_skipped() {
    let mut transforms = TransformsManager::new();
    let mut manager = RenderersManager::new();
    let renderer = renderer_at(&mut transforms, Vec3::ZERO);
    let id = renderer.transform().unwrap();
    manager.register_renderer(renderer);
    transforms.unregister_transform(id).unwrap();

    assert_eq!(manager.update(&mut transforms), 0);
    assert_eq!(manager.octree().item_count(), 0);
}

#[test]
fn test_disabled_renderer_is_not_indexed() {
    let mut transforms = TransformsManager::new();
    let mut manager = RenderersManager::new();
    let handle = manager.register_renderer(MeshRenderer::new(1, unit_bounds()));
    manager.renderer_mut(handle).unwrap().set_enabled(false);

    assert_eq!(manager.update(&mut transforms), 0);
}

#[test]
fn test_octree_depth_respects_config() {
    let mut transforms = TransformsManager::new();
    let mut manager = RenderersManager::with_config(&OctreeConfig { max_depth: 2 });

    manager.register_renderer(MeshRenderer::new(
        1,
        AABB::new(Vec3::splat(-100.0), Vec3::splat(100.0)),
    ));
    for i in 0..10 {
        let position = Vec3::new(i as f32 * 10.0 - 50.0, 0.0, 0.0);
        manager.register_renderer(renderer_at(&mut transforms, position));
    }

    manager.update(&mut transforms);
    assert!(manager.octree().depth() <= 2);
    assert_eq!(manager.octree().max_depth(), 2);
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_query_renderers_culls_by_frustum() {
    let mut transforms = TransformsManager::new();
    let mut manager = RenderersManager::new();
    let front = manager.register_renderer(renderer_at(&mut transforms, Vec3::new(0.0, 0.0, -10.0)));
    let behind = manager.register_renderer(renderer_at(&mut transforms, Vec3::new(0.0, 0.0, 10.0)));
    let left = manager.register_renderer(renderer_at(&mut transforms, Vec3::new(-40.0, 0.0, -10.0)));

    manager.update(&mut transforms);
    let count = manager.query_renderers(&forward_view_projection());

    assert_eq!(count, 1);
    assert_eq!(manager.visible_renderer(0), Some(front));
    assert_eq!(manager.visible_renderer(1), None);
    assert!(!manager.visible_renderers().contains(&behind));
    assert!(!manager.visible_renderers().contains(&left));
}

#[test]
fn test_query_overwrites_previous_result() {
    let mut transforms = TransformsManager::new();
    let mut manager = RenderersManager::new();
    manager.register_renderer(renderer_at(&mut transforms, Vec3::new(0.0, 0.0, -10.0)));
    manager.register_renderer(renderer_at(&mut transforms, Vec3::new(0.0, 0.0, 10.0)));
    manager.update(&mut transforms);

    assert_eq!(manager.query_renderers(&forward_view_projection()), 1);

    let backward = {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        proj * Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), Vec3::Y)
    };
    assert_eq!(manager.query_renderers(&backward), 1);
    assert_eq!(manager.visible_renderers().len(), 1);
}

#[test]
fn test_moved_transform_changes_visibility() {
    let mut transforms = TransformsManager::new();
    let mut manager = RenderersManager::new();
    let renderer = renderer_at(&mut transforms, Vec3::new(0.0, 0.0, 10.0));
    let id = renderer.transform().unwrap();
    let handle = manager.register_renderer(renderer);

    manager.update(&mut transforms);
    assert_eq!(manager.query_renderers(&forward_view_projection()), 0);

    transforms
        .set_world_matrix(id, Affine3A::from_translation(Vec3::new(0.0, 0.0, -10.0)))
        .unwrap();
    manager.update(&mut transforms);
    assert_eq!(manager.query_renderers(&forward_view_projection()), 1);
    assert_eq!(manager.visible_renderer(0), Some(handle));
}

#[test]
fn test_unregister_removes_from_visible_list() {
    let mut transforms = TransformsManager::new();
    let mut manager = RenderersManager::new();
    let handle = manager.register_renderer(renderer_at(&mut transforms, Vec3::new(0.0, 0.0, -10.0)));
    manager.update(&mut transforms);
    manager.query_renderers(&forward_view_projection());

    manager.unregister_renderer(handle).unwrap();
    assert!(manager.visible_renderers().is_empty());
}
