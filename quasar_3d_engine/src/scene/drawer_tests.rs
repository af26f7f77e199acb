use glam::{Affine3A, Mat4, Vec3};
use crate::camera::{Camera, ClearSettings};
use crate::render::{ParamValue, RenderQueue, Translucency, Viewport};
use crate::render::mock_renderer::{MockCall, MockRenderer};
use crate::transform::TransformsManager;
use super::super::aabb::AABB;
use super::super::mesh_renderer::{MeshRenderer, SubMeshMaterial};
use super::*;

/// Camera at the origin looking down -Z, near 1, far 101
fn forward_camera() -> Camera {
    let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y);
    let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 101.0);
    Camera::new(view, proj, 1.0, 101.0, Viewport::new(0, 0, 640, 480))
}

fn renderer_at(transforms: &mut TransformsManager, position: Vec3, mesh: u16) -> MeshRenderer {
    let id = transforms
        .register_transform(Affine3A::from_translation(position), None)
        .unwrap();
    MeshRenderer::new(mesh, AABB::new(Vec3::splat(-0.5), Vec3::splat(0.5))).with_transform(id)
}

/// Record one frame with the forward drawer and replay it
fn draw_frame(
    camera: &Camera,
    transforms: &mut TransformsManager,
    renderers: &mut RenderersManager,
) -> (usize, MockRenderer) {
    let mut queue = RenderQueue::new();
    renderers.update(transforms);

    queue.begin_frame_commands();
    let sent = ForwardDrawer::new().draw(camera, renderers, &mut queue);
    queue.end_frame_commands();

    let mut backend = MockRenderer::new();
    queue.render_frame(&mut backend).unwrap();
    assert_eq!(queue.live_params_blocks(), 0);
    (sent, backend)
}

#[test]
fn test_camera_state_precedes_draws() {
    let mut transforms = TransformsManager::new();
    let mut renderers = RenderersManager::new();
    renderers.register_renderer(
        renderer_at(&mut transforms, Vec3::new(0.0, 0.0, -10.0), 3)
            .with_sub_mesh(SubMeshMaterial::opaque(9)),
    );

    let camera = forward_camera();
    let (sent, backend) = draw_frame(&camera, &mut transforms, &mut renderers);

    assert_eq!(sent, 1);
    let clear = ClearSettings::default();
    assert_eq!(backend.calls[0], MockCall::BeginFrame);
    assert_eq!(backend.calls[1], MockCall::ResetRenderTarget);
    assert_eq!(backend.calls[2], MockCall::SetViewport(Viewport::new(0, 0, 640, 480)));
    assert_eq!(
        backend.calls[3],
        MockCall::Clear { flags: clear.flags, color: clear.color, depth: clear.depth, stencil: clear.stencil }
    );
    assert_eq!(backend.calls[4], MockCall::SetMaterialPass { material: 9, pass: 0 });
    assert!(matches!(backend.calls[5], MockCall::DrawMesh { mesh: 3, sub_mesh: 0, .. }));
    assert_eq!(backend.calls[6], MockCall::EndFrame);
}

#[test]
fn test_render_target_and_no_clear() {
    let mut transforms = TransformsManager::new();
    let mut renderers = RenderersManager::new();

    let mut camera = forward_camera();
    camera.set_render_target(Some(4));
    camera.set_clear(None);
    let (sent, backend) = draw_frame(&camera, &mut transforms, &mut renderers);

    assert_eq!(sent, 0);
    assert_eq!(
        backend.calls,
        vec![
            MockCall::BeginFrame,
            MockCall::SetRenderTarget(4),
            MockCall::SetViewport(Viewport::new(0, 0, 640, 480)),
            MockCall::EndFrame,
        ]
    );
}

#[test]
fn test_one_draw_per_sub_mesh_and_pass() {
    let mut transforms = TransformsManager::new();
    let mut renderers = RenderersManager::new();
    renderers.register_renderer(
        renderer_at(&mut transforms, Vec3::new(0.0, 0.0, -10.0), 3)
            .with_sub_mesh(SubMeshMaterial::opaque(1).with_passes(2))
            .with_sub_mesh(SubMeshMaterial::opaque(2)),
    );

    let (sent, backend) = draw_frame(&forward_camera(), &mut transforms, &mut renderers);

    assert_eq!(sent, 3);
    assert_eq!(backend.draws().len(), 3);
}

#[test]
fn test_draw_params_carry_model_and_depth() {
    let mut transforms = TransformsManager::new();
    let mut renderers = RenderersManager::new();
    renderers.register_renderer(
        renderer_at(&mut transforms, Vec3::new(0.0, 0.0, -51.0), 3)
            .with_sub_mesh(SubMeshMaterial::opaque(1)),
    );

    let (_, backend) = draw_frame(&forward_camera(), &mut transforms, &mut renderers);

    let draws = backend.draws();
    let MockCall::DrawMesh { params: Some(params), .. } = draws[0] else {
        panic!("draw without params");
    };
    let model = Mat4::from_translation(Vec3::new(0.0, 0.0, -51.0));
    assert!(params.contains(&("u_Model".to_string(), ParamValue::Mat4(model))));

    let depth = params.iter().find(|(name, _)| name == "u_Depth").map(|(_, v)| *v);
    let Some(ParamValue::Float(depth)) = depth else {
        panic!("missing u_Depth");
    };
    assert!((depth - 0.5).abs() < 1e-5);
}

#[test]
fn test_culled_and_masked_renderers_are_not_drawn() {
    let mut transforms = TransformsManager::new();
    let mut renderers = RenderersManager::new();
    renderers.register_renderer(
        renderer_at(&mut transforms, Vec3::new(0.0, 0.0, 10.0), 1)
            .with_sub_mesh(SubMeshMaterial::opaque(1)),
    );
    renderers.register_renderer(
        renderer_at(&mut transforms, Vec3::new(0.0, 0.0, -10.0), 2)
            .with_sub_mesh(SubMeshMaterial::opaque(1))
            .with_layer(3),
    );
    renderers.register_renderer(
        renderer_at(&mut transforms, Vec3::new(1.0, 0.0, -10.0), 3)
            .with_sub_mesh(SubMeshMaterial::opaque(1)),
    );

    let mut camera = forward_camera();
    camera.set_culling_mask(!(1 << 3));
    let (sent, backend) = draw_frame(&camera, &mut transforms, &mut renderers);

    assert_eq!(sent, 1);
    assert!(matches!(backend.draws()[0], MockCall::DrawMesh { mesh: 3, .. }));
}

#[test]
fn test_transparent_drawn_back_to_front_after_opaque() {
    let mut transforms = TransformsManager::new();
    let mut renderers = RenderersManager::new();
    let glass = SubMeshMaterial::opaque(5).with_translucency(Translucency::Transparent);

    renderers.register_renderer(renderer_at(&mut transforms, Vec3::new(0.0, 0.0, -5.0), 1).with_sub_mesh(glass));
    renderers.register_renderer(renderer_at(&mut transforms, Vec3::new(0.0, 0.0, -50.0), 2).with_sub_mesh(glass));
    renderers.register_renderer(
        renderer_at(&mut transforms, Vec3::new(0.0, 0.0, -20.0), 3)
            .with_sub_mesh(SubMeshMaterial::opaque(7)),
    );

    let (_, backend) = draw_frame(&forward_camera(), &mut transforms, &mut renderers);

    let meshes: Vec<u16> = backend.draws().iter()
        .map(|call| match call {
            MockCall::DrawMesh { mesh, .. } => *mesh,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(meshes, vec![3, 2, 1]);
}
