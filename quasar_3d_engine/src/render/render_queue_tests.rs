use glam::Mat4;
use crate::render::key::{ClearFlags, DrawCall, Translucency, Viewport, KEY_SIZE};
use crate::render::material_params::ParamValue;
use crate::render::mock_renderer::{MockCall, MockRenderer};
use super::*;

fn draw(translucency: Translucency, material: u16, mesh: u16, depth: f32) -> Key {
    Key::new(0, 0).draw_call(DrawCall::new(translucency, material, mesh).depth(depth))
}

fn drawn_meshes(renderer: &MockRenderer) -> Vec<u16> {
    renderer.draws().iter()
        .map(|call| match call {
            MockCall::DrawMesh { mesh, .. } => *mesh,
            _ => unreachable!(),
        })
        .collect()
}

// ============================================================================
// Frame bracketing
// ============================================================================

#[test]
#[should_panic(expected = "already being recorded")]
fn test_begin_twice_panics() {
    let mut queue = RenderQueue::new();
    queue.begin_frame_commands();
    queue.begin_frame_commands();
}

#[test]
#[should_panic(expected = "outside of a recorded frame")]
fn test_send_outside_frame_panics() {
    let mut queue = RenderQueue::new();
    queue.send_command(Key::new(0, 0));
}

#[test]
#[should_panic(expected = "without a matching")]
fn test_end_without_begin_panics() {
    let mut queue = RenderQueue::new();
    queue.end_frame_commands();
}

#[test]
fn test_render_frame_is_noop_without_pending_frame() {
    let mut queue = RenderQueue::new();
    let mut renderer = MockRenderer::new();

    assert!(queue.render_frame(&mut renderer).is_none());
    assert!(renderer.calls.is_empty());
}

#[test]
fn test_render_frame_is_noop_while_recording() {
    let mut queue = RenderQueue::new();
    let mut renderer = MockRenderer::new();

    queue.begin_frame_commands();
    queue.send_command(Key::new(0, 0));
    queue.end_frame_commands();
    queue.begin_frame_commands();

    assert!(queue.is_recording());
    assert!(queue.render_frame(&mut renderer).is_none());
    assert!(renderer.calls.is_empty());
    assert_eq!(queue.pending_frames(), 1);
}

#[test]
fn test_empty_frame_still_brackets_backend() {
    let mut queue = RenderQueue::new();
    let mut renderer = MockRenderer::new();

    queue.begin_frame_commands();
    queue.end_frame_commands();
    let stats = queue.render_frame(&mut renderer).unwrap();

    assert_eq!(stats, FrameStats::default());
    assert_eq!(renderer.calls, vec![MockCall::BeginFrame, MockCall::EndFrame]);
}

// ============================================================================
// Sorting and replay
// ============================================================================

#[test]
fn test_replay_follows_key_order() {
    let mut queue = RenderQueue::new();
    let mut renderer = MockRenderer::new();
    let viewport = Viewport::new(0, 0, 640, 480);

    queue.begin_frame_commands();
    queue.send_command(draw(Translucency::Transparent, 1, 30, 0.1));
    queue.send_command(draw(Translucency::Opaque, 2, 20, 0.5));
    queue.send_command(Key::new(0, 0).sequence(1).set_viewport(viewport));
    queue.send_command(draw(Translucency::Transparent, 1, 31, 0.9));
    queue.send_command(draw(Translucency::Opaque, 1, 10, 0.5));
    queue.send_command(Key::new(0, 0).sequence(0).set_render_target(3));
    queue.end_frame_commands();

    let stats = queue.render_frame(&mut renderer).unwrap();

    assert_eq!(stats.commands, 6);
    assert_eq!(stats.draw_calls, 4);
    assert_eq!(renderer.calls[0], MockCall::BeginFrame);
    assert_eq!(renderer.calls[1], MockCall::SetRenderTarget(3));
    assert_eq!(renderer.calls[2], MockCall::SetViewport(viewport));
    assert_eq!(*renderer.calls.last().unwrap(), MockCall::EndFrame);

    // Opaque by material, then transparent far to near
    assert_eq!(drawn_meshes(&renderer), vec![10, 20, 31, 30]);
}

#[test]
fn test_same_material_pass_is_bound_once() {
    let mut queue = RenderQueue::new();
    let mut renderer = MockRenderer::new();

    queue.begin_frame_commands();
    queue.send_command(draw(Translucency::Opaque, 4, 1, 0.0));
    queue.send_command(draw(Translucency::Opaque, 4, 2, 0.0));
    queue.send_command(draw(Translucency::Opaque, 5, 3, 0.0));
    queue.end_frame_commands();
    queue.render_frame(&mut renderer);

    let binds = renderer.calls.iter()
        .filter(|call| matches!(call, MockCall::SetMaterialPass { .. }))
        .count();
    assert_eq!(binds, 2);
}

#[test]
fn test_state_command_between_draws_forces_rebind() {
    let mut queue = RenderQueue::new();
    let mut renderer = MockRenderer::new();

    queue.begin_frame_commands();
    queue.send_command(draw(Translucency::Opaque, 4, 1, 0.0));
    queue.send_command(Key::new(0, 1).sequence(4).dispatch(9, [1, 1, 1], None));
    queue.send_command(Key::new(0, 1).sequence(0).set_render_target(3));
    queue.send_command(
        Key::new(0, 1).draw_call(DrawCall::new(Translucency::Opaque, 4, 2)),
    );
    queue.end_frame_commands();
    let stats = queue.render_frame(&mut renderer).unwrap();

    assert_eq!(stats.draw_calls, 2);
    assert_eq!(
        renderer.calls,
        vec![
            MockCall::BeginFrame,
            MockCall::SetMaterialPass { material: 4, pass: 0 },
            MockCall::DrawMesh { mesh: 1, sub_mesh: 0, params: None },
            MockCall::SetRenderTarget(3),
            MockCall::Dispatch { shader: 9, groups: [1, 1, 1], params: None },
            MockCall::SetMaterialPass { material: 4, pass: 0 },
            MockCall::DrawMesh { mesh: 2, sub_mesh: 0, params: None },
            MockCall::EndFrame,
        ]
    );
}

#[test]
fn test_failed_pass_bind_skips_dependent_draws() {
    let mut queue = RenderQueue::new();
    let mut renderer = MockRenderer::new();
    renderer.failing_materials.insert(7);

    queue.begin_frame_commands();
    queue.send_command(draw(Translucency::Opaque, 7, 1, 0.0));
    queue.send_command(draw(Translucency::Opaque, 7, 2, 0.0));
    queue.send_command(draw(Translucency::Opaque, 8, 3, 0.0));
    queue.end_frame_commands();
    let stats = queue.render_frame(&mut renderer).unwrap();

    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.skipped_draw_calls, 2);
    assert_eq!(drawn_meshes(&renderer), vec![3]);
}

#[test]
fn test_rejected_mesh_is_counted() {
    let mut queue = RenderQueue::new();
    let mut renderer = MockRenderer::new();
    renderer.failing_meshes.insert(2);

    queue.begin_frame_commands();
    queue.send_command(draw(Translucency::Opaque, 1, 1, 0.0));
    queue.send_command(draw(Translucency::Opaque, 1, 2, 0.0));
    queue.end_frame_commands();
    let stats = queue.render_frame(&mut renderer).unwrap();

    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.skipped_draw_calls, 1);
}

#[test]
fn test_clear_and_dispatch_are_forwarded() {
    let mut queue = RenderQueue::new();
    let mut renderer = MockRenderer::new();
    renderer.failing_shaders.insert(9);

    queue.begin_frame_commands();
    queue.send_command(Key::new(0, 0).sequence(2).clear(ClearFlags::COLOR, [1, 2, 3, 4], 1.0, 0));
    queue.send_command(Key::new(0, 0).sequence(3).dispatch(8, [4, 4, 1], None));
    queue.send_command(Key::new(0, 0).sequence(4).dispatch(9, [1, 1, 1], None));
    queue.end_frame_commands();
    let stats = queue.render_frame(&mut renderer).unwrap();

    assert_eq!(stats.dispatches, 1);
    assert_eq!(stats.skipped_dispatches, 1);
    assert_eq!(
        renderer.calls[1],
        MockCall::Clear { flags: ClearFlags::COLOR, color: [1, 2, 3, 4], depth: 1.0, stencil: 0 }
    );
    assert_eq!(renderer.calls[2], MockCall::Dispatch { shader: 8, groups: [4, 4, 1], params: None });
}

#[test]
#[should_panic(expected = "undecodable key")]
fn test_malformed_key_is_fatal() {
    let mut queue = RenderQueue::new();
    let mut renderer = MockRenderer::new();
    let mut bytes = [0u8; KEY_SIZE];
    bytes[2] = 200;

    queue.begin_frame_commands();
    queue.send_command(KeyCode::from_bytes(bytes));
    queue.end_frame_commands();
    queue.render_frame(&mut renderer);
}

// ============================================================================
// Params blocks
// ============================================================================

#[test]
fn test_params_block_reaches_backend_and_is_released() {
    let mut queue = RenderQueue::new();
    let mut renderer = MockRenderer::new();

    queue.begin_frame_commands();
    let (id, block) = queue.allocate_params_block();
    block.set_mat4("u_Model", Mat4::IDENTITY);
    queue.send_command(Key::new(0, 0).draw_call(DrawCall::new(Translucency::Opaque, 1, 1).params(id)));
    queue.end_frame_commands();

    assert_eq!(queue.live_params_blocks(), 1);
    assert!(queue.params_block(id).is_some());

    queue.render_frame(&mut renderer);

    assert_eq!(queue.live_params_blocks(), 0);
    assert!(queue.params_block(id).is_none());
    assert_eq!(
        renderer.draws()[0],
        &MockCall::DrawMesh {
            mesh: 1,
            sub_mesh: 0,
            params: Some(vec![("u_Model".to_string(), ParamValue::Mat4(Mat4::IDENTITY))]),
        }
    );
}

#[test]
fn test_params_block_freed_even_when_draw_skipped() {
    let mut queue = RenderQueue::new();
    let mut renderer = MockRenderer::new();
    renderer.failing_materials.insert(1);

    queue.begin_frame_commands();
    let (id, _) = queue.allocate_params_block();
    queue.send_command(Key::new(0, 0).draw_call(DrawCall::new(Translucency::Opaque, 1, 1).params(id)));
    queue.end_frame_commands();
    queue.render_frame(&mut renderer);

    assert_eq!(queue.live_params_blocks(), 0);
}

#[test]
fn test_params_ids_are_recycled_across_frames() {
    let mut queue = RenderQueue::new();
    let mut renderer = MockRenderer::new();

    for _ in 0..10 {
        queue.begin_frame_commands();
        for mesh in 0..16u16 {
            let (id, block) = queue.allocate_params_block();
            assert!(block.is_empty(), "recycled block must come back empty");
            block.set_float("u_Depth", 0.5);
            assert!(id < 16);
            queue.send_command(Key::new(0, 0).draw_call(DrawCall::new(Translucency::Opaque, 0, mesh).params(id)));
        }
        queue.end_frame_commands();
        queue.render_frame(&mut renderer);
    }

    assert_eq!(queue.live_params_blocks(), 0);
}

// ============================================================================
// Multiple pending frames
// ============================================================================

#[test]
fn test_pending_frames_are_consumed_oldest_first() {
    let mut queue = RenderQueue::new();

    queue.begin_frame_commands();
    queue.send_command(draw(Translucency::Opaque, 0, 1, 0.0));
    queue.end_frame_commands();

    queue.begin_frame_commands();
    queue.send_command(draw(Translucency::Opaque, 0, 2, 0.0));
    queue.send_command(draw(Translucency::Opaque, 0, 3, 0.0));
    queue.end_frame_commands();

    assert_eq!(queue.pending_frames(), 2);
    assert_eq!(queue.command_count(), 3);

    let mut first = MockRenderer::new();
    queue.render_frame(&mut first);
    assert_eq!(drawn_meshes(&first), vec![1]);
    assert_eq!(queue.pending_frames(), 1);
    assert_eq!(queue.command_count(), 2);

    let mut second = MockRenderer::new();
    let stats = queue.render_frame(&mut second).unwrap();
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(drawn_meshes(&second), vec![2, 3]);
    assert_eq!(queue.command_count(), 0);
}

#[test]
fn test_clear_drops_everything() {
    let mut queue = RenderQueue::new();
    queue.begin_frame_commands();
    queue.allocate_params_block();
    queue.send_command(Key::new(0, 0));
    queue.end_frame_commands();
    queue.begin_frame_commands();

    queue.clear();

    assert_eq!(queue.pending_frames(), 0);
    assert_eq!(queue.command_count(), 0);
    assert_eq!(queue.live_params_blocks(), 0);
    assert!(!queue.is_recording());
}
