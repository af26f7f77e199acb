/// RenderQueue - per-frame command buffer.
///
/// Recording appends `KeyCode`s to one shared array between
/// `begin_frame_commands` and `end_frame_commands`. Each closed frame is a
/// `[start, end)` range; several may be pending. `render_frame` consumes the
/// oldest one: radix-sorts its range on the 14 sort bytes, replays it into a
/// [`Renderer`] and removes it.
///
/// Recording and replay both take `&mut self`, so they can never overlap.
/// Sharing a queue across threads needs an explicit `Arc<Mutex<RenderQueue>>`.

use std::collections::VecDeque;
use rdst::RadixSort;
use crate::config::RenderQueueConfig;
use crate::utils::SlotAllocator;
use crate::{engine_debug, engine_error, engine_trace, engine_warn};
use super::key::{Command, Key, KeyCode, KeyKind, ParamsBlockId, NO_PARAMS_BLOCK};
use super::material_params::MaterialParamsBlock;
use super::renderer::{FrameStats, Renderer};

const SOURCE: &str = "quasar3d::RenderQueue";

/// A closed, not yet replayed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    start: usize,
    end: usize,
}

pub struct RenderQueue {
    /// Shared append-only key storage for all pending frames
    commands: Vec<KeyCode>,
    /// Closed frames, oldest first
    frames: VecDeque<Frame>,
    /// Start of the frame being recorded
    recording: Option<usize>,
    /// Params block storage, indexed by `ParamsBlockId`
    params_blocks: Vec<MaterialParamsBlock>,
    params_allocator: SlotAllocator,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::with_config(RenderQueueConfig::default())
    }

    pub fn with_config(config: RenderQueueConfig) -> Self {
        let mut params_blocks = Vec::with_capacity(config.params_block_capacity);
        params_blocks.resize_with(config.params_block_capacity, MaterialParamsBlock::default);

        Self {
            commands: Vec::with_capacity(config.command_capacity),
            frames: VecDeque::new(),
            recording: None,
            params_blocks,
            // u16::MAX is reserved for "no params block"
            params_allocator: SlotAllocator::with_limit(NO_PARAMS_BLOCK as u32),
        }
    }

    // ===== RECORDING =====

    /// Open a new frame.
    ///
    /// # Panics
    ///
    /// If a frame is already being recorded.
    pub fn begin_frame_commands(&mut self) {
        assert!(
            self.recording.is_none(),
            "begin_frame_commands called while a frame is already being recorded"
        );
        self.recording = Some(self.commands.len());
    }

    /// Close the frame opened by [`begin_frame_commands`](Self::begin_frame_commands).
    ///
    /// # Panics
    ///
    /// If no frame is being recorded.
    pub fn end_frame_commands(&mut self) {
        let Some(start) = self.recording.take() else {
            panic!("end_frame_commands called without a matching begin_frame_commands");
        };
        let frame = Frame { start, end: self.commands.len() };
        engine_trace!(SOURCE, "closed frame with {} commands", frame.end - frame.start);
        self.frames.push_back(frame);
    }

    /// Append one command to the frame being recorded.
    ///
    /// # Panics
    ///
    /// If called outside `begin_frame_commands` / `end_frame_commands`.
    pub fn send_command(&mut self, key: impl Into<KeyCode>) {
        assert!(self.recording.is_some(), "send_command called outside of a recorded frame");
        self.commands.push(key.into());
    }

    /// Borrow a fresh, empty params block and its id.
    ///
    /// The id goes into the key that uses the block; the block is released
    /// during the replay of that key.
    ///
    /// # Panics
    ///
    /// If 65535 blocks are live at once.
    pub fn allocate_params_block(&mut self) -> (ParamsBlockId, &mut MaterialParamsBlock) {
        let Some(id) = self.params_allocator.alloc() else {
            engine_error!(SOURCE, "params block pool exhausted ({} live)", self.params_allocator.len());
            panic!("RenderQueue params block pool exhausted");
        };

        let index = id as usize;
        if index >= self.params_blocks.len() {
            self.params_blocks.resize_with(index + 1, MaterialParamsBlock::default);
        }

        (id as ParamsBlockId, &mut self.params_blocks[index])
    }

    // ===== REPLAY =====

    /// Sort and replay the oldest pending frame.
    ///
    /// Returns `None` (and does nothing) while a frame is being recorded or
    /// when no frame is pending.
    ///
    /// # Panics
    ///
    /// If a recorded key does not decode.
    pub fn render_frame(&mut self, renderer: &mut dyn Renderer) -> Option<FrameStats> {
        if self.recording.is_some() {
            engine_debug!(SOURCE, "render_frame skipped: a frame is still being recorded");
            return None;
        }
        let frame = self.frames.pop_front()?;

        self.commands[frame.start..frame.end].radix_sort_unstable();

        let mut stats = FrameStats::default();
        let mut bound_pass: Option<(u16, u8, bool)> = None;

        renderer.begin_frame();
        for index in frame.start..frame.end {
            let code = self.commands[index];
            let key = match Key::try_from(code) {
                Ok(key) => key,
                Err(err) => {
                    engine_error!(SOURCE, "cannot replay key #{} of frame: {}", index - frame.start, err);
                    panic!("RenderQueue: undecodable key {:?}", code);
                }
            };

            stats.commands += 1;
            match key.kind {
                KeyKind::Command { command, .. } => {
                    // Any state command may unbind the pass; rebind before the next draw
                    bound_pass = None;
                    self.replay_command(command, renderer, &mut stats);
                }
                KeyKind::DrawCall(draw) => {
                    let pass_ok = match bound_pass {
                        Some((material, pass, ok)) if material == draw.material && pass == draw.pass => ok,
                        _ => {
                            let ok = renderer.set_material_pass(draw.material, draw.pass);
                            bound_pass = Some((draw.material, draw.pass, ok));
                            ok
                        }
                    };

                    let drawn = pass_ok
                        && renderer.draw_mesh(draw.mesh, draw.sub_mesh, self.live_block(draw.params));
                    if drawn {
                        stats.draw_calls += 1;
                    } else {
                        stats.skipped_draw_calls += 1;
                        engine_warn!(
                            SOURCE, "skipped draw: material {} pass {} mesh {}.{}",
                            draw.material, draw.pass, draw.mesh, draw.sub_mesh
                        );
                    }
                    self.release_block(draw.params);
                }
            }
        }
        renderer.end_frame();

        // Remove the consumed range and shift the frames recorded after it
        let consumed = frame.end - frame.start;
        self.commands.drain(frame.start..frame.end);
        for pending in &mut self.frames {
            if pending.start >= frame.end {
                pending.start -= consumed;
                pending.end -= consumed;
            }
        }

        engine_trace!(SOURCE, "replayed frame: {:?}", stats);
        Some(stats)
    }

    fn replay_command(&mut self, command: Command, renderer: &mut dyn Renderer, stats: &mut FrameStats) {
        match command {
            Command::ResetRenderTarget => renderer.reset_render_target(),
            Command::SetRenderTarget(target) => renderer.set_render_target(target),
            Command::SetViewport(viewport) => renderer.set_viewport(viewport),
            Command::Clear { flags, color, depth, stencil } => {
                renderer.clear(flags, color, depth, stencil);
            }
            Command::Dispatch { shader, groups, params } => {
                if renderer.dispatch(shader, groups, self.live_block(params)) {
                    stats.dispatches += 1;
                } else {
                    stats.skipped_dispatches += 1;
                    engine_warn!(SOURCE, "skipped dispatch of shader {}", shader);
                }
                self.release_block(params);
            }
        }
    }

    fn live_block(&self, id: Option<ParamsBlockId>) -> Option<&MaterialParamsBlock> {
        let id = id? as u32;
        if self.params_allocator.is_live(id) {
            self.params_blocks.get(id as usize)
        } else {
            None
        }
    }

    fn release_block(&mut self, id: Option<ParamsBlockId>) {
        if let Some(id) = id {
            if self.params_allocator.free(id as u32) {
                self.params_blocks[id as usize].clear();
            }
        }
    }

    // ===== STATE =====

    /// Number of closed frames waiting for `render_frame`
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Keys stored across all pending and open frames
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn live_params_blocks(&self) -> usize {
        self.params_allocator.len() as usize
    }

    /// Read access to a live params block
    pub fn params_block(&self, id: ParamsBlockId) -> Option<&MaterialParamsBlock> {
        self.live_block(Some(id))
    }

    /// Drop every pending frame, the open frame and all live params blocks
    pub fn clear(&mut self) {
        self.commands.clear();
        self.frames.clear();
        self.recording = None;
        for id in 0..self.params_allocator.high_water_mark() {
            if self.params_allocator.free(id) {
                self.params_blocks[id as usize].clear();
            }
        }
    }
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "render_queue_tests.rs"]
mod tests;
