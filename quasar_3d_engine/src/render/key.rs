/// Key / KeyCode - sortable binary encoding of one render command.
///
/// A `KeyCode` is 16 raw bytes. Comparing the first 14 bytes as unsigned
/// bytes yields the replay order, so a frame is ordered by a plain radix
/// sort without ever decoding. `Key` is the structured view used to build
/// and inspect commands; conversion in both directions is lossless.
///
/// Layout:
///
/// | byte(s) | field |
/// |---------|-------|
/// | 0       | camera depth |
/// | 1       | layer (bits 4-7), draw-call flag (bit 3), sequence or translucency (bits 0-2) |
/// | 2..14   | command or draw-call sort payload |
/// | 14..16  | params block id (little-endian, not sorted) |
///
/// Command payloads are little-endian; draw-call sort fields are big-endian
/// so byte order matches numeric order.

use std::fmt;
use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use rdst::RadixKey;
use crate::error::{Error, Result};
use crate::engine_err;

const SOURCE: &str = "quasar3d::Key";

/// Size of a `KeyCode` in bytes
pub const KEY_SIZE: usize = 16;

/// Number of leading bytes that participate in sorting
pub const SORT_BYTES: usize = 14;

/// Index of a params block in the `RenderQueue`
pub type ParamsBlockId = u16;

/// Encoded params block id meaning "none"
pub const NO_PARAMS_BLOCK: u16 = u16::MAX;

const DRAW_CALL_FLAG: u8 = 1 << 3;
const PARAMS_OFFSET: usize = 14;

const CMD_RESET_RENDER_TARGET: u8 = 0;
const CMD_SET_RENDER_TARGET: u8 = 1;
const CMD_SET_VIEWPORT: u8 = 2;
const CMD_CLEAR: u8 = 3;
const CMD_DISPATCH: u8 = 4;

// ===== KEYCODE =====

/// Fixed 16-byte sort key
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
pub struct KeyCode([u8; KEY_SIZE]);

impl KeyCode {
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// The bytes that define replay order
    pub fn sort_key(&self) -> &[u8] {
        &self.0[..SORT_BYTES]
    }

    pub fn is_draw_call(&self) -> bool {
        self.0[1] & DRAW_CALL_FLAG != 0
    }
}

impl fmt::Debug for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyCode(")?;
        for (i, byte) in self.0.iter().enumerate() {
            if i == SORT_BYTES {
                write!(f, "|")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

impl RadixKey for KeyCode {
    const LEVELS: usize = SORT_BYTES;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        // Level 0 is the least significant sort byte
        self.0[SORT_BYTES - 1 - level]
    }
}

// ===== COMMAND PAYLOAD TYPES =====

bitflags! {
    /// Buffers affected by a `Clear` command
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClearFlags: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Viewport rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }
}

/// Blend class of a draw call. Orders opaque work before blended work.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum Translucency {
    #[default]
    Opaque = 0,
    AlphaTest = 1,
    Transparent = 2,
    Additive = 3,
}

impl Translucency {
    /// Blended draws sort back-to-front
    pub fn is_blended(self) -> bool {
        matches!(self, Translucency::Transparent | Translucency::Additive)
    }

    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Translucency::Opaque),
            1 => Some(Translucency::AlphaTest),
            2 => Some(Translucency::Transparent),
            3 => Some(Translucency::Additive),
            _ => None,
        }
    }
}

/// State or compute command carried by a key
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Bind the default (swapchain) render target
    ResetRenderTarget,
    /// Bind an off-screen render target
    SetRenderTarget(u16),
    SetViewport(Viewport),
    Clear {
        flags: ClearFlags,
        color: [u8; 4],
        depth: f32,
        stencil: u8,
    },
    /// Compute dispatch
    Dispatch {
        shader: u16,
        groups: [u16; 3],
        params: Option<ParamsBlockId>,
    },
}

// ===== DRAW CALL =====

/// Quantize a normalized depth to 16 bits: `floor(clamp01(depth) * 65535)`
pub fn quantize_depth(depth: f32) -> u16 {
    let clamped = if depth.is_nan() { 0.0 } else { depth.clamp(0.0, 1.0) };
    (clamped * u16::MAX as f32).floor() as u16
}

/// One mesh draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DrawCall {
    pub translucency: Translucency,
    /// User override, sorts before material and depth
    pub sorting_order: u8,
    pub material: u16,
    /// Material pass, `0..16`
    pub pass: u8,
    /// Sub-mesh index, `0..16`
    pub sub_mesh: u8,
    pub mesh: u16,
    /// Quantized view depth (see [`quantize_depth`])
    pub depth: u16,
    pub params: Option<ParamsBlockId>,
}

impl DrawCall {
    pub fn new(translucency: Translucency, material: u16, mesh: u16) -> Self {
        Self {
            translucency,
            material,
            mesh,
            ..Default::default()
        }
    }

    pub fn sorting_order(mut self, order: u8) -> Self {
        self.sorting_order = order;
        self
    }

    pub fn pass(mut self, pass: u8) -> Self {
        self.pass = pass;
        self
    }

    pub fn sub_mesh(mut self, sub_mesh: u8) -> Self {
        self.sub_mesh = sub_mesh;
        self
    }

    /// Set the depth from a normalized `[0, 1]` value
    pub fn depth(mut self, depth: f32) -> Self {
        self.depth = quantize_depth(depth);
        self
    }

    pub fn params(mut self, params: ParamsBlockId) -> Self {
        self.params = Some(params);
        self
    }
}

// ===== KEY =====

/// Structured render key
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyKind {
    /// `sequence` (0..8) orders commands of the same camera and layer
    Command { sequence: u8, command: Command },
    DrawCall(DrawCall),
}

/// Decoded form of a [`KeyCode`].
///
/// Built with `Key::new(depth, layer)` followed by one of the command
/// builders or [`draw_call`](Key::draw_call).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Key {
    /// Camera ordering, lower renders first
    pub camera_depth: u8,
    /// Camera layer, `0..16`
    pub camera_layer: u8,
    pub kind: KeyKind,
}

impl Key {
    /// Key for the given camera slot, initially a `ResetRenderTarget` at sequence 0
    pub fn new(camera_depth: u8, camera_layer: u8) -> Self {
        debug_assert!(camera_layer < 16, "camera layer out of range: {}", camera_layer);
        Self {
            camera_depth,
            camera_layer,
            kind: KeyKind::Command {
                sequence: 0,
                command: Command::ResetRenderTarget,
            },
        }
    }

    /// Set the command sequence (ignored for draw calls)
    pub fn sequence(mut self, sequence: u8) -> Self {
        if let KeyKind::Command { sequence: seq, .. } = &mut self.kind {
            *seq = sequence;
        }
        self
    }

    pub fn reset_render_target(self) -> Self {
        self.command(Command::ResetRenderTarget)
    }

    pub fn set_render_target(self, render_target: u16) -> Self {
        self.command(Command::SetRenderTarget(render_target))
    }

    pub fn set_viewport(self, viewport: Viewport) -> Self {
        self.command(Command::SetViewport(viewport))
    }

    pub fn clear(self, flags: ClearFlags, color: [u8; 4], depth: f32, stencil: u8) -> Self {
        self.command(Command::Clear { flags, color, depth, stencil })
    }

    pub fn dispatch(self, shader: u16, groups: [u16; 3], params: Option<ParamsBlockId>) -> Self {
        self.command(Command::Dispatch { shader, groups, params })
    }

    pub fn draw_call(mut self, draw_call: DrawCall) -> Self {
        self.kind = KeyKind::DrawCall(draw_call);
        self
    }

    fn command(mut self, command: Command) -> Self {
        let sequence = match self.kind {
            KeyKind::Command { sequence, .. } => sequence,
            KeyKind::DrawCall(_) => 0,
        };
        self.kind = KeyKind::Command { sequence, command };
        self
    }

    pub fn is_draw_call(&self) -> bool {
        matches!(self.kind, KeyKind::DrawCall(_))
    }
}

// ===== ENCODE =====

impl From<Key> for KeyCode {
    fn from(key: Key) -> Self {
        let mut b = [0u8; KEY_SIZE];
        b[0] = key.camera_depth;
        let layer = (key.camera_layer & 0x0F) << 4;

        match key.kind {
            KeyKind::Command { sequence, command } => {
                debug_assert!(sequence < 8, "command sequence out of range: {}", sequence);
                b[1] = layer | (sequence & 0x07);
                encode_command(&mut b, command);
            }
            KeyKind::DrawCall(draw) => {
                debug_assert!(draw.pass < 16 && draw.sub_mesh < 16, "pass/sub-mesh out of range");
                b[1] = layer | DRAW_CALL_FLAG | draw.translucency as u8;
                b[2] = draw.sorting_order;
                let pass_sub_mesh = (draw.pass & 0x0F) << 4 | (draw.sub_mesh & 0x0F);

                if draw.translucency.is_blended() {
                    b[3..5].copy_from_slice(&(u16::MAX - draw.depth).to_be_bytes());
                    b[5..7].copy_from_slice(&draw.material.to_be_bytes());
                    b[7] = pass_sub_mesh;
                    b[8..10].copy_from_slice(&draw.mesh.to_be_bytes());
                } else {
                    b[3..5].copy_from_slice(&draw.material.to_be_bytes());
                    b[5] = pass_sub_mesh;
                    b[6..8].copy_from_slice(&draw.mesh.to_be_bytes());
                    b[8..10].copy_from_slice(&draw.depth.to_be_bytes());
                }
                write_params(&mut b, draw.params);
            }
        }

        KeyCode(b)
    }
}

fn encode_command(b: &mut [u8; KEY_SIZE], command: Command) {
    match command {
        Command::ResetRenderTarget => {
            b[2] = CMD_RESET_RENDER_TARGET;
        }
        Command::SetRenderTarget(id) => {
            b[2] = CMD_SET_RENDER_TARGET;
            b[3..5].copy_from_slice(&id.to_le_bytes());
        }
        Command::SetViewport(vp) => {
            b[2] = CMD_SET_VIEWPORT;
            b[3..5].copy_from_slice(&vp.x.to_le_bytes());
            b[5..7].copy_from_slice(&vp.y.to_le_bytes());
            b[7..9].copy_from_slice(&vp.width.to_le_bytes());
            b[9..11].copy_from_slice(&vp.height.to_le_bytes());
        }
        Command::Clear { flags, color, depth, stencil } => {
            b[2] = CMD_CLEAR;
            b[3] = flags.bits();
            b[4..8].copy_from_slice(&color);
            b[8..12].copy_from_slice(&depth.to_le_bytes());
            b[12] = stencil;
        }
        Command::Dispatch { shader, groups, params } => {
            b[2] = CMD_DISPATCH;
            b[3..5].copy_from_slice(&shader.to_le_bytes());
            b[5..7].copy_from_slice(&groups[0].to_le_bytes());
            b[7..9].copy_from_slice(&groups[1].to_le_bytes());
            b[9..11].copy_from_slice(&groups[2].to_le_bytes());
            write_params(b, params);
        }
    }
}

fn write_params(b: &mut [u8; KEY_SIZE], params: Option<ParamsBlockId>) {
    let id = params.unwrap_or(NO_PARAMS_BLOCK);
    b[PARAMS_OFFSET..].copy_from_slice(&id.to_le_bytes());
}

// ===== DECODE =====

impl TryFrom<KeyCode> for Key {
    type Error = Error;

    fn try_from(code: KeyCode) -> Result<Self> {
        let b = &code.0;
        let camera_depth = b[0];
        let camera_layer = b[1] >> 4;
        let low = b[1] & 0x07;

        let kind = if b[1] & DRAW_CALL_FLAG != 0 {
            KeyKind::DrawCall(decode_draw_call(&code, low)?)
        } else {
            KeyKind::Command { sequence: low, command: decode_command(&code)? }
        };

        Ok(Key { camera_depth, camera_layer, kind })
    }
}

fn decode_draw_call(code: &KeyCode, translucency_bits: u8) -> Result<DrawCall> {
    let b = &code.0;
    let translucency = Translucency::from_bits(translucency_bits).ok_or_else(|| {
        engine_err!(SOURCE, InvalidKey, "unknown translucency {} in {:?}", translucency_bits, code)
    })?;
    ensure_reserved_zero(code, 10, PARAMS_OFFSET)?;

    let (depth, material, pass_sub_mesh, mesh) = if translucency.is_blended() {
        (
            u16::MAX - u16::from_be_bytes([b[3], b[4]]),
            u16::from_be_bytes([b[5], b[6]]),
            b[7],
            u16::from_be_bytes([b[8], b[9]]),
        )
    } else {
        (
            u16::from_be_bytes([b[8], b[9]]),
            u16::from_be_bytes([b[3], b[4]]),
            b[5],
            u16::from_be_bytes([b[6], b[7]]),
        )
    };

    Ok(DrawCall {
        translucency,
        sorting_order: b[2],
        material,
        pass: pass_sub_mesh >> 4,
        sub_mesh: pass_sub_mesh & 0x0F,
        mesh,
        depth,
        params: read_params(code),
    })
}

fn decode_command(code: &KeyCode) -> Result<Command> {
    let b = &code.0;
    let le = |at: usize| u16::from_le_bytes([b[at], b[at + 1]]);

    let (command, payload_end) = match b[2] {
        CMD_RESET_RENDER_TARGET => (Command::ResetRenderTarget, 3),
        CMD_SET_RENDER_TARGET => (Command::SetRenderTarget(le(3)), 5),
        CMD_SET_VIEWPORT => (
            Command::SetViewport(Viewport::new(le(3), le(5), le(7), le(9))),
            11,
        ),
        CMD_CLEAR => {
            let flags = ClearFlags::from_bits(b[3]).ok_or_else(|| {
                engine_err!(SOURCE, InvalidKey, "unknown clear flags {:#04x} in {:?}", b[3], code)
            })?;
            let command = Command::Clear {
                flags,
                color: [b[4], b[5], b[6], b[7]],
                depth: f32::from_le_bytes([b[8], b[9], b[10], b[11]]),
                stencil: b[12],
            };
            (command, 13)
        }
        CMD_DISPATCH => {
            let command = Command::Dispatch {
                shader: le(3),
                groups: [le(5), le(7), le(9)],
                params: read_params(code),
            };
            ensure_reserved_zero(code, 11, PARAMS_OFFSET)?;
            return Ok(command);
        }
        other => {
            return Err(engine_err!(SOURCE, InvalidKey, "unknown command id {} in {:?}", other, code));
        }
    };

    ensure_reserved_zero(code, payload_end, KEY_SIZE)?;
    Ok(command)
}

fn read_params(code: &KeyCode) -> Option<ParamsBlockId> {
    let id = u16::from_le_bytes([code.0[PARAMS_OFFSET], code.0[PARAMS_OFFSET + 1]]);
    (id != NO_PARAMS_BLOCK).then_some(id)
}

fn ensure_reserved_zero(code: &KeyCode, start: usize, end: usize) -> Result<()> {
    if code.0[start..end].iter().any(|&byte| byte != 0) {
        return Err(engine_err!(
            SOURCE, InvalidKey,
            "non-zero reserved bytes {}..{} in {:?}", start, end, code
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
