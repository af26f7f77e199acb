//! Render module - sortable command keys, the per-frame command queue and
//! the backend trait it replays into.

mod key;
mod material_params;
mod render_queue;
mod renderer;

#[cfg(test)]
pub(crate) mod mock_renderer;

pub use key::{
    Key, KeyCode, KeyKind, Command, DrawCall, Translucency, ClearFlags, Viewport,
    ParamsBlockId, quantize_depth,
    KEY_SIZE, SORT_BYTES, NO_PARAMS_BLOCK,
};
pub use material_params::{MaterialParamsBlock, ParamValue};
pub use render_queue::RenderQueue;
pub use renderer::{Renderer, FrameStats};
