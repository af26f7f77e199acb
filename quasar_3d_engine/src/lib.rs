/*!
# Quasar 3D Engine

Core of the Quasar 3D real-time engine: a flattened scene-graph transform
system and a sorted, deferred render command queue.

## Architecture

- **TransformsManager**: depth-first ordered transform array with lazy,
  range-based dirty propagation
- **RenderQueue**: 16-byte sortable keys recorded per frame, radix sorted,
  then replayed against a backend
- **Renderer**: backend trait the queue replays into (any graphics API)
- **RenderersManager**: mesh renderers culled per camera through an octree
  rebuilt every tick
- **Engine**: per-frame context tying the above together

Everything is reachable through the [`quasar3d`] namespace module.
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod utils;
pub mod transform;
pub mod render;
pub mod camera;
pub mod scene;

// Main quasar3d namespace module
pub mod quasar3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine context
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::{EngineConfig, RenderQueueConfig, OctreeConfig, DEFAULT_MAX_DEPTH};

    // Backend trait and render types
    pub use crate::render::{
        Renderer, FrameStats, RenderQueue, Key, KeyCode, KeyKind, Command, DrawCall,
        Translucency, ClearFlags, Viewport, MaterialParamsBlock, ParamValue, ParamsBlockId,
    };

    // Camera types
    pub use crate::camera::{Camera, ClearSettings, Frustum, FrustumTest};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Utility sub-module
    pub mod utils {
        pub use crate::utils::*;
    }

    // Transform sub-module
    pub mod transform {
        pub use crate::transform::*;
    }

    // Render sub-module
    pub mod render {
        pub use crate::render::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
