//! Engine configuration
//!
//! Plain data structs with sensible defaults. Every field is public so a
//! caller can start from `Default` and override what it needs.

/// Default maximum octree depth (root = 0)
pub const DEFAULT_MAX_DEPTH: u32 = 8;

/// Render queue configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderQueueConfig {
    /// Initial capacity of the shared command array (keys)
    pub command_capacity: usize,
    /// Initial number of pre-allocated params blocks
    pub params_block_capacity: usize,
}

impl Default for RenderQueueConfig {
    fn default() -> Self {
        Self {
            command_capacity: 4096,
            params_block_capacity: 256,
        }
    }
}

/// Octree culling configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OctreeConfig {
    /// Deepest level a renderer may be placed at
    pub max_depth: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub render_queue: RenderQueueConfig,
    pub octree: OctreeConfig,
    /// Initial capacity of the transform hierarchy
    pub transforms_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            render_queue: RenderQueueConfig::default(),
            octree: OctreeConfig::default(),
            transforms_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.octree.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.render_queue.command_capacity > 0);
        assert!(config.transforms_capacity > 0);
    }

    #[test]
    fn test_struct_update_override() {
        let config = EngineConfig {
            octree: OctreeConfig { max_depth: 3 },
            ..Default::default()
        };
        assert_eq!(config.octree.max_depth, 3);
        assert_eq!(config.render_queue, RenderQueueConfig::default());
    }
}
