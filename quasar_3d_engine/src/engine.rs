/// Quasar3D Engine - per-frame context and global logging
///
/// An `Engine` owns the transform hierarchy, the mesh renderers and the
/// render queue, and drives them once per frame with `render_tick`. Several
/// engines may coexist; nothing about them is global.
///
/// Logging is the only process-wide state: one swappable logger behind a
/// RwLock plus a severity threshold, used by the `engine_*!` macros.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::render::{FrameStats, RenderQueue, Renderer};
use crate::scene::{Drawer, ForwardDrawer, RenderersManager};
use crate::transform::TransformsManager;
use crate::{engine_info, engine_trace};

const SOURCE: &str = "quasar3d::Engine";

// ===== GLOBAL LOGGING STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Entries below this severity are dropped before reaching the logger
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogSeverity::Info as u8);

// ===== ENGINE =====

/// Per-frame engine context
///
/// # Example
///
/// ```no_run
/// use quasar_3d_engine::quasar3d::{Engine, EngineConfig, Camera, Viewport, Renderer};
/// use quasar_3d_engine::glam::Mat4;
///
/// fn frame(engine: &mut Engine, backend: &mut dyn Renderer) {
///     let camera = Camera::new(Mat4::IDENTITY, Mat4::IDENTITY, 0.1, 100.0, Viewport::new(0, 0, 800, 600));
///     if let Some(stats) = engine.render_tick(&[camera], backend) {
///         println!("{} draws", stats.draw_calls);
///     }
/// }
///
/// let mut engine = Engine::new(EngineConfig::default());
/// ```
pub struct Engine {
    config: EngineConfig,
    transforms: TransformsManager,
    renderers: RenderersManager,
    render_queue: RenderQueue,
    drawer: Box<dyn Drawer>,
    frame_index: u64,
}

impl Engine {
    /// Create an engine using the forward drawer
    pub fn new(config: EngineConfig) -> Self {
        let engine = Self {
            transforms: TransformsManager::with_capacity(config.transforms_capacity),
            renderers: RenderersManager::with_config(&config.octree),
            render_queue: RenderQueue::with_config(config.render_queue.clone()),
            drawer: Box::new(ForwardDrawer::new()),
            frame_index: 0,
            config,
        };
        engine_info!(SOURCE, "Engine created (octree max depth {})", engine.config.octree.max_depth);
        engine
    }

    /// Replace the drawing strategy
    pub fn set_drawer<D: Drawer + 'static>(&mut self, drawer: D) {
        self.drawer = Box::new(drawer);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn transforms(&self) -> &TransformsManager {
        &self.transforms
    }

    pub fn transforms_mut(&mut self) -> &mut TransformsManager {
        &mut self.transforms
    }

    pub fn renderers(&self) -> &RenderersManager {
        &self.renderers
    }

    pub fn renderers_mut(&mut self) -> &mut RenderersManager {
        &mut self.renderers
    }

    pub fn render_queue(&self) -> &RenderQueue {
        &self.render_queue
    }

    /// Direct queue access, e.g. for compute dispatches recorded between ticks
    pub fn render_queue_mut(&mut self) -> &mut RenderQueue {
        &mut self.render_queue
    }

    /// Number of completed `render_tick` calls
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Run one frame.
    ///
    /// 1. refresh renderer bounds and rebuild the octree
    /// 2. record every camera between `begin_frame_commands` / `end_frame_commands`
    /// 3. sort and replay into `renderer` (older pending frames first)
    /// 4. reset the transforms' changed flags
    ///
    /// Returns the stats of this tick's frame.
    ///
    /// # Panics
    ///
    /// If a frame is still being recorded on the queue.
    pub fn render_tick(&mut self, cameras: &[Camera], renderer: &mut dyn Renderer) -> Option<FrameStats> {
        let placed = self.renderers.update(&mut self.transforms);

        self.render_queue.begin_frame_commands();
        let mut draws = 0;
        for camera in cameras {
            draws += self.drawer.draw(camera, &mut self.renderers, &mut self.render_queue);
        }
        self.render_queue.end_frame_commands();

        let mut stats = None;
        while self.render_queue.pending_frames() > 0 {
            stats = self.render_queue.render_frame(renderer);
        }

        self.transforms.clear_changed();
        self.frame_index += 1;

        engine_trace!(
            SOURCE, "Frame {}: {} renderer(s) indexed, {} camera(s), {} draw(s) recorded",
            self.frame_index, placed, cameras.len(), draws
        );
        stats
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation (file logger, network logger, etc.)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use quasar_3d_engine::quasar3d::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Drop every entry less severe than `level` (default: Info)
    pub fn set_log_level(level: LogSeverity) {
        LOG_LEVEL.store(level as u8, Ordering::Relaxed);
    }

    pub fn log_level() -> LogSeverity {
        match LOG_LEVEL.load(Ordering::Relaxed) {
            0 => LogSeverity::Trace,
            1 => LogSeverity::Debug,
            2 => LogSeverity::Info,
            3 => LogSeverity::Warn,
            _ => LogSeverity::Error,
        }
    }

    fn is_enabled(severity: LogSeverity) -> bool {
        severity as u8 >= LOG_LEVEL.load(Ordering::Relaxed)
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if !Self::is_enabled(severity) {
            return;
        }
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by engine_error! macro to include source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if !Self::is_enabled(severity) {
            return;
        }
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
