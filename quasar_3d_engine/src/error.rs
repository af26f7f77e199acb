//! Error types for the Quasar3D engine
//!
//! Lookups that may legitimately miss return `Option`. Mutations on stale ids,
//! broken hierarchies and undecodable keys return these errors instead.

use std::fmt;

/// Result type for Quasar3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Quasar3D engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Handle does not reference a live pool object (never allocated or freed)
    InvalidHandle(String),

    /// Transform id is unknown to the TransformsManager
    InvalidTransform(String),

    /// Requested hierarchy change would break the tree (cycle, self-parenting)
    InvalidHierarchy(String),

    /// KeyCode bytes do not decode to a valid Key
    InvalidKey(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            Error::InvalidTransform(msg) => write!(f, "Invalid transform: {}", msg),
            Error::InvalidHierarchy(msg) => write!(f, "Invalid hierarchy: {}", msg),
            Error::InvalidKey(msg) => write!(f, "Invalid key: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Build an [`Error`] variant and log it at ERROR severity (with file:line).
///
/// # Example
///
/// ```ignore
/// let err = engine_err!("quasar3d::Pool", InvalidHandle, "handle {} is stale", id);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $variant:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::quasar3d::Error::$variant(message)
    }};
}

/// Log an error and return early with `Err(...)`.
///
/// # Example
///
/// ```ignore
/// engine_bail!("quasar3d::TransformsManager", InvalidTransform, "unknown id {:?}", id);
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $variant:ident, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $variant, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
