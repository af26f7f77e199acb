//! Transform module - flattened scene-graph hierarchy and its component view.

mod transforms_manager;
mod transform;

pub use transforms_manager::{TransformsManager, TransformId, TransformFlags};
pub use transform::Transform;
