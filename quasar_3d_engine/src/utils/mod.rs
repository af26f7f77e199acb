//! Generic storage utilities: handle-addressed pools and index allocators.

mod pool;
mod slot_allocator;

pub use pool::{Handle, Pool};
pub use slot_allocator::SlotAllocator;
