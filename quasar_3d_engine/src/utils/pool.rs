//! Pool - dense object storage addressed through stable handles.
//!
//! Objects live in one contiguous `Vec<T>` so iteration is cache-friendly.
//! A `Handle<T>` only stores a numeric id; the pool resolves it through an
//! id → slot hash index. Freeing swap-removes the slot (the array stays
//! dense) and patches the index entry of whichever object moved.
//!
//! Ids are handed out monotonically and never reissued, so a handle to a
//! freed object keeps resolving to `None` for the lifetime of the pool.
//! Every pool also stamps its handles with a process-unique tag; a handle
//! presented to a pool that did not issue it resolves to `None`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};
use rustc_hash::FxHashMap;

/// Next pool tag (0 is reserved for `Handle::NULL`)
static NEXT_POOL_TAG: AtomicU32 = AtomicU32::new(1);

// ===== HANDLE =====

/// Stable, non-owning reference to an object stored in a [`Pool<T>`].
///
/// Copyable and comparable regardless of `T`. Resolve it with
/// [`Pool::get`]; a stale handle resolves to `None`.
pub struct Handle<T> {
    pool: u32,
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Handle that never resolves (id 0 is never allocated)
    pub const NULL: Handle<T> = Handle { pool: 0, id: 0, _marker: PhantomData };

    fn new(pool: u32, id: u64) -> Self {
        Self { pool, id, _marker: PhantomData }
    }

    /// Numeric id of the referenced object
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether this is the null handle
    pub fn is_null(&self) -> bool {
        self.id == 0
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.pool == other.pool && self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pool.hash(state);
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}:{})", self.pool, self.id)
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::NULL
    }
}

// ===== POOL =====

/// Dense storage with O(1) allocate, free and handle lookup.
pub struct Pool<T> {
    /// Stamped on every handle this pool issues
    tag: u32,
    /// Live objects, densely packed
    items: Vec<T>,
    /// `ids[slot]` is the id of `items[slot]`
    ids: Vec<u64>,
    /// id → slot
    index: FxHashMap<u64, usize>,
    /// Next id to hand out (0 is reserved for `Handle::NULL`)
    next_id: u64,
}

impl<T> Pool<T> {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty pool with room for `capacity` objects
    pub fn with_capacity(capacity: usize) -> Self {
        let mut index = FxHashMap::default();
        index.reserve(capacity);
        Self {
            tag: NEXT_POOL_TAG.fetch_add(1, Ordering::Relaxed),
            items: Vec::with_capacity(capacity),
            ids: Vec::with_capacity(capacity),
            index,
            next_id: 1,
        }
    }

    /// Store `value` and return a fresh handle to it
    pub fn allocate(&mut self, value: T) -> Handle<T> {
        let id = self.next_id;
        self.next_id += 1;

        let slot = self.items.len();
        self.items.push(value);
        self.ids.push(id);
        self.index.insert(id, slot);

        Handle::new(self.tag, id)
    }

    /// Dense slot of `handle`, if it was issued here and is still live
    fn slot_of(&self, handle: Handle<T>) -> Option<usize> {
        if handle.pool != self.tag {
            return None;
        }
        self.index.get(&handle.id).copied()
    }

    /// Remove the object referenced by `handle` and return it.
    ///
    /// The last object is moved into the vacated slot. Returns `None` if
    /// the handle is stale or null.
    pub fn free(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.slot_of(handle)?;
        self.index.remove(&handle.id);

        let value = self.items.swap_remove(slot);
        self.ids.swap_remove(slot);

        if slot < self.ids.len() {
            self.index.insert(self.ids[slot], slot);
        }

        Some(value)
    }

    /// Resolve a handle
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slot_of(handle).map(|slot| &self.items[slot])
    }

    /// Resolve a handle mutably
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        match self.slot_of(handle) {
            Some(slot) => Some(&mut self.items[slot]),
            None => None,
        }
    }

    /// Whether `handle` references a live object
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.slot_of(handle).is_some()
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the pool holds no objects
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Handle of the object currently stored in dense slot `slot`
    pub fn handle_at(&self, slot: usize) -> Option<Handle<T>> {
        self.ids.get(slot).map(|&id| Handle::new(self.tag, id))
    }

    /// Live objects as a dense slice (slot order, not allocation order)
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterate over `(handle, object)` pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        let tag = self.tag;
        self.ids.iter().zip(self.items.iter())
            .map(move |(&id, item)| (Handle::new(tag, id), item))
    }

    /// Iterate mutably over `(handle, object)` pairs in slot order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> + '_ {
        let tag = self.tag;
        self.ids.iter().zip(self.items.iter_mut())
            .map(move |(&id, item)| (Handle::new(tag, id), item))
    }

    /// Drop every object. Outstanding handles all become stale.
    pub fn clear(&mut self) {
        self.items.clear();
        self.ids.clear();
        self.index.clear();
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
