/// Allocates and recycles dense `u32` indices below a fixed limit.
///
/// Used for short-lived storage whose indices travel inside fixed-width
/// fields (e.g. the 16-bit params block id of a render `Key`). Freed indices
/// are recycled LIFO, so a steady per-frame workload keeps reusing the same
/// low indices and the backing storage stops growing.
///
/// # Example
///
/// ```ignore
/// let mut alloc = SlotAllocator::with_limit(4);
/// let a = alloc.alloc().unwrap();  // 0
/// let b = alloc.alloc().unwrap();  // 1
/// alloc.free(a);                    // 0 is now available
/// let c = alloc.alloc().unwrap();  // 0 (recycled)
/// ```
pub struct SlotAllocator {
    free_list: Vec<u32>,
    live: Vec<bool>,
    limit: u32,
    len: u32,
}

impl SlotAllocator {
    /// Create an allocator handing out indices in `0..limit`
    pub fn with_limit(limit: u32) -> Self {
        Self {
            free_list: Vec::new(),
            live: Vec::new(),
            limit,
            len: 0,
        }
    }

    /// Allocate the next available index, `None` once `limit` indices are live
    pub fn alloc(&mut self) -> Option<u32> {
        let id = match self.free_list.pop() {
            Some(id) => id,
            None => {
                let id = self.live.len() as u32;
                if id >= self.limit {
                    return None;
                }
                self.live.push(false);
                id
            }
        };
        self.live[id as usize] = true;
        self.len += 1;
        Some(id)
    }

    /// Return an index to the pool for reuse
    ///
    /// Returns `false` (and changes nothing) if the index is not live.
    pub fn free(&mut self, id: u32) -> bool {
        match self.live.get_mut(id as usize) {
            Some(live) if *live => {
                *live = false;
                self.len -= 1;
                self.free_list.push(id);
                true
            }
            _ => false,
        }
    }

    /// Whether `id` is currently allocated
    pub fn is_live(&self, id: u32) -> bool {
        self.live.get(id as usize).copied().unwrap_or(false)
    }

    /// Highest index ever allocated + 1.
    ///
    /// Minimum capacity the backing storage must have.
    pub fn high_water_mark(&self) -> u32 {
        self.live.len() as u32
    }

    /// Maximum number of simultaneously live indices
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of currently allocated indices
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether no indices are currently allocated
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::with_limit(u32::MAX)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "slot_allocator_tests.rs"]
mod tests;
