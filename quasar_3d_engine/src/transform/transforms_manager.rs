/// TransformsManager - flattened scene-graph transform storage.
///
/// Every transform lives in one `Vec` kept in depth-first pre-order: a node's
/// subtree is exactly the `descendants_count` entries that follow it. World
/// matrices are resolved lazily; mutations only flag the affected contiguous
/// range as dirty, and the next `world_matrix` read sweeps the top-most dirty
/// subtree once, front to back.
///
/// Ids are `slotmap` keys mapped to their current array position, so lookups
/// stay O(1) while positions shift on insert, remove and reparent.

use glam::Affine3A;
use slotmap::{new_key_type, SlotMap};
use bitflags::bitflags;
use crate::error::Result;
use crate::{engine_bail, engine_err, engine_trace};

const SOURCE: &str = "quasar3d::TransformsManager";

new_key_type! {
    /// Stable identity of a transform registered in a [`TransformsManager`]
    pub struct TransformId;
}

bitflags! {
    /// Per-entry state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TransformFlags: u8 {
        /// World matrix is stale relative to local or parent world
        const DIRTY = 1 << 0;
        /// Local or world changed since the last `clear_changed`
        const HAS_CHANGED = 1 << 1;
    }
}

/// One node of the flattened hierarchy
#[derive(Debug, Clone)]
struct TransformEntry {
    id: TransformId,
    parent: Option<TransformId>,
    /// Number of entries right after this one that belong to its subtree
    descendants_count: usize,
    flags: TransformFlags,
    local: Affine3A,
    world: Affine3A,
}

/// Owner of all transform data.
///
/// Reads that may miss return `Option`/`bool`; mutations on unknown ids
/// return [`Error::InvalidTransform`](crate::error::Error::InvalidTransform).
pub struct TransformsManager {
    /// Pre-ordered entries
    entries: Vec<TransformEntry>,
    /// id → position in `entries`
    indices: SlotMap<TransformId, usize>,
    /// Reused buffer for subtree moves
    scratch: Vec<TransformEntry>,
}

impl TransformsManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty manager with room for `capacity` transforms
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            indices: SlotMap::with_capacity_and_key(capacity),
            scratch: Vec::new(),
        }
    }

    // ===== HIERARCHY MUTATION =====

    /// Register a new transform with the given world matrix.
    ///
    /// The local matrix is derived from the parent's current world matrix
    /// (identity for roots). The entry is inserted right after the parent's
    /// subtree, or at the end of the array for a root.
    pub fn register_transform(
        &mut self,
        world: Affine3A,
        parent: Option<TransformId>,
    ) -> Result<TransformId> {
        let (insert_pos, local) = match parent {
            Some(parent_id) => {
                let parent_pos = self.require(parent_id, "register_transform")?;
                self.resolve(parent_pos);
                let parent_world = self.entries[parent_pos].world;
                (self.subtree_end(parent_pos), parent_world.inverse() * world)
            }
            None => (self.entries.len(), world),
        };

        let id = self.indices.insert(insert_pos);
        self.entries.insert(insert_pos, TransformEntry {
            id,
            parent,
            descendants_count: 0,
            flags: TransformFlags::HAS_CHANGED,
            local,
            world,
        });

        self.grow_ancestors(parent, 1);
        self.fix_indices(insert_pos + 1);

        engine_trace!(SOURCE, "registered {:?} at {} (parent {:?})", id, insert_pos, parent);
        Ok(id)
    }

    /// Remove a transform.
    ///
    /// Its children are re-parented to its former parent and keep their
    /// world placement. The removed node's whole former subtree is flagged
    /// dirty.
    pub fn unregister_transform(&mut self, id: TransformId) -> Result<()> {
        let pos = self.require(id, "unregister_transform")?;
        let end = self.subtree_end(pos);
        let parent = self.entries[pos].parent;
        let removed_local = self.entries[pos].local;

        for entry in &mut self.entries[pos + 1..end] {
            if entry.parent == Some(id) {
                entry.parent = parent;
                entry.local = removed_local * entry.local;
            }
            entry.flags |= TransformFlags::DIRTY;
        }

        self.shrink_ancestors(parent, 1);
        self.entries.remove(pos);
        self.indices.remove(id);
        self.fix_indices(pos);

        engine_trace!(SOURCE, "unregistered {:?} (was at {})", id, pos);
        Ok(())
    }

    /// Move a transform (and its subtree) under a new parent, or make it a root.
    ///
    /// The moved node keeps its world placement. Reparenting to the current
    /// parent is a no-op. Parenting a node to itself or to one of its own
    /// descendants fails with `InvalidHierarchy`.
    pub fn set_parent(&mut self, id: TransformId, new_parent: Option<TransformId>) -> Result<()> {
        let pos = self.require(id, "set_parent")?;
        let old_parent = self.entries[pos].parent;

        if old_parent == new_parent {
            return Ok(());
        }

        if let Some(parent_id) = new_parent {
            let parent_pos = self.require(parent_id, "set_parent")?;
            if parent_id == id {
                engine_bail!(SOURCE, InvalidHierarchy, "cannot parent {:?} to itself", id);
            }
            if parent_pos > pos && parent_pos < self.subtree_end(pos) {
                engine_bail!(
                    SOURCE, InvalidHierarchy,
                    "cannot parent {:?} to its descendant {:?}", id, parent_id
                );
            }
        }

        self.resolve(pos);
        let world = self.entries[pos].world;
        let moved = self.entries[pos].descendants_count + 1;

        // Lift the subtree out
        self.scratch.clear();
        self.scratch.extend(self.entries.drain(pos..pos + moved));
        self.shrink_ancestors(old_parent, moved);
        self.fix_indices(pos);

        let (insert_pos, parent_world) = match new_parent {
            Some(parent_id) => {
                let parent_pos = self.indices[parent_id];
                self.resolve(parent_pos);
                (self.subtree_end(parent_pos), self.entries[parent_pos].world)
            }
            None => (self.entries.len(), Affine3A::IDENTITY),
        };

        let root = &mut self.scratch[0];
        root.parent = new_parent;
        root.local = parent_world.inverse() * world;
        for entry in &mut self.scratch {
            entry.flags |= TransformFlags::DIRTY | TransformFlags::HAS_CHANGED;
        }

        // Drop it back in as one block
        self.entries
            .splice(insert_pos..insert_pos, self.scratch.drain(..))
            .for_each(drop);
        self.grow_ancestors(new_parent, moved);
        self.fix_indices(insert_pos);

        engine_trace!(
            SOURCE, "moved {:?} ({} entries) from {:?} to {:?}",
            id, moved, old_parent, new_parent
        );
        Ok(())
    }

    // ===== MATRIX MUTATION =====

    /// Replace the local matrix; the entry and its subtree become dirty
    pub fn set_local_matrix(&mut self, id: TransformId, local: Affine3A) -> Result<()> {
        let pos = self.require(id, "set_local_matrix")?;
        self.entries[pos].local = local;
        let end = self.subtree_end(pos);
        self.mark_range(pos, end);
        Ok(())
    }

    /// Replace the world matrix.
    ///
    /// The local matrix is derived from the parent's resolved world. The
    /// entry itself stays clean; its descendants become dirty.
    pub fn set_world_matrix(&mut self, id: TransformId, world: Affine3A) -> Result<()> {
        let pos = self.require(id, "set_world_matrix")?;

        let parent_world = match self.entries[pos].parent {
            Some(parent_id) => {
                let parent_pos = self.indices[parent_id];
                self.resolve(parent_pos);
                self.entries[parent_pos].world
            }
            None => Affine3A::IDENTITY,
        };

        let entry = &mut self.entries[pos];
        entry.local = parent_world.inverse() * world;
        entry.world = world;
        entry.flags.remove(TransformFlags::DIRTY);
        entry.flags.insert(TransformFlags::HAS_CHANGED);

        let end = self.subtree_end(pos);
        self.mark_range(pos + 1, end);
        Ok(())
    }

    // ===== QUERIES =====

    /// Resolved world matrix (may trigger a dirty sweep)
    pub fn world_matrix(&mut self, id: TransformId) -> Option<Affine3A> {
        let pos = self.position(id)?;
        self.resolve(pos);
        Some(self.entries[pos].world)
    }

    /// Local matrix relative to the parent
    pub fn local_matrix(&self, id: TransformId) -> Option<Affine3A> {
        self.position(id).map(|pos| self.entries[pos].local)
    }

    /// Parent of `id`, `None` for roots and unknown ids
    pub fn parent(&self, id: TransformId) -> Option<TransformId> {
        self.position(id).and_then(|pos| self.entries[pos].parent)
    }

    /// Direct children of `id`, in hierarchy order
    pub fn children(&self, id: TransformId) -> Vec<TransformId> {
        let Some(pos) = self.position(id) else {
            return Vec::new();
        };

        let end = self.subtree_end(pos);
        let mut children = Vec::new();
        let mut cursor = pos + 1;
        while cursor < end {
            children.push(self.entries[cursor].id);
            cursor = self.subtree_end(cursor);
        }
        children
    }

    /// All descendants of `id`, in pre-order
    pub fn descendants(&self, id: TransformId) -> Vec<TransformId> {
        match self.position(id) {
            Some(pos) => self.entries[pos + 1..self.subtree_end(pos)]
                .iter()
                .map(|entry| entry.id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Whether the world matrix of `id` is stale
    pub fn is_dirty(&self, id: TransformId) -> bool {
        self.flags(id).contains(TransformFlags::DIRTY)
    }

    /// Whether `id` changed since the last [`clear_changed`](Self::clear_changed)
    pub fn has_changed(&self, id: TransformId) -> bool {
        self.flags(id).contains(TransformFlags::HAS_CHANGED)
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: TransformId) -> bool {
        self.indices.contains_key(id)
    }

    /// Number of registered transforms
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no transforms are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of transforms without a parent
    pub fn root_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.parent.is_none()).count()
    }

    // ===== FRAME HOOKS =====

    /// Resolve every dirty world matrix in one linear pass
    pub fn resolve_all(&mut self) {
        let mut cached_parent: Option<(TransformId, Affine3A)> = None;
        for pos in 0..self.entries.len() {
            self.resolve_entry(pos, &mut cached_parent);
        }
    }

    /// Reset every `HAS_CHANGED` latch (end of frame)
    pub fn clear_changed(&mut self) {
        for entry in &mut self.entries {
            entry.flags.remove(TransformFlags::HAS_CHANGED);
        }
    }

    // ===== INTERNALS =====

    fn position(&self, id: TransformId) -> Option<usize> {
        self.indices.get(id).copied()
    }

    fn require(&self, id: TransformId, operation: &str) -> Result<usize> {
        self.position(id).ok_or_else(|| {
            engine_err!(SOURCE, InvalidTransform, "{}: unknown transform {:?}", operation, id)
        })
    }

    fn flags(&self, id: TransformId) -> TransformFlags {
        self.position(id)
            .map(|pos| self.entries[pos].flags)
            .unwrap_or_default()
    }

    /// One past the last entry of the subtree rooted at `pos`
    fn subtree_end(&self, pos: usize) -> usize {
        pos + 1 + self.entries[pos].descendants_count
    }

    fn mark_range(&mut self, start: usize, end: usize) {
        for entry in &mut self.entries[start..end] {
            entry.flags |= TransformFlags::DIRTY | TransformFlags::HAS_CHANGED;
        }
    }

    /// Re-sync the position table for every entry from `start` onward
    fn fix_indices(&mut self, start: usize) {
        for pos in start..self.entries.len() {
            self.indices[self.entries[pos].id] = pos;
        }
    }

    fn grow_ancestors(&mut self, mut ancestor: Option<TransformId>, amount: usize) {
        while let Some(id) = ancestor {
            let entry = &mut self.entries[self.indices[id]];
            entry.descendants_count += amount;
            ancestor = entry.parent;
        }
    }

    fn shrink_ancestors(&mut self, mut ancestor: Option<TransformId>, amount: usize) {
        while let Some(id) = ancestor {
            let entry = &mut self.entries[self.indices[id]];
            entry.descendants_count -= amount;
            ancestor = entry.parent;
        }
    }

    /// Bring the world matrix at `pos` up to date.
    ///
    /// Climbs to the top-most dirty ancestor, then sweeps its subtree once.
    fn resolve(&mut self, pos: usize) {
        if !self.entries[pos].flags.contains(TransformFlags::DIRTY) {
            return;
        }

        let mut top = pos;
        while let Some(parent_id) = self.entries[top].parent {
            let parent_pos = self.indices[parent_id];
            if !self.entries[parent_pos].flags.contains(TransformFlags::DIRTY) {
                break;
            }
            top = parent_pos;
        }

        let end = self.subtree_end(top);
        let mut cached_parent: Option<(TransformId, Affine3A)> = None;
        for cursor in top..end {
            self.resolve_entry(cursor, &mut cached_parent);
        }
    }

    /// Recompute one entry whose parent (if any) is already resolved
    fn resolve_entry(&mut self, pos: usize, cached_parent: &mut Option<(TransformId, Affine3A)>) {
        if !self.entries[pos].flags.contains(TransformFlags::DIRTY) {
            return;
        }

        let parent_world = match self.entries[pos].parent {
            None => Affine3A::IDENTITY,
            Some(parent_id) => match *cached_parent {
                Some((cached_id, world)) if cached_id == parent_id => world,
                _ => {
                    let world = self.entries[self.indices[parent_id]].world;
                    *cached_parent = Some((parent_id, world));
                    world
                }
            },
        };

        let entry = &mut self.entries[pos];
        entry.world = parent_world * entry.local;
        entry.flags.remove(TransformFlags::DIRTY);
    }
}

impl Default for TransformsManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "transforms_manager_tests.rs"]
mod tests;
