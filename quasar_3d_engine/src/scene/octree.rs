/// Octree - loose spatial index rebuilt from scratch every frame.
///
/// The root is the cube enclosing every item (center of the global bounds,
/// radius = largest half extent). An item is placed by its center, at the
/// depth where the node radius still covers its own radius:
/// `floor(log2(root_radius / item_radius))`, clamped to `[0, max_depth]`.
/// Children are only created on the way down.
///
/// Because an item picks its node by center, it may overhang the node cube
/// by up to one node radius. Queries therefore cull against loose bounds
/// (`center ± 2 * radius`).
///
/// Items of a node form an index-linked list inside one flat item array,
/// so a rebuild reuses both arrays without reallocating.

use glam::Vec3;
use crate::camera::{Frustum, FrustumTest};
use super::aabb::AABB;

/// Index of the root node in the flat node array.
const ROOT: usize = 0;

/// Missing child / end of an item list
const NONE: u32 = u32::MAX;

struct OctreeNode {
    center: Vec3,
    /// Half the cube side
    radius: f32,
    /// Child per octant (bit0 = X, bit1 = Y, bit2 = Z), `NONE` if absent
    children: [u32; 8],
    /// Head of this node's item list
    first_item: u32,
}

impl OctreeNode {
    fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius, children: [NONE; 8], first_item: NONE }
    }

    fn loose_bounds(&self) -> AABB {
        AABB::from_center_half_extents(self.center, Vec3::splat(self.radius * 2.0))
    }
}

struct OctreeItem<T> {
    value: T,
    bounds: AABB,
    next: u32,
}

/// Loose octree over `Copy` values (typically pool handles).
pub struct Octree<T: Copy> {
    nodes: Vec<OctreeNode>,
    items: Vec<OctreeItem<T>>,
    max_depth: u32,
    /// Deepest level reached by the last build
    depth: u32,
}

impl<T: Copy> Octree<T> {
    pub fn new(max_depth: u32) -> Self {
        Self {
            nodes: Vec::new(),
            items: Vec::new(),
            max_depth,
            depth: 0,
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Deepest level any item was placed at during the last build
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cube of the root node, `None` before the first non-empty build
    pub fn root_bounds(&self) -> Option<AABB> {
        self.nodes.get(ROOT).map(|root| {
            AABB::from_center_half_extents(root.center, Vec3::splat(root.radius))
        })
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.items.clear();
        self.depth = 0;
    }

    /// Replace the content of the tree with `entries`.
    ///
    /// Entries whose bounds are inverted or not finite are left out.
    /// Returns the number of entries placed.
    pub fn build(&mut self, entries: &[(T, AABB)]) -> usize {
        self.clear();

        let global = entries
            .iter()
            .filter(|(_, bounds)| Self::is_placeable(bounds))
            .fold(AABB::empty(), |acc, (_, bounds)| acc.union(bounds));
        if !global.is_valid() {
            return 0;
        }

        let root_radius = global.radius();
        self.nodes.push(OctreeNode::new(global.center(), root_radius));

        for (value, bounds) in entries {
            if !Self::is_placeable(bounds) {
                continue;
            }
            let target = Self::target_depth(root_radius, bounds.radius(), self.max_depth);
            let node_idx = self.descend(bounds.center(), target);

            let item_idx = self.items.len() as u32;
            let node = &mut self.nodes[node_idx];
            self.items.push(OctreeItem { value: *value, bounds: *bounds, next: node.first_item });
            node.first_item = item_idx;
        }

        self.items.len()
    }

    /// Append every value whose bounds (potentially) intersect the frustum.
    pub fn query(&self, frustum: &Frustum, results: &mut Vec<T>) {
        let Some(root) = self.nodes.get(ROOT) else {
            return;
        };

        let root_class = frustum.classify_aabb(&root.loose_bounds());
        self.query_recursive(ROOT, frustum, root_class, results);
    }

    fn is_placeable(bounds: &AABB) -> bool {
        bounds.is_valid() && bounds.min.is_finite() && bounds.max.is_finite()
    }

    /// Level at which a node radius still covers `size`.
    fn target_depth(root_radius: f32, size: f32, max_depth: u32) -> u32 {
        if size <= 0.0 {
            return max_depth;
        }
        let ratio = root_radius / size;
        if !(ratio > 1.0) {
            return 0;
        }
        (ratio.log2().floor() as u32).min(max_depth)
    }

    /// Bit layout: bit0 = X, bit1 = Y, bit2 = Z (0 = low, 1 = high).
    fn point_octant(center: Vec3, point: Vec3) -> usize {
        (point.x >= center.x) as usize
            | (((point.y >= center.y) as usize) << 1)
            | (((point.z >= center.z) as usize) << 2)
    }

    /// Walk from the root toward `point`, creating missing children.
    fn descend(&mut self, point: Vec3, target_depth: u32) -> usize {
        let mut node_idx = ROOT;

        for depth in 1..=target_depth {
            let node = &self.nodes[node_idx];
            let octant = Self::point_octant(node.center, point);
            let child = node.children[octant];

            node_idx = if child == NONE {
                let half = node.radius * 0.5;
                let offset = Vec3::new(
                    if octant & 1 == 0 { -half } else { half },
                    if octant & 2 == 0 { -half } else { half },
                    if octant & 4 == 0 { -half } else { half },
                );
                let child_node = OctreeNode::new(node.center + offset, half);
                let child_idx = self.nodes.len();
                self.nodes[node_idx].children[octant] = child_idx as u32;
                self.nodes.push(child_node);
                child_idx
            } else {
                child as usize
            };

            self.depth = self.depth.max(depth);
        }

        node_idx
    }

    /// 3-way classification at each node:
    /// - `Outside` → skip entire subtree
    /// - `Inside` → collect all items from subtree without further testing
    /// - `Partial` → test items individually, recurse into children
    fn query_recursive(
        &self,
        node_idx: usize,
        frustum: &Frustum,
        classification: FrustumTest,
        results: &mut Vec<T>,
    ) {
        match classification {
            FrustumTest::Outside => {}

            FrustumTest::Inside => self.collect_all(node_idx, results),

            FrustumTest::Partial => {
                let node = &self.nodes[node_idx];

                let mut item_idx = node.first_item;
                while item_idx != NONE {
                    let item = &self.items[item_idx as usize];
                    if frustum.intersects_aabb(&item.bounds) {
                        results.push(item.value);
                    }
                    item_idx = item.next;
                }

                for &child in &node.children {
                    if child == NONE {
                        continue;
                    }
                    let child_idx = child as usize;
                    let child_class = frustum.classify_aabb(&self.nodes[child_idx].loose_bounds());
                    self.query_recursive(child_idx, frustum, child_class, results);
                }
            }
        }
    }

    /// Collect every item of a subtree (no frustum test).
    fn collect_all(&self, node_idx: usize, results: &mut Vec<T>) {
        let node = &self.nodes[node_idx];

        let mut item_idx = node.first_item;
        while item_idx != NONE {
            let item = &self.items[item_idx as usize];
            results.push(item.value);
            item_idx = item.next;
        }

        for &child in &node.children {
            if child != NONE {
                self.collect_all(child as usize, results);
            }
        }
    }
}
