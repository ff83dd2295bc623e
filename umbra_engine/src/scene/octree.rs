/// Octree - dynamic spatial index for frustum culling.
///
/// Single-node placement: each item is stored in exactly one node, the
/// deepest node whose AABB fully contains the item. If the item straddles a
/// child boundary, it stays in the parent. Queries therefore never produce
/// duplicates.
///
/// Nodes live in a flat array. A leaf splits into 8 children once it holds
/// more than `max_items_per_node` items, unless the children would be
/// smaller than `min_node_size`. Nodes never merge back: the node count only
/// grows until `clear()` empties items (nodes are kept).
///
/// Items whose bounds leave the world region are kept in an overflow list
/// and tested individually on every query.

use rustc_hash::FxHashMap;
use glam::Vec3;
use crate::camera::{Frustum, FrustumTest};
use crate::{engine_debug, engine_warn};
use crate::error::{Error, Result};
use super::aabb::AABB;
use super::renderable::RenderableKey;
use super::scene_index::SceneIndex;

/// Index of the root node in the flat node array.
const ROOT: usize = 0;

/// Sentinel node index for items stored in the overflow list.
const OVERFLOW: usize = usize::MAX;

/// Smallest accepted `min_node_size`; non-positive or non-finite values fall back to it.
const MIN_NODE_SIZE_FLOOR: f32 = 1.0e-3;

/// Octree tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeConfig {
    /// A leaf splits once it holds more items than this
    pub max_items_per_node: usize,
    /// Children smaller than this (on their shortest axis) are never created
    pub min_node_size: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_items_per_node: 8,
            min_node_size: 1.0,
        }
    }
}

/// A single node in the octree.
struct OctreeNode {
    /// World-space AABB of this node
    aabb: AABB,
    /// Index of the first of 8 contiguous children (0 = leaf)
    first_child: usize,
    /// Items that fit this node but none of its children
    items: Vec<RenderableKey>,
}

impl OctreeNode {
    fn new(aabb: AABB) -> Self {
        Self { aabb, first_child: 0, items: Vec::new() }
    }

    fn is_leaf(&self) -> bool {
        self.first_child == 0
    }
}

/// Where an item lives and the bounds it was stored with.
#[derive(Debug, Clone, Copy)]
struct ItemLocation {
    node: usize,
    bounds: AABB,
}

/// Dynamic octree over a fixed world region.
pub struct Octree {
    /// Flat array of all nodes (root first, children in groups of 8)
    nodes: Vec<OctreeNode>,
    config: OctreeConfig,
    /// Reverse lookup: item → (node index or OVERFLOW, bounds).
    /// Gives O(1) remove and O(depth) move.
    locations: FxHashMap<RenderableKey, ItemLocation>,
    /// Items not contained by the world region
    overflow: Vec<RenderableKey>,
}

impl Octree {
    /// Create an empty octree (a single root leaf) over `world_bounds`.
    ///
    /// A `min_node_size` that is not a positive finite number is raised to
    /// a small floor so that splitting always terminates.
    pub fn new(world_bounds: AABB, mut config: OctreeConfig) -> Self {
        if !(config.min_node_size.is_finite() && config.min_node_size > 0.0) {
            engine_warn!(
                "umbra::Octree",
                "min_node_size {} is not positive, using {}", config.min_node_size, MIN_NODE_SIZE_FLOOR
            );
            config.min_node_size = MIN_NODE_SIZE_FLOOR;
        }
        Self {
            nodes: vec![OctreeNode::new(world_bounds)],
            config,
            locations: FxHashMap::default(),
            overflow: Vec::new(),
        }
    }

    // ===== MUTATION =====

    /// Insert an item with its world bounds.
    ///
    /// Fails with `Error::DuplicateItem` if the item is already present.
    pub fn add_item(&mut self, key: RenderableKey, bounds: AABB) -> Result<()> {
        if self.locations.contains_key(&key) {
            return Err(Error::DuplicateItem);
        }
        let target = self.find_target_node(&bounds);
        self.place(key, target, bounds);
        Ok(())
    }

    /// Remove an item. Returns `false` if it was not present.
    pub fn remove_item(&mut self, key: RenderableKey) -> bool {
        let Some(location) = self.locations.remove(&key) else {
            return false;
        };
        let items = if location.node == OVERFLOW {
            &mut self.overflow
        } else {
            &mut self.nodes[location.node].items
        };
        if let Some(pos) = items.iter().position(|&k| k == key) {
            items.swap_remove(pos);
        }
        true
    }

    /// Replace an item's bounds, re-bucketing it if its enclosing node
    /// changed. O(depth). Returns `false` if the item was not present.
    pub fn move_item(&mut self, key: RenderableKey, bounds: AABB) -> bool {
        let Some(current) = self.locations.get(&key).map(|location| location.node) else {
            return false;
        };

        let target = self.find_target_node(&bounds);
        if target == current {
            if let Some(location) = self.locations.get_mut(&key) {
                location.bounds = bounds;
            }
            return true;
        }

        self.remove_item(key);
        self.place(key, target, bounds);
        true
    }

    /// Remove all items. Nodes are kept.
    pub fn clear(&mut self) {
        for node in &mut self.nodes {
            node.items.clear();
        }
        self.overflow.clear();
        self.locations.clear();
    }

    // ===== QUERIES =====

    /// Append every item whose bounds are not disjoint from the frustum.
    pub fn get_contained_objects(&self, frustum: &Frustum, results: &mut Vec<RenderableKey>) {
        for &key in &self.overflow {
            if let Some(location) = self.locations.get(&key) {
                if frustum.intersects_aabb(&location.bounds) {
                    results.push(key);
                }
            }
        }

        let root_class = frustum.classify_aabb(&self.nodes[ROOT].aabb);
        self.query_frustum_recursive(ROOT, frustum, root_class, results);
    }

    /// Append every item whose bounds intersect `bounds`.
    pub fn get_objects_in_box(&self, bounds: &AABB, results: &mut Vec<RenderableKey>) {
        for &key in &self.overflow {
            if let Some(location) = self.locations.get(&key) {
                if location.bounds.intersects(bounds) {
                    results.push(key);
                }
            }
        }
        self.query_box_recursive(ROOT, bounds, results);
    }

    pub fn contains(&self, key: RenderableKey) -> bool {
        self.locations.contains_key(&key)
    }

    /// Bounds the item was last stored with.
    pub fn bounds_of(&self, key: RenderableKey) -> Option<AABB> {
        self.locations.get(&key).map(|location| location.bounds)
    }

    pub fn item_count(&self) -> usize {
        self.locations.len()
    }

    /// Number of allocated nodes (never decreases).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of items outside the world region.
    pub fn overflow_count(&self) -> usize {
        self.overflow.len()
    }

    /// Depth of the deepest node (root = 0).
    pub fn depth(&self) -> usize {
        self.depth_of(ROOT)
    }

    pub fn world_bounds(&self) -> &AABB {
        &self.nodes[ROOT].aabb
    }

    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    // ===== PLACEMENT =====

    /// Find the deepest existing node that fully contains `bounds`,
    /// or OVERFLOW if the world region does not.
    ///
    /// If both corners fall into the same octant, the item fits entirely
    /// in that child; otherwise it straddles a boundary and stays.
    fn find_target_node(&self, bounds: &AABB) -> usize {
        if !self.nodes[ROOT].aabb.contains(bounds) {
            return OVERFLOW;
        }

        let mut node_idx = ROOT;
        loop {
            let node = &self.nodes[node_idx];
            if node.is_leaf() {
                return node_idx;
            }

            let center = node.aabb.center();
            let min_oct = point_octant(&center, &bounds.min);
            let max_oct = point_octant(&center, &bounds.max);
            if min_oct != max_oct {
                return node_idx;
            }

            node_idx = node.first_child + min_oct as usize;
        }
    }

    fn place(&mut self, key: RenderableKey, node: usize, bounds: AABB) {
        self.locations.insert(key, ItemLocation { node, bounds });

        if node == OVERFLOW {
            engine_debug!(
                "umbra::Octree",
                "Item {:?} lies outside the world region, stored in overflow", key
            );
            self.overflow.push(key);
            return;
        }

        self.nodes[node].items.push(key);
        self.split_if_needed(node);
    }

    /// Split an over-full leaf into 8 children and push down every item
    /// that fits a single child. Children are split recursively.
    fn split_if_needed(&mut self, node_idx: usize) {
        let node = &self.nodes[node_idx];
        if !node.is_leaf() || node.items.len() <= self.config.max_items_per_node {
            return;
        }

        let parent_aabb = node.aabb;
        let child_size = parent_aabb.size().min_element() * 0.5;
        if !(child_size.is_finite() && child_size >= self.config.min_node_size) {
            return;
        }

        let center = parent_aabb.center();
        let first_child = self.nodes.len();
        for octant in 0..8u8 {
            self.nodes.push(OctreeNode::new(octant_aabb(&parent_aabb, &center, octant)));
        }
        self.nodes[node_idx].first_child = first_child;

        let items = std::mem::take(&mut self.nodes[node_idx].items);
        for key in items {
            let Some(location) = self.locations.get_mut(&key) else {
                continue;
            };
            let min_oct = point_octant(&center, &location.bounds.min);
            let max_oct = point_octant(&center, &location.bounds.max);

            if min_oct == max_oct {
                let child = first_child + min_oct as usize;
                location.node = child;
                self.nodes[child].items.push(key);
            } else {
                self.nodes[node_idx].items.push(key);
            }
        }

        for child in first_child..first_child + 8 {
            self.split_if_needed(child);
        }
    }

    // ===== TRAVERSAL =====

    /// 3-way classification at each node:
    /// - `Outside` → skip entire subtree
    /// - `Inside` → collect all items from subtree without further testing
    /// - `Partial` → test items individually, recurse into children
    fn query_frustum_recursive(
        &self,
        node_idx: usize,
        frustum: &Frustum,
        classification: FrustumTest,
        results: &mut Vec<RenderableKey>,
    ) {
        let node = &self.nodes[node_idx];

        match classification {
            FrustumTest::Outside => {}

            FrustumTest::Inside => {
                self.collect_all(node_idx, results);
            }

            FrustumTest::Partial => {
                // A node's region may be larger than its contents
                for &key in &node.items {
                    if let Some(location) = self.locations.get(&key) {
                        if frustum.intersects_aabb(&location.bounds) {
                            results.push(key);
                        }
                    }
                }

                if !node.is_leaf() {
                    for child_idx in node.first_child..node.first_child + 8 {
                        let child_class = frustum.classify_aabb(&self.nodes[child_idx].aabb);
                        self.query_frustum_recursive(child_idx, frustum, child_class, results);
                    }
                }
            }
        }
    }

    /// Collect all items from a node and its entire subtree (no test).
    fn collect_all(&self, node_idx: usize, results: &mut Vec<RenderableKey>) {
        let node = &self.nodes[node_idx];
        results.extend_from_slice(&node.items);

        if !node.is_leaf() {
            for child_idx in node.first_child..node.first_child + 8 {
                self.collect_all(child_idx, results);
            }
        }
    }

    fn query_box_recursive(&self, node_idx: usize, bounds: &AABB, results: &mut Vec<RenderableKey>) {
        let node = &self.nodes[node_idx];
        if !node.aabb.intersects(bounds) {
            return;
        }
        if bounds.contains(&node.aabb) {
            self.collect_all(node_idx, results);
            return;
        }

        for &key in &node.items {
            if let Some(location) = self.locations.get(&key) {
                if location.bounds.intersects(bounds) {
                    results.push(key);
                }
            }
        }

        if !node.is_leaf() {
            for child_idx in node.first_child..node.first_child + 8 {
                self.query_box_recursive(child_idx, bounds, results);
            }
        }
    }

    fn depth_of(&self, node_idx: usize) -> usize {
        let node = &self.nodes[node_idx];
        if node.is_leaf() {
            return 0;
        }
        (node.first_child..node.first_child + 8)
            .map(|child| self.depth_of(child))
            .max()
            .unwrap_or(0)
            + 1
    }
}

// ===== OCTANT HELPERS =====

/// Compute the AABB of a specific octant (0–7).
///
/// Octant bit layout: bit0 = X, bit1 = Y, bit2 = Z (0 = low, 1 = high).
fn octant_aabb(parent: &AABB, center: &Vec3, octant: u8) -> AABB {
    AABB {
        min: Vec3::new(
            if octant & 1 == 0 { parent.min.x } else { center.x },
            if octant & 2 == 0 { parent.min.y } else { center.y },
            if octant & 4 == 0 { parent.min.z } else { center.z },
        ),
        max: Vec3::new(
            if octant & 1 == 0 { center.x } else { parent.max.x },
            if octant & 2 == 0 { center.y } else { parent.max.y },
            if octant & 4 == 0 { center.z } else { parent.max.z },
        ),
    }
}

/// Octant of a point relative to a center, same bit layout as `octant_aabb`.
fn point_octant(center: &Vec3, point: &Vec3) -> u8 {
    ((point.x >= center.x) as u8)
        | (((point.y >= center.y) as u8) << 1)
        | (((point.z >= center.z) as u8) << 2)
}

// ===== SCENE INDEX TRAIT =====

impl SceneIndex for Octree {
    fn insert(&mut self, key: RenderableKey, world_aabb: &AABB) -> Result<()> {
        self.add_item(key, *world_aabb)
    }

    fn remove(&mut self, key: RenderableKey) -> bool {
        self.remove_item(key)
    }

    fn update(&mut self, key: RenderableKey, world_aabb: &AABB) -> bool {
        self.move_item(key, *world_aabb)
    }

    fn query_frustum(&self, frustum: &Frustum, results: &mut Vec<RenderableKey>) {
        self.get_contained_objects(frustum, results);
    }

    fn query_aabb(&self, bounds: &AABB, results: &mut Vec<RenderableKey>) {
        self.get_objects_in_box(bounds, results);
    }

    fn len(&self) -> usize {
        self.item_count()
    }

    fn clear(&mut self) {
        Octree::clear(self);
    }
}

#[cfg(test)]
#[path = "octree_tests.rs"]
mod tests;
