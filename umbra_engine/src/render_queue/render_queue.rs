/// RenderQueue - per-pass visible list sorted by RenderOrderKey.
///
/// Rebuilt every frame: `clear()` drops all entries but keeps the
/// allocation, so a queue owned by a render pass stops allocating once it
/// has seen its largest frame.
///
/// Sorting is an LSD radix sort (rdst) over (key, insertion sequence):
/// the sequence occupies the low digits, so equal keys keep their insertion
/// order and the unstable radix sort behaves as a stable sort.

use glam::Vec3;
use rdst::{RadixKey, RadixSort};
use crate::scene::{RenderableKey, Scene};
use super::render_order_key::RenderOrderKey;

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    key: RenderOrderKey,
    sequence: u32,
    item: RenderableKey,
}

impl RadixKey for QueueEntry {
    /// 4 sequence bytes then 8 key bytes, least significant first
    const LEVELS: usize = 12;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        if level < 4 {
            (self.sequence >> (level * 8)) as u8
        } else {
            (self.key.bits() >> ((level - 4) * 8)) as u8
        }
    }
}

/// Sorted draw list for one render pass.
pub struct RenderQueue {
    entries: Vec<QueueEntry>,
    sorted: bool,
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            sorted: true,
        }
    }

    /// Remove every entry. Capacity is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.sorted = true;
    }

    /// Append one item with a precomputed key.
    pub fn push(&mut self, item: RenderableKey, key: RenderOrderKey) {
        let sequence = self.entries.len() as u32;
        self.entries.push(QueueEntry { key, sequence, item });
        self.sorted = false;
    }

    /// Append every item still registered in `scene`, keyed by its material
    /// and its distance from `viewer_position` quantized over `far_distance`.
    pub fn add_range(
        &mut self,
        scene: &Scene,
        items: &[RenderableKey],
        viewer_position: Vec3,
        far_distance: f32,
    ) {
        self.entries.reserve(items.len());
        for &item in items {
            if let Some(object) = scene.object(item) {
                self.push(item, object.render_order_key(viewer_position, far_distance));
            }
        }
    }

    /// Stable sort ascending by key.
    pub fn sort(&mut self) {
        if self.sorted {
            return;
        }
        self.entries.radix_sort_unstable();
        self.sorted = true;
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Items in queue order (ascending key once sorted).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = RenderableKey> + ExactSizeIterator + '_ {
        self.entries.iter().map(|entry| entry.item)
    }

    /// Items in reverse queue order: far to near within a material.
    ///
    /// This is the draw order of every pass, opaque included.
    pub fn iter_back_to_front(&self) -> impl Iterator<Item = RenderableKey> + '_ {
        self.iter().rev()
    }

    /// Items with their keys, in queue order.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = (RenderableKey, RenderOrderKey)> + '_ {
        self.entries.iter().map(|entry| (entry.item, entry.key))
    }
}

#[cfg(test)]
#[path = "render_queue_tests.rs"]
mod tests;
