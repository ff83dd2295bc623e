/// Scene - the set of renderable and updateable objects.
///
/// Renderables are split into two disjoint groups:
/// - culled renderables, stored in the spatial index by bounding box
/// - free renderables, always considered visible (overlays, particles)
///
/// An object is in exactly one group, or in neither while `should_render()`
/// is false or, for culled objects, before its first bounding box.
///
/// Objects push their changes through their `ChangeSubscription`; the scene
/// pulls the queued events in `process_notifications` instead of polling
/// bounds every frame.

use std::sync::Arc;
use crossbeam_channel::{Receiver, Sender};
use glam::Vec3;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;
use crate::camera::Frustum;
use crate::error::Result;
use crate::graphics_device::GraphicsDevice;
use crate::{engine_error, engine_trace, engine_warn};
use super::aabb::AABB;
use super::octree::{Octree, OctreeConfig};
use super::renderable::{
    identity_of, ChangeNotifier, CullRenderable, Renderable, RenderableKey,
    SceneEvent, SceneObject, Updateable,
};
use super::scene_index::SceneIndex;

/// Scene construction parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConfig {
    /// Region covered by the spatial index
    pub world_bounds: AABB,
    pub octree: OctreeConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            world_bounds: AABB::new(Vec3::splat(-1000.0), Vec3::splat(1000.0)),
            octree: OctreeConfig::default(),
        }
    }
}

/// Where a registered object currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// In the spatial index (culled renderable with bounds)
    Indexed,
    /// In the always-visible set
    Free,
    /// Registered but not visible (should_render is false, or no bounds yet)
    Detached,
}

struct SceneEntry {
    object: SceneObject,
    placement: Placement,
}

/// A renderable scene.
///
/// Not internally synchronized: share it behind a lock and do not mutate it
/// while a frame is in flight.
pub struct Scene {
    /// Registered renderables by stable key
    entries: SlotMap<RenderableKey, SceneEntry>,
    /// Reference identity → key, for double-add / double-remove detection
    identities: FxHashMap<usize, RenderableKey>,
    /// Spatial index for culled renderables
    index: Box<dyn SceneIndex>,
    /// Always-visible renderables, in insertion order
    free_renderables: Vec<RenderableKey>,
    updateables: Vec<Arc<dyn Updateable>>,
    updateable_identities: FxHashSet<usize>,
    /// Change notifications sent by subscribed objects
    events_tx: Sender<SceneEvent>,
    events_rx: Receiver<SceneEvent>,
}

impl Scene {
    /// Create an empty scene indexed by an octree.
    pub fn new(config: SceneConfig) -> Self {
        Self::with_index(Box::new(Octree::new(config.world_bounds, config.octree)))
    }

    /// Create an empty scene over a caller-provided spatial index.
    pub fn with_index(index: Box<dyn SceneIndex>) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        Self {
            entries: SlotMap::with_key(),
            identities: FxHashMap::default(),
            index,
            free_renderables: Vec::new(),
            updateables: Vec::new(),
            updateable_identities: FxHashSet::default(),
            events_tx,
            events_rx,
        }
    }

    // ===== REGISTRATION =====

    /// Register culled renderables. Already registered objects are skipped.
    ///
    /// Returns the key of every given object (existing key for repeats).
    pub fn add_cull_renderables(&mut self, items: &[Arc<dyn CullRenderable>]) -> Vec<RenderableKey> {
        items
            .iter()
            .map(|item| self.register(SceneObject::Cull(Arc::clone(item))))
            .collect()
    }

    /// Unregister culled renderables. Unknown objects and objects
    /// registered as free are skipped.
    pub fn remove_cull_renderables(&mut self, items: &[Arc<dyn CullRenderable>]) {
        for item in items {
            self.unregister(identity_of(item), true);
        }
    }

    /// Register always-visible renderables. Already registered objects are skipped.
    pub fn add_free_renderables(&mut self, items: &[Arc<dyn Renderable>]) -> Vec<RenderableKey> {
        items
            .iter()
            .map(|item| self.register(SceneObject::Free(Arc::clone(item))))
            .collect()
    }

    /// Unregister always-visible renderables. Unknown objects and objects
    /// registered as culled are skipped.
    pub fn remove_free_renderables(&mut self, items: &[Arc<dyn Renderable>]) {
        for item in items {
            self.unregister(identity_of(item), false);
        }
    }

    /// Register updateables. Duplicate registration is a no-op.
    pub fn add_updateables(&mut self, items: &[Arc<dyn Updateable>]) {
        for item in items {
            if self.updateable_identities.insert(identity_of(item)) {
                self.updateables.push(Arc::clone(item));
            }
        }
    }

    /// Unregister updateables. Unknown objects are skipped.
    pub fn remove_updateables(&mut self, items: &[Arc<dyn Updateable>]) {
        for item in items {
            let identity = identity_of(item);
            if self.updateable_identities.remove(&identity) {
                self.updateables.retain(|u| identity_of(u) != identity);
            }
        }
    }

    /// Unregister everything.
    pub fn clear(&mut self) {
        for entry in self.entries.values() {
            entry.object.change_subscription().detach(&self.events_tx);
        }
        self.entries.clear();
        self.identities.clear();
        self.index.clear();
        self.free_renderables.clear();
        self.updateables.clear();
        self.updateable_identities.clear();
        while self.events_rx.try_recv().is_ok() {}
    }

    // ===== PER-FRAME =====

    /// Tick every updateable.
    pub fn update(&self, delta_seconds: f32) {
        for updateable in &self.updateables {
            updateable.update(delta_seconds);
        }
    }

    /// Apply every queued change notification. Returns the number handled.
    ///
    /// Events for objects removed since they were sent are ignored.
    pub fn process_notifications(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if !self.entries.contains_key(event.key) {
                engine_trace!(
                    "umbra::Scene",
                    "Ignoring {:?} for unregistered object {:?}", event.kind, event.key
                );
                continue;
            }
            // Both kinds re-read bounds and flag; placement follows from them
            self.sync_placement(event.key);
            handled += 1;
        }
        handled
    }

    /// Append every potentially visible renderable to `results`: culled
    /// objects intersecting `frustum`, then the whole free set.
    ///
    /// Objects whose `should_render()` already reads false are skipped even
    /// if their notification has not been processed yet.
    pub fn get_contained_renderables(&self, frustum: &Frustum, results: &mut Vec<RenderableKey>) {
        let start = results.len();
        self.index.query_frustum(frustum, results);
        self.retain_renderable(results, start);

        results.extend(
            self.free_renderables
                .iter()
                .copied()
                .filter(|&key| self.is_renderable(key)),
        );
    }

    /// Culled renderables whose bounds intersect `bounds`.
    pub fn get_renderables_in_box(&self, bounds: &AABB, results: &mut Vec<RenderableKey>) {
        let start = results.len();
        self.index.query_aabb(bounds, results);
        self.retain_renderable(results, start);
    }

    // ===== DEVICE RESOURCES =====

    /// Create device resources for every registered renderable.
    pub fn create_all_device_resources(&self, device: &dyn GraphicsDevice) -> Result<()> {
        for entry in self.entries.values() {
            entry.object.create_device_resources(device)?;
        }
        Ok(())
    }

    /// Destroy device resources of every registered renderable.
    pub fn destroy_all_device_resources(&self) {
        for entry in self.entries.values() {
            entry.object.destroy_device_resources();
        }
    }

    // ===== ACCESSORS =====

    pub fn object(&self, key: RenderableKey) -> Option<&SceneObject> {
        self.entries.get(key).map(|entry| &entry.object)
    }

    /// Key of a registered object, by reference identity.
    pub fn key_of<T: ?Sized>(&self, object: &Arc<T>) -> Option<RenderableKey> {
        self.identities.get(&identity_of(object)).copied()
    }

    pub fn placement(&self, key: RenderableKey) -> Option<Placement> {
        self.entries.get(key).map(|entry| entry.placement)
    }

    /// Registered culled renderables, whatever their placement.
    pub fn cull_renderable_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.object.is_culled()).count()
    }

    /// Registered free renderables, whatever their placement.
    pub fn free_renderable_count(&self) -> usize {
        self.entries.values().filter(|entry| !entry.object.is_culled()).count()
    }

    /// Culled renderables currently in the spatial index.
    pub fn indexed_count(&self) -> usize {
        self.index.len()
    }

    /// Free renderables currently in the always-visible set.
    pub fn visible_free_count(&self) -> usize {
        self.free_renderables.len()
    }

    pub fn updateable_count(&self) -> usize {
        self.updateables.len()
    }

    /// Keys of free renderables in the always-visible set, in insertion order.
    pub fn free_renderables(&self) -> &[RenderableKey] {
        &self.free_renderables
    }

    // ===== INTERNAL =====

    fn is_renderable(&self, key: RenderableKey) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.object.should_render())
    }

    /// Drop keys appended after `start` whose object must not render.
    fn retain_renderable(&self, results: &mut Vec<RenderableKey>, start: usize) {
        let mut write = start;
        for read in start..results.len() {
            let key = results[read];
            if self.is_renderable(key) {
                results[write] = key;
                write += 1;
            }
        }
        results.truncate(write);
    }

    fn register(&mut self, object: SceneObject) -> RenderableKey {
        let identity = object.identity();
        if let Some(&key) = self.identities.get(&identity) {
            return key;
        }

        let key = self.entries.insert(SceneEntry { object, placement: Placement::Detached });
        self.identities.insert(identity, key);

        if let Some(entry) = self.entries.get(key) {
            entry.object.change_subscription().attach(ChangeNotifier {
                key,
                sender: self.events_tx.clone(),
            });
        }
        self.sync_placement(key);
        key
    }

    fn unregister(&mut self, identity: usize, culled: bool) {
        let Some(&key) = self.identities.get(&identity) else {
            return;
        };
        if self.entries.get(key).is_some_and(|entry| entry.object.is_culled() != culled) {
            engine_warn!(
                "umbra::Scene",
                "{:?} is registered as a {} renderable, not removed",
                key, if culled { "free" } else { "culled" }
            );
            return;
        }
        self.identities.remove(&identity);
        self.leave_placement(key);
        if let Some(entry) = self.entries.remove(key) {
            entry.object.change_subscription().detach(&self.events_tx);
        }
    }

    /// Move an object to the placement its current state calls for.
    fn sync_placement(&mut self, key: RenderableKey) {
        let Some(entry) = self.entries.get(key) else {
            return;
        };

        let bounds = entry.object.bounding_box();
        let target = match (&entry.object, entry.object.should_render(), bounds) {
            (_, false, _) => Placement::Detached,
            (SceneObject::Cull(_), true, Some(_)) => Placement::Indexed,
            (SceneObject::Cull(_), true, None) => Placement::Detached,
            (SceneObject::Free(_), true, _) => Placement::Free,
        };

        match (entry.placement, target, bounds) {
            (Placement::Indexed, Placement::Indexed, Some(bounds)) => {
                self.index.update(key, &bounds);
            }
            (current, target, _) if current == target => {}
            (_, target, bounds) => {
                self.leave_placement(key);
                self.enter_placement(key, target, bounds);
            }
        }
    }

    fn leave_placement(&mut self, key: RenderableKey) {
        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };
        match entry.placement {
            Placement::Indexed => {
                self.index.remove(key);
            }
            Placement::Free => {
                if let Some(pos) = self.free_renderables.iter().position(|&k| k == key) {
                    self.free_renderables.remove(pos);
                }
            }
            Placement::Detached => {}
        }
        entry.placement = Placement::Detached;
    }

    fn enter_placement(&mut self, key: RenderableKey, target: Placement, bounds: Option<AABB>) {
        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };
        match (target, bounds) {
            (Placement::Indexed, Some(bounds)) => {
                if let Err(e) = self.index.insert(key, &bounds) {
                    engine_error!("umbra::Scene", "Failed to index {:?}: {}", key, e);
                    return;
                }
            }
            (Placement::Free, _) => self.free_renderables.push(key),
            _ => return,
        }
        entry.placement = target;
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        for entry in self.entries.values() {
            entry.object.change_subscription().detach(&self.events_tx);
        }
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
