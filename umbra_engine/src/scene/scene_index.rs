/// Spatial acceleration structures for scene queries.
///
/// A SceneIndex stores culled renderables by their world-space AABB
/// for frustum culling and box queries. The Scene owns its index and is the
/// only writer; queries run concurrently from the render passes.

use crate::camera::Frustum;
use crate::error::Result;
use super::aabb::AABB;
use super::renderable::RenderableKey;

/// Trait for spatial indexing of culled renderables.
pub trait SceneIndex: Send + Sync {
    /// Insert an item with its world-space AABB.
    ///
    /// Returns `Error::DuplicateItem` if the key is already indexed.
    fn insert(&mut self, key: RenderableKey, world_aabb: &AABB) -> Result<()>;

    /// Remove an item. Returns `false` if it was not indexed.
    fn remove(&mut self, key: RenderableKey) -> bool;

    /// Replace an item's AABB, re-bucketing it if needed.
    /// Returns `false` if it was not indexed.
    fn update(&mut self, key: RenderableKey, world_aabb: &AABB) -> bool;

    /// Append every item whose AABB intersects the frustum to `results`.
    ///
    /// May report items slightly outside the frustum, never misses one
    /// that intersects it.
    fn query_frustum(&self, frustum: &Frustum, results: &mut Vec<RenderableKey>);

    /// Append every item whose AABB intersects `bounds` to `results`.
    fn query_aabb(&self, bounds: &AABB, results: &mut Vec<RenderableKey>);

    /// Number of indexed items.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all items.
    fn clear(&mut self);
}
