//! Scene module
//!
//! Renderable contracts, the octree spatial index, and the Scene that splits
//! objects into culled (indexed) and free (always visible) groups.

mod aabb;
mod octree;
mod renderable;
mod scene;
mod scene_index;

#[cfg(test)]
pub mod mock_renderable;

pub use aabb::AABB;
pub use octree::{Octree, OctreeConfig};
pub use renderable::{
    identity_of, ChangeSubscription, CullRenderable, DrawContext, RenderPasses,
    Renderable, RenderableKey, SceneEvent, SceneEventKind, SceneObject, Updateable,
};
pub use scene::{Placement, Scene, SceneConfig};
pub use scene_index::SceneIndex;
