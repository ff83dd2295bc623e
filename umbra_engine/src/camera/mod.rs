//! Camera module - camera, directional light, and frustum.
//!
//! Passive data read by the render thread. The engine does not own
//! cameras or lights; the caller drives them between frames.

mod camera;
mod frustum;

pub use camera::{Camera, DirectionalLight};
pub use frustum::{
    Frustum, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
