/// Camera - passive data container read by the render thread.
///
/// The caller owns and drives the camera. During a frame (between the
/// orchestrator's start signal and its completion signal) the camera is
/// read-only; the render thread reads view/projection, position, and the
/// near/far distances used to split the shadow cascades.

use glam::{Mat4, Vec3};
use crate::graphics_device::{Viewport, Rect2D};
use super::frustum::Frustum;

/// Perspective camera.
///
/// `look_at` and `set_perspective` recompute the matrices and the frustum;
/// the raw setters store values as-is.
#[derive(Debug, Clone)]
pub struct Camera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
    frustum: Frustum,
    viewport: Viewport,
    scissor: Option<Rect2D>,
    position: Vec3,
    fov_y: f32,
    aspect_ratio: f32,
    near_distance: f32,
    far_distance: f32,
}

impl Camera {
    /// Create a perspective camera at `position` looking at `target`.
    ///
    /// # Arguments
    ///
    /// * `fov_y` - Vertical field of view in radians
    /// * `near_distance` / `far_distance` - Clip distances (positive)
    pub fn perspective(
        position: Vec3,
        target: Vec3,
        fov_y: f32,
        near_distance: f32,
        far_distance: f32,
        viewport: Viewport,
    ) -> Self {
        let aspect_ratio = if viewport.height > 0.0 {
            viewport.width / viewport.height
        } else {
            1.0
        };
        let mut camera = Self {
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            frustum: Frustum::from_view_projection(&Mat4::IDENTITY),
            viewport,
            scissor: None,
            position,
            fov_y,
            aspect_ratio,
            near_distance,
            far_distance,
        };
        camera.set_perspective(fov_y, aspect_ratio, near_distance, far_distance);
        camera.look_at(position, target);
        camera
    }

    // ===== GETTERS =====

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix.
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Frustum planes for culling.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// World-space eye position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn near_distance(&self) -> f32 {
        self.near_distance
    }

    pub fn far_distance(&self) -> f32 {
        self.far_distance
    }

    /// Vertical field of view in radians.
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Viewport dimensions and depth range.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Effective scissor: explicit scissor or viewport bounds.
    pub fn effective_scissor(&self) -> Rect2D {
        self.scissor.unwrap_or(Rect2D {
            x: self.viewport.x as i32,
            y: self.viewport.y as i32,
            width: self.viewport.width as u32,
            height: self.viewport.height as u32,
        })
    }

    // ===== SETTERS =====

    /// Move the camera and aim it at `target`. Recomputes view and frustum.
    pub fn look_at(&mut self, position: Vec3, target: Vec3) {
        let forward = (target - position).normalize_or_zero();
        let up = if forward.y.abs() > 0.999 { Vec3::Z } else { Vec3::Y };
        self.position = position;
        self.view_matrix = Mat4::look_at_rh(position, target, up);
        self.refresh_frustum();
    }

    /// Replace the perspective parameters. Recomputes projection and frustum.
    pub fn set_perspective(&mut self, fov_y: f32, aspect_ratio: f32, near: f32, far: f32) {
        self.fov_y = fov_y;
        self.aspect_ratio = aspect_ratio;
        self.near_distance = near;
        self.far_distance = far;
        self.projection_matrix = Mat4::perspective_rh(fov_y, aspect_ratio, near, far);
        self.refresh_frustum();
    }

    /// Set the viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Set the scissor rectangle. `None` means same as viewport.
    pub fn set_scissor(&mut self, scissor: Option<Rect2D>) {
        self.scissor = scissor;
    }

    fn refresh_frustum(&mut self) {
        self.frustum = Frustum::from_view_projection(&self.view_projection_matrix());
    }
}

/// Directional light read by the shadow cascades.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels (normalized on construction)
    direction: Vec3,
    /// Linear RGB color, alpha = intensity
    color: glam::Vec4,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: glam::Vec4) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            color,
        }
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn color(&self) -> glam::Vec4 {
        self.color
    }

    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction.normalize_or_zero();
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(Vec3::new(-0.3, -1.0, -0.2), glam::Vec4::ONE)
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
