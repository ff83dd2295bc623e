/// Shadow cascades - split the camera view range into near/mid/far slices
/// and fit an orthographic light projection around each.
///
/// Splits come from fixed distance limits; the far end is the camera's far
/// plane clamped to the far cascade limit. Each slice is enclosed in a
/// bounding sphere so the light projection does not change size as the
/// camera rotates.

use glam::{Mat4, Vec3, Vec4Swizzles};
use crate::camera::{Camera, DirectionalLight, Frustum};

/// Number of shadow cascades (near, mid, far).
pub const CASCADE_COUNT: usize = 3;

/// Cascade distance limits, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeConfig {
    /// End of the near cascade
    pub near_cascade_limit: f32,
    /// End of the mid cascade
    pub mid_cascade_limit: f32,
    /// Upper bound for the end of the far cascade
    pub far_cascade_limit: f32,
    /// Distance from a slice center back to the light eye
    pub light_distance: f32,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            near_cascade_limit: 100.0,
            mid_cascade_limit: 300.0,
            far_cascade_limit: 900.0,
            light_distance: 1000.0,
        }
    }
}

/// One cascade's slice and light transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCascade {
    /// Camera-space start of the slice
    pub near: f32,
    /// Camera-space end of the slice
    pub far: f32,
    /// Light eye position for this cascade
    pub light_position: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    /// Light-space culling volume
    pub frustum: Frustum,
    /// Light depth range, used to quantize sort distances
    pub depth_range: f32,
}

/// Split distances `[start, near_end, mid_end, far_end]`, non-decreasing.
pub fn cascade_splits(camera: &Camera, config: &CascadeConfig) -> [f32; CASCADE_COUNT + 1] {
    let start = camera.near_distance();
    let end = camera.far_distance().min(config.far_cascade_limit).max(start);

    let near_end = config.near_cascade_limit.clamp(start, end);
    let mid_end = config.mid_cascade_limit.clamp(near_end, end);

    [start, near_end, mid_end, end]
}

/// Compute all cascades for the current camera and light.
pub fn compute_cascades(
    camera: &Camera,
    light: &DirectionalLight,
    config: &CascadeConfig,
) -> [ShadowCascade; CASCADE_COUNT] {
    let splits = cascade_splits(camera, config);
    let inverse_view = camera.view_matrix().inverse();

    let direction = if light.direction() == Vec3::ZERO {
        Vec3::NEG_Y
    } else {
        light.direction()
    };

    std::array::from_fn(|i| {
        let corners = slice_corners(camera, &inverse_view, splits[i], splits[i + 1]);
        fit_cascade(&corners, direction, splits[i], splits[i + 1], config.light_distance)
    })
}

/// World-space corners of the camera view volume between two distances.
fn slice_corners(camera: &Camera, inverse_view: &Mat4, near: f32, far: f32) -> [Vec3; 8] {
    let tan_half_fov = (camera.fov_y() * 0.5).tan();
    let aspect = camera.aspect_ratio();

    let near_height = near * tan_half_fov;
    let near_width = near_height * aspect;
    let far_height = far * tan_half_fov;
    let far_width = far_height * aspect;

    // View space looks down -Z
    let corners_view = [
        Vec3::new(-near_width, -near_height, -near),
        Vec3::new(near_width, -near_height, -near),
        Vec3::new(near_width, near_height, -near),
        Vec3::new(-near_width, near_height, -near),
        Vec3::new(-far_width, -far_height, -far),
        Vec3::new(far_width, -far_height, -far),
        Vec3::new(far_width, far_height, -far),
        Vec3::new(-far_width, far_height, -far),
    ];

    corners_view.map(|corner| {
        let world = *inverse_view * corner.extend(1.0);
        world.xyz() / world.w
    })
}

fn fit_cascade(
    corners: &[Vec3; 8],
    direction: Vec3,
    near: f32,
    far: f32,
    light_distance: f32,
) -> ShadowCascade {
    let center = corners.iter().copied().sum::<Vec3>() / 8.0;
    let radius = corners
        .iter()
        .map(|corner| corner.distance(center))
        .fold(0.0_f32, f32::max);
    // Round up to reduce edge flicker as the slice rotates
    let radius = ((radius * 16.0).ceil() / 16.0).max(f32::EPSILON);

    let distance = light_distance.max(radius);
    let light_position = center - direction * distance;
    let up = if direction.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };

    let view = Mat4::look_at_rh(light_position, center, up);
    let depth_range = distance + radius;
    let projection = Mat4::orthographic_rh(-radius, radius, -radius, radius, 0.0, depth_range);
    let view_projection = projection * view;

    ShadowCascade {
        near,
        far,
        light_position,
        view,
        projection,
        view_projection,
        frustum: Frustum::from_view_projection(&view_projection),
        depth_range,
    }
}

#[cfg(test)]
#[path = "cascade_tests.rs"]
mod tests;
