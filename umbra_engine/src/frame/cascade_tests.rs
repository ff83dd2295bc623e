use glam::{Vec3, Vec4};
use crate::graphics_device::Viewport;
use super::*;

fn camera(far: f32) -> Camera {
    Camera::perspective(
        Vec3::new(0.0, 10.0, 0.0),
        Vec3::new(0.0, 10.0, -1.0),
        std::f32::consts::FRAC_PI_3,
        0.1,
        far,
        Viewport::full(1280, 720),
    )
}

fn sun() -> DirectionalLight {
    DirectionalLight::new(Vec3::new(-0.3, -1.0, -0.2), Vec4::ONE)
}

// ============================================================================
// Splits
// ============================================================================

#[test]
fn test_default_splits() {
    let splits = cascade_splits(&camera(500.0), &CascadeConfig::default());
    assert_eq!(splits, [0.1, 100.0, 300.0, 500.0]);
}

#[test]
fn test_far_split_clamped_to_far_limit() {
    let splits = cascade_splits(&camera(5000.0), &CascadeConfig::default());
    assert_eq!(splits[3], 900.0);
}

#[test]
fn test_short_camera_collapses_outer_cascades() {
    let splits = cascade_splits(&camera(50.0), &CascadeConfig::default());
    assert_eq!(splits, [0.1, 50.0, 50.0, 50.0]);
}

// ============================================================================
// Light fitting
// ============================================================================

#[test]
fn test_each_cascade_covers_its_slice() {
    let camera = camera(500.0);
    let cascades = compute_cascades(&camera, &sun(), &CascadeConfig::default());

    for cascade in &cascades {
        let mid = (cascade.near + cascade.far) * 0.5;
        let on_axis = camera.position() + Vec3::new(0.0, 0.0, -mid);
        assert!(
            cascade.frustum.contains_point(on_axis),
            "cascade {}..{} misses its own slice", cascade.near, cascade.far
        );
    }
}

#[test]
fn test_light_sits_against_the_light_direction() {
    let camera = camera(500.0);
    let light = sun();
    let cascades = compute_cascades(&camera, &light, &CascadeConfig::default());

    for cascade in &cascades {
        let toward_scene = (cascade.view.inverse().transform_point3(Vec3::new(0.0, 0.0, -1.0))
            - cascade.light_position)
            .normalize();
        assert!(toward_scene.dot(light.direction()) > 0.999);
        assert!(cascade.depth_range >= CascadeConfig::default().light_distance);
    }
}

#[test]
fn test_cascades_grow_with_distance() {
    let cascades = compute_cascades(&camera(900.0), &sun(), &CascadeConfig::default());
    let width = |c: &ShadowCascade| 2.0 / c.projection.x_axis.x;

    assert!(width(&cascades[0]) < width(&cascades[1]));
    assert!(width(&cascades[1]) < width(&cascades[2]));
}

#[test]
fn test_degenerate_light_direction_stays_finite() {
    let light = DirectionalLight::new(Vec3::ZERO, Vec4::ONE);
    let cascades = compute_cascades(&camera(500.0), &light, &CascadeConfig::default());

    for cascade in &cascades {
        assert!(!cascade.view_projection.is_nan());
    }
}

#[test]
fn test_vertical_light_stays_finite() {
    let light = DirectionalLight::new(Vec3::NEG_Y, Vec4::ONE);
    let cascades = compute_cascades(&camera(500.0), &light, &CascadeConfig::default());

    for cascade in &cascades {
        assert!(!cascade.view_projection.is_nan());
    }
}
