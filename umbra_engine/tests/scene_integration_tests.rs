//! Integration tests for Scene and Octree
//!
//! Populate a scene with randomly placed boxes, move them around from other
//! threads, and check the spatial queries against brute force.
//! No GPU required.
//!
//! Run with: cargo test --test scene_integration_tests


use std::sync::Arc;
use std::thread;
use umbra_engine::glam::{Mat4, Vec3};
use umbra_engine::umbra::camera::Frustum;
use umbra_engine::umbra::scene::{
    CullRenderable, Octree, OctreeConfig, Placement, RenderPasses, RenderableKey, Scene,
    SceneConfig, AABB,
};
use test_utils::{camera_at, TestBox, XorShift};

fn populate(scene: &mut Scene, rng: &mut XorShift, count: usize, region: &AABB) -> Vec<Arc<TestBox>> {
    let boxes: Vec<Arc<TestBox>> = (0..count)
        .map(|_| TestBox::new(rng.point_in(region), Vec3::splat(0.5), RenderPasses::STANDARD))
        .collect();
    let items: Vec<Arc<dyn CullRenderable>> =
        boxes.iter().map(|b| -> Arc<dyn CullRenderable> { b.clone() }).collect();
    scene.add_cull_renderables(&items);
    boxes
}

fn brute_force(scene: &Scene, boxes: &[Arc<TestBox>], frustum: &Frustum) -> Vec<RenderableKey> {
    boxes
        .iter()
        .filter(|b| b.bounding_box().is_some_and(|aabb| frustum.intersects_aabb(&aabb)))
        .filter_map(|b| scene.key_of(b))
        .collect()
}

// ============================================================================
// QUERY TESTS
// ============================================================================

#[test]
fn test_integration_frustum_query_matches_brute_force() {
    let mut scene = Scene::new(SceneConfig::default());
    let mut rng = XorShift::new(0x5eed);
    let region = AABB::new(Vec3::splat(-200.0), Vec3::splat(200.0));
    let boxes = populate(&mut scene, &mut rng, 2000, &region);

    for (eye, target) in [
        (Vec3::new(0.0, 0.0, 250.0), Vec3::ZERO),
        (Vec3::new(-150.0, 40.0, 0.0), Vec3::new(100.0, 0.0, 10.0)),
        (Vec3::new(0.0, 300.0, 100.0), Vec3::ZERO),
    ] {
        let camera = camera_at(eye, target);
        let mut visible = Vec::new();
        scene.get_contained_renderables(camera.frustum(), &mut visible);

        let expected = brute_force(&scene, &boxes, camera.frustum());
        for key in &expected {
            assert!(visible.contains(key), "visible object missing from the octree query");
        }
    }
}

#[test]
fn test_integration_box_query_after_moves() {
    let mut scene = Scene::new(SceneConfig::default());
    let mut rng = XorShift::new(42);
    let region = AABB::new(Vec3::splat(-100.0), Vec3::splat(100.0));
    let boxes = populate(&mut scene, &mut rng, 500, &region);

    // Gather everything into one corner
    let corner = AABB::new(Vec3::splat(500.0), Vec3::splat(520.0));
    for b in &boxes {
        b.move_to(rng.point_in(&corner));
    }
    assert_eq!(scene.process_notifications(), boxes.len());

    let mut found = Vec::new();
    scene.get_renderables_in_box(&AABB::new(Vec3::splat(499.0), Vec3::splat(521.0)), &mut found);
    assert_eq!(found.len(), boxes.len());

    let mut left_behind = Vec::new();
    scene.get_renderables_in_box(&region, &mut left_behind);
    assert!(left_behind.is_empty());
}

#[test]
fn test_integration_objects_leaving_world_stay_visible() {
    let mut scene = Scene::new(SceneConfig {
        world_bounds: AABB::new(Vec3::splat(-50.0), Vec3::splat(50.0)),
        ..SceneConfig::default()
    });
    let escaped = TestBox::new(Vec3::ZERO, Vec3::splat(1.0), RenderPasses::STANDARD);
    let item: Arc<dyn CullRenderable> = escaped.clone();
    let key = scene.add_cull_renderables(&[item])[0];

    escaped.move_to(Vec3::new(400.0, 0.0, 0.0));
    scene.process_notifications();
    assert_eq!(scene.placement(key), Some(Placement::Indexed));

    let camera = camera_at(Vec3::new(400.0, 0.0, 20.0), Vec3::new(400.0, 0.0, 0.0));
    let mut visible = Vec::new();
    scene.get_contained_renderables(camera.frustum(), &mut visible);
    assert_eq!(visible, vec![key]);
}

// ============================================================================
// THREADING TESTS
// ============================================================================

#[test]
fn test_integration_moves_from_other_threads() {
    let mut scene = Scene::new(SceneConfig::default());
    let mut rng = XorShift::new(7);
    let region = AABB::new(Vec3::splat(-100.0), Vec3::splat(100.0));
    let boxes = populate(&mut scene, &mut rng, 400, &region);

    // Four workers each move their share of the boxes to +x
    thread::scope(|s| {
        for chunk in boxes.chunks(100) {
            s.spawn(move || {
                for b in chunk {
                    let center = b.bounding_box().unwrap().center();
                    b.move_to(center + Vec3::new(300.0, 0.0, 0.0));
                }
            });
        }
    });

    assert_eq!(scene.process_notifications(), boxes.len());

    let moved = AABB::new(Vec3::new(195.0, -105.0, -105.0), Vec3::new(405.0, 105.0, 105.0));
    let mut found = Vec::new();
    scene.get_renderables_in_box(&moved, &mut found);
    assert_eq!(found.len(), boxes.len());
}

// ============================================================================
// OCTREE TESTS
// ============================================================================

#[test]
fn test_integration_octree_stays_shallow_for_uniform_data() {
    let world = AABB::new(Vec3::splat(-512.0), Vec3::splat(512.0));
    let mut octree = Octree::new(world, OctreeConfig::default());
    let interior = AABB::new(Vec3::splat(-500.0), Vec3::splat(500.0));
    let mut rng = XorShift::new(99);

    for key in scene_keys(4096) {
        let center = rng.point_in(&interior);
        octree.add_item(key, AABB::from_center_extents(center, Vec3::splat(0.25))).unwrap();
    }

    assert_eq!(octree.item_count(), 4096);
    assert_eq!(octree.overflow_count(), 0);
    assert!(octree.depth() <= 10);

    // An orthographic box frustum over the whole world returns everything
    let projection = Mat4::orthographic_rh(-600.0, 600.0, -600.0, 600.0, -600.0, 600.0);
    let mut all = Vec::new();
    octree.get_contained_objects(&Frustum::from_view_projection(&projection), &mut all);
    assert_eq!(all.len(), 4096);
}

fn scene_keys(count: usize) -> Vec<RenderableKey> {
    // Keys come from a scene so the test only uses the public API
    let mut scene = Scene::new(SceneConfig::default());
    let boxes: Vec<Arc<dyn CullRenderable>> = (0..count)
        .map(|i| -> Arc<dyn CullRenderable> {
            TestBox::new(Vec3::new(i as f32, 0.0, 0.0), Vec3::splat(0.1), RenderPasses::STANDARD)
        })
        .collect();
    scene.add_cull_renderables(&boxes)
}
