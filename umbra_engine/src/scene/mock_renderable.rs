/// Mock renderables for unit tests.
///
/// `MockRenderable` implements both `Renderable` and `CullRenderable`, so
/// the same type can be registered as culled or free. Every `render` call
/// is appended to a shared `DrawLog` as `(name, pass)`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use glam::Vec3;
use crate::error::Result;
use crate::graphics_device::{CommandList, GraphicsDevice};
use super::aabb::AABB;
use super::renderable::{
    ChangeSubscription, CullRenderable, DrawContext, RenderPasses, Renderable, Updateable,
};

pub type DrawLog = Arc<Mutex<Vec<(String, RenderPasses)>>>;

pub fn draw_log() -> DrawLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Names drawn in `pass`, in draw order.
pub fn drawn_in(log: &DrawLog, pass: RenderPasses) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|(_, p)| *p == pass)
        .map(|(name, _)| name.clone())
        .collect()
}

// ============================================================================
// MockRenderable
// ============================================================================

pub struct MockRenderable {
    pub name: String,
    passes: RenderPasses,
    material: u32,
    position: Mutex<Vec3>,
    half_extents: Vec3,
    bounded: AtomicBool,
    visible: AtomicBool,
    has_resources: AtomicBool,
    draws: DrawLog,
    subscription: ChangeSubscription,
}

impl MockRenderable {
    /// Culled-style object with a unit cube at `position`.
    pub fn new(name: &str, position: Vec3, passes: RenderPasses, material: u32, draws: &DrawLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            passes,
            material,
            position: Mutex::new(position),
            half_extents: Vec3::splat(0.5),
            bounded: AtomicBool::new(true),
            visible: AtomicBool::new(true),
            has_resources: AtomicBool::new(false),
            draws: Arc::clone(draws),
            subscription: ChangeSubscription::new(),
        })
    }

    /// Object that has not published a bounding box yet.
    pub fn unbounded(name: &str, passes: RenderPasses, draws: &DrawLog) -> Arc<Self> {
        let object = Self::new(name, Vec3::ZERO, passes, 0, draws);
        object.bounded.store(false, Ordering::SeqCst);
        object
    }

    /// Move the object and notify its scene.
    pub fn set_position(&self, position: Vec3) {
        *self.position.lock().unwrap() = position;
        self.bounded.store(true, Ordering::SeqCst);
        self.subscription.bounding_box_changed();
    }

    /// Flip the render flag and notify its scene.
    pub fn set_should_render(&self, should_render: bool) {
        self.visible.store(should_render, Ordering::SeqCst);
        self.subscription.should_render_changed();
    }

    /// Flip the render flag without notifying.
    pub fn set_should_render_silently(&self, should_render: bool) {
        self.visible.store(should_render, Ordering::SeqCst);
    }

    pub fn has_device_resources(&self) -> bool {
        self.has_resources.load(Ordering::SeqCst)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_subscribed()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscription.subscriber_count()
    }
}

impl Renderable for MockRenderable {
    fn render_passes(&self) -> RenderPasses {
        self.passes
    }

    fn should_render(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn material_id(&self) -> u32 {
        self.material
    }

    fn distance_to(&self, viewer_position: Vec3) -> f32 {
        self.position.lock().unwrap().distance(viewer_position)
    }

    fn render(&self, cmd: &mut dyn CommandList, ctx: &DrawContext<'_>) -> Result<()> {
        cmd.draw(3, 0)?;
        self.draws.lock().unwrap().push((self.name.clone(), ctx.pass));
        Ok(())
    }

    fn change_subscription(&self) -> &ChangeSubscription {
        &self.subscription
    }

    fn create_device_resources(&self, _device: &dyn GraphicsDevice) -> Result<()> {
        self.has_resources.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn destroy_device_resources(&self) {
        self.has_resources.store(false, Ordering::SeqCst);
    }
}

impl CullRenderable for MockRenderable {
    fn bounding_box(&self) -> Option<AABB> {
        if !self.bounded.load(Ordering::SeqCst) {
            return None;
        }
        let center = *self.position.lock().unwrap();
        Some(AABB::from_center_extents(center, self.half_extents))
    }
}

// ============================================================================
// MockUpdateable
// ============================================================================

#[derive(Default)]
pub struct MockUpdateable {
    ticks: AtomicUsize,
    elapsed: Mutex<f32>,
}

impl MockUpdateable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> f32 {
        *self.elapsed.lock().unwrap()
    }
}

impl Updateable for MockUpdateable {
    fn update(&self, delta_seconds: f32) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        *self.elapsed.lock().unwrap() += delta_seconds;
    }
}
