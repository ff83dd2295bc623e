/// Renderable contracts consumed by the Scene and the FrameOrchestrator.
///
/// - `Renderable`: anything that can be drawn in one or more render passes
/// - `CullRenderable`: a renderable with a world-space bounding box, stored
///   in the spatial index and frustum-culled
/// - `Updateable`: receives a per-frame tick independent of visibility
///
/// Objects report their own changes through an embedded `ChangeSubscription`.
/// Each Scene attaches its own notifier when the object is added and detaches
/// only that notifier on removal, so an object shared by several scenes keeps
/// notifying the others, and a notification never reaches a scene that no
/// longer owns the object.

use std::sync::{Arc, Mutex};
use bitflags::bitflags;
use crossbeam_channel::Sender;
use glam::{Mat4, Vec3};
use slotmap::new_key_type;
use crate::camera::{Camera, DirectionalLight};
use crate::error::Result;
use crate::graphics_device::{CommandList, GraphicsDevice};
use crate::render_queue::RenderOrderKey;
use super::aabb::AABB;

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable key for an object registered in a Scene.
    ///
    /// Versioned: a key of a removed object never aliases a later object.
    pub struct RenderableKey;
}

// ===== RENDER PASSES =====

bitflags! {
    /// Logical drawing stages an object participates in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderPasses: u32 {
        /// Opaque geometry in the main color pass
        const STANDARD         = 1 << 0;
        /// Alpha-blended geometry (drawn back-to-front)
        const ALPHA_BLEND      = 1 << 1;
        /// Screen-space overlays drawn last in the main pass
        const OVERLAY          = 1 << 2;
        const SHADOW_MAP_NEAR  = 1 << 3;
        const SHADOW_MAP_MID   = 1 << 4;
        const SHADOW_MAP_FAR   = 1 << 5;
        /// Writes the resolved main color into two viewports
        const DUPLICATOR       = 1 << 6;
        /// Final blit into the swapchain framebuffer
        const SWAPCHAIN_OUTPUT = 1 << 7;
        const PARTICLES        = 1 << 8;
        /// Deferred geometry stage (not dispatched by FrameOrchestrator)
        const GEOMETRY         = 1 << 9;

        const ALL_SHADOW_MAPS = Self::SHADOW_MAP_NEAR.bits()
            | Self::SHADOW_MAP_MID.bits()
            | Self::SHADOW_MAP_FAR.bits();
    }
}

// ===== DRAW CONTEXT =====

/// Per-pass data handed to `Renderable::render`.
pub struct DrawContext<'a> {
    /// The single pass being drawn
    pub pass: RenderPasses,
    /// Camera or light view-projection of this pass
    pub view_projection: Mat4,
    /// Eye position used for distance sorting in this pass
    pub viewer_position: Vec3,
    pub camera: &'a Camera,
    pub light: &'a DirectionalLight,
}

// ===== CHANGE NOTIFICATION =====

/// Kind of change an object reports to its scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEventKind {
    BoundingBoxChanged,
    ShouldRenderChanged,
}

/// A change notification queued for the owning scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneEvent {
    pub key: RenderableKey,
    pub kind: SceneEventKind,
}

/// Scene-side end of a subscription: where to send, and under which key.
#[derive(Clone)]
pub(crate) struct ChangeNotifier {
    pub(crate) key: RenderableKey,
    pub(crate) sender: Sender<SceneEvent>,
}

/// Embedded in every renderable; forwards changes to every owning scene.
///
/// Firing while unsubscribed is a no-op.
#[derive(Default)]
pub struct ChangeSubscription {
    /// One entry per owning scene, told apart by event channel
    notifiers: Mutex<Vec<ChangeNotifier>>,
}

impl ChangeSubscription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report that `CullRenderable::bounding_box()` now returns a new value.
    pub fn bounding_box_changed(&self) {
        self.emit(SceneEventKind::BoundingBoxChanged);
    }

    /// Report that `Renderable::should_render()` flipped.
    pub fn should_render_changed(&self) {
        self.emit(SceneEventKind::ShouldRenderChanged);
    }

    /// `true` while at least one scene owns this object.
    pub fn is_subscribed(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Number of scenes this object is registered in.
    pub fn subscriber_count(&self) -> usize {
        self.notifiers.lock().map(|n| n.len()).unwrap_or(0)
    }

    /// Attach a scene's notifier, replacing that scene's previous one.
    pub(crate) fn attach(&self, notifier: ChangeNotifier) {
        if let Ok(mut notifiers) = self.notifiers.lock() {
            notifiers.retain(|n| !n.sender.same_channel(&notifier.sender));
            notifiers.push(notifier);
        }
    }

    /// Detach the notifier of the scene that owns `sender`.
    pub(crate) fn detach(&self, sender: &Sender<SceneEvent>) {
        if let Ok(mut notifiers) = self.notifiers.lock() {
            notifiers.retain(|n| !n.sender.same_channel(sender));
        }
    }

    fn emit(&self, kind: SceneEventKind) {
        if let Ok(notifiers) = self.notifiers.lock() {
            for notifier in notifiers.iter() {
                // Receiver gone means that scene is being dropped
                let _ = notifier.sender.send(SceneEvent { key: notifier.key, kind });
            }
        }
    }
}

// ===== TRAITS =====

/// An object eligible for drawing.
///
/// Identity is by reference: two distinct `Arc`s are never the same
/// renderable, whatever their contents.
pub trait Renderable: Send + Sync {
    /// Passes this object is drawn in
    fn render_passes(&self) -> RenderPasses;

    /// Objects that return `false` are kept out of every visible set
    fn should_render(&self) -> bool {
        true
    }

    /// Material / pipeline identity (high bits of the render order key)
    fn material_id(&self) -> u32;

    /// Distance from `viewer_position` used for sorting
    fn distance_to(&self, viewer_position: Vec3) -> f32;

    /// Sort key for the render queue
    fn render_order_key(&self, viewer_position: Vec3, far_distance: f32) -> RenderOrderKey {
        RenderOrderKey::new(self.material_id(), self.distance_to(viewer_position), far_distance)
    }

    /// Record draw commands for `ctx.pass`
    fn render(&self, cmd: &mut dyn CommandList, ctx: &DrawContext<'_>) -> Result<()>;

    /// Subscription slot the scene attaches to
    fn change_subscription(&self) -> &ChangeSubscription;

    /// Allocate device resources (independent of logical lifetime)
    fn create_device_resources(&self, _device: &dyn GraphicsDevice) -> Result<()> {
        Ok(())
    }

    /// Release device resources
    fn destroy_device_resources(&self) {}
}

/// A renderable with a world-space bounding box, culled against frusta.
pub trait CullRenderable: Renderable {
    /// Current world-space bounds, `None` until the first box is published.
    ///
    /// Must enclose the visible geometry at the current transform; callers
    /// fire `bounding_box_changed()` whenever the value changes.
    fn bounding_box(&self) -> Option<AABB>;
}

/// Receives a per-frame tick.
pub trait Updateable: Send + Sync {
    fn update(&self, delta_seconds: f32);
}

// ===== SCENE OBJECT =====

/// A registered object, either culled (indexed) or free (always visible).
#[derive(Clone)]
pub enum SceneObject {
    Cull(Arc<dyn CullRenderable>),
    Free(Arc<dyn Renderable>),
}

impl SceneObject {
    /// Address of the shared allocation, used as reference identity.
    pub fn identity(&self) -> usize {
        match self {
            SceneObject::Cull(object) => identity_of(object),
            SceneObject::Free(object) => identity_of(object),
        }
    }

    pub fn is_culled(&self) -> bool {
        matches!(self, SceneObject::Cull(_))
    }

    pub fn bounding_box(&self) -> Option<AABB> {
        match self {
            SceneObject::Cull(object) => object.bounding_box(),
            SceneObject::Free(_) => None,
        }
    }

    pub fn render_passes(&self) -> RenderPasses {
        match self {
            SceneObject::Cull(object) => object.render_passes(),
            SceneObject::Free(object) => object.render_passes(),
        }
    }

    pub fn should_render(&self) -> bool {
        match self {
            SceneObject::Cull(object) => object.should_render(),
            SceneObject::Free(object) => object.should_render(),
        }
    }

    pub fn render_order_key(&self, viewer_position: Vec3, far_distance: f32) -> RenderOrderKey {
        match self {
            SceneObject::Cull(object) => object.render_order_key(viewer_position, far_distance),
            SceneObject::Free(object) => object.render_order_key(viewer_position, far_distance),
        }
    }

    pub fn render(&self, cmd: &mut dyn CommandList, ctx: &DrawContext<'_>) -> Result<()> {
        match self {
            SceneObject::Cull(object) => object.render(cmd, ctx),
            SceneObject::Free(object) => object.render(cmd, ctx),
        }
    }

    pub fn change_subscription(&self) -> &ChangeSubscription {
        match self {
            SceneObject::Cull(object) => object.change_subscription(),
            SceneObject::Free(object) => object.change_subscription(),
        }
    }

    pub fn create_device_resources(&self, device: &dyn GraphicsDevice) -> Result<()> {
        match self {
            SceneObject::Cull(object) => object.create_device_resources(device),
            SceneObject::Free(object) => object.create_device_resources(device),
        }
    }

    pub fn destroy_device_resources(&self) {
        match self {
            SceneObject::Cull(object) => object.destroy_device_resources(),
            SceneObject::Free(object) => object.destroy_device_resources(),
        }
    }
}

/// Reference identity of any shared object.
pub fn identity_of<T: ?Sized>(object: &Arc<T>) -> usize {
    Arc::as_ptr(object).cast::<()>() as usize
}
