/// RenderContext - what one frame renders from and into.
///
/// The caller owns the context behind a lock and must not mutate it
/// between a frame's start signal and its completion.

use std::sync::Arc;
use crate::camera::{Camera, DirectionalLight};
use crate::graphics_device::Framebuffer;
use super::cascade::CASCADE_COUNT;

/// Framebuffers written by one frame.
#[derive(Clone)]
pub struct FrameTargets {
    /// Depth targets of the near, mid, and far cascades
    pub shadow_maps: [Arc<dyn Framebuffer>; CASCADE_COUNT],
    /// Main color + depth target (may be multisampled)
    pub main: Arc<dyn Framebuffer>,
    /// Single-sampled resolve target, required when `main` is multisampled
    pub resolve: Option<Arc<dyn Framebuffer>>,
    /// Target of the duplicator pass (two side-by-side viewports)
    pub duplicator: Arc<dyn Framebuffer>,
    /// Current swapchain image
    pub swapchain: Arc<dyn Framebuffer>,
}

impl FrameTargets {
    /// `true` if the main target needs a resolve before post-processing.
    pub fn needs_resolve(&self) -> bool {
        self.main.sample_count() > 1
    }
}

/// Camera, light, and targets of a frame.
#[derive(Clone)]
pub struct RenderContext {
    pub camera: Camera,
    pub light: DirectionalLight,
    pub targets: FrameTargets,
}

impl RenderContext {
    pub fn new(camera: Camera, light: DirectionalLight, targets: FrameTargets) -> Self {
        Self { camera, light, targets }
    }
}
