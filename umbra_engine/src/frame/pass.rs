/// Frame passes - the four concurrent passes of a frame and how each one
/// records its command list.
///
/// A pass queries the scene with its frustum, sorts the visible set, then
/// for each of its render passes draws the matching objects in reverse
/// queue order (far to near within a material).

use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::camera::Frustum;
use crate::error::Result;
use crate::graphics_device::{ClearValue, CommandList, Framebuffer, Viewport};
use crate::render_queue::RenderQueue;
use crate::scene::{DrawContext, RenderPasses, RenderableKey, Scene};
use super::cascade::ShadowCascade;
use super::render_context::RenderContext;

/// Number of concurrent passes per frame (3 cascades + main).
pub const PASS_COUNT: usize = 4;

/// Render passes of the main pass, in draw order.
const MAIN_RENDER_PASSES: [RenderPasses; 4] = [
    RenderPasses::STANDARD,
    RenderPasses::PARTICLES,
    RenderPasses::ALPHA_BLEND,
    RenderPasses::OVERLAY,
];

const MAIN_CLEAR: [ClearValue; 2] = [
    ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
    ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
];

const SHADOW_CLEAR: [ClearValue; 1] = [ClearValue::DepthStencil { depth: 1.0, stencil: 0 }];

/// The four passes of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    ShadowNear,
    ShadowMid,
    ShadowFar,
    Main,
}

impl PassKind {
    /// All passes, indexed by `index()`.
    pub const ALL: [PassKind; PASS_COUNT] = [
        PassKind::ShadowNear,
        PassKind::ShadowMid,
        PassKind::ShadowFar,
        PassKind::Main,
    ];

    pub fn index(self) -> usize {
        match self {
            PassKind::ShadowNear => 0,
            PassKind::ShadowMid => 1,
            PassKind::ShadowFar => 2,
            PassKind::Main => 3,
        }
    }

    /// Command list label.
    pub fn name(self) -> &'static str {
        match self {
            PassKind::ShadowNear => "shadow_near",
            PassKind::ShadowMid => "shadow_mid",
            PassKind::ShadowFar => "shadow_far",
            PassKind::Main => "main",
        }
    }

    /// Render passes drawn by this pass, in order.
    pub fn render_passes(self) -> &'static [RenderPasses] {
        match self {
            PassKind::ShadowNear => &[RenderPasses::SHADOW_MAP_NEAR],
            PassKind::ShadowMid => &[RenderPasses::SHADOW_MAP_MID],
            PassKind::ShadowFar => &[RenderPasses::SHADOW_MAP_FAR],
            PassKind::Main => &MAIN_RENDER_PASSES,
        }
    }

    pub fn is_shadow(self) -> bool {
        !matches!(self, PassKind::Main)
    }
}

/// Viewpoint of one pass.
#[derive(Debug, Clone, Copy)]
pub struct PassView {
    pub view_projection: Mat4,
    pub frustum: Frustum,
    /// Eye used for distance sorting
    pub viewer_position: Vec3,
    /// Distance that maps to the largest sort key
    pub far_distance: f32,
}

impl PassView {
    pub fn from_cascade(cascade: &ShadowCascade) -> Self {
        Self {
            view_projection: cascade.view_projection,
            frustum: cascade.frustum,
            viewer_position: cascade.light_position,
            far_distance: cascade.depth_range,
        }
    }

    pub fn from_camera(context: &RenderContext) -> Self {
        let camera = &context.camera;
        Self {
            view_projection: camera.view_projection_matrix(),
            frustum: *camera.frustum(),
            viewer_position: camera.position(),
            far_distance: camera.far_distance(),
        }
    }
}

/// Per-pass visible/drawn counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Objects returned by the frustum query
    pub visible: usize,
    /// Draw calls issued across the pass's render passes
    pub drawn: usize,
}

/// Working storage of one pass, reused across frames.
#[derive(Default)]
pub(crate) struct PassScratch {
    /// Frustum query results
    visible: Vec<RenderableKey>,
    /// Sorted visible set
    queue: RenderQueue,
    /// Objects of the render pass being drawn
    draw_list: Vec<RenderableKey>,
}

impl PassScratch {
    /// Drop every key from the previous frame. Capacity is kept.
    pub(crate) fn clear(&mut self) {
        self.visible.clear();
        self.queue.clear();
        self.draw_list.clear();
    }
}

/// Record one pass into `cmd`. The list is begun here and left open;
/// the orchestrator ends it after all passes joined.
pub(crate) fn record_pass(
    kind: PassKind,
    view: &PassView,
    scene: &Scene,
    context: &RenderContext,
    framebuffer: &Arc<dyn Framebuffer>,
    cmd: &mut dyn CommandList,
    scratch: &mut PassScratch,
) -> Result<PassStats> {
    scratch.clear();

    cmd.begin()?;
    if kind.is_shadow() {
        cmd.begin_render_pass(framebuffer, &SHADOW_CLEAR)?;
        cmd.set_viewport(Viewport::full(framebuffer.width(), framebuffer.height()))?;
    } else {
        cmd.begin_render_pass(framebuffer, &MAIN_CLEAR)?;
        cmd.set_viewport(*context.camera.viewport())?;
        cmd.set_scissor(context.camera.effective_scissor())?;
    }
    cmd.push_constants(0, bytemuck::bytes_of(&view.view_projection))?;

    scene.get_contained_renderables(&view.frustum, &mut scratch.visible);
    scratch.queue.add_range(scene, &scratch.visible, view.viewer_position, view.far_distance);
    scratch.queue.sort();

    let mut drawn = 0;
    for &pass in kind.render_passes() {
        scratch.draw_list.clear();
        scratch.draw_list.extend(scratch.queue.iter_back_to_front().filter(|&key| {
            scene
                .object(key)
                .is_some_and(|object| object.render_passes().contains(pass))
        }));

        let ctx = DrawContext {
            pass,
            view_projection: view.view_projection,
            viewer_position: view.viewer_position,
            camera: &context.camera,
            light: &context.light,
        };
        for &key in &scratch.draw_list {
            if let Some(object) = scene.object(key) {
                object.render(cmd, &ctx)?;
                drawn += 1;
            }
        }
    }

    cmd.end_render_pass()?;

    Ok(PassStats {
        visible: scratch.visible.len(),
        drawn,
    })
}
