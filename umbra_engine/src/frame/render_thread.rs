/// Render thread - the long-lived worker behind FrameOrchestrator.
///
/// Loop: wait for a command; on `Frame`, fan out the four passes on scoped
/// threads, join them, end and submit their lists, signal completion, then
/// run the post phase (resolve, duplicator, swapchain blit, present) while
/// the caller moves on. On `Shutdown`, wait for the device, free the
/// command lists, and acknowledge.
///
/// A recording error leaves command lists begun but never submitted; the
/// thread reports the error and then stops, as it does after a panic.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use crossbeam_channel::{Receiver, Sender};
use crate::camera::{Camera, DirectionalLight};
use crate::error::{Error, Result};
use crate::graphics_device::{ClearValue, CommandList, Framebuffer, GraphicsDevice, Viewport};
use crate::scene::{DrawContext, RenderPasses, Scene, SceneObject};
use crate::{engine_debug, engine_err, engine_error};
use super::cascade::{compute_cascades, CascadeConfig};
use super::frame_orchestrator::{FrameState, FrameStats};
use super::pass::{record_pass, PassKind, PassScratch, PassStats, PassView, PASS_COUNT};
use super::render_context::{FrameTargets, RenderContext};

const SOURCE: &str = "umbra::FrameOrchestrator";

/// Shared and locked per frame; see `FrameOrchestrator::submit`.
pub(crate) struct FrameRequest {
    pub(crate) scene: Arc<RwLock<Scene>>,
    pub(crate) context: Arc<RwLock<RenderContext>>,
}

pub(crate) enum RenderCommand {
    Frame(FrameRequest),
    Shutdown,
}

/// State visible to both the caller and the render thread.
pub(crate) struct SharedState {
    state: AtomicU8,
    pub(crate) in_flight: AtomicBool,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(FrameState::Idle as u8),
            in_flight: AtomicBool::new(false),
        }
    }

    pub(crate) fn state(&self) -> FrameState {
        FrameState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: FrameState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Data the post phase needs once the scene and context locks are released.
struct PostFrame {
    camera: Camera,
    light: DirectionalLight,
    targets: FrameTargets,
}

impl PostFrame {
    fn draw_context(&self, pass: RenderPasses) -> DrawContext<'_> {
        DrawContext {
            pass,
            view_projection: self.camera.view_projection_matrix(),
            viewer_position: self.camera.position(),
            camera: &self.camera,
            light: &self.light,
        }
    }
}

/// Everything the render thread owns.
pub(crate) struct RenderWorker {
    device: Arc<dyn GraphicsDevice>,
    cascade_config: CascadeConfig,
    shared: Arc<SharedState>,
    pass_lists: [Box<dyn CommandList>; PASS_COUNT],
    post_list: Box<dyn CommandList>,
    scratch: [PassScratch; PASS_COUNT],
    /// Free objects drawn by the post phase, held for one frame only
    duplicator_objects: Vec<SceneObject>,
    swapchain_objects: Vec<SceneObject>,
    frame_index: u64,
    /// Post-phase failure of the previous frame
    previous_frame_error: Option<Error>,
    /// Set while command lists are begun and not yet submitted
    lists_open: bool,
}

impl RenderWorker {
    /// Allocate the command lists on the calling thread so failures surface
    /// from `FrameOrchestrator::new`.
    pub(crate) fn new(
        device: Arc<dyn GraphicsDevice>,
        cascade_config: CascadeConfig,
        shared: Arc<SharedState>,
    ) -> Result<Self> {
        let pass_lists = [
            device.create_command_list(PassKind::ShadowNear.name())?,
            device.create_command_list(PassKind::ShadowMid.name())?,
            device.create_command_list(PassKind::ShadowFar.name())?,
            device.create_command_list(PassKind::Main.name())?,
        ];
        let post_list = device.create_command_list("post")?;

        Ok(Self {
            device,
            cascade_config,
            shared,
            pass_lists,
            post_list,
            scratch: Default::default(),
            duplicator_objects: Vec::new(),
            swapchain_objects: Vec::new(),
            frame_index: 0,
            previous_frame_error: None,
            lists_open: false,
        })
    }

    /// Thread body.
    pub(crate) fn run(
        mut self,
        commands: Receiver<RenderCommand>,
        completion: Sender<Result<FrameStats>>,
        shutdown_ack: Sender<()>,
    ) {
        engine_debug!(SOURCE, "Render thread started");

        while let Ok(command) = commands.recv() {
            match command {
                RenderCommand::Frame(request) => {
                    if !self.run_frame(&request, &completion) {
                        break;
                    }
                }
                RenderCommand::Shutdown => break,
            }
        }

        if let Err(e) = self.device.wait_idle() {
            engine_error!(SOURCE, "wait_idle failed during shutdown: {}", e);
        }
        drop(self);

        engine_debug!(SOURCE, "Render thread stopped");
        let _ = shutdown_ack.send(());
    }

    /// Returns `false` if the command lists are torn and the thread must stop.
    fn run_frame(&mut self, request: &FrameRequest, completion: &Sender<Result<FrameStats>>) -> bool {
        self.shared.set_state(FrameState::Running);

        let outcome = self.render_frame(request);
        let (result, post) = match outcome {
            Ok((mut stats, post)) => {
                stats.previous_frame_error = self.previous_frame_error.take();
                (Ok(stats), Some(post))
            }
            Err(e) => (Err(e), None),
        };
        self.frame_index += 1;

        // Caller may proceed from here; the post phase only touches
        // thread-owned state and cloned targets.
        self.shared.set_state(FrameState::Presenting);
        if completion.send(result).is_err() {
            engine_debug!(SOURCE, "Frame completion dropped by caller");
        }

        if let Some(post) = post {
            if let Err(e) = self.present(&post) {
                engine_error!(SOURCE, "Post phase of frame {} failed: {}", self.frame_index - 1, e);
                self.previous_frame_error = Some(e);
            }
        }
        self.duplicator_objects.clear();
        self.swapchain_objects.clear();

        self.shared.set_state(FrameState::Idle);

        if self.lists_open {
            engine_error!(SOURCE, "Command lists left mid-recording, stopping render thread");
            return false;
        }
        true
    }

    /// Passes + submission, under the scene and context read locks.
    fn render_frame(&mut self, request: &FrameRequest) -> Result<(FrameStats, PostFrame)> {
        let scene = request
            .scene
            .read()
            .map_err(|_| engine_err!(SOURCE, "Scene lock poisoned"))?;
        let context = request
            .context
            .read()
            .map_err(|_| engine_err!(SOURCE, "RenderContext lock poisoned"))?;
        let scene: &Scene = &scene;
        let context: &RenderContext = &context;
        let targets = &context.targets;

        if targets.needs_resolve() && targets.resolve.is_none() {
            return Err(Error::InvalidResource(format!(
                "'{}' is multisampled but no resolve target was given",
                targets.main.name()
            )));
        }

        let cascades = compute_cascades(&context.camera, &context.light, &self.cascade_config);
        let views = [
            PassView::from_cascade(&cascades[0]),
            PassView::from_cascade(&cascades[1]),
            PassView::from_cascade(&cascades[2]),
            PassView::from_camera(context),
        ];
        let framebuffers: [&Arc<dyn Framebuffer>; PASS_COUNT] = [
            &targets.shadow_maps[0],
            &targets.shadow_maps[1],
            &targets.shadow_maps[2],
            &targets.main,
        ];

        // Fan out: each pass owns its command list and scratch exclusively
        self.lists_open = true;
        let pass_results: Vec<Result<PassStats>> = thread::scope(|s| {
            let handles: Vec<_> = PassKind::ALL
                .iter()
                .zip(self.pass_lists.iter_mut())
                .zip(self.scratch.iter_mut())
                .map(|((&kind, list), scratch)| {
                    let view = &views[kind.index()];
                    let framebuffer = framebuffers[kind.index()];
                    s.spawn(move || {
                        record_pass(kind, view, scene, context, framebuffer, &mut **list, scratch)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        });

        let mut stats = FrameStats {
            frame_index: self.frame_index,
            passes: [PassStats::default(); PASS_COUNT],
            previous_frame_error: None,
        };
        for (slot, result) in stats.passes.iter_mut().zip(pass_results) {
            *slot = result?;
        }

        self.shared.set_state(FrameState::Submitting);
        for list in self.pass_lists.iter_mut() {
            list.end()?;
        }
        let lists: [&dyn CommandList; PASS_COUNT] =
            std::array::from_fn(|i| &*self.pass_lists[i]);
        self.device.submit(&lists)?;
        self.lists_open = false;

        // Post-phase objects are taken from the free set while still locked
        for &key in scene.free_renderables() {
            let Some(object) = scene.object(key) else {
                continue;
            };
            let passes = object.render_passes();
            if passes.contains(RenderPasses::DUPLICATOR) {
                self.duplicator_objects.push(object.clone());
            }
            if passes.contains(RenderPasses::SWAPCHAIN_OUTPUT) {
                self.swapchain_objects.push(object.clone());
            }
        }

        let post = PostFrame {
            camera: context.camera.clone(),
            light: context.light,
            targets: context.targets.clone(),
        };
        Ok((stats, post))
    }

    /// Resolve, duplicator, swapchain blit, submit, present.
    fn present(&mut self, post: &PostFrame) -> Result<()> {
        let targets = &post.targets;
        self.lists_open = true;
        let list = &mut *self.post_list;
        list.begin()?;

        if targets.needs_resolve() {
            if let Some(resolve) = &targets.resolve {
                list.resolve(&targets.main, resolve)?;
            }
        }

        // Duplicator: same content into the left and right halves
        let duplicator = &targets.duplicator;
        list.begin_render_pass(duplicator, &[ClearValue::Color([0.0, 0.0, 0.0, 1.0])])?;
        let half_width = duplicator.width() / 2;
        let halves = [(0, half_width), (half_width, duplicator.width() - half_width)];
        for (x, width) in halves {
            let mut viewport = Viewport::full(width, duplicator.height());
            viewport.x = x as f32;
            list.set_viewport(viewport)?;
            let ctx = post.draw_context(RenderPasses::DUPLICATOR);
            for object in &self.duplicator_objects {
                object.render(list, &ctx)?;
            }
        }
        list.end_render_pass()?;

        let swapchain = &targets.swapchain;
        list.begin_render_pass(swapchain, &[ClearValue::Color([0.0, 0.0, 0.0, 1.0])])?;
        list.set_viewport(Viewport::full(swapchain.width(), swapchain.height()))?;
        let ctx = post.draw_context(RenderPasses::SWAPCHAIN_OUTPUT);
        for object in &self.swapchain_objects {
            object.render(list, &ctx)?;
        }
        list.end_render_pass()?;

        list.end()?;
        self.device.submit(&[&*list])?;
        self.lists_open = false;
        self.device.present()
    }
}
