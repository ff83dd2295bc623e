/// FrameOrchestrator - drives the dedicated render thread.
///
/// One frame in flight: `submit` hands the scene and render context to the
/// render thread and returns a `PendingFrame`; the caller must consume it
/// (`wait`, or drop) before submitting again. Completion is signalled once
/// all four passes are recorded and submitted; the post phase (resolve,
/// duplicator, swapchain blit, present) continues on the render thread and
/// the next start signal is only accepted after it finishes.
///
/// State machine: `Idle → Running → Submitting → Presenting → Idle`.

use std::sync::atomic::Ordering;
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use crate::error::{Error, Result};
use crate::graphics_device::GraphicsDevice;
use crate::scene::Scene;
use crate::{engine_debug, engine_err, engine_error, engine_info};
use super::cascade::CascadeConfig;
use super::pass::{PassKind, PassStats, PASS_COUNT};
use super::render_context::RenderContext;
use super::render_thread::{FrameRequest, RenderCommand, RenderWorker, SharedState};

const SOURCE: &str = "umbra::FrameOrchestrator";

/// Orchestrator construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    pub cascades: CascadeConfig,
    /// Name of the render thread
    pub thread_name: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cascades: CascadeConfig::default(),
            thread_name: "umbra-render".to_string(),
        }
    }
}

/// Render thread state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameState {
    /// Waiting for a start signal
    Idle = 0,
    /// Passes recording concurrently
    Running = 1,
    /// Ending and submitting the pass command lists
    Submitting = 2,
    /// Completion signalled; post phase and present in progress
    Presenting = 3,
}

impl FrameState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => FrameState::Running,
            2 => FrameState::Submitting,
            3 => FrameState::Presenting,
            _ => FrameState::Idle,
        }
    }
}

/// Result of one frame's passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameStats {
    /// Zero-based index of the frame on this orchestrator
    pub frame_index: u64,
    /// Indexed by `PassKind::index()`
    pub passes: [PassStats; PASS_COUNT],
    /// Post-phase / present failure of the previous frame, if any
    pub previous_frame_error: Option<Error>,
}

impl FrameStats {
    pub fn pass(&self, kind: PassKind) -> &PassStats {
        &self.passes[kind.index()]
    }
}

/// Owns the render thread and its command lists.
pub struct FrameOrchestrator {
    device: Arc<dyn GraphicsDevice>,
    config: OrchestratorConfig,
    shared: Arc<SharedState>,
    /// Start signal (rendezvous: a send completes only when the render
    /// thread is waiting for its next frame)
    command_tx: Sender<RenderCommand>,
    completion_rx: Receiver<Result<FrameStats>>,
    shutdown_ack_rx: Receiver<()>,
    thread: Option<JoinHandle<()>>,
    disposed: bool,
}

impl FrameOrchestrator {
    /// Allocate the command lists and start the render thread.
    pub fn new(device: Arc<dyn GraphicsDevice>, config: OrchestratorConfig) -> Result<Self> {
        let shared = Arc::new(SharedState::new());
        let worker = RenderWorker::new(Arc::clone(&device), config.cascades, Arc::clone(&shared))?;

        let (command_tx, command_rx) = bounded::<RenderCommand>(0);
        let (completion_tx, completion_rx) = bounded::<Result<FrameStats>>(1);
        let (shutdown_ack_tx, shutdown_ack_rx) = bounded::<()>(1);

        let thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || worker.run(command_rx, completion_tx, shutdown_ack_tx))
            .map_err(|e| {
                engine_error!(SOURCE, "Failed to spawn render thread: {}", e);
                Error::InitializationFailed(format!("render thread: {}", e))
            })?;

        engine_info!(SOURCE, "Render thread '{}' spawned", config.thread_name);

        Ok(Self {
            device,
            config,
            shared,
            command_tx,
            completion_rx,
            shutdown_ack_rx,
            thread: Some(thread),
            disposed: false,
        })
    }

    /// Start a frame and return without waiting for it.
    ///
    /// Pending scene notifications are applied first (under the scene's
    /// write lock). Blocks while the previous frame's post phase is still
    /// presenting. Fails with `FrameInFlight` if the previous `PendingFrame`
    /// was not consumed.
    ///
    /// Neither lock may be held by the caller; the scene and context must
    /// not be mutated until the frame completes.
    pub fn submit(
        &self,
        scene: &Arc<RwLock<Scene>>,
        context: &Arc<RwLock<RenderContext>>,
    ) -> Result<PendingFrame<'_>> {
        if self.disposed {
            return Err(Error::Disposed);
        }
        if self
            .shared
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::FrameInFlight);
        }

        let started = self.start_frame(scene, context);
        if let Err(e) = started {
            self.shared.in_flight.store(false, Ordering::Release);
            return Err(e);
        }

        Ok(PendingFrame { orchestrator: self, consumed: false })
    }

    /// Start a frame and block until its passes are submitted.
    pub fn draw(
        &self,
        scene: &Arc<RwLock<Scene>>,
        context: &Arc<RwLock<RenderContext>>,
    ) -> Result<FrameStats> {
        self.submit(scene, context)?.wait()
    }

    /// Stop the render thread and free its command lists. Idempotent.
    ///
    /// Teardown happens at the thread's wait boundary: a frame that is
    /// presenting finishes first.
    pub fn destroy_device_resources(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        engine_info!(SOURCE, "Destroying render thread");

        // Wakes the thread out of its wait; fails only if it already died
        let _ = self.command_tx.send(RenderCommand::Shutdown);
        // A completion left behind by a forgotten PendingFrame is discarded
        while self.completion_rx.try_recv().is_ok() {}
        if self.shutdown_ack_rx.recv().is_err() {
            engine_debug!(SOURCE, "Render thread exited without acknowledging shutdown");
        }

        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                engine_error!(SOURCE, "Render thread panicked");
            }
        }

        self.shared.in_flight.store(false, Ordering::Release);
        self.shared.set_state(FrameState::Idle);
    }

    pub fn state(&self) -> FrameState {
        self.shared.state()
    }

    /// `true` while a submitted frame has not been consumed.
    pub fn is_frame_in_flight(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    fn start_frame(
        &self,
        scene: &Arc<RwLock<Scene>>,
        context: &Arc<RwLock<RenderContext>>,
    ) -> Result<()> {
        scene
            .write()
            .map_err(|_| engine_err!(SOURCE, "Scene lock poisoned"))?
            .process_notifications();

        let request = FrameRequest {
            scene: Arc::clone(scene),
            context: Arc::clone(context),
        };
        self.command_tx
            .send(RenderCommand::Frame(request))
            .map_err(|_| Error::RenderThreadTerminated)
    }

    fn finish_frame(&self, received: Option<Result<FrameStats>>) -> Result<FrameStats> {
        self.shared.in_flight.store(false, Ordering::Release);
        received.unwrap_or(Err(Error::RenderThreadTerminated))
    }
}

impl Drop for FrameOrchestrator {
    fn drop(&mut self) {
        self.destroy_device_resources();
    }
}

/// A submitted frame whose completion has not been consumed yet.
///
/// Dropping it waits for completion.
#[must_use = "a frame must be waited on before the next one is submitted"]
pub struct PendingFrame<'a> {
    orchestrator: &'a FrameOrchestrator,
    consumed: bool,
}

impl PendingFrame<'_> {
    /// Block until the frame's passes are submitted.
    pub fn wait(mut self) -> Result<FrameStats> {
        self.consumed = true;
        let received = self.orchestrator.completion_rx.recv().ok();
        self.orchestrator.finish_frame(received)
    }

    /// Non-blocking poll; `None` while the passes are still running.
    pub fn try_wait(&mut self) -> Option<Result<FrameStats>> {
        if self.consumed {
            return None;
        }
        let received = match self.orchestrator.completion_rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => None,
        };
        self.consumed = true;
        Some(self.orchestrator.finish_frame(received))
    }
}

impl Drop for PendingFrame<'_> {
    fn drop(&mut self) {
        if !self.consumed {
            let received = self.orchestrator.completion_rx.recv().ok();
            let _ = self.orchestrator.finish_frame(received);
        }
    }
}

#[cfg(test)]
#[path = "frame_orchestrator_tests.rs"]
mod tests;
