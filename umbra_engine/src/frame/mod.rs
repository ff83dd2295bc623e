//! Frame module - per-frame orchestration on a dedicated render thread.
//!
//! Three shadow cascades and the main view are recorded concurrently into
//! their own command lists, submitted together, then resolved, duplicated,
//! and presented.

mod cascade;
mod frame_orchestrator;
mod pass;
mod render_context;
mod render_thread;

pub use cascade::{cascade_splits, compute_cascades, CascadeConfig, ShadowCascade, CASCADE_COUNT};
pub use frame_orchestrator::{
    FrameOrchestrator, FrameState, FrameStats, OrchestratorConfig, PendingFrame,
};
pub use pass::{PassKind, PassStats, PassView, PASS_COUNT};
pub use render_context::{FrameTargets, RenderContext};
