/*!
# Umbra Engine

Frame orchestration core for a real-time 3D renderer.

The crate holds the CPU side of a frame: a scene that keeps renderable
objects in a dynamic octree, a sortable render queue, and a frame
orchestrator that records three shadow cascades and the main view
concurrently on a dedicated render thread. GPU work goes through the
`GraphicsDevice` / `CommandList` traits so a backend can be plugged in.

## Architecture

- **Scene**: culled (octree-indexed) and free renderables, change notifications
- **Octree**: dynamic spatial index with frustum and box queries
- **RenderQueue**: radix-sorted draw order (material, then distance)
- **FrameOrchestrator**: render thread, four concurrent passes, present
- **Camera / DirectionalLight**: passive per-frame inputs
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod camera;
pub mod graphics_device;
pub mod scene;
pub mod render_queue;
pub mod frame;

// Main umbra namespace module
pub mod umbra {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine services (global logger)
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod graphics_device {
        pub use crate::graphics_device::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod render_queue {
        pub use crate::render_queue::*;
    }

    pub mod frame {
        pub use crate::frame::*;
    }
}

// Re-export math library at crate root
pub use glam;
