/// GraphicsDevice trait - the device/resource layer consumed by the core

use crate::error::Result;
use super::command_list::CommandList;

/// Device layer: allocates command lists, submits them, and presents.
///
/// Submission happens from one thread at a time (the render thread); the
/// device is not required to be globally thread-safe beyond `Send + Sync`
/// for shared ownership.
pub trait GraphicsDevice: Send + Sync {
    /// Allocate a command list with a debug label
    fn create_command_list(&self, name: &str) -> Result<Box<dyn CommandList>>;

    /// Submit recorded command lists, in order
    fn submit(&self, command_lists: &[&dyn CommandList]) -> Result<()>;

    /// Present the swapchain (may block on vsync)
    fn present(&self) -> Result<()>;

    /// Wait until the GPU is idle
    fn wait_idle(&self) -> Result<()>;
}
