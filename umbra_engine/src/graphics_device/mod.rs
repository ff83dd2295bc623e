/// Graphics device module - the device-layer contracts the core renders through

mod graphics_device;
mod command_list;
mod frame_buffer;

pub use graphics_device::GraphicsDevice;
pub use command_list::{CommandList, Viewport, Rect2D, ClearValue};
pub use frame_buffer::Framebuffer;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
