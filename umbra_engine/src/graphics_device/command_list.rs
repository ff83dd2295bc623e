/// CommandList trait - records the commands of one pass

use std::sync::Arc;
use crate::error::Result;
use super::frame_buffer::Framebuffer;

/// Command list for recording rendering commands.
///
/// Each pass of a frame records into its own command list; lists are
/// submitted together via `GraphicsDevice::submit()`. A single list is only
/// ever touched by one thread at a time.
pub trait CommandList: Send + Sync {
    /// Debug label given at creation
    fn name(&self) -> &str;

    /// Begin recording commands
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Begin a render pass targeting `framebuffer`
    ///
    /// # Arguments
    ///
    /// * `framebuffer` - Color and/or depth attachments to render into
    /// * `clear_values` - Clear values for the attachments
    fn begin_render_pass(
        &mut self,
        framebuffer: &Arc<dyn Framebuffer>,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    /// Set the viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Set the scissor rectangle
    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    /// Push constants to the bound pipeline
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset in bytes into the push constant range
    /// * `data` - Data to push
    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()>;

    /// Draw vertices
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    /// Draw indexed vertices
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Resolve a multisampled framebuffer into a single-sampled one.
    /// Must be recorded outside a render pass.
    fn resolve(
        &mut self,
        source: &Arc<dyn Framebuffer>,
        destination: &Arc<dyn Framebuffer>,
    ) -> Result<()>;
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-surface viewport with a `[0, 1]` depth range.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}
