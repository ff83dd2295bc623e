/// Framebuffer trait - render target attachments for one pass
///
/// Shadow cascades, the main color pass, the duplicator, and the swapchain
/// each render into their own framebuffer. Framebuffers are allocated by the
/// device layer and handed to the orchestrator through the render context.

/// Framebuffer - color and/or depth attachments a pass renders into
pub trait Framebuffer: Send + Sync {
    /// Debug label
    fn name(&self) -> &str;

    /// Width in pixels
    fn width(&self) -> u32;

    /// Height in pixels
    fn height(&self) -> u32;

    /// MSAA sample count of the color attachment (1 = single-sampled)
    fn sample_count(&self) -> u32 {
        1
    }
}
