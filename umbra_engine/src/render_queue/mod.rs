//! Render queue module
//!
//! Sort keys and the per-pass sorted draw list.

mod render_order_key;
mod render_queue;

pub use render_order_key::RenderOrderKey;
pub use render_queue::RenderQueue;
