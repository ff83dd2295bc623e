/// Mock graphics device for unit tests (no GPU required)
///
/// Every command recorded by a mock command list is appended to a journal
/// shared with the device, prefixed with the list name
/// (e.g. `"main:draw"`). Submissions and presents are journaled too.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use crate::error::{Error, Result};
use crate::graphics_device::{
    CommandList, Framebuffer, GraphicsDevice, ClearValue, Rect2D, Viewport,
};

pub type Journal = Arc<Mutex<Vec<String>>>;

// ============================================================================
// Mock Framebuffer
// ============================================================================

#[derive(Debug)]
pub struct MockFramebuffer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub sample_count: u32,
}

impl MockFramebuffer {
    pub fn new(name: &str, width: u32, height: u32) -> Arc<dyn Framebuffer> {
        Arc::new(Self { name: name.to_string(), width, height, sample_count: 1 })
    }

    pub fn multisampled(name: &str, width: u32, height: u32, samples: u32) -> Arc<dyn Framebuffer> {
        Arc::new(Self { name: name.to_string(), width, height, sample_count: samples })
    }
}

impl Framebuffer for MockFramebuffer {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn sample_count(&self) -> u32 {
        self.sample_count
    }
}

// ============================================================================
// Mock CommandList
// ============================================================================

pub struct MockCommandList {
    name: String,
    journal: Journal,
    recording: bool,
}

impl MockCommandList {
    pub fn new(name: &str, journal: Journal) -> Self {
        Self { name: name.to_string(), journal, recording: false }
    }

    fn record(&self, command: String) -> Result<()> {
        if !self.recording {
            return Err(Error::InvalidResource(format!(
                "{}: '{}' recorded outside begin/end", self.name, command
            )));
        }
        self.journal.lock().unwrap().push(format!("{}:{}", self.name, command));
        Ok(())
    }
}

impl CommandList for MockCommandList {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin(&mut self) -> Result<()> {
        self.recording = true;
        self.record("begin".to_string())
    }

    fn end(&mut self) -> Result<()> {
        self.record("end".to_string())?;
        self.recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        framebuffer: &Arc<dyn Framebuffer>,
        _clear_values: &[ClearValue],
    ) -> Result<()> {
        self.record(format!("begin_render_pass({})", framebuffer.name()))
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.record("end_render_pass".to_string())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.record(format!(
            "set_viewport({}, {}, {}x{})",
            viewport.x, viewport.y, viewport.width, viewport.height
        ))
    }

    fn set_scissor(&mut self, _scissor: Rect2D) -> Result<()> {
        self.record("set_scissor".to_string())
    }

    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        self.record(format!("push_constants({}, {})", offset, data.len()))
    }

    fn draw(&mut self, vertex_count: u32, _first_vertex: u32) -> Result<()> {
        self.record(format!("draw({})", vertex_count))
    }

    fn draw_indexed(&mut self, index_count: u32, _first_index: u32, _vertex_offset: i32) -> Result<()> {
        self.record(format!("draw_indexed({})", index_count))
    }

    fn resolve(
        &mut self,
        source: &Arc<dyn Framebuffer>,
        destination: &Arc<dyn Framebuffer>,
    ) -> Result<()> {
        self.record(format!("resolve({} -> {})", source.name(), destination.name()))
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

#[derive(Default)]
pub struct MockGraphicsDevice {
    journal: Journal,
    presents: AtomicUsize,
    fail_present: AtomicBool,
}

impl MockGraphicsDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of every journaled command.
    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    /// Journaled commands recorded by the list named `name` (prefix stripped).
    pub fn commands_of(&self, name: &str) -> Vec<String> {
        let prefix = format!("{}:", name);
        self.journal()
            .into_iter()
            .filter_map(|entry| entry.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn present_count(&self) -> usize {
        self.presents.load(Ordering::SeqCst)
    }

    pub fn set_fail_present(&self, fail: bool) {
        self.fail_present.store(fail, Ordering::SeqCst);
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_command_list(&self, name: &str) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(MockCommandList::new(name, self.journal.clone())))
    }

    fn submit(&self, command_lists: &[&dyn CommandList]) -> Result<()> {
        let names: Vec<&str> = command_lists.iter().map(|cl| cl.name()).collect();
        self.journal.lock().unwrap().push(format!("submit:{}", names.join(",")));
        Ok(())
    }

    fn present(&self) -> Result<()> {
        if self.fail_present.load(Ordering::SeqCst) {
            return Err(Error::BackendError("swapchain out of date".to_string()));
        }
        self.presents.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().unwrap().push("present".to_string());
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
