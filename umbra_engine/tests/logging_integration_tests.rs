//! Integration tests for engine logging
//!
//! Capture what the scene, the octree, and the render thread report through
//! a custom logger. No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests


use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, RwLock};
use umbra_engine::glam::Vec3;
use umbra_engine::umbra::frame::{FrameOrchestrator, OrchestratorConfig};
use umbra_engine::umbra::graphics_device::GraphicsDevice;
use umbra_engine::umbra::log::{LogEntry, LogSeverity, Logger};
use umbra_engine::umbra::scene::{CullRenderable, RenderPasses, Scene, SceneConfig, AABB};
use umbra_engine::umbra::Engine;
use serial_test::serial;
use test_utils::{camera_at, render_context, CountingDevice, TestBox};

// ============================================================================
// CAPTURING LOGGER
// ============================================================================

#[derive(Clone, Default)]
struct CapturingLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CapturingLogger {
    fn install() -> Self {
        let logger = Self::default();
        Engine::set_logger(logger.clone());
        logger
    }

    fn from_source(&self, source: &str) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.source == source)
            .cloned()
            .collect()
    }
}

impl Logger for CapturingLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn orchestrator(device: &Arc<CountingDevice>) -> FrameOrchestrator {
    let device: Arc<dyn GraphicsDevice> = device.clone();
    FrameOrchestrator::new(device, OrchestratorConfig::default()).unwrap()
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_render_thread_lifecycle_is_logged() {
    let logger = CapturingLogger::install();

    let device = CountingDevice::new();
    let mut orchestrator = orchestrator(&device);
    orchestrator.destroy_device_resources();

    let entries = logger.from_source("umbra::FrameOrchestrator");
    assert!(entries
        .iter()
        .any(|e| e.severity == LogSeverity::Info && e.message.contains("umbra-render")));
    assert!(entries
        .iter()
        .any(|e| e.severity == LogSeverity::Info && e.message.contains("Destroying")));

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_present_failure_logged_with_location() {
    let logger = CapturingLogger::install();

    let device = CountingDevice::new();
    device.fail_present.store(true, Ordering::SeqCst);
    let mut orchestrator = orchestrator(&device);
    let scene = Arc::new(RwLock::new(Scene::new(SceneConfig::default())));
    let context = render_context(camera_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO));
    orchestrator.draw(&scene, &context).unwrap();
    orchestrator.destroy_device_resources();

    let errors: Vec<LogEntry> = logger
        .from_source("umbra::FrameOrchestrator")
        .into_iter()
        .filter(|e| e.severity == LogSeverity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("surface lost"));
    assert!(errors[0].file.is_some());
    assert!(errors[0].line.is_some());

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_octree_overflow_is_logged() {
    let logger = CapturingLogger::install();

    let mut scene = Scene::new(SceneConfig {
        world_bounds: AABB::new(Vec3::splat(-10.0), Vec3::splat(10.0)),
        ..SceneConfig::default()
    });
    let outside: Arc<dyn CullRenderable> =
        TestBox::new(Vec3::splat(50.0), Vec3::splat(1.0), RenderPasses::STANDARD);
    scene.add_cull_renderables(&[outside]);

    let entries = logger.from_source("umbra::Octree");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Debug);
    assert!(entries[0].message.contains("overflow"));

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_reset_logger_stops_capture() {
    let logger = CapturingLogger::install();
    Engine::log(LogSeverity::Warn, "test::logging", "captured".to_string());

    Engine::reset_logger();
    Engine::log(LogSeverity::Warn, "test::logging", "not captured".to_string());

    let entries = logger.from_source("test::logging");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message, "captured");
}
