//! Error types for the Umbra engine
//!
//! Covers device/backend failures, spatial index misuse, and the
//! render-thread protocol (one frame in flight, disposal).

use std::fmt;

/// Result type for Umbra engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Umbra engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (device, command list, swapchain)
    BackendError(String),

    /// Invalid resource (framebuffer, command list, renderable)
    InvalidResource(String),

    /// Initialization failed (render thread, device objects)
    InitializationFailed(String),

    /// Item is already stored in the spatial index
    DuplicateItem,

    /// A frame was started while the previous one was still in flight
    FrameInFlight,

    /// The render thread exited (panic inside a pass, or lost channel)
    RenderThreadTerminated,

    /// The orchestrator has already released its device resources
    Disposed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::DuplicateItem => write!(f, "Item already present in spatial index"),
            Error::FrameInFlight => write!(f, "A frame is already in flight"),
            Error::RenderThreadTerminated => write!(f, "Render thread terminated"),
            Error::Disposed => write!(f, "Device resources already destroyed"),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error and build an `Error::BackendError` from a formatted message.
///
/// # Example
///
/// ```ignore
/// return Err(engine_err!("umbra::Scene", "Scene lock poisoned"));
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::umbra::Error::BackendError(message)
    }};
}

/// Log an error and return early with `Error::BackendError`.
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
