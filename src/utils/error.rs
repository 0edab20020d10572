//! Error types for the osrview host application

use thiserror::Error;

/// Main error type for osrview operations
#[derive(Debug, Error)]
pub enum OsrError {
    /// No suitable GPU adapter found
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    /// Failed to create the GPU device
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(String),
    /// Failed to create the rendering surface
    #[error("failed to create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    /// The swapchain is unusable and could not be recovered
    #[error("failed to acquire frame: {0}")]
    FrameAcquire(String),
    /// Window system error
    #[error("window system error: {0}")]
    Window(#[from] winit::error::OsError),
    /// Event loop error
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// The embedded engine failed to load its content
    #[error("engine load failure: {description} ({code}) for {url}")]
    EngineLoad {
        code: i32,
        description: String,
        url: String,
    },
}

/// Convenience Result type for osrview operations
pub type Result<T> = std::result::Result<T, OsrError>;
