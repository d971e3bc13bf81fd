use thiserror::Error;

/// Errors raised while setting up or driving the GPU.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create rendering surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    AdapterNotFound(String),

    #[error("failed to acquire GPU device: {0}")]
    DeviceRequest(String),

    #[error("shader compilation failed: {0}")]
    ShaderCompileFailed(String),

    #[error("GPU resource exhausted: {0}")]
    GpuResourceExhausted(String),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

pub type RenderResult<T> = Result<T, RenderError>;
