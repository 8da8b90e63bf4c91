//! Engine error type. Fallible public operations return
//! [`EngineError`]; registry mutators with handle arguments stay
//! infallible and no-op on invalid handles instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load model: {0}")]
    ModelLoad(#[from] tobj::LoadError),

    #[error("model file contains no geometry")]
    EmptyModel,

    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to acquire GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
