//! Error types for the point cloud.
//!
//! Construction failures ([`CloudError`], [`GpuError`]) are fatal: no cloud
//! exists afterwards. Per-frame failures ([`FrameError`]) only ever cost the
//! frame they happened in.

use std::fmt;

/// Errors that can occur while setting up the GPU.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// Failed to map buffer for reading.
    BufferMapping(String),
    /// The state texture would exceed the device's texture size limit.
    TextureTooLarge { side: u32, max: u32 },
    /// The device reported a validation or out-of-memory error.
    Validation(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::BufferMapping(msg) => write!(f, "Failed to map GPU buffer: {}", msg),
            GpuError::TextureTooLarge { side, max } => write!(
                f,
                "State texture of side {} exceeds the device limit of {}",
                side, max
            ),
            GpuError::Validation(msg) => write!(f, "GPU validation failed: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that prevent a point cloud from being built or run.
#[derive(Debug)]
pub enum CloudError {
    /// The base geometry has no points.
    EmptyGeometry,
    /// A configuration value cannot be used.
    InvalidConfig(String),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
}

impl fmt::Display for CloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudError::EmptyGeometry => write!(f, "Base geometry must contain at least one point"),
            CloudError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            CloudError::Gpu(e) => write!(f, "GPU error: {}", e),
            CloudError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            CloudError::Window(e) => write!(f, "Failed to create window: {}", e),
        }
    }
}

impl std::error::Error for CloudError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CloudError::EmptyGeometry | CloudError::InvalidConfig(_) => None,
            CloudError::Gpu(e) => Some(e),
            CloudError::EventLoop(e) => Some(e),
            CloudError::Window(e) => Some(e),
        }
    }
}

impl From<GpuError> for CloudError {
    fn from(e: GpuError) -> Self {
        CloudError::Gpu(e)
    }
}

impl From<winit::error::EventLoopError> for CloudError {
    fn from(e: winit::error::EventLoopError) -> Self {
        CloudError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for CloudError {
    fn from(e: winit::error::OsError) -> Self {
        CloudError::Window(e)
    }
}

/// A failure confined to one frame. The frame is skipped and the next tick
/// tries again.
#[derive(Debug)]
pub enum FrameError {
    /// Acquiring the presentation surface failed.
    Surface(wgpu::SurfaceError),
    /// The compute or render work could not be issued.
    Dispatch(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Surface(e) => write!(f, "Surface unavailable: {}", e),
            FrameError::Dispatch(msg) => write!(f, "Dispatch failed: {}", msg),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Surface(e) => Some(e),
            FrameError::Dispatch(_) => None,
        }
    }
}

impl From<wgpu::SurfaceError> for FrameError {
    fn from(e: wgpu::SurfaceError) -> Self {
        FrameError::Surface(e)
    }
}
