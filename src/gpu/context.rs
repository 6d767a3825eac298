//! Adapter, device and queue setup.

use std::sync::{Arc, Mutex};

use log::{error, info};
use winit::window::Window;

use crate::error::GpuError;

/// Device and queue shared by every GPU component.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
    errors: ErrorSink,
}

/// Holds the first device error reported since it was last taken.
///
/// Installed as the device's uncaptured-error handler so validation and
/// out-of-memory errors surface as values instead of panics.
#[derive(Debug, Clone, Default)]
pub struct ErrorSink {
    slot: Arc<Mutex<Option<String>>>,
}

impl ErrorSink {
    /// Record `message` unless an earlier error is still pending.
    pub fn record(&self, message: String) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.get_or_insert(message);
        }
    }

    pub fn take(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// A configured presentation surface.
pub struct SurfaceTarget {
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Context without a surface, for offscreen rendering and readback.
    pub async fn headless() -> Result<Self, GpuError> {
        let instance = new_instance();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        Self::from_adapter(&adapter).await
    }

    /// Context plus a surface for `window`, configured at `width x height`.
    pub async fn for_window(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<(Self, SurfaceTarget), GpuError> {
        let instance = new_instance();
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        let context = Self::from_adapter(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoAdapter)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&context.device, &config);

        Ok((context, SurfaceTarget { surface, config }))
    }

    async fn from_adapter(adapter: &wgpu::Adapter) -> Result<Self, GpuError> {
        let adapter_info = adapter.get_info();
        info!(
            "Using adapter {} ({:?}, {:?})",
            adapter_info.name, adapter_info.device_type, adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Point Cloud Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let errors = ErrorSink::default();
        let sink = errors.clone();
        device.on_uncaptured_error(Box::new(move |e| {
            error!("GPU uncaptured error: {}", e);
            sink.record(e.to_string());
        }));

        Ok(Self {
            device,
            queue,
            adapter_info,
            errors,
        })
    }

    /// Take the device error reported since the last call, if any.
    pub fn take_error(&self) -> Option<String> {
        self.errors.take()
    }

    /// Largest square texture side the device accepts.
    pub fn max_texture_side(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }
}

impl SurfaceTarget {
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(device, &self.config);
    }

    /// Reapply the current configuration after a lost or outdated surface.
    pub fn reconfigure(&self, device: &wgpu::Device) {
        self.surface.configure(device, &self.config);
    }
}

fn new_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    })
}
