//! GPU backend: state textures, compute advance and sprite rendering on wgpu.

mod compute;
mod context;
mod sprites;
mod textures;

pub use compute::ComputePass;
pub use context::{ErrorSink, GpuContext, SurfaceTarget};
pub use sprites::{SpriteRenderer, DEPTH_FORMAT};
pub use textures::{padded_bytes_per_row, GpuStateTextures, StateTexture, STATE_FORMAT};

use glam::UVec2;
use log::{debug, error};

use crate::backend::{CloudBackend, FrameInput, StepInput};
use crate::config::CloudConfig;
use crate::error::{CloudError, FrameError, GpuError};
use crate::state::{InitialState, StateTexels};
use crate::viewport::Viewport;

/// Colour format of offscreen frames.
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Where frames are drawn.
pub enum FrameTarget {
    /// A window surface; frames are presented.
    Surface(SurfaceTarget),
    /// A private texture, for headless runs.
    Offscreen {
        texture: wgpu::Texture,
        view: wgpu::TextureView,
    },
}

impl FrameTarget {
    pub fn offscreen(device: &wgpu::Device, size: (u32, u32)) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Frame"),
            size: wgpu::Extent3d {
                width: size.0.max(1),
                height: size.1.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        FrameTarget::Offscreen { texture, view }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        match self {
            FrameTarget::Surface(target) => target.config.format,
            FrameTarget::Offscreen { texture, .. } => texture.format(),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        match self {
            FrameTarget::Surface(target) => (target.config.width, target.config.height),
            FrameTarget::Offscreen { texture, .. } => (texture.width(), texture.height()),
        }
    }
}

struct Pipelines {
    textures: GpuStateTextures,
    compute: ComputePass,
    sprites: SpriteRenderer,
}

/// [`CloudBackend`] running on the GPU.
pub struct GpuBackend {
    context: GpuContext,
    target: FrameTarget,
    particle_color: [f32; 3],
    clear_color: [f32; 4],
    pipelines: Option<Pipelines>,
    viewport: Option<Viewport>,
    window_size: Option<UVec2>,
}

/// Extent a presentation surface is configured at.
///
/// The window's physical size when known, so the surface always matches the
/// window even when the pixel ratio is capped; the viewport's framebuffer
/// size otherwise.
pub fn surface_extent(viewport: Viewport, window_size: Option<UVec2>) -> UVec2 {
    window_size
        .map(|size| size.max(UVec2::ONE))
        .unwrap_or_else(|| viewport.framebuffer_size())
}

impl GpuBackend {
    pub fn new(context: GpuContext, target: FrameTarget, config: &CloudConfig) -> Self {
        Self {
            context,
            target,
            particle_color: config.particle_color,
            clear_color: config.clear_color,
            pipelines: None,
            viewport: None,
            window_size: None,
        }
    }

    /// Physical size of the window the surface presents to. Takes effect at
    /// the next [`resize`](CloudBackend::resize).
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = Some(UVec2::new(width, height));
    }

    /// Backend drawing into an offscreen texture of `viewport`'s framebuffer
    /// size.
    pub fn headless(context: GpuContext, viewport: Viewport, config: &CloudConfig) -> Self {
        let size = viewport.framebuffer_size();
        let target = FrameTarget::offscreen(&context.device, (size.x, size.y));
        Self::new(context, target, config)
    }

    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    pub fn target(&self) -> &FrameTarget {
        &self.target
    }

    /// Slot of the current state texture, once uploaded.
    pub fn current_slot(&self) -> Option<usize> {
        self.pipelines
            .as_ref()
            .map(|p| p.textures.pair.current_index())
    }

    /// Copy the current state texture back to the host.
    pub fn read_state(&self) -> Result<StateTexels, GpuError> {
        let pipelines = self
            .pipelines
            .as_ref()
            .ok_or_else(|| GpuError::BufferMapping("no state uploaded".into()))?;
        let state = pipelines
            .textures
            .read_current(&self.context.device, &self.context.queue)?;
        match self.context.take_error() {
            Some(msg) => Err(GpuError::Validation(msg)),
            None => Ok(state),
        }
    }

    fn target_extent(&self, viewport: Viewport) -> UVec2 {
        match self.target {
            FrameTarget::Surface(_) => surface_extent(viewport, self.window_size),
            FrameTarget::Offscreen { .. } => viewport.framebuffer_size(),
        }
    }

    fn acquire_surface(target: &SurfaceTarget, device: &wgpu::Device) -> Result<wgpu::SurfaceTexture, FrameError> {
        match target.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                debug!("Surface {:?}, reconfiguring", e);
                target.reconfigure(device);
                Err(e.into())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("Out of memory acquiring the surface texture");
                Err(wgpu::SurfaceError::OutOfMemory.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl CloudBackend for GpuBackend {
    fn upload(&mut self, state: &InitialState) -> Result<(), CloudError> {
        let device = &self.context.device;
        let textures = GpuStateTextures::upload(
            device,
            &self.context.queue,
            state,
            self.context.max_texture_side(),
        )?;
        let compute = ComputePass::new(device, &textures);
        let sprites = SpriteRenderer::new(
            device,
            &textures,
            self.target.format(),
            self.target.size(),
            self.particle_color,
            self.clear_color,
        );
        if let Some(msg) = self.context.take_error() {
            return Err(GpuError::Validation(msg).into());
        }

        self.pipelines = Some(Pipelines {
            textures,
            compute,
            sprites,
        });
        Ok(())
    }

    fn advance(&mut self, step: &StepInput) -> Result<(), FrameError> {
        let pipelines = self
            .pipelines
            .as_mut()
            .ok_or_else(|| FrameError::Dispatch("advance before upload".into()))?;

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Advance Encoder"),
            });
        pipelines.compute.encode(
            &self.context.queue,
            &mut encoder,
            pipelines.textures.pair.current_index(),
            step,
        );
        self.context.queue.submit(std::iter::once(encoder.finish()));
        // The write target is not trusted after a device error; keep reading
        // the old slot.
        if let Some(msg) = self.context.take_error() {
            return Err(FrameError::Dispatch(msg));
        }
        pipelines.textures.pair.flip();
        Ok(())
    }

    fn render(&mut self, frame: &FrameInput) -> Result<(), FrameError> {
        let pipelines = self
            .pipelines
            .as_ref()
            .ok_or_else(|| FrameError::Dispatch("render before upload".into()))?;
        let device = &self.context.device;
        let current = pipelines.textures.pair.current_index();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        match &self.target {
            FrameTarget::Surface(target) => {
                let output = Self::acquire_surface(target, device)?;
                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                pipelines
                    .sprites
                    .encode(&self.context.queue, &mut encoder, &view, current, frame);
                self.context.queue.submit(std::iter::once(encoder.finish()));
                output.present();
            }
            FrameTarget::Offscreen { view, .. } => {
                pipelines
                    .sprites
                    .encode(&self.context.queue, &mut encoder, view, current, frame);
                self.context.queue.submit(std::iter::once(encoder.finish()));
            }
        }
        match self.context.take_error() {
            Some(msg) => Err(FrameError::Dispatch(msg)),
            None => Ok(()),
        }
    }

    fn resize(&mut self, viewport: Viewport) {
        let size = self.target_extent(viewport);
        if self.viewport == Some(viewport) && self.target.size() == (size.x, size.y) {
            return;
        }
        self.viewport = Some(viewport);

        let device = &self.context.device;
        match &mut self.target {
            FrameTarget::Surface(target) => target.resize(device, size.x, size.y),
            offscreen @ FrameTarget::Offscreen { .. } => {
                *offscreen = FrameTarget::offscreen(device, (size.x, size.y));
            }
        }
        if let Some(pipelines) = self.pipelines.as_mut() {
            pipelines.sprites.resize(device, (size.x, size.y));
        }
    }
}
