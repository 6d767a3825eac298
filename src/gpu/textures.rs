//! State textures on the device.

use std::sync::mpsc;

use wgpu::util::DeviceExt;

use crate::error::GpuError;
use crate::layout::StateLayout;
use crate::state::{InitialState, ParticleRecord, PingPong, StateTexels};

/// Texel format of every state texture: `xyz = position`, `w = aux`.
pub const STATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

const BYTES_PER_TEXEL: u32 = std::mem::size_of::<ParticleRecord>() as u32;

/// One `S x S` state texture and its view.
pub struct StateTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl StateTexture {
    fn new(device: &wgpu::Device, layout: StateLayout, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(layout),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: STATE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    fn write(&self, queue: &wgpu::Queue, texels: &StateTexels) {
        let layout = texels.layout();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            texels.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(layout.side() * BYTES_PER_TEXEL),
                rows_per_image: Some(layout.side()),
            },
            extent(layout),
        );
    }
}

/// The ping-pong pair, the anchor texture and the per-particle size factors.
pub struct GpuStateTextures {
    layout: StateLayout,
    pub pair: PingPong<StateTexture>,
    pub base: StateTexture,
    pub size_factors: wgpu::Buffer,
}

impl GpuStateTextures {
    /// Allocate and fill every texture from `state`.
    ///
    /// Fails if the texture side exceeds `max_side`.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        state: &InitialState,
        max_side: u32,
    ) -> Result<Self, GpuError> {
        let layout = state.layout;
        if layout.side() > max_side {
            return Err(GpuError::TextureTooLarge {
                side: layout.side(),
                max: max_side,
            });
        }

        let first = StateTexture::new(device, layout, "State Texture A");
        let second = StateTexture::new(device, layout, "State Texture B");
        let base = StateTexture::new(device, layout, "Base Texture");
        first.write(queue, &state.textures.0);
        second.write(queue, &state.textures.1);
        base.write(queue, &state.base);

        let size_factors = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Size Factor Buffer"),
            contents: bytemuck::cast_slice(&state.size_factors),
            usage: wgpu::BufferUsages::STORAGE,
        });

        Ok(Self {
            layout,
            pair: PingPong::new(first, second),
            base,
            size_factors,
        })
    }

    #[inline]
    pub fn layout(&self) -> StateLayout {
        self.layout
    }

    /// Copy the current state texture back to the host.
    ///
    /// Blocks until the GPU has finished all submitted work.
    pub fn read_current(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<StateTexels, GpuError> {
        let side = self.layout.side();
        let unpadded_row = side * BYTES_PER_TEXEL;
        let padded_row = padded_bytes_per_row(unpadded_row);

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("State Readback Buffer"),
            size: padded_row as u64 * side as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("State Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.pair.current().texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(side),
                },
            },
            extent(self.layout),
        );
        queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;

        let texels = {
            let data = slice.get_mapped_range();
            let mut texels = Vec::with_capacity(self.layout.texel_count());
            for row in data.chunks_exact(padded_row as usize) {
                let row: &[ParticleRecord] =
                    bytemuck::cast_slice(&row[..unpadded_row as usize]);
                texels.extend_from_slice(row);
            }
            texels
        };
        staging.unmap();

        StateTexels::from_texels(self.layout, texels)
            .ok_or_else(|| GpuError::BufferMapping("readback size mismatch".into()))
    }
}

/// Row pitch for texture-to-buffer copies.
pub fn padded_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

fn extent(layout: StateLayout) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: layout.side(),
        height: layout.side(),
        depth_or_array_layers: 1,
    }
}
