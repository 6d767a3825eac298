//! The state advance on the GPU.

use wgpu::util::DeviceExt;

use crate::backend::StepInput;
use crate::shader::{self, SimUniforms, WORKGROUP_SIZE};

use super::textures::{GpuStateTextures, STATE_FORMAT};

/// Compute pipeline plus one bind group per ping-pong direction.
///
/// `bind_groups[i]` reads slot `i` and writes slot `1 - i`.
pub struct ComputePass {
    pipeline: wgpu::ComputePipeline,
    uniform_buffer: wgpu::Buffer,
    bind_groups: [wgpu::BindGroup; 2],
    count: u32,
    side: u32,
}

impl ComputePass {
    pub fn new(device: &wgpu::Device, textures: &GpuStateTextures) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("State Advance Shader"),
            source: wgpu::ShaderSource::Wgsl(shader::compute_shader().into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sim Uniform Buffer"),
            contents: bytemuck::bytes_of(&SimUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let read_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("State Advance Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                read_entry(1),
                read_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: STATE_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = |read: usize, write: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("State Advance Bind Group"),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&textures.pair.slot(read).view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&textures.base.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&textures.pair.slot(write).view),
                    },
                ],
            })
        };
        let bind_groups = [bind_group(0, 1), bind_group(1, 0)];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("State Advance Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("State Advance Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let layout = textures.layout();
        Self {
            pipeline,
            uniform_buffer,
            bind_groups,
            count: layout.count(),
            side: layout.side(),
        }
    }

    /// Record one advance reading slot `current`.
    pub fn encode(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        current: usize,
        step: &StepInput,
    ) {
        let uniforms = SimUniforms {
            time: step.time,
            delta_time: step.delta,
            influence: step.params.flow_field_influence,
            strength: step.params.flow_field_strength,
            frequency: step.params.flow_field_frequency,
            count: self.count,
            side: self.side,
            _pad: 0,
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("State Advance Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_groups[current], &[]);
        let groups = self.side.div_ceil(WORKGROUP_SIZE);
        pass.dispatch_workgroups(groups, groups, 1);
    }
}
