//! Line-list rendering pass for reference geometry.
//!
//! [`LinePass`] draws [`Empty`] primitives: grids, axes, bounds wireframes.
//! It shares the depth buffer with the mesh pass but runs its own pipeline
//! over [`LineVertex`] data with per-vertex color and no lighting.
//!
//! Two rendering modes per draw:
//!
//! - **world-space** (the default): vertices go through model, view, and
//!   projection, and line alpha fades with the camera's zoom factor so
//!   reference grids recede when zooming out;
//! - **screen-space** (`screen_space = true`): view and projection are
//!   skipped and the model matrix lands directly in clip space, which is
//!   how fixed HUD markers like the orientation gizmo are drawn.

use crate::camera::Camera;
use crate::empty::{Empty, LineVertex};
use crate::gpu::GpuContext;

/// Per-frame camera uniforms (group 0).
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineCameraUniforms {
    /// View matrix (world to camera space).
    pub view: [[f32; 4]; 4],
    /// Projection matrix (camera to clip space).
    pub proj: [[f32; 4]; 4],
    /// Accumulated camera zoom factor driving the alpha fade.
    pub world_scale: f32,
    pub _pad: [f32; 3],
}

/// Per-draw uniforms (group 1).
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineUniforms {
    /// Model matrix; in screen-space mode this is the full clip transform.
    pub model: [[f32; 4]; 4],
    /// Bit 0: skip view and projection.
    pub flags: u32,
    pub _pad: [u32; 3],
}

const FLAG_SCREEN_SPACE: u32 = 1;

/// Handles line-list rendering of [`Empty`] primitives.
pub struct LinePass {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    line_buffer: wgpu::Buffer,
    line_bind_group: wgpu::BindGroup,
}

impl LinePass {
    /// Creates the line pipeline and its uniform buffers.
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/line.wgsl").into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Line Camera Uniforms"),
            size: std::mem::size_of::<LineCameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Line Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Line Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let line_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Line Uniforms"),
            size: std::mem::size_of::<LineUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let line_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Line Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let line_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Line Bind Group"),
            layout: &line_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: line_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Line Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &line_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[LineVertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            camera_buffer,
            camera_bind_group,
            line_buffer,
            line_bind_group,
        }
    }

    /// Draws one line primitive.
    ///
    /// Syncs the primitive's vertex buffer, writes both uniform buffers,
    /// and issues the draw. With `screen_space` set, the camera matrices
    /// are bypassed and the primitive's model matrix maps directly to clip
    /// space.
    pub fn draw(
        &self,
        gpu: &GpuContext,
        render_pass: &mut wgpu::RenderPass,
        camera: &Camera,
        empty: &mut Empty,
        screen_space: bool,
    ) {
        empty.sync(gpu);
        let Some(buffer) = empty.gpu_buffer() else {
            return;
        };

        let camera_uniforms = LineCameraUniforms {
            view: camera.view_matrix().to_cols_array_2d(),
            proj: camera.projection_matrix().to_cols_array_2d(),
            world_scale: camera.scaling().x,
            _pad: [0.0; 3],
        };
        gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera_uniforms]),
        );

        let line_uniforms = LineUniforms {
            model: empty.transform().matrix().to_cols_array_2d(),
            flags: if screen_space { FLAG_SCREEN_SPACE } else { 0 },
            _pad: [0; 3],
        };
        gpu.queue
            .write_buffer(&self.line_buffer, 0, bytemuck::cast_slice(&[line_uniforms]));

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_bind_group(1, &self.line_bind_group, &[]);
        render_pass.set_vertex_buffer(0, buffer.slice(..));
        render_pass.draw(0..empty.vert_count() as u32, 0..1);
    }
}
