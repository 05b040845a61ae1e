//! Triangle-mesh rendering pass with depth testing.
//!
//! [`MeshPass`] owns the surface-shading pipeline, the camera and model
//! uniform buffers, and the depth buffer. It renders a batch of
//! [`MeshDraw`]s: each entry is synced to the GPU, shaded in view space with
//! its material parameters, and, if the mesh has a bounds overlay attached,
//! followed by a wireframe draw delegated to the [`LinePass`].
//!
//! # Architecture
//!
//! Two bind groups:
//! - **Group 0**: camera uniforms (view and projection matrices, zoom scale)
//! - **Group 1**: model uniforms (model matrix, view-space normal matrix,
//!   color, roughness, metallic)
//!
//! Normals are transformed straight into view space with the inverse
//! transpose of `view * model`, so lighting never needs the camera position.
//!
//! # Depth buffer
//!
//! The pass maintains its own depth buffer sized to the surface. Call
//! [`MeshPass::ensure_depth_size`] before rendering if the window may have
//! been resized, and attach [`MeshPass::depth_view`] to the render pass.

use glam::Vec3;

use crate::camera::Camera;
use crate::gpu::GpuContext;
use crate::line_pass::LinePass;
use crate::mesh::{Mesh, MeshVertex};

/// Per-frame camera uniforms (group 0).
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    /// View matrix (world to camera space).
    pub view: [[f32; 4]; 4],
    /// Projection matrix (camera to clip space).
    pub proj: [[f32; 4]; 4],
    /// Accumulated camera zoom factor, for scale-aware shading.
    pub world_scale: f32,
    pub _pad: [f32; 3],
}

/// Per-draw model uniforms (group 1).
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    /// Model matrix (object to world space).
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `view * model`, carrying normals to view space.
    pub normal_matrix: [[f32; 4]; 4],
    /// RGBA surface color.
    pub color: [f32; 4],
    /// Surface roughness in [0, 1].
    pub roughness: f32,
    /// Metallic factor in [0, 1].
    pub metallic: f32,
    pub _pad: [f32; 2],
}

/// One mesh queued for rendering, with its material parameters.
pub struct MeshDraw<'a> {
    /// The mesh to render. Mutable so the pass can sync buffers and
    /// reposition the bounds overlay.
    pub mesh: &'a mut Mesh,
    /// RGBA surface color.
    pub color: [f32; 4],
    /// Surface roughness in [0, 1].
    pub roughness: f32,
    /// Metallic factor in [0, 1].
    pub metallic: f32,
}

impl<'a> MeshDraw<'a> {
    /// A draw with default material response (roughness 0.5, dielectric).
    pub fn new(mesh: &'a mut Mesh, color: [f32; 4]) -> Self {
        Self {
            mesh,
            color,
            roughness: 0.5,
            metallic: 0.0,
        }
    }
}

/// Handles triangle-mesh rendering with depth testing.
pub struct MeshPass {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl MeshPass {
    /// Creates the pipeline, uniform buffers, and a depth buffer sized to
    /// the current surface.
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mesh Camera Uniforms"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Mesh Camera Bind Group Layout"),
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
            label: Some("Mesh Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let model_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Model Uniforms"),
            size: std::mem::size_of::<ModelUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let model_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Model Bind Group Layout"),
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

        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout: &model_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &model_bind_group_layout],
            push_constant_ranges: &[],
        });

        let (depth_texture, depth_view) = Self::create_depth_texture(gpu);

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[MeshVertex::LAYOUT],
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
                topology: wgpu::PrimitiveTopology::TriangleList,
                // generators wind faces clockwise
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Cw,
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
            model_buffer,
            model_bind_group,
            depth_texture,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
        }
    }

    fn create_depth_texture(gpu: &GpuContext) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// View into the depth texture for the render pass depth attachment.
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Recreates the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            let (texture, view) = Self::create_depth_texture(gpu);
            self.depth_texture = texture;
            self.depth_view = view;
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// Renders a batch of meshes, bounds overlays included.
    ///
    /// Camera uniforms are written once; each draw then syncs its mesh,
    /// writes model uniforms, and issues an indexed draw. A mesh with a
    /// bounds overlay gets the overlay re-centered on the current bounding
    /// box (in the mesh's world position) and drawn through `line_pass`,
    /// after which the mesh pipeline is restored for the next entry.
    pub fn render(
        &self,
        gpu: &GpuContext,
        render_pass: &mut wgpu::RenderPass,
        camera: &Camera,
        line_pass: &LinePass,
        draws: &mut [MeshDraw],
    ) {
        if draws.is_empty() {
            return;
        }

        let view = camera.view_matrix();
        let proj = camera.projection_matrix();

        let camera_uniforms = CameraUniforms {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            world_scale: camera.scaling().x,
            _pad: [0.0; 3],
        };
        gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera_uniforms]),
        );

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

        for draw in draws {
            draw.mesh.sync(gpu);
            let Some(buffers) = draw.mesh.gpu_buffers() else {
                continue;
            };

            let model = draw.mesh.transform().matrix();
            let normal_matrix = (view * model).inverse().transpose();

            let model_uniforms = ModelUniforms {
                model: model.to_cols_array_2d(),
                normal_matrix: normal_matrix.to_cols_array_2d(),
                color: draw.color,
                roughness: draw.roughness,
                metallic: draw.metallic,
                _pad: [0.0; 2],
            };
            gpu.queue.write_buffer(
                &self.model_buffer,
                0,
                bytemuck::cast_slice(&[model_uniforms]),
            );

            render_pass.set_bind_group(1, &self.model_bind_group, &[]);
            render_pass.set_vertex_buffer(0, buffers.vertex.slice(..));
            render_pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..draw.mesh.index_count(), 0, 0..1);

            // bounds overlay follows the box center, not the mesh origin
            let mesh_position = draw.mesh.transform().position();
            let bounds_position: Vec3 = draw.mesh.transform().bounds().position();
            if let Some(overlay) = draw.mesh.bounds_overlay_mut() {
                overlay.transform_mut().reset();
                overlay
                    .transform_mut()
                    .translate(bounds_position + mesh_position);
                line_pass.draw(gpu, render_pass, camera, overlay, false);

                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            }
        }
    }
}
