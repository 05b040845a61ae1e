//! Non-mesh line primitives: segments, reference grids, wireframe boxes.
//!
//! An [`Empty`] renders as a line list rather than triangles. It carries the
//! same spatial state as a mesh (a [`Transform`] with bounds) and follows the
//! same CPU-then-[`sync`](Empty::sync) buffer discipline, but its vertices
//! are position plus per-vertex RGBA color and there is no index buffer or
//! shading step. Per-vertex color is also how the grid fades lines out: a
//! "dashed" grid line is just a line whose endpoints have zero alpha.

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::gpu::GpuContext;
use crate::transform::Transform;

/// A line-list vertex: position and RGBA color, 28 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    /// Vertex buffer layout: position (location 0), color (location 1).
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<LineVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

/// Which line primitive an [`Empty`] was built as.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EmptyKind {
    /// A single segment between two points.
    Line,
    /// A reference grid of interior lines in the XY plane.
    Grid {
        width: f32,
        height: f32,
        res_x: u32,
        res_y: u32,
        skip_offset: u32,
    },
    /// The twelve edges of an axis-aligned box.
    WireBox { dimensions: Vec3 },
}

/// A line-list primitive with its own transform and GPU vertex buffer.
pub struct Empty {
    kind: EmptyKind,
    color: [f32; 4],
    vertices: Vec<LineVertex>,
    transform: Transform,
    buffer: Option<wgpu::Buffer>,
    dirty: bool,
}

impl Empty {
    /// A single line segment from `a` to `b`.
    pub fn line(a: Vec3, b: Vec3, color: [f32; 4]) -> Self {
        let vertices = vec![
            LineVertex {
                position: a.to_array(),
                color,
            },
            LineVertex {
                position: b.to_array(),
                color,
            },
        ];
        Self::finish(EmptyKind::Line, color, vertices)
    }

    /// A reference grid in the XY plane.
    ///
    /// Only *interior* lines are generated: `res_x` vertical and `res_y`
    /// horizontal segments evenly spaced inside the extent, with no border.
    /// Every `skip_offset`-th line (phase-shifted by the parity of `res_x`
    /// on both axes) has its alpha zeroed, which fades out e.g. every line
    /// between labelled ticks. `skip_offset` is clamped to at least 1; with
    /// 1, every line is faded.
    pub fn grid(
        width: f32,
        height: f32,
        res_x: u32,
        res_y: u32,
        skip_offset: u32,
        color: [f32; 4],
    ) -> Self {
        let skip_offset = skip_offset.max(1);
        let kind = EmptyKind::Grid {
            width,
            height,
            res_x,
            res_y,
            skip_offset,
        };

        let mut vertices = Vec::with_capacity((res_x as usize + res_y as usize) * 2);
        let offset_x = width / (1 + res_x) as f32;
        let offset_y = height / (1 + res_y) as f32;
        let phase = res_x % 2;

        let mut x = -width / 2.0;
        for i in 0..res_x {
            x += offset_x;
            let mut line_color = color;
            if (i + phase) % skip_offset == 0 {
                line_color[3] = 0.0;
            }
            vertices.push(LineVertex {
                position: [x, -height / 2.0, 0.0],
                color: line_color,
            });
            vertices.push(LineVertex {
                position: [x, height / 2.0, 0.0],
                color: line_color,
            });
        }

        let mut y = -height / 2.0;
        for i in 0..res_y {
            y += offset_y;
            let mut line_color = color;
            if (i + phase) % skip_offset == 0 {
                line_color[3] = 0.0;
            }
            vertices.push(LineVertex {
                position: [-width / 2.0, y, 0.0],
                color: line_color,
            });
            vertices.push(LineVertex {
                position: [width / 2.0, y, 0.0],
                color: line_color,
            });
        }

        Self::finish(kind, color, vertices)
    }

    /// The twelve edges of an axis-aligned box centered at the origin.
    pub fn wire_box(dimensions: Vec3, color: [f32; 4]) -> Self {
        let kind = EmptyKind::WireBox { dimensions };
        let vertices = box_edges(dimensions, color);
        Self::finish(kind, color, vertices)
    }

    fn finish(kind: EmptyKind, color: [f32; 4], vertices: Vec<LineVertex>) -> Self {
        let mut empty = Self {
            kind,
            color,
            vertices,
            transform: Transform::new(),
            buffer: None,
            dirty: true,
        };
        empty.update_bounds();
        empty
    }

    /// Which primitive this is, with its construction parameters.
    pub fn kind(&self) -> EmptyKind {
        self.kind
    }

    /// The base color passed at construction (dash fading excluded).
    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Number of line-list vertices (two per segment).
    pub fn vert_count(&self) -> usize {
        self.vertices.len()
    }

    /// Raw vertex data.
    pub fn vertices(&self) -> &[LineVertex] {
        &self.vertices
    }

    /// The primitive's transform and derived bounds.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable transform access for placement.
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Moves a single vertex. Out-of-range indices are ignored silently.
    pub fn set_position(&mut self, index: usize, position: Vec3) {
        if index >= self.vertices.len() {
            return;
        }
        self.vertices[index].position = position.to_array();
        self.update_bounds();
        self.dirty = true;
    }

    /// Recolors a single vertex. Out-of-range indices are ignored silently.
    pub fn set_color(&mut self, index: usize, color: [f32; 4]) {
        if index >= self.vertices.len() {
            return;
        }
        self.vertices[index].color = color;
        self.dirty = true;
    }

    /// Rebuilds a wireframe box for new dimensions in place.
    ///
    /// Only meaningful for [`EmptyKind::WireBox`]; other kinds ignore the
    /// call.
    pub fn recompute_box(&mut self, dimensions: Vec3) {
        let EmptyKind::WireBox { dimensions: dims } = &mut self.kind else {
            return;
        };
        *dims = dimensions;
        self.vertices = box_edges(dimensions, self.color);
        self.update_bounds();
        self.dirty = true;
    }

    fn update_bounds(&mut self) {
        if self.vertices.is_empty() {
            return;
        }
        let mut lower = Vec3::MAX;
        let mut upper = Vec3::MIN;
        for v in &self.vertices {
            let p = Vec3::from(v.position);
            lower = lower.min(p);
            upper = upper.max(p);
        }
        self.transform.bounds_mut().calculate(lower, upper);
    }

    /// Uploads vertex data, allocating the buffer on first use.
    pub fn sync(&mut self, gpu: &GpuContext) {
        if self.vertices.is_empty() {
            return;
        }

        match &self.buffer {
            None => {
                let buffer = gpu
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Empty Vertex Buffer"),
                        contents: bytemuck::cast_slice(&self.vertices),
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    });
                self.buffer = Some(buffer);
            }
            Some(buffer) if self.dirty => {
                gpu.queue
                    .write_buffer(buffer, 0, bytemuck::cast_slice(&self.vertices));
            }
            Some(_) => {}
        }
        self.dirty = false;
    }

    pub(crate) fn gpu_buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

/// 24 line-list vertices tracing the 12 edges of a centered box.
fn box_edges(dimensions: Vec3, color: [f32; 4]) -> Vec<LineVertex> {
    let h = dimensions * 0.5;
    let corner = |x: f32, y: f32, z: f32| LineVertex {
        position: [x * h.x, y * h.y, z * h.z],
        color,
    };

    let mut vertices = Vec::with_capacity(24);
    // four edges along each principal axis
    for (a, b) in [(-1.0f32, -1.0f32), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)] {
        vertices.push(corner(-1.0, a, b));
        vertices.push(corner(1.0, a, b));
        vertices.push(corner(a, -1.0, b));
        vertices.push(corner(a, 1.0, b));
        vertices.push(corner(a, b, -1.0));
        vertices.push(corner(a, b, 1.0));
    }
    vertices
}
