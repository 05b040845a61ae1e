//! Procedural mesh generation and shading.
//!
//! This is the core of the crate: a [`Mesh`] owns its CPU-side vertex and
//! index arrays, a shading mode, a [`Transform`] with a derived bounding box,
//! and (after [`Mesh::sync`]) the GPU buffers mirroring that data. The
//! concrete generators are a closed set selected at construction:
//!
//! - [`Mesh::regular_polygon`] — fan of `degree` triangles around a center
//! - [`Mesh::cuboid`] — 8 corners, 12 triangles, fixed winding table
//! - [`Mesh::sphere`] — UV sphere: pole fans plus quad-strip latitude bands
//! - [`Mesh::plane`] — subdivided grid, displaceable by a height function
//! - [`Mesh::from_stl_file`] — external geometry with trusted normals
//!
//! # Shading
//!
//! Every generator authors geometry with shared vertices and clockwise
//! winding, then resolves the requested [`Shading`]:
//!
//! - **Smooth** keeps the natural unique-vertex topology and assigns each
//!   vertex the normalized sum of its incident face normals.
//! - **Flat** duplicates vertices so each triangle owns an independent
//!   triple (`vertex count == triangle count * 3`, indices sequential) and
//!   assigns each triple its face normal, producing hard edges.
//!
//! # Mutation
//!
//! Vertex positions may change after construction ([`Mesh::set_positions`],
//! [`Mesh::displace`]). Every mutation immediately recomputes face normals,
//! re-resolves shading, and rescans the bounding box, so there is no window
//! in which stale bounds are observable. The GPU copy happens on the next
//! [`Mesh::sync`], which overwrites both buffers in full.

use glam::{Vec2, Vec3};
use wgpu::util::DeviceExt;

use crate::empty::Empty;
use crate::gpu::GpuContext;
use crate::import::{self, ImportError, StlImport};
use crate::transform::Transform;

/// Color of the wireframe box attached by [`Mesh::show_bounds`].
const BOUNDS_COLOR: [f32; 4] = [1.0, 0.5, 0.25, 1.0];

/// A mesh vertex: position, normal, and texture coordinate.
///
/// 32 bytes, `#[repr(C)]`, castable to bytes for GPU upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Model-space position.
    pub position: [f32; 3],
    /// Surface normal, unit length after shading resolution.
    pub normal: [f32; 3],
    /// Texture coordinate.
    pub uv: [f32; 2],
}

impl MeshVertex {
    /// Vertex buffer layout for pipelines reading this vertex type:
    /// position (location 0), normal (location 1), uv (location 2).
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as u64,
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
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };
}

/// Normal resolution mode, fixed per mesh at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shading {
    /// Per-face duplicated vertices with hard-edge normals.
    Flat,
    /// Shared vertices with averaged incident-face normals.
    Smooth,
}

/// Which generator produced a mesh, with its construction parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    RegularPolygon { radius: f32, degree: u32 },
    Cuboid { width: f32, height: f32, depth: f32 },
    Sphere { radius: f32, res_x: u32, res_y: u32 },
    Plane { width: f32, length: f32, res_x: u32, res_y: u32 },
    Custom,
}

pub(crate) struct GpuBuffers {
    pub vertex: wgpu::Buffer,
    pub index: wgpu::Buffer,
}

/// Triangle geometry with GPU-resident buffers and a derived bounding box.
pub struct Mesh {
    primitive: Primitive,
    shading: Shading,
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    poly_count: usize,
    transform: Transform,
    bounds_overlay: Option<Empty>,
    buffers: Option<GpuBuffers>,
    dirty: bool,
}

impl Mesh {
    fn empty(primitive: Primitive, shading: Shading) -> Self {
        Self {
            primitive,
            shading,
            vertices: Vec::new(),
            indices: Vec::new(),
            poly_count: 0,
            transform: Transform::new(),
            bounds_overlay: None,
            buffers: None,
            dirty: false,
        }
    }

    /// A regular polygon of `degree` sides in the XY plane.
    ///
    /// Topology: one center vertex plus `degree` rim vertices at angle steps
    /// of `2π/degree`, traversed in descending angle for clockwise winding;
    /// `degree` triangles fan out from the center, the last wrapping back to
    /// the first rim vertex. Center UV is (0.5, 0.5), rim UVs map the unit
    /// circle into [0, 1]². Face normals all point down -Z.
    ///
    /// A `degree` below 3 is a degenerate request and yields an empty mesh.
    pub fn regular_polygon(radius: f32, degree: u32, shading: Shading) -> Self {
        let primitive = Primitive::RegularPolygon { radius, degree };
        if degree < 3 {
            log::debug!("regular polygon of degree {degree} has no geometry");
            return Self::empty(primitive, shading);
        }

        let vert_count = degree as usize + 1;
        let poly_count = degree as usize;
        let mut vertices = Vec::with_capacity(vert_count);
        let mut indices = Vec::with_capacity(poly_count * 3);

        vertices.push(MeshVertex {
            position: [0.0, 0.0, 0.0],
            normal: [0.0; 3],
            uv: [0.5, 0.5],
        });

        let mut theta = 2.0 * std::f32::consts::PI;
        let offset = 2.0 * std::f32::consts::PI / degree as f32;
        for _ in 0..degree {
            vertices.push(MeshVertex {
                position: [radius * theta.cos(), radius * theta.sin(), 0.0],
                normal: [0.0; 3],
                uv: [0.5 * (theta.cos() + 1.0), 0.5 * (theta.sin() + 1.0)],
            });
            theta -= offset;
        }

        for p in 1..=poly_count as u32 {
            let wrap = if p + 1 >= vert_count as u32 { 1 } else { p + 1 };
            indices.extend_from_slice(&[0, p, wrap]);
        }

        let face_normals = vec![Vec3::NEG_Z; poly_count];

        let mut mesh = Self {
            primitive,
            shading,
            vertices,
            indices,
            poly_count,
            transform: Transform::new(),
            bounds_overlay: None,
            buffers: None,
            dirty: true,
        };
        mesh.set_shading(&face_normals);
        mesh.update_bounds();
        mesh
    }

    /// An axis-aligned cuboid centered at the origin.
    ///
    /// Exactly 8 corner vertices and 12 triangles with a fixed winding
    /// table. UVs are derived from position during generation; under flat
    /// shading the side-face UVs are then overwritten with a hand-assigned
    /// box unwrap.
    pub fn cuboid(width: f32, height: f32, depth: f32, shading: Shading) -> Self {
        let primitive = Primitive::Cuboid {
            width,
            height,
            depth,
        };

        let mut vertices = Vec::with_capacity(8);
        let mut z = -depth / 2.0;
        for _ in 0..2 {
            let mut y = height / 2.0;
            for _ in 0..2 {
                let mut x = -width / 2.0;
                for _ in 0..2 {
                    vertices.push(MeshVertex {
                        position: [x, y, z],
                        normal: [0.0; 3],
                        uv: [0.5 * (1.0 + x / width), 0.5 * (1.0 + y / height)],
                    });
                    x += width;
                }
                y -= height;
            }
            z += depth;
        }

        #[rustfmt::skip]
        let indices: Vec<u32> = vec![
            // top
            0, 1, 2,
            1, 3, 2,
            // bottom
            4, 6, 5,
            5, 6, 7,
            // left
            0, 2, 4,
            2, 6, 4,
            // right
            3, 1, 5,
            3, 5, 7,
            // front
            2, 3, 6,
            3, 7, 6,
            // back
            1, 0, 5,
            0, 4, 5,
        ];
        let poly_count = indices.len() / 3;

        let mut mesh = Self {
            primitive,
            shading,
            vertices,
            indices,
            poly_count,
            transform: Transform::new(),
            bounds_overlay: None,
            buffers: None,
            dirty: true,
        };

        let face_normals = mesh.face_normals();
        mesh.set_shading(&face_normals);

        // hand-assigned box unwrap for the four side faces; the generated
        // UVs only cover top and bottom correctly
        if mesh.shading == Shading::Flat {
            #[rustfmt::skip]
            const SIDE_UVS: [[f32; 2]; 24] = [
                [0.0, 0.0], [1.0, 0.0], [0.0, 1.0],
                [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
                [0.0, 0.0], [1.0, 0.0], [1.0, 1.0],
                [0.0, 0.0], [1.0, 1.0], [0.0, 1.0],
                [0.0, 0.0], [1.0, 0.0], [0.0, 1.0],
                [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
                [1.0, 1.0], [0.0, 1.0], [1.0, 0.0],
                [0.0, 1.0], [0.0, 0.0], [1.0, 0.0],
            ];
            for (i, uv) in SIDE_UVS.iter().enumerate() {
                mesh.vertices[12 + i].uv = *uv;
            }
        }

        mesh.update_bounds();
        mesh
    }

    /// A UV sphere centered at the origin with poles on the Z axis.
    ///
    /// Vertices: 1 north pole, `res_x · (res_y - 1)` ring vertices generated
    /// by stepping the polar angle from π toward 0 and the azimuth around
    /// the full circle, then 1 south pole, giving `res_x·(res_y-1) + 2` in
    /// total. Indices come in three bands: the north fan, `res_y - 2` rings
    /// of quads split into two triangles each (the last column wrapping to
    /// the first), and the mirrored south fan.
    ///
    /// UVs are a spherical projection of the final vertex positions
    /// (`u = 0.5 + atan2(y, x)/2π`, `v = 0.5 + asin(z)/π`), so a seam sits
    /// at the `u` wraparound. Both resolutions are clamped to at least 2.
    pub fn sphere(radius: f32, res_x: u32, res_y: u32, shading: Shading) -> Self {
        let res_x = res_x.max(2);
        let res_y = res_y.max(2);
        let primitive = Primitive::Sphere {
            radius,
            res_x,
            res_y,
        };

        let vert_count = res_x as usize * (res_y as usize - 1) + 2;
        let poly_count = res_x as usize * ((res_y as usize - 2) * 2 + 2);

        let mut vertices = Vec::with_capacity(vert_count);
        let mut indices = Vec::with_capacity(poly_count * 3);

        let incr_y = -std::f32::consts::PI / res_y as f32;
        let incr_x = -std::f32::consts::TAU / res_x as f32;

        vertices.push(MeshVertex {
            position: [0.0, 0.0, -radius],
            normal: [0.0, 0.0, -1.0],
            uv: [0.0; 2],
        });

        let mut theta = std::f32::consts::PI + incr_y;
        for _ in 0..res_y - 1 {
            let mut phi = std::f32::consts::TAU;
            for _ in 0..res_x {
                vertices.push(MeshVertex {
                    position: [
                        radius * theta.sin() * phi.cos(),
                        radius * theta.sin() * phi.sin(),
                        radius * theta.cos(),
                    ],
                    normal: [0.0; 3],
                    uv: [0.0; 2],
                });
                phi += incr_x;
            }
            theta += incr_y;
        }

        vertices.push(MeshVertex {
            position: [0.0, 0.0, radius],
            normal: [0.0, 0.0, 1.0],
            uv: [0.0; 2],
        });

        // north pole fan
        for i in 0..res_x {
            indices.extend_from_slice(&[0, i + 1, (i + 1) % res_x + 1]);
        }

        // quad-strip body
        let mut vertex = res_x + 1;
        for _ in 0..res_y - 2 {
            for j in 0..res_x {
                let wrap = if j + 1 == res_x {
                    vertex - res_x + 1
                } else {
                    vertex + 1
                };
                indices.extend_from_slice(&[vertex - res_x, vertex, wrap]);
                indices.extend_from_slice(&[wrap, wrap - res_x, vertex - res_x]);
                vertex += 1;
            }
        }

        // south pole fan
        let south = vertex;
        let mut vertex = south - res_x;
        for i in 0..res_x {
            let wrap = if i + 1 == res_x {
                vertex - res_x + 1
            } else {
                vertex + 1
            };
            indices.extend_from_slice(&[vertex, south, wrap]);
            vertex += 1;
        }

        let mut mesh = Self {
            primitive,
            shading,
            vertices,
            indices,
            poly_count,
            transform: Transform::new(),
            bounds_overlay: None,
            buffers: None,
            dirty: true,
        };

        // spherical projection from final positions, poles included
        for v in &mut mesh.vertices {
            let [x, y, z] = v.position;
            v.uv = [
                0.5 + y.atan2(x) / std::f32::consts::TAU,
                0.5 + z.asin() / std::f32::consts::PI,
            ];
        }

        let face_normals = mesh.face_normals();
        mesh.set_shading(&face_normals);

        // averaging the fan normals leaves the poles a rounding error off
        // the axis; the pole normal contract is exact
        if mesh.shading == Shading::Smooth {
            let last = mesh.vertices.len() - 1;
            mesh.vertices[0].normal = [0.0, 0.0, -1.0];
            mesh.vertices[last].normal = [0.0, 0.0, 1.0];
        }

        mesh.update_bounds();
        mesh
    }

    /// A subdivided rectangle in the XY plane.
    ///
    /// The grid has `(res_x + 2) × (res_y + 2)` vertices spanning the full
    /// width and length, laid out row-major left-to-right, top-to-bottom,
    /// with two triangles per cell over `(res_x + 1) × (res_y + 1)` cells.
    /// The subdivision count therefore counts *interior* lines per axis,
    /// not cells. Face normals all point down -Z.
    pub fn plane(width: f32, length: f32, res_x: u32, res_y: u32, shading: Shading) -> Self {
        let primitive = Primitive::Plane {
            width,
            length,
            res_x,
            res_y,
        };

        let cols = res_x as usize + 2;
        let rows = res_y as usize + 2;
        let poly_count = 2 * (res_x as usize + 1) * (res_y as usize + 1);

        let mut vertices = Vec::with_capacity(cols * rows);
        let mut indices = Vec::with_capacity(poly_count * 3);

        let offset_x = width / (res_x + 1) as f32;
        let offset_y = -length / (res_y + 1) as f32;

        let mut y = length / 2.0;
        for _ in 0..rows {
            let mut x = -width / 2.0;
            for _ in 0..cols {
                vertices.push(MeshVertex {
                    position: [x, y, 0.0],
                    normal: [0.0; 3],
                    uv: [2.0 * x / width, 2.0 * y / length],
                });
                x += offset_x;
            }
            y += offset_y;
        }

        for i in 0..=res_y {
            for j in 0..=res_x {
                let t = i * cols as u32 + j;
                indices.extend_from_slice(&[t, t + 1, t + res_x + 2]);
                indices.extend_from_slice(&[t + 1, t + res_x + 3, t + res_x + 2]);
            }
        }

        let face_normals = vec![Vec3::NEG_Z; poly_count];

        let mut mesh = Self {
            primitive,
            shading,
            vertices,
            indices,
            poly_count,
            transform: Transform::new(),
            bounds_overlay: None,
            buffers: None,
            dirty: true,
        };
        mesh.set_shading(&face_normals);
        mesh.update_bounds();
        mesh
    }

    /// Imports the first mesh from an STL file.
    ///
    /// Normals come from the file and are never regenerated. A file that
    /// parses but contains no triangles is a soft outcome and yields an
    /// empty mesh; unreadable or corrupt files are hard failures.
    pub fn from_stl_file(path: impl AsRef<std::path::Path>) -> Result<Self, ImportError> {
        Ok(Self::from_import(import::load_stl_file(path)?))
    }

    /// Imports STL geometry from in-memory bytes. See [`Mesh::from_stl_file`].
    pub fn from_stl_bytes(bytes: &[u8]) -> Result<Self, ImportError> {
        Ok(Self::from_import(import::load_stl_bytes(bytes)?))
    }

    fn from_import(import: StlImport) -> Self {
        match import {
            StlImport::Empty => Self::empty(Primitive::Custom, Shading::Flat),
            StlImport::Geometry { vertices, indices } => {
                let poly_count = indices.len() / 3;
                let mut mesh = Self {
                    primitive: Primitive::Custom,
                    shading: Shading::Flat,
                    vertices,
                    indices,
                    poly_count,
                    transform: Transform::new(),
                    bounds_overlay: None,
                    buffers: None,
                    dirty: true,
                };
                mesh.update_bounds();
                mesh
            }
        }
    }

    // ---------- accessors

    /// Generator descriptor with construction parameters.
    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    /// The shading mode fixed at construction.
    pub fn shading(&self) -> Shading {
        self.shading
    }

    /// Vertex count after shading resolution.
    pub fn vert_count(&self) -> usize {
        self.vertices.len()
    }

    /// Triangle count.
    pub fn poly_count(&self) -> usize {
        self.poly_count
    }

    /// Whether the mesh carries no geometry (degenerate request or empty import).
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Resolved vertex data.
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    /// Index buffer contents, one `u32` triple per triangle.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// The mesh's transform and derived bounds.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable transform access for placement.
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Copies out all vertex positions.
    pub fn positions(&self) -> Vec<Vec3> {
        self.vertices
            .iter()
            .map(|v| Vec3::from(v.position))
            .collect()
    }

    /// Copies out all vertex normals.
    pub fn normals(&self) -> Vec<Vec3> {
        self.vertices.iter().map(|v| Vec3::from(v.normal)).collect()
    }

    /// Copies out all texture coordinates.
    pub fn uvs(&self) -> Vec<Vec2> {
        self.vertices.iter().map(|v| Vec2::from(v.uv)).collect()
    }

    // ---------- mutation

    /// Overwrites every vertex position, then recomputes normals and bounds.
    ///
    /// Ignored silently if the mesh holds no geometry or the slice length
    /// does not match the resolved vertex count; no partial write happens.
    pub fn set_positions(&mut self, positions: &[Vec3]) {
        if self.vertices.is_empty() || positions.len() != self.vertices.len() {
            return;
        }
        for (v, p) in self.vertices.iter_mut().zip(positions) {
            v.position = p.to_array();
        }
        self.calculate_normals_from_face();
    }

    /// Displaces each vertex's Z coordinate by a height function of (x, y).
    ///
    /// The raw function output is clamped into `[-|clamp|, |clamp|]`. When
    /// `center` is set, all Z values are then shifted by `-(min + max)/2`;
    /// centering is a post-process, so the clamp always applies to the raw
    /// output. Normals and bounds are recomputed afterwards. Intended for
    /// plane meshes; a no-op when the mesh holds no geometry.
    pub fn displace<F>(&mut self, func: F, clamp: f32, center: bool)
    where
        F: Fn(f32, f32) -> f32,
    {
        if self.vertices.is_empty() {
            return;
        }

        let limit = clamp.abs();
        let mut min_z = f32::MAX;
        let mut max_z = f32::MIN;
        for v in &mut self.vertices {
            let z = func(v.position[0], v.position[1]).clamp(-limit, limit);
            v.position[2] = z;
            min_z = min_z.min(z);
            max_z = max_z.max(z);
        }

        if center {
            let half_offset = 0.5 * (min_z + max_z);
            for v in &mut self.vertices {
                v.position[2] -= half_offset;
            }
        }

        self.calculate_normals_from_face();
    }

    /// Recomputes per-face normals from current positions, re-resolves
    /// shading, and rescans the bounding box.
    pub fn calculate_normals_from_face(&mut self) {
        if self.poly_count < 1 {
            return;
        }
        let face_normals = self.face_normals();
        self.set_shading(&face_normals);
        self.update_bounds();
        self.dirty = true;
    }

    /// Attaches or detaches a wireframe box sized to the current bounds.
    ///
    /// Idempotent: attaching twice or detaching an absent overlay is a no-op.
    pub fn show_bounds(&mut self, toggle: bool) {
        if toggle {
            if self.bounds_overlay.is_some() {
                return;
            }
            let dims = self.transform.bounds().dimensions();
            self.bounds_overlay = Some(Empty::wire_box(dims, BOUNDS_COLOR));
        } else {
            self.bounds_overlay = None;
        }
    }

    /// The attached bounds overlay, if [`Mesh::show_bounds`] enabled one.
    pub fn bounds_overlay_mut(&mut self) -> Option<&mut Empty> {
        self.bounds_overlay.as_mut()
    }

    // ---------- shading internals

    /// Per-triangle normals from the authored clockwise winding:
    /// `normalize(cross(v1 - v0, v2 - v0))`.
    fn face_normals(&self) -> Vec<Vec3> {
        let mut normals = Vec::with_capacity(self.poly_count);
        for tri in self.indices.chunks_exact(3) {
            let v0 = Vec3::from(self.vertices[tri[0] as usize].position);
            let v1 = Vec3::from(self.vertices[tri[1] as usize].position);
            let v2 = Vec3::from(self.vertices[tri[2] as usize].position);
            normals.push((v1 - v0).cross(v2 - v0).normalize_or_zero());
        }
        normals
    }

    /// Resolves the shading mode against the given per-face normals.
    ///
    /// Flat mode rebuilds the vertex array with one independent triple per
    /// triangle and sequential indices; smooth mode keeps shared vertices
    /// and averages. Safe to call repeatedly: a flat mesh whose indices are
    /// already sequential gathers into itself unchanged.
    fn set_shading(&mut self, face_normals: &[Vec3]) {
        match self.shading {
            Shading::Flat => {
                let mut split = Vec::with_capacity(self.poly_count * 3);
                for (i, &index) in self.indices.iter().enumerate() {
                    let mut v = self.vertices[index as usize];
                    v.normal = face_normals[i / 3].to_array();
                    split.push(v);
                }
                self.indices = (0..split.len() as u32).collect();
                self.vertices = split;
            }
            Shading::Smooth => {
                let normals = smooth_normals(
                    self.poly_count,
                    self.vertices.len(),
                    &self.indices,
                    face_normals,
                );
                for (v, n) in self.vertices.iter_mut().zip(normals) {
                    v.normal = n.to_array();
                }
            }
        }
    }

    /// Rescans all vertex positions into the transform's bounding box and
    /// resizes the bounds overlay if one is attached.
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

        let dims = self.transform.bounds().dimensions();
        if let Some(overlay) = self.bounds_overlay.as_mut() {
            overlay.recompute_box(dims);
        }
    }

    // ---------- GPU residency

    /// Uploads vertex and index data, allocating buffers on first use.
    ///
    /// Full-buffer overwrite semantics; cheap when nothing changed since the
    /// last call. Meshes with fewer than one triangle never allocate.
    pub fn sync(&mut self, gpu: &GpuContext) {
        if self.vertices.len() < 3 || self.poly_count < 1 {
            return;
        }

        match &self.buffers {
            None => {
                let vertex = gpu
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Mesh Vertex Buffer"),
                        contents: bytemuck::cast_slice(&self.vertices),
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    });
                let index = gpu
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Mesh Index Buffer"),
                        contents: bytemuck::cast_slice(&self.indices),
                        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                    });
                self.buffers = Some(GpuBuffers { vertex, index });
            }
            Some(buffers) if self.dirty => {
                gpu.queue
                    .write_buffer(&buffers.vertex, 0, bytemuck::cast_slice(&self.vertices));
                gpu.queue
                    .write_buffer(&buffers.index, 0, bytemuck::cast_slice(&self.indices));
            }
            Some(_) => {}
        }
        self.dirty = false;

        if let Some(overlay) = self.bounds_overlay.as_mut() {
            overlay.sync(gpu);
        }
    }

    pub(crate) fn gpu_buffers(&self) -> Option<&GpuBuffers> {
        self.buffers.as_ref()
    }

    /// Number of indices to draw (`poly_count * 3`).
    pub fn index_count(&self) -> u32 {
        (self.poly_count * 3) as u32
    }
}

/// Averages face normals onto shared vertices.
///
/// Adjacency is discovered by walking the index triples directly: each
/// triangle adds its face normal to the running sum of its three vertices,
/// and every sum is normalized at the end.
fn smooth_normals(
    poly_count: usize,
    vert_count: usize,
    indices: &[u32],
    face_normals: &[Vec3],
) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; vert_count];
    for i in 0..poly_count {
        for k in 0..3 {
            normals[indices[i * 3 + k] as usize] += face_normals[i];
        }
    }
    for n in &mut normals {
        *n = n.normalize_or_zero();
    }
    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() < eps, "expected {b}, got {a} (eps {eps})");
    }

    // ---------- regular polygon

    #[test]
    fn polygon_counts_and_indices_in_range() {
        for degree in 3..=64u32 {
            let mesh = Mesh::regular_polygon(1.5, degree, Shading::Smooth);
            assert_eq!(mesh.vert_count(), degree as usize + 1);
            assert_eq!(mesh.poly_count(), degree as usize);
            let verts = mesh.vert_count() as u32;
            assert!(mesh.indices().iter().all(|&i| i < verts));
        }
    }

    #[test]
    fn polygon_bounds_span_diameter() {
        let radius = 2.0;
        let mesh = Mesh::regular_polygon(radius, 32, Shading::Smooth);
        let dims = mesh.transform().bounds().dimensions();
        assert_near(dims.x, 2.0 * radius, 1e-3);
        assert_near(dims.y, 2.0 * radius, 1e-3);
        assert_near(dims.z, 0.1, 1e-6); // flat geometry floors to 0.1
    }

    #[test]
    fn polygon_below_degree_three_is_empty() {
        let mesh = Mesh::regular_polygon(1.0, 2, Shading::Smooth);
        assert!(mesh.is_empty());
        assert_eq!(mesh.poly_count(), 0);
    }

    #[test]
    fn flat_polygon_duplicates_per_face() {
        let mesh = Mesh::regular_polygon(1.0, 5, Shading::Flat);
        assert_eq!(mesh.vert_count(), mesh.poly_count() * 3);
        let expected: Vec<u32> = (0..15).collect();
        assert_eq!(mesh.indices(), expected.as_slice());
        for v in mesh.vertices() {
            assert_eq!(v.normal, [0.0, 0.0, -1.0]);
        }
    }

    // ---------- cuboid

    #[test]
    fn cuboid_flat_and_smooth_vertex_counts() {
        let flat = Mesh::cuboid(1.0, 2.0, 3.0, Shading::Flat);
        assert_eq!(flat.vert_count(), 36);
        assert_eq!(flat.poly_count(), 12);

        let smooth = Mesh::cuboid(1.0, 2.0, 3.0, Shading::Smooth);
        assert_eq!(smooth.vert_count(), 8);
        assert_eq!(smooth.poly_count(), 12);
    }

    #[test]
    fn cuboid_bounds_match_dimensions() {
        for shading in [Shading::Flat, Shading::Smooth] {
            let mesh = Mesh::cuboid(2.0, 4.0, 6.0, shading);
            let dims = mesh.transform().bounds().dimensions();
            assert_near(dims.x, 2.0, 1e-5);
            assert_near(dims.y, 4.0, 1e-5);
            assert_near(dims.z, 6.0, 1e-5);
        }
    }

    #[test]
    fn cuboid_flat_normals_are_axis_aligned() {
        let mesh = Mesh::cuboid(1.0, 1.0, 1.0, Shading::Flat);
        for v in mesh.vertices() {
            let n = Vec3::from(v.normal);
            assert_near(n.length(), 1.0, 1e-5);
            // every face normal is a signed principal axis
            let mut components = [n.x.abs(), n.y.abs(), n.z.abs()];
            components.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_near(components[2], 1.0, 1e-5);
            assert_near(components[1], 0.0, 1e-5);
        }
    }

    #[test]
    fn cuboid_smooth_normals_point_outward_to_corners() {
        let mesh = Mesh::cuboid(2.0, 2.0, 2.0, Shading::Smooth);
        for v in mesh.vertices() {
            let p = Vec3::from(v.position);
            let n = Vec3::from(v.normal);
            // averaged corner normal points into the corner's octant
            assert!(n.dot(p.normalize()) > 0.5);
        }
    }

    // ---------- sphere

    #[test]
    fn sphere_counts_and_uv_range() {
        for (res_x, res_y) in [(3u32, 3u32), (8, 6), (16, 16)] {
            let mesh = Mesh::sphere(1.0, res_x, res_y, Shading::Smooth);
            assert_eq!(mesh.vert_count(), res_x as usize * (res_y as usize - 1) + 2);
            assert_eq!(
                mesh.poly_count(),
                res_x as usize * ((res_y as usize - 2) * 2 + 2)
            );
            let verts = mesh.vert_count() as u32;
            assert!(mesh.indices().iter().all(|&i| i < verts));
            for uv in mesh.uvs() {
                assert!((0.0..=1.0).contains(&uv.x), "u out of range: {}", uv.x);
                assert!((0.0..=1.0).contains(&uv.y), "v out of range: {}", uv.y);
            }
        }
    }

    #[test]
    fn sphere_pole_normals_are_exact() {
        let mesh = Mesh::sphere(1.0, 12, 8, Shading::Smooth);
        let normals = mesh.normals();
        assert_eq!(normals[0], Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(normals[normals.len() - 1], Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn sphere_resolution_clamps_to_two() {
        let mesh = Mesh::sphere(1.0, 0, 0, Shading::Smooth);
        // clamped to 2x2: 2*(2-1)+2 vertices, 2*((2-2)*2+2) triangles
        assert_eq!(mesh.vert_count(), 4);
        assert_eq!(mesh.poly_count(), 4);
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let radius = 0.75;
        let mesh = Mesh::sphere(radius, 10, 10, Shading::Smooth);
        for p in mesh.positions() {
            assert_near(p.length(), radius, 1e-4);
        }
    }

    #[test]
    fn sphere_bounds_span_diameter() {
        let mesh = Mesh::sphere(1.0, 16, 16, Shading::Smooth);
        let dims = mesh.transform().bounds().dimensions();
        assert_near(dims.x, 2.0, 1e-2);
        assert_near(dims.y, 2.0, 1e-2);
        assert_near(dims.z, 2.0, 1e-2);
    }

    // ---------- plane

    #[test]
    fn plane_counts() {
        let mesh = Mesh::plane(4.0, 4.0, 3, 5, Shading::Smooth);
        assert_eq!(mesh.vert_count(), 5 * 7);
        assert_eq!(mesh.poly_count(), 2 * 4 * 6);
        let verts = mesh.vert_count() as u32;
        assert!(mesh.indices().iter().all(|&i| i < verts));
    }

    #[test]
    fn plane_spans_full_extent() {
        let mesh = Mesh::plane(6.0, 2.0, 4, 4, Shading::Smooth);
        let dims = mesh.transform().bounds().dimensions();
        assert_near(dims.x, 6.0, 1e-4);
        assert_near(dims.y, 2.0, 1e-4);
        assert_near(dims.z, 0.1, 1e-6);
    }

    #[test]
    fn displace_identity_keeps_plane_flat() {
        let mut mesh = Mesh::plane(4.0, 4.0, 8, 8, Shading::Smooth);
        mesh.displace(|_, _| 0.0, 100.0, false);
        for p in mesh.positions() {
            assert_eq!(p.z, 0.0);
        }
        assert_near(mesh.transform().bounds().dimensions().z, 0.1, 1e-6);
    }

    #[test]
    fn displace_clamps_raw_output() {
        let mut mesh = Mesh::plane(4.0, 4.0, 4, 4, Shading::Smooth);
        mesh.displace(|_, _| 7.5, 2.0, false);
        for p in mesh.positions() {
            assert_eq!(p.z, 2.0);
        }
    }

    #[test]
    fn displace_centering_is_post_clamp() {
        let mut mesh = Mesh::plane(4.0, 4.0, 4, 4, Shading::Smooth);
        // raw output 5, clamp 3: all z = 3, then shifted by -(3+3)/2
        mesh.displace(|_, _| 5.0, 3.0, true);
        for p in mesh.positions() {
            assert_near(p.z, 0.0, 1e-6);
        }
    }

    #[test]
    fn displace_updates_normals_and_bounds() {
        let mut mesh = Mesh::plane(2.0, 2.0, 8, 8, Shading::Smooth);
        mesh.displace(|x, _| x, 100.0, false);
        // plane tilted 45 degrees: z extent equals x extent
        let dims = mesh.transform().bounds().dimensions();
        assert_near(dims.z, 2.0, 1e-4);
        // normals tilt away from straight -Z
        let tilted = mesh
            .normals()
            .iter()
            .filter(|n| (n.z + 1.0).abs() > 1e-3)
            .count();
        assert!(tilted > 0);
    }

    // ---------- mutation and shading

    #[test]
    fn set_positions_round_trips() {
        let mut mesh = Mesh::plane(2.0, 2.0, 2, 2, Shading::Smooth);
        let mut positions = mesh.positions();
        for p in &mut positions {
            p.z = p.x * 0.5;
        }
        mesh.set_positions(&positions);
        assert_eq!(mesh.positions(), positions);
    }

    #[test]
    fn set_positions_rejects_length_mismatch() {
        let mut mesh = Mesh::cuboid(1.0, 1.0, 1.0, Shading::Smooth);
        let before = mesh.positions();
        mesh.set_positions(&[Vec3::ZERO; 3]);
        assert_eq!(mesh.positions(), before);
    }

    #[test]
    fn set_positions_on_empty_mesh_is_ignored() {
        let mut mesh = Mesh::regular_polygon(1.0, 1, Shading::Smooth);
        mesh.set_positions(&[]);
        assert!(mesh.is_empty());
    }

    #[test]
    fn smooth_normals_match_flat_on_disjoint_faces() {
        // on a mesh with no shared vertices, averaging degenerates to the
        // face normal: both shading paths must agree
        let flat = Mesh::cuboid(1.0, 1.0, 1.0, Shading::Flat);
        let face_normals: Vec<Vec3> = flat
            .indices()
            .chunks_exact(3)
            .map(|tri| {
                let v0 = Vec3::from(flat.vertices()[tri[0] as usize].position);
                let v1 = Vec3::from(flat.vertices()[tri[1] as usize].position);
                let v2 = Vec3::from(flat.vertices()[tri[2] as usize].position);
                (v1 - v0).cross(v2 - v0).normalize()
            })
            .collect();
        let averaged = smooth_normals(
            flat.poly_count(),
            flat.vert_count(),
            flat.indices(),
            &face_normals,
        );
        for (v, n) in flat.vertices().iter().zip(averaged) {
            let stored = Vec3::from(v.normal);
            assert!((stored - n).length() < 1e-5);
        }
    }

    #[test]
    fn bounds_overlay_is_idempotent() {
        let mut mesh = Mesh::cuboid(1.0, 1.0, 1.0, Shading::Flat);
        assert!(mesh.bounds_overlay_mut().is_none());
        mesh.show_bounds(true);
        assert!(mesh.bounds_overlay_mut().is_some());
        mesh.show_bounds(true);
        assert!(mesh.bounds_overlay_mut().is_some());
        mesh.show_bounds(false);
        assert!(mesh.bounds_overlay_mut().is_none());
        mesh.show_bounds(false);
        assert!(mesh.bounds_overlay_mut().is_none());
    }

    #[test]
    fn bounds_overlay_tracks_geometry_changes() {
        let mut mesh = Mesh::plane(2.0, 2.0, 2, 2, Shading::Smooth);
        mesh.show_bounds(true);
        mesh.displace(|x, y| x * x + y * y, 100.0, false);
        let dims = mesh.transform().bounds().dimensions();
        let overlay = mesh.bounds_overlay_mut().unwrap();
        let overlay_dims = overlay.transform().bounds().dimensions();
        assert!((overlay_dims - dims).length() < 1e-4);
    }

    // ---------- import

    #[test]
    fn stl_import_trusts_normals() {
        let stl = "solid tri\n\
            facet normal 0 0 1\n\
            outer loop\n\
            vertex 0 0 0\n\
            vertex 1 0 0\n\
            vertex 0 1 0\n\
            endloop\n\
            endfacet\n\
            endsolid tri\n";
        let mesh = Mesh::from_stl_bytes(stl.as_bytes()).unwrap();
        assert_eq!(mesh.vert_count(), 3);
        assert_eq!(mesh.poly_count(), 1);
        // the authored winding would give -Z; the file says +Z and the
        // import must not second-guess it
        for v in mesh.vertices() {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn stl_empty_scene_yields_empty_mesh() {
        let mesh = Mesh::from_stl_bytes(b"solid nothing\nendsolid nothing\n").unwrap();
        assert!(mesh.is_empty());
    }
}
