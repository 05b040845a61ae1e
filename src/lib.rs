//! # Meshplot
//!
//! **An interactive viewer core for procedural 3D geometry on wgpu.**
//!
//! Meshplot generates parametric primitives on the CPU (polygons, cuboids,
//! UV spheres, displaceable planes), resolves flat or smooth shading at
//! construction, keeps every mesh's bounding box current through all
//! mutations, and renders the result with depth-tested surface and line
//! passes under an orbiting camera. Screen-space picking is built in via
//! ray/box queries.
//!
//! ## Quick Start
//!
//! ```no_run
//! use glam::Vec3;
//! use meshplot::{Camera, Mesh, Projection, Shading};
//!
//! // geometry is built CPU-side; no GPU needed until sync/render
//! let mut plane = Mesh::plane(10.0, 10.0, 63, 63, Shading::Smooth);
//! plane.displace(|x, y| (x * x + y * y).sqrt().sin(), 100.0, true);
//! plane.show_bounds(true);
//!
//! let mut camera = Camera::new(Vec3::new(0.0, -12.0, -4.0));
//! camera.set_projection(Projection::Perspective, 800.0, 600.0, 0.1, 1000.0, 60.0);
//! camera.rotate_xy(30.0);
//! ```
//!
//! Rendering goes through [`GpuContext`], [`MeshPass`], and [`LinePass`];
//! picking through [`Ray::from_screen`] and [`Transform::intersect_box`].

mod bounds;
mod camera;
mod empty;
mod gpu;
mod import;
mod line_pass;
mod mesh;
mod mesh_pass;
mod ray;
mod transform;

pub use bounds::{BoundingBox, FRONT_HIT, NO_HIT};
pub use camera::{Axis, Camera, Projection};
pub use empty::{Empty, EmptyKind, LineVertex};
pub use gpu::GpuContext;
pub use import::{ImportError, StlImport, load_stl_bytes, load_stl_file};
pub use line_pass::LinePass;
pub use mesh::{Mesh, MeshVertex, Primitive, Shading};
pub use mesh_pass::{MeshDraw, MeshPass};
pub use ray::Ray;
pub use transform::Transform;

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
