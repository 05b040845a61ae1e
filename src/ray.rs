//! Rays for picking and geometric queries.
//!
//! A [`Ray`] is an origin plus a normalized direction. Rays are built either
//! directly from world-space values or from screen coordinates via
//! [`Ray::from_screen`], and support exact ray/triangle intersection with
//! Möller–Trumbore. Box queries are layered on top of the triangle test in
//! [`crate::bounds::BoundingBox`].
//!
//! A ray constructed with a zero-length direction is *invalid*: it keeps the
//! zero vector as a sentinel and every intersection query against it returns
//! `false` without doing any math. This lets callers construct a ray up front
//! and only fill in a real direction once input arrives.

use glam::{Mat4, Vec3, Vec4};

/// Tolerance used by the triangle intersection test, both for the
/// parallel-ray rejection and for the minimum accepted hit distance.
const EPSILON: f32 = 1e-7;

/// A ray in 3D space with an origin and a normalized direction.
///
/// # Example
///
/// ```
/// use glam::Vec3;
/// use meshplot::Ray;
///
/// let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
/// assert!(ray.intersect_triangle(
///     Vec3::new(-1.0, -1.0, 0.0),
///     Vec3::new(0.0, 1.0, 0.0),
///     Vec3::new(1.0, -1.0, 0.0),
/// ));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
}

impl Ray {
    /// Creates a ray from an origin and a direction.
    ///
    /// The direction is normalized; a zero vector is kept as-is and marks
    /// the ray invalid.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Replaces origin and direction in place, re-normalizing the direction.
    ///
    /// Passing a zero direction marks the ray invalid until the next update.
    pub fn update(&mut self, origin: Vec3, direction: Vec3) {
        self.origin = origin;
        self.direction = direction.normalize_or_zero();
    }

    /// Builds a world-space picking ray from screen coordinates.
    ///
    /// Unprojects the pixel through the inverse view-projection at the near
    /// and far clip planes; the ray runs from the near point toward the far
    /// point. `screen_y` grows downward, as window coordinates do.
    pub fn from_screen(
        screen_x: f32,
        screen_y: f32,
        screen_width: f32,
        screen_height: f32,
        view: Mat4,
        projection: Mat4,
    ) -> Self {
        let ndc_x = (2.0 * screen_x / screen_width) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen_y / screen_height);

        let inv_view_proj = (projection * view).inverse();

        let near = inv_view_proj * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far = inv_view_proj * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);

        let near_point = near.truncate() / near.w;
        let far_point = far.truncate() / far.w;

        Self::new(near_point, far_point - near_point)
    }

    /// The ray origin.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// The normalized direction, or the zero vector if the ray is invalid.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Whether the ray carries a usable direction.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.direction != Vec3::ZERO
    }

    /// Point along the ray at parameter `t`.
    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Möller–Trumbore ray/triangle intersection.
    ///
    /// Returns `true` for hits strictly in front of the origin (`t > ε`).
    /// Rays parallel to the triangle plane, hits behind the origin, and
    /// invalid (zero-direction) rays all return `false`.
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> bool {
        if !self.is_valid() {
            return false;
        }

        let edge1 = b - a;
        let edge2 = c - a;
        let h = self.direction.cross(edge2);
        let det = edge1.dot(h);
        if det > -EPSILON && det < EPSILON {
            // ray parallel to the triangle
            return false;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = inv_det * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return false;
        }

        let q = s.cross(edge1);
        let v = inv_det * self.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return false;
        }

        let t = inv_det * edge2.dot(q);
        t > EPSILON
    }
}
