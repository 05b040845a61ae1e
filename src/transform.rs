//! Model transforms with owned bounding volumes.
//!
//! [`Transform`] is the spatial state every renderable entity carries: a
//! single 4×4 affine matrix composed incrementally by [`Transform::translate`],
//! [`Transform::rotate`] and [`Transform::scale`], plus the entity's derived
//! [`BoundingBox`]. Position, rotation and scale are never stored separately;
//! the getters decompose the live matrix.
//!
//! Composition order matters for rotations: each `rotate` call is appended on
//! the object side of the matrix, so repeated calls spin the object about the
//! given world axis at its own origin regardless of where earlier calls moved
//! it. Translation always applies in world space on top of whatever is
//! already composed.

use glam::{Mat4, Quat, Vec3};

use crate::bounds::BoundingBox;
use crate::ray::Ray;

/// Affine model matrix plus the owned bounding box of the entity it moves.
///
/// Exclusively owned by one mesh or line primitive; never shared.
#[derive(Clone, Copy, Debug)]
pub struct Transform {
    matrix: Mat4,
    bounds: BoundingBox,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            bounds: BoundingBox::default(),
        }
    }
}

impl Transform {
    /// Identity transform with an empty bounding box.
    pub fn new() -> Self {
        Self::default()
    }

    /// The composed model matrix.
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// The owned bounding box.
    #[inline]
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Mutable access for bounds recomputation during buffer sync.
    #[inline]
    pub fn bounds_mut(&mut self) -> &mut BoundingBox {
        &mut self.bounds
    }

    /// Reinitializes the matrix to identity. Bounds are untouched.
    pub fn reset(&mut self) {
        self.matrix = Mat4::IDENTITY;
    }

    /// Applies a world-space translation on top of the current transform.
    pub fn translate(&mut self, offset: Vec3) {
        self.matrix = Mat4::from_translation(offset) * self.matrix;
    }

    /// Rotates about a world axis through the object origin.
    ///
    /// `angle` is in degrees. The rotation composes on the object side, so
    /// successive calls accumulate about fixed world axes rather than axes
    /// dragged along by earlier rotations.
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        let rotation = Mat4::from_quat(Quat::from_axis_angle(
            axis.normalize_or_zero(),
            angle.to_radians(),
        ));
        self.matrix *= rotation;
    }

    /// Scales along the principal axes.
    pub fn scale(&mut self, factors: Vec3) {
        self.matrix *= Mat4::from_scale(factors);
    }

    /// Decomposed world position.
    pub fn position(&self) -> Vec3 {
        let (_, _, translation) = self.matrix.to_scale_rotation_translation();
        translation
    }

    /// Decomposed rotation as a quaternion.
    pub fn rotation_quat(&self) -> Quat {
        let (_, rotation, _) = self.matrix.to_scale_rotation_translation();
        rotation
    }

    /// Decomposed rotation as per-axis degrees.
    ///
    /// Converts the decomposed quaternion to axis-angle and reports
    /// `axis * angle` per component in degrees. This is not a true Euler
    /// decomposition — the three components are a scaled rotation axis, not
    /// independent yaw/pitch/roll — but callers depend on these exact
    /// values, so the conversion is kept as-is.
    pub fn rotation_euler(&self) -> Vec3 {
        let (axis, angle) = self.rotation_quat().to_axis_angle();
        axis * angle.to_degrees()
    }

    /// Decomposed per-axis scale.
    pub fn scaling(&self) -> Vec3 {
        let (scale, _, _) = self.matrix.to_scale_rotation_translation();
        scale
    }

    /// Ray query against the owned bounding box.
    ///
    /// Returns the tri-state result of [`BoundingBox::intersect`].
    pub fn intersect_box(&self, ray: &Ray) -> i32 {
        self.bounds.intersect(ray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec3_near(a: Vec3, b: Vec3, eps: f32) {
        assert!(
            (a - b).length() < eps,
            "expected {b:?}, got {a:?} (eps {eps})"
        );
    }

    #[test]
    fn translation_round_trips_through_decomposition() {
        let mut t = Transform::new();
        t.translate(Vec3::new(1.0, -2.0, 3.0));
        t.translate(Vec3::new(0.5, 0.5, 0.5));
        assert_vec3_near(t.position(), Vec3::new(1.5, -1.5, 3.5), 1e-6);
    }

    #[test]
    fn scale_round_trips_through_decomposition() {
        let mut t = Transform::new();
        t.scale(Vec3::new(2.0, 3.0, 4.0));
        assert_vec3_near(t.scaling(), Vec3::new(2.0, 3.0, 4.0), 1e-5);
    }

    #[test]
    fn rotation_about_world_axis_keeps_position() {
        let mut t = Transform::new();
        t.rotate(Vec3::Z, 90.0);
        assert_vec3_near(t.position(), Vec3::ZERO, 1e-6);

        let euler = t.rotation_euler();
        assert!((euler.z.abs() - 90.0).abs() < 1e-3);
        assert!(euler.x.abs() < 1e-3 && euler.y.abs() < 1e-3);
    }

    #[test]
    fn rotation_composes_after_translation() {
        // rotating after translating must not move the decomposed position
        // through the rotation: the rotation composes on the object side
        let mut t = Transform::new();
        t.translate(Vec3::new(5.0, 0.0, 0.0));
        t.rotate(Vec3::Z, 90.0);
        assert_vec3_near(t.position(), Vec3::new(5.0, 0.0, 0.0), 1e-5);
    }

    #[test]
    fn euler_reports_axis_times_angle() {
        let mut t = Transform::new();
        let axis = Vec3::new(1.0, 1.0, 0.0).normalize();
        t.rotate(axis, 60.0);

        let euler = t.rotation_euler();
        assert_vec3_near(euler, axis * 60.0, 1e-3);
    }

    #[test]
    fn reset_restores_identity_but_keeps_bounds() {
        let mut t = Transform::new();
        t.translate(Vec3::ONE);
        t.bounds_mut().calculate(Vec3::splat(-1.0), Vec3::splat(1.0));
        t.reset();
        assert_eq!(t.matrix(), Mat4::IDENTITY);
        assert_eq!(t.bounds().dimensions(), Vec3::splat(2.0));
    }

    #[test]
    fn intersect_box_delegates_to_bounds() {
        let mut t = Transform::new();
        t.bounds_mut().calculate(Vec3::splat(-0.5), Vec3::splat(0.5));
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert_eq!(t.intersect_box(&ray), crate::bounds::FRONT_HIT);
    }
}
