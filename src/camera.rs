//! Orbiting plot camera.
//!
//! The camera stores its pose directly as a view-space rig matrix instead of
//! a position/orientation pair. Every manipulation composes onto that matrix
//! on one of two sides:
//!
//! - *world-side* ops ([`Camera::rotate`], [`Camera::scale`]) compose inside
//!   the rig and orbit the camera around the focus point;
//! - *camera-side* ops ([`Camera::rotate_relative`], [`Camera::translate`])
//!   compose outside and move relative to the current viewing direction.
//!
//! The focus target is kept separately and folded into the view matrix on
//! demand, so panning the target never disturbs accumulated orbit state.
//!
//! The world convention is the plotting one: +Y is into the screen (front),
//! +X right, and -Z up. Angles are in degrees throughout; positive angles
//! rotate the *scene* in the positive sense about the given axis, which is
//! why each rotation enters the rig negated.

use glam::{Mat4, Quat, Vec3, Vec4};

/// Projection model for [`Camera::set_projection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// Principal camera-local axis, used for target panning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// An orbiting camera with separate rig, focus target, and projection.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    rig: Mat4,
    target: Vec3,
    scale: Vec3,
    projection: Mat4,
}

impl Camera {
    /// Camera at `position` looking along the world convention, focused on
    /// the origin, with an identity projection until
    /// [`Camera::set_projection`] is called.
    pub fn new(position: Vec3) -> Self {
        Self {
            rig: Mat4::from_translation(-position),
            target: Vec3::ZERO,
            scale: Vec3::ONE,
            projection: Mat4::IDENTITY,
        }
    }

    /// Replaces the projection matrix.
    ///
    /// Perspective interprets `fov` as the vertical field of view in
    /// degrees; orthographic spans `width × height` world units centered on
    /// the view axis.
    pub fn set_projection(
        &mut self,
        projection: Projection,
        width: f32,
        height: f32,
        near: f32,
        far: f32,
        fov: f32,
    ) {
        self.projection = match projection {
            Projection::Perspective => {
                Mat4::perspective_lh(fov.to_radians(), width / height, near, far)
            }
            Projection::Orthographic => Mat4::orthographic_lh(
                -width / 2.0,
                width / 2.0,
                -height / 2.0,
                height / 2.0,
                near,
                far,
            ),
        };
    }

    /// The view matrix: the rig with the focus target folded in.
    pub fn view_matrix(&self) -> Mat4 {
        self.rig * Mat4::from_translation(self.target)
    }

    /// The current projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Accumulated per-axis zoom factors.
    pub fn scaling(&self) -> Vec3 {
        self.scale
    }

    /// The focus point in world space.
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// World-space direction the camera looks along (+Y in camera space).
    pub fn front_dir(&self) -> Vec3 {
        self.local_dir(Vec3::new(0.0, 1.0, 0.0))
    }

    /// World-space direction to the camera's right.
    pub fn right_dir(&self) -> Vec3 {
        self.local_dir(Vec3::new(1.0, 0.0, 0.0))
    }

    /// World-space up direction of the camera (-Z in camera space).
    pub fn up_dir(&self) -> Vec3 {
        self.local_dir(Vec3::new(0.0, 0.0, -1.0))
    }

    // ---------- focus target

    /// Pans the focus target by a world-space offset. The view moves
    /// opposite to the offset, as if dragging the scene.
    pub fn translate_target(&mut self, offset: Vec3) {
        self.target -= offset;
    }

    /// Pans the focus target along a camera-local axis.
    ///
    /// The axis is resolved through the current rig, so "X" always pans
    /// sideways on screen no matter how the camera has orbited.
    pub fn translate_target_local(&mut self, axis: Axis, offset: f32) {
        let dir = match axis {
            Axis::X => Vec3::new(1.0, 0.0, 0.0),
            Axis::Y => Vec3::new(0.0, 1.0, 0.0),
            Axis::Z => Vec3::new(0.0, 0.0, -1.0),
        };
        self.target -= offset * self.local_dir(dir);
    }

    // ---------- rig manipulation

    /// Dollies the camera by a camera-relative offset.
    pub fn translate(&mut self, offset: Vec3) {
        self.rig = Mat4::from_translation(-offset) * self.rig;
    }

    /// Orbits about a world axis through the focus point.
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        self.rig *= Mat4::from_quat(scene_rotation(axis, angle));
    }

    /// Rotates about a camera-local axis (first-person style).
    pub fn rotate_relative(&mut self, axis: Vec3, angle: f32) {
        self.rig = Mat4::from_quat(scene_rotation(axis, angle)) * self.rig;
    }

    /// Orbits about the world X axis with the accumulated rotation factored
    /// out first, then restored.
    ///
    /// A plain [`Camera::rotate`] about X tilts around an axis the previous
    /// orbiting has dragged along; factoring the decomposed rotation out
    /// makes the tilt land on the original world X regardless of history,
    /// which is what turntable-style vertical orbit needs.
    pub fn rotate_xy(&mut self, angle: f32) {
        let (_, rotation, _) = self.rig.to_scale_rotation_translation();

        self.rig *= Mat4::from_quat(rotation.conjugate());
        self.rotate(Vec3::X, angle);
        self.rig *= Mat4::from_quat(rotation);
    }

    /// Zooms by scaling the scene about the focus point.
    ///
    /// `axis` selects and weights components; the accumulated factors are
    /// readable via [`Camera::scaling`] and are what the line renderer uses
    /// to fade reference geometry while zooming.
    pub fn scale(&mut self, amount: f32, axis: Vec3) {
        let factors = amount * axis;
        self.scale *= factors;
        self.rig *= Mat4::from_scale(factors);
    }

    /// Transforms a camera-space direction into world space through the
    /// rig's linear part.
    fn local_dir(&self, dir: Vec3) -> Vec3 {
        (self.rig.transpose() * Vec4::from((dir, 0.0)))
            .truncate()
            .normalize_or_zero()
    }
}

/// Quaternion rotating the scene by `angle` degrees about `axis`: the
/// camera counter-rotates, so the half-angle is negated.
fn scene_rotation(axis: Vec3, angle: f32) -> Quat {
    let theta = -angle.to_radians();
    let (s, c) = (theta / 2.0).sin_cos();
    Quat::from_xyzw(s * axis.x, s * axis.y, s * axis.z, c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat4_near(a: Mat4, b: Mat4, eps: f32) {
        for (ca, cb) in a.to_cols_array().iter().zip(b.to_cols_array()) {
            assert!((ca - cb).abs() < eps, "matrices differ:\n{a}\nvs\n{b}");
        }
    }

    fn assert_vec3_near(a: Vec3, b: Vec3, eps: f32) {
        assert!(
            (a - b).length() < eps,
            "expected {b:?}, got {a:?} (eps {eps})"
        );
    }

    #[test]
    fn new_camera_views_from_position() {
        let cam = Camera::new(Vec3::new(0.0, -10.0, 0.0));
        // a point at the origin lands 10 units down the view axis
        let viewed = cam.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_vec3_near(viewed.truncate(), Vec3::new(0.0, 10.0, 0.0), 1e-6);
    }

    #[test]
    fn default_orientation_matches_world_convention() {
        let cam = Camera::new(Vec3::new(0.0, -10.0, 0.0));
        assert_vec3_near(cam.front_dir(), Vec3::Y, 1e-6);
        assert_vec3_near(cam.right_dir(), Vec3::X, 1e-6);
        assert_vec3_near(cam.up_dir(), Vec3::NEG_Z, 1e-6);
    }

    #[test]
    fn translate_target_pans_opposite() {
        let mut cam = Camera::new(Vec3::new(0.0, -10.0, 0.0));
        cam.translate_target(Vec3::new(2.0, 0.0, 0.0));
        assert_vec3_near(cam.target(), Vec3::new(-2.0, 0.0, 0.0), 1e-6);

        // scene content appears shifted by -offset in view space
        let viewed = cam.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_vec3_near(viewed.truncate(), Vec3::new(-2.0, 10.0, 0.0), 1e-6);
    }

    #[test]
    fn target_local_pan_follows_orbit() {
        let mut cam = Camera::new(Vec3::new(0.0, -10.0, 0.0));
        // orbit a quarter turn about the up axis: camera-local X now maps
        // to a different world direction
        cam.rotate(Vec3::Z, 90.0);
        let before = cam.target();
        cam.translate_target_local(Axis::X, 1.0);
        let delta = cam.target() - before;
        assert!((delta.length() - 1.0).abs() < 1e-5);
        // the pan is no longer along world X
        assert!(delta.x.abs() < 1e-4);
    }

    #[test]
    fn rotate_keeps_focus_distance() {
        let mut cam = Camera::new(Vec3::new(0.0, -10.0, 0.0));
        cam.rotate(Vec3::Z, 33.0);
        cam.rotate(Vec3::X, -20.0);
        let viewed = cam.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        // orbiting never changes the distance to the focus point
        assert!((viewed.truncate().length() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn rotate_moves_front_direction() {
        let mut cam = Camera::new(Vec3::new(0.0, -10.0, 0.0));
        cam.rotate(Vec3::Z, 90.0);
        // a quarter orbit about up swings the view axis into world X
        let front = cam.front_dir();
        assert!(front.y.abs() < 1e-4);
        assert!((front.x.abs() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn rotate_relative_spins_in_place() {
        let mut cam = Camera::new(Vec3::new(0.0, -10.0, 0.0));
        cam.rotate_relative(Vec3::new(0.0, 1.0, 0.0), 45.0);
        // rolling about the view axis keeps the front direction fixed
        assert_vec3_near(cam.front_dir(), Vec3::Y, 1e-5);
    }

    #[test]
    fn rotate_xy_is_symmetric() {
        let mut cam = Camera::new(Vec3::new(0.0, -10.0, 0.0));
        cam.rotate(Vec3::Z, 50.0);
        let before = cam.view_matrix();

        cam.rotate_xy(25.0);
        cam.rotate_xy(-25.0);
        assert_mat4_near(cam.view_matrix(), before, 1e-4);
    }

    #[test]
    fn rotate_xy_tilts_out_of_plane() {
        // after orbiting about Z, a turntable tilt must still change the up
        // direction while preserving focus distance
        let mut cam = Camera::new(Vec3::new(0.0, -10.0, 0.0));
        cam.rotate(Vec3::Z, 90.0);
        let up_before = cam.up_dir();
        cam.rotate_xy(45.0);
        assert!((cam.up_dir() - up_before).length() > 0.1);
        let viewed = cam.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((viewed.truncate().length() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn scale_accumulates_factors() {
        let mut cam = Camera::new(Vec3::new(0.0, -10.0, 0.0));
        cam.scale(2.0, Vec3::ONE);
        cam.scale(1.5, Vec3::ONE);
        assert_vec3_near(cam.scaling(), Vec3::splat(3.0), 1e-6);
    }

    #[test]
    fn scale_zooms_scene_about_focus() {
        let mut cam = Camera::new(Vec3::new(0.0, -10.0, 0.0));
        cam.scale(2.0, Vec3::ONE);
        let viewed = cam.view_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        // points move twice as far from the view axis
        assert!((viewed.x.abs() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn perspective_projection_is_set() {
        let mut cam = Camera::new(Vec3::new(0.0, -10.0, 0.0));
        assert_eq!(cam.projection_matrix(), Mat4::IDENTITY);
        cam.set_projection(Projection::Perspective, 800.0, 600.0, 0.1, 1000.0, 60.0);
        assert_ne!(cam.projection_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn orthographic_projection_spans_extent() {
        let mut cam = Camera::new(Vec3::new(0.0, -10.0, 0.0));
        cam.set_projection(Projection::Orthographic, 4.0, 2.0, 0.1, 100.0, 0.0);
        let proj = cam.projection_matrix();
        // the extent edges map to the clip boundary
        let right = proj * Vec4::new(2.0, 0.0, 1.0, 1.0);
        assert!((right.x - 1.0).abs() < 1e-5);
        let top = proj * Vec4::new(0.0, 1.0, 1.0, 1.0);
        assert!((top.y - 1.0).abs() < 1e-5);
    }
}
