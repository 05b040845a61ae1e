//! Axis-aligned bounding boxes derived from mesh geometry.
//!
//! A [`BoundingBox`] stores a center position and full dimensions per axis.
//! Boxes are normally derived — recomputed from vertex positions on every
//! buffer sync — rather than authored, except through the explicit
//! [`BoundingBox::calculate`] lower/upper-bound constructor.
//!
//! Each dimension is floored at 0.1 so that flat geometry (a plane, a
//! polygon) still yields a box a ray can enter instead of a degenerate
//! zero-thickness slab.

use glam::Vec3;

use crate::ray::Ray;

/// Minimum box thickness per axis.
const DIMENSION_FLOOR: f32 = 0.1;

/// Outcome of a ray/box query. See [`BoundingBox::intersect`].
pub const FRONT_HIT: i32 = 1;
/// Outcome of a ray/box query: no intersection evidence at all.
pub const NO_HIT: i32 = 0;

/// An axis-aligned box given by center position and full dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    position: Vec3,
    dimensions: Vec3,
}

impl BoundingBox {
    /// Creates a box directly from a center and full dimensions.
    pub fn new(position: Vec3, dimensions: Vec3) -> Self {
        Self {
            position,
            dimensions,
        }
    }

    /// Overwrites center and dimensions without applying the floor.
    pub fn update(&mut self, position: Vec3, dimensions: Vec3) {
        self.position = position;
        self.dimensions = dimensions;
    }

    /// Derives the box from a lower and upper corner.
    ///
    /// The center is the midpoint; each dimension is `|upper - lower|`
    /// floored at 0.1 per axis.
    ///
    /// ```
    /// use glam::Vec3;
    /// use meshplot::BoundingBox;
    ///
    /// let mut bounds = BoundingBox::default();
    /// bounds.calculate(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
    /// assert_eq!(bounds.dimensions(), Vec3::new(2.0, 2.0, 0.1));
    /// ```
    pub fn calculate(&mut self, lower: Vec3, upper: Vec3) {
        self.dimensions = Vec3::new(
            (upper.x - lower.x).abs().max(DIMENSION_FLOOR),
            (upper.y - lower.y).abs().max(DIMENSION_FLOOR),
            (upper.z - lower.z).abs().max(DIMENSION_FLOOR),
        );
        self.position = 0.5 * (upper + lower);
    }

    /// Box center.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Full box dimensions per axis.
    #[inline]
    pub fn dimensions(&self) -> Vec3 {
        self.dimensions
    }

    /// Tests the ray against all six faces of the box, triangulated.
    ///
    /// Returns [`FRONT_HIT`] (1) as soon as the running triangle-hit count
    /// reaches 2 after any face pair — a ray that truly enters a convex box
    /// must cross at least two of its triangulated faces. Returns
    /// [`NO_HIT`] (0) on a clean miss. If the scan completes with a single
    /// hit (edge/corner graze, or a numerically incomplete double hit), the
    /// negated count is returned to flag "intersection evidence, but
    /// inconclusive". This early-exit/fallback asymmetry is the documented
    /// contract of the query, not an optimization detail.
    pub fn intersect(&self, ray: &Ray) -> i32 {
        if self.dimensions.x <= 0.0 || self.dimensions.y <= 0.0 || self.dimensions.z <= 0.0 {
            return NO_HIT;
        }

        let p = self.position;
        let h = self.dimensions * 0.5;
        let mut count = 0;

        // bottom and top quads
        for i in [-1.0f32, 1.0] {
            count += ray.intersect_triangle(
                Vec3::new(p.x - h.x, p.y - h.y, p.z + i * h.z),
                Vec3::new(p.x + h.x, p.y - h.y, p.z + i * h.z),
                Vec3::new(p.x + h.x, p.y + h.y, p.z + i * h.z),
            ) as i32;
            count += ray.intersect_triangle(
                Vec3::new(p.x - h.x, p.y - h.y, p.z + i * h.z),
                Vec3::new(p.x - h.x, p.y + h.y, p.z + i * h.z),
                Vec3::new(p.x + h.x, p.y + h.y, p.z + i * h.z),
            ) as i32;
            if count >= 2 {
                return FRONT_HIT;
            }
        }

        // front and back quads
        for i in [-1.0f32, 1.0] {
            count += ray.intersect_triangle(
                Vec3::new(p.x - h.x, p.y + i * h.y, p.z - h.z),
                Vec3::new(p.x + h.x, p.y + i * h.y, p.z - h.z),
                Vec3::new(p.x + h.x, p.y + i * h.y, p.z + h.z),
            ) as i32;
            count += ray.intersect_triangle(
                Vec3::new(p.x - h.x, p.y + i * h.y, p.z - h.z),
                Vec3::new(p.x - h.x, p.y + i * h.y, p.z + h.z),
                Vec3::new(p.x + h.x, p.y + i * h.y, p.z + h.z),
            ) as i32;
            if count >= 2 {
                return FRONT_HIT;
            }
        }

        // left and right quads
        for i in [-1.0f32, 1.0] {
            count += ray.intersect_triangle(
                Vec3::new(p.x + i * h.x, p.y - h.y, p.z - h.z),
                Vec3::new(p.x + i * h.x, p.y + h.y, p.z - h.z),
                Vec3::new(p.x + i * h.x, p.y + h.y, p.z + h.z),
            ) as i32;
            count += ray.intersect_triangle(
                Vec3::new(p.x + i * h.x, p.y - h.y, p.z - h.z),
                Vec3::new(p.x + i * h.x, p.y - h.y, p.z + h.z),
                Vec3::new(p.x + i * h.x, p.y + h.y, p.z + h.z),
            ) as i32;
            if count >= 2 {
                return FRONT_HIT;
            }
        }

        -count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BoundingBox {
        BoundingBox::new(Vec3::ZERO, Vec3::ONE)
    }

    #[test]
    fn calculate_midpoint_and_dimensions() {
        let mut bounds = BoundingBox::default();
        bounds.calculate(Vec3::new(-2.0, 1.0, -3.0), Vec3::new(4.0, 5.0, 3.0));
        assert_eq!(bounds.position(), Vec3::new(1.0, 3.0, 0.0));
        assert_eq!(bounds.dimensions(), Vec3::new(6.0, 4.0, 6.0));
    }

    #[test]
    fn calculate_floors_degenerate_axes() {
        let mut bounds = BoundingBox::default();
        bounds.calculate(Vec3::new(-1.0, -1.0, 0.5), Vec3::new(1.0, 1.0, 0.5));
        assert_eq!(bounds.dimensions().z, 0.1);
        assert_eq!(bounds.position().z, 0.5);
    }

    #[test]
    fn ray_at_center_front_hits() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::Z);
        assert_eq!(unit_box().intersect(&ray), FRONT_HIT);
    }

    #[test]
    fn ray_aimed_away_misses() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::NEG_Z);
        assert_eq!(unit_box().intersect(&ray), NO_HIT);
    }

    #[test]
    fn ray_offset_from_box_misses() {
        let ray = Ray::new(Vec3::new(5.0, 5.0, -10.0), Vec3::Z);
        assert_eq!(unit_box().intersect(&ray), NO_HIT);
    }

    #[test]
    fn diagonal_entry_still_front_hits() {
        let ray = Ray::new(Vec3::new(-3.0, -3.0, -3.0), Vec3::ONE);
        assert_eq!(unit_box().intersect(&ray), FRONT_HIT);
    }

    #[test]
    fn invalid_ray_misses() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::ZERO);
        assert_eq!(unit_box().intersect(&ray), NO_HIT);
    }

    #[test]
    fn edge_tangent_ray_does_not_panic() {
        // grazing exactly along an edge is a documented ambiguous case; the
        // only requirement is a result in {1, 0, -count}
        let ray = Ray::new(Vec3::new(0.5, 0.5, -10.0), Vec3::Z);
        let result = unit_box().intersect(&ray);
        assert!(result <= 1);
    }
}
