//! # Ray and AABB Queries
//!
//! Slab-method ray/AABB intersection, bounding-box transform and overlap
//! utilities. These back the engine's picking operations but are also part
//! of the public surface for callers doing their own spatial tests.

use cgmath::{InnerSpace, Matrix4, Vector3, Zero};

use crate::math::{transform_point, EPSILON};

/// A world-space ray with normalized direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vector3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Creates a ray, normalizing the direction. A near-zero direction is
    /// kept as-is; the slab test then rejects per-axis as appropriate.
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        let direction = if direction.magnitude2() < EPSILON * EPSILON {
            direction
        } else {
            direction.normalize()
        };
        Self { origin, direction }
    }

    /// Point along the ray at distance `t`.
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box as a min/max corner pair.
///
/// Used in object space for mesh bounds (fixed at mesh creation) and in
/// world space for picking, via [`Aabb::transform`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Min/max reduction over a vertex position list. An empty list yields a
    /// degenerate box at the origin.
    pub fn from_positions(positions: &[[f32; 3]]) -> Self {
        let Some(first) = positions.first() else {
            return Self::new(Vector3::zero(), Vector3::zero());
        };
        let mut min = Vector3::from(*first);
        let mut max = min;
        for p in positions.iter().skip(1) {
            min.x = min.x.min(p[0]);
            min.y = min.y.min(p[1]);
            min.z = min.z.min(p[2]);
            max.x = max.x.max(p[0]);
            max.y = max.y.max(p[1]);
            max.z = max.z.max(p[2]);
        }
        Self::new(min, max)
    }

    /// Slab-method ray intersection.
    ///
    /// Returns the distance to the entry point (or the exit point when the
    /// origin is inside the box), or `None` on a miss. A near-zero direction
    /// component degenerates to "reject unless the origin lies within that
    /// axis's slab".
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            let (min, max) = (self.min[axis], self.max[axis]);

            if dir.abs() < EPSILON {
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let (t0, t1) = {
                let a = (min - origin) * inv;
                let b = (max - origin) * inv;
                if a <= b {
                    (a, b)
                } else {
                    (b, a)
                }
            };
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }

        if t_far < 0.0 {
            return None;
        }
        Some(if t_near >= 0.0 { t_near } else { t_far })
    }

    /// Interval-overlap test on all three axes. Symmetric by construction.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Recomputes a tight world-space box by transforming all eight corners
    /// and min/max-reducing. Over-estimates volume under rotation, which the
    /// engine accepts consistently.
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = [
            Vector3::new(self.min.x, self.min.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.min.z),
            Vector3::new(self.min.x, self.max.y, self.min.z),
            Vector3::new(self.min.x, self.min.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.max.z),
            Vector3::new(self.min.x, self.max.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut points = [[0.0f32; 3]; 8];
        for (dst, corner) in points.iter_mut().zip(corners) {
            let p = transform_point(matrix, corner);
            *dst = [p.x, p.y, p.z];
        }
        Self::from_positions(&points)
    }
}

/// Result of a closest-hit raycast over the live mesh registry.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub hit: bool,
    /// Handle of the hit mesh, 0 on a miss.
    pub mesh: crate::arena::Handle,
    pub distance: f32,
    pub point: Vector3<f32>,
}

impl RayHit {
    pub fn miss() -> Self {
        Self {
            hit: false,
            mesh: 0,
            distance: 0.0,
            point: Vector3::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_cube() -> Aabb {
        Aabb::new(Vector3::new(-0.5, -0.5, -0.5), Vector3::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn ray_hits_unit_cube_head_on() {
        let ray = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        let t = unit_cube().intersect_ray(&ray).expect("should hit");
        assert_relative_eq!(t, 4.5, epsilon = 1e-5);
        let p = ray.point_at(t);
        assert_relative_eq!(p.z, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn ray_misses_offset_cube() {
        let ray = Ray::new(Vector3::new(5.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(unit_cube().intersect_ray(&ray).is_none());
    }

    #[test]
    fn ray_from_inside_reports_exit_distance() {
        let ray = Ray::new(Vector3::zero(), Vector3::new(1.0, 0.0, 0.0));
        let t = unit_cube().intersect_ray(&ray).expect("should hit");
        assert_relative_eq!(t, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn zero_direction_component_rejects_outside_slab() {
        // Direction has no Y component and the origin is above the box.
        let ray = Ray::new(Vector3::new(0.0, 2.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(unit_cube().intersect_ray(&ray).is_none());

        // Same direction but origin inside the Y slab still hits.
        let ray = Ray::new(Vector3::new(0.0, 0.25, 5.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(unit_cube().intersect_ray(&ray).is_some());
    }

    #[test]
    fn box_fully_behind_ray_is_a_miss() {
        let ray = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(unit_cube().intersect_ray(&ray).is_none());
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = unit_cube();
        let b = Aabb::new(Vector3::new(0.25, 0.25, 0.25), Vector3::new(2.0, 2.0, 2.0));
        let c = Aabb::new(Vector3::new(3.0, 3.0, 3.0), Vector3::new(4.0, 4.0, 4.0));
        assert_eq!(a.overlaps(&b), b.overlaps(&a));
        assert!(a.overlaps(&b));
        assert_eq!(a.overlaps(&c), c.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn transform_translates_bounds() {
        let moved = unit_cube().transform(&Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0)));
        assert_relative_eq!(moved.min.x, 9.5, epsilon = 1e-5);
        assert_relative_eq!(moved.max.x, 10.5, epsilon = 1e-5);
    }

    #[test]
    fn transform_under_rotation_stays_conservative() {
        // Rotating a unit cube 45 degrees around Y grows the XZ extent.
        let rotated = unit_cube().transform(&Matrix4::from_angle_y(cgmath::Deg(45.0)));
        let half = std::f32::consts::SQRT_2 * 0.5;
        assert_relative_eq!(rotated.max.x, half, epsilon = 1e-5);
        assert_relative_eq!(rotated.max.z, half, epsilon = 1e-5);
    }
}
