//! Perspective camera state and the matrices derived from it each frame.

use cgmath::{InnerSpace, Matrix4, Vector3};

use crate::math::{self, EPSILON};
use crate::spatial::Ray;

/// Eye/target perspective camera. Field of view is in degrees, like every
/// angle at the public boundary.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vector3::new(0.0, 3.0, 5.0),
            target: Vector3::new(0.0, 0.0, 0.0),
            fov_deg: 60.0,
            near: 0.1,
            far: 500.0,
        }
    }
}

impl Camera {
    pub fn view_matrix(&self) -> Matrix4<f32> {
        math::look_at(self.eye, self.target, Vector3::unit_y())
    }

    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        math::perspective_deg(self.fov_deg, aspect, self.near, self.far)
    }

    /// Normalized view direction. Degenerates to -Z when eye and target
    /// coincide.
    pub fn forward(&self) -> Vector3<f32> {
        let f = self.target - self.eye;
        if f.magnitude2() < EPSILON * EPSILON {
            -Vector3::unit_z()
        } else {
            f.normalize()
        }
    }

    pub fn right(&self) -> Vector3<f32> {
        let r = self.forward().cross(Vector3::unit_y());
        if r.magnitude2() < EPSILON * EPSILON {
            Vector3::unit_x()
        } else {
            r.normalize()
        }
    }

    pub fn up(&self) -> Vector3<f32> {
        self.right().cross(self.forward())
    }

    /// Builds a world-space picking ray through a screen pixel.
    ///
    /// The direction is assembled in view space from the field of view and
    /// aspect ratio, then rotated into world space by the camera basis.
    pub fn screen_ray(&self, screen_x: f32, screen_y: f32, width: f32, height: f32) -> Ray {
        let width = width.max(1.0);
        let height = height.max(1.0);
        let aspect = width / height;

        let ndc_x = 2.0 * screen_x / width - 1.0;
        let ndc_y = 1.0 - 2.0 * screen_y / height;

        let tan_half_fov = (self.fov_deg.to_radians() * 0.5).tan();
        let direction = self.forward()
            + self.right() * (ndc_x * tan_half_fov * aspect)
            + self.up() * (ndc_y * tan_half_fov);

        Ray::new(self.eye, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn basis_is_orthonormal() {
        let camera = Camera {
            eye: Vector3::new(3.0, 2.0, 7.0),
            target: Vector3::new(-1.0, 0.5, -2.0),
            ..Default::default()
        };
        let (f, r, u) = (camera.forward(), camera.right(), camera.up());
        assert_relative_eq!(f.dot(r), 0.0, epsilon = 1e-5);
        assert_relative_eq!(f.dot(u), 0.0, epsilon = 1e-5);
        assert_relative_eq!(r.dot(u), 0.0, epsilon = 1e-5);
        assert_relative_eq!(f.magnitude(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn center_screen_ray_points_along_forward() {
        let camera = Camera {
            eye: Vector3::new(0.0, 0.0, 5.0),
            target: Vector3::new(0.0, 0.0, 0.0),
            ..Default::default()
        };
        let ray = camera.screen_ray(400.0, 300.0, 800.0, 600.0);
        assert_relative_eq!(ray.direction.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ray.direction.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ray.direction.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn left_half_of_screen_bends_ray_left() {
        let camera = Camera {
            eye: Vector3::new(0.0, 0.0, 5.0),
            target: Vector3::new(0.0, 0.0, 0.0),
            ..Default::default()
        };
        let ray = camera.screen_ray(0.0, 300.0, 800.0, 600.0);
        assert!(ray.direction.x < 0.0);
    }
}
