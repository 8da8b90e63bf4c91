//! # Linear Algebra Kernel
//!
//! Matrix and vector helpers shared by every other module. Everything here is
//! built on cgmath; this module only adds what the engine's conventions need:
//! TRS composition with Y-X-Z Euler angles in degrees, the normal-matrix
//! extraction used for shading, and projection builders that produce the
//! 0..1 clip-space depth wgpu expects.
//!
//! All angle inputs at the public boundary are in degrees.

use cgmath::{Deg, EuclideanSpace, InnerSpace, Matrix3, Matrix4, Point3, SquareMatrix, Vector3};

/// Converts the OpenGL-style -1..1 clip-space depth produced by cgmath into
/// the 0..1 range wgpu uses. `Matrix4::new` takes column-major arguments, so
/// each source row below is one column of the matrix.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Guard against division by zero for degenerate aspect ratios, UV deltas
/// and ray direction components.
pub const EPSILON: f32 = 1e-6;

/// Composes a model matrix as `T * (Ry * Rx * Rz) * S`.
///
/// Rotation is Euler Y-X-Z order with angles in degrees, matching the
/// engine-wide convention that all public angles are degrees.
pub fn compose_trs(
    position: Vector3<f32>,
    rotation_deg: Vector3<f32>,
    scale: Vector3<f32>,
) -> Matrix4<f32> {
    let translation = Matrix4::from_translation(position);
    let rotation = Matrix4::from_angle_y(Deg(rotation_deg.y))
        * Matrix4::from_angle_x(Deg(rotation_deg.x))
        * Matrix4::from_angle_z(Deg(rotation_deg.z));
    let scaling = Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z);
    translation * rotation * scaling
}

/// Extracts the 3x3 normal matrix from a model matrix.
///
/// This is the upper-left 3x3 block, which equals the inverse transpose only
/// for orthogonal transforms. Non-uniform scale therefore skews normals; the
/// engine accepts that approximation.
pub fn normal_matrix(model: &Matrix4<f32>) -> Matrix3<f32> {
    Matrix3::from_cols(
        model.x.truncate(),
        model.y.truncate(),
        model.z.truncate(),
    )
}

/// Builds a perspective projection with wgpu clip-space depth.
///
/// Field of view is in degrees. A degenerate aspect ratio falls back to 1.0
/// instead of propagating a division by zero through the matrix.
pub fn perspective_deg(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    let aspect = if aspect.abs() < EPSILON { 1.0 } else { aspect };
    OPENGL_TO_WGPU_MATRIX * cgmath::perspective(Deg(fov_deg), aspect, near, far)
}

/// Builds a symmetric orthographic projection of `half_size` extent on both
/// axes, used for the directional-light shadow frustum.
pub fn ortho_centered(half_size: f32, near: f32, far: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * cgmath::ortho(-half_size, half_size, -half_size, half_size, near, far)
}

/// Right-handed look-at view matrix.
///
/// Falls back to identity when eye and target coincide, rather than
/// producing a NaN-filled matrix.
pub fn look_at(eye: Vector3<f32>, target: Vector3<f32>, up: Vector3<f32>) -> Matrix4<f32> {
    if (target - eye).magnitude2() < EPSILON * EPSILON {
        return Matrix4::identity();
    }
    Matrix4::look_at_rh(Point3::from_vec(eye), Point3::from_vec(target), up)
}

/// Transforms a point by a matrix, performing the homogeneous divide.
pub fn transform_point(matrix: &Matrix4<f32>, point: Vector3<f32>) -> Vector3<f32> {
    let v = matrix * point.extend(1.0);
    if v.w.abs() < EPSILON {
        v.truncate()
    } else {
        v.truncate() / v.w
    }
}

/// Converts a `Matrix4` into the nested-array form uniform buffers use.
pub fn mat4_to_array(matrix: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix.into()
}

/// Converts a `Matrix3` into three padded columns, matching the 16-byte
/// column alignment of `mat3x3<f32>` in WGSL uniform buffers.
pub fn mat3_to_padded_array(matrix: Matrix3<f32>) -> [[f32; 4]; 3] {
    [
        [matrix.x.x, matrix.x.y, matrix.x.z, 0.0],
        [matrix.y.x, matrix.y.y, matrix.y.z, 0.0],
        [matrix.z.x, matrix.z.y, matrix.z.z, 0.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::Zero;

    #[test]
    fn trs_applied_to_origin_yields_translation() {
        let m = compose_trs(
            Vector3::new(1.0, -2.0, 3.0),
            Vector3::new(30.0, 45.0, 60.0),
            Vector3::new(2.0, 0.5, 1.5),
        );
        let p = transform_point(&m, Vector3::zero());
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, -2.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn trs_without_rotation_and_scale_is_pure_translation() {
        let m = compose_trs(
            Vector3::new(4.0, 5.0, 6.0),
            Vector3::zero(),
            Vector3::new(1.0, 1.0, 1.0),
        );
        let p = transform_point(&m, Vector3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p.x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 6.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 7.0, epsilon = 1e-5);
    }

    #[test]
    fn rotation_order_is_y_x_z() {
        // 90 degrees around Y maps +Z to +X in a right-handed system.
        let m = compose_trs(
            Vector3::zero(),
            Vector3::new(0.0, 90.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
        );
        let p = transform_point(&m, Vector3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn normal_matrix_drops_translation() {
        let m = compose_trs(
            Vector3::new(10.0, 20.0, 30.0),
            Vector3::zero(),
            Vector3::new(1.0, 1.0, 1.0),
        );
        let n = normal_matrix(&m);
        let v = n * Vector3::new(0.0, 1.0, 0.0);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn perspective_guards_zero_aspect() {
        let m = perspective_deg(60.0, 0.0, 0.1, 100.0);
        // Falling back to aspect 1.0 means x and y scale match.
        assert_relative_eq!(m.x.x, m.y.y, epsilon = 1e-5);
    }

    #[test]
    fn perspective_maps_near_and_far_onto_unit_depth() {
        let m = perspective_deg(60.0, 1.0, 0.1, 100.0);
        let near = transform_point(&m, Vector3::new(0.0, 0.0, -0.1));
        let far = transform_point(&m, Vector3::new(0.0, 0.0, -100.0));
        assert_relative_eq!(near.z, 0.0, epsilon = 1e-4);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn ortho_maps_near_and_far_onto_unit_depth() {
        let m = ortho_centered(20.0, 1.0, 50.0);
        let near = transform_point(&m, Vector3::new(0.0, 0.0, -1.0));
        let far = transform_point(&m, Vector3::new(0.0, 0.0, -50.0));
        assert_relative_eq!(near.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-5);
        // Depth conversion must leave x/y and the homogeneous w untouched.
        let corner = transform_point(&m, Vector3::new(20.0, -20.0, -1.0));
        assert_relative_eq!(corner.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(corner.y, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn look_at_degenerate_eye_target_is_identity() {
        let eye = Vector3::new(1.0, 2.0, 3.0);
        let m = look_at(eye, eye, Vector3::unit_y());
        assert_eq!(m, Matrix4::identity());
    }
}
