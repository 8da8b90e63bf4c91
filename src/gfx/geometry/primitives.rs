//! # Primitive Shape Generation
//!
//! Generators for the built-in mesh primitives. All shapes are Y-up,
//! centered at the origin, with outward normals, 0..1 UVs and tangents
//! derived from the UV gradient.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate a box of the given dimensions centered at the origin.
pub fn generate_cube(width: f32, height: f32, depth: f32) -> GeometryData {
    let mut data = GeometryData::new();

    let (hw, hh, hd) = (width * 0.5, height * 0.5, depth * 0.5);

    // 24 vertices, 4 per face, so each face gets flat normals and clean UVs.
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        // +Z
        (
            [0.0, 0.0, 1.0],
            [[-hw, -hh, hd], [hw, -hh, hd], [hw, hh, hd], [-hw, hh, hd]],
        ),
        // -Z
        (
            [0.0, 0.0, -1.0],
            [[hw, -hh, -hd], [-hw, -hh, -hd], [-hw, hh, -hd], [hw, hh, -hd]],
        ),
        // -X
        (
            [-1.0, 0.0, 0.0],
            [[-hw, -hh, -hd], [-hw, -hh, hd], [-hw, hh, hd], [-hw, hh, -hd]],
        ),
        // +X
        (
            [1.0, 0.0, 0.0],
            [[hw, -hh, hd], [hw, -hh, -hd], [hw, hh, -hd], [hw, hh, hd]],
        ),
        // +Y
        (
            [0.0, 1.0, 0.0],
            [[-hw, hh, hd], [hw, hh, hd], [hw, hh, -hd], [-hw, hh, -hd]],
        ),
        // -Y
        (
            [0.0, -1.0, 0.0],
            [[-hw, -hh, -hd], [hw, -hh, -hd], [hw, -hh, hd], [-hw, -hh, hd]],
        ),
    ];
    let face_uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    for (normal, corners) in faces {
        let base = data.positions.len() as u32;
        for (corner, uv) in corners.iter().zip(face_uvs.iter()) {
            data.positions.push(*corner);
            data.normals.push(normal);
            data.uvs.push(*uv);
        }
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data.compute_tangents();
    data
}

/// Generate a UV sphere of the given radius.
///
/// `slices` is the longitudinal resolution, `stacks` the latitudinal.
pub fn generate_sphere(radius: f32, slices: u32, stacks: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let slices = slices.max(3);
    let stacks = stacks.max(2);

    for stack in 0..=stacks {
        let theta = stack as f32 * PI / stacks as f32;
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();

        for slice in 0..=slices {
            let phi = slice as f32 * 2.0 * PI / slices as f32;

            let x = sin_theta * phi.cos();
            let y = cos_theta;
            let z = sin_theta * phi.sin();

            data.positions.push([x * radius, y * radius, z * radius]);
            data.normals.push([x, y, z]);
            data.uvs.push([
                slice as f32 / slices as f32,
                stack as f32 / stacks as f32,
            ]);
        }
    }

    for stack in 0..stacks {
        for slice in 0..slices {
            let first = stack * (slices + 1) + slice;
            let second = first + slices + 1;

            data.indices.extend_from_slice(&[first, second, first + 1]);
            data.indices
                .extend_from_slice(&[second, second + 1, first + 1]);
        }
    }

    data.compute_tangents();
    data
}

/// Generate a flat plane in the XZ plane with the normal pointing up.
pub fn generate_plane(width: f32, depth: f32) -> GeometryData {
    let mut data = GeometryData::new();

    let (hw, hd) = (width * 0.5, depth * 0.5);
    data.positions = vec![
        [-hw, 0.0, hd],
        [hw, 0.0, hd],
        [hw, 0.0, -hd],
        [-hw, 0.0, -hd],
    ];
    data.normals = vec![[0.0, 1.0, 0.0]; 4];
    data.uvs = vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
    data.indices = vec![0, 1, 2, 2, 3, 0];

    data.compute_tangents();
    data
}

/// Generate a capped cylinder along the Y axis.
pub fn generate_cylinder(radius: f32, height: f32, segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let segments = segments.max(3);
    let half_height = height * 0.5;

    // Side wall.
    for i in 0..=segments {
        let angle = i as f32 * 2.0 * PI / segments as f32;
        let (sin_a, cos_a) = angle.sin_cos();
        let u = i as f32 / segments as f32;

        data.positions
            .push([radius * cos_a, -half_height, radius * sin_a]);
        data.normals.push([cos_a, 0.0, sin_a]);
        data.uvs.push([u, 1.0]);

        data.positions
            .push([radius * cos_a, half_height, radius * sin_a]);
        data.normals.push([cos_a, 0.0, sin_a]);
        data.uvs.push([u, 0.0]);
    }
    for i in 0..segments {
        let bottom = i * 2;
        let top = bottom + 1;
        let next_bottom = bottom + 2;
        let next_top = bottom + 3;
        data.indices
            .extend_from_slice(&[bottom, top, next_bottom, top, next_top, next_bottom]);
    }

    // Caps, each with its own center vertex and flat normals.
    for (y, normal) in [(-half_height, [0.0, -1.0, 0.0]), (half_height, [0.0, 1.0, 0.0])] {
        let center = data.positions.len() as u32;
        data.positions.push([0.0, y, 0.0]);
        data.normals.push(normal);
        data.uvs.push([0.5, 0.5]);

        for i in 0..=segments {
            let angle = i as f32 * 2.0 * PI / segments as f32;
            let (sin_a, cos_a) = angle.sin_cos();
            data.positions.push([radius * cos_a, y, radius * sin_a]);
            data.normals.push(normal);
            data.uvs.push([0.5 + cos_a * 0.5, 0.5 + sin_a * 0.5]);
        }
        for i in 0..segments {
            let current = center + 1 + i;
            let next = current + 1;
            if normal[1] < 0.0 {
                data.indices.extend_from_slice(&[center, current, next]);
            } else {
                data.indices.extend_from_slice(&[center, next, current]);
            }
        }
    }

    data.compute_tangents();
    data
}

/// Generate a capsule along the Y axis.
///
/// `height` is the length of the cylindrical midsection; total extent is
/// `height + 2 * radius`.
pub fn generate_capsule(radius: f32, height: f32, segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let segments = segments.max(3);
    let rings = segments.max(2);
    let half_height = height * 0.5;

    // Stacked rings: top hemisphere, then bottom hemisphere, sharing the
    // equator rows with the implicit cylindrical midsection.
    for ring in 0..=(rings * 2) {
        // 0..PI over both hemispheres; the Y offset jumps at the equator.
        let theta = ring as f32 * PI / (rings * 2) as f32;
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();
        let y_offset = if ring <= rings { half_height } else { -half_height };

        for slice in 0..=segments {
            let phi = slice as f32 * 2.0 * PI / segments as f32;
            let x = sin_theta * phi.cos();
            let z = sin_theta * phi.sin();

            data.positions
                .push([x * radius, cos_theta * radius + y_offset, z * radius]);
            data.normals.push([x, cos_theta, z]);
            data.uvs.push([
                slice as f32 / segments as f32,
                ring as f32 / (rings * 2) as f32,
            ]);
        }
    }

    let row = segments + 1;
    for ring in 0..(rings * 2) {
        for slice in 0..segments {
            let first = ring * row + slice;
            let second = first + row;
            data.indices.extend_from_slice(&[first, second, first + 1]);
            data.indices
                .extend_from_slice(&[second, second + 1, first + 1]);
        }
    }

    data.compute_tangents();
    data
}

/// Generate a torus in the XZ plane.
///
/// `major_radius` is the ring radius, `minor_radius` the tube radius.
pub fn generate_torus(
    major_radius: f32,
    minor_radius: f32,
    major_segments: u32,
    minor_segments: u32,
) -> GeometryData {
    let mut data = GeometryData::new();

    let major_segments = major_segments.max(3);
    let minor_segments = minor_segments.max(3);

    for major in 0..=major_segments {
        let major_angle = major as f32 * 2.0 * PI / major_segments as f32;
        let (sin_major, cos_major) = major_angle.sin_cos();

        for minor in 0..=minor_segments {
            let minor_angle = minor as f32 * 2.0 * PI / minor_segments as f32;
            let (sin_minor, cos_minor) = minor_angle.sin_cos();

            let ring = major_radius + minor_radius * cos_minor;
            data.positions.push([
                ring * cos_major,
                minor_radius * sin_minor,
                ring * sin_major,
            ]);
            data.normals
                .push([cos_minor * cos_major, sin_minor, cos_minor * sin_major]);
            data.uvs.push([
                major as f32 / major_segments as f32,
                minor as f32 / minor_segments as f32,
            ]);
        }
    }

    let row = minor_segments + 1;
    for major in 0..major_segments {
        for minor in 0..minor_segments {
            let first = major * row + minor;
            let second = first + row;
            data.indices.extend_from_slice(&[first, second, first + 1]);
            data.indices
                .extend_from_slice(&[second, second + 1, first + 1]);
        }
    }

    data.compute_tangents();
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::InnerSpace;

    #[test]
    fn cube_has_24_vertices_and_12_triangles() {
        let cube = generate_cube(1.0, 1.0, 1.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        let aabb = cube.aabb();
        assert_relative_eq!(aabb.min.x, -0.5);
        assert_relative_eq!(aabb.max.z, 0.5);
    }

    #[test]
    fn cube_respects_non_uniform_dimensions() {
        let cube = generate_cube(2.0, 4.0, 6.0);
        let aabb = cube.aabb();
        assert_relative_eq!(aabb.max.x, 1.0);
        assert_relative_eq!(aabb.max.y, 2.0);
        assert_relative_eq!(aabb.max.z, 3.0);
    }

    #[test]
    fn sphere_vertices_sit_on_the_radius() {
        let sphere = generate_sphere(2.0, 16, 8);
        for position in &sphere.positions {
            let r = cgmath::Vector3::from(*position).magnitude();
            assert_relative_eq!(r, 2.0, epsilon = 1e-4);
        }
        assert_eq!(sphere.positions.len(), sphere.normals.len());
        assert_eq!(sphere.positions.len(), sphere.tangents.len());
    }

    #[test]
    fn plane_normal_points_up() {
        let plane = generate_plane(10.0, 10.0);
        assert_eq!(plane.vertex_count(), 4);
        for normal in &plane.normals {
            assert_eq!(*normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn cylinder_bounds_match_its_dimensions() {
        let cylinder = generate_cylinder(1.0, 4.0, 12);
        let aabb = cylinder.aabb();
        assert_relative_eq!(aabb.min.y, -2.0);
        assert_relative_eq!(aabb.max.y, 2.0);
        assert_relative_eq!(aabb.max.x, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn capsule_extends_the_height_by_the_radius() {
        let capsule = generate_capsule(0.5, 2.0, 12);
        let aabb = capsule.aabb();
        assert_relative_eq!(aabb.max.y, 1.5, epsilon = 1e-4);
        assert_relative_eq!(aabb.min.y, -1.5, epsilon = 1e-4);
    }

    #[test]
    fn torus_bounds_are_major_plus_minor_radius() {
        let torus = generate_torus(2.0, 0.5, 16, 8);
        let aabb = torus.aabb();
        assert_relative_eq!(aabb.max.x, 2.5, epsilon = 1e-4);
        assert_relative_eq!(aabb.max.y, 0.5, epsilon = 1e-4);
    }

    #[test]
    fn all_indices_are_in_range() {
        for data in [
            generate_cube(1.0, 1.0, 1.0),
            generate_sphere(1.0, 8, 4),
            generate_plane(1.0, 1.0),
            generate_cylinder(1.0, 1.0, 8),
            generate_capsule(0.5, 1.0, 8),
            generate_torus(1.0, 0.25, 8, 6),
        ] {
            let count = data.vertex_count() as u32;
            assert!(data.indices.iter().all(|&i| i < count));
            assert_eq!(data.indices.len() % 3, 0);
        }
    }
}
