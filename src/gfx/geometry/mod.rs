//! # Geometry Generation and Loading
//!
//! Procedural primitive generators and an OBJ loader, all producing
//! [`GeometryData`]: raw position/normal/UV/tangent arrays plus triangle
//! indices, ready for interleaving into [`Vertex3D`] buffers.

pub mod obj;
pub mod primitives;

pub use obj::load_obj;
pub use primitives::*;

use cgmath::{InnerSpace, Vector2, Vector3, Zero};

use crate::gfx::vertex::Vertex3D;
use crate::math::EPSILON;
use crate::spatial::Aabb;

/// Generated geometry ready for GPU upload.
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub tangents: Vec<[f32; 3]>,
    /// Triangle indices, counter-clockwise winding.
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Object-space bounds from a min/max reduce over all positions.
    pub fn aabb(&self) -> Aabb {
        Aabb::from_positions(&self.positions)
    }

    /// Recomputes smooth per-vertex normals by accumulating face normals.
    pub fn compute_normals(&mut self) {
        let mut accum = vec![Vector3::<f32>::zero(); self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let p0 = Vector3::from(self.positions[i0]);
            let p1 = Vector3::from(self.positions[i1]);
            let p2 = Vector3::from(self.positions[i2]);
            let face = (p1 - p0).cross(p2 - p0);
            accum[i0] += face;
            accum[i1] += face;
            accum[i2] += face;
        }
        self.normals = accum
            .into_iter()
            .map(|n| {
                if n.magnitude2() < EPSILON * EPSILON {
                    [0.0, 1.0, 0.0]
                } else {
                    n.normalize().into()
                }
            })
            .collect();
    }

    /// Computes per-vertex tangents for normal mapping by accumulating the
    /// per-triangle edge/UV-delta terms and normalizing. Triangles with
    /// near-degenerate UV deltas are skipped.
    pub fn compute_tangents(&mut self) {
        let mut accum = vec![Vector3::<f32>::zero(); self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let p0 = Vector3::from(self.positions[i0]);
            let p1 = Vector3::from(self.positions[i1]);
            let p2 = Vector3::from(self.positions[i2]);
            let uv0 = Vector2::from(self.uvs[i0]);
            let uv1 = Vector2::from(self.uvs[i1]);
            let uv2 = Vector2::from(self.uvs[i2]);

            let edge1 = p1 - p0;
            let edge2 = p2 - p0;
            let duv1 = uv1 - uv0;
            let duv2 = uv2 - uv0;

            let det = duv1.x * duv2.y - duv2.x * duv1.y;
            if det.abs() < EPSILON {
                continue;
            }
            let r = 1.0 / det;
            let tangent = (edge1 * duv2.y - edge2 * duv1.y) * r;
            accum[i0] += tangent;
            accum[i1] += tangent;
            accum[i2] += tangent;
        }
        self.tangents = accum
            .into_iter()
            .map(|t| {
                if t.magnitude2() < EPSILON * EPSILON {
                    [1.0, 0.0, 0.0]
                } else {
                    t.normalize().into()
                }
            })
            .collect();
    }

    /// Interleaves the attribute arrays into the renderer's vertex format.
    /// Missing normals/UVs/tangents fall back to defaults per vertex.
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        (0..self.positions.len())
            .map(|i| Vertex3D {
                position: self.positions[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                uv: self.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                tangent: self.tangents.get(i).copied().unwrap_or([1.0, 0.0, 0.0]),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn aabb_reduces_all_positions() {
        let mut data = GeometryData::new();
        data.positions = vec![[1.0, -2.0, 0.5], [-1.0, 3.0, 0.0], [0.0, 0.0, -4.0]];
        let aabb = data.aabb();
        assert_relative_eq!(aabb.min.x, -1.0);
        assert_relative_eq!(aabb.min.z, -4.0);
        assert_relative_eq!(aabb.max.y, 3.0);
    }

    #[test]
    fn tangents_follow_the_uv_gradient() {
        // One triangle in the XY plane with UVs aligned to X.
        let mut data = GeometryData::new();
        data.positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        data.uvs = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        data.indices = vec![0, 1, 2];
        data.compute_tangents();
        for tangent in &data.tangents {
            assert_relative_eq!(tangent[0], 1.0, epsilon = 1e-5);
            assert_relative_eq!(tangent[1], 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn degenerate_uvs_fall_back_to_a_unit_tangent() {
        let mut data = GeometryData::new();
        data.positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        data.uvs = vec![[0.5, 0.5], [0.5, 0.5], [0.5, 0.5]];
        data.indices = vec![0, 1, 2];
        data.compute_tangents();
        assert_eq!(data.tangents[0], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn computed_normals_face_outward_for_ccw_triangles() {
        let mut data = GeometryData::new();
        data.positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        data.indices = vec![0, 1, 2];
        data.compute_normals();
        assert_relative_eq!(data.normals[0][2], 1.0, epsilon = 1e-5);
    }
}
