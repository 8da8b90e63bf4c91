//! Mesh registry entries: object-space bounds, material state, and the
//! optional GPU buffers behind them.
//!
//! CPU state and GPU state are split the same way objects are split from
//! their `gpu_resources` elsewhere in the crate: a mesh slot is fully
//! constructible (and testable) without a device, and the renderer fills in
//! [`GpuMesh`] when buffers are uploaded.

use crate::arena::Handle;
use crate::spatial::Aabb;

/// Shading parameters attached to a mesh. Mutable through the engine's
/// material setters at any time; geometry and bounds are not.
#[derive(Debug, Clone, Copy)]
pub struct Material {
    /// RGBA base color, multiplied into the texture when one is bound.
    pub base_color: [f32; 4],
    pub specular_intensity: f32,
    pub shininess: f32,
    pub emissive_color: [f32; 3],
    pub emissive_intensity: f32,
    /// Base color texture handle, 0 = untextured.
    pub texture: Handle,
    /// Tangent-space normal map handle, 0 = geometric normals only.
    pub normal_map: Handle,
    pub wireframe: bool,
    pub casts_shadow: bool,
    pub receives_shadow: bool,
    pub transparent: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            specular_intensity: 0.5,
            shininess: 32.0,
            emissive_color: [0.0, 0.0, 0.0],
            emissive_intensity: 0.0,
            texture: 0,
            normal_map: 0,
            wireframe: false,
            casts_shadow: true,
            receives_shadow: true,
            transparent: false,
        }
    }
}

/// GPU-side half of a mesh: vertex and index buffers plus draw counts.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// One slot in the mesh registry.
///
/// The AABB is computed once from local-space vertex positions at creation
/// and never mutated afterwards; world-space bounds are derived on demand
/// with [`Aabb::transform`].
pub struct MeshSlot {
    pub aabb: Aabb,
    pub vertex_count: u32,
    pub index_count: u32,
    pub material: Material,
    pub gpu: Option<GpuMesh>,
}

impl MeshSlot {
    pub fn new(aabb: Aabb, vertex_count: u32, index_count: u32) -> Self {
        Self {
            aabb,
            vertex_count,
            index_count,
            material: Material::default(),
            gpu: None,
        }
    }
}
