//! Vertex formats shared between geometry generation and the render
//! pipelines. Layouts here must match the `@location` declarations in the
//! WGSL shaders.

use bytemuck::{Pod, Zeroable};

/// Lit mesh vertex: position, normal, UV and tangent.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex3D {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 3],
}

impl Vertex3D {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x3,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-particle billboard instance: world position, size and color. The
/// quad corners are generated in the vertex shader from the vertex index.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}

impl ParticleInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x4,
        1 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ParticleInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_stride_matches_the_attribute_offsets() {
        assert_eq!(std::mem::size_of::<Vertex3D>(), 44);
        assert_eq!(Vertex3D::ATTRIBUTES[1].offset, 12);
        assert_eq!(Vertex3D::ATTRIBUTES[2].offset, 24);
        assert_eq!(Vertex3D::ATTRIBUTES[3].offset, 32);
    }

    #[test]
    fn particle_instance_is_two_vec4s() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 32);
        assert_eq!(ParticleInstance::ATTRIBUTES[1].offset, 16);
    }
}
