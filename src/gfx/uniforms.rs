//! Typed uniform buffer wrappers and the per-draw uniform layout.

use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};

/// Single-value uniform buffer. Writes are skipped when the content has
/// not changed since the last upload.
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    previous_content: Vec<u8>,
    content_type: PhantomData<Content>,
}

impl<Content: Pod> UniformBuffer<Content> {
    fn name() -> &'static str {
        let type_name = std::any::type_name::<Content>();
        match type_name.rfind(':') {
            Some(pos) => &type_name[pos + 1..],
            None => type_name,
        }
    }

    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("UniformBuffer: {}", Self::name())),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            previous_content: Vec::new(),
            content_type: PhantomData,
        }
    }

    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        let bytes = bytemuck::bytes_of(&content);
        if self.previous_content == bytes {
            return;
        }
        queue.write_buffer(&self.buffer, 0, bytes);
        self.previous_content = bytes.to_vec();
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

/// Uniform buffer holding one element per recorded draw, bound with a
/// dynamic offset. Elements are spaced by the device's uniform alignment.
pub struct DynamicUniformBuffer<Content> {
    buffer: wgpu::Buffer,
    stride: u64,
    capacity: u64,
    content_type: PhantomData<Content>,
}

impl<Content: Pod> DynamicUniformBuffer<Content> {
    pub fn new(device: &wgpu::Device, capacity: u64) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = (std::mem::size_of::<Content>() as u64).div_ceil(alignment) * alignment;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Dynamic Draw Uniforms"),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            stride,
            capacity,
            content_type: PhantomData,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Uploads one element at its slot. Slots past the capacity are
    /// dropped.
    pub fn write(&self, queue: &wgpu::Queue, index: u64, content: &Content) {
        if index >= self.capacity {
            return;
        }
        queue.write_buffer(&self.buffer, index * self.stride, bytemuck::bytes_of(content));
    }

    pub fn offset(&self, index: u64) -> u32 {
        (index * self.stride) as u32
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(std::mem::size_of::<Content>() as u64),
        })
    }
}

/// Per-draw uniform. Must match `Draw` in scene.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct DrawUniform {
    pub model: [[f32; 4]; 4],
    /// Upper-left 3x3 of the model matrix, padded rows.
    pub normal: [[f32; 4]; 3],
    pub base_color: [f32; 4],
    /// x = specular intensity, y = shininess, z = emissive intensity,
    /// w unused.
    pub material_params: [f32; 4],
    pub emissive_color: [f32; 4],
    /// x = textured, y = normal mapped, z = receives shadow, w unused.
    pub flags: [u32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_uniform_fits_a_256_byte_slot() {
        let size = std::mem::size_of::<DrawUniform>();
        assert!(size <= 256);
        assert_eq!(size % 16, 0);
    }
}
