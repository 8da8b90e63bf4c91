//! # Texture Resources
//!
//! GPU texture creation: sampled 2D textures with CPU-generated mip
//! chains, the depth buffer, the shadow map and the HDR offscreen targets
//! used by the bloom pass.

use std::path::Path;

use crate::error::EngineError;

/// Shadow map resolution, fixed.
pub const SHADOW_MAP_SIZE: u32 = 2048;

/// Offscreen color format for the HDR scene/bright/blur targets.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// GPU texture plus the view and sampler needed to bind it.
#[derive(Debug)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl TextureResource {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Depth buffer matching the surface size.
    pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Depth-only shadow map with a comparison sampler for PCF lookups.
    pub fn create_shadow_map(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map"),
            size: wgpu::Extent3d {
                width: SHADOW_MAP_SIZE,
                height: SHADOW_MAP_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        // Comparison sampler; plain sampling would break the PCF lookup.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        Self {
            texture,
            view,
            sampler,
        }
    }

    /// HDR offscreen color target, both renderable and sampleable.
    pub fn create_hdr_target(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Sampled 2D texture from raw RGBA8 data with a full CPU-built mip
    /// chain. `srgb` selects the sRGB view format, off for normal maps.
    pub fn create_from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
        width: u32,
        height: u32,
        srgb: bool,
        label: &str,
    ) -> Self {
        let mips = build_mip_chain(data, width, height);
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mips.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, mip) in mips.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &mip.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * mip.width),
                    rows_per_image: Some(mip.height),
                },
                wgpu::Extent3d {
                    width: mip.width,
                    height: mip.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Decodes an image file and uploads it as an sRGB texture.
    pub fn load<P: AsRef<Path>>(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: P,
    ) -> Result<(Self, u32, u32), EngineError> {
        let image = image::open(path.as_ref())?.to_rgba8();
        let (width, height) = image.dimensions();
        let resource =
            Self::create_from_rgba(device, queue, &image, width, height, true, "Loaded Texture");
        Ok((resource, width, height))
    }

    /// 1x1 fallback texture of a single color; used for untextured draws.
    pub fn solid_color(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        label: &str,
    ) -> Self {
        Self::create_from_rgba(device, queue, &rgba, 1, 1, false, label)
    }
}

struct MipLevel {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Builds the full mip chain by repeated 2x2 box filtering. Level 0 is the
/// source image.
fn build_mip_chain(data: &[u8], width: u32, height: u32) -> Vec<MipLevel> {
    let mut levels = Vec::new();
    let mut current = MipLevel {
        width,
        height,
        pixels: data.to_vec(),
    };
    while current.width > 1 || current.height > 1 {
        let next = downsample(&current);
        levels.push(std::mem::replace(&mut current, next));
    }
    levels.push(current);
    levels
}

fn downsample(previous: &MipLevel) -> MipLevel {
    let next_width = (previous.width / 2).max(1);
    let next_height = (previous.height / 2).max(1);
    let mut pixels = vec![0u8; (next_width * next_height * 4) as usize];

    for y in 0..next_height {
        for x in 0..next_width {
            let sx = (x * 2).min(previous.width - 1);
            let sy = (y * 2).min(previous.height - 1);
            let sx1 = (sx + 1).min(previous.width - 1);
            let sy1 = (sy + 1).min(previous.height - 1);

            for channel in 0..4 {
                let sample = |px: u32, py: u32| {
                    previous.pixels[((py * previous.width + px) * 4 + channel) as usize] as u32
                };
                let sum = sample(sx, sy) + sample(sx1, sy) + sample(sx, sy1) + sample(sx1, sy1);
                pixels[((y * next_width + x) * 4 + channel) as usize] = (sum / 4) as u8;
            }
        }
    }

    MipLevel {
        width: next_width,
        height: next_height,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_halves_down_to_one_pixel() {
        let data = vec![255u8; 8 * 4 * 4];
        let mips = build_mip_chain(&data, 8, 4);
        let dims: Vec<(u32, u32)> = mips.iter().map(|m| (m.width, m.height)).collect();
        assert_eq!(dims, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
    }

    #[test]
    fn box_filter_averages_the_four_source_texels() {
        // 2x2 image: one white texel, three black.
        let mut data = vec![0u8; 16];
        data[0..4].copy_from_slice(&[255, 255, 255, 255]);
        let mips = build_mip_chain(&data, 2, 2);
        assert_eq!(mips.len(), 2);
        assert_eq!(&mips[1].pixels[0..4], &[63, 63, 63, 63]);
    }

    #[test]
    fn single_pixel_image_has_one_level() {
        let mips = build_mip_chain(&[1, 2, 3, 4], 1, 1);
        assert_eq!(mips.len(), 1);
    }
}
