//! # Render Pipelines
//!
//! Bind group layouts and render pipeline creation for every pass: shadow
//! depth, forward scene (with variants for bloom targets, wireframe and
//! transparency), particle billboards, bloom blur and the final composite.
//! Scene variants are created lazily on first use and cached.

use std::collections::HashMap;

use crate::gfx::texture::{TextureResource, HDR_FORMAT};
use crate::gfx::uniforms::DrawUniform;
use crate::gfx::vertex::{ParticleInstance, Vertex3D};
use crate::scene::GlobalUniform;

const SCENE_SHADER: &str = include_str!("shaders/scene.wgsl");
const SHADOW_SHADER: &str = include_str!("shaders/shadow.wgsl");
const BLUR_SHADER: &str = include_str!("shaders/blur.wgsl");
const COMPOSITE_SHADER: &str = include_str!("shaders/composite.wgsl");
const PARTICLE_SHADER: &str = include_str!("shaders/particle.wgsl");

/// Shared bind group layouts, one per bind group index in scene.wgsl plus
/// the post-process layouts.
pub struct BindGroupLayouts {
    pub globals: wgpu::BindGroupLayout,
    pub draw: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
    pub shadow: wgpu::BindGroupLayout,
    pub particle_texture: wgpu::BindGroupLayout,
    pub blur: wgpu::BindGroupLayout,
    pub composite: wgpu::BindGroupLayout,
}

impl BindGroupLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_entry = |binding, dynamic, size| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: dynamic,
                min_binding_size: wgpu::BufferSize::new(size),
            },
            count: None,
        };
        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        let globals = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Layout"),
            entries: &[uniform_entry(
                0,
                false,
                std::mem::size_of::<GlobalUniform>() as u64,
            )],
        });

        let draw = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Layout"),
            entries: &[uniform_entry(
                0,
                true,
                std::mem::size_of::<DrawUniform>() as u64,
            )],
        });

        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Layout"),
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                texture_entry(2),
                sampler_entry(3),
            ],
        });

        let shadow = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let particle_texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Texture Layout"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });

        let blur = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blur Layout"),
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                uniform_entry(2, false, 16),
            ],
        });

        let composite = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Layout"),
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                texture_entry(2),
                sampler_entry(3),
                uniform_entry(4, false, 16),
            ],
        });

        Self {
            globals,
            draw,
            material,
            shadow,
            particle_texture,
            blur,
            composite,
        }
    }
}

/// Variant key for the forward scene pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScenePipelineKey {
    /// Render into the HDR scene+bright pair instead of the surface.
    pub hdr: bool,
    pub wireframe: bool,
    pub transparent: bool,
}

pub struct Pipelines {
    pub layouts: BindGroupLayouts,
    pub shadow: wgpu::RenderPipeline,
    pub blur: wgpu::RenderPipeline,
    pub composite: wgpu::RenderPipeline,
    pub particle_surface: wgpu::RenderPipeline,
    pub particle_hdr: wgpu::RenderPipeline,
    scene_shader: wgpu::ShaderModule,
    scene_layout: wgpu::PipelineLayout,
    scene_variants: HashMap<ScenePipelineKey, wgpu::RenderPipeline>,
    surface_format: wgpu::TextureFormat,
    line_polygons: bool,
}

impl Pipelines {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let layouts = BindGroupLayouts::new(device);
        let line_polygons = device.features().contains(wgpu::Features::POLYGON_MODE_LINE);

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_SHADER.into()),
        });
        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[
                &layouts.globals,
                &layouts.draw,
                &layouts.material,
                &layouts.shadow,
            ],
            push_constant_ranges: &[],
        });

        let shadow = Self::create_shadow_pipeline(device, &layouts);
        let blur = Self::create_fullscreen_pipeline(
            device,
            &layouts.blur,
            BLUR_SHADER,
            HDR_FORMAT,
            None,
            "Blur Pipeline",
        );
        let composite = Self::create_fullscreen_pipeline(
            device,
            &layouts.composite,
            COMPOSITE_SHADER,
            surface_format,
            None,
            "Composite Pipeline",
        );
        let particle_surface =
            Self::create_particle_pipeline(device, &layouts, surface_format, "Particle Pipeline");
        let particle_hdr =
            Self::create_particle_pipeline(device, &layouts, HDR_FORMAT, "Particle Pipeline HDR");

        Self {
            layouts,
            shadow,
            blur,
            composite,
            particle_surface,
            particle_hdr,
            scene_shader,
            scene_layout,
            scene_variants: HashMap::new(),
            surface_format,
            line_polygons,
        }
    }

    /// Returns the scene pipeline for a variant, creating it on first use.
    pub fn scene_pipeline(
        &mut self,
        device: &wgpu::Device,
        key: ScenePipelineKey,
    ) -> &wgpu::RenderPipeline {
        let mut key = key;
        // Wireframe silently falls back to fill when the backend lacks
        // line polygon support.
        if key.wireframe && !self.line_polygons {
            key.wireframe = false;
        }

        if !self.scene_variants.contains_key(&key) {
            let pipeline = self.create_scene_pipeline(device, key);
            self.scene_variants.insert(key, pipeline);
        }
        &self.scene_variants[&key]
    }

    fn create_scene_pipeline(
        &self,
        device: &wgpu::Device,
        key: ScenePipelineKey,
    ) -> wgpu::RenderPipeline {
        let blend = if key.transparent {
            Some(wgpu::BlendState::ALPHA_BLENDING)
        } else {
            Some(wgpu::BlendState::REPLACE)
        };

        let (entry_point, targets): (&str, Vec<Option<wgpu::ColorTargetState>>) = if key.hdr {
            (
                "fs_main_mrt",
                vec![
                    Some(wgpu::ColorTargetState {
                        format: HDR_FORMAT,
                        blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                    Some(wgpu::ColorTargetState {
                        format: HDR_FORMAT,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                ],
            )
        } else {
            (
                "fs_main",
                vec![Some(wgpu::ColorTargetState {
                    format: self.surface_format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            )
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("Scene Pipeline {key:?}")),
            layout: Some(&self.scene_layout),
            vertex: wgpu::VertexState {
                module: &self.scene_shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex3D::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.scene_shader,
                entry_point: Some(entry_point),
                targets: &targets,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: if key.wireframe {
                    None
                } else {
                    Some(wgpu::Face::Back)
                },
                polygon_mode: if key.wireframe {
                    wgpu::PolygonMode::Line
                } else {
                    wgpu::PolygonMode::Fill
                },
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: TextureResource::DEPTH_FORMAT,
                depth_write_enabled: !key.transparent,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_shadow_pipeline(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADOW_SHADER.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&layouts.globals, &layouts.draw],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex3D::layout()],
                compilation_options: Default::default(),
            },
            // Depth-only pass.
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                // Front-face culling reduces peter-panning on closed meshes.
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: TextureResource::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_fullscreen_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        source: &str,
        format: wgpu::TextureFormat,
        blend: Option<wgpu::BlendState>,
        label: &str,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: blend.or(Some(wgpu::BlendState::REPLACE)),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_particle_pipeline(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(PARTICLE_SHADER.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&layouts.globals, &layouts.particle_texture],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[ParticleInstance::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    // Additive-leaning alpha so overlapping particles
                    // accumulate instead of occluding.
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::SrcAlpha,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            // Depth tested against the scene but never written.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: TextureResource::DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}
