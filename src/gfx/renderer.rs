//! # Renderer
//!
//! wgpu surface/device management and execution of the recorded frame:
//! an optional shadow depth pre-pass, the forward scene pass (into the
//! surface, or into HDR targets when bloom is on), the particle pass, and
//! the blur/composite post-process chain.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use log::warn;
use wgpu::util::DeviceExt;

use crate::engine::{DrawCommand, FrameRecorder};
use crate::error::EngineError;
use crate::gfx::geometry::GeometryData;
use crate::gfx::pipelines::{Pipelines, ScenePipelineKey};
use crate::gfx::texture::{TextureResource, SHADOW_MAP_SIZE};
use crate::gfx::uniforms::{DrawUniform, DynamicUniformBuffer, UniformBuffer};
use crate::gfx::vertex::ParticleInstance;
use crate::math;
use crate::scene::{GlobalUniform, GpuMesh, Scene};

/// Per-frame draw list cap; draws recorded past this are dropped.
pub const MAX_DRAWS_PER_FRAME: u64 = 1024;

const MAX_PARTICLE_INSTANCES: u64 =
    (crate::scene::MAX_EMITTERS * crate::particles::MAX_PARTICLES_PER_EMITTER) as u64;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct BlurParams {
    // xy = direction, zw = texel size
    direction_texel: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CompositeParams {
    // x = bloom intensity, y = bloom enabled
    params: [f32; 4],
}

/// Instance range of one emitter in the shared particle buffer.
struct ParticleBatch {
    instances: std::ops::Range<u32>,
    bind_group: usize,
}

/// One fully resolved draw, ready for pass encoding.
struct PreparedDraw {
    mesh: crate::arena::Handle,
    uniform_index: u64,
    casts_shadow: bool,
    transparent: bool,
    wireframe: bool,
    material_bind_group: usize,
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,

    depth_texture: TextureResource,
    shadow_map: TextureResource,
    hdr_scene: TextureResource,
    hdr_bright: TextureResource,
    hdr_blur: TextureResource,

    pipelines: Pipelines,

    globals: UniformBuffer<GlobalUniform>,
    globals_bind_group: wgpu::BindGroup,
    draw_uniforms: DynamicUniformBuffer<DrawUniform>,
    draw_bind_group: wgpu::BindGroup,
    shadow_bind_group: wgpu::BindGroup,

    blur_horizontal: UniformBuffer<BlurParams>,
    blur_vertical: UniformBuffer<BlurParams>,
    blur_h_bind_group: wgpu::BindGroup,
    blur_v_bind_group: wgpu::BindGroup,
    composite_params: UniformBuffer<CompositeParams>,
    composite_bind_group: wgpu::BindGroup,

    particle_buffer: wgpu::Buffer,

    white_texture: TextureResource,
    flat_normal_texture: TextureResource,
}

impl Renderer {
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Renderer, EngineError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let mut required_features = wgpu::Features::empty();
        if adapter.features().contains(wgpu::Features::POLYGON_MODE_LINE) {
            required_features |= wgpu::Features::POLYGON_MODE_LINE;
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Render Device"),
                required_features,
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let pipelines = Pipelines::new(&device, format);

        let depth_texture =
            TextureResource::create_depth_texture(&device, config.width, config.height);
        let shadow_map = TextureResource::create_shadow_map(&device);
        let hdr_scene =
            TextureResource::create_hdr_target(&device, config.width, config.height, "HDR Scene");
        let hdr_bright =
            TextureResource::create_hdr_target(&device, config.width, config.height, "HDR Bright");
        let hdr_blur =
            TextureResource::create_hdr_target(&device, config.width, config.height, "HDR Blur");

        let globals = UniformBuffer::<GlobalUniform>::new(&device);
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &pipelines.layouts.globals,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals.binding_resource(),
            }],
        });

        let draw_uniforms = DynamicUniformBuffer::<DrawUniform>::new(&device, MAX_DRAWS_PER_FRAME);
        let draw_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Bind Group"),
            layout: &pipelines.layouts.draw,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: draw_uniforms.binding_resource(),
            }],
        });

        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Map Bind Group"),
            layout: &pipelines.layouts.shadow,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shadow_map.sampler),
                },
            ],
        });

        let mut blur_horizontal = UniformBuffer::<BlurParams>::new(&device);
        let mut blur_vertical = UniformBuffer::<BlurParams>::new(&device);
        let texel = [1.0 / config.width as f32, 1.0 / config.height as f32];
        blur_horizontal.update_content(
            &queue,
            BlurParams {
                direction_texel: [1.0, 0.0, texel[0], texel[1]],
            },
        );
        blur_vertical.update_content(
            &queue,
            BlurParams {
                direction_texel: [0.0, 1.0, texel[0], texel[1]],
            },
        );

        let blur_h_bind_group = Self::create_blur_bind_group(
            &device,
            &pipelines,
            &hdr_bright,
            &blur_horizontal,
            "Blur H Bind Group",
        );
        let blur_v_bind_group = Self::create_blur_bind_group(
            &device,
            &pipelines,
            &hdr_blur,
            &blur_vertical,
            "Blur V Bind Group",
        );

        let composite_params = UniformBuffer::<CompositeParams>::new(&device);
        let composite_bind_group = Self::create_composite_bind_group(
            &device,
            &pipelines,
            &hdr_scene,
            &hdr_bright,
            &composite_params,
        );

        let particle_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Instances"),
            size: MAX_PARTICLE_INSTANCES * std::mem::size_of::<ParticleInstance>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let white_texture =
            TextureResource::solid_color(&device, &queue, [255, 255, 255, 255], "White Fallback");
        // Flat tangent-space normal (0, 0, 1).
        let flat_normal_texture =
            TextureResource::solid_color(&device, &queue, [128, 128, 255, 255], "Normal Fallback");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            shadow_map,
            hdr_scene,
            hdr_bright,
            hdr_blur,
            pipelines,
            globals,
            globals_bind_group,
            draw_uniforms,
            draw_bind_group,
            shadow_bind_group,
            blur_horizontal,
            blur_vertical,
            blur_h_bind_group,
            blur_v_bind_group,
            composite_params,
            composite_bind_group,
            particle_buffer,
            white_texture,
            flat_normal_texture,
        })
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Uploads generated geometry into GPU vertex/index buffers.
    pub fn upload_mesh(&self, geometry: &GeometryData) -> GpuMesh {
        let vertices = geometry.to_vertices();
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(&geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture = TextureResource::create_depth_texture(&self.device, width, height);
        self.hdr_scene =
            TextureResource::create_hdr_target(&self.device, width, height, "HDR Scene");
        self.hdr_bright =
            TextureResource::create_hdr_target(&self.device, width, height, "HDR Bright");
        self.hdr_blur = TextureResource::create_hdr_target(&self.device, width, height, "HDR Blur");

        let texel = [1.0 / width as f32, 1.0 / height as f32];
        self.blur_horizontal.update_content(
            &self.queue,
            BlurParams {
                direction_texel: [1.0, 0.0, texel[0], texel[1]],
            },
        );
        self.blur_vertical.update_content(
            &self.queue,
            BlurParams {
                direction_texel: [0.0, 1.0, texel[0], texel[1]],
            },
        );
        self.blur_h_bind_group = Self::create_blur_bind_group(
            &self.device,
            &self.pipelines,
            &self.hdr_bright,
            &self.blur_horizontal,
            "Blur H Bind Group",
        );
        self.blur_v_bind_group = Self::create_blur_bind_group(
            &self.device,
            &self.pipelines,
            &self.hdr_blur,
            &self.blur_vertical,
            "Blur V Bind Group",
        );
        self.composite_bind_group = Self::create_composite_bind_group(
            &self.device,
            &self.pipelines,
            &self.hdr_scene,
            &self.hdr_bright,
            &self.composite_params,
        );
    }

    /// Executes all passes for a recorded frame and presents.
    pub fn render(&mut self, scene: &Scene, frame: &FrameRecorder) {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(err) => {
                warn!("skipping frame: {err}");
                return;
            }
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let bloom = scene.lighting.bloom_enabled;
        let shadows = scene.lighting.shadow_enabled;

        self.upload_globals(scene);
        let (draws, material_bind_groups) = self.prepare_draws(scene, &frame.commands);
        let (particle_batches, particle_bind_groups) = self.upload_particles(scene);

        self.composite_params.update_content(
            &self.queue,
            CompositeParams {
                params: [scene.lighting.bloom_intensity, 1.0, 0.0, 0.0],
            },
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        if shadows {
            self.encode_shadow_pass(&mut encoder, scene, &draws);
        }
        self.encode_main_pass(
            &mut encoder,
            scene,
            frame,
            &draws,
            &material_bind_groups,
            &surface_view,
            bloom,
        );
        if !particle_batches.is_empty() {
            self.encode_particle_pass(
                &mut encoder,
                &surface_view,
                bloom,
                &particle_batches,
                &particle_bind_groups,
            );
        }
        if bloom {
            self.encode_bloom_passes(&mut encoder, &surface_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    fn upload_globals(&mut self, scene: &Scene) {
        let aspect = self.config.width as f32 / self.config.height.max(1) as f32;
        let view_proj = scene.camera.projection_matrix(aspect) * scene.camera.view_matrix();

        let mut uniform = scene.lighting.to_uniform(
            view_proj,
            scene.camera.eye,
            1.0 / SHADOW_MAP_SIZE as f32,
        );
        let right = scene.camera.right();
        let up = scene.camera.up();
        uniform.camera_right = [right.x, right.y, right.z, 0.0];
        uniform.camera_up = [up.x, up.y, up.z, 0.0];

        self.globals.update_content(&self.queue, uniform);
    }

    /// Resolves recorded commands against the mesh registry, writes the
    /// per-draw uniforms and builds material bind groups. Invalid or
    /// GPU-less meshes are skipped; opaque draws sort before transparent.
    fn prepare_draws(
        &self,
        scene: &Scene,
        commands: &[DrawCommand],
    ) -> (Vec<PreparedDraw>, Vec<wgpu::BindGroup>) {
        let mut draws = Vec::new();
        let mut bind_groups = Vec::new();
        let mut uniform_index = 0u64;

        for command in commands {
            let Some(slot) = scene.meshes.get(command.mesh) else {
                continue;
            };
            if slot.gpu.is_none() {
                continue;
            }
            if uniform_index >= self.draw_uniforms.capacity() {
                warn!("draw list full, dropping remaining draws");
                break;
            }

            let model = math::compose_trs(command.position, command.rotation_deg, command.scale);
            let material = &slot.material;

            let base_view = scene
                .textures
                .get(material.texture)
                .and_then(|t| t.gpu.as_ref());
            let normal_view = scene
                .textures
                .get(material.normal_map)
                .and_then(|t| t.gpu.as_ref());

            let uniform = DrawUniform {
                model: math::mat4_to_array(model),
                normal: math::mat3_to_padded_array(math::normal_matrix(&model)),
                base_color: material.base_color,
                material_params: [
                    material.specular_intensity,
                    material.shininess,
                    material.emissive_intensity,
                    0.0,
                ],
                emissive_color: [
                    material.emissive_color[0],
                    material.emissive_color[1],
                    material.emissive_color[2],
                    0.0,
                ],
                flags: [
                    base_view.is_some() as u32,
                    normal_view.is_some() as u32,
                    material.receives_shadow as u32,
                    0,
                ],
            };
            self.draw_uniforms.write(&self.queue, uniform_index, &uniform);

            let base = base_view.unwrap_or(&self.white_texture);
            let normal = normal_view.unwrap_or(&self.flat_normal_texture);
            bind_groups.push(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Material Bind Group"),
                layout: &self.pipelines.layouts.material,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&base.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&base.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&normal.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(&normal.sampler),
                    },
                ],
            }));

            draws.push(PreparedDraw {
                mesh: command.mesh,
                uniform_index,
                casts_shadow: material.casts_shadow,
                transparent: material.transparent,
                wireframe: material.wireframe,
                material_bind_group: bind_groups.len() - 1,
            });
            uniform_index += 1;
        }

        draws.sort_by_key(|d| d.transparent);
        (draws, bind_groups)
    }

    /// Packs alive particles of every emitter into the shared instance
    /// buffer, one contiguous range and texture bind group per emitter.
    fn upload_particles(&self, scene: &Scene) -> (Vec<ParticleBatch>, Vec<wgpu::BindGroup>) {
        let mut instances: Vec<ParticleInstance> = Vec::new();
        let mut batches = Vec::new();
        let mut bind_groups = Vec::new();

        for (_, emitter) in scene.emitters.iter() {
            let start = instances.len() as u32;
            instances.extend(emitter.instances());
            instances.truncate(MAX_PARTICLE_INSTANCES as usize);
            let end = instances.len() as u32;
            if end == start {
                continue;
            }

            let texture = scene
                .textures
                .get(emitter.texture)
                .and_then(|t| t.gpu.as_ref())
                .unwrap_or(&self.white_texture);
            bind_groups.push(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Particle Texture Bind Group"),
                layout: &self.pipelines.layouts.particle_texture,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ],
            }));
            batches.push(ParticleBatch {
                instances: start..end,
                bind_group: bind_groups.len() - 1,
            });
        }

        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.particle_buffer, 0, bytemuck::cast_slice(&instances));
        }
        (batches, bind_groups)
    }

    fn encode_shadow_pass(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        scene: &Scene,
        draws: &[PreparedDraw],
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipelines.shadow);
        pass.set_bind_group(0, &self.globals_bind_group, &[]);
        for draw in draws.iter().filter(|d| d.casts_shadow) {
            let Some(gpu) = scene.meshes.get(draw.mesh).and_then(|s| s.gpu.as_ref()) else {
                continue;
            };
            pass.set_bind_group(
                1,
                &self.draw_bind_group,
                &[self.draw_uniforms.offset(draw.uniform_index)],
            );
            pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
            pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..gpu.index_count, 0, 0..1);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn encode_main_pass(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        scene: &Scene,
        frame: &FrameRecorder,
        draws: &[PreparedDraw],
        material_bind_groups: &[wgpu::BindGroup],
        surface_view: &wgpu::TextureView,
        bloom: bool,
    ) {
        let clear = wgpu::Color {
            r: frame.clear_color[0] as f64,
            g: frame.clear_color[1] as f64,
            b: frame.clear_color[2] as f64,
            a: frame.clear_color[3] as f64,
        };

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = if bloom {
            vec![
                Some(wgpu::RenderPassColorAttachment {
                    view: &self.hdr_scene.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: &self.hdr_bright.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                }),
            ]
        } else {
            vec![Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })]
        };

        // Pipeline variants are materialized before the pass borrows the
        // encoder.
        for draw in draws {
            self.pipelines.scene_pipeline(
                &self.device,
                ScenePipelineKey {
                    hdr: bloom,
                    wireframe: draw.wireframe,
                    transparent: draw.transparent,
                },
            );
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Main Pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_bind_group(0, &self.globals_bind_group, &[]);
        pass.set_bind_group(3, &self.shadow_bind_group, &[]);

        for draw in draws {
            let Some(gpu) = scene.meshes.get(draw.mesh).and_then(|s| s.gpu.as_ref()) else {
                continue;
            };
            let key = ScenePipelineKey {
                hdr: bloom,
                wireframe: draw.wireframe,
                transparent: draw.transparent,
            };
            pass.set_pipeline(self.pipelines.scene_pipeline(&self.device, key));
            pass.set_bind_group(
                1,
                &self.draw_bind_group,
                &[self.draw_uniforms.offset(draw.uniform_index)],
            );
            pass.set_bind_group(2, &material_bind_groups[draw.material_bind_group], &[]);
            pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
            pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..gpu.index_count, 0, 0..1);
        }
    }

    fn encode_particle_pass(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        bloom: bool,
        batches: &[ParticleBatch],
        bind_groups: &[wgpu::BindGroup],
    ) {
        let target = if bloom {
            &self.hdr_scene.view
        } else {
            surface_view
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Particle Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let pipeline = if bloom {
            &self.pipelines.particle_hdr
        } else {
            &self.pipelines.particle_surface
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.globals_bind_group, &[]);
        pass.set_vertex_buffer(0, self.particle_buffer.slice(..));
        for batch in batches {
            pass.set_bind_group(1, &bind_groups[batch.bind_group], &[]);
            pass.draw(0..6, batch.instances.clone());
        }
    }

    /// Two-pass separable blur of the bright target, then tone-mapped
    /// composite into the surface.
    fn encode_bloom_passes(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
    ) {
        for (bind_group, target, label) in [
            (&self.blur_h_bind_group, &self.hdr_blur.view, "Blur H Pass"),
            (&self.blur_v_bind_group, &self.hdr_bright.view, "Blur V Pass"),
        ] {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipelines.blur);
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipelines.composite);
        pass.set_bind_group(0, &self.composite_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    fn create_blur_bind_group(
        device: &wgpu::Device,
        pipelines: &Pipelines,
        source: &TextureResource,
        params: &UniformBuffer<BlurParams>,
        label: &str,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &pipelines.layouts.blur,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&source.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&source.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params.binding_resource(),
                },
            ],
        })
    }

    fn create_composite_bind_group(
        device: &wgpu::Device,
        pipelines: &Pipelines,
        scene: &TextureResource,
        bloom: &TextureResource,
        params: &UniformBuffer<CompositeParams>,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout: &pipelines.layouts.composite,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&scene.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&scene.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&bloom.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&bloom.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: params.binding_resource(),
                },
            ],
        })
    }
}
