//! # Engine
//!
//! The explicitly-owned engine context: scene state, renderer, frame
//! clock and input. Rendering follows a begin/draw/end protocol — draws
//! are recorded between [`Engine::begin_frame`] and [`Engine::end_frame`]
//! and executed as explicit pipeline stages (shadow, main, post-process)
//! when the frame ends.

use cgmath::Vector3;
use log::warn;

use crate::arena::Handle;
use crate::error::EngineError;
use crate::gfx::geometry::{self, GeometryData};
use crate::gfx::renderer::Renderer;
use crate::gfx::texture::TextureResource;
use crate::input::InputSnapshot;
use crate::particles::Emitter;
use crate::scene::{Animation, MeshSlot, Node, Scene, TextureSlot};
use crate::spatial::{Aabb, Ray, RayHit};
use crate::timing::FrameClock;

/// Pipeline stage of the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    Idle,
    /// Between begin and end; draw calls are being recorded.
    Recording,
    ShadowPass,
    MainPass,
    PostProcess,
    Presented,
}

impl FrameStage {
    /// Whether `next` is a legal successor of this stage.
    pub fn can_advance_to(self, next: FrameStage) -> bool {
        use FrameStage::*;
        matches!(
            (self, next),
            (Idle, Recording)
                | (Presented, Recording)
                | (Recording, ShadowPass)
                | (Recording, MainPass)
                | (ShadowPass, MainPass)
                | (MainPass, PostProcess)
                | (MainPass, Presented)
                | (PostProcess, Presented)
                | (Presented, Idle)
        )
    }
}

/// One recorded draw: a mesh with an immediate-mode transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub mesh: Handle,
    pub position: Vector3<f32>,
    pub rotation_deg: Vector3<f32>,
    pub scale: Vector3<f32>,
}

/// Records draw calls between begin and end, and tracks the frame's stage
/// so out-of-order calls are caught instead of silently misrendering.
#[derive(Debug)]
pub struct FrameRecorder {
    stage: FrameStage,
    pub clear_color: [f32; 4],
    pub commands: Vec<DrawCommand>,
}

impl Default for FrameRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self {
            stage: FrameStage::Idle,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            commands: Vec::new(),
        }
    }

    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    /// Moves to `next` if the transition is legal; otherwise warns and
    /// stays put. Returns whether the transition happened.
    pub fn advance(&mut self, next: FrameStage) -> bool {
        if self.stage.can_advance_to(next) {
            self.stage = next;
            true
        } else {
            warn!("invalid frame stage transition {:?} -> {next:?}", self.stage);
            false
        }
    }

    /// Starts recording a new frame. A no-op unless idle or presented.
    pub fn begin(&mut self, clear_color: [f32; 4]) -> bool {
        if !self.advance(FrameStage::Recording) {
            return false;
        }
        self.clear_color = clear_color;
        self.commands.clear();
        true
    }

    /// Records one draw. Dropped with a warning outside begin/end.
    pub fn record(&mut self, command: DrawCommand) {
        if self.stage != FrameStage::Recording {
            warn!("draw call outside begin/end, dropping");
            return;
        }
        self.commands.push(command);
    }

    /// Walks the render stages for this frame. `shadows` selects whether
    /// the shadow stage participates.
    pub fn finish(&mut self, shadows: bool) -> bool {
        if self.stage != FrameStage::Recording {
            warn!("end_frame without begin_frame");
            return false;
        }
        if shadows {
            self.advance(FrameStage::ShadowPass);
        }
        self.advance(FrameStage::MainPass);
        self.advance(FrameStage::PostProcess);
        self.advance(FrameStage::Presented);
        true
    }
}

/// Animation track selector for keyframe insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Position,
    Rotation,
    Scale,
}

/// The engine context. All state lives here; no globals.
pub struct Engine {
    pub scene: Scene,
    renderer: Renderer,
    frame: FrameRecorder,
    clock: FrameClock,
    input: InputSnapshot,
    previous_input: InputSnapshot,
}

impl Engine {
    /// Creates the engine with a render surface on the given window.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Engine, EngineError> {
        let renderer = Renderer::new(window, width, height).await?;
        Ok(Self {
            scene: Scene::new(),
            renderer,
            frame: FrameRecorder::new(),
            clock: FrameClock::new(),
            input: InputSnapshot::new(),
            previous_input: InputSnapshot::new(),
        })
    }

    /// Blocking constructor for callers outside an async context.
    pub fn new_blocking(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Engine, EngineError> {
        pollster::block_on(Self::new(window, width, height))
    }

    // --- frame loop -----------------------------------------------------

    /// Steps the clock, animations and particle emitters. Call once per
    /// frame before begin_frame.
    pub fn update(&mut self) {
        self.previous_input = self.input.clone();
        self.input.clear_frame_deltas();

        self.clock.tick();
        let dt = self.clock.delta();
        self.scene.update_animations(dt);
        self.scene.update_emitters(dt);
    }

    pub fn begin_frame(&mut self, clear_color: [f32; 4]) {
        self.frame.begin(clear_color);
    }

    /// Records an immediate-mode draw of a mesh.
    pub fn draw_mesh(
        &mut self,
        mesh: Handle,
        position: Vector3<f32>,
        rotation_deg: Vector3<f32>,
        scale: Vector3<f32>,
    ) {
        self.frame.record(DrawCommand {
            mesh,
            position,
            rotation_deg,
            scale,
        });
    }

    /// Draws a scene node: world translation from the composed parent
    /// chain, rotation and scale from the node's own locals.
    pub fn draw_node(&mut self, node: Handle) {
        let Some(command) = node_draw_command(&self.scene, node) else {
            return;
        };
        self.frame.record(command);
    }

    /// Runs the recorded frame through the render stages and presents.
    pub fn end_frame(&mut self) {
        if !self.frame.finish(self.scene.lighting.shadow_enabled) {
            return;
        }
        self.renderer.render(&self.scene, &self.frame);
        self.frame.advance(FrameStage::Idle);
    }

    pub fn frame_stage(&self) -> FrameStage {
        self.frame.stage()
    }

    pub fn delta(&self) -> f32 {
        self.clock.delta()
    }

    pub fn fps(&self) -> u32 {
        self.clock.fps()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
    }

    pub fn size(&self) -> (u32, u32) {
        self.renderer.size()
    }

    // --- input ----------------------------------------------------------

    pub fn handle_window_event(&mut self, event: &winit::event::WindowEvent) {
        self.input.apply_window_event(event);
    }

    pub fn handle_device_event(&mut self, event: &winit::event::DeviceEvent) {
        self.input.apply_device_event(event);
    }

    pub fn input(&self) -> &InputSnapshot {
        &self.input
    }

    /// True only on the frame the key went down.
    pub fn key_pressed(&self, key: winit::keyboard::KeyCode) -> bool {
        self.input.key_pressed_since(&self.previous_input, key)
    }

    /// True only on the frame the key came up.
    pub fn key_released(&self, key: winit::keyboard::KeyCode) -> bool {
        self.input.key_released_since(&self.previous_input, key)
    }

    // --- camera ---------------------------------------------------------

    pub fn set_camera(&mut self, eye: Vector3<f32>, target: Vector3<f32>) {
        self.scene.camera.eye = eye;
        self.scene.camera.target = target;
    }

    pub fn set_camera_fov(&mut self, fov_deg: f32, near: f32, far: f32) {
        self.scene.camera.fov_deg = fov_deg;
        self.scene.camera.near = near;
        self.scene.camera.far = far;
    }

    /// Camera basis as (forward, right, up).
    pub fn camera_vectors(&self) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
        (
            self.scene.camera.forward(),
            self.scene.camera.right(),
            self.scene.camera.up(),
        )
    }

    // --- meshes ---------------------------------------------------------

    pub fn create_cube(&mut self, width: f32, height: f32, depth: f32) -> Handle {
        self.register_geometry(geometry::generate_cube(width, height, depth))
    }

    pub fn create_sphere(&mut self, radius: f32, slices: u32, stacks: u32) -> Handle {
        self.register_geometry(geometry::generate_sphere(radius, slices, stacks))
    }

    pub fn create_plane(&mut self, width: f32, depth: f32) -> Handle {
        self.register_geometry(geometry::generate_plane(width, depth))
    }

    pub fn create_cylinder(&mut self, radius: f32, height: f32, segments: u32) -> Handle {
        self.register_geometry(geometry::generate_cylinder(radius, height, segments))
    }

    pub fn create_capsule(&mut self, radius: f32, height: f32, segments: u32) -> Handle {
        self.register_geometry(geometry::generate_capsule(radius, height, segments))
    }

    pub fn create_torus(
        &mut self,
        major_radius: f32,
        minor_radius: f32,
        major_segments: u32,
        minor_segments: u32,
    ) -> Handle {
        self.register_geometry(geometry::generate_torus(
            major_radius,
            minor_radius,
            major_segments,
            minor_segments,
        ))
    }

    /// Loads an OBJ file as a mesh. Returns 0 when loading fails or the
    /// registry is full.
    pub fn load_mesh(&mut self, path: &str) -> Handle {
        match geometry::load_obj(path) {
            Ok(data) => self.register_geometry(data),
            Err(err) => {
                warn!("load_mesh({path}): {err}");
                0
            }
        }
    }

    fn register_geometry(&mut self, data: GeometryData) -> Handle {
        let mut slot = MeshSlot::new(
            data.aabb(),
            data.vertex_count() as u32,
            data.indices.len() as u32,
        );
        slot.gpu = Some(self.renderer.upload_mesh(&data));
        self.scene.meshes.insert(slot)
    }

    /// Destroys a mesh, releasing its GPU buffers. No-op on a dead handle.
    pub fn mesh_destroy(&mut self, mesh: Handle) {
        self.scene.meshes.remove(mesh);
    }

    pub fn mesh_vertex_count(&self, mesh: Handle) -> u32 {
        self.scene.meshes.get(mesh).map_or(0, |s| s.vertex_count)
    }

    /// Object-space bounds fixed at creation time.
    pub fn mesh_bounds(&self, mesh: Handle) -> Option<Aabb> {
        self.scene.meshes.get(mesh).map(|s| s.aabb)
    }

    pub fn set_mesh_color(&mut self, mesh: Handle, color: [f32; 4]) {
        if let Some(slot) = self.scene.meshes.get_mut(mesh) {
            slot.material.base_color = color;
        }
    }

    pub fn set_mesh_texture(&mut self, mesh: Handle, texture: Handle) {
        if let Some(slot) = self.scene.meshes.get_mut(mesh) {
            slot.material.texture = texture;
        }
    }

    pub fn set_mesh_normal_map(&mut self, mesh: Handle, texture: Handle) {
        if let Some(slot) = self.scene.meshes.get_mut(mesh) {
            slot.material.normal_map = texture;
        }
    }

    pub fn set_mesh_specular(&mut self, mesh: Handle, intensity: f32, shininess: f32) {
        if let Some(slot) = self.scene.meshes.get_mut(mesh) {
            slot.material.specular_intensity = intensity;
            slot.material.shininess = shininess;
        }
    }

    pub fn set_mesh_emissive(&mut self, mesh: Handle, color: [f32; 3], intensity: f32) {
        if let Some(slot) = self.scene.meshes.get_mut(mesh) {
            slot.material.emissive_color = color;
            slot.material.emissive_intensity = intensity;
        }
    }

    pub fn set_mesh_wireframe(&mut self, mesh: Handle, wireframe: bool) {
        if let Some(slot) = self.scene.meshes.get_mut(mesh) {
            slot.material.wireframe = wireframe;
        }
    }

    pub fn set_mesh_shadows(&mut self, mesh: Handle, casts: bool, receives: bool) {
        if let Some(slot) = self.scene.meshes.get_mut(mesh) {
            slot.material.casts_shadow = casts;
            slot.material.receives_shadow = receives;
        }
    }

    pub fn set_mesh_transparent(&mut self, mesh: Handle, transparent: bool) {
        if let Some(slot) = self.scene.meshes.get_mut(mesh) {
            slot.material.transparent = transparent;
        }
    }

    // --- textures -------------------------------------------------------

    /// Loads an image file as a texture. Returns 0 when decoding fails or
    /// the registry is full.
    pub fn load_texture(&mut self, path: &str) -> Handle {
        match TextureResource::load(self.renderer.device(), self.renderer.queue(), path) {
            Ok((gpu, width, height)) => self.scene.textures.insert(TextureSlot {
                width,
                height,
                gpu: Some(gpu),
            }),
            Err(err) => {
                warn!("load_texture({path}): {err}");
                0
            }
        }
    }

    /// Uploads raw RGBA8 pixels as a texture.
    pub fn texture_from_rgba(&mut self, data: &[u8], width: u32, height: u32) -> Handle {
        if data.len() != (width * height * 4) as usize {
            warn!("texture_from_rgba: data length does not match dimensions");
            return 0;
        }
        let gpu = TextureResource::create_from_rgba(
            self.renderer.device(),
            self.renderer.queue(),
            data,
            width,
            height,
            true,
            "RGBA Texture",
        );
        self.scene.textures.insert(TextureSlot {
            width,
            height,
            gpu: Some(gpu),
        })
    }

    pub fn texture_destroy(&mut self, texture: Handle) {
        self.scene.textures.remove(texture);
    }

    // --- lighting, shadow, fog, bloom -----------------------------------

    pub fn set_ambient(&mut self, color: [f32; 3]) {
        self.scene.lighting.ambient = color;
    }

    pub fn set_directional_light(&mut self, direction: Vector3<f32>, color: [f32; 3]) {
        self.scene.lighting.dir_direction = direction;
        self.scene.lighting.dir_color = color;
    }

    pub fn set_point_light(
        &mut self,
        slot: usize,
        position: Vector3<f32>,
        color: [f32; 3],
        radius: f32,
    ) {
        self.scene.lighting.set_point_light(slot, position, color, radius);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set_spot_light(
        &mut self,
        slot: usize,
        position: Vector3<f32>,
        direction: Vector3<f32>,
        color: [f32; 3],
        radius: f32,
        inner_deg: f32,
        outer_deg: f32,
    ) {
        self.scene
            .lighting
            .set_spot_light(slot, position, direction, color, radius, inner_deg, outer_deg);
    }

    pub fn spot_light_off(&mut self, slot: usize) {
        self.scene.lighting.spot_light_off(slot);
    }

    pub fn shadow_enable(&mut self, enabled: bool) {
        self.scene.lighting.shadow_enabled = enabled;
    }

    pub fn set_shadow_bias(&mut self, bias: f32) {
        self.scene.lighting.shadow_bias = bias;
    }

    pub fn set_shadow_ortho(&mut self, half_size: f32) {
        self.scene.lighting.shadow_ortho = half_size;
    }

    pub fn set_fog(&mut self, mode: crate::scene::FogMode, color: [f32; 3]) {
        self.scene.lighting.fog_enabled = mode != crate::scene::FogMode::Off;
        self.scene.lighting.fog_mode = mode;
        self.scene.lighting.fog_color = color;
    }

    pub fn set_fog_range(&mut self, start: f32, end: f32, density: f32) {
        self.scene.lighting.fog_start = start;
        self.scene.lighting.fog_end = end;
        self.scene.lighting.fog_density = density;
    }

    pub fn bloom_enable(&mut self, enabled: bool) {
        self.scene.lighting.bloom_enabled = enabled;
    }

    pub fn set_bloom(&mut self, threshold: f32, intensity: f32) {
        self.scene.lighting.bloom_threshold = threshold;
        self.scene.lighting.bloom_intensity = intensity;
    }

    // --- scene nodes ----------------------------------------------------

    pub fn node_create(&mut self) -> Handle {
        self.scene.nodes.insert(Node::default())
    }

    pub fn node_destroy(&mut self, node: Handle) {
        self.scene.nodes.remove(node);
    }

    pub fn node_set_mesh(&mut self, node: Handle, mesh: Handle) {
        if let Some(n) = self.scene.nodes.get_mut(node) {
            n.mesh = mesh;
        }
    }

    pub fn node_set_position(&mut self, node: Handle, position: Vector3<f32>) {
        if let Some(n) = self.scene.nodes.get_mut(node) {
            n.position = position;
        }
    }

    pub fn node_set_rotation(&mut self, node: Handle, rotation_deg: Vector3<f32>) {
        if let Some(n) = self.scene.nodes.get_mut(node) {
            n.rotation_deg = rotation_deg;
        }
    }

    pub fn node_set_scale(&mut self, node: Handle, scale: Vector3<f32>) {
        if let Some(n) = self.scene.nodes.get_mut(node) {
            n.scale = scale;
        }
    }

    /// Reparents a node; parent 0 clears to root. Cycles are rejected.
    pub fn node_set_parent(&mut self, node: Handle, parent: Handle) {
        self.scene.set_parent(node, parent);
    }

    pub fn node_set_active(&mut self, node: Handle, active: bool) {
        if let Some(n) = self.scene.nodes.get_mut(node) {
            n.active = active;
        }
    }

    /// World-space position of a node, through the composed parent chain.
    pub fn node_world_position(&self, node: Handle) -> Vector3<f32> {
        self.scene
            .node_world_transform(node)
            .map(|m| Vector3::new(m.w.x, m.w.y, m.w.z))
            .unwrap_or_else(cgmath::Zero::zero)
    }

    // --- animation ------------------------------------------------------

    pub fn anim_create(&mut self) -> Handle {
        self.scene.animations.insert(Animation::default())
    }

    pub fn anim_destroy(&mut self, anim: Handle) {
        self.scene.animations.remove(anim);
    }

    pub fn anim_add_key(
        &mut self,
        anim: Handle,
        track: TrackKind,
        time: f32,
        value: Vector3<f32>,
    ) {
        if let Some(a) = self.scene.animations.get_mut(anim) {
            let track = match track {
                TrackKind::Position => &mut a.position,
                TrackKind::Rotation => &mut a.rotation,
                TrackKind::Scale => &mut a.scale,
            };
            if !track.insert(time, value) {
                warn!("anim_add_key: track full, key dropped");
            }
        }
    }

    /// Binds the animation's evaluated pose to a node, applied each update.
    pub fn anim_bind(&mut self, anim: Handle, node: Handle) {
        if let Some(a) = self.scene.animations.get_mut(anim) {
            a.target = node;
        }
    }

    pub fn anim_play(&mut self, anim: Handle, looping: bool) {
        if let Some(a) = self.scene.animations.get_mut(anim) {
            a.looping = looping;
            a.play();
        }
    }

    pub fn anim_stop(&mut self, anim: Handle) {
        if let Some(a) = self.scene.animations.get_mut(anim) {
            a.stop();
        }
    }

    pub fn anim_seek(&mut self, anim: Handle, time: f32) {
        if let Some(a) = self.scene.animations.get_mut(anim) {
            a.seek(time);
        }
    }

    pub fn anim_is_playing(&self, anim: Handle) -> bool {
        self.scene.animations.get(anim).is_some_and(|a| a.is_playing())
    }

    /// Current evaluated TRS of an animation, `None` for dead handles.
    pub fn anim_pose(&self, anim: Handle) -> Option<crate::scene::Pose> {
        self.scene.animations.get(anim).map(|a| a.pose())
    }

    // --- particles ------------------------------------------------------

    /// Creates an emitter with the given pool size. Returns 0 when the
    /// registry is full.
    pub fn emitter_create(&mut self, max_particles: usize) -> Handle {
        self.scene.emitters.insert(Emitter::new(max_particles))
    }

    pub fn emitter_destroy(&mut self, emitter: Handle) {
        self.scene.emitters.remove(emitter);
    }

    /// Mutable access to an emitter's parameters; changes apply to
    /// subsequently spawned particles.
    pub fn emitter_mut(&mut self, emitter: Handle) -> Option<&mut Emitter> {
        self.scene.emitters.get_mut(emitter)
    }

    pub fn emitter_burst(&mut self, emitter: Handle, count: usize) {
        if let Some(e) = self.scene.emitters.get_mut(emitter) {
            e.burst(count);
        }
    }

    // --- spatial queries ------------------------------------------------

    pub fn raycast(&self, origin: Vector3<f32>, direction: Vector3<f32>) -> RayHit {
        self.scene.raycast(&Ray::new(origin, direction))
    }

    /// Picks through a screen pixel using the current camera and surface
    /// size.
    pub fn raycast_screen(&self, x: f32, y: f32) -> RayHit {
        let (width, height) = self.renderer.size();
        self.scene.raycast_screen(x, y, width, height)
    }

    pub fn aabb_overlap(&self, a: &Aabb, b: &Aabb) -> bool {
        a.overlaps(b)
    }

    /// World bounds of a mesh under a draw transform, from transforming
    /// all 8 corners.
    pub fn mesh_world_bounds(
        &self,
        mesh: Handle,
        position: Vector3<f32>,
        rotation_deg: Vector3<f32>,
        scale: Vector3<f32>,
    ) -> Option<Aabb> {
        let aabb = self.mesh_bounds(mesh)?;
        let model = crate::math::compose_trs(position, rotation_deg, scale);
        Some(aabb.transform(&model))
    }
}

/// Resolves a node into a draw command: hierarchy-composed translation,
/// local rotation and scale. `None` for dead, inactive or mesh-less nodes.
fn node_draw_command(scene: &Scene, node: Handle) -> Option<DrawCommand> {
    let n = scene.nodes.get(node)?;
    if !n.active || n.mesh == 0 {
        return None;
    }
    let world = scene.node_world_transform(node)?;
    Some(DrawCommand {
        mesh: n.mesh,
        position: Vector3::new(world.w.x, world.w.y, world.w.z),
        rotation_deg: n.rotation_deg,
        scale: n.scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn frame_stages_follow_the_pipeline_order() {
        let mut frame = FrameRecorder::new();
        assert_eq!(frame.stage(), FrameStage::Idle);
        assert!(frame.begin([0.0; 4]));
        assert_eq!(frame.stage(), FrameStage::Recording);
        assert!(frame.finish(true));
        assert_eq!(frame.stage(), FrameStage::Presented);
        // A new frame can begin directly after presentation.
        assert!(frame.begin([0.0; 4]));
    }

    #[test]
    fn shadow_stage_is_skipped_when_shadows_are_off() {
        let mut frame = FrameRecorder::new();
        frame.begin([0.0; 4]);
        assert!(frame.finish(false));
        assert_eq!(frame.stage(), FrameStage::Presented);
    }

    #[test]
    fn draws_outside_recording_are_dropped() {
        let mut frame = FrameRecorder::new();
        let command = DrawCommand {
            mesh: 1,
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation_deg: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        };
        frame.record(command);
        assert!(frame.commands.is_empty());

        frame.begin([0.0; 4]);
        frame.record(command);
        assert_eq!(frame.commands.len(), 1);
    }

    #[test]
    fn end_without_begin_is_rejected() {
        let mut frame = FrameRecorder::new();
        assert!(!frame.finish(true));
        assert_eq!(frame.stage(), FrameStage::Idle);
    }

    #[test]
    fn begin_clears_the_previous_frames_commands() {
        let mut frame = FrameRecorder::new();
        frame.begin([0.0; 4]);
        frame.record(DrawCommand {
            mesh: 1,
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation_deg: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        });
        frame.finish(false);
        frame.begin([0.0; 4]);
        assert!(frame.commands.is_empty());
    }

    #[test]
    fn invalid_transitions_do_not_change_the_stage() {
        let mut frame = FrameRecorder::new();
        assert!(!frame.advance(FrameStage::MainPass));
        assert_eq!(frame.stage(), FrameStage::Idle);
    }

    #[test]
    fn node_draw_uses_world_translation_but_local_rotation_and_scale() {
        let mut scene = Scene::new();
        let mesh = scene.meshes.insert(MeshSlot::new(
            Aabb::new(
                Vector3::new(-0.5, -0.5, -0.5),
                Vector3::new(0.5, 0.5, 0.5),
            ),
            8,
            36,
        ));

        let parent = scene.nodes.insert(Node {
            position: Vector3::new(10.0, 0.0, 0.0),
            ..Node::default()
        });
        let child = scene.nodes.insert(Node {
            position: Vector3::new(0.0, 2.0, 0.0),
            rotation_deg: Vector3::new(0.0, 45.0, 0.0),
            scale: Vector3::new(2.0, 2.0, 2.0),
            mesh,
            parent,
            ..Node::default()
        });

        let command = node_draw_command(&scene, child).unwrap();
        assert_relative_eq!(command.position.x, 10.0);
        assert_relative_eq!(command.position.y, 2.0);
        // Rotation and scale stay local, not composed through the parent.
        assert_relative_eq!(command.rotation_deg.y, 45.0);
        assert_relative_eq!(command.scale.x, 2.0);
    }

    #[test]
    fn inactive_and_meshless_nodes_draw_nothing() {
        let mut scene = Scene::new();
        let meshless = scene.nodes.insert(Node::default());
        assert!(node_draw_command(&scene, meshless).is_none());

        let mesh = scene.meshes.insert(MeshSlot::new(
            Aabb::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0)),
            3,
            3,
        ));
        let inactive = scene.nodes.insert(Node {
            mesh,
            active: false,
            ..Node::default()
        });
        assert!(node_draw_command(&scene, inactive).is_none());
    }
}
