//! # Scene State
//!
//! CPU-side scene state: resource registries, the node hierarchy, lighting
//! and the camera. Everything in this module is usable without a GPU; GPU
//! buffers hang off the slots as `Option`s and are filled in by the
//! renderer when one exists.

pub mod animation;
pub mod camera;
pub mod lighting;
pub mod mesh;
pub mod node;

pub use animation::{Animation, Keyframe, Pose, Track, MAX_KEYFRAMES};
pub use camera::Camera;
pub use lighting::{
    FogMode, GlobalUniform, Lighting, PointLight, SpotLight, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS,
};
pub use mesh::{GpuMesh, Material, MeshSlot};
pub use node::{Node, NodeArena};

use crate::arena::{Handle, SlotArena};
use crate::gfx::texture::TextureResource;
use crate::particles::Emitter;
use crate::spatial::{Ray, RayHit};

/// Registry capacities. Handles are 1-origin, so valid handles for a
/// registry of capacity N are `1..=N`.
pub const MAX_MESHES: usize = 256;
pub const MAX_TEXTURES: usize = 128;
pub const MAX_NODES: usize = 512;
pub const MAX_ANIMS: usize = 32;
pub const MAX_EMITTERS: usize = 16;

/// A registered 2D texture. `gpu` is `None` until the renderer uploads it.
#[derive(Debug, Default)]
pub struct TextureSlot {
    pub width: u32,
    pub height: u32,
    pub gpu: Option<TextureResource>,
}

/// All scene state owned by the engine between frames.
pub struct Scene {
    pub meshes: SlotArena<MeshSlot, MAX_MESHES>,
    pub textures: SlotArena<TextureSlot, MAX_TEXTURES>,
    pub nodes: NodeArena,
    pub animations: SlotArena<Animation, MAX_ANIMS>,
    pub emitters: SlotArena<Emitter, MAX_EMITTERS>,
    pub lighting: Lighting,
    pub camera: Camera,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            meshes: SlotArena::new(),
            textures: SlotArena::new(),
            nodes: SlotArena::new(),
            animations: SlotArena::new(),
            emitters: SlotArena::new(),
            lighting: Lighting::default(),
            camera: Camera::default(),
        }
    }

    /// World transform of a node, composed through its parent chain.
    /// `None` for dead or unknown handles.
    pub fn node_world_transform(&self, handle: Handle) -> Option<cgmath::Matrix4<f32>> {
        node::world_transform(&self.nodes, handle)
    }

    /// Reparents `child` under `parent`; `parent = 0` clears to root.
    /// Reparenting that would close a cycle is rejected.
    pub fn set_parent(&mut self, child: Handle, parent: Handle) {
        if parent != 0 {
            if !self.nodes.contains(parent) {
                return;
            }
            if node::would_create_cycle(&self.nodes, child, parent) {
                log::warn!(
                    "rejecting node_parent({child}, {parent}): would create a cycle"
                );
                return;
            }
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = parent;
        }
    }

    /// Tests `ray` against the object-space bounds of every live mesh and
    /// reports the closest positive hit.
    pub fn raycast(&self, ray: &Ray) -> RayHit {
        let mut best = RayHit::miss();
        for (handle, slot) in self.meshes.iter() {
            if let Some(t) = slot.aabb.intersect_ray(ray) {
                if !best.hit || t < best.distance {
                    best = RayHit {
                        hit: true,
                        mesh: handle,
                        distance: t,
                        point: ray.point_at(t),
                    };
                }
            }
        }
        best
    }

    /// Casts a ray through a screen pixel using the current camera.
    pub fn raycast_screen(&self, x: f32, y: f32, width: u32, height: u32) -> RayHit {
        let ray = self.camera.screen_ray(x, y, width as f32, height as f32);
        self.raycast(&ray)
    }

    /// Steps every playing animation and writes sampled poses onto their
    /// target nodes.
    pub fn update_animations(&mut self, dt: f32) {
        let mut poses = Vec::new();
        for (_, anim) in self.animations.iter_mut() {
            anim.update(dt);
            if anim.target != 0 {
                poses.push((anim.target, anim.pose()));
            }
        }
        for (target, pose) in poses {
            if let Some(node) = self.nodes.get_mut(target) {
                node.position = pose.position;
                node.rotation_deg = pose.rotation_deg;
                node.scale = pose.scale;
            }
        }
    }

    /// Steps every emitter's particle pool.
    pub fn update_emitters(&mut self, dt: f32) {
        for (_, emitter) in self.emitters.iter_mut() {
            emitter.update(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Aabb;
    use approx::assert_relative_eq;
    use cgmath::Vector3;

    fn unit_cube_slot() -> MeshSlot {
        MeshSlot::new(
            Aabb {
                min: Vector3::new(-0.5, -0.5, -0.5),
                max: Vector3::new(0.5, 0.5, 0.5),
            },
            8,
            36,
        )
    }

    #[test]
    fn raycast_reports_the_closest_live_mesh() {
        let mut scene = Scene::new();
        let near = scene.meshes.insert(unit_cube_slot());
        let far = scene.meshes.insert(MeshSlot::new(
            Aabb {
                min: Vector3::new(-0.5, -0.5, -10.5),
                max: Vector3::new(0.5, 0.5, -9.5),
            },
            8,
            36,
        ));
        assert_ne!(near, 0);
        assert_ne!(far, 0);

        let ray = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = scene.raycast(&ray);
        assert!(hit.hit);
        assert_eq!(hit.mesh, near);
        assert_relative_eq!(hit.distance, 4.5);
        assert_relative_eq!(hit.point.z, 0.5);
    }

    #[test]
    fn raycast_ignores_destroyed_meshes() {
        let mut scene = Scene::new();
        let mesh = scene.meshes.insert(unit_cube_slot());
        scene.meshes.remove(mesh);
        let ray = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(!scene.raycast(&ray).hit);
    }

    #[test]
    fn set_parent_rejects_cycles_but_allows_reparenting() {
        let mut scene = Scene::new();
        let a = scene.nodes.insert(Node::default());
        let b = scene.nodes.insert(Node::default());
        scene.set_parent(b, a);
        assert_eq!(scene.nodes.get(b).map(|n| n.parent), Some(a));

        // a under b would close a loop.
        scene.set_parent(a, b);
        assert_eq!(scene.nodes.get(a).map(|n| n.parent), Some(0));

        scene.set_parent(b, 0);
        assert_eq!(scene.nodes.get(b).map(|n| n.parent), Some(0));
    }

    #[test]
    fn animation_pose_is_applied_to_its_target_node() {
        let mut scene = Scene::new();
        let node = scene.nodes.insert(Node::default());
        let anim_handle = scene.animations.insert(Animation::default());
        {
            let anim = scene.animations.get_mut(anim_handle).unwrap();
            anim.position.insert(0.0, Vector3::new(0.0, 0.0, 0.0));
            anim.position.insert(2.0, Vector3::new(10.0, 0.0, 0.0));
            anim.target = node;
            anim.play();
        }
        scene.update_animations(1.0);
        let node = scene.nodes.get(node).unwrap();
        assert_relative_eq!(node.position.x, 5.0);
    }
}
