//! # Lighting, Shadow, Fog and Bloom State
//!
//! CPU-side light lists and the per-frame global uniform assembled from
//! them. Light slots are fixed arrays rather than registries: a point light
//! is live while its radius is positive, and the uniform packer compacts
//! live slots to the front so the shader only iterates `count` entries.

use bytemuck::{Pod, Zeroable};
use cgmath::{InnerSpace, Matrix4, Vector3, Zero};

use crate::math::{self, EPSILON};

/// Maximum simultaneously live point lights.
pub const MAX_POINT_LIGHTS: usize = 8;
/// Maximum simultaneously live spot lights.
pub const MAX_SPOT_LIGHTS: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    pub position: Vector3<f32>,
    pub color: [f32; 3],
    /// Falloff radius; the light is live while this is positive.
    pub radius: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vector3::zero(),
            color: [1.0, 1.0, 1.0],
            radius: 0.0,
        }
    }
}

impl PointLight {
    pub fn is_active(&self) -> bool {
        self.radius > 0.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpotLight {
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub color: [f32; 3],
    pub radius: f32,
    /// Inner cone half-angle in degrees (full intensity inside).
    pub inner_deg: f32,
    /// Outer cone half-angle in degrees (zero intensity outside).
    pub outer_deg: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vector3::zero(),
            direction: -Vector3::unit_y(),
            color: [1.0, 1.0, 1.0],
            radius: 0.0,
            inner_deg: 15.0,
            outer_deg: 25.0,
        }
    }
}

impl SpotLight {
    pub fn is_active(&self) -> bool {
        self.radius > 0.0
    }
}

/// Distance fog curve. `Off` disables the blend entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FogMode {
    Off,
    Linear,
    Exp,
    ExpSquared,
}

impl FogMode {
    fn as_u32(self) -> u32 {
        match self {
            FogMode::Off => 0,
            FogMode::Linear => 1,
            FogMode::Exp => 2,
            FogMode::ExpSquared => 3,
        }
    }
}

/// All lighting, shadow, fog and bloom state for a scene.
#[derive(Debug, Clone)]
pub struct Lighting {
    pub ambient: [f32; 3],
    pub dir_direction: Vector3<f32>,
    pub dir_color: [f32; 3],
    pub point_lights: [PointLight; MAX_POINT_LIGHTS],
    pub spot_lights: [SpotLight; MAX_SPOT_LIGHTS],

    pub fog_enabled: bool,
    pub fog_mode: FogMode,
    pub fog_color: [f32; 3],
    pub fog_start: f32,
    pub fog_end: f32,
    pub fog_density: f32,

    pub shadow_enabled: bool,
    pub shadow_bias: f32,
    /// Half-extent of the directional-light shadow frustum, world units.
    pub shadow_ortho: f32,

    pub bloom_enabled: bool,
    pub bloom_threshold: f32,
    pub bloom_intensity: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: [0.2, 0.2, 0.2],
            dir_direction: Vector3::new(0.5, -1.0, 0.3),
            dir_color: [0.8, 0.8, 0.8],
            point_lights: [PointLight::default(); MAX_POINT_LIGHTS],
            spot_lights: [SpotLight::default(); MAX_SPOT_LIGHTS],
            fog_enabled: false,
            fog_mode: FogMode::Linear,
            fog_color: [0.5, 0.6, 0.7],
            fog_start: 10.0,
            fog_end: 100.0,
            fog_density: 0.02,
            shadow_enabled: false,
            shadow_bias: 0.002,
            shadow_ortho: 20.0,
            bloom_enabled: false,
            bloom_threshold: 1.0,
            bloom_intensity: 1.0,
        }
    }
}

impl Lighting {
    /// Writes a point light slot. Out-of-range slots are ignored; a
    /// non-positive radius deactivates the slot.
    pub fn set_point_light(
        &mut self,
        slot: usize,
        position: Vector3<f32>,
        color: [f32; 3],
        radius: f32,
    ) {
        if let Some(light) = self.point_lights.get_mut(slot) {
            *light = PointLight {
                position,
                color,
                radius,
            };
        }
    }

    /// Writes a spot light slot. Out-of-range slots are ignored.
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
        if let Some(light) = self.spot_lights.get_mut(slot) {
            *light = SpotLight {
                position,
                direction,
                color,
                radius,
                inner_deg,
                outer_deg,
            };
        }
    }

    pub fn spot_light_off(&mut self, slot: usize) {
        if let Some(light) = self.spot_lights.get_mut(slot) {
            light.radius = 0.0;
        }
    }

    /// View-projection matrix of the shadow-casting directional light.
    ///
    /// An orthographic box of `shadow_ortho` half-extent looking from
    /// `-direction * shadow_ortho` toward the world origin. The frustum is
    /// fixed at the origin rather than following the camera, so usable
    /// shadow range is bounded to geometry near the origin.
    pub fn light_space_matrix(&self) -> Matrix4<f32> {
        let direction = if self.dir_direction.magnitude2() < EPSILON * EPSILON {
            -Vector3::unit_y()
        } else {
            self.dir_direction.normalize()
        };
        let eye = -direction * self.shadow_ortho;

        // Pick an up vector that is not parallel to the light direction.
        let up = if direction.cross(Vector3::unit_y()).magnitude2() < EPSILON {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };

        let view = math::look_at(eye, Vector3::zero(), up);
        let projection = math::ortho_centered(self.shadow_ortho, 0.1, self.shadow_ortho * 2.0);
        projection * view
    }

    /// Packs the current state into the GPU uniform, compacting live light
    /// slots to the front of the fixed-size arrays.
    pub fn to_uniform(
        &self,
        view_proj: Matrix4<f32>,
        camera_pos: Vector3<f32>,
        shadow_texel: f32,
    ) -> GlobalUniform {
        let mut uniform = GlobalUniform::zeroed();
        uniform.view_proj = math::mat4_to_array(view_proj);
        uniform.light_space = math::mat4_to_array(self.light_space_matrix());
        uniform.camera_pos = [camera_pos.x, camera_pos.y, camera_pos.z, 1.0];
        uniform.ambient = [self.ambient[0], self.ambient[1], self.ambient[2], 0.0];

        let dir = if self.dir_direction.magnitude2() < EPSILON * EPSILON {
            -Vector3::unit_y()
        } else {
            self.dir_direction.normalize()
        };
        uniform.dir_direction = [dir.x, dir.y, dir.z, 0.0];
        uniform.dir_color = [self.dir_color[0], self.dir_color[1], self.dir_color[2], 0.0];

        let mut point_count = 0usize;
        for light in self.point_lights.iter().filter(|l| l.is_active()) {
            uniform.point_pos_radius[point_count] = [
                light.position.x,
                light.position.y,
                light.position.z,
                light.radius,
            ];
            uniform.point_color[point_count] =
                [light.color[0], light.color[1], light.color[2], 0.0];
            point_count += 1;
        }

        let mut spot_count = 0usize;
        for light in self.spot_lights.iter().filter(|l| l.is_active()) {
            let dir = if light.direction.magnitude2() < EPSILON * EPSILON {
                -Vector3::unit_y()
            } else {
                light.direction.normalize()
            };
            uniform.spot_pos_radius[spot_count] = [
                light.position.x,
                light.position.y,
                light.position.z,
                light.radius,
            ];
            uniform.spot_dir_inner[spot_count] = [
                dir.x,
                dir.y,
                dir.z,
                light.inner_deg.to_radians().cos(),
            ];
            uniform.spot_color_outer[spot_count] = [
                light.color[0],
                light.color[1],
                light.color[2],
                light.outer_deg.to_radians().cos(),
            ];
            spot_count += 1;
        }

        uniform.fog_color_density = [
            self.fog_color[0],
            self.fog_color[1],
            self.fog_color[2],
            self.fog_density,
        ];
        uniform.fog_params = [
            self.fog_start,
            self.fog_end,
            self.shadow_bias,
            self.bloom_threshold,
        ];
        uniform.counts = [
            point_count as u32,
            spot_count as u32,
            self.shadow_enabled as u32,
            if self.fog_enabled {
                self.fog_mode.as_u32()
            } else {
                0
            },
        ];
        uniform.misc = [self.bloom_intensity, shadow_texel, 0.0, 0.0];
        uniform
    }
}

/// Per-frame global uniform. Must match `Globals` in the WGSL shaders
/// field-for-field.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub light_space: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    /// Camera basis vectors used for particle billboarding; written by the
    /// renderer after packing.
    pub camera_right: [f32; 4],
    pub camera_up: [f32; 4],
    pub ambient: [f32; 4],
    pub dir_direction: [f32; 4],
    pub dir_color: [f32; 4],
    pub point_pos_radius: [[f32; 4]; MAX_POINT_LIGHTS],
    pub point_color: [[f32; 4]; MAX_POINT_LIGHTS],
    pub spot_pos_radius: [[f32; 4]; MAX_SPOT_LIGHTS],
    pub spot_dir_inner: [[f32; 4]; MAX_SPOT_LIGHTS],
    pub spot_color_outer: [[f32; 4]; MAX_SPOT_LIGHTS],
    /// rgb = fog color, w = exponential fog density.
    pub fog_color_density: [f32; 4],
    /// x = fog start, y = fog end, z = shadow bias, w = bloom threshold.
    pub fog_params: [f32; 4],
    /// x = live point lights, y = live spot lights, z = shadows on,
    /// w = fog mode (0 off, 1 linear, 2 exp, 3 exp squared).
    pub counts: [u32; 4],
    /// x = bloom intensity, y = shadow-map texel size.
    pub misc: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn inactive_slots_are_skipped_and_live_ones_compacted() {
        let mut lighting = Lighting::default();
        lighting.set_point_light(3, Vector3::new(1.0, 2.0, 3.0), [1.0, 0.0, 0.0], 5.0);
        lighting.set_point_light(6, Vector3::new(4.0, 5.0, 6.0), [0.0, 1.0, 0.0], 7.0);
        // Slot out of range, ignored.
        lighting.set_point_light(25, Vector3::zero(), [1.0, 1.0, 1.0], 9.0);

        let uniform = lighting.to_uniform(Matrix4::from_scale(1.0), Vector3::zero(), 0.0);
        assert_eq!(uniform.counts[0], 2);
        assert_relative_eq!(uniform.point_pos_radius[0][3], 5.0);
        assert_relative_eq!(uniform.point_pos_radius[1][0], 4.0);
    }

    #[test]
    fn default_light_slots_start_inactive() {
        let point = PointLight::default();
        assert!(!point.is_active());
        assert_relative_eq!(point.position.magnitude(), 0.0);

        let lighting = Lighting::default();
        let uniform = lighting.to_uniform(Matrix4::from_scale(1.0), Vector3::zero(), 0.0);
        assert_eq!(uniform.counts[0], 0);
        assert_eq!(uniform.counts[1], 0);
    }

    #[test]
    fn zero_radius_deactivates_a_light() {
        let mut lighting = Lighting::default();
        lighting.set_point_light(0, Vector3::zero(), [1.0, 1.0, 1.0], 4.0);
        lighting.set_point_light(0, Vector3::zero(), [1.0, 1.0, 1.0], 0.0);
        let uniform = lighting.to_uniform(Matrix4::from_scale(1.0), Vector3::zero(), 0.0);
        assert_eq!(uniform.counts[0], 0);
    }

    #[test]
    fn spot_cone_angles_are_uploaded_as_cosines() {
        let mut lighting = Lighting::default();
        lighting.set_spot_light(
            0,
            Vector3::zero(),
            -Vector3::unit_y(),
            [1.0, 1.0, 1.0],
            10.0,
            30.0,
            60.0,
        );
        let uniform = lighting.to_uniform(Matrix4::from_scale(1.0), Vector3::zero(), 0.0);
        assert_eq!(uniform.counts[1], 1);
        assert_relative_eq!(uniform.spot_dir_inner[0][3], 30f32.to_radians().cos());
        assert_relative_eq!(uniform.spot_color_outer[0][3], 60f32.to_radians().cos());
    }

    #[test]
    fn fog_mode_is_zero_while_fog_is_disabled() {
        let mut lighting = Lighting::default();
        lighting.fog_mode = FogMode::ExpSquared;
        lighting.fog_enabled = false;
        let uniform = lighting.to_uniform(Matrix4::from_scale(1.0), Vector3::zero(), 0.0);
        assert_eq!(uniform.counts[3], 0);

        lighting.fog_enabled = true;
        let uniform = lighting.to_uniform(Matrix4::from_scale(1.0), Vector3::zero(), 0.0);
        assert_eq!(uniform.counts[3], 3);
    }

    #[test]
    fn light_space_matrix_maps_origin_into_clip_volume() {
        let lighting = Lighting {
            shadow_enabled: true,
            ..Default::default()
        };
        let m = lighting.light_space_matrix();
        let clip = math::transform_point(&m, Vector3::zero());
        assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0);
        assert!((0.0..=1.0).contains(&clip.z));
    }

    #[test]
    fn uniform_size_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUniform>() % 16, 0);
    }
}
