//! # Particle Simulator
//!
//! Per-emitter fixed-size particle pools. Spawning uses a fractional
//! accumulator so non-integer per-frame rates average out correctly, and
//! each particle captures its color/size endpoints at spawn time. Alive
//! particles are packed into a per-frame instance list for billboard
//! rendering.

use cgmath::{Vector3, Zero};
use rand::Rng;

use crate::gfx::vertex::ParticleInstance;

/// Hard cap on any emitter's particle pool.
pub const MAX_PARTICLES_PER_EMITTER: usize = 4096;

#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
    /// Remaining life in seconds; dead once it reaches zero.
    pub life: f32,
    pub life_max: f32,
    pub start_color: [f32; 4],
    pub end_color: [f32; 4],
    pub start_size: f32,
    pub end_size: f32,
    pub alive: bool,
}

impl Particle {
    /// Age fraction in `[0, 1]`, 0 at spawn.
    pub fn age(&self) -> f32 {
        if self.life_max <= 0.0 {
            return 1.0;
        }
        (1.0 - self.life / self.life_max).clamp(0.0, 1.0)
    }

    pub fn color(&self) -> [f32; 4] {
        let t = self.age();
        let mut out = [0.0; 4];
        for (i, channel) in out.iter_mut().enumerate() {
            *channel = self.start_color[i] + (self.end_color[i] - self.start_color[i]) * t;
        }
        out
    }

    pub fn size(&self) -> f32 {
        self.start_size + (self.end_size - self.start_size) * self.age()
    }
}

#[derive(Debug, Clone)]
pub struct Emitter {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
    /// Per-axis jitter added to the base velocity at spawn, uniform in
    /// `±spread`.
    pub spread: Vector3<f32>,
    pub gravity: Vector3<f32>,
    /// Particles spawned per second while emitting.
    pub rate: f32,
    pub life_min: f32,
    pub life_max: f32,
    pub start_color: [f32; 4],
    pub end_color: [f32; 4],
    pub start_size: f32,
    pub end_size: f32,
    /// Optional particle texture handle, 0 for the built-in soft disc.
    pub texture: crate::arena::Handle,
    pub emitting: bool,
    accum: f32,
    pool: Vec<Particle>,
}

impl Emitter {
    /// Creates an emitter with a pool of `max_particles` slots, clamped to
    /// `1..=MAX_PARTICLES_PER_EMITTER`.
    pub fn new(max_particles: usize) -> Self {
        let capacity = max_particles.clamp(1, MAX_PARTICLES_PER_EMITTER);
        Self {
            position: Vector3::zero(),
            velocity: Vector3::new(0.0, 1.0, 0.0),
            spread: Vector3::new(0.5, 0.5, 0.5),
            gravity: Vector3::new(0.0, -9.8, 0.0),
            rate: 10.0,
            life_min: 1.0,
            life_max: 2.0,
            start_color: [1.0, 1.0, 1.0, 1.0],
            end_color: [1.0, 1.0, 1.0, 0.0],
            start_size: 0.1,
            end_size: 0.1,
            texture: 0,
            emitting: true,
            accum: 0.0,
            pool: vec![
                Particle {
                    position: Vector3::zero(),
                    velocity: Vector3::zero(),
                    life: 0.0,
                    life_max: 0.0,
                    start_color: [0.0; 4],
                    end_color: [0.0; 4],
                    start_size: 0.0,
                    end_size: 0.0,
                    alive: false,
                };
                capacity
            ],
        }
    }

    pub fn capacity(&self) -> usize {
        self.pool.len()
    }

    pub fn alive_count(&self) -> usize {
        self.pool.iter().filter(|p| p.alive).count()
    }

    /// Spawns one particle into the first dead slot. Pool exhaustion drops
    /// the spawn silently.
    fn spawn(&mut self) {
        let jitter = |half: f32| {
            if half.abs() <= f32::EPSILON {
                0.0
            } else {
                rand::rng().random_range(-half..=half)
            }
        };
        let velocity = self.velocity
            + Vector3::new(jitter(self.spread.x), jitter(self.spread.y), jitter(self.spread.z));
        let life = if self.life_max > self.life_min {
            rand::rng().random_range(self.life_min..=self.life_max)
        } else {
            self.life_min
        };
        if let Some(slot) = self.pool.iter_mut().find(|p| !p.alive) {
            *slot = Particle {
                position: self.position,
                velocity,
                life,
                life_max: life,
                start_color: self.start_color,
                end_color: self.end_color,
                start_size: self.start_size,
                end_size: self.end_size,
                alive: true,
            };
        }
    }

    /// Spawns `count` particles immediately, independent of the rate.
    pub fn burst(&mut self, count: usize) {
        for _ in 0..count {
            self.spawn();
        }
    }

    /// Advances the emitter by `dt` seconds: spawns owed particles, then
    /// integrates gravity, velocity and lifetime for the whole pool.
    pub fn update(&mut self, dt: f32) {
        if self.emitting && self.rate > 0.0 {
            self.accum += self.rate * dt;
            while self.accum >= 1.0 {
                self.accum -= 1.0;
                self.spawn();
            }
        }
        for particle in &mut self.pool {
            if !particle.alive {
                continue;
            }
            particle.velocity += self.gravity * dt;
            particle.position += particle.velocity * dt;
            particle.life -= dt;
            if particle.life <= 0.0 {
                particle.alive = false;
            }
        }
    }

    /// Kills every particle and resets the spawn accumulator.
    pub fn reset(&mut self) {
        self.accum = 0.0;
        for particle in &mut self.pool {
            particle.alive = false;
        }
    }

    pub fn alive(&self) -> impl Iterator<Item = &Particle> {
        self.pool.iter().filter(|p| p.alive)
    }

    /// Packs alive particles into billboard instance data.
    pub fn instances(&self) -> Vec<ParticleInstance> {
        self.alive()
            .map(|p| ParticleInstance {
                position: [p.position.x, p.position.y, p.position.z],
                size: p.size(),
                color: p.color(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quiet_emitter() -> Emitter {
        let mut emitter = Emitter::new(16);
        emitter.rate = 0.0;
        emitter.spread = Vector3::zero();
        emitter.gravity = Vector3::zero();
        emitter.life_min = 1.0;
        emitter.life_max = 1.0;
        emitter
    }

    #[test]
    fn particle_dies_once_its_life_is_spent() {
        let mut emitter = quiet_emitter();
        emitter.burst(1);
        assert_eq!(emitter.alive_count(), 1);
        emitter.update(1.5);
        assert_eq!(emitter.alive_count(), 0);
    }

    #[test]
    fn color_at_half_life_is_the_midpoint_lerp() {
        let mut emitter = quiet_emitter();
        emitter.start_color = [1.0, 0.0, 0.0, 1.0];
        emitter.end_color = [0.0, 0.0, 1.0, 0.0];
        emitter.burst(1);
        emitter.update(0.5);
        let particle = emitter.alive().next().unwrap();
        let color = particle.color();
        assert_relative_eq!(color[0], 0.5);
        assert_relative_eq!(color[2], 0.5);
        assert_relative_eq!(color[3], 0.5);
    }

    #[test]
    fn accumulator_spawns_the_owed_whole_particles() {
        let mut emitter = quiet_emitter();
        emitter.rate = 10.0;
        emitter.update(0.25);
        assert_eq!(emitter.alive_count(), 2);
        // The fractional remainder carries into the next step.
        emitter.update(0.05);
        assert_eq!(emitter.alive_count(), 3);
    }

    #[test]
    fn pool_exhaustion_drops_spawns_silently() {
        let mut emitter = quiet_emitter();
        emitter.burst(100);
        assert_eq!(emitter.alive_count(), 16);
    }

    #[test]
    fn dead_particles_are_excluded_from_instances() {
        let mut emitter = quiet_emitter();
        emitter.life_min = 10.0;
        emitter.life_max = 10.0;
        emitter.burst(3);
        emitter.update(0.1);
        assert_eq!(emitter.instances().len(), 3);
        emitter.reset();
        assert!(emitter.instances().is_empty());
    }

    #[test]
    fn gravity_integrates_into_velocity_then_position() {
        let mut emitter = quiet_emitter();
        emitter.velocity = Vector3::zero();
        emitter.gravity = Vector3::new(0.0, -10.0, 0.0);
        emitter.life_min = 10.0;
        emitter.life_max = 10.0;
        emitter.burst(1);
        emitter.update(1.0);
        let particle = emitter.alive().next().unwrap();
        assert_relative_eq!(particle.velocity.y, -10.0);
        assert_relative_eq!(particle.position.y, -10.0);
    }

    #[test]
    fn pool_size_is_clamped_to_the_hard_cap() {
        assert_eq!(Emitter::new(0).capacity(), 1);
        assert_eq!(Emitter::new(1 << 20).capacity(), MAX_PARTICLES_PER_EMITTER);
    }
}
