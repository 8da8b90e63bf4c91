//! # Keyframe Animation
//!
//! Three independent vector tracks (position, rotation in degrees, scale)
//! sampled by linear interpolation. Keys insert in time order, playback is
//! driven by [`Animation::update`] and the sampled pose is applied to a
//! scene node by the engine each frame.

use cgmath::Vector3;
use log::warn;

/// Maximum keyframes per track.
pub const MAX_KEYFRAMES: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub value: Vector3<f32>,
}

/// One interpolated channel of an animation.
#[derive(Debug, Clone, Default)]
pub struct Track {
    keys: Vec<Keyframe>,
}

impl Track {
    /// Inserts a key keeping the track sorted by time. A key at an existing
    /// time replaces the old value. Returns false when the track is full.
    pub fn insert(&mut self, time: f32, value: Vector3<f32>) -> bool {
        if let Some(key) = self.keys.iter_mut().find(|k| k.time == time) {
            key.value = value;
            return true;
        }
        if self.keys.len() >= MAX_KEYFRAMES {
            return false;
        }
        let index = self.keys.partition_point(|k| k.time < time);
        self.keys.insert(index, Keyframe { time, value });
        true
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn last_time(&self) -> f32 {
        self.keys.last().map_or(0.0, |k| k.time)
    }

    /// Samples the track at `time`, clamping outside the key range. Returns
    /// `default` for an empty track.
    pub fn sample(&self, time: f32, default: Vector3<f32>) -> Vector3<f32> {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return default,
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }
        // partition_point > 0 here because time > first.time.
        let upper = self.keys.partition_point(|k| k.time <= time);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.time - a.time;
        if span <= 0.0 {
            return a.value;
        }
        let t = (time - a.time) / span;
        a.value + (b.value - a.value) * t
    }
}

/// Sampled pose of all three tracks at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f32>,
    pub rotation_deg: Vector3<f32>,
    pub scale: Vector3<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct Animation {
    pub position: Track,
    pub rotation: Track,
    pub scale: Track,
    pub looping: bool,
    time: f32,
    playing: bool,
    /// Node the sampled pose is applied to, 0 when unbound.
    pub target: crate::arena::Handle,
}

impl Animation {
    /// Longest key time across the three tracks.
    pub fn duration(&self) -> f32 {
        self.position
            .last_time()
            .max(self.rotation.last_time())
            .max(self.scale.last_time())
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Jumps the playhead, clamped into `[0, duration]`.
    pub fn seek(&mut self, time: f32) {
        self.time = time.clamp(0.0, self.duration());
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advances the playhead by `dt` seconds. Looping animations wrap at the
    /// duration; one-shot animations clamp to the end and stop.
    pub fn update(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        let duration = self.duration();
        if duration <= 0.0 {
            warn!("animation update with no keyframes, stopping");
            self.playing = false;
            return;
        }
        self.time += dt;
        if self.time >= duration {
            if self.looping {
                self.time %= duration;
            } else {
                self.time = duration;
                self.playing = false;
            }
        }
    }

    /// Samples all tracks at the current playhead. Empty tracks fall back
    /// to identity transform components.
    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position.sample(self.time, Vector3::new(0.0, 0.0, 0.0)),
            rotation_deg: self.rotation.sample(self.time, Vector3::new(0.0, 0.0, 0.0)),
            scale: self.scale.sample(self.time, Vector3::new(1.0, 1.0, 1.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vec(x: f32, y: f32, z: f32) -> Vector3<f32> {
        Vector3::new(x, y, z)
    }

    #[test]
    fn midpoint_of_two_keys_interpolates_linearly() {
        let mut anim = Animation::default();
        anim.position.insert(0.0, vec(0.0, 0.0, 0.0));
        anim.position.insert(2.0, vec(10.0, 0.0, 0.0));
        anim.seek(1.0);
        assert_relative_eq!(anim.pose().position.x, 5.0);
    }

    #[test]
    fn sampling_clamps_outside_the_key_range() {
        let mut anim = Animation::default();
        anim.position.insert(1.0, vec(3.0, 0.0, 0.0));
        anim.position.insert(2.0, vec(7.0, 0.0, 0.0));
        assert_relative_eq!(anim.position.sample(0.0, vec(0.0, 0.0, 0.0)).x, 3.0);
        assert_relative_eq!(anim.position.sample(9.0, vec(0.0, 0.0, 0.0)).x, 7.0);
    }

    #[test]
    fn keys_insert_sorted_regardless_of_call_order() {
        let mut track = Track::default();
        track.insert(2.0, vec(2.0, 0.0, 0.0));
        track.insert(0.0, vec(0.0, 0.0, 0.0));
        track.insert(1.0, vec(1.0, 0.0, 0.0));
        assert_relative_eq!(track.sample(0.5, vec(0.0, 0.0, 0.0)).x, 0.5);
        assert_relative_eq!(track.sample(1.5, vec(0.0, 0.0, 0.0)).x, 1.5);
    }

    #[test]
    fn duplicate_time_replaces_the_key() {
        let mut track = Track::default();
        track.insert(1.0, vec(1.0, 0.0, 0.0));
        track.insert(1.0, vec(9.0, 0.0, 0.0));
        assert_eq!(track.len(), 1);
        assert_relative_eq!(track.sample(1.0, vec(0.0, 0.0, 0.0)).x, 9.0);
    }

    #[test]
    fn full_track_rejects_further_keys() {
        let mut track = Track::default();
        for i in 0..MAX_KEYFRAMES {
            assert!(track.insert(i as f32, vec(0.0, 0.0, 0.0)));
        }
        assert!(!track.insert(9999.0, vec(0.0, 0.0, 0.0)));
    }

    #[test]
    fn looping_playback_wraps_at_the_duration() {
        let mut anim = Animation::default();
        anim.position.insert(0.0, vec(0.0, 0.0, 0.0));
        anim.position.insert(2.0, vec(2.0, 0.0, 0.0));
        anim.looping = true;
        anim.play();
        anim.update(3.0);
        assert_relative_eq!(anim.time(), 1.0);
        assert!(anim.is_playing());
    }

    #[test]
    fn one_shot_playback_clamps_and_stops() {
        let mut anim = Animation::default();
        anim.position.insert(0.0, vec(0.0, 0.0, 0.0));
        anim.position.insert(2.0, vec(2.0, 0.0, 0.0));
        anim.play();
        anim.update(5.0);
        assert_relative_eq!(anim.time(), 2.0);
        assert!(!anim.is_playing());
    }

    #[test]
    fn empty_tracks_sample_identity_components() {
        let anim = Animation::default();
        let pose = anim.pose();
        assert_relative_eq!(pose.position.x, 0.0);
        assert_relative_eq!(pose.scale.x, 1.0);
    }

    #[test]
    fn duration_is_the_longest_track() {
        let mut anim = Animation::default();
        anim.position.insert(1.0, vec(0.0, 0.0, 0.0));
        anim.scale.insert(4.0, vec(2.0, 2.0, 2.0));
        assert_relative_eq!(anim.duration(), 4.0);
    }
}
