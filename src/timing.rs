//! Frame timing: per-frame delta seconds and a once-per-second FPS sample.

use std::time::Instant;

/// Tracks delta time between `tick` calls and samples FPS once per second.
pub struct FrameClock {
    last_tick: Instant,
    delta: f32,
    fps: u32,
    frame_counter: u32,
    fps_window: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            delta: 0.0,
            fps: 0,
            frame_counter: 0,
            fps_window: 0.0,
        }
    }

    /// Advances the clock by one frame. Call exactly once per frame.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;

        self.frame_counter += 1;
        self.fps_window += self.delta;
        if self.fps_window >= 1.0 {
            self.fps = self.frame_counter;
            self.frame_counter = 0;
            self.fps_window -= 1.0;
        }
    }

    /// Seconds elapsed between the two most recent `tick` calls.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Frames counted over the last full second. 0 until one second has
    /// elapsed.
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_non_negative_and_fps_starts_at_zero() {
        let mut clock = FrameClock::new();
        clock.tick();
        assert!(clock.delta() >= 0.0);
        assert_eq!(clock.fps(), 0);
    }
}
