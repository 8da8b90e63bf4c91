//! # Input Snapshot
//!
//! The engine does not poll the window system itself; the host event loop
//! owns winit and feeds the engine one [`InputSnapshot`] per frame through
//! [`crate::Engine::update`]. The engine diffs consecutive snapshots to
//! answer edge queries (key pressed / released this frame).

use std::collections::HashSet;

use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Per-frame keyboard and mouse state, built by the host event loop.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    keys: HashSet<KeyCode>,
    mouse_position: (f32, f32),
    mouse_delta: (f32, f32),
    buttons: [bool; 3],
    scroll: f32,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a winit window event into the snapshot. The host calls this for
    /// every event between frames, then hands the snapshot to the engine.
    pub fn apply_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            self.keys.insert(code);
                        }
                        ElementState::Released => {
                            self.keys.remove(&code);
                        }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = (position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = *state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.buttons[0] = pressed,
                    MouseButton::Middle => self.buttons[1] = pressed,
                    MouseButton::Right => self.buttons[2] = pressed,
                    _ => {}
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
            }
            _ => {}
        }
    }

    /// Folds a winit device event (relative mouse motion) into the snapshot.
    pub fn apply_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.mouse_delta.0 += delta.0 as f32;
            self.mouse_delta.1 += delta.1 as f32;
        }
    }

    /// Clears the per-frame accumulators (mouse delta, scroll) while keeping
    /// held-key and button state. The host calls this after each frame.
    pub fn clear_frame_deltas(&mut self) {
        self.mouse_delta = (0.0, 0.0);
        self.scroll = 0.0;
    }

    pub fn set_key(&mut self, key: KeyCode, held: bool) {
        if held {
            self.keys.insert(key);
        } else {
            self.keys.remove(&key);
        }
    }

    pub fn key(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    pub fn mouse_position(&self) -> (f32, f32) {
        self.mouse_position
    }

    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    /// Button state: 1 = left, 2 = middle, 3 = right (anything else false).
    pub fn mouse_button(&self, button: u8) -> bool {
        match button {
            1..=3 => self.buttons[button as usize - 1],
            _ => false,
        }
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    /// True if `key` is held in `self` but was not held in `previous`.
    pub(crate) fn key_pressed_since(&self, previous: &InputSnapshot, key: KeyCode) -> bool {
        self.key(key) && !previous.key(key)
    }

    /// True if `key` was held in `previous` but is no longer held in `self`.
    pub(crate) fn key_released_since(&self, previous: &InputSnapshot, key: KeyCode) -> bool {
        !self.key(key) && previous.key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_edges_come_from_snapshot_diff() {
        let mut previous = InputSnapshot::new();
        let mut current = InputSnapshot::new();
        current.set_key(KeyCode::Space, true);

        assert!(current.key_pressed_since(&previous, KeyCode::Space));
        assert!(!current.key_released_since(&previous, KeyCode::Space));

        previous.set_key(KeyCode::Space, true);
        current.set_key(KeyCode::Space, false);
        assert!(current.key_released_since(&previous, KeyCode::Space));
    }

    #[test]
    fn unknown_mouse_button_is_false() {
        let snapshot = InputSnapshot::new();
        assert!(!snapshot.mouse_button(0));
        assert!(!snapshot.mouse_button(9));
    }
}
