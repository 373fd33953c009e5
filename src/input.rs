use std::collections::HashSet;

use glam::{Vec2, Vec3};
use winit::{
    event::{DeviceEvent, ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// Held keys and mouse motion accumulated between frames.
#[derive(Default)]
pub struct InputState {
    pressed: HashSet<KeyCode>,
    mouse_delta: Vec2,
}

impl InputState {
    pub fn window_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state,
                    ..
                },
            ..
        } = event
        {
            self.key(*code, *state);
        }
    }

    pub fn device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (x, y) } = event {
            self.mouse_delta += Vec2::new(*x as f32, *y as f32);
        }
    }

    pub fn key(&mut self, code: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.pressed.insert(code);
            }
            ElementState::Released => {
                self.pressed.remove(&code);
            }
        }
    }

    pub fn is_pressed(&self, code: KeyCode) -> bool {
        self.pressed.contains(&code)
    }

    /// (right, forward, up) from WASD, Space and Shift.
    pub fn movement(&self) -> Vec3 {
        let axis = |pos: KeyCode, neg: KeyCode| {
            self.is_pressed(pos) as i32 as f32 - self.is_pressed(neg) as i32 as f32
        };
        Vec3::new(
            axis(KeyCode::KeyD, KeyCode::KeyA),
            axis(KeyCode::KeyW, KeyCode::KeyS),
            axis(KeyCode::Space, KeyCode::ShiftLeft),
        )
    }

    /// Mouse motion since the last call.
    pub fn take_mouse_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.mouse_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposing_keys_cancel() {
        let mut input = InputState::default();
        input.key(KeyCode::KeyW, ElementState::Pressed);
        input.key(KeyCode::KeyD, ElementState::Pressed);
        input.key(KeyCode::KeyA, ElementState::Pressed);
        input.key(KeyCode::Space, ElementState::Pressed);
        assert_eq!(input.movement(), Vec3::new(0.0, 1.0, 1.0));
        input.key(KeyCode::KeyA, ElementState::Released);
        input.key(KeyCode::Space, ElementState::Released);
        assert_eq!(input.movement(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn mouse_delta_accumulates_until_taken() {
        let mut input = InputState::default();
        input.device_event(&DeviceEvent::MouseMotion { delta: (2.0, -1.0) });
        input.device_event(&DeviceEvent::MouseMotion { delta: (1.0, 0.5) });
        assert_eq!(input.take_mouse_delta(), Vec2::new(3.0, -0.5));
        assert_eq!(input.take_mouse_delta(), Vec2::ZERO);
    }
}
