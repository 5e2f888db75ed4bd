//! Keyboard and mouse input state.
//!
//! [`Input`] tracks which keys/buttons are currently pressed, just pressed
//! this frame, or just released this frame. The platform layer feeds events in
//! through [`InputState`]; the engine clears the per-frame sets at the start of
//! every frame.

use std::collections::HashSet;
use std::hash::Hash;

use crate::math::Vec2;

/// Keys the gameplay code understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    W,
    A,
    S,
    D,
    Q,
    E,
    Space,
    LeftShift,
    Escape,
    Enter,
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Tracks the state of a set of inputs (keys or mouse buttons).
///
/// - `pressed`: currently held down
/// - `just_pressed`: pressed this frame (not held last frame)
/// - `just_released`: released this frame
#[derive(Debug, Clone)]
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Returns `true` if the input is currently held down.
    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    /// Returns `true` if the input was pressed this frame.
    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    /// Returns `true` if the input was released this frame.
    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    /// Record a press from the platform layer.
    pub fn press(&mut self, input: T) {
        if self.pressed.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    /// Record a release from the platform layer.
    pub fn release(&mut self, input: T) {
        if self.pressed.remove(&input) {
            self.just_released.insert(input);
        }
    }

    /// Clear per-frame state. Called at the start of each frame.
    pub(crate) fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// All input for one frame: keys, mouse buttons and mouse motion.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub keys: Input<KeyCode>,
    pub mouse: Input<MouseButton>,
    /// Cursor position in window coordinates.
    pub cursor: Vec2,
    /// Mouse movement accumulated since the last frame.
    pub mouse_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record cursor motion from the platform layer.
    pub fn move_cursor(&mut self, position: Vec2) {
        self.mouse_delta += position - self.cursor;
        self.cursor = position;
    }

    /// Movement axis from WASD: x is strafe (D positive), y is forward (W positive).
    pub fn movement_axis(&self) -> Vec2 {
        let mut axis = Vec2::ZERO;
        if self.keys.pressed(KeyCode::W) {
            axis.y += 1.0;
        }
        if self.keys.pressed(KeyCode::S) {
            axis.y -= 1.0;
        }
        if self.keys.pressed(KeyCode::D) {
            axis.x += 1.0;
        }
        if self.keys.pressed(KeyCode::A) {
            axis.x -= 1.0;
        }
        axis.normalize_or_zero()
    }

    pub(crate) fn begin_frame(&mut self) {
        self.keys.clear_just();
        self.mouse.clear_just();
        self.mouse_delta = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_sets_just_pressed_once() {
        let mut input = InputState::new();
        input.keys.press(KeyCode::Space);
        assert!(input.keys.pressed(KeyCode::Space));
        assert!(input.keys.just_pressed(KeyCode::Space));

        input.begin_frame();
        input.keys.press(KeyCode::Space);
        assert!(input.keys.pressed(KeyCode::Space));
        assert!(!input.keys.just_pressed(KeyCode::Space));
    }

    #[test]
    fn release_sets_just_released() {
        let mut input = InputState::new();
        input.mouse.press(MouseButton::Left);
        input.begin_frame();
        input.mouse.release(MouseButton::Left);
        assert!(!input.mouse.pressed(MouseButton::Left));
        assert!(input.mouse.just_released(MouseButton::Left));
    }

    #[test]
    fn cursor_motion_accumulates_until_frame_start() {
        let mut input = InputState::new();
        input.move_cursor(Vec2::new(10.0, 0.0));
        input.move_cursor(Vec2::new(15.0, 5.0));
        assert_eq!(input.mouse_delta, Vec2::new(15.0, 5.0));
        input.begin_frame();
        assert_eq!(input.mouse_delta, Vec2::ZERO);
        assert_eq!(input.cursor, Vec2::new(15.0, 5.0));
    }

    #[test]
    fn movement_axis_is_normalized() {
        let mut input = InputState::new();
        input.keys.press(KeyCode::W);
        input.keys.press(KeyCode::D);
        let axis = input.movement_axis();
        assert!((axis.length() - 1.0).abs() < 1e-5);
        assert!(axis.x > 0.0 && axis.y > 0.0);
    }
}
