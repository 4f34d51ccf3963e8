//! Toolkit-neutral window events
//!
//! GLFW and SDL events are translated into [`WindowEvent`] before they reach
//! application code, so handlers never depend on the toolkit in use.

use crate::EngineResult;

/// Keys the engine distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Escape
    Escape,
    /// Space bar
    Space,
    /// Return / Enter
    Enter,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Letter or digit, lowercase
    Char(char),
    /// Any other key
    Other,
}

impl Key {
    /// Map an ASCII key code (letters in either case, digits) to a key
    pub fn from_ascii(code: i32) -> Self {
        match u8::try_from(code) {
            Ok(byte) if byte.is_ascii_alphanumeric() => Key::Char(char::from(byte.to_ascii_lowercase())),
            _ => Key::Other,
        }
    }
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button
    Left,
    /// Secondary button
    Right,
    /// Wheel button
    Middle,
    /// Extra buttons
    Other,
}

/// Event delivered to an [`EventHandler`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowEvent {
    /// Drawable area changed, in pixels
    Resized {
        /// New width
        width: u32,
        /// New height
        height: u32,
    },
    /// Key pressed (including repeats) or released
    Key {
        /// Key
        key: Key,
        /// `true` on press or repeat
        pressed: bool,
    },
    /// Cursor moved, in window coordinates
    MouseMoved {
        /// Horizontal position
        x: f64,
        /// Vertical position
        y: f64,
    },
    /// Mouse button pressed or released
    MouseButton {
        /// Button
        button: MouseButton,
        /// `true` on press
        pressed: bool,
    },
    /// User asked to close the window
    CloseRequested,
}

/// Whether the loop should keep going after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    /// Keep running
    Continue,
    /// Close the window
    Exit,
}

/// Application callbacks driven by [`Window::run_loop`](super::Window::run_loop)
pub trait EventHandler {
    /// React to one event
    fn handle_event(&mut self, event: &WindowEvent) -> LoopControl;

    /// Draw one frame; called once per loop iteration after events
    fn frame(&mut self) -> EngineResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_keys() {
        assert_eq!(Key::from_ascii('R' as i32), Key::Char('r'));
        assert_eq!(Key::from_ascii('r' as i32), Key::Char('r'));
        assert_eq!(Key::from_ascii('7' as i32), Key::Char('7'));
        assert_eq!(Key::from_ascii(' ' as i32), Key::Other);
        assert_eq!(Key::from_ascii(1 << 30), Key::Other);
        assert_eq!(Key::from_ascii(-1), Key::Other);
    }
}
