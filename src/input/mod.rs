//! Input forwarding: winit callbacks to engine input events
//!
//! Translates the windowing layer's vocabulary (key codes, button indices,
//! cursor positions, scroll deltas) into the engine's event records and
//! delivers them to every live browser. The forwarder owns the last known
//! cursor position; button and wheel events are built from it.

use log::warn;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::engine::{
    BrowserRegistry, KeyAction, KeyEvent, MouseButtonKind, MouseEvent, WheelEvent,
};

/// Last known pointer position in window-local pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorState {
    pub x: i32,
    pub y: i32,
}

/// Translates windowing input into engine events and fans them out to the
/// registry. One instance per window; owned by the application shell.
pub struct InputForwarder {
    cursor: CursorState,
}

impl InputForwarder {
    pub fn new() -> Self {
        Self {
            cursor: CursorState::default(),
        }
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    /// Forward a key press/release with its native code.
    pub fn on_key(&mut self, registry: &mut BrowserRegistry, key: PhysicalKey, state: ElementState) {
        let Some(native_code) = native_key_code(key) else {
            warn!("unmapped key {key:?}, dropped");
            return;
        };
        let event = KeyEvent {
            native_code,
            action: match state {
                ElementState::Pressed => KeyAction::Press,
                ElementState::Released => KeyAction::Release,
            },
        };
        for browser in registry.iter_mut() {
            browser.send_key_event(event);
        }
    }

    /// Update the cursor and forward a move event (never leaving).
    pub fn on_pointer_move(&mut self, registry: &mut BrowserRegistry, x: f64, y: f64) {
        self.cursor = CursorState {
            x: x as i32,
            y: y as i32,
        };
        let event = MouseEvent {
            x: self.cursor.x,
            y: self.cursor.y,
        };
        for browser in registry.iter_mut() {
            browser.send_mouse_move_event(event, false);
        }
    }

    /// Forward a click at the current cursor position. Unmapped buttons are
    /// dropped with a warning.
    pub fn on_button(
        &mut self,
        registry: &mut BrowserRegistry,
        button: MouseButton,
        state: ElementState,
    ) {
        let Some(kind) = map_mouse_button(button) else {
            warn!("unmapped mouse button {button:?}, dropped");
            return;
        };
        let event = MouseEvent {
            x: self.cursor.x,
            y: self.cursor.y,
        };
        let released = state == ElementState::Released;
        for browser in registry.iter_mut() {
            browser.send_mouse_click_event(event, kind, released, 1);
        }
    }

    /// Forward a wheel event with deltas cast to integer units.
    pub fn on_scroll(&mut self, registry: &mut BrowserRegistry, delta: MouseScrollDelta) {
        let (dx, dy) = match delta {
            MouseScrollDelta::LineDelta(x, y) => (x as i32, y as i32),
            MouseScrollDelta::PixelDelta(pos) => (pos.x as i32, pos.y as i32),
        };
        let event = WheelEvent {
            x: self.cursor.x,
            y: self.cursor.y,
            delta_x: dx,
            delta_y: dy,
        };
        for browser in registry.iter_mut() {
            browser.send_mouse_wheel_event(event);
        }
    }

    /// Inform every browser that the view size changed. The engine answers
    /// with a full-surface paint.
    pub fn on_resize(&mut self, registry: &mut BrowserRegistry, width: u32, height: u32) {
        for browser in registry.iter_mut() {
            browser.was_resized(width, height);
        }
    }
}

impl Default for InputForwarder {
    fn default() -> Self {
        Self::new()
    }
}

/// Map the physical buttons the engine understands; everything else is
/// unmapped.
pub fn map_mouse_button(button: MouseButton) -> Option<MouseButtonKind> {
    match button {
        MouseButton::Left => Some(MouseButtonKind::Left),
        MouseButton::Middle => Some(MouseButtonKind::Middle),
        MouseButton::Right => Some(MouseButtonKind::Right),
        _ => None,
    }
}

/// Translate a winit physical key to the Windows-style virtual key code the
/// engine expects. Keys without a stable mapping return `None`.
pub fn native_key_code(key: PhysicalKey) -> Option<u32> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let vk = match code {
        KeyCode::KeyA => 0x41,
        KeyCode::KeyB => 0x42,
        KeyCode::KeyC => 0x43,
        KeyCode::KeyD => 0x44,
        KeyCode::KeyE => 0x45,
        KeyCode::KeyF => 0x46,
        KeyCode::KeyG => 0x47,
        KeyCode::KeyH => 0x48,
        KeyCode::KeyI => 0x49,
        KeyCode::KeyJ => 0x4A,
        KeyCode::KeyK => 0x4B,
        KeyCode::KeyL => 0x4C,
        KeyCode::KeyM => 0x4D,
        KeyCode::KeyN => 0x4E,
        KeyCode::KeyO => 0x4F,
        KeyCode::KeyP => 0x50,
        KeyCode::KeyQ => 0x51,
        KeyCode::KeyR => 0x52,
        KeyCode::KeyS => 0x53,
        KeyCode::KeyT => 0x54,
        KeyCode::KeyU => 0x55,
        KeyCode::KeyV => 0x56,
        KeyCode::KeyW => 0x57,
        KeyCode::KeyX => 0x58,
        KeyCode::KeyY => 0x59,
        KeyCode::KeyZ => 0x5A,
        KeyCode::Digit0 => 0x30,
        KeyCode::Digit1 => 0x31,
        KeyCode::Digit2 => 0x32,
        KeyCode::Digit3 => 0x33,
        KeyCode::Digit4 => 0x34,
        KeyCode::Digit5 => 0x35,
        KeyCode::Digit6 => 0x36,
        KeyCode::Digit7 => 0x37,
        KeyCode::Digit8 => 0x38,
        KeyCode::Digit9 => 0x39,
        KeyCode::Space => 0x20,
        KeyCode::Enter => 0x0D,
        KeyCode::Escape => 0x1B,
        KeyCode::Backspace => 0x08,
        KeyCode::Tab => 0x09,
        KeyCode::Delete => 0x2E,
        KeyCode::Insert => 0x2D,
        KeyCode::Home => 0x24,
        KeyCode::End => 0x23,
        KeyCode::PageUp => 0x21,
        KeyCode::PageDown => 0x22,
        KeyCode::ArrowLeft => 0x25,
        KeyCode::ArrowUp => 0x26,
        KeyCode::ArrowRight => 0x27,
        KeyCode::ArrowDown => 0x28,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => 0x10,
        KeyCode::ControlLeft | KeyCode::ControlRight => 0x11,
        KeyCode::AltLeft | KeyCode::AltRight => 0x12,
        KeyCode::F1 => 0x70,
        KeyCode::F2 => 0x71,
        KeyCode::F3 => 0x72,
        KeyCode::F4 => 0x73,
        KeyCode::F5 => 0x74,
        KeyCode::F6 => 0x75,
        KeyCode::F7 => 0x76,
        KeyCode::F8 => 0x77,
        KeyCode::F9 => 0x78,
        KeyCode::F10 => 0x79,
        KeyCode::F11 => 0x7A,
        KeyCode::F12 => 0x7B,
        _ => return None,
    };
    Some(vk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{Forwarded, RecordingHost};

    fn registry_with_host() -> (
        BrowserRegistry,
        std::rc::Rc<std::cell::RefCell<Vec<Forwarded>>>,
    ) {
        let mut registry = BrowserRegistry::new();
        let (host, events) = RecordingHost::new(1);
        registry.on_after_created(Box::new(host));
        (registry, events)
    }

    #[test]
    fn pointer_position_flows_into_click_events() {
        let (mut registry, events) = registry_with_host();
        let mut forwarder = InputForwarder::new();

        forwarder.on_pointer_move(&mut registry, 120.7, 45.2);
        forwarder.on_button(&mut registry, MouseButton::Left, ElementState::Pressed);

        let events = events.borrow();
        assert_eq!(events[0], Forwarded::Move(MouseEvent { x: 120, y: 45 }, false));
        assert_eq!(
            events[1],
            Forwarded::Click(
                MouseEvent { x: 120, y: 45 },
                MouseButtonKind::Left,
                false,
                1
            )
        );
    }

    #[test]
    fn wheel_events_use_cursor_and_integer_deltas() {
        let (mut registry, events) = registry_with_host();
        let mut forwarder = InputForwarder::new();

        forwarder.on_pointer_move(&mut registry, 10.0, 20.0);
        forwarder.on_scroll(&mut registry, MouseScrollDelta::LineDelta(1.9, -2.9));

        assert_eq!(
            events.borrow()[1],
            Forwarded::Wheel(WheelEvent {
                x: 10,
                y: 20,
                delta_x: 1,
                delta_y: -2
            })
        );
    }

    #[test]
    fn unmapped_button_is_dropped() {
        let (mut registry, events) = registry_with_host();
        let mut forwarder = InputForwarder::new();

        forwarder.on_button(&mut registry, MouseButton::Back, ElementState::Pressed);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn key_events_carry_native_code_and_action() {
        let (mut registry, events) = registry_with_host();
        let mut forwarder = InputForwarder::new();

        forwarder.on_key(
            &mut registry,
            PhysicalKey::Code(KeyCode::KeyA),
            ElementState::Pressed,
        );
        forwarder.on_key(
            &mut registry,
            PhysicalKey::Code(KeyCode::KeyA),
            ElementState::Released,
        );

        let events = events.borrow();
        assert_eq!(
            events[0],
            Forwarded::Key(KeyEvent {
                native_code: 0x41,
                action: KeyAction::Press
            })
        );
        assert_eq!(
            events[1],
            Forwarded::Key(KeyEvent {
                native_code: 0x41,
                action: KeyAction::Release
            })
        );
    }

    #[test]
    fn resize_notifies_every_browser() {
        let mut registry = BrowserRegistry::new();
        let (a, a_events) = RecordingHost::new(1);
        let (b, b_events) = RecordingHost::new(2);
        registry.on_after_created(Box::new(a));
        registry.on_after_created(Box::new(b));
        let mut forwarder = InputForwarder::new();

        forwarder.on_resize(&mut registry, 640, 480);

        assert_eq!(a_events.borrow().as_slice(), &[Forwarded::Resized(640, 480)]);
        assert_eq!(b_events.borrow().as_slice(), &[Forwarded::Resized(640, 480)]);
    }

    #[test]
    fn button_mapping_covers_exactly_three_buttons() {
        assert_eq!(map_mouse_button(MouseButton::Left), Some(MouseButtonKind::Left));
        assert_eq!(map_mouse_button(MouseButton::Middle), Some(MouseButtonKind::Middle));
        assert_eq!(map_mouse_button(MouseButton::Right), Some(MouseButtonKind::Right));
        assert_eq!(map_mouse_button(MouseButton::Forward), None);
        assert_eq!(map_mouse_button(MouseButton::Other(7)), None);
    }
}
