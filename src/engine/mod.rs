//! Embedded-browser engine boundary
//!
//! The engine itself is an external collaborator: it renders web content
//! off-screen and hands pixel buffers back through paint callbacks. This
//! module defines the host-side vocabulary for talking to it — the input
//! event records we forward, the [`BrowserHost`] trait each live browser
//! exposes, and the callbacks the engine delivers back to the host
//! ([`EngineEvent`]). A software [`DemoSource`] implements the contract so
//! the whole pipeline runs without a native engine.

mod demo;
mod registry;

pub use demo::{DemoBrowser, DemoSource};
pub use registry::BrowserRegistry;

use crate::compositor::{DirtyRect, PopupRect, SurfaceKind};

/// Unique browser identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrowserId(u64);

impl BrowserId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Press/release discriminant for key and button events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
}

/// Key event record forwarded to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Native (platform) key code, untranslated
    pub native_code: u32,
    pub action: KeyAction,
}

/// Mouse buttons the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButtonKind {
    Left,
    Middle,
    Right,
}

/// Pointer position record in window-local pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub x: i32,
    pub y: i32,
}

/// Wheel event record: position plus scroll deltas in integer units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelEvent {
    pub x: i32,
    pub y: i32,
    pub delta_x: i32,
    pub delta_y: i32,
}

/// Host-side handle to one live embedded browser.
///
/// Input forwarding pushes events through this trait; the engine's own
/// process model, message loop, and paint scheduling stay behind it.
pub trait BrowserHost {
    fn id(&self) -> BrowserId;

    fn send_key_event(&mut self, event: KeyEvent);

    /// `leaving` is true when the pointer exits the view
    fn send_mouse_move_event(&mut self, event: MouseEvent, leaving: bool);

    fn send_mouse_click_event(
        &mut self,
        event: MouseEvent,
        button: MouseButtonKind,
        released: bool,
        click_count: u32,
    );

    fn send_mouse_wheel_event(&mut self, event: WheelEvent);

    /// Notify the engine that the view size changed. A paint callback with a
    /// full-surface dirty region follows.
    fn was_resized(&mut self, width: u32, height: u32);

    /// Ask the browser to close. The engine answers with
    /// [`EngineEvent::Closed`] once teardown finishes.
    fn request_close(&mut self);
}

/// One paint callback from the engine: a BGRA pixel buffer plus the list of
/// changed rectangles. The buffer is 32-bit-per-pixel, row-major, tightly
/// packed at `width * 4` bytes per row.
#[derive(Debug, Clone)]
pub struct PaintEvent {
    pub kind: SurfaceKind,
    pub dirty: Vec<DirtyRect>,
    pub buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Callbacks the engine delivers to the host, already marshaled onto the UI
/// thread. The host drains these once per event-loop turn.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Off-screen paint output is ready
    Paint(PaintEvent),
    /// The popup overlay moved or resized; `None` means it closed
    PopupRect(Option<PopupRect>),
    /// The page title changed; the host mirrors it onto the window
    TitleChanged(String),
    /// A browser finished closing and must leave the registry
    Closed(BrowserId),
    /// The engine failed to load its content
    LoadError {
        code: i32,
        description: String,
        url: String,
    },
}
