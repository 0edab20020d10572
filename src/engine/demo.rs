//! Software demo paint source
//!
//! Stands in for the native engine so the whole pipeline runs end to end:
//! generates BGRA frames with real dirty regions (the first paint and every
//! resize are full-surface; steady-state paints touch only a moving band),
//! and periodically shows a popup overlay. A background thread flips an
//! atomic flag once per second to toggle the pattern's palette.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::debug;

use crate::compositor::{BYTES_PER_PIXEL, DirtyRect, PopupRect, SurfaceKind};

use super::{
    BrowserHost, BrowserId, EngineEvent, KeyEvent, MouseButtonKind, MouseEvent, PaintEvent,
    WheelEvent,
};

/// Band height of the steady-state partial repaint, in pixels.
const BAND_HEIGHT: u32 = 8;
/// Below this size everything repaints fully; no room for an interior band.
const MIN_PARTIAL_SIZE: u32 = 32;

struct DemoState {
    width: u32,
    height: u32,
    frame: u64,
    needs_full: bool,
    close_requested: bool,
    closed: bool,
    buffer: Vec<u8>,
}

impl DemoState {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.buffer = vec![0; (width * height * BYTES_PER_PIXEL) as usize];
        self.needs_full = true;
    }
}

/// The demo "engine": pumped once per event-loop turn for callbacks.
pub struct DemoSource {
    id: BrowserId,
    state: Rc<RefCell<DemoState>>,
    alternate: Arc<AtomicBool>,
    popup_shown: bool,
}

impl DemoSource {
    /// Create the source and start the 1 Hz palette-toggle thread.
    pub fn new(width: u32, height: u32) -> Self {
        let alternate = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&alternate);
        thread::spawn(move || {
            loop {
                thread::sleep(Duration::from_secs(1));
                flag.fetch_xor(true, Ordering::Relaxed);
            }
        });

        let mut state = DemoState {
            width: 0,
            height: 0,
            frame: 0,
            needs_full: true,
            close_requested: false,
            closed: false,
            buffer: Vec::new(),
        };
        state.resize(width, height);

        Self {
            id: BrowserId::new(1),
            state: Rc::new(RefCell::new(state)),
            alternate,
            popup_shown: false,
        }
    }

    pub fn id(&self) -> BrowserId {
        self.id
    }

    /// The browser-host handle to register for input delivery.
    pub fn browser(&self) -> DemoBrowser {
        DemoBrowser {
            id: self.id,
            state: Rc::clone(&self.state),
        }
    }

    #[cfg(test)]
    pub(crate) fn toggle_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.alternate)
    }

    /// Drain this turn's engine callbacks: paints, popup moves, close
    /// completion.
    pub fn pump(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        let mut state = self.state.borrow_mut();

        if state.closed {
            return events;
        }
        if state.close_requested {
            state.closed = true;
            events.push(EngineEvent::Closed(self.id));
            return events;
        }

        state.frame += 1;
        if state.frame == 1 {
            events.push(EngineEvent::TitleChanged("osrview demo".to_string()));
        }
        let alternate = self.alternate.load(Ordering::Relaxed);
        events.push(self.paint_view(&mut state, alternate));

        // Popup overlay follows the toggle: shown while alternate is set.
        if alternate != self.popup_shown {
            self.popup_shown = alternate;
            if alternate {
                let rect = popup_rect(state.width, state.height);
                events.push(EngineEvent::PopupRect(Some(rect)));
                events.push(paint_popup(rect));
            } else {
                events.push(EngineEvent::PopupRect(None));
            }
        }

        events
    }

    fn paint_view(&self, state: &mut DemoState, alternate: bool) -> EngineEvent {
        let (width, height) = (state.width, state.height);
        let full = state.needs_full
            || state.frame == 1
            || width < MIN_PARTIAL_SIZE
            || height < MIN_PARTIAL_SIZE;

        let dirty = if full {
            state.needs_full = false;
            fill_pattern(&mut state.buffer, width, height, 0, height, alternate);
            vec![DirtyRect::new(0, 0, width, height)]
        } else {
            // Moving band, strictly interior.
            let span = height - 2 - BAND_HEIGHT;
            let y = 1 + ((state.frame * 2) % u64::from(span)) as u32;
            fill_band(&mut state.buffer, width, y, BAND_HEIGHT, alternate);
            vec![DirtyRect::new(1, y, width - 2, BAND_HEIGHT)]
        };

        debug!("demo paint frame {} dirty {dirty:?}", state.frame);
        EngineEvent::Paint(PaintEvent {
            kind: SurfaceKind::View,
            dirty,
            buffer: state.buffer.clone(),
            width,
            height,
        })
    }
}

/// Input-receiving handle for one demo browser. Events are logged; the demo
/// has no DOM to react with.
pub struct DemoBrowser {
    id: BrowserId,
    state: Rc<RefCell<DemoState>>,
}

impl BrowserHost for DemoBrowser {
    fn id(&self) -> BrowserId {
        self.id
    }

    fn send_key_event(&mut self, event: KeyEvent) {
        debug!("demo browser key event: {event:?}");
    }

    fn send_mouse_move_event(&mut self, event: MouseEvent, leaving: bool) {
        debug!("demo browser mouse move: {event:?} leaving {leaving}");
    }

    fn send_mouse_click_event(
        &mut self,
        event: MouseEvent,
        button: MouseButtonKind,
        released: bool,
        click_count: u32,
    ) {
        debug!("demo browser click: {event:?} {button:?} released {released} count {click_count}");
    }

    fn send_mouse_wheel_event(&mut self, event: WheelEvent) {
        debug!("demo browser wheel: {event:?}");
    }

    fn was_resized(&mut self, width: u32, height: u32) {
        let mut state = self.state.borrow_mut();
        if state.width != width || state.height != height {
            state.resize(width, height);
        }
    }

    fn request_close(&mut self) {
        self.state.borrow_mut().close_requested = true;
    }
}

fn popup_rect(width: u32, height: u32) -> PopupRect {
    PopupRect::new(
        (width / 4) as i32,
        (height / 4) as i32,
        (width / 4).max(1),
        (height / 8).max(1),
    )
}

fn paint_popup(rect: PopupRect) -> EngineEvent {
    // Solid, opaque amber block.
    let mut buffer = Vec::with_capacity((rect.width * rect.height * BYTES_PER_PIXEL) as usize);
    for _ in 0..rect.width * rect.height {
        buffer.extend_from_slice(&[0x20, 0xa0, 0xe0, 0xff]);
    }
    EngineEvent::Paint(PaintEvent {
        kind: SurfaceKind::Popup,
        dirty: vec![DirtyRect::new(0, 0, rect.width, rect.height)],
        buffer,
        width: rect.width,
        height: rect.height,
    })
}

/// BGRA gradient rows `[y0, y1)`: blue tracks x, green tracks y, red flips
/// with the palette toggle.
fn fill_pattern(buffer: &mut [u8], width: u32, height: u32, y0: u32, y1: u32, alternate: bool) {
    let red = if alternate { 0xff } else { 0x30 };
    for y in y0..y1 {
        for x in 0..width {
            let idx = ((y * width + x) * BYTES_PER_PIXEL) as usize;
            buffer[idx] = (x * 255 / width.max(1)) as u8;
            buffer[idx + 1] = (y * 255 / height.max(1)) as u8;
            buffer[idx + 2] = red;
            buffer[idx + 3] = 0xff;
        }
    }
}

/// Inverted-palette stripe used for the steady-state partial repaint.
fn fill_band(buffer: &mut [u8], width: u32, y: u32, band_height: u32, alternate: bool) {
    let red = if alternate { 0x30 } else { 0xff };
    for row in y..y + band_height {
        for x in 1..width - 1 {
            let idx = ((row * width + x) * BYTES_PER_PIXEL) as usize;
            buffer[idx] = 0xff;
            buffer[idx + 1] = 0x80;
            buffer[idx + 2] = red;
            buffer[idx + 3] = 0xff;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    fn first_paint(events: &[EngineEvent]) -> &PaintEvent {
        for event in events {
            if let EngineEvent::Paint(paint) = event {
                return paint;
            }
        }
        panic!("no paint event in {events:?}");
    }

    #[test]
    fn first_pump_paints_full_surface() {
        let mut source = DemoSource::new(64, 64);
        let events = source.pump();
        let paint = first_paint(&events);
        assert_eq!(paint.kind, SurfaceKind::View);
        assert_eq!(paint.dirty, vec![DirtyRect::new(0, 0, 64, 64)]);
        assert_eq!(paint.buffer.len(), (64 * 64 * BYTES_PER_PIXEL) as usize);
    }

    #[test]
    fn steady_state_paints_interior_band() {
        let mut source = DemoSource::new(64, 64);
        source.pump();
        let events = source.pump();
        let paint = first_paint(&events);
        assert_eq!(paint.dirty.len(), 1);
        let rect = paint.dirty[0];
        assert!(!rect.covers(64, 64));
        assert!(rect.x + rect.width <= 64);
        assert!(rect.y + rect.height <= 64);
        assert!(rect.x > 0 && rect.y > 0);
    }

    #[test]
    fn resize_forces_full_paint_with_new_size() {
        let mut source = DemoSource::new(64, 64);
        source.pump();
        source.pump();
        source.browser().was_resized(128, 96);
        let events = source.pump();
        let paint = first_paint(&events);
        assert_eq!((paint.width, paint.height), (128, 96));
        assert_eq!(paint.dirty, vec![DirtyRect::new(0, 0, 128, 96)]);
    }

    #[test]
    fn close_request_emits_closed_once() {
        let mut source = DemoSource::new(64, 64);
        source.pump();
        source.browser().request_close();
        let events = source.pump();
        assert!(matches!(events.as_slice(), [EngineEvent::Closed(_)]));
        assert!(source.pump().is_empty());
    }

    #[test]
    fn popup_follows_palette_toggle() {
        let mut source = DemoSource::new(64, 64);
        source.pump();

        source.toggle_handle().store(true, Ordering::Relaxed);
        let events = source.pump();
        assert!(events.iter().any(|e| matches!(e, EngineEvent::PopupRect(Some(_)))));
        assert!(events.iter().any(|e| matches!(
            e,
            EngineEvent::Paint(PaintEvent { kind: SurfaceKind::Popup, .. })
        )));

        source.toggle_handle().store(false, Ordering::Relaxed);
        let events = source.pump();
        assert!(events.iter().any(|e| matches!(e, EngineEvent::PopupRect(None))));
    }
}
