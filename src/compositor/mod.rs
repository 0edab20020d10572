//! Paint compositor: dirty-region texture synchronization
//!
//! The engine paints off-screen and reports a BGRA buffer plus a list of
//! changed rectangles. This module decides, per paint callback, how the GPU
//! texture must be brought in sync: a full re-specification (size changed,
//! or a single dirty rect covering the whole surface) or one sub-upload per
//! dirty rectangle. Popup overlay paints are clipped against the view
//! bounds and written into the same texture.
//!
//! Planning is pure and separate from execution: [`SurfaceState`] computes
//! an [`UploadPlan`] that [`gpu::ViewTexture`] replays against the wgpu
//! queue. Tests exercise the plans directly on CPU pixel grids.

pub mod gpu;
pub mod render;

pub use gpu::{GpuContext, ViewTexture};
pub use render::Renderer;

use log::{debug, warn};

/// Bytes per BGRA pixel.
pub const BYTES_PER_PIXEL: u32 = 4;

/// Axis-aligned rectangle describing a changed sub-region of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DirtyRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when this rect is exactly the full surface.
    pub fn covers(&self, width: u32, height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width == width && self.height == height
    }
}

/// Overlay rectangle reported by the engine for a popup (dropdown) surface.
/// The origin may be negative when the popup opens past the view edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PopupRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Discriminator between the primary view and the popup overlay surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    View,
    Popup,
}

/// One texture sub-upload: copy `width x height` pixels out of the source
/// buffer (starting at `buffer_offset`, rows `bytes_per_row` apart) into the
/// texture at (`dest_x`, `dest_y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOp {
    pub dest_x: u32,
    pub dest_y: u32,
    pub width: u32,
    pub height: u32,
    pub buffer_offset: u64,
    pub bytes_per_row: u32,
}

/// How the texture must be synchronized for one paint callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPlan {
    /// Re-specify the whole texture from the start of the buffer.
    Full { width: u32, height: u32 },
    /// Upload only the listed sub-regions; the texture keeps its size.
    Partial(Vec<UploadOp>),
    /// Nothing to do (no popup recorded, or everything clipped away).
    Skip,
}

/// Logical render target for the embedded browser: last reported surface
/// size, transparency, popup overlay state, and the most recent update
/// rectangle for the debug outline.
pub struct SurfaceState {
    width: u32,
    height: u32,
    transparent: bool,
    popup: Option<PopupRect>,
    last_update: Option<DirtyRect>,
    show_update_rect: bool,
}

impl SurfaceState {
    /// `transparent` derives from the configured background color's alpha
    /// channel being zero.
    pub fn new(transparent: bool, show_update_rect: bool) -> Self {
        Self {
            width: 0,
            height: 0,
            transparent,
            popup: None,
            last_update: None,
            show_update_rect,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn show_update_rect(&self) -> bool {
        self.show_update_rect
    }

    /// Most recent dirty rectangle, recorded for the debug outline.
    pub fn last_update_rect(&self) -> Option<DirtyRect> {
        self.last_update
    }

    /// Replace the popup overlay rectangle wholesale; `None` clears it.
    pub fn set_popup_rect(&mut self, rect: Option<PopupRect>) {
        debug!("popup rect -> {rect:?}");
        self.popup = rect;
    }

    pub fn popup_rect(&self) -> Option<PopupRect> {
        self.popup
    }

    /// Compute the upload plan for one paint callback.
    ///
    /// `width`/`height` are the dimensions of the incoming buffer: the full
    /// surface size for view paints, the popup size for popup paints.
    pub fn plan_upload(
        &mut self,
        kind: SurfaceKind,
        dirty: &[DirtyRect],
        width: u32,
        height: u32,
    ) -> UploadPlan {
        match kind {
            SurfaceKind::View => self.plan_view(dirty, width, height),
            SurfaceKind::Popup => self.plan_popup(width, height),
        }
    }

    fn plan_view(&mut self, dirty: &[DirtyRect], width: u32, height: u32) -> UploadPlan {
        let resized = width != self.width || height != self.height;
        self.width = width;
        self.height = height;

        if self.show_update_rect {
            if let Some(first) = dirty.first() {
                self.last_update = Some(*first);
            }
        }

        if resized || (dirty.len() == 1 && dirty[0].covers(width, height)) {
            debug!("view paint {width}x{height}: full upload (resized: {resized})");
            return UploadPlan::Full { width, height };
        }

        let mut ops = Vec::with_capacity(dirty.len());
        for rect in dirty {
            // Upstream contract: dirty rects lie within the surface. Clamp
            // and warn instead of passing bad bounds to the GPU.
            let mut r = *rect;
            if r.x >= width || r.y >= height {
                warn!("dirty rect {rect:?} outside {width}x{height} surface, dropped");
                continue;
            }
            if r.x + r.width > width || r.y + r.height > height {
                warn!("dirty rect {rect:?} exceeds {width}x{height} surface, clamped");
                r.width = r.width.min(width - r.x);
                r.height = r.height.min(height - r.y);
            }
            if r.is_empty() {
                continue;
            }
            ops.push(UploadOp {
                dest_x: r.x,
                dest_y: r.y,
                width: r.width,
                height: r.height,
                buffer_offset: u64::from(r.y) * u64::from(width) * u64::from(BYTES_PER_PIXEL)
                    + u64::from(r.x) * u64::from(BYTES_PER_PIXEL),
                bytes_per_row: width * BYTES_PER_PIXEL,
            });
        }
        debug!("view paint {width}x{height}: {} sub-uploads", ops.len());
        UploadPlan::Partial(ops)
    }

    /// Clip the popup buffer against the view bounds. A negative origin
    /// becomes a source skip with the destination clamped to zero; edges
    /// hanging past the view shrink the upload. Final width/height clamp to
    /// zero, never underflow.
    fn plan_popup(&mut self, width: u32, height: u32) -> UploadPlan {
        let Some(popup) = self.popup else {
            return UploadPlan::Skip;
        };
        if popup.is_empty() {
            return UploadPlan::Skip;
        }

        let (skip_x, dest_x) = if popup.x < 0 {
            (popup.x.unsigned_abs(), 0)
        } else {
            (0, popup.x as u32)
        };
        let (skip_y, dest_y) = if popup.y < 0 {
            (popup.y.unsigned_abs(), 0)
        } else {
            (0, popup.y as u32)
        };

        // Never read past the source buffer or write past the view.
        let w = (width.saturating_sub(skip_x)).min(self.width.saturating_sub(dest_x));
        let h = (height.saturating_sub(skip_y)).min(self.height.saturating_sub(dest_y));
        if w == 0 || h == 0 {
            debug!("popup paint fully clipped ({popup:?} in {}x{})", self.width, self.height);
            return UploadPlan::Skip;
        }

        UploadPlan::Partial(vec![UploadOp {
            dest_x,
            dest_y,
            width: w,
            height: h,
            buffer_offset: u64::from(skip_y) * u64::from(width) * u64::from(BYTES_PER_PIXEL)
                + u64::from(skip_x) * u64::from(BYTES_PER_PIXEL),
            bytes_per_row: width * BYTES_PER_PIXEL,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Replay a plan against a CPU pixel grid, the way the GPU executor
    /// replays it against the texture.
    struct CpuTexture {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    }

    impl CpuTexture {
        fn new() -> Self {
            Self {
                width: 0,
                height: 0,
                pixels: Vec::new(),
            }
        }

        fn apply(&mut self, plan: &UploadPlan, buffer: &[u8]) {
            match plan {
                UploadPlan::Full { width, height } => {
                    self.width = *width;
                    self.height = *height;
                    self.pixels = buffer[..(*width * *height * BYTES_PER_PIXEL) as usize].to_vec();
                }
                UploadPlan::Partial(ops) => {
                    for op in ops {
                        for row in 0..op.height {
                            let src = op.buffer_offset as usize
                                + (row * op.bytes_per_row) as usize;
                            let dst = (((op.dest_y + row) * self.width + op.dest_x)
                                * BYTES_PER_PIXEL) as usize;
                            let len = (op.width * BYTES_PER_PIXEL) as usize;
                            self.pixels[dst..dst + len]
                                .copy_from_slice(&buffer[src..src + len]);
                        }
                    }
                }
                UploadPlan::Skip => {}
            }
        }
    }

    fn solid_buffer(width: u32, height: u32, value: u8) -> Vec<u8> {
        vec![value; (width * height * BYTES_PER_PIXEL) as usize]
    }

    #[test]
    fn first_paint_is_full_upload() {
        let mut state = SurfaceState::new(false, false);
        let plan = state.plan_upload(
            SurfaceKind::View,
            &[DirtyRect::new(10, 10, 5, 5)],
            64,
            48,
        );
        assert_eq!(plan, UploadPlan::Full { width: 64, height: 48 });
        assert_eq!(state.size(), (64, 48));
    }

    #[test]
    fn full_surface_dirty_rect_is_full_upload() {
        let mut state = SurfaceState::new(false, false);
        state.plan_upload(SurfaceKind::View, &[], 64, 48);
        let plan = state.plan_upload(SurfaceKind::View, &[DirtyRect::new(0, 0, 64, 48)], 64, 48);
        assert_eq!(plan, UploadPlan::Full { width: 64, height: 48 });
    }

    #[test]
    fn interior_rects_become_sub_uploads() {
        let mut state = SurfaceState::new(false, false);
        state.plan_upload(SurfaceKind::View, &[], 64, 48);
        let plan = state.plan_upload(
            SurfaceKind::View,
            &[DirtyRect::new(4, 8, 16, 2), DirtyRect::new(0, 0, 1, 1)],
            64,
            48,
        );
        assert_eq!(
            plan,
            UploadPlan::Partial(vec![
                UploadOp {
                    dest_x: 4,
                    dest_y: 8,
                    width: 16,
                    height: 2,
                    buffer_offset: (8 * 64 + 4) * 4,
                    bytes_per_row: 64 * 4,
                },
                UploadOp {
                    dest_x: 0,
                    dest_y: 0,
                    width: 1,
                    height: 1,
                    buffer_offset: 0,
                    bytes_per_row: 64 * 4,
                },
            ])
        );
    }

    #[test]
    fn untouched_pixels_survive_partial_upload() {
        let mut state = SurfaceState::new(false, false);
        let mut tex = CpuTexture::new();

        let base = solid_buffer(8, 8, 0x11);
        let plan = state.plan_upload(SurfaceKind::View, &[DirtyRect::new(0, 0, 8, 8)], 8, 8);
        tex.apply(&plan, &base);

        // Same size, one interior rect: only its pixels may change.
        let updated = solid_buffer(8, 8, 0x22);
        let plan = state.plan_upload(SurfaceKind::View, &[DirtyRect::new(2, 3, 4, 2)], 8, 8);
        assert!(matches!(plan, UploadPlan::Partial(_)));
        tex.apply(&plan, &updated);

        for y in 0..8u32 {
            for x in 0..8u32 {
                let idx = ((y * 8 + x) * BYTES_PER_PIXEL) as usize;
                let inside = (2..6).contains(&x) && (3..5).contains(&y);
                let expected = if inside { 0x22 } else { 0x11 };
                assert_eq!(tex.pixels[idx], expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn full_upload_replaces_entire_texture() {
        let mut state = SurfaceState::new(false, false);
        let mut tex = CpuTexture::new();

        tex.apply(
            &state.plan_upload(SurfaceKind::View, &[], 4, 4),
            &solid_buffer(4, 4, 0x11),
        );
        let buffer = solid_buffer(4, 4, 0x7f);
        let plan = state.plan_upload(SurfaceKind::View, &[DirtyRect::new(0, 0, 4, 4)], 4, 4);
        tex.apply(&plan, &buffer);
        assert_eq!(tex.pixels, buffer);
    }

    #[test]
    fn size_change_forces_full_upload_and_records_new_size() {
        let mut state = SurfaceState::new(false, false);
        state.plan_upload(SurfaceKind::View, &[], 64, 48);
        let plan = state.plan_upload(SurfaceKind::View, &[DirtyRect::new(0, 0, 1, 1)], 32, 24);
        assert_eq!(plan, UploadPlan::Full { width: 32, height: 24 });
        assert_eq!(state.size(), (32, 24));
    }

    #[test]
    fn out_of_range_dirty_rects_are_clamped_or_dropped() {
        let mut state = SurfaceState::new(false, false);
        state.plan_upload(SurfaceKind::View, &[], 16, 16);
        let plan = state.plan_upload(
            SurfaceKind::View,
            &[
                DirtyRect::new(12, 12, 10, 10), // overhangs: clamp to 4x4
                DirtyRect::new(20, 0, 4, 4),    // fully outside: drop
            ],
            16,
            16,
        );
        assert_eq!(
            plan,
            UploadPlan::Partial(vec![UploadOp {
                dest_x: 12,
                dest_y: 12,
                width: 4,
                height: 4,
                buffer_offset: (12 * 16 + 12) * 4,
                bytes_per_row: 16 * 4,
            }])
        );
    }

    #[test]
    fn popup_without_recorded_rect_is_skipped() {
        let mut state = SurfaceState::new(false, false);
        state.plan_upload(SurfaceKind::View, &[], 800, 600);
        let plan = state.plan_upload(SurfaceKind::Popup, &[], 100, 50);
        assert_eq!(plan, UploadPlan::Skip);
    }

    #[test]
    fn popup_clipping_matches_contract_example() {
        // View 800x600, popup at (-10, 590) sized 100x50: skip 10 source
        // pixels horizontally, clamp x to 0, shrink height to 10.
        let mut state = SurfaceState::new(false, false);
        state.plan_upload(SurfaceKind::View, &[], 800, 600);
        state.set_popup_rect(Some(PopupRect::new(-10, 590, 100, 50)));
        let plan = state.plan_upload(SurfaceKind::Popup, &[], 100, 50);
        assert_eq!(
            plan,
            UploadPlan::Partial(vec![UploadOp {
                dest_x: 0,
                dest_y: 590,
                width: 90,
                height: 10,
                buffer_offset: 10 * 4,
                bytes_per_row: 100 * 4,
            }])
        );
    }

    #[test]
    fn fully_off_view_popup_clamps_to_zero() {
        let mut state = SurfaceState::new(false, false);
        state.plan_upload(SurfaceKind::View, &[], 100, 100);
        state.set_popup_rect(Some(PopupRect::new(-200, 0, 50, 50)));
        assert_eq!(state.plan_upload(SurfaceKind::Popup, &[], 50, 50), UploadPlan::Skip);

        state.set_popup_rect(Some(PopupRect::new(120, 0, 50, 50)));
        assert_eq!(state.plan_upload(SurfaceKind::Popup, &[], 50, 50), UploadPlan::Skip);
    }

    #[test]
    fn clearing_popup_rect_skips_popup_paints() {
        let mut state = SurfaceState::new(false, false);
        state.plan_upload(SurfaceKind::View, &[], 100, 100);
        state.set_popup_rect(Some(PopupRect::new(10, 10, 20, 20)));
        assert!(matches!(
            state.plan_upload(SurfaceKind::Popup, &[], 20, 20),
            UploadPlan::Partial(_)
        ));
        state.set_popup_rect(None);
        assert_eq!(state.plan_upload(SurfaceKind::Popup, &[], 20, 20), UploadPlan::Skip);
    }

    #[test]
    fn update_rect_recorded_only_when_enabled() {
        let mut state = SurfaceState::new(false, true);
        state.plan_upload(SurfaceKind::View, &[DirtyRect::new(0, 0, 16, 16)], 16, 16);
        assert_eq!(state.last_update_rect(), Some(DirtyRect::new(0, 0, 16, 16)));

        let mut silent = SurfaceState::new(false, false);
        silent.plan_upload(SurfaceKind::View, &[DirtyRect::new(0, 0, 16, 16)], 16, 16);
        assert_eq!(silent.last_update_rect(), None);
    }
}
