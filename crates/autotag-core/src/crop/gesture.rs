//! Pointer-driven crop editing.
//!
//! The editor is a two-state machine. A pointer press on the crop overlay
//! (move) or on its bottom-right handle (resize) starts a [`DragSession`]
//! holding the press position and the crop at that moment. Every pointer move
//! is measured against that snapshot, never against the previous move, so the
//! result does not drift however many events arrive. Releasing the pointer
//! ends the session; the crop produced by the last move is already the
//! committed value.
//!
//! Screen deltas are divided by the rendered size of the image element, which
//! keeps the stored crop independent of zoom and layout.

use tracing::debug;

use super::area::{AspectRatio, CropArea, FULL_EXTENT, MIN_CROP_EXTENT};

/// Which part of the overlay the pointer grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Translate the whole crop, keeping its size.
    Move,
    /// Drag the bottom-right corner, keeping the top-left fixed.
    ResizeSe,
}

/// A position in screen (client) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The on-screen size of the rendered image element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedSize {
    pub width: f64,
    pub height: f64,
}

impl RenderedSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_measurable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Pointer travel in percent of the rendered image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragDelta {
    pub dx: f64,
    pub dy: f64,
}

/// Aspect ratio lock, expressed against the image's true pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioLock {
    pub natural_width: u32,
    pub natural_height: u32,
    pub ratio: AspectRatio,
}

/// Snapshot captured when a drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub mode: DragMode,
    pub origin: ScreenPoint,
    pub start_crop: CropArea,
}

/// `min(max(value, lo), hi)`: the upper bound wins when the bounds cross.
#[inline]
fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// Apply one drag step to the crop captured at drag start.
///
/// # Move
///
/// The origin shifts by the delta and is clamped so the crop stays inside
/// the image; the size never changes.
///
/// # ResizeSe
///
/// Width and height grow by the delta, each clamped between
/// [`MIN_CROP_EXTENT`] and the room left to the right/bottom edge. With a
/// ratio lock the width then drives the height; if that height would cross
/// the bottom edge, the height is pinned to the edge and drives the width
/// instead.
pub fn apply_drag(
    mode: DragMode,
    start: CropArea,
    delta: DragDelta,
    lock: Option<RatioLock>,
) -> CropArea {
    match mode {
        DragMode::Move => CropArea {
            x: clamp(start.x + delta.dx, 0.0, FULL_EXTENT - start.width),
            y: clamp(start.y + delta.dy, 0.0, FULL_EXTENT - start.height),
            ..start
        },
        DragMode::ResizeSe => {
            let mut width = clamp(start.width + delta.dx, MIN_CROP_EXTENT, FULL_EXTENT - start.x);
            let mut height = clamp(start.height + delta.dy, MIN_CROP_EXTENT, FULL_EXTENT - start.y);

            if let Some(lock) = lock {
                let img_w = lock.natural_width as f64;
                let img_h = lock.natural_height as f64;
                let ratio = lock.ratio.value();

                let derived_height = (width * img_w) / (img_h * ratio);
                if derived_height + start.y <= FULL_EXTENT {
                    height = derived_height;
                } else {
                    height = FULL_EXTENT - start.y;
                    width = (height * img_h * ratio) / img_w;
                }
            }

            CropArea {
                width,
                height,
                ..start
            }
        }
    }
}

/// Interactive crop editor for a single image.
///
/// One editor exists per open crop dialog. All mutation goes through
/// `&mut self`, so two gestures can never be active at once.
#[derive(Debug, Clone)]
pub struct CropEditor {
    crop: CropArea,
    aspect_ratio: Option<AspectRatio>,
    natural_size: Option<(u32, u32)>,
    session: Option<DragSession>,
}

impl CropEditor {
    /// Crop shown when the editor opens without one.
    pub const DEFAULT_CROP: CropArea = CropArea {
        x: 10.0,
        y: 10.0,
        width: 80.0,
        height: 80.0,
    };

    pub fn new(initial: Option<CropArea>, aspect_ratio: Option<AspectRatio>) -> Self {
        Self {
            crop: initial.unwrap_or(Self::DEFAULT_CROP),
            aspect_ratio,
            natural_size: None,
            session: None,
        }
    }

    /// Builder form of [`CropEditor::set_natural_size`].
    pub fn with_natural_size(mut self, width: u32, height: u32) -> Self {
        self.set_natural_size(width, height);
        self
    }

    /// Record the image's natural size once it is known.
    ///
    /// Until then the ratio lock is inactive and resizing is free-form.
    /// Zero dimensions are ignored.
    pub fn set_natural_size(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.natural_size = Some((width, height));
        }
    }

    pub fn crop(&self) -> CropArea {
        self.crop
    }

    pub fn aspect_ratio(&self) -> Option<AspectRatio> {
        self.aspect_ratio
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn drag_mode(&self) -> Option<DragMode> {
        self.session.map(|s| s.mode)
    }

    fn ratio_lock(&self) -> Option<RatioLock> {
        let ratio = self.aspect_ratio?;
        let (natural_width, natural_height) = self.natural_size?;
        Some(RatioLock {
            natural_width,
            natural_height,
            ratio,
        })
    }

    /// Start a gesture. A press while already dragging replaces the session.
    pub fn pointer_down(&mut self, mode: DragMode, position: ScreenPoint) {
        if self.session.is_some() {
            debug!("pointer pressed during an active drag, restarting session");
        }
        self.session = Some(DragSession {
            mode,
            origin: position,
            start_crop: self.crop,
        });
        debug!(?mode, "crop drag started");
    }

    /// Feed a pointer move. Returns `true` when the crop changed.
    ///
    /// Ignored while idle, when the rendered size cannot be measured, or when
    /// the step would produce a non-finite crop.
    pub fn pointer_move(&mut self, position: ScreenPoint, rendered: RenderedSize) -> bool {
        let Some(session) = self.session else {
            return false;
        };
        if !rendered.is_measurable() {
            return false;
        }

        let delta = DragDelta {
            dx: ((position.x - session.origin.x) / rendered.width) * FULL_EXTENT,
            dy: ((position.y - session.origin.y) / rendered.height) * FULL_EXTENT,
        };
        // Clamping would quietly absorb NaN/inf, so reject them up front
        if !delta.dx.is_finite() || !delta.dy.is_finite() {
            return false;
        }

        let next = apply_drag(session.mode, session.start_crop, delta, self.ratio_lock());
        if !next.is_finite() {
            return false;
        }

        let changed = next != self.crop;
        self.crop = next;
        changed
    }

    /// End the gesture, wherever the pointer is.
    pub fn pointer_up(&mut self) {
        if self.session.take().is_some() {
            debug!(crop = ?self.crop, "crop drag finished");
        }
    }

    /// Close the editor and hand back the edited crop.
    pub fn finish(self) -> CropArea {
        self.crop
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
