//! Placement of the floating surface that shows captured icons below the bar.

use crate::platform::{DisplayProvider, OverlaySurface};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stowbar_types::{primary_display, DisplayInfo, Rect};
use tokio::sync::watch;
use tracing::debug;

/// Width reserved per icon.
pub const ITEM_WIDTH: f64 = 30.0;
/// Horizontal padding on each side.
pub const PADDING: f64 = 8.0;
/// Surface height.
pub const HEIGHT: f64 = 32.0;
/// Space between the bottom of the menu bar and the surface.
pub const GAP: f64 = 4.0;
pub const FADE_DURATION: Duration = Duration::from_millis(150);

/// Visibility after a toggle.
pub fn next_visibility(current: bool) -> bool {
    !current
}

/// Frame for `item_count` icons with the left edge at `anchor_x`, kept
/// inside `display` and just below its menu bar. UI space.
pub fn overlay_frame(item_count: usize, anchor_x: f64, display: &DisplayInfo) -> Rect {
    let width = item_count as f64 * ITEM_WIDTH + 2.0 * PADDING;
    let bounds = display.frame;
    let x = anchor_x.min(bounds.max_x() - width).max(bounds.min_x());
    let y = display.menu_bar_frame().min_y() - GAP - HEIGHT;
    Rect::new(x, y, width, HEIGHT)
}

/// Shows and hides the overlay surface.
pub struct OverlayPositioner {
    surface: Arc<dyn OverlaySurface>,
    displays: Arc<dyn DisplayProvider>,
    frame: Mutex<Option<Rect>>,
    visible: watch::Sender<bool>,
}

impl OverlayPositioner {
    pub fn new(surface: Arc<dyn OverlaySurface>, displays: Arc<dyn DisplayProvider>) -> Self {
        let (visible, _) = watch::channel(false);
        Self {
            surface,
            displays,
            frame: Mutex::new(None),
            visible,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.visible.subscribe()
    }

    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }

    /// Last frame the surface was placed at.
    pub fn frame(&self) -> Option<Rect> {
        *self.frame.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn display_for(&self, anchor_x: f64) -> Option<DisplayInfo> {
        let displays = self.displays.displays();
        displays
            .iter()
            .find(|d| anchor_x >= d.frame.min_x() && anchor_x < d.frame.max_x())
            .or_else(|| primary_display(&displays))
            .cloned()
    }

    /// Place the surface for `item_count` icons at `anchor_x` and fade it in.
    /// Returns the frame used, or `None` when no display is connected.
    pub fn show(&self, item_count: usize, anchor_x: f64) -> Option<Rect> {
        let display = self.display_for(anchor_x)?;
        let frame = overlay_frame(item_count, anchor_x, &display);
        *self.frame.lock().unwrap_or_else(|e| e.into_inner()) = Some(frame);

        self.surface.set_frame(frame);
        self.surface.fade_in(FADE_DURATION);
        self.visible.send_replace(true);
        debug!("Overlay shown at ({}, {}) width {}", frame.min_x(), frame.min_y(), frame.width());
        Some(frame)
    }

    /// Fade the surface out. No-op if hidden.
    pub fn hide(&self) {
        if !self.is_visible() {
            return;
        }
        self.surface.fade_out(FADE_DURATION);
        self.visible.send_replace(false);
        debug!("Overlay hidden");
    }

    /// Show if hidden, hide if shown. Returns the new visibility.
    pub fn toggle(&self, item_count: usize, anchor_x: f64) -> bool {
        if next_visibility(self.is_visible()) {
            self.show(item_count, anchor_x).is_some()
        } else {
            self.hide();
            false
        }
    }
}
