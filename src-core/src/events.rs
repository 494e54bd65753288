//! Click forwarding to hidden icons.
//!
//! Hidden icons still exist at their real (off-screen) coordinates, so a
//! synthetic click there activates them without revealing the section. The
//! user's pointer is put back where it was afterwards.

use crate::capture::CapturedIcon;
use crate::error::EventError;
use crate::permissions::PermissionGate;
use crate::platform::{DisplayProvider, InputSynthesizer, MouseButton, MousePhase};
use std::sync::Arc;
use stowbar_types::{primary_display, CoordinateSpace, DisplayInfo, PermissionType, Point};
use tracing::{debug, warn};

/// Whether a synthetic click at `point` (UI space) can reach anything.
///
/// Valid points lie on a display, or in the primary display's menu bar band
/// at any horizontal offset so icons pushed off-screen stay addressable. The
/// band's top edge is inclusive, as for the hover trigger strip.
pub fn is_valid_click_point(point: Point, displays: &[DisplayInfo]) -> bool {
    if !point.is_finite() {
        return false;
    }
    if displays.iter().any(|d| d.frame.contains(point)) {
        return true;
    }
    primary_display(displays).is_some_and(|primary| {
        let bar = primary.menu_bar_frame();
        point.y >= bar.min_y() && point.y <= bar.max_y()
    })
}

/// Moves the pointer back to where it was when dropped.
struct PointerRestoreGuard<'a> {
    input: &'a dyn InputSynthesizer,
    saved: Option<Point>,
}

impl<'a> PointerRestoreGuard<'a> {
    fn save(input: &'a dyn InputSynthesizer) -> Self {
        Self {
            input,
            saved: input.pointer_location(),
        }
    }
}

impl Drop for PointerRestoreGuard<'_> {
    fn drop(&mut self) {
        let Some(saved) = self.saved else {
            return;
        };
        if let Err(e) = self.input.warp_pointer(saved) {
            warn!("Failed to restore pointer position: {}", e);
        }
    }
}

/// Posts synthetic clicks at icon coordinates.
pub struct EventForwarder {
    permissions: Arc<PermissionGate>,
    input: Arc<dyn InputSynthesizer>,
    displays: Arc<dyn DisplayProvider>,
}

impl EventForwarder {
    pub fn new(
        permissions: Arc<PermissionGate>,
        input: Arc<dyn InputSynthesizer>,
        displays: Arc<dyn DisplayProvider>,
    ) -> Self {
        Self {
            permissions,
            input,
            displays,
        }
    }

    /// Left-click at `at` (UI space).
    pub fn simulate_click(&self, at: Point) -> Result<(), EventError> {
        self.simulate_click_with(at, MouseButton::Left)
    }

    /// Click at `at` (UI space) with `button`.
    pub fn simulate_click_with(&self, at: Point, button: MouseButton) -> Result<(), EventError> {
        if !self.permissions.is_granted(PermissionType::Accessibility) {
            return Err(EventError::AccessibilityNotGranted);
        }

        let displays = self.displays.displays();
        if !is_valid_click_point(at, &displays) {
            return Err(EventError::InvalidCoordinates(at));
        }
        let primary = primary_display(&displays).ok_or(EventError::InvalidCoordinates(at))?;
        let target = CoordinateSpace::new(primary.frame.height()).to_screen_point(at);

        let _restore = PointerRestoreGuard::save(self.input.as_ref());
        debug!("Forwarding {:?} click to ({}, {})", button, target.x, target.y);
        self.input.post_mouse_event(button, MousePhase::Down, target)?;
        self.input.post_mouse_event(button, MousePhase::Up, target)?;
        Ok(())
    }

    /// Click the real icon behind a captured snapshot.
    pub fn click_icon(&self, icon: &CapturedIcon, button: MouseButton) -> Result<(), EventError> {
        self.simulate_click_with(icon.click_point(), button)
    }
}
