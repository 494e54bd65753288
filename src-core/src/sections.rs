//! Hidden section state machine.
//!
//! Owns the two control items that implement hiding: the toggle (the chevron
//! the user clicks) and the separator (a slot whose length is either huge,
//! pushing everything beyond it off-screen, or small, revealing it).
//!
//! ```text
//!  LTR:  [app menus] [hidden icons] [separator] [visible icons] [toggle] [system]
//! ```
//!
//! Transitions touch the control items and so must run on the UI sequence.
//! Timers post back to it through the [`UiExecutor`], re-enter through a weak
//! reference and check their generation under the state lock.

use crate::config::SectionsConfig;
use crate::error::PlacementError;
use crate::platform::{
    ControlItemId, ControlItemRequest, ControlItemRole, DisplayProvider, MenuBarHost, UiExecutor,
};
use crate::store::SettingsStore;
use crate::timer::{TimerHandle, TimerScheduler};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use stowbar_types::{display_containing, primary_display, LayoutDirection, Rect};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Separator length while collapsed. Wide enough to push every hidden icon
/// past the edge of the largest display.
pub const COLLAPSED_WIDTH: f64 = 10_000.0;

/// Separator length while expanded.
pub const EXPANDED_WIDTH: f64 = 20.0;

/// Length of the toggle item.
pub const TOGGLE_LENGTH: f64 = 24.0;

/// Version of the control item placement scheme.
///
/// Bump whenever creation order or autosave naming changes. Positions saved
/// under an older version are discarded at startup instead of being restored,
/// since they may encode a toggle placed where the separator swallows it.
pub const PLACEMENT_VERSION: u32 = 2;

const AUTOSAVE_PREFIX: &str = "stowbar";

/// Store key prefixes under which the OS remembers status item placement.
const PLACEMENT_KEY_PREFIXES: [&str; 2] = ["NSStatusItem Preferred Position ", "NSStatusItem Visible "];

/// Autosave name of a control item for the current placement version.
pub fn autosave_name(role: ControlItemRole) -> String {
    format!("{}_{}_v{}", AUTOSAVE_PREFIX, role.as_str(), PLACEMENT_VERSION)
}

/// Whether `key` holds a saved placement of ours from another placement version.
fn is_stale_placement_key(key: &str) -> bool {
    let Some(name) = PLACEMENT_KEY_PREFIXES
        .iter()
        .find_map(|prefix| key.strip_prefix(prefix))
    else {
        return false;
    };
    if !name.starts_with(AUTOSAVE_PREFIX) {
        return false;
    }
    name != autosave_name(ControlItemRole::Toggle) && name != autosave_name(ControlItemRole::Separator)
}

/// Action the toggle performs when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Expand,
    Collapse,
}

/// Glyph for the toggle, pointing toward where the hidden icons will appear
/// (expand) or away from them (collapse).
pub fn toggle_glyph(action: ToggleAction, direction: LayoutDirection) -> &'static str {
    match (action, direction) {
        (ToggleAction::Expand, LayoutDirection::LeftToRight) => "chevron.left",
        (ToggleAction::Collapse, LayoutDirection::LeftToRight) => "chevron.right",
        (ToggleAction::Expand, LayoutDirection::RightToLeft) => "chevron.right",
        (ToggleAction::Collapse, LayoutDirection::RightToLeft) => "chevron.left",
    }
}

/// Visibility state of the hidden section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionState {
    #[default]
    Collapsed,
    Expanding,
    Expanded,
    Collapsing,
}

/// Published after every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SectionSnapshot {
    pub state: SectionState,
    pub is_collapsed: bool,
    /// A toggle was accepted recently; further toggles are ignored until it clears
    pub is_toggling: bool,
    pub is_initialized: bool,
}

#[derive(Debug, Default)]
struct Inner {
    state: SectionState,
    toggle_item: Option<ControlItemId>,
    separator_item: Option<ControlItemId>,
    toggling: bool,
    auto_collapse_enabled: bool,
    auto_collapse_delay: Duration,
    auto_collapse: Option<TimerHandle>,
    debounce: Option<TimerHandle>,
    /// Bumped on every completed expand or collapse
    revision: u64,
}

impl Inner {
    fn snapshot(&self) -> SectionSnapshot {
        SectionSnapshot {
            state: self.state,
            is_collapsed: self.state == SectionState::Collapsed,
            is_toggling: self.toggling,
            is_initialized: self.separator_item.is_some(),
        }
    }
}

/// Owns the collapsed/expanded state and the toggle/separator control items.
pub struct SectionStateMachine {
    weak_self: Weak<SectionStateMachine>,
    host: Arc<dyn MenuBarHost>,
    store: Arc<dyn SettingsStore>,
    displays: Arc<dyn DisplayProvider>,
    direction: LayoutDirection,
    toggle_debounce: Duration,
    auto_collapse_timer: TimerScheduler,
    debounce_timer: TimerScheduler,
    inner: Mutex<Inner>,
    changes: watch::Sender<SectionSnapshot>,
}

impl SectionStateMachine {
    /// Build the state machine. Timers use the tokio runtime current at this
    /// call and fire on `ui`; without a runtime, auto-collapse is disabled and
    /// toggles are not debounced.
    pub fn new(
        host: Arc<dyn MenuBarHost>,
        store: Arc<dyn SettingsStore>,
        displays: Arc<dyn DisplayProvider>,
        config: &SectionsConfig,
        ui: Arc<dyn UiExecutor>,
    ) -> Arc<Self> {
        let (changes, _rx) = watch::channel(SectionSnapshot {
            is_collapsed: true,
            ..SectionSnapshot::default()
        });

        Arc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            host,
            store,
            displays,
            direction: config.direction,
            toggle_debounce: config.toggle_debounce(),
            auto_collapse_timer: TimerScheduler::from_current("auto-collapse", ui.clone()),
            debounce_timer: TimerScheduler::from_current("toggle debounce", ui),
            inner: Mutex::new(Inner {
                auto_collapse_enabled: config.auto_collapse_enabled,
                auto_collapse_delay: config.auto_collapse_delay(),
                ..Inner::default()
            }),
            changes,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, inner: &Inner) {
        let snapshot = inner.snapshot();
        self.changes.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SectionSnapshot> {
        self.changes.subscribe()
    }

    pub fn snapshot(&self) -> SectionSnapshot {
        self.lock().snapshot()
    }

    pub fn state(&self) -> SectionState {
        self.lock().state
    }

    pub fn is_collapsed(&self) -> bool {
        self.state() == SectionState::Collapsed
    }

    pub fn is_toggling(&self) -> bool {
        self.lock().toggling
    }

    pub fn direction(&self) -> LayoutDirection {
        self.direction
    }

    /// Changes whenever the section finishes expanding or collapsing.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Create the control items and start collapsed. Calling it again is a no-op.
    pub fn initialize(&self) -> Result<(), PlacementError> {
        let mut inner = self.lock();
        if inner.separator_item.is_some() {
            return Ok(());
        }

        self.discard_stale_placements();

        // The toggle must exist before the separator. The bar places newer
        // items further from its anchor, which leaves the separator between the
        // hidden icons and the toggle; the other order puts the toggle inside
        // the span the collapsed separator pushes off-screen.
        let toggle = self.host.create_item(&ControlItemRequest {
            role: ControlItemRole::Toggle,
            autosave_name: autosave_name(ControlItemRole::Toggle),
            length: TOGGLE_LENGTH,
        })?;
        let separator = match self.host.create_item(&ControlItemRequest {
            role: ControlItemRole::Separator,
            autosave_name: autosave_name(ControlItemRole::Separator),
            length: COLLAPSED_WIDTH,
        }) {
            Ok(id) => id,
            Err(e) => {
                self.host.remove_item(toggle);
                return Err(e);
            }
        };

        inner.toggle_item = Some(toggle);
        inner.separator_item = Some(separator);
        inner.state = SectionState::Collapsed;
        self.apply_glyph(&inner);
        self.publish(&inner);
        info!("Control items created (toggle {}, separator {})", toggle, separator);
        Ok(())
    }

    fn discard_stale_placements(&self) {
        for key in self.store.keys() {
            if is_stale_placement_key(&key) {
                info!("Discarding stale control item placement {:?}", key);
                if let Err(e) = self.store.remove(&key) {
                    warn!("Failed to discard {:?}: {}", key, e);
                }
            }
        }
    }

    /// Flip between collapsed and expanded.
    ///
    /// Returns `false` when ignored because an earlier toggle is still within
    /// its debounce window or a transition is in progress.
    pub fn toggle(&self) -> bool {
        let mut inner = self.lock();
        if inner.toggling || inner.separator_item.is_none() {
            debug!("Toggle ignored (toggling={})", inner.toggling);
            return false;
        }

        match inner.state {
            SectionState::Collapsed => self.expand_locked(&mut inner),
            SectionState::Expanded => self.collapse_locked(&mut inner),
            SectionState::Expanding | SectionState::Collapsing => return false,
        }

        self.arm_debounce(&mut inner);
        self.publish(&inner);
        true
    }

    /// Reveal the hidden section. No-op if already expanded.
    pub fn expand(&self) {
        let mut inner = self.lock();
        self.expand_locked(&mut inner);
        self.publish(&inner);
    }

    /// Hide the hidden section. No-op if already collapsed.
    pub fn collapse(&self) {
        let mut inner = self.lock();
        self.collapse_locked(&mut inner);
        self.publish(&inner);
    }

    fn expand_locked(&self, inner: &mut Inner) {
        let Some(separator) = inner.separator_item else {
            return;
        };
        if inner.state != SectionState::Collapsed {
            return;
        }

        inner.state = SectionState::Expanding;
        if let Err(e) = self.host.set_length(separator, EXPANDED_WIDTH) {
            warn!("Failed to expand separator: {}", e);
            inner.state = SectionState::Collapsed;
            return;
        }
        inner.state = SectionState::Expanded;
        inner.revision += 1;
        self.apply_glyph(inner);
        self.arm_auto_collapse(inner);
        debug!("Expanded");
    }

    fn collapse_locked(&self, inner: &mut Inner) {
        let Some(separator) = inner.separator_item else {
            return;
        };
        if inner.state != SectionState::Expanded {
            return;
        }

        inner.state = SectionState::Collapsing;
        self.cancel_auto_collapse(inner);
        if let Err(e) = self.host.set_length(separator, COLLAPSED_WIDTH) {
            warn!("Failed to collapse separator: {}", e);
            inner.state = SectionState::Expanded;
            self.arm_auto_collapse(inner);
            return;
        }
        inner.state = SectionState::Collapsed;
        inner.revision += 1;
        self.apply_glyph(inner);
        debug!("Collapsed");
    }

    fn apply_glyph(&self, inner: &Inner) {
        let Some(toggle) = inner.toggle_item else {
            return;
        };
        let action = if inner.state == SectionState::Expanded {
            ToggleAction::Collapse
        } else {
            ToggleAction::Expand
        };
        if let Err(e) = self.host.set_glyph(toggle, toggle_glyph(action, self.direction)) {
            warn!("Failed to update toggle glyph: {}", e);
        }
    }

    // =========================================================================
    // Timers
    // =========================================================================

    fn arm_auto_collapse(&self, inner: &mut Inner) {
        self.cancel_auto_collapse(inner);
        if !inner.auto_collapse_enabled || inner.state != SectionState::Expanded {
            return;
        }

        let weak = self.weak_self.clone();
        inner.auto_collapse = self
            .auto_collapse_timer
            .schedule(inner.auto_collapse_delay, move |generation| {
                if let Some(machine) = weak.upgrade() {
                    machine.auto_collapse_fired(generation);
                }
            });
    }

    fn cancel_auto_collapse(&self, inner: &mut Inner) {
        if let Some(handle) = inner.auto_collapse.take() {
            handle.cancel();
        }
        self.auto_collapse_timer.invalidate();
    }

    fn auto_collapse_fired(&self, generation: u64) {
        let mut inner = self.lock();
        if !self.auto_collapse_timer.is_current(generation) {
            return;
        }
        inner.auto_collapse = None;
        info!("Auto-collapsing hidden section");
        self.collapse_locked(&mut inner);
        self.publish(&inner);
    }

    fn arm_debounce(&self, inner: &mut Inner) {
        let weak = self.weak_self.clone();
        let handle = self
            .debounce_timer
            .schedule(self.toggle_debounce, move |generation| {
                if let Some(machine) = weak.upgrade() {
                    machine.debounce_elapsed(generation);
                }
            });
        // Without a runtime the guard cannot be timed, so it never engages.
        inner.toggling = handle.is_some();
        inner.debounce = handle;
    }

    fn debounce_elapsed(&self, generation: u64) {
        let mut inner = self.lock();
        if !self.debounce_timer.is_current(generation) {
            return;
        }
        inner.debounce = None;
        inner.toggling = false;
        self.publish(&inner);
    }

    /// Change the auto-collapse settings. Rearms the timer if currently expanded.
    pub fn set_auto_collapse(&self, enabled: bool, delay: Duration) {
        let mut inner = self.lock();
        inner.auto_collapse_enabled = enabled;
        inner.auto_collapse_delay = delay;
        self.arm_auto_collapse(&mut inner);
    }

    /// The user is interacting with revealed icons; stop the pending auto-collapse.
    pub fn note_user_interaction(&self) {
        let mut inner = self.lock();
        if inner.auto_collapse.is_some() {
            debug!("User interaction, auto-collapse cancelled");
        }
        self.cancel_auto_collapse(&mut inner);
    }

    /// Whether an auto-collapse is pending.
    pub fn is_auto_collapse_armed(&self) -> bool {
        self.lock().auto_collapse.is_some()
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    pub fn separator_frame(&self) -> Option<Rect> {
        let id = self.lock().separator_item?;
        self.host.item_frame(id)
    }

    /// UI-space rectangle holding the hidden icons, at most `max_width` wide.
    ///
    /// Measured from the separator's edge facing the hidden icons to that
    /// display's edge. The width is zero or negative while collapsed, because
    /// the separator then extends past the display.
    pub fn hidden_region(&self, max_width: f64) -> Option<Rect> {
        let separator = self.separator_frame()?;
        let displays = self.displays.displays();
        let display = display_containing(&displays, separator.center())
            .or_else(|| primary_display(&displays))?;
        let bar = display.menu_bar_frame();

        let (left, right) = match self.direction {
            LayoutDirection::LeftToRight => {
                let right = separator.min_x();
                (bar.min_x().max(right - max_width), right)
            }
            LayoutDirection::RightToLeft => {
                let left = separator.max_x();
                (left, bar.max_x().min(left + max_width))
            }
        };

        Some(Rect::new(left, bar.min_y(), right - left, bar.height()))
    }

    /// Cancel timers and remove both control items.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        self.cancel_auto_collapse(&mut inner);
        if let Some(handle) = inner.debounce.take() {
            handle.cancel();
        }
        self.debounce_timer.invalidate();
        inner.toggling = false;

        if let Some(separator) = inner.separator_item.take() {
            self.host.remove_item(separator);
        }
        if let Some(toggle) = inner.toggle_item.take() {
            self.host.remove_item(toggle);
        }
        inner.state = SectionState::Collapsed;
        self.publish(&inner);
        info!("Section state machine shut down");
    }
}

impl crate::capture::HiddenRegionSource for SectionStateMachine {
    fn hidden_region(&self, max_width: f64) -> Option<Rect> {
        SectionStateMachine::hidden_region(self, max_width)
    }
}
