//! Platform seams.
//!
//! Each OS interface the core consumes is a trait here. Components receive
//! `Arc<dyn Trait>` at construction, so the state machines and geometry can be
//! exercised with in-memory fakes and the native backend is selected once at
//! the composition root.

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(test)]
pub mod fake;

use crate::error::{EventError, PermissionError, PlacementError};
use image::RgbaImage;
use std::sync::Arc;
use std::time::Duration;
use stowbar_types::{DisplayInfo, PermissionStatus, PermissionType, Point, Rect};

/// Identifier of a control item created through a [`MenuBarHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlItemId(pub u64);

impl std::fmt::Display for ControlItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Role of a control item in the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlItemRole {
    /// The clickable chevron that toggles the hidden region
    Toggle,
    /// The divider whose length hides or reveals the icons beside it
    Separator,
}

impl ControlItemRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::Separator => "separator",
        }
    }
}

/// Parameters for creating a control item.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlItemRequest {
    pub role: ControlItemRole,
    /// Name under which the OS remembers the item's position across restarts
    pub autosave_name: String,
    /// Initial length in logical units
    pub length: f64,
}

/// Create, resize and query menu bar slots.
///
/// Items created later are placed further from the bar's anchor edge (on
/// macOS: further left), which is what the placement ordering relies on.
pub trait MenuBarHost: Send + Sync {
    fn create_item(&self, request: &ControlItemRequest) -> Result<ControlItemId, PlacementError>;

    fn set_length(&self, id: ControlItemId, length: f64) -> Result<(), PlacementError>;

    /// Current frame of the item in UI space, if it is on a display.
    fn item_frame(&self, id: ControlItemId) -> Option<Rect>;

    /// Show the named glyph (an SF Symbol name on macOS) in the item's button.
    fn set_glyph(&self, id: ControlItemId, glyph: &str) -> Result<(), PlacementError>;

    fn remove_item(&self, id: ControlItemId);
}

/// Rasterize a rectangle of the screen.
pub trait ScreenSnapshotter: Send + Sync {
    /// Blocking. `rect` is in screen space; the image is in device pixels.
    /// Returns `None` when the OS produced no pixels.
    fn snapshot(&self, rect: Rect) -> Option<RgbaImage>;
}

/// Mouse button used for forwarded clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
}

/// Phase of a synthetic mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MousePhase {
    Down,
    Up,
}

/// Post synthetic pointer events.
pub trait InputSynthesizer: Send + Sync {
    /// Current pointer location in screen space.
    fn pointer_location(&self) -> Option<Point>;

    /// Move the pointer without generating a mouse-moved event. Screen space.
    fn warp_pointer(&self, to: Point) -> Result<(), EventError>;

    /// Create and post one mouse event at `at` (screen space).
    fn post_mouse_event(
        &self,
        button: MouseButton,
        phase: MousePhase,
        at: Point,
    ) -> Result<(), EventError>;
}

/// Query and request OS consent.
pub trait PermissionChecker: Send + Sync {
    /// Blocking status query.
    fn status(&self, permission: PermissionType) -> PermissionStatus;

    /// Start the consent flow. Returns once the request has been handed to
    /// the OS; the outcome is observed by a later `status` call.
    fn request(&self, permission: PermissionType) -> Result<(), PermissionError>;
}

/// Pointer location in UI space, for hover tracking.
pub trait PointerSource: Send + Sync {
    fn pointer_location(&self) -> Option<Point>;
}

/// Enumerate connected displays.
pub trait DisplayProvider: Send + Sync {
    fn displays(&self) -> Vec<DisplayInfo>;
}

/// The floating surface used by the overlay display mode.
pub trait OverlaySurface: Send + Sync {
    /// Move and resize the surface. UI space.
    fn set_frame(&self, frame: Rect);

    fn fade_in(&self, duration: Duration);

    fn fade_out(&self, duration: Duration);
}

/// Work queued for the UI sequence.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// The serial sequence that owns control items and other UI objects.
///
/// Timers and async flows never touch a [`MenuBarHost`] directly; they post
/// the mutation here. Tasks run one at a time, in the order they were posted.
pub trait UiExecutor: Send + Sync {
    fn post(&self, task: UiTask);
}

/// Runs each task on the posting thread, for hosts without thread affinity.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl UiExecutor for InlineExecutor {
    fn post(&self, task: UiTask) {
        task();
    }
}

/// Run `f` on the UI sequence and wait for its result.
///
/// Returns `None` if the executor dropped the task without running it.
pub async fn run_on_ui<R, F>(ui: &dyn UiExecutor, f: F) -> Option<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (tx, rx) = tokio::sync::oneshot::channel();
    ui.post(Box::new(move || {
        let _ = tx.send(f());
    }));
    rx.await.ok()
}

/// Every platform service the core consumes.
#[derive(Clone)]
pub struct PlatformServices {
    pub menu_bar: Arc<dyn MenuBarHost>,
    pub snapshotter: Arc<dyn ScreenSnapshotter>,
    pub input: Arc<dyn InputSynthesizer>,
    pub permissions: Arc<dyn PermissionChecker>,
    pub pointer: Arc<dyn PointerSource>,
    pub displays: Arc<dyn DisplayProvider>,
    pub overlay: Arc<dyn OverlaySurface>,
    pub ui: Arc<dyn UiExecutor>,
}

/// Native platform services for the current OS, if supported.
#[cfg(target_os = "macos")]
pub fn native_services() -> Option<PlatformServices> {
    macos::services()
}

/// Native platform services for the current OS, if supported.
#[cfg(not(target_os = "macos"))]
pub fn native_services() -> Option<PlatformServices> {
    None
}

/// Human-readable name of the native backend.
pub fn backend_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "macOS (Core Graphics / AppKit)"
    } else {
        "unsupported"
    }
}
