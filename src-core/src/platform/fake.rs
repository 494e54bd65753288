//! In-memory platform fakes for tests.

use super::*;
use image::Rgba;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Mutex};
use std::thread::ThreadId;
use stowbar_types::LayoutDirection;

pub const SCREEN_WIDTH: f64 = 1440.0;
pub const SCREEN_HEIGHT: f64 = 900.0;
pub const BAR_HEIGHT: f64 = 24.0;
/// Where the first status item is anchored (system items sit beyond it).
pub const BAR_ANCHOR_X: f64 = 1140.0;

pub fn primary_display() -> DisplayInfo {
    DisplayInfo {
        id: "1".to_string(),
        name: "Built-in Display".to_string(),
        frame: Rect::new(0.0, 0.0, SCREEN_WIDTH, SCREEN_HEIGHT),
        is_primary: true,
        scale_factor: 2.0,
        menu_bar_height: BAR_HEIGHT,
    }
}

pub fn secondary_display() -> DisplayInfo {
    DisplayInfo {
        id: "2".to_string(),
        name: "External".to_string(),
        frame: Rect::new(SCREEN_WIDTH, 0.0, 1920.0, 1080.0),
        is_primary: false,
        scale_factor: 1.0,
        menu_bar_height: BAR_HEIGHT,
    }
}

// =============================================================================
// Menu bar
// =============================================================================

#[derive(Debug, Clone)]
pub struct FakeItem {
    pub id: ControlItemId,
    pub role: ControlItemRole,
    pub autosave_name: String,
    pub length: f64,
    pub glyph: Option<String>,
}

#[derive(Debug)]
struct FakeBar {
    next_id: u64,
    /// Creation order; the first item sits closest to the anchor.
    items: Vec<FakeItem>,
    direction: LayoutDirection,
    fail_create: bool,
}

/// Lays items out from a fixed anchor, newest furthest away, like the system
/// status bar does.
#[derive(Debug)]
pub struct FakeMenuBarHost {
    bar: Mutex<FakeBar>,
    /// When set, mutations from any other thread fail like AppKit's would
    affinity: Mutex<Option<ThreadId>>,
    pub length_changes: AtomicUsize,
    pub off_thread_calls: AtomicUsize,
}

impl FakeMenuBarHost {
    pub fn new(direction: LayoutDirection) -> Self {
        Self {
            bar: Mutex::new(FakeBar {
                next_id: 1,
                items: Vec::new(),
                direction,
                fail_create: false,
            }),
            affinity: Mutex::new(None),
            length_changes: AtomicUsize::new(0),
            off_thread_calls: AtomicUsize::new(0),
        }
    }

    /// Reject mutations made from any thread but `owner`.
    pub fn bind_to_thread(&self, owner: ThreadId) {
        *self.affinity.lock().unwrap() = Some(owner);
    }

    fn check_thread(&self) -> Result<(), PlacementError> {
        match *self.affinity.lock().unwrap() {
            Some(owner) if owner != std::thread::current().id() => {
                self.off_thread_calls.fetch_add(1, Ordering::SeqCst);
                Err(PlacementError::Unavailable("not on the UI thread".to_string()))
            }
            _ => Ok(()),
        }
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.bar.lock().unwrap().fail_create = fail;
    }

    pub fn items(&self) -> Vec<FakeItem> {
        self.bar.lock().unwrap().items.clone()
    }

    pub fn item(&self, role: ControlItemRole) -> Option<FakeItem> {
        self.items().into_iter().find(|i| i.role == role)
    }

    pub fn frame_of(&self, role: ControlItemRole) -> Option<Rect> {
        let id = self.item(role)?.id;
        self.item_frame(id)
    }
}

impl MenuBarHost for FakeMenuBarHost {
    fn create_item(&self, request: &ControlItemRequest) -> Result<ControlItemId, PlacementError> {
        self.check_thread()?;
        let mut bar = self.bar.lock().unwrap();
        if bar.fail_create {
            return Err(PlacementError::CreationFailed(request.autosave_name.clone()));
        }
        let id = ControlItemId(bar.next_id);
        bar.next_id += 1;
        bar.items.push(FakeItem {
            id,
            role: request.role,
            autosave_name: request.autosave_name.clone(),
            length: request.length,
            glyph: None,
        });
        Ok(id)
    }

    fn set_length(&self, id: ControlItemId, length: f64) -> Result<(), PlacementError> {
        self.check_thread()?;
        let mut bar = self.bar.lock().unwrap();
        let item = bar
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| PlacementError::UnknownItem(id.to_string()))?;
        item.length = length;
        self.length_changes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn item_frame(&self, id: ControlItemId) -> Option<Rect> {
        let bar = self.bar.lock().unwrap();
        let y = SCREEN_HEIGHT - BAR_HEIGHT;
        let mut edge = BAR_ANCHOR_X;
        for item in &bar.items {
            let x = match bar.direction {
                LayoutDirection::LeftToRight => {
                    edge -= item.length;
                    edge
                }
                LayoutDirection::RightToLeft => {
                    let x = SCREEN_WIDTH - edge;
                    edge -= item.length;
                    x
                }
            };
            if item.id == id {
                return Some(Rect::new(x, y, item.length, BAR_HEIGHT));
            }
        }
        None
    }

    fn set_glyph(&self, id: ControlItemId, glyph: &str) -> Result<(), PlacementError> {
        self.check_thread()?;
        let mut bar = self.bar.lock().unwrap();
        let item = bar
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| PlacementError::UnknownItem(id.to_string()))?;
        item.glyph = Some(glyph.to_string());
        Ok(())
    }

    fn remove_item(&self, id: ControlItemId) {
        if self.check_thread().is_err() {
            return;
        }
        self.bar.lock().unwrap().items.retain(|i| i.id != id);
    }
}

// =============================================================================
// Screen snapshots
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapshotContent {
    /// Checkerboard pixels, so every cell has visible content
    Checkerboard,
    /// A single flat color everywhere
    Blank,
    /// The OS returns nothing
    Nothing,
}

#[derive(Debug)]
pub struct FakeSnapshotter {
    pub content: Mutex<SnapshotContent>,
    pub scale: f64,
    /// Simulated blocking time per snapshot
    pub delay: Duration,
    pub calls: AtomicUsize,
    pub last_rect: Mutex<Option<Rect>>,
}

impl FakeSnapshotter {
    pub fn new(content: SnapshotContent, scale: f64) -> Self {
        Self {
            content: Mutex::new(content),
            scale,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_rect: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_content(&self, content: SnapshotContent) {
        *self.content.lock().unwrap() = content;
    }
}

impl ScreenSnapshotter for FakeSnapshotter {
    fn snapshot(&self, rect: Rect) -> Option<RgbaImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_rect.lock().unwrap() = Some(rect);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let width = (rect.width() * self.scale).round() as u32;
        let height = (rect.height() * self.scale).round() as u32;
        match *self.content.lock().unwrap() {
            SnapshotContent::Nothing => None,
            SnapshotContent::Blank => Some(RgbaImage::from_pixel(
                width,
                height,
                Rgba([30, 30, 30, 255]),
            )),
            SnapshotContent::Checkerboard => Some(RgbaImage::from_fn(width, height, |x, y| {
                if (x + y) % 2 == 0 {
                    Rgba([0, 0, 0, 255])
                } else {
                    Rgba([255, 255, 255, 255])
                }
            })),
        }
    }
}

// =============================================================================
// Input
// =============================================================================

#[derive(Debug)]
pub struct FakeInput {
    pub pointer: Mutex<Point>,
    pub events: Mutex<Vec<(MouseButton, MousePhase, Point)>>,
    pub warps: Mutex<Vec<Point>>,
    pub fail_post: AtomicBool,
}

impl FakeInput {
    pub fn new(pointer: Point) -> Self {
        Self {
            pointer: Mutex::new(pointer),
            events: Mutex::new(Vec::new()),
            warps: Mutex::new(Vec::new()),
            fail_post: AtomicBool::new(false),
        }
    }

    pub fn pointer(&self) -> Point {
        *self.pointer.lock().unwrap()
    }

    pub fn events(&self) -> Vec<(MouseButton, MousePhase, Point)> {
        self.events.lock().unwrap().clone()
    }
}

impl InputSynthesizer for FakeInput {
    fn pointer_location(&self) -> Option<Point> {
        Some(self.pointer())
    }

    fn warp_pointer(&self, to: Point) -> Result<(), EventError> {
        *self.pointer.lock().unwrap() = to;
        self.warps.lock().unwrap().push(to);
        Ok(())
    }

    fn post_mouse_event(
        &self,
        button: MouseButton,
        phase: MousePhase,
        at: Point,
    ) -> Result<(), EventError> {
        // Posting a real mouse event moves the cursor before it can fail.
        *self.pointer.lock().unwrap() = at;
        if self.fail_post.load(Ordering::SeqCst) {
            return Err(EventError::EventPostingFailed("fake failure".to_string()));
        }
        self.events.lock().unwrap().push((button, phase, at));
        Ok(())
    }
}

// =============================================================================
// Permissions
// =============================================================================

#[derive(Debug)]
pub struct FakePermissions {
    pub statuses: Mutex<HashMap<PermissionType, PermissionStatus>>,
    pub requests: Mutex<Vec<PermissionType>>,
    pub grant_on_request: AtomicBool,
    pub polls: AtomicUsize,
}

impl FakePermissions {
    pub fn new(accessibility: PermissionStatus, screen_recording: PermissionStatus) -> Self {
        let mut statuses = HashMap::new();
        statuses.insert(PermissionType::Accessibility, accessibility);
        statuses.insert(PermissionType::ScreenRecording, screen_recording);
        Self {
            statuses: Mutex::new(statuses),
            requests: Mutex::new(Vec::new()),
            grant_on_request: AtomicBool::new(false),
            polls: AtomicUsize::new(0),
        }
    }

    pub fn granted() -> Self {
        Self::new(PermissionStatus::Granted, PermissionStatus::Granted)
    }

    pub fn set(&self, permission: PermissionType, status: PermissionStatus) {
        self.statuses.lock().unwrap().insert(permission, status);
    }
}

impl PermissionChecker for FakePermissions {
    fn status(&self, permission: PermissionType) -> PermissionStatus {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .get(&permission)
            .copied()
            .unwrap_or_default()
    }

    fn request(&self, permission: PermissionType) -> Result<(), PermissionError> {
        self.requests.lock().unwrap().push(permission);
        if self.grant_on_request.load(Ordering::SeqCst) {
            self.set(permission, PermissionStatus::Granted);
        }
        Ok(())
    }
}

// =============================================================================
// Pointer, displays, overlay
// =============================================================================

#[derive(Debug, Default)]
pub struct FakePointer {
    pub location: Mutex<Option<Point>>,
}

impl FakePointer {
    pub fn move_to(&self, point: Point) {
        *self.location.lock().unwrap() = Some(point);
    }
}

impl PointerSource for FakePointer {
    fn pointer_location(&self) -> Option<Point> {
        *self.location.lock().unwrap()
    }
}

#[derive(Debug)]
pub struct FakeDisplays {
    pub displays: Mutex<Vec<DisplayInfo>>,
}

impl FakeDisplays {
    pub fn new(displays: Vec<DisplayInfo>) -> Self {
        Self {
            displays: Mutex::new(displays),
        }
    }
}

impl DisplayProvider for FakeDisplays {
    fn displays(&self) -> Vec<DisplayInfo> {
        self.displays.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCall {
    Frame(Rect),
    FadeIn(Duration),
    FadeOut(Duration),
}

#[derive(Debug, Default)]
pub struct FakeOverlay {
    pub calls: Mutex<Vec<OverlayCall>>,
}

impl FakeOverlay {
    pub fn calls(&self) -> Vec<OverlayCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl OverlaySurface for FakeOverlay {
    fn set_frame(&self, frame: Rect) {
        self.calls.lock().unwrap().push(OverlayCall::Frame(frame));
    }

    fn fade_in(&self, duration: Duration) {
        self.calls.lock().unwrap().push(OverlayCall::FadeIn(duration));
    }

    fn fade_out(&self, duration: Duration) {
        self.calls.lock().unwrap().push(OverlayCall::FadeOut(duration));
    }
}

// =============================================================================
// UI thread
// =============================================================================

/// A dedicated thread draining posted tasks in order, standing in for the
/// main thread.
pub struct UiThread {
    tx: Mutex<mpsc::Sender<UiTask>>,
    thread_id: ThreadId,
}

impl UiThread {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<UiTask>();
        let handle = std::thread::Builder::new()
            .name("fake-ui".to_string())
            .spawn(move || {
                for task in rx {
                    task();
                }
            })
            .unwrap();
        Self {
            tx: Mutex::new(tx),
            thread_id: handle.thread().id(),
        }
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Run `f` on the UI thread and block until it returns. Everything posted
    /// earlier has run by then.
    pub fn call<R: Send + 'static>(&self, f: impl FnOnce() -> R + Send + 'static) -> R {
        let (tx, rx) = mpsc::channel();
        self.post(Box::new(move || {
            let _ = tx.send(f());
        }));
        rx.recv().unwrap()
    }
}

impl UiExecutor for UiThread {
    fn post(&self, task: UiTask) {
        let _ = self.tx.lock().unwrap().send(task);
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// Concrete handles to every fake, plus the trait-object bundle built from them.
pub struct FakePlatform {
    pub menu_bar: Arc<FakeMenuBarHost>,
    pub snapshotter: Arc<FakeSnapshotter>,
    pub input: Arc<FakeInput>,
    pub permissions: Arc<FakePermissions>,
    pub pointer: Arc<FakePointer>,
    pub displays: Arc<FakeDisplays>,
    pub overlay: Arc<FakeOverlay>,
    pub ui: Arc<dyn UiExecutor>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            menu_bar: Arc::new(FakeMenuBarHost::new(LayoutDirection::LeftToRight)),
            snapshotter: Arc::new(FakeSnapshotter::new(SnapshotContent::Checkerboard, 2.0)),
            input: Arc::new(FakeInput::new(Point::new(500.0, 500.0))),
            permissions: Arc::new(FakePermissions::granted()),
            pointer: Arc::new(FakePointer::default()),
            displays: Arc::new(FakeDisplays::new(vec![primary_display(), secondary_display()])),
            overlay: Arc::new(FakeOverlay::default()),
            ui: Arc::new(InlineExecutor),
        }
    }

    /// Run UI work on a dedicated thread that owns the control items.
    pub fn with_ui_thread(mut self) -> (Self, Arc<UiThread>) {
        let ui = Arc::new(UiThread::spawn());
        self.menu_bar.bind_to_thread(ui.thread_id());
        self.ui = ui.clone();
        (self, ui)
    }

    pub fn services(&self) -> PlatformServices {
        PlatformServices {
            menu_bar: self.menu_bar.clone(),
            snapshotter: self.snapshotter.clone(),
            input: self.input.clone(),
            permissions: self.permissions.clone(),
            pointer: self.pointer.clone(),
            displays: self.displays.clone(),
            overlay: self.overlay.clone(),
            ui: self.ui.clone(),
        }
    }
}
