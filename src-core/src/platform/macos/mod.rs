//! macOS platform services.
//!
//! - Core Graphics for display enumeration, window-list snapshots and CGEvent
//! - AppKit (NSStatusBar, NSWindow) for control items and the overlay surface
//! - TCC preflight/request calls for permissions
//!
//! AppKit objects are only touched on the main thread. Section transitions
//! arrive there through [`MainQueueExecutor`], frame queries and the overlay
//! hop through the main dispatch queue themselves.

mod displays;
mod executor;
mod input;
mod overlay;
mod permissions;
mod snapshot;
mod status_bar;

pub use displays::CGDisplayProvider;
pub use executor::MainQueueExecutor;
pub use input::{CGEventPointer, CGEventSynthesizer};
pub use overlay::OverlayWindow;
pub use permissions::TccPermissionChecker;
pub use snapshot::WindowListSnapshotter;
pub use status_bar::StatusBarHost;

use super::PlatformServices;
use std::sync::Arc;

/// The native service bundle.
pub fn services() -> Option<PlatformServices> {
    let displays = Arc::new(CGDisplayProvider);
    Some(PlatformServices {
        menu_bar: Arc::new(StatusBarHost::new()),
        snapshotter: Arc::new(WindowListSnapshotter),
        input: Arc::new(CGEventSynthesizer),
        permissions: Arc::new(TccPermissionChecker),
        pointer: Arc::new(CGEventPointer),
        displays,
        overlay: Arc::new(OverlayWindow::new()),
        ui: Arc::new(MainQueueExecutor),
    })
}
