//! Borderless floating window used as the overlay surface.
//!
//! Every call hops to the main queue and returns immediately. The window is
//! created lazily on first use and kept for the life of the process.

use crate::platform::OverlaySurface;
use objc2::rc::Retained;
use objc2::MainThreadMarker;
use objc2::MainThreadOnly;
use objc2_app_kit::{NSBackingStoreType, NSColor, NSWindow, NSWindowStyleMask};
use objc2_foundation::{NSPoint, NSRect, NSSize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use stowbar_types::Rect;
use tracing::warn;

/// Status window level, so the surface sits with the menu bar.
const WINDOW_LEVEL: isize = 25;
const FADE_STEPS: u32 = 10;

// Retained<NSWindow> pointer, only dereferenced on the main thread.
static WINDOW: Mutex<Option<usize>> = Mutex::new(None);

fn ns_rect(rect: Rect) -> NSRect {
    NSRect::new(
        NSPoint::new(rect.min_x(), rect.min_y()),
        NSSize::new(rect.width(), rect.height()),
    )
}

/// Run `f` with the overlay window on the main thread, creating it if needed.
fn with_window(f: impl FnOnce(&NSWindow) + Send + 'static) {
    dispatch::Queue::main().exec_async(move || {
        let Some(mtm) = MainThreadMarker::new() else {
            warn!("Overlay: not on main thread");
            return;
        };

        let mut slot = WINDOW.lock().unwrap_or_else(|e| e.into_inner());
        let ptr = match *slot {
            Some(ptr) => ptr,
            None => {
                let window = unsafe {
                    NSWindow::initWithContentRect_styleMask_backing_defer(
                        NSWindow::alloc(mtm),
                        ns_rect(Rect::new(0.0, 0.0, 1.0, 1.0)),
                        NSWindowStyleMask::Borderless,
                        NSBackingStoreType::Buffered,
                        false,
                    )
                };
                window.setLevel(WINDOW_LEVEL);
                window.setOpaque(false);
                window.setBackgroundColor(Some(&NSColor::clearColor()));
                window.setAlphaValue(0.0);
                unsafe { window.setReleasedWhenClosed(false) };
                let ptr = Retained::into_raw(window) as usize;
                *slot = Some(ptr);
                ptr
            }
        };

        // Safety: retained for the life of the process; main thread.
        let window = unsafe { &*(ptr as *const NSWindow) };
        f(window);
    });
}

/// The overlay surface. Fades step the window alpha from a helper thread.
#[derive(Debug, Default)]
pub struct OverlayWindow {
    /// Bumped by every fade so an older fade stops stepping
    fade_generation: Arc<AtomicU64>,
}

impl OverlayWindow {
    pub fn new() -> Self {
        Self::default()
    }

    fn fade(&self, from: f64, to: f64, duration: Duration) {
        let generation = self.fade_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.fade_generation);
        let step = duration / FADE_STEPS;

        if to > 0.0 {
            with_window(|window| window.orderFrontRegardless());
        }

        thread::spawn(move || {
            for i in 1..=FADE_STEPS {
                thread::sleep(step);
                if current.load(Ordering::SeqCst) != generation {
                    return;
                }
                let alpha = from + (to - from) * (i as f64 / FADE_STEPS as f64);
                let hide = i == FADE_STEPS && to <= 0.0;
                with_window(move |window| {
                    window.setAlphaValue(alpha);
                    if hide {
                        window.orderOut(None);
                    }
                });
            }
        });
    }
}

impl OverlaySurface for OverlayWindow {
    fn set_frame(&self, frame: Rect) {
        with_window(move |window| window.setFrame_display(ns_rect(frame), true));
    }

    fn fade_in(&self, duration: Duration) {
        self.fade(0.0, 1.0, duration);
    }

    fn fade_out(&self, duration: Duration) {
        self.fade(1.0, 0.0, duration);
    }
}
