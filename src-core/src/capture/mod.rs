//! Hidden icon capture.
//!
//! Rasterizes the hidden region of the menu bar in one snapshot and slices it
//! into per-icon images. Only one capture runs at a time; callers that arrive
//! while one is in flight await the same result.

pub mod slicer;
pub mod types;

pub use slicer::slice_icons;
pub use types::{composite_image, encode_png, CapturedIcon, CapturedIconInfo, MenuBarCaptureResult};

use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::permissions::PermissionGate;
use crate::platform::{DisplayProvider, ScreenSnapshotter};
use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex};
use stowbar_types::{primary_display, CoordinateSpace, PermissionType, Rect};
use tracing::{debug, info, warn};

/// Supplies the UI-space rectangle currently holding the hidden icons.
pub trait HiddenRegionSource: Send + Sync {
    /// Region at most `max_width` wide, or `None` if it cannot be determined.
    fn hidden_region(&self, max_width: f64) -> Option<Rect>;
}

/// A fixed part of the menu bar, for tools that capture without owning
/// control items. Narrowed from the left to at most `max_width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRegion(pub Rect);

impl HiddenRegionSource for FixedRegion {
    fn hidden_region(&self, max_width: f64) -> Option<Rect> {
        let width = self.0.width().min(max_width);
        Some(Rect::new(self.0.max_x() - width, self.0.min_y(), width, self.0.height()))
    }
}

/// Outcome shared by every caller of one capture.
pub type CaptureOutcome = Result<Arc<MenuBarCaptureResult>, CaptureError>;

type SharedCapture = Shared<BoxFuture<'static, CaptureOutcome>>;

/// Everything one capture run needs, detached from the engine so the run
/// can outlive the call that started it.
#[derive(Clone)]
struct CaptureJob {
    permissions: Arc<PermissionGate>,
    region_source: Arc<dyn HiddenRegionSource>,
    snapshotter: Arc<dyn ScreenSnapshotter>,
    displays: Arc<dyn DisplayProvider>,
    config: CaptureConfig,
}

/// Captures the hidden region as individual icon images.
pub struct IconCaptureEngine {
    job: CaptureJob,
    in_flight: Mutex<Option<SharedCapture>>,
}

impl IconCaptureEngine {
    pub fn new(
        permissions: Arc<PermissionGate>,
        region_source: Arc<dyn HiddenRegionSource>,
        snapshotter: Arc<dyn ScreenSnapshotter>,
        displays: Arc<dyn DisplayProvider>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            job: CaptureJob {
                permissions,
                region_source,
                snapshotter,
                displays,
                config,
            },
            in_flight: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.job.config
    }

    /// Whether a capture is running right now.
    pub fn is_capturing(&self) -> bool {
        self.in_flight
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|f| f.peek().is_none()))
            .unwrap_or(false)
    }

    /// Capture the hidden region.
    ///
    /// If a capture is already running this call does not start another one;
    /// it waits for the running one and returns its result.
    pub async fn capture(&self) -> CaptureOutcome {
        let shared = {
            let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            match slot.as_ref() {
                Some(running) if running.peek().is_none() => {
                    debug!("Capture already in progress, waiting for it");
                    running.clone()
                }
                _ => {
                    let job = self.job.clone();
                    let fresh = async move { job.run().await }.boxed().shared();
                    *slot = Some(fresh.clone());
                    fresh
                }
            }
        };

        let outcome = shared.await;

        let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(|f| f.peek().is_some()) {
            *slot = None;
        }
        outcome
    }

    /// Forget the running capture, if any. Callers already waiting on it
    /// still get its result; new callers start a fresh capture.
    pub fn cancel(&self) {
        let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if slot.take().is_some() {
            debug!("Dropped in-flight capture");
        }
    }
}

impl CaptureJob {
    async fn run(self) -> CaptureOutcome {
        self.permissions
            .require(PermissionType::ScreenRecording)
            .map_err(|_| CaptureError::PermissionDenied)?;

        let region = self
            .region_source
            .hidden_region(self.config.max_region_width())
            .ok_or_else(|| CaptureError::MenuBarNotFound("separator has no frame".to_string()))?;
        if region.is_empty() {
            return Err(CaptureError::InvalidRegion {
                width: region.width(),
                height: region.height(),
            });
        }

        let displays = self.displays.displays();
        let primary = primary_display(&displays)
            .ok_or_else(|| CaptureError::MenuBarNotFound("no displays".to_string()))?;
        let screen_rect = CoordinateSpace::new(primary.frame.height()).to_screen_rect(region);

        debug!(
            "Capturing hidden region {}x{} at ({}, {})",
            screen_rect.width(),
            screen_rect.height(),
            screen_rect.min_x(),
            screen_rect.min_y()
        );

        let snapshotter = Arc::clone(&self.snapshotter);
        let image = tokio::task::spawn_blocking(move || snapshotter.snapshot(screen_rect))
            .await
            .map_err(|e| {
                warn!("Capture task failed: {}", e);
                CaptureError::Cancelled
            })?
            .ok_or(CaptureError::CaptureFailedNoImage)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(CaptureError::CaptureFailedNoImage);
        }

        let icons = slice_icons(&image, region, &self.config);
        if icons.is_empty() {
            return Err(CaptureError::NoMenuBarItems);
        }

        info!("Captured {} hidden icons", icons.len());
        Ok(Arc::new(MenuBarCaptureResult {
            icons,
            captured_at: Utc::now(),
            region,
        }))
    }
}
