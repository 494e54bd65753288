//! Control items backed by NSStatusItem.
//!
//! NSStatusItem is main-thread only and not `Send`, so items are kept as raw
//! retained pointers keyed by id and only dereferenced after a
//! [`MainThreadMarker`] check. Mutations must be posted through the UI
//! executor; frame queries hop to the main queue on their own so captures
//! can measure the hidden region from a worker thread.

use crate::error::PlacementError;
use crate::platform::{ControlItemId, ControlItemRequest, MenuBarHost};
use objc2::rc::Retained;
use objc2::MainThreadMarker;
use objc2_app_kit::{NSImage, NSStatusBar, NSStatusItem};
use objc2_foundation::NSString;
use std::collections::HashMap;
use std::sync::Mutex;
use stowbar_types::Rect;
use tracing::{debug, warn};

fn main_thread() -> Result<MainThreadMarker, PlacementError> {
    MainThreadMarker::new()
        .ok_or_else(|| PlacementError::Unavailable("not on the main thread".to_string()))
}

#[derive(Debug, Default)]
struct Items {
    next_id: u64,
    /// Retained<NSStatusItem> pointers, owned by this map
    by_id: HashMap<u64, usize>,
}

/// Creates and manages status items in the system status bar.
#[derive(Debug, Default)]
pub struct StatusBarHost {
    items: Mutex<Items>,
}

impl StatusBarHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with the item behind `id`. Main thread only.
    fn with_item<R>(
        &self,
        id: ControlItemId,
        f: impl FnOnce(&NSStatusItem, MainThreadMarker) -> R,
    ) -> Result<R, PlacementError> {
        let mtm = main_thread()?;
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        let ptr = *items
            .by_id
            .get(&id.0)
            .ok_or_else(|| PlacementError::UnknownItem(id.to_string()))?;
        // Safety: the pointer came from Retained::into_raw and stays retained
        // until removed from the map; we are on the main thread.
        let item = unsafe { &*(ptr as *const NSStatusItem) };
        Ok(f(item, mtm))
    }
}

impl MenuBarHost for StatusBarHost {
    fn create_item(&self, request: &ControlItemRequest) -> Result<ControlItemId, PlacementError> {
        main_thread()?;
        if !(request.length.is_finite() && request.length > 0.0) {
            return Err(PlacementError::InvalidLength(request.length));
        }

        let status_bar = unsafe { NSStatusBar::systemStatusBar() };
        let item: Retained<NSStatusItem> = unsafe { status_bar.statusItemWithLength(request.length) };
        unsafe { item.setAutosaveName(Some(&NSString::from_str(&request.autosave_name))) };

        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.next_id += 1;
        let id = ControlItemId(items.next_id);
        items.by_id.insert(id.0, Retained::into_raw(item) as usize);
        debug!("Created status item {} ({})", id, request.autosave_name);
        Ok(id)
    }

    fn set_length(&self, id: ControlItemId, length: f64) -> Result<(), PlacementError> {
        if !(length.is_finite() && length > 0.0) {
            return Err(PlacementError::InvalidLength(length));
        }
        self.with_item(id, |item, _| unsafe { item.setLength(length) })
    }

    /// Callable from any thread: off the main thread the lookup runs
    /// synchronously on the main queue.
    fn item_frame(&self, id: ControlItemId) -> Option<Rect> {
        if MainThreadMarker::new().is_none() {
            return dispatch::Queue::main().exec_sync(|| self.item_frame(id));
        }
        self.with_item(id, |item, mtm| {
            let button = unsafe { item.button(mtm) }?;
            let window = button.window()?;
            let frame = window.frame();
            Some(Rect::new(
                frame.origin.x,
                frame.origin.y,
                frame.size.width,
                frame.size.height,
            ))
        })
        .ok()
        .flatten()
    }

    fn set_glyph(&self, id: ControlItemId, glyph: &str) -> Result<(), PlacementError> {
        self.with_item(id, |item, mtm| {
            let Some(button) = (unsafe { item.button(mtm) }) else {
                return Err(PlacementError::Unavailable("status item has no button".to_string()));
            };
            let image = unsafe {
                NSImage::imageWithSystemSymbolName_accessibilityDescription(
                    &NSString::from_str(glyph),
                    None,
                )
            };
            match image {
                Some(image) => {
                    unsafe { button.setImage(Some(&image)) };
                    Ok(())
                }
                None => {
                    warn!("Unknown symbol {:?}", glyph);
                    Err(PlacementError::Unavailable(format!("symbol {} not found", glyph)))
                }
            }
        })?
    }

    fn remove_item(&self, id: ControlItemId) {
        if MainThreadMarker::new().is_none() {
            warn!("Cannot remove status item {} off the main thread", id);
            return;
        }
        let ptr = {
            let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
            items.by_id.remove(&id.0)
        };
        let Some(ptr) = ptr else {
            return;
        };
        // Reconstruct the Retained to remove and release the item
        let item: Option<Retained<NSStatusItem>> =
            unsafe { Retained::from_raw(ptr as *mut NSStatusItem) };
        if let Some(item) = item {
            let status_bar = unsafe { NSStatusBar::systemStatusBar() };
            unsafe { status_bar.removeStatusItem(&item) };
            debug!("Removed status item {}", id);
        }
    }
}
