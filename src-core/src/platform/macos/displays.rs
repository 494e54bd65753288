//! Display enumeration using Core Graphics.

use crate::platform::DisplayProvider;
use core_graphics::display::{CGDirectDisplayID, CGDisplay, CGMainDisplayID};
use stowbar_types::{CoordinateSpace, DisplayInfo, Rect, DEFAULT_MENU_BAR_HEIGHT};
use tracing::warn;

const MAX_DISPLAYS: u32 = 32;

/// Height of the main display in logical units, the pivot for y flips.
pub(super) fn main_display_height() -> f64 {
    let main = CGDisplay::new(unsafe { CGMainDisplayID() });
    main.bounds().size.height
}

fn active_display_ids() -> Vec<CGDirectDisplayID> {
    let mut ids: Vec<CGDirectDisplayID> = vec![0; MAX_DISPLAYS as usize];
    let mut count: u32 = 0;

    let result = unsafe {
        core_graphics::display::CGGetActiveDisplayList(MAX_DISPLAYS, ids.as_mut_ptr(), &mut count)
    };
    if result != 0 {
        warn!("CGGetActiveDisplayList failed with error: {}", result);
        return Vec::new();
    }

    ids.truncate(count as usize);
    ids
}

/// Lists active displays with frames converted to UI space.
#[derive(Debug, Default)]
pub struct CGDisplayProvider;

impl DisplayProvider for CGDisplayProvider {
    fn displays(&self) -> Vec<DisplayInfo> {
        let main_id = unsafe { CGMainDisplayID() };
        let space = CoordinateSpace::new(main_display_height());

        let mut displays: Vec<DisplayInfo> = active_display_ids()
            .into_iter()
            .map(|id| {
                let display = CGDisplay::new(id);
                let bounds = display.bounds();
                let is_primary = id == main_id;

                let logical_width = bounds.size.width;
                let scale_factor = if logical_width > 0.0 {
                    display.pixels_wide() as f64 / logical_width
                } else {
                    1.0
                };

                let screen_frame = Rect::new(
                    bounds.origin.x,
                    bounds.origin.y,
                    bounds.size.width,
                    bounds.size.height,
                );

                DisplayInfo {
                    id: id.to_string(),
                    name: if is_primary {
                        format!("Display {} (Primary)", id)
                    } else {
                        format!("Display {}", id)
                    },
                    frame: space.to_ui_rect(screen_frame),
                    is_primary,
                    scale_factor,
                    menu_bar_height: DEFAULT_MENU_BAR_HEIGHT,
                }
            })
            .collect();

        displays.sort_by(|a, b| b.is_primary.cmp(&a.is_primary));
        displays
    }
}
