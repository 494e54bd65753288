//! Synthetic mouse input via CGEvent.

use super::displays::main_display_height;
use crate::error::EventError;
use crate::platform::{InputSynthesizer, MouseButton, MousePhase, PointerSource};
use core_graphics::display::CGDisplay;
use core_graphics::event::{CGEvent, CGEventTapLocation, CGEventType, CGMouseButton};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use core_graphics::geometry::CGPoint;
use stowbar_types::{CoordinateSpace, Point};

fn event_source() -> Result<CGEventSource, EventError> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|_| EventError::EventCreationFailed("no HID event source".to_string()))
}

/// Current cursor location in screen space.
fn cursor_location() -> Option<Point> {
    let source = CGEventSource::new(CGEventSourceStateID::CombinedSessionState).ok()?;
    let event = CGEvent::new(source).ok()?;
    let location = event.location();
    Some(Point::new(location.x, location.y))
}

fn event_type(button: MouseButton, phase: MousePhase) -> CGEventType {
    match (button, phase) {
        (MouseButton::Left, MousePhase::Down) => CGEventType::LeftMouseDown,
        (MouseButton::Left, MousePhase::Up) => CGEventType::LeftMouseUp,
        (MouseButton::Right, MousePhase::Down) => CGEventType::RightMouseDown,
        (MouseButton::Right, MousePhase::Up) => CGEventType::RightMouseUp,
    }
}

/// Posts mouse events to the HID event tap.
#[derive(Debug, Default)]
pub struct CGEventSynthesizer;

impl InputSynthesizer for CGEventSynthesizer {
    fn pointer_location(&self) -> Option<Point> {
        cursor_location()
    }

    fn warp_pointer(&self, to: Point) -> Result<(), EventError> {
        CGDisplay::warp_mouse_cursor_position(CGPoint::new(to.x, to.y))
            .map_err(|e| EventError::EventPostingFailed(format!("warp failed: {}", e)))?;
        // Warping detaches the cursor from the mouse until reassociated.
        CGDisplay::associate_mouse_and_mouse_cursor_position(true)
            .map_err(|e| EventError::EventPostingFailed(format!("reassociate failed: {}", e)))?;
        Ok(())
    }

    fn post_mouse_event(
        &self,
        button: MouseButton,
        phase: MousePhase,
        at: Point,
    ) -> Result<(), EventError> {
        let cg_button = match button {
            MouseButton::Left => CGMouseButton::Left,
            MouseButton::Right => CGMouseButton::Right,
        };
        let event = CGEvent::new_mouse_event(
            event_source()?,
            event_type(button, phase),
            CGPoint::new(at.x, at.y),
            cg_button,
        )
        .map_err(|_| EventError::EventCreationFailed(format!("{:?} {:?}", button, phase)))?;

        event.post(CGEventTapLocation::HID);
        Ok(())
    }
}

/// Cursor location in UI space, for hover tracking.
#[derive(Debug, Default)]
pub struct CGEventPointer;

impl PointerSource for CGEventPointer {
    fn pointer_location(&self) -> Option<Point> {
        let screen = cursor_location()?;
        Some(CoordinateSpace::new(main_display_height()).to_ui_point(screen))
    }
}
