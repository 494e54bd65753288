//! Error types for the menu bar core.
//!
//! Every error here is recoverable: a gated operation is blocked, a capture
//! comes back empty or a forwarded click fails once. None of them leave a
//! component in an inconsistent state.

use stowbar_types::{PermissionType, Point};
use thiserror::Error;

/// Error type for hidden-region capture.
///
/// `Clone` so a single in-flight capture result can be handed to every caller
/// that joined it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    /// Screen recording permission is not granted
    #[error("Screen recording permission required")]
    PermissionDenied,
    /// The hidden region could not be determined (no separator frame or display)
    #[error("Menu bar not found: {0}")]
    MenuBarNotFound(String),
    /// The OS returned no pixels for the requested rectangle
    #[error("Capture returned no image")]
    CaptureFailedNoImage,
    /// The capture rectangle has a non-positive dimension
    #[error("Invalid capture region: {width}x{height}")]
    InvalidRegion { width: f64, height: f64 },
    /// The region contains no distinguishable icons
    #[error("No menu bar items found in the hidden region")]
    NoMenuBarItems,
    /// The blocking capture task was cancelled or panicked
    #[error("Capture cancelled")]
    Cancelled,
}

/// Error type for synthetic input forwarding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    /// Accessibility permission is not granted
    #[error("Accessibility permission required to forward clicks")]
    AccessibilityNotGranted,
    /// The point is outside every display and outside the menu bar strip
    #[error("Invalid coordinates: ({}, {})", .0.x, .0.y)]
    InvalidCoordinates(Point),
    /// The OS refused to create the event
    #[error("Failed to create input event: {0}")]
    EventCreationFailed(String),
    /// The OS refused to post the event
    #[error("Failed to post input event: {0}")]
    EventPostingFailed(String),
}

/// Error type for bar placement (status item) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    /// The OS could not create the control item
    #[error("Failed to create control item {0}")]
    CreationFailed(String),
    /// The referenced control item does not exist
    #[error("Unknown control item {0}")]
    UnknownItem(String),
    /// The requested length is not a finite positive number
    #[error("Invalid control item length: {0}")]
    InvalidLength(f64),
    /// Not on the UI thread or no UI session available
    #[error("Bar placement unavailable: {0}")]
    Unavailable(String),
}

/// Error type for permission requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PermissionError {
    /// A gated operation needs a permission that is not granted
    #[error("{} permission required", .0.display_name())]
    NotGranted(PermissionType),
    /// The consent API is not available on this platform
    #[error("Permission API unavailable: {0}")]
    Unavailable(String),
}

/// Error type for the settings key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Settings store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Settings store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error type for layout reorder operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// No item with this identifier exists
    #[error("Unknown icon identifier: {0}")]
    UnknownItem(String),
    /// An item with this identifier already exists
    #[error("Duplicate icon identifier: {0}")]
    DuplicateItem(String),
}

impl From<CaptureError> for String {
    fn from(err: CaptureError) -> Self {
        err.to_string()
    }
}

impl From<EventError> for String {
    fn from(err: EventError) -> Self {
        err.to_string()
    }
}

impl From<PlacementError> for String {
    fn from(err: PlacementError) -> Self {
        err.to_string()
    }
}

impl From<PermissionError> for String {
    fn from(err: PermissionError) -> Self {
        err.to_string()
    }
}

impl From<StoreError> for String {
    fn from(err: StoreError) -> Self {
        err.to_string()
    }
}

impl From<LayoutError> for String {
    fn from(err: LayoutError) -> Self {
        err.to_string()
    }
}
