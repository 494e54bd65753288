//! Shared types for displays, permissions and icon layout.

use crate::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Default menu bar height in logical units when the OS does not report one.
pub const DEFAULT_MENU_BAR_HEIGHT: f64 = 24.0;

/// Information about a connected display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    /// Unique identifier (platform-specific)
    pub id: String,
    /// Display name for UI
    pub name: String,
    /// Display bounds in UI space (logical units)
    pub frame: Rect,
    /// Whether this is the primary display (the one hosting the menu bar origin)
    pub is_primary: bool,
    /// Scale factor (e.g., 2.0 for Retina displays)
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    /// Height of the menu bar on this display
    #[serde(default = "default_menu_bar_height")]
    pub menu_bar_height: f64,
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_menu_bar_height() -> f64 {
    DEFAULT_MENU_BAR_HEIGHT
}

impl DisplayInfo {
    /// The strip along the top edge of this display occupied by the menu bar.
    pub fn menu_bar_frame(&self) -> Rect {
        Rect::new(
            self.frame.min_x(),
            self.frame.max_y() - self.menu_bar_height,
            self.frame.width(),
            self.menu_bar_height,
        )
    }
}

/// Find the primary display in a list, falling back to the first one.
pub fn primary_display(displays: &[DisplayInfo]) -> Option<&DisplayInfo> {
    displays
        .iter()
        .find(|d| d.is_primary)
        .or_else(|| displays.first())
}

/// Find the display whose frame contains `point`.
pub fn display_containing(displays: &[DisplayInfo], point: Point) -> Option<&DisplayInfo> {
    displays.iter().find(|d| d.frame.contains(point))
}

/// OS capability the core depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionType {
    /// Posting synthetic input events (Accessibility)
    Accessibility,
    /// Reading other applications' pixels (Screen Recording)
    ScreenRecording,
}

impl PermissionType {
    /// Every permission type, in prompt order.
    pub const ALL: [PermissionType; 2] = [PermissionType::Accessibility, PermissionType::ScreenRecording];

    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "accessibility" => Some(Self::Accessibility),
            "screen_recording" | "screenrecording" | "screen-recording" => {
                Some(Self::ScreenRecording)
            }
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accessibility => "accessibility",
            Self::ScreenRecording => "screen_recording",
        }
    }

    /// Get display name for this permission.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Accessibility => "Accessibility",
            Self::ScreenRecording => "Screen Recording",
        }
    }
}

/// Current grant status of a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Not yet polled
    #[default]
    Unknown,
}

impl PermissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Menu bar section an icon is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    /// Always shown in the menu bar
    Visible,
    /// Shown when the hidden region is expanded
    Hidden,
    /// Only reachable through the drawer
    AlwaysHidden,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Visible, Section::Hidden, Section::AlwaysHidden];

    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "visible" => Some(Self::Visible),
            "hidden" => Some(Self::Hidden),
            "alwayshidden" | "always_hidden" | "always-hidden" => Some(Self::AlwaysHidden),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::AlwaysHidden => "alwaysHidden",
        }
    }
}

/// Persisted section/order assignment for one menu bar icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsLayoutItem {
    /// Stable identifier of the icon (owning app bundle + item name)
    pub icon_identifier: String,
    pub section: Section,
    /// Position within the section, contiguous from 0
    pub order: u32,
}

impl SettingsLayoutItem {
    pub fn new(icon_identifier: impl Into<String>, section: Section, order: u32) -> Self {
        Self {
            icon_identifier: icon_identifier.into(),
            section,
            order,
        }
    }
}

/// Writing direction of the menu bar, which decides where the hidden region lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutDirection {
    /// Status items grow leftward from the right edge; hidden icons sit left of the separator
    #[default]
    LeftToRight,
    /// Mirrored layout; hidden icons sit right of the separator
    RightToLeft,
}
