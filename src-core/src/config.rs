//! Configuration management for Stowbar.
//!
//! Handles loading and saving user configuration to platform-standard config directories:
//! - macOS: `~/Library/Application Support/stowbar/config.json`
//! - Linux: `~/.config/stowbar/config.json`

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stowbar_types::LayoutDirection;

/// How hidden icons are presented when revealed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Expand the separator so hidden icons appear in the menu bar itself
    #[default]
    MenuBar,
    /// Keep icons hidden and show captured snapshots in a floating drawer
    Drawer,
}

impl DisplayMode {
    /// Convert from string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "menu_bar" | "menubar" => Some(Self::MenuBar),
            "drawer" => Some(Self::Drawer),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MenuBar => "menu_bar",
            Self::Drawer => "drawer",
        }
    }
}

/// Hidden section behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionsConfig {
    /// Collapse automatically some time after expanding.
    #[serde(default = "default_auto_collapse_enabled")]
    pub auto_collapse_enabled: bool,
    /// Seconds to wait before auto-collapsing.
    #[serde(default = "default_auto_collapse_delay_secs")]
    pub auto_collapse_delay_secs: f64,
    /// Minimum time between two accepted toggles.
    #[serde(default = "default_toggle_debounce_ms")]
    pub toggle_debounce_ms: u64,
    /// Menu bar writing direction.
    #[serde(default)]
    pub direction: LayoutDirection,
}

fn default_auto_collapse_enabled() -> bool {
    true
}

fn default_auto_collapse_delay_secs() -> f64 {
    15.0
}

fn default_toggle_debounce_ms() -> u64 {
    250
}

impl Default for SectionsConfig {
    fn default() -> Self {
        Self {
            auto_collapse_enabled: default_auto_collapse_enabled(),
            auto_collapse_delay_secs: default_auto_collapse_delay_secs(),
            toggle_debounce_ms: default_toggle_debounce_ms(),
            direction: LayoutDirection::default(),
        }
    }
}

impl SectionsConfig {
    pub fn auto_collapse_delay(&self) -> Duration {
        Duration::from_secs_f64(self.auto_collapse_delay_secs.max(0.0))
    }

    pub fn toggle_debounce(&self) -> Duration {
        Duration::from_millis(self.toggle_debounce_ms)
    }
}

/// Hidden-region capture parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureConfig {
    /// Width of one icon cell in logical units.
    #[serde(default = "default_cell_width")]
    pub cell_width: f64,
    /// Gap between cells in logical units.
    #[serde(default = "default_cell_spacing")]
    pub cell_spacing: f64,
    /// Upper bound on icons returned by one capture.
    #[serde(default = "default_max_icons")]
    pub max_icons: usize,
    /// Time to let the bar redraw after expanding before taking the snapshot.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_cell_width() -> f64 {
    22.0
}

fn default_cell_spacing() -> f64 {
    4.0
}

fn default_max_icons() -> usize {
    50
}

fn default_settle_delay_ms() -> u64 {
    100
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            cell_width: default_cell_width(),
            cell_spacing: default_cell_spacing(),
            max_icons: default_max_icons(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl CaptureConfig {
    /// Horizontal distance from one cell's left edge to the next.
    pub fn cell_stride(&self) -> f64 {
        self.cell_width + self.cell_spacing
    }

    /// Widest hidden region worth capturing.
    pub fn max_region_width(&self) -> f64 {
        self.cell_stride() * self.max_icons as f64
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Hover-to-reveal behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoverConfig {
    /// Reveal when the pointer reaches the top of the screen.
    #[serde(default)]
    pub enabled: bool,
    /// Pointer polling interval while monitoring.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    50
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl HoverConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Icon layout settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LayoutConfig {
    /// Whether the third "always hidden" tier is in use.
    #[serde(default)]
    pub always_hidden_enabled: bool,
}

/// Presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    #[serde(default)]
    pub mode: DisplayMode,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub sections: SectionsConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub hover: HoverConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Get the path to the config file.
pub fn get_config_path() -> PathBuf {
    stowbar_types::logging::config_dir().join("config.json")
}

/// Load configuration from disk.
/// Returns default config if file doesn't exist or is invalid.
pub fn load_config() -> AppConfig {
    load_config_from(&get_config_path())
}

/// Load configuration from a specific path.
pub fn load_config_from(config_path: &Path) -> AppConfig {
    if !config_path.exists() {
        tracing::info!("No config file found, using defaults");
        return AppConfig::default();
    }

    match fs::read_to_string(config_path) {
        Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", config_path);
                config
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}. Using defaults.", e);
                AppConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read config file: {}. Using defaults.", e);
            AppConfig::default()
        }
    }
}

/// Save configuration to disk.
/// Creates the config directory if it doesn't exist.
pub fn save_config(config: &AppConfig) -> Result<(), String> {
    save_config_to(config, &get_config_path())
}

/// Save configuration to a specific path.
pub fn save_config_to(config: &AppConfig, config_path: &Path) -> Result<(), String> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    fs::write(config_path, json).map_err(|e| format!("Failed to write config file: {}", e))?;

    tracing::info!("Saved config to {:?}", config_path);
    Ok(())
}
