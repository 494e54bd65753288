//! Captured icon types and image helpers.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use image::{ImageFormat, RgbaImage};
use serde::Serialize;
use std::io::Cursor;
use stowbar_types::{Point, Rect};

/// Snapshot of one hidden icon.
#[derive(Debug, Clone)]
pub struct CapturedIcon {
    /// Position among the captured icons, left to right, starting at 0
    pub index: usize,
    /// RGBA pixels in device resolution
    pub image: RgbaImage,
    /// Where the icon actually sits, in UI space (possibly off-screen)
    pub source_rect: Rect,
    /// Device pixels per logical unit
    pub scale_factor: f64,
}

impl CapturedIcon {
    /// Point to click to activate the real icon. UI space.
    pub fn click_point(&self) -> Point {
        self.source_rect.center()
    }

    /// Encode as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, String> {
        encode_png(&self.image)
    }

    /// Encode as a `data:image/png;base64,...` URL for the UI layer.
    pub fn to_data_url(&self) -> Result<String, String> {
        let png = self.to_png()?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }

    pub fn info(&self) -> CapturedIconInfo {
        CapturedIconInfo {
            index: self.index,
            x: self.source_rect.min_x(),
            y: self.source_rect.min_y(),
            width: self.source_rect.width(),
            height: self.source_rect.height(),
            pixel_width: self.image.width(),
            pixel_height: self.image.height(),
            scale_factor: self.scale_factor,
        }
    }
}

/// Serializable description of a captured icon, without pixels.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedIconInfo {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub scale_factor: f64,
}

/// Result of one hidden-region capture.
#[derive(Debug, Clone)]
pub struct MenuBarCaptureResult {
    /// Icons ordered by ascending x
    pub icons: Vec<CapturedIcon>,
    pub captured_at: DateTime<Utc>,
    /// The rasterized region, UI space
    pub region: Rect,
}

impl MenuBarCaptureResult {
    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    pub fn icon(&self, index: usize) -> Option<&CapturedIcon> {
        self.icons.iter().find(|icon| icon.index == index)
    }
}

/// Encode an RGBA image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, String> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| format!("Failed to encode PNG: {}", e))?;
    Ok(bytes)
}

/// Lay icons side by side in one image, `spacing` pixels apart.
///
/// Returns `None` for an empty list rather than an empty canvas.
pub fn composite_image(icons: &[CapturedIcon], spacing: u32) -> Option<RgbaImage> {
    if icons.is_empty() {
        return None;
    }

    let gaps = spacing * (icons.len() as u32 - 1);
    let width = icons.iter().map(|icon| icon.image.width()).sum::<u32>() + gaps;
    let height = icons.iter().map(|icon| icon.image.height()).max().unwrap_or(0);
    if width == 0 || height == 0 {
        return None;
    }

    let mut canvas = RgbaImage::new(width, height);
    let mut x = 0i64;
    for icon in icons {
        image::imageops::replace(&mut canvas, &icon.image, x, 0);
        x += icon.image.width() as i64 + spacing as i64;
    }
    Some(canvas)
}
