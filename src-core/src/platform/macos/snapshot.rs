//! Screen snapshots using CGWindowListCreateImage.

use crate::platform::ScreenSnapshotter;
use core_graphics::display::{
    kCGNullWindowID, kCGWindowImageDefault, kCGWindowListOptionOnScreenOnly, CGRect,
    CGWindowListCreateImage,
};
use core_graphics::geometry::{CGPoint, CGSize};
use core_graphics::image::CGImage;
use foreign_types::ForeignType;
use image::RgbaImage;
use stowbar_types::Rect;
use tracing::warn;

/// Convert a CGImage (BGRA, premultiplied first, little endian) to RGBA.
fn cgimage_to_rgba(image: &CGImage) -> Option<RgbaImage> {
    let width = image.width() as u32;
    let height = image.height() as u32;
    if image.bits_per_pixel() != 32 {
        warn!("Unexpected bits per pixel: {} (expected 32)", image.bits_per_pixel());
        return None;
    }

    let bytes_per_row = image.bytes_per_row();
    let raw = image.data();
    let stride = width as usize * 4;
    let mut rgba = Vec::with_capacity(stride * height as usize);

    for row in 0..height as usize {
        let start = row * bytes_per_row;
        let Some(src) = raw.get(start..start + stride) else {
            break;
        };
        for px in src.chunks_exact(4) {
            rgba.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }
    }

    RgbaImage::from_raw(width, height, rgba)
}

/// Composites every on-screen window inside a rectangle.
#[derive(Debug, Default)]
pub struct WindowListSnapshotter;

impl ScreenSnapshotter for WindowListSnapshotter {
    fn snapshot(&self, rect: Rect) -> Option<RgbaImage> {
        let bounds = CGRect::new(
            &CGPoint::new(rect.min_x(), rect.min_y()),
            &CGSize::new(rect.width(), rect.height()),
        );

        let image_ref = unsafe {
            CGWindowListCreateImage(
                bounds,
                kCGWindowListOptionOnScreenOnly,
                kCGNullWindowID,
                kCGWindowImageDefault,
            )
        };
        if image_ref.is_null() {
            return None;
        }

        // Safety: CGWindowListCreateImage returns a CGImageRef that we own
        let image = unsafe { CGImage::from_ptr(image_ref) };
        cgimage_to_rgba(&image)
    }
}
