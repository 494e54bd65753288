//! Slice a hidden-region snapshot into per-icon cells.

use super::types::CapturedIcon;
use crate::config::CaptureConfig;
use image::{imageops, Rgba, RgbaImage};
use stowbar_types::Rect;

/// Largest per-channel difference still considered the same color.
const UNIFORM_TOLERANCE: u8 = 6;

/// Cut `image` (a snapshot of `region`) into fixed-width cells.
///
/// Cells start at the region's left edge and advance by the configured
/// stride. Cells that do not fit entirely are dropped, as are cells with
/// uniform pixels. At most `max_icons` icons are returned, indexed
/// contiguously left to right.
pub fn slice_icons(image: &RgbaImage, region: Rect, config: &CaptureConfig) -> Vec<CapturedIcon> {
    if region.width() <= 0.0 || image.width() == 0 || image.height() == 0 {
        return Vec::new();
    }
    let scale = image.width() as f64 / region.width();
    let stride = config.cell_stride();
    if config.cell_width <= 0.0 || stride <= 0.0 {
        return Vec::new();
    }

    let cell_px = (config.cell_width * scale).round() as u32;
    let mut icons = Vec::new();
    let mut offset = 0.0;

    while offset + config.cell_width <= region.width() && icons.len() < config.max_icons {
        let x_px = (offset * scale).round() as u32;
        if cell_px == 0 || x_px + cell_px > image.width() {
            break;
        }

        let cell = imageops::crop_imm(image, x_px, 0, cell_px, image.height()).to_image();
        if !is_uniform(&cell) {
            icons.push(CapturedIcon {
                index: icons.len(),
                image: cell,
                source_rect: Rect::new(
                    region.min_x() + offset,
                    region.min_y(),
                    config.cell_width,
                    region.height(),
                ),
                scale_factor: scale,
            });
        }
        offset += stride;
    }

    icons
}

/// Whether every pixel matches the first within [`UNIFORM_TOLERANCE`].
pub fn is_uniform(image: &RgbaImage) -> bool {
    let mut pixels = image.pixels();
    let Some(first) = pixels.next().copied() else {
        return true;
    };
    pixels.all(|pixel| close(&first, pixel))
}

fn close(a: &Rgba<u8>, b: &Rgba<u8>) -> bool {
    a.0.iter()
        .zip(b.0.iter())
        .all(|(x, y)| x.abs_diff(*y) <= UNIFORM_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn test_eighty_cells_capped_at_fifty() {
        let config = CaptureConfig::default();
        let region = Rect::new(0.0, 876.0, 80.0 * config.cell_stride(), 24.0);
        let image = checkerboard((region.width() * 2.0) as u32, 48);

        let icons = slice_icons(&image, region, &config);
        assert_eq!(icons.len(), 50);
        for (i, pair) in icons.windows(2).enumerate() {
            assert_eq!(pair[0].index, i);
            assert!(pair[0].source_rect.min_x() < pair[1].source_rect.min_x());
        }
        assert_eq!(icons[0].image.dimensions(), (44, 48));
        assert_eq!(icons[1].source_rect.min_x(), 26.0);
        assert_eq!(icons[0].scale_factor, 2.0);
    }

    #[test]
    fn test_uniform_cells_are_skipped_and_indexes_stay_contiguous() {
        let config = CaptureConfig::default();
        let region = Rect::new(100.0, 876.0, 3.0 * config.cell_stride(), 24.0);
        let mut image = RgbaImage::from_pixel(78, 24, Rgba([40, 40, 40, 255]));
        // Content only in the first and third cells.
        image.put_pixel(5, 5, Rgba([255, 255, 255, 255]));
        image.put_pixel(60, 10, Rgba([255, 255, 255, 255]));

        let icons = slice_icons(&image, region, &config);
        assert_eq!(icons.len(), 2);
        assert_eq!(icons[0].index, 0);
        assert_eq!(icons[1].index, 1);
        assert_eq!(icons[1].source_rect.min_x(), 152.0);
    }

    #[test]
    fn test_partial_trailing_cell_is_dropped() {
        let config = CaptureConfig::default();
        // One full cell plus 10 units of a second.
        let region = Rect::new(0.0, 0.0, 36.0, 24.0);
        let icons = slice_icons(&checkerboard(36, 24), region, &config);
        assert_eq!(icons.len(), 1);
    }

    #[test]
    fn test_degenerate_input_yields_nothing() {
        let config = CaptureConfig::default();
        assert!(slice_icons(&checkerboard(10, 10), Rect::new(0.0, 0.0, 0.0, 24.0), &config).is_empty());
        assert!(slice_icons(&RgbaImage::new(0, 0), Rect::new(0.0, 0.0, 50.0, 24.0), &config).is_empty());
    }

    #[test]
    fn test_is_uniform_tolerates_noise() {
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([100, 100, 100, 255]));
        image.put_pixel(1, 1, Rgba([103, 98, 100, 255]));
        assert!(is_uniform(&image));
        image.put_pixel(2, 2, Rgba([140, 100, 100, 255]));
        assert!(!is_uniform(&image));
    }
}
