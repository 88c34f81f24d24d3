//! Glyph normalization: crop a located region out of the binary mask and
//! re-center it on the canonical classifier canvas.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use tracing::{debug, warn};

use crate::models::Region;

/// Side length of the canvas the classifier expects.
pub const GLYPH_SIZE: u32 = 28;

const CROP_PAD: u32 = 2;
/// Gray levels above this survive the final re-threshold.
const REBINARIZE_THRESHOLD: u8 = 90;

fn foreground_ratio(crop: &GrayImage) -> f32 {
    let total = (crop.width() as u64) * (crop.height() as u64);
    if total == 0 {
        return 0.0;
    }
    let fg = crop.pixels().filter(|p| p[0] > 0).count() as u64;
    fg as f32 / total as f32
}

/// Aspect-dependent target dimensions: tall glyphs ("1") keep height 20, wide
/// ones keep width 20, near-square glyphs become 18x18.
fn target_dimensions(region: &Region) -> (u32, u32) {
    let aspect = region.aspect_ratio();
    if aspect < 0.8 {
        let w = ((20.0 * aspect).round() as u32).max(8);
        (w, 20)
    } else if aspect > 1.2 {
        let h = ((20.0 / aspect).round() as u32).max(8);
        (20, h)
    } else {
        (18, 18)
    }
}

/// Cut `region` out of the binary mask and normalize it into a fresh
/// `GLYPH_SIZE` x `GLYPH_SIZE` binary canvas. Returns `None` when the region
/// cannot produce a usable glyph; callers drop such regions and continue.
pub fn normalize_glyph(mask: &GrayImage, region: &Region) -> Option<GrayImage> {
    let (img_w, img_h) = mask.dimensions();
    let (x, y, w, h) = region.padded_box(CROP_PAD, img_w, img_h);
    if w == 0 || h == 0 {
        warn!(label = region.label, "skipping region with empty crop");
        return None;
    }
    let crop = imageops::crop_imm(mask, x, y, w, h).to_image();

    // Dense glyphs already fill their box and would get margin class 6 rather
    // than 8; recorded for diagnostics, the geometry below is aspect-driven.
    let ratio = foreground_ratio(&crop);
    let margin_class = if ratio > 0.5 { 6 } else { 8 };

    let (target_w, target_h) = target_dimensions(region);
    if target_w == 0 || target_h == 0 {
        warn!(
            label = region.label,
            target_w, target_h, "skipping region with degenerate resize target"
        );
        return None;
    }
    debug!(
        label = region.label,
        ratio, margin_class, target_w, target_h, "normalizing glyph"
    );

    // Triangle filtering averages source pixels when shrinking, which keeps
    // thin strokes from aliasing away.
    let resized = imageops::resize(&crop, target_w, target_h, FilterType::Triangle);

    let mut canvas = GrayImage::from_pixel(GLYPH_SIZE, GLYPH_SIZE, Luma([0]));
    let offset_x = (GLYPH_SIZE - target_w.min(GLYPH_SIZE)) / 2;
    let offset_y = (GLYPH_SIZE - target_h.min(GLYPH_SIZE)) / 2;
    imageops::overlay(&mut canvas, &resized, offset_x as i64, offset_y as i64);

    // Resizing introduces gray levels; snap back to a binary glyph.
    for pixel in canvas.pixels_mut() {
        pixel[0] = if pixel[0] > REBINARIZE_THRESHOLD { 255 } else { 0 };
    }
    Some(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with_block(w: u32, h: u32, x0: u32, y0: u32, bw: u32, bh: u32) -> (GrayImage, Region) {
        let mut mask = GrayImage::from_pixel(w, h, Luma([0]));
        for y in y0..y0 + bh {
            for x in x0..x0 + bw {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let region = Region {
            label: 1,
            min_x: x0,
            min_y: y0,
            max_x: x0 + bw - 1,
            max_y: y0 + bh - 1,
            pixel_count: bw * bh,
        };
        (mask, region)
    }

    #[test]
    fn glyph_is_always_canvas_sized_and_binary() {
        let (mask, region) = mask_with_block(100, 60, 30, 10, 20, 30);
        let glyph = normalize_glyph(&mask, &region).unwrap();
        assert_eq!(glyph.dimensions(), (GLYPH_SIZE, GLYPH_SIZE));
        assert!(glyph.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert!(glyph.pixels().any(|p| p[0] == 255));
    }

    #[test]
    fn square_glyph_content_is_confined_to_centered_18x18() {
        let (mask, region) = mask_with_block(80, 80, 20, 20, 20, 20);
        let glyph = normalize_glyph(&mask, &region).unwrap();
        let lo = (GLYPH_SIZE - 18) / 2;
        let hi = lo + 18;
        for (x, y, p) in glyph.enumerate_pixels() {
            if p[0] == 255 {
                assert!(x >= lo && x < hi && y >= lo && y < hi);
            }
        }
    }

    #[test]
    fn tall_glyph_gets_narrow_target() {
        // Aspect 0.25: width floors at max(8, round(20 * 0.25)) = 8.
        let (mask, region) = mask_with_block(60, 80, 20, 10, 10, 40);
        let glyph = normalize_glyph(&mask, &region).unwrap();
        let x_lo = (GLYPH_SIZE - 8) / 2;
        let x_hi = x_lo + 8;
        let y_lo = (GLYPH_SIZE - 20) / 2;
        let y_hi = y_lo + 20;
        for (x, y, p) in glyph.enumerate_pixels() {
            if p[0] == 255 {
                assert!(x >= x_lo && x < x_hi, "x={} outside [{}, {})", x, x_lo, x_hi);
                assert!(y >= y_lo && y < y_hi);
            }
        }
    }

    #[test]
    fn wide_glyph_gets_short_target() {
        // Aspect 2.0: height floors at max(8, round(20 / 2.0)) = 10.
        let (mask, region) = mask_with_block(80, 40, 10, 10, 30, 15);
        let glyph = normalize_glyph(&mask, &region).unwrap();
        let y_lo = (GLYPH_SIZE - 10) / 2;
        let y_hi = y_lo + 10;
        for (x, y, p) in glyph.enumerate_pixels() {
            if p[0] == 255 {
                assert!(y >= y_lo && y < y_hi);
            }
        }
    }

    #[test]
    fn border_touching_region_never_crops_out_of_bounds() {
        let (mask, region) = mask_with_block(50, 40, 0, 0, 15, 30);
        // Must not panic despite the padding clamp at (0, 0).
        let glyph = normalize_glyph(&mask, &region).unwrap();
        assert_eq!(glyph.dimensions(), (GLYPH_SIZE, GLYPH_SIZE));
    }
}
