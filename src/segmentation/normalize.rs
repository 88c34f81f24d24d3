//! Grayscale normalization: global contrast correction, edge-preserving
//! denoising and local contrast equalization.

use image::{GrayImage, Luma};
use imageproc::filter::bilateral_filter;
use tracing::debug;

const DARK_MEAN: f32 = 80.0;
const BRIGHT_MEAN: f32 = 200.0;

pub fn mean_intensity(img: &GrayImage) -> f32 {
    let count = (img.width() as u64) * (img.height() as u64);
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = img.pixels().map(|p| p[0] as u64).sum();
    sum as f32 / count as f32
}

/// Linear gain/offset correction for under- or over-exposed images. Images
/// with a mid-range mean pass through untouched.
pub fn stretch_contrast(img: &GrayImage) -> GrayImage {
    let mean = mean_intensity(img);
    let (gain, offset) = if mean < DARK_MEAN {
        (1.5f32, 30.0f32)
    } else if mean > BRIGHT_MEAN {
        (0.8f32, -20.0f32)
    } else {
        return img.clone();
    };

    debug!(mean, gain, offset, "stretching contrast");
    let mut out = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let v = (pixel[0] as f32 * gain + offset).clamp(0.0, 255.0);
        out.put_pixel(x, y, Luma([v.round() as u8]));
    }
    out
}

/// Contrast-limited local histogram equalization over a `grid` x `grid`
/// arrangement of tiles, with bilinear interpolation between neighboring tile
/// mappings to avoid visible tile seams.
pub fn equalize_local_contrast(img: &GrayImage, grid: u32, clip_limit: f32) -> GrayImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }
    let grid_x = grid.clamp(1, w);
    let grid_y = grid.clamp(1, h);

    // One clipped-histogram lookup table per tile.
    let mut luts = vec![[0u8; 256]; (grid_x * grid_y) as usize];
    for ty in 0..grid_y {
        for tx in 0..grid_x {
            let x0 = tx * w / grid_x;
            let x1 = (tx + 1) * w / grid_x;
            let y0 = ty * h / grid_y;
            let y1 = (ty + 1) * h / grid_y;

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[img.get_pixel(x, y)[0] as usize] += 1;
                }
            }
            let area = (x1 - x0) * (y1 - y0);

            // Clip the histogram and spread the excess evenly so flat regions
            // are not over-amplified.
            let limit = ((clip_limit * area as f32 / 256.0).max(1.0)) as u32;
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > limit {
                    excess += *bin - limit;
                    *bin = limit;
                }
            }
            // The whole excess goes back: an even share per bin, then the
            // remainder one count per bin. The histogram keeps its total mass
            // of `area`, so the CDF scale below still reaches 255. Truncating
            // the remainder away would gut small tiles (area < 256), where the
            // even share is zero and the mapped range collapses.
            let bonus = excess / 256;
            for bin in hist.iter_mut() {
                *bin += bonus;
            }
            let residual = (excess % 256) as usize;
            for bin in hist.iter_mut().take(residual) {
                *bin += 1;
            }

            let lut = &mut luts[(ty * grid_x + tx) as usize];
            let scale = 255.0 / area as f32;
            let mut cumulative = 0u32;
            for (value, bin) in hist.iter().enumerate() {
                cumulative += bin;
                lut[value] = (cumulative as f32 * scale).min(255.0).round() as u8;
            }
        }
    }

    let mut out = GrayImage::new(w, h);
    for (x, y, pixel) in img.enumerate_pixels() {
        let v = pixel[0] as usize;

        // Fractional tile coordinates of this pixel, relative to tile centers.
        let fx = ((x as f32 + 0.5) * grid_x as f32 / w as f32 - 0.5).max(0.0);
        let fy = ((y as f32 + 0.5) * grid_y as f32 / h as f32 - 0.5).max(0.0);
        let tx0 = (fx as u32).min(grid_x - 1);
        let ty0 = (fy as u32).min(grid_y - 1);
        let tx1 = (tx0 + 1).min(grid_x - 1);
        let ty1 = (ty0 + 1).min(grid_y - 1);
        let wx = fx - tx0 as f32;
        let wy = fy - ty0 as f32;

        let top = luts[(ty0 * grid_x + tx0) as usize][v] as f32 * (1.0 - wx)
            + luts[(ty0 * grid_x + tx1) as usize][v] as f32 * wx;
        let bottom = luts[(ty1 * grid_x + tx0) as usize][v] as f32 * (1.0 - wx)
            + luts[(ty1 * grid_x + tx1) as usize][v] as f32 * wx;
        let blended = top * (1.0 - wy) + bottom * wy;
        out.put_pixel(x, y, Luma([blended.clamp(0.0, 255.0).round() as u8]));
    }
    out
}

/// Full normalization pass: contrast stretch, bilateral smoothing, local
/// contrast equalization. Output has the same dimensions as the input.
pub fn normalize(img: &GrayImage) -> GrayImage {
    let stretched = stretch_contrast(img);
    let smoothed = bilateral_filter(&stretched, 9, 75.0, 75.0);
    equalize_local_contrast(&smoothed, 8, 2.0)
}
