//! Adaptive binarization with automatic candidate selection.
//!
//! Three neighborhood sizes are tried and the sparsest plausible foreground
//! wins: rejecting noise is preferred over capturing more ink.

use image::{GrayImage, Luma};
use tracing::debug;

use super::morphology::{self, BG, FG};

pub const BLOCK_SIZES: [u32; 3] = [11, 15, 21];
pub const MEAN_OFFSET: i32 = 4;

/// Local-mean threshold with inverted polarity: foreground where the pixel is
/// at least `offset` below the mean of its `block_size` x `block_size`
/// neighborhood. Windows shrink at the image borders.
pub fn adaptive_threshold_inv(img: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }
    let r = (block_size / 2) as i64;

    // Summed-area table with a zero row/column so window sums need no
    // special-casing.
    let stride = w as usize + 1;
    let mut integral = vec![0u64; stride * (h as usize + 1)];
    for y in 0..h as usize {
        let mut row_sum = 0u64;
        for x in 0..w as usize {
            row_sum += img.get_pixel(x as u32, y as u32)[0] as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let x0 = (x as i64 - r).max(0) as usize;
            let y0 = (y as i64 - r).max(0) as usize;
            let x1 = ((x as i64 + r + 1).min(w as i64)) as usize;
            let y1 = ((y as i64 + r + 1).min(h as i64)) as usize;
            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let count = ((x1 - x0) * (y1 - y0)) as u64;
            let mean = sum as f64 / count as f64;
            let fg = (img.get_pixel(x, y)[0] as f64) <= mean - offset as f64;
            out.put_pixel(x, y, Luma([if fg { FG } else { BG }]));
        }
    }
    out
}

/// Candidate selection: the lowest strictly positive score wins, first-lowest
/// on ties. If every candidate scored zero the first one is kept — the image
/// has no surviving foreground either way.
pub(crate) fn pick_candidate(scores: &[u32]) -> usize {
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate() {
        if score > 0 && (scores[best] == 0 || score < scores[best]) {
            best = i;
        }
    }
    best
}

pub(crate) fn candidate_scores(candidates: &[GrayImage]) -> Vec<u32> {
    candidates
        .iter()
        .map(|mask| morphology::count_foreground(&morphology::open(mask, 2, 2)))
        .collect()
}

/// Binarize a normalized grayscale image, choosing among the given block
/// sizes by the sparsest-foreground rule.
pub fn binarize(img: &GrayImage, block_sizes: &[u32], offset: i32) -> GrayImage {
    let mut candidates: Vec<GrayImage> = block_sizes
        .iter()
        .map(|&size| adaptive_threshold_inv(img, size, offset))
        .collect();
    let scores = candidate_scores(&candidates);
    let chosen = pick_candidate(&scores);
    debug!(
        block_size = block_sizes[chosen],
        score = scores[chosen],
        ?scores,
        "selected threshold candidate"
    );
    candidates.swap_remove(chosen)
}
