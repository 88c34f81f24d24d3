//! Digit location: candidate strategies over the binary mask, count-based
//! reconciliation, an edge-based fallback, geometric validation and the final
//! left-to-right ordering.

use image::{GrayImage, Luma};
use imageproc::edges::canny;
use imageproc::filter::median_filter;
use imageproc::region_labelling::{Connectivity, connected_components};
use std::collections::HashMap;
use tracing::debug;

use super::morphology;
use crate::models::Region;

/// Default floor below which components are treated as noise.
pub const MIN_REGION_AREA: u32 = 80;
/// Default region counts a primary strategy accepts outright.
pub const ACCEPTED_COUNTS: std::ops::RangeInclusive<usize> = 1..=10;

const MIN_REGION_HEIGHT: u32 = 8;
const ASPECT_RANGE: std::ops::RangeInclusive<f32> = 0.25..=1.5;

/// Inputs and tunables available to every locator strategy. `mask` is the raw
/// binarized mask (pre-cleaning, so strategies control their own denoising);
/// `normalized` is the grayscale image the mask was thresholded from.
pub struct LocatorContext<'a> {
    pub mask: &'a GrayImage,
    pub normalized: &'a GrayImage,
    pub min_area: u32,
    pub accepted_counts: std::ops::RangeInclusive<usize>,
}

/// One way of proposing digit regions. Strategies are tried in priority
/// order; `accepts` is the per-strategy acceptance predicate on the number of
/// regions found.
pub trait LocatorStrategy {
    fn name(&self) -> &'static str;
    fn candidates(&self, ctx: &LocatorContext<'_>) -> Vec<Region>;
    fn accepts(&self, count: usize, ctx: &LocatorContext<'_>) -> bool {
        ctx.accepted_counts.contains(&count)
    }
}

/// Median-filter the mask (window 3) before component extraction.
pub struct MedianBlurStrategy;

impl LocatorStrategy for MedianBlurStrategy {
    fn name(&self) -> &'static str {
        "median-blur"
    }

    fn candidates(&self, ctx: &LocatorContext<'_>) -> Vec<Region> {
        let denoised = median_filter(ctx.mask, 1, 1);
        regions_from_mask(&denoised, ctx.min_area)
    }
}

/// 2x2-open the mask before component extraction.
pub struct OpeningStrategy;

impl LocatorStrategy for OpeningStrategy {
    fn name(&self) -> &'static str {
        "opening"
    }

    fn candidates(&self, ctx: &LocatorContext<'_>) -> Vec<Region> {
        let denoised = morphology::open(ctx.mask, 2, 2);
        regions_from_mask(&denoised, ctx.min_area)
    }
}

/// Last resort: Canny edges over the normalized grayscale image, thickened by
/// one 2x2 dilation. Catches faint strokes the thresholding missed entirely.
pub struct EdgeStrategy;

impl LocatorStrategy for EdgeStrategy {
    fn name(&self) -> &'static str {
        "edge-fallback"
    }

    fn candidates(&self, ctx: &LocatorContext<'_>) -> Vec<Region> {
        let edges = canny(ctx.normalized, 30.0, 200.0);
        let thick = morphology::dilate(&edges, 2, 2);
        regions_from_mask(&thick, ctx.min_area)
    }
}

/// Extract connected foreground components (8-connectivity) from a binary
/// mask, keeping those with area strictly above `min_area`.
pub fn regions_from_mask(mask: &GrayImage, min_area: u32) -> Vec<Region> {
    let labeled = connected_components(mask, Connectivity::Eight, Luma([0]));

    let mut bounds: HashMap<u32, (u32, u32, u32, u32, u32)> = HashMap::new();
    for (x, y, label) in labeled.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue;
        }
        bounds
            .entry(label)
            .and_modify(|(min_x, min_y, max_x, max_y, count)| {
                *min_x = (*min_x).min(x);
                *min_y = (*min_y).min(y);
                *max_x = (*max_x).max(x);
                *max_y = (*max_y).max(y);
                *count += 1;
            })
            .or_insert((x, y, x, y, 1));
    }

    bounds
        .into_iter()
        .map(|(label, (min_x, min_y, max_x, max_y, count))| Region {
            label,
            min_x,
            min_y,
            max_x,
            max_y,
            pixel_count: count,
        })
        .filter(|r| r.pixel_count > min_area)
        .collect()
}

fn geometrically_plausible(region: &Region) -> bool {
    ASPECT_RANGE.contains(&region.aspect_ratio()) && region.height() >= MIN_REGION_HEIGHT
}

/// Run the locator strategies, reconcile their candidate sets and return the
/// final regions sorted left-to-right. An empty result means the image holds
/// nothing recognizable; this is a sentinel, not a failure.
pub fn locate_digits(
    mask: &GrayImage,
    normalized: &GrayImage,
    min_area: u32,
    accepted_counts: std::ops::RangeInclusive<usize>,
) -> Vec<Region> {
    let ctx = LocatorContext {
        mask,
        normalized,
        min_area,
        accepted_counts,
    };

    let primaries: [&dyn LocatorStrategy; 2] = [&MedianBlurStrategy, &OpeningStrategy];
    let sets: Vec<Vec<Region>> = primaries.iter().map(|s| s.candidates(&ctx)).collect();
    for (strategy, set) in primaries.iter().zip(&sets) {
        debug!(strategy = strategy.name(), regions = set.len(), "locator candidates");
    }

    // First strategy whose count is acceptable wins; otherwise whichever
    // found more, ties toward the earlier one.
    let chosen = match primaries
        .iter()
        .zip(&sets)
        .position(|(s, set)| s.accepts(set.len(), &ctx))
    {
        Some(i) => sets[i].clone(),
        None => {
            let mut best = 0;
            for (i, set) in sets.iter().enumerate() {
                if set.len() > sets[best].len() {
                    best = i;
                }
            }
            sets[best].clone()
        }
    };

    let mut candidates = if chosen.is_empty() {
        let fallback = EdgeStrategy.candidates(&ctx);
        debug!(regions = fallback.len(), "edge fallback candidates");
        fallback
    } else {
        chosen
    };

    // Keep geometrically plausible boxes; if that rejects everything, accept
    // the implausible set rather than returning nothing.
    let validated: Vec<Region> = candidates
        .iter()
        .filter(|r| geometrically_plausible(r))
        .cloned()
        .collect();
    if !validated.is_empty() {
        candidates = validated;
    }

    // Mandatory, final: the rest of the pipeline assumes reading order.
    candidates.sort_by_key(|r| r.min_x);
    candidates
}
