//! The segmentation pipeline: normalization, binarization, cleaning, digit
//! location and glyph normalization, sequenced by [`RecognitionPipeline`].

pub mod binarize;
pub mod glyph;
pub mod locate;
pub mod morphology;
pub mod normalize;

use image::{GrayImage, ImageReader};
use std::path::Path;
use tracing::{debug, warn};

use crate::classify::DigitClassifier;
use crate::errors::RecognitionError;
use crate::models::{DigitResult, RecognitionResult, Region};

/// Load an image from disk as grayscale. Decode failures become
/// [`RecognitionError::ImageRead`]; nothing downstream runs after one.
pub fn load_grayscale(path: &Path) -> Result<GrayImage, RecognitionError> {
    let img = ImageReader::open(path)
        .map_err(|e| RecognitionError::ImageRead(e.to_string()))?
        .decode()
        .map_err(|e| RecognitionError::ImageRead(e.to_string()))?;
    Ok(img.to_luma8())
}

/// Sequences the segmentation stages and the external classifier into one
/// recognition call. Holds the stage tunables but no mutable state, so a
/// single instance may serve concurrent calls on independently owned images.
pub struct RecognitionPipeline {
    // Segmentation parameters
    pub block_sizes: [u32; 3],
    pub mean_offset: i32,
    pub min_region_area: u32,
    pub accepted_counts: std::ops::RangeInclusive<usize>,
}

impl RecognitionPipeline {
    pub fn new() -> Self {
        Self {
            block_sizes: binarize::BLOCK_SIZES,
            mean_offset: binarize::MEAN_OFFSET,
            min_region_area: locate::MIN_REGION_AREA,
            accepted_counts: locate::ACCEPTED_COUNTS,
        }
    }

    fn check_input(&self, img: &GrayImage, stage: &'static str) -> Result<(), RecognitionError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(RecognitionError::Processing {
                stage,
                message: "empty image buffer".to_string(),
            });
        }
        Ok(())
    }

    /// Normalized grayscale for an input image (stage accessor).
    pub fn normalized(&self, img: &GrayImage) -> Result<GrayImage, RecognitionError> {
        self.check_input(img, "normalize")?;
        Ok(normalize::normalize(img))
    }

    /// Raw (uncleaned) binary mask for an input image (stage accessor).
    pub fn binarized(&self, img: &GrayImage) -> Result<GrayImage, RecognitionError> {
        let normalized = self.normalized(img)?;
        Ok(binarize::binarize(&normalized, &self.block_sizes, self.mean_offset))
    }

    /// Ordered digit regions for an input image, without touching the
    /// classifier. An empty set is reported as [`RecognitionError::NoDigitsFound`].
    pub fn locate(&self, img: &GrayImage) -> Result<Vec<Region>, RecognitionError> {
        let normalized = self.normalized(img)?;
        let mask = binarize::binarize(&normalized, &self.block_sizes, self.mean_offset);
        let regions = locate::locate_digits(
            &mask,
            &normalized,
            self.min_region_area,
            self.accepted_counts.clone(),
        );
        if regions.is_empty() {
            return Err(RecognitionError::NoDigitsFound);
        }
        Ok(regions)
    }

    /// Run the full pipeline: segment `img` into glyphs, classify each one,
    /// and assemble the recognized number in left-to-right order.
    pub fn recognize(
        &self,
        img: &GrayImage,
        classifier: &dyn DigitClassifier,
    ) -> Result<RecognitionResult, RecognitionError> {
        let normalized = self.normalized(img)?;
        let mask = binarize::binarize(&normalized, &self.block_sizes, self.mean_offset);

        // The cleaned mask is deliberately not the crop/locate source: the
        // locator strategies do their own light denoising over the raw mask,
        // and glyph crops keep the small-scale detail morphology removes.
        let cleaned = morphology::clean(&mask);
        debug!(
            raw_foreground = morphology::count_foreground(&mask),
            cleaned_foreground = morphology::count_foreground(&cleaned),
            "binary mask ready"
        );

        let regions = locate::locate_digits(
            &mask,
            &normalized,
            self.min_region_area,
            self.accepted_counts.clone(),
        );
        if regions.is_empty() {
            return Err(RecognitionError::NoDigitsFound);
        }
        debug!(count = regions.len(), "located digit regions");

        // Per-region skips are absorbed; only a fully empty glyph set
        // degrades the call.
        let glyphs: Vec<GrayImage> = regions
            .iter()
            .filter_map(|region| glyph::normalize_glyph(&mask, region))
            .collect();
        if glyphs.is_empty() {
            warn!("all regions were skipped during glyph normalization");
            return Err(RecognitionError::NoDigitsFound);
        }

        let mut digits = Vec::with_capacity(glyphs.len());
        for (position, glyph_img) in glyphs.iter().enumerate() {
            let (digit, confidence) = classifier.classify(glyph_img)?;
            digits.push(DigitResult {
                position,
                digit,
                confidence,
            });
        }

        let full_number: String = digits
            .iter()
            .map(|d| char::from_digit(d.digit as u32, 10).unwrap_or('?'))
            .collect();
        let digit_count = digits.len();
        debug!(%full_number, digit_count, "recognition complete");

        Ok(RecognitionResult {
            full_number,
            digits,
            digit_count,
        })
    }
}

impl Default for RecognitionPipeline {
    fn default() -> Self {
        Self::new()
    }
}
