//! The classifier collaborator seam.
//!
//! The pipeline only needs `classify(glyph) -> (digit, confidence)`; what sits
//! behind that is deliberately opaque. [`RtenDigitClassifier`] is the bundled
//! implementation, running a pre-trained RTen model over the canonical 28x28
//! glyph canvas.

use image::GrayImage;
use rten::Model;
use rten_tensor::NdTensor;
use rten_tensor::prelude::*;
use std::path::Path;

use crate::errors::RecognitionError;
use crate::segmentation::glyph::GLYPH_SIZE;

/// A digit classifier usable from concurrent recognition calls. For a fixed
/// glyph and fixed model state the result must be deterministic.
pub trait DigitClassifier: Send + Sync {
    /// Classify one `GLYPH_SIZE` x `GLYPH_SIZE` binary glyph into a digit
    /// label 0-9 and a confidence in [0, 1]. Passing any other shape is a
    /// programming error, not a runtime condition.
    fn classify(&self, glyph: &GrayImage) -> Result<(u8, f32), RecognitionError>;
}

/// Classifier backed by an RTen model that maps a normalized NCHW
/// `[1, 1, 28, 28]` tensor to 10 class probabilities.
pub struct RtenDigitClassifier {
    model: Model,
}

impl RtenDigitClassifier {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let model = Model::load_file(path)?;
        Ok(Self { model })
    }

    /// Load the model from the standard cache location.
    pub fn from_default_location() -> anyhow::Result<Self> {
        let home_dir = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        let model_path = Path::new(&home_dir).join(".cache/quickdigits/digit-classifier.rten");
        if !model_path.exists() {
            anyhow::bail!(
                "digit classifier model not found at {} (pass --model to use another path)",
                model_path.display()
            );
        }
        Self::from_path(&model_path)
    }
}

/// Scale a binary glyph into the model's input layout, intensities in [0, 1].
pub(crate) fn glyph_to_tensor(glyph: &GrayImage) -> NdTensor<f32, 4> {
    let mut input = NdTensor::zeros([1, 1, GLYPH_SIZE as usize, GLYPH_SIZE as usize]);
    for (x, y, pixel) in glyph.enumerate_pixels() {
        input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
    }
    input
}

impl DigitClassifier for RtenDigitClassifier {
    fn classify(&self, glyph: &GrayImage) -> Result<(u8, f32), RecognitionError> {
        let input = glyph_to_tensor(glyph);
        let output = self
            .model
            .run_one(input.view().into(), None)
            .map_err(|e| RecognitionError::Classifier(e.to_string()))?;
        let scores: NdTensor<f32, 2> = output
            .try_into()
            .map_err(|_| RecognitionError::Classifier("expected a [1, 10] output tensor".into()))?;

        let mut best_digit = 0u8;
        let mut best_score = f32::MIN;
        for digit in 0..scores.size(1) {
            let score = scores[[0, digit]];
            if score > best_score {
                best_score = score;
                best_digit = digit as u8;
            }
        }
        Ok((best_digit, best_score.clamp(0.0, 1.0)))
    }
}
