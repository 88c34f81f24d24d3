//! Error types for the recognition pipeline.
//!
//! Every variant is recoverable from the caller's point of view: a failed call
//! reports exactly one error and leaves no shared state behind.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionError {
    /// The source image could not be read or decoded. No stage runs.
    ImageRead(String),
    /// A normalization/binarization/cleaning stage hit an internal fault.
    Processing { stage: &'static str, message: String },
    /// The locator produced an empty candidate set even after the edge
    /// fallback, or every located region was skipped during glyph
    /// normalization. The image is valid but contains nothing recognizable.
    NoDigitsFound,
    /// The classifier collaborator failed. Fatal for the whole call; no
    /// partial results are returned.
    Classifier(String),
}

impl fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionError::ImageRead(msg) => write!(f, "failed to read image: {}", msg),
            RecognitionError::Processing { stage, message } => {
                write!(f, "image processing failed at {}: {}", stage, message)
            }
            RecognitionError::NoDigitsFound => write!(f, "no digits found in the image"),
            RecognitionError::Classifier(msg) => write!(f, "classifier failed: {}", msg),
        }
    }
}

impl std::error::Error for RecognitionError {}
