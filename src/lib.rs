pub mod classify;
pub mod errors;
pub mod models;
pub mod segmentation;

pub use classify::{DigitClassifier, RtenDigitClassifier};
pub use errors::RecognitionError;
pub use models::{DigitResult, RecognitionResult, Region};
pub use segmentation::{RecognitionPipeline, load_grayscale};
