use serde::Serialize;

/// A connected foreground component located in the source image, with its
/// axis-aligned bounding box (inclusive pixel coordinates).
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub label: u32,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub pixel_count: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn area(&self) -> u32 {
        self.pixel_count
    }

    pub fn aspect_ratio(&self) -> f32 {
        let h = self.height() as f32;
        if h == 0.0 {
            return 0.0;
        }
        self.width() as f32 / h
    }

    /// Bounding box padded by `pad` pixels on every side, clamped to the image
    /// bounds. Returns (x, y, width, height).
    pub fn padded_box(&self, pad: u32, img_width: u32, img_height: u32) -> (u32, u32, u32, u32) {
        let x = self.min_x.saturating_sub(pad);
        let y = self.min_y.saturating_sub(pad);
        let x_end = (self.max_x + 1 + pad).min(img_width);
        let y_end = (self.max_y + 1 + pad).min(img_height);
        (x, y, x_end - x, y_end - y)
    }
}

/// One recognized digit, in left-to-right reading order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigitResult {
    pub position: usize,
    pub digit: u8,
    pub confidence: f32,
}

/// The assembled result of one recognition call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionResult {
    pub full_number: String,
    pub digits: Vec<DigitResult>,
    pub digit_count: usize,
}
