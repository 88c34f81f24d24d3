use image::{GrayImage, Luma};

use quickdigits::{DigitClassifier, RecognitionError, RecognitionPipeline};

/// Classifier stub: always answers the same digit with fixed confidence.
struct FixedClassifier {
    digit: u8,
    confidence: f32,
}

impl DigitClassifier for FixedClassifier {
    fn classify(&self, _glyph: &GrayImage) -> Result<(u8, f32), RecognitionError> {
        Ok((self.digit, self.confidence))
    }
}

/// Classifier stub that always fails, for the fatal-propagation path.
struct BrokenClassifier;

impl DigitClassifier for BrokenClassifier {
    fn classify(&self, _glyph: &GrayImage) -> Result<(u8, f32), RecognitionError> {
        Err(RecognitionError::Classifier("model exploded".to_string()))
    }
}

fn white_image(w: u32, h: u32) -> GrayImage {
    GrayImage::from_pixel(w, h, Luma([255]))
}

fn draw_black_rect(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            img.put_pixel(x, y, Luma([0]));
        }
    }
}

/// Three well-separated 20x30 marks on a 280x80 page.
fn three_digit_image() -> GrayImage {
    let mut img = white_image(280, 80);
    draw_black_rect(&mut img, 10, 25, 20, 30);
    draw_black_rect(&mut img, 100, 25, 20, 30);
    draw_black_rect(&mut img, 200, 25, 20, 30);
    img
}

#[test]
fn recognizes_three_digits_left_to_right() -> anyhow::Result<()> {
    let img = three_digit_image();
    let pipeline = RecognitionPipeline::new();
    let classifier = FixedClassifier {
        digit: 7,
        confidence: 0.99,
    };

    let result = pipeline.recognize(&img, &classifier)?;
    assert_eq!(result.digit_count, 3);
    assert_eq!(result.full_number, "777");
    assert_eq!(result.digits.len(), 3);
    for (i, digit) in result.digits.iter().enumerate() {
        assert_eq!(digit.position, i);
        assert_eq!(digit.digit, 7);
        assert!((digit.confidence - 0.99).abs() < f32::EPSILON);
    }
    Ok(())
}

#[test]
fn located_regions_are_ordered_by_x() -> anyhow::Result<()> {
    let img = three_digit_image();
    let pipeline = RecognitionPipeline::new();

    let regions = pipeline.locate(&img)?;
    assert_eq!(regions.len(), 3);
    assert!(regions.windows(2).all(|w| w[0].min_x < w[1].min_x));
    // Boxes land on the drawn marks at x = 10, 100, 200.
    assert!(regions[0].min_x < 40);
    assert!(regions[1].min_x > 80 && regions[1].min_x < 130);
    assert!(regions[2].min_x > 180);
    Ok(())
}

#[test]
fn blank_image_reports_no_digits() {
    let img = GrayImage::from_pixel(160, 90, Luma([128]));
    let pipeline = RecognitionPipeline::new();
    let classifier = FixedClassifier {
        digit: 1,
        confidence: 1.0,
    };

    let err = pipeline.recognize(&img, &classifier).unwrap_err();
    assert_eq!(err, RecognitionError::NoDigitsFound);
}

#[test]
fn classifier_failure_aborts_the_whole_call() {
    let img = three_digit_image();
    let pipeline = RecognitionPipeline::new();

    let err = pipeline.recognize(&img, &BrokenClassifier).unwrap_err();
    assert!(matches!(err, RecognitionError::Classifier(_)));
}

#[test]
fn recognition_is_idempotent() -> anyhow::Result<()> {
    let img = three_digit_image();
    let pipeline = RecognitionPipeline::new();
    let classifier = FixedClassifier {
        digit: 4,
        confidence: 0.5,
    };

    let first = pipeline.recognize(&img, &classifier)?;
    let second = pipeline.recognize(&img, &classifier)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn border_touching_digit_is_recognized_without_panicking() -> anyhow::Result<()> {
    let mut img = white_image(120, 60);
    draw_black_rect(&mut img, 0, 0, 20, 30);
    let pipeline = RecognitionPipeline::new();
    let classifier = FixedClassifier {
        digit: 2,
        confidence: 0.8,
    };

    let result = pipeline.recognize(&img, &classifier)?;
    assert_eq!(result.digit_count, 1);
    assert_eq!(result.full_number, "2");
    Ok(())
}

#[test]
fn result_serializes_to_the_wire_shape() -> anyhow::Result<()> {
    let img = three_digit_image();
    let pipeline = RecognitionPipeline::new();
    let classifier = FixedClassifier {
        digit: 9,
        confidence: 0.75,
    };

    let result = pipeline.recognize(&img, &classifier)?;
    let value = serde_json::to_value(&result)?;
    assert_eq!(value["full_number"], "999");
    assert_eq!(value["digit_count"], 3);
    assert_eq!(value["digits"][0]["position"], 0);
    assert_eq!(value["digits"][0]["digit"], 9);
    assert!(value["digits"][0]["confidence"].is_number());
    Ok(())
}

#[test]
fn binarized_mask_is_strictly_binary() -> anyhow::Result<()> {
    let img = three_digit_image();
    let pipeline = RecognitionPipeline::new();

    let mask = pipeline.binarized(&img)?;
    assert_eq!(mask.dimensions(), img.dimensions());
    assert!(mask.pixels().all(|p| p[0] == 0 || p[0] == 255));
    assert!(mask.pixels().any(|p| p[0] == 255));
    Ok(())
}

#[test]
fn area_floor_is_tunable_per_pipeline_instance() {
    let img = three_digit_image();
    let pipeline = RecognitionPipeline {
        min_region_area: 10_000,
        ..RecognitionPipeline::new()
    };
    let classifier = FixedClassifier {
        digit: 3,
        confidence: 1.0,
    };

    // The marks are far below the raised floor, so nothing is located.
    let err = pipeline.recognize(&img, &classifier).unwrap_err();
    assert_eq!(err, RecognitionError::NoDigitsFound);
}

#[test]
fn empty_image_buffer_is_a_processing_error() {
    let img = GrayImage::new(0, 0);
    let pipeline = RecognitionPipeline::new();
    let classifier = FixedClassifier {
        digit: 0,
        confidence: 1.0,
    };

    let err = pipeline.recognize(&img, &classifier).unwrap_err();
    assert!(matches!(err, RecognitionError::Processing { .. }));
}
