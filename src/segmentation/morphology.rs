//! Binary morphology with rectangular structuring elements.
//!
//! The cleaning sequence needs 2x2 elements, which the norm-based imageproc
//! morphology cannot express (it only builds odd, centered elements), so the
//! primitives are written out as pixel loops. The anchor sits at
//! (width / 2, height / 2). Samples outside the image count as foreground for
//! erosion and background for dilation, so strokes are not eaten at the
//! borders.

use image::{GrayImage, Luma};

pub const FG: u8 = 255;
pub const BG: u8 = 0;

fn probe(mask: &GrayImage, x: i64, y: i64, outside: u8) -> u8 {
    if x < 0 || y < 0 || x >= mask.width() as i64 || y >= mask.height() as i64 {
        outside
    } else {
        mask.get_pixel(x as u32, y as u32)[0]
    }
}

pub fn erode(mask: &GrayImage, kw: u32, kh: u32) -> GrayImage {
    let (w, h) = mask.dimensions();
    let (ax, ay) = (kw as i64 / 2, kh as i64 / 2);
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut keep = true;
            'kernel: for dy in 0..kh as i64 {
                for dx in 0..kw as i64 {
                    let v = probe(mask, x as i64 + dx - ax, y as i64 + dy - ay, FG);
                    if v == BG {
                        keep = false;
                        break 'kernel;
                    }
                }
            }
            out.put_pixel(x, y, Luma([if keep { FG } else { BG }]));
        }
    }
    out
}

pub fn dilate(mask: &GrayImage, kw: u32, kh: u32) -> GrayImage {
    let (w, h) = mask.dimensions();
    let (ax, ay) = (kw as i64 / 2, kh as i64 / 2);
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut hit = false;
            // Reflected element, so open() and close() pair up with erode()
            // geometrically (an opening never extends past the input set).
            'kernel: for dy in 0..kh as i64 {
                for dx in 0..kw as i64 {
                    let v = probe(mask, x as i64 - (dx - ax), y as i64 - (dy - ay), BG);
                    if v != BG {
                        hit = true;
                        break 'kernel;
                    }
                }
            }
            out.put_pixel(x, y, Luma([if hit { FG } else { BG }]));
        }
    }
    out
}

/// Erosion then dilation: removes structures smaller than the element.
pub fn open(mask: &GrayImage, kw: u32, kh: u32) -> GrayImage {
    dilate(&erode(mask, kw, kh), kw, kh)
}

/// Dilation then erosion: bridges gaps smaller than the element.
pub fn close(mask: &GrayImage, kw: u32, kh: u32) -> GrayImage {
    erode(&dilate(mask, kw, kh), kw, kh)
}

/// Cleaning sequence for a fresh binary mask: open 2x2 (speckle), close 3x3
/// (reconnect broken strokes), open 2x2 (re-trim noise the closing brought
/// back).
pub fn clean(mask: &GrayImage) -> GrayImage {
    open(&close(&open(mask, 2, 2), 3, 3), 2, 2)
}

pub fn count_foreground(mask: &GrayImage) -> u32 {
    mask.pixels().filter(|p| p[0] != BG).count() as u32
}
