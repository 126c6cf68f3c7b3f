//! Grayscale and error overlay rasters of 256x256 pixel matrices.

use image::{Rgba, RgbaImage};

use crate::session::{PixelMatrix, RASTER_SIDE};

/// Gain applied to prediction errors when none was chosen.
pub const DEFAULT_ERROR_SCALE: f64 = 1.5;

/// Value added to scaled prediction errors so that zero maps to mid gray.
const ERROR_OFFSET: f64 = 128.0;

fn gray(level: u8) -> Rgba<u8> {
    Rgba([level, level, level, u8::MAX])
}

fn paint(matrix: &PixelMatrix, level: impl Fn(i32) -> u8) -> RgbaImage {
    let side = RASTER_SIDE as u32;
    RgbaImage::from_fn(side, side, |x, y| {
        gray(level(matrix.get(x as usize, y as usize)))
    })
}

/// Paint each cell as `clamp(v, 0, 255)` on all three channels.
pub fn grayscale(matrix: &PixelMatrix) -> RgbaImage {
    paint(matrix, |value| value.clamp(0, 255) as u8)
}

/// Paint each signed error as `clamp(v * scale + 128, 0, 255)`.
pub fn error_overlay(matrix: &PixelMatrix, scale: f64) -> RgbaImage {
    paint(matrix, |value| error_level(value, scale))
}

/// The gray level of one prediction error. Halves round to even, as a canvas
/// pixel buffer stores them.
pub fn error_level(value: i32, scale: f64) -> u8 {
    (f64::from(value) * scale + ERROR_OFFSET)
        .round_ties_even()
        .clamp(0.0, 255.0) as u8
}
