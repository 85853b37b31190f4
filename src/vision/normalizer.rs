// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Deterministic normalization of uploaded CAPTCHA images
//!
//! Every upload is reduced to the same geometry and palette before
//! recognition: RGB conversion, aspect-preserving pad to a fixed canvas,
//! grayscale, Gaussian denoise, Otsu binarization, then expansion back to
//! three channels to match the recognition model input shape.

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::gaussian_blur_f32;
use std::time::Instant;
use tracing::debug;

/// Target canvas width for the recognition model
pub const TARGET_WIDTH: u32 = 320;

/// Target canvas height for the recognition model
pub const TARGET_HEIGHT: u32 = 64;

/// Blur sigma equivalent to a fixed 5x5 Gaussian kernel
const GAUSSIAN_SIGMA: f32 = 1.1;

/// Normalize a decoded image for recognition
///
/// Steps:
/// 1. Convert to RGB (drops alpha, expands palette/grayscale)
/// 2. Pad to 320x64 with white fill, content centered, aspect preserved
/// 3. Convert to grayscale (standard luma weighting)
/// 4. 5x5 Gaussian blur to suppress high-frequency noise
/// 5. Otsu global threshold, mapping every pixel to 0 or 255
/// 6. Duplicate the channel back to RGB
///
/// Pure function of the input image and the two size constants; the output
/// is always exactly `TARGET_WIDTH` x `TARGET_HEIGHT`.
pub fn normalize(image: &DynamicImage) -> RgbImage {
    let started = Instant::now();

    let padded = pad_to_target(image);

    let gray = DynamicImage::ImageRgb8(padded).to_luma8();
    let blurred = gaussian_blur_f32(&gray, GAUSSIAN_SIGMA);

    let level = otsu_level(&blurred);
    let binary = threshold(&blurred, level, ThresholdType::Binary);

    // Recognition expects 3-channel input
    let mut output = RgbImage::new(TARGET_WIDTH, TARGET_HEIGHT);
    for (x, y, pixel) in binary.enumerate_pixels() {
        let v = pixel[0];
        output.put_pixel(x, y, Rgb([v, v, v]));
    }

    debug!(
        "Normalized image in {:.2}ms: threshold={}, dimensions={}x{}",
        started.elapsed().as_secs_f64() * 1000.0,
        level,
        TARGET_WIDTH,
        TARGET_HEIGHT
    );

    output
}

/// Resize an image onto the target canvas with aspect ratio preservation
///
/// The image is scaled to fit within `TARGET_WIDTH` x `TARGET_HEIGHT` while
/// preserving aspect ratio, then centered on a white (255,255,255) canvas.
/// White fill keeps the border consistent with the light background the
/// recognition model was trained on.
pub fn pad_to_target(image: &DynamicImage) -> RgbImage {
    let (orig_w, orig_h) = image.dimensions();

    // Handle edge cases
    if orig_w == 0 || orig_h == 0 {
        return RgbImage::from_pixel(TARGET_WIDTH, TARGET_HEIGHT, Rgb([255, 255, 255]));
    }

    // Calculate scale to fit within target while preserving aspect ratio
    let scale = (TARGET_WIDTH as f32 / orig_w as f32).min(TARGET_HEIGHT as f32 / orig_h as f32);

    let new_w = ((orig_w as f32 * scale).round() as u32).max(1);
    let new_h = ((orig_h as f32 * scale).round() as u32).max(1);

    let resized = image.resize_exact(new_w, new_h, FilterType::Lanczos3);
    let rgb = resized.to_rgb8();

    // Create padded output (white background)
    let mut output = RgbImage::from_pixel(TARGET_WIDTH, TARGET_HEIGHT, Rgb([255, 255, 255]));

    // Calculate offset for centering
    let offset_x = (TARGET_WIDTH - new_w) / 2;
    let offset_y = (TARGET_HEIGHT - new_h) / 2;

    // Copy resized image to center
    for y in 0..new_h {
        for x in 0..new_w {
            let pixel = rgb.get_pixel(x, y);
            output.put_pixel(x + offset_x, y + offset_y, *pixel);
        }
    }

    output
}
