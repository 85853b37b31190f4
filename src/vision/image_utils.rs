// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading and utility functions for vision processing

use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Custom error types for image processing
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size in bytes
    pub size_bytes: usize,
}

/// Decode raw image bytes from a multipart upload
///
/// # Arguments
/// * `bytes` - Raw image bytes
///
/// # Returns
/// * `Ok((DynamicImage, ImageInfo))` - The decoded image and metadata
/// * `Err(ImageError)` - If decoding fails
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    // Detect format from magic bytes
    let format = detect_format(bytes)?;

    // Load image
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Detect image format from magic bytes
///
/// Only the formats the upload endpoint accepts are recognized here;
/// anything else is rejected before a decode is attempted.
///
/// # Arguments
/// * `bytes` - Raw image data
///
/// # Returns
/// * `Ok(ImageFormat)` - Detected format (PNG or JPEG)
/// * `Err(ImageError::UnsupportedFormat)` - If format cannot be detected
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47 (0x89 P N G)
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        _ => Err(ImageError::UnsupportedFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    // 1x1 red PNG image (base64)
    const TINY_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_decode_image_bytes_png() {
        let bytes = STANDARD.decode(TINY_PNG_BASE64).unwrap();
        let result = decode_image_bytes(&bytes);
        assert!(result.is_ok(), "Failed to decode PNG: {:?}", result.err());

        let (img, info) = result.unwrap();
        assert_eq!(info.width, 1);
        assert_eq!(info.height, 1);
        assert_eq!(info.format, ImageFormat::Png);
        assert!(img.width() == 1 && img.height() == 1);
    }

    #[test]
    fn test_decode_image_bytes_empty() {
        let result = decode_image_bytes(&[]);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ImageError::EmptyData));
    }

    #[test]
    fn test_decode_image_bytes_corrupted() {
        // PNG header but corrupted data
        let corrupted = [0x89, 0x50, 0x4E, 0x47, 0x00, 0x00, 0x00, 0x00];
        let result = decode_image_bytes(&corrupted);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ImageError::DecodeFailed(_)));
    }

    #[test]
    fn test_detect_format_png() {
        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_format(&png_header).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_detect_format_jpeg() {
        let jpeg_header = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(detect_format(&jpeg_header).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_detect_format_rejects_gif() {
        // GIF89a magic bytes are not in the accepted set
        let gif_header = [0x47, 0x49, 0x46, 0x38, 0x39, 0x61];
        assert!(detect_format(&gif_header).is_err());
    }

    #[test]
    fn test_detect_format_unknown() {
        let unknown = [0x00, 0x00, 0x00, 0x00];
        assert!(detect_format(&unknown).is_err());
    }

    #[test]
    fn test_detect_format_truncated() {
        assert!(detect_format(&[0x89, 0x50]).is_err());
    }

    #[test]
    fn test_image_info_fields() {
        let bytes = STANDARD.decode(TINY_PNG_BASE64).unwrap();
        let (_img, info) = decode_image_bytes(&bytes).unwrap();

        assert!(info.size_bytes > 0);
        assert_eq!(info.width, 1);
        assert_eq!(info.height, 1);
        assert_eq!(info.format, ImageFormat::Png);
    }
}
