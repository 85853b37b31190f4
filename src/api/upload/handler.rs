// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload endpoint handler

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::request::UploadedImage;
use super::response::UploadResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::{decode_image_bytes, filter_digits, normalize};

/// POST /upload/ - Extract digits from a CAPTCHA image
///
/// Accepts a multipart form with a single `image` field and returns the
/// digits recognized in it.
///
/// # Request
/// - `image`: JPEG or PNG file, at most the configured maximum size
///
/// # Response
/// - `message`: Recognized digit string
///
/// # Errors
/// - 400 Bad Request: missing/oversized/wrong-type image, undecodable
///   image, or no digits recognized
/// - 500 Internal Server Error: recognition model unavailable or inference
///   failure (details logged server-side only)
pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    debug!("CAPTCHA upload received");

    // 1. Extract the image field
    let upload = UploadedImage::from_multipart(multipart).await.map_err(|e| {
        warn!("Upload extraction failed: {}", e);
        e
    })?;

    // 2. Validate before any image processing
    upload.validate(state.config.max_upload_bytes).map_err(|e| {
        warn!("Upload validation failed: {}", e);
        e
    })?;

    // 3. Run the pipeline under the soft time budget
    let digits = with_elapsed_logging(
        "captcha recognition",
        state.config.processing_budget,
        process_upload(&state, &upload.bytes),
    )
    .await?;

    info!("CAPTCHA recognized: {} digit(s)", digits.len());

    Ok(Json(UploadResponse::new(digits)))
}

/// Decode, normalize, recognize and filter one upload
async fn process_upload(state: &AppState, bytes: &[u8]) -> Result<String, ApiError> {
    // 1. Decode upload bytes
    let (decoded, image_info) = decode_image_bytes(bytes).map_err(|e| {
        warn!("Failed to decode image: {}", e);
        ApiError::Decode(e.to_string())
    })?;

    debug!(
        "Decoded image: {}x{}, {} bytes",
        image_info.width, image_info.height, image_info.size_bytes
    );

    // 2. Normalize to the recognition geometry
    let normalized = normalize(&decoded);

    // 3. Get the recognition model (loaded once per process)
    let model = state.models.recognition().await.map_err(|e| {
        error!("Recognition model unavailable: {:#}", e);
        ApiError::Dependency(e.to_string())
    })?;

    // 4. Recognize text fragments
    let fragments = model.recognize(&normalized).map_err(|e| {
        error!("Recognition failed: {:#}", e);
        ApiError::Internal(e.to_string())
    })?;

    // 5. Keep digits only
    let digits = filter_digits(fragments.iter().map(|f| f.text.as_str()));
    if digits.is_empty() {
        warn!("CAPTCHA text not recognized");
        return Err(ApiError::EmptyRecognition);
    }

    Ok(digits)
}

/// Elapsed-time logging around the processing step
///
/// Advisory only: an over-budget run is logged at warn level and its result
/// is still returned. There is no cancellation once processing starts.
async fn with_elapsed_logging<T, F>(label: &str, budget: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let started = Instant::now();
    let out = fut.await;
    let elapsed = started.elapsed();

    if elapsed > budget {
        warn!(
            "{} took {:.2}s, over the {:.0}s budget",
            label,
            elapsed.as_secs_f64(),
            budget.as_secs_f64()
        );
    } else {
        debug!(
            "{} completed in {:.2}ms",
            label,
            elapsed.as_secs_f64() * 1000.0
        );
    }

    out
}
