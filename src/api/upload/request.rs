// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload extraction and validation

use axum::extract::Multipart;

use crate::api::errors::ApiError;

/// MIME types accepted for CAPTCHA uploads
const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Filename extensions accepted for CAPTCHA uploads
const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];

/// One uploaded CAPTCHA image, as declared by the client
///
/// Lives only for the duration of one request; nothing is persisted.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Raw upload bytes
    pub bytes: Vec<u8>,
    /// Filename declared in the multipart field
    pub file_name: Option<String>,
    /// MIME type declared in the multipart field
    pub content_type: Option<String>,
}

impl UploadedImage {
    /// Pull the `image` field out of a multipart form body
    ///
    /// # Errors
    /// - `ApiError::Validation` if the body is malformed, the field cannot
    ///   be read, or no `image` field is present
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            ApiError::Validation(format!("Malformed multipart body: {}", e))
        })? {
            let name = field.name().unwrap_or("").to_string();
            if name != "image" {
                continue;
            }

            let file_name = field.file_name().map(|s| s.to_string());
            let content_type = field.content_type().map(|s| s.to_string());

            let bytes = field.bytes().await.map_err(|e| {
                ApiError::Validation(format!("Failed to read image field: {}", e))
            })?;

            return Ok(Self {
                bytes: bytes.to_vec(),
                file_name,
                content_type,
            });
        }

        Err(ApiError::Validation("image file is required".to_string()))
    }

    /// Validate the upload before any image processing
    ///
    /// Checks run in order: presence, size, declared MIME type, filename
    /// extension. The first failure short-circuits.
    pub fn validate(&self, max_bytes: usize) -> Result<(), ApiError> {
        if self.bytes.is_empty() {
            return Err(ApiError::Validation("image file is required".to_string()));
        }

        if self.bytes.len() > max_bytes {
            return Err(ApiError::Validation(format!(
                "image exceeds maximum size of {} bytes",
                max_bytes
            )));
        }

        let content_type = self
            .content_type
            .as_deref()
            .unwrap_or("")
            .to_ascii_lowercase();
        if !ALLOWED_MIME_TYPES.contains(&content_type.as_str()) {
            return Err(ApiError::Validation(format!(
                "unsupported content type '{}', supported: {:?}",
                content_type, ALLOWED_MIME_TYPES
            )));
        }

        let file_name = self
            .file_name
            .as_deref()
            .unwrap_or("")
            .to_ascii_lowercase();
        if !ALLOWED_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext)) {
            return Err(ApiError::Validation(format!(
                "unsupported file extension '{}', supported: {:?}",
                file_name, ALLOWED_EXTENSIONS
            )));
        }

        Ok(())
    }
}
