// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON body returned for every non-200 outcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    /// Bad input detected before any image processing
    Validation(String),
    /// Upload bytes are not a decodable image
    Decode(String),
    /// The image decoded but no digits were recognized
    EmptyRecognition,
    /// The recognition model could not be loaded
    Dependency(String),
    /// Processing exceeded the overall time budget
    Timeout,
    /// Anything else; the message is kept server-side only
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Decode(_) | ApiError::EmptyRecognition => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Dependency(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client
    ///
    /// Server-side failure details never leave the process; they are logged
    /// where the failure is caught.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Decode(msg) => format!("Invalid image: {}", msg),
            ApiError::EmptyRecognition => "No digits recognized in image".to_string(),
            ApiError::Dependency(_) => "Recognition service unavailable".to_string(),
            ApiError::Timeout => "Request timed out".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Decode(msg) => write!(f, "Decode error: {}", msg),
            ApiError::EmptyRecognition => write!(f, "No digits recognized"),
            ApiError::Dependency(msg) => write!(f, "Dependency error: {}", msg),
            ApiError::Timeout => write!(f, "Request timed out"),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.client_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
