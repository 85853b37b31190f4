// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload response types

use serde::{Deserialize, Serialize};

/// Response for a successful recognition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Recognized digit string
    pub message: String,
}

impl UploadResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
