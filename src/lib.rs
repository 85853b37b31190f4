// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod version;
pub mod vision;

// Re-export main types
pub use api::{build_router, start_server, ApiError, AppState, ErrorResponse, UploadResponse};
pub use config::NodeConfig;
pub use vision::{filter_digits, normalize, ModelManager, OcrModel, RecognizedText};
