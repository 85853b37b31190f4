// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration
//!
//! All settings are environment-driven with defaults suitable for local
//! development. Image geometry is fixed in `vision::normalizer` and is not
//! configurable.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default maximum accepted upload size (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Default soft processing-time budget
pub const DEFAULT_PROCESSING_BUDGET_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Uploads larger than this are rejected before decoding
    pub max_upload_bytes: usize,
    /// Soft budget for one upload-to-result cycle; exceeding it is logged,
    /// never aborted
    pub processing_budget: Duration,
    /// Path to the ONNX recognition model
    pub model_path: PathBuf,
    /// Path to the character dictionary
    pub dict_path: PathBuf,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            processing_budget: Duration::from_secs(DEFAULT_PROCESSING_BUDGET_SECS),
            model_path: PathBuf::from("./models/rec_model.onnx"),
            dict_path: PathBuf::from("./models/ppocr_keys_v1.txt"),
        }
    }
}

impl NodeConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_port = env::var("API_PORT").unwrap_or_else(|_| "8000".to_string());
        let listen_addr = format!("127.0.0.1:{}", api_port);

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.max_upload_bytes);

        let processing_budget = env::var("PROCESSING_BUDGET_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.processing_budget);

        let model_path = env::var("OCR_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        let dict_path = env::var("OCR_DICT_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.dict_path);

        Self {
            listen_addr,
            max_upload_bytes,
            processing_budget,
            model_path,
            dict_path,
        }
    }
}
