// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Lazy loading and sharing of the OCR recognition model
//!
//! The recognition model is expensive to initialize, so it is loaded at most
//! once per process, on first use, and shared read-only across requests.
//! Concurrent first access is serialized by the init-once cell; a failed
//! load leaves the cell empty so a later request can retry.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

use crate::vision::ocr::OcrModel;

/// Manager for the recognition model
pub struct ModelManager {
    model_path: PathBuf,
    dict_path: PathBuf,
    recognition: OnceCell<Arc<OcrModel>>,
}

impl ModelManager {
    /// Create a manager; no model files are touched until first use
    pub fn new(model_path: PathBuf, dict_path: PathBuf) -> Self {
        Self {
            model_path,
            dict_path,
            recognition: OnceCell::new(),
        }
    }

    /// Get the recognition model, loading it on first call
    pub async fn recognition(&self) -> anyhow::Result<Arc<OcrModel>> {
        let model = self
            .recognition
            .get_or_try_init(|| async {
                info!("Initializing OCR recognition model (first use)");
                let model = OcrModel::new(&self.model_path, &self.dict_path).await?;
                Ok::<_, anyhow::Error>(Arc::new(model))
            })
            .await?;
        Ok(model.clone())
    }

    /// Whether the model has been loaded
    pub fn is_ready(&self) -> bool {
        self.recognition.initialized()
    }
}

impl std::fmt::Debug for ModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelManager")
            .field("model_path", &self.model_path)
            .field("dict_path", &self.dict_path)
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_starts_unloaded() {
        let manager = ModelManager::new(
            PathBuf::from("./models/rec_model.onnx"),
            PathBuf::from("./models/ppocr_keys_v1.txt"),
        );
        assert!(!manager.is_ready());
    }

    #[tokio::test]
    async fn test_missing_model_leaves_manager_retryable() {
        let manager = ModelManager::new(
            PathBuf::from("/nonexistent/rec_model.onnx"),
            PathBuf::from("/nonexistent/keys.txt"),
        );

        assert!(manager.recognition().await.is_err());
        // A failed load must not poison the cell
        assert!(!manager.is_ready());
        assert!(manager.recognition().await.is_err());
    }
}
