// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR integration for text extraction from normalized CAPTCHA images
//!
//! CPU-based recognition over a fixed-geometry input. The node never trains
//! or fine-tunes; it only prepares the model input and consumes its output.

pub mod model;

pub use model::{OcrModel, RecognizedText};
