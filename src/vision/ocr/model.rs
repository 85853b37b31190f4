// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR recognition model wrapper
//!
//! Loads a CTC recognition model plus its character dictionary and turns a
//! normalized CAPTCHA image into an ordered sequence of recognized text
//! fragments. Inference runs on CPU only.

use anyhow::{Context, Result};
use image::RgbImage;
use ndarray::{Array4, ArrayViewD, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::vision::normalizer::{TARGET_HEIGHT, TARGET_WIDTH};

/// Mean values for pixel normalization (ImageNet)
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Std values for pixel normalization (ImageNet)
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Recognized text with confidence score
#[derive(Debug, Clone)]
pub struct RecognizedText {
    /// The recognized text content
    pub text: String,
    /// Overall confidence score (0.0-1.0)
    pub confidence: f32,
}

impl RecognizedText {
    /// Create a new recognized text result
    pub fn new(text: String, confidence: f32) -> Self {
        Self { text, confidence }
    }

    /// Check if the text is empty or whitespace only
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// PaddleOCR text recognition model
///
/// Runs on CPU only; a single instance is shared across all requests.
#[derive(Clone)]
pub struct OcrModel {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Character dictionary for CTC decoding
    dictionary: Arc<Vec<char>>,
    /// Model input name
    input_name: String,
    /// Model output name
    output_name: String,
}

impl std::fmt::Debug for OcrModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrModel")
            .field("dictionary_size", &self.dictionary.len())
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .finish_non_exhaustive()
    }
}

impl OcrModel {
    /// Load the recognition model from files
    ///
    /// # Arguments
    /// - `model_path`: Path to the ONNX model file (rec_model.onnx)
    /// - `dict_path`: Path to the character dictionary (one character per line)
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - Dictionary file not found
    /// - ONNX Runtime initialization fails
    pub async fn new<P: AsRef<Path>>(model_path: P, dict_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let dict_path = dict_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("OCR recognition model not found: {}", model_path.display());
        }
        if !dict_path.exists() {
            anyhow::bail!("OCR character dictionary not found: {}", dict_path.display());
        }

        info!("Loading OCR recognition model from {}", model_path.display());

        let dictionary = Self::load_dictionary(dict_path)?;
        info!(
            "Loaded character dictionary with {} characters",
            dictionary.len()
        );

        // Load ONNX model with CPU-only execution
        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load OCR recognition model from {}",
                model_path.display()
            ))?;

        // Get input/output names
        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .unwrap_or_else(|| "softmax_0.tmp_0".to_string());

        debug!(
            "Recognition model loaded - input: {}, output: {}",
            input_name, output_name
        );

        info!("✅ OCR recognition model loaded successfully (CPU-only)");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            dictionary: Arc::new(dictionary),
            input_name,
            output_name,
        })
    }

    /// Load character dictionary from file
    ///
    /// Each line in the file contains one character.
    /// Special tokens: blank (index 0) for CTC
    fn load_dictionary<P: AsRef<Path>>(path: P) -> Result<Vec<char>> {
        let file = File::open(path.as_ref()).context(format!(
            "Failed to open dictionary: {}",
            path.as_ref().display()
        ))?;

        let reader = BufReader::new(file);
        let mut dictionary = vec![' ']; // Index 0 is blank token for CTC

        for line in reader.lines() {
            let line = line.context("Failed to read dictionary line")?;
            if let Some(ch) = line.chars().next() {
                dictionary.push(ch);
            }
        }

        Ok(dictionary)
    }

    /// Get the dictionary size
    pub fn dictionary_size(&self) -> usize {
        self.dictionary.len()
    }

    /// Recognize text from a normalized image
    ///
    /// # Arguments
    /// - `image`: Binarized RGB image of exactly 320x64 pixels
    ///
    /// # Returns
    /// - `Result<Vec<RecognizedText>>`: Ordered recognized fragments
    pub fn recognize(&self, image: &RgbImage) -> Result<Vec<RecognizedText>> {
        let (width, height) = image.dimensions();
        if width != TARGET_WIDTH || height != TARGET_HEIGHT {
            anyhow::bail!(
                "Invalid input dimensions: {}x{}, expected {}x{}",
                width,
                height,
                TARGET_WIDTH,
                TARGET_HEIGHT
            );
        }

        let input = image_to_tensor(image);

        // Run inference
        let mut session = self.session.lock().unwrap();

        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Recognition inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        debug!("Recognition output shape: {:?}", output_tensor.shape());

        let (text, confidence) = ctc_decode(&self.dictionary, &output_tensor)?;

        Ok(vec![RecognizedText::new(text, confidence)])
    }
}

/// Convert a normalized RGB image to an NCHW input tensor
///
/// Pixel values are scaled to [0,1] then normalized with the ImageNet
/// mean/std the recognition model was trained with.
fn image_to_tensor(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let mut tensor = Array4::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            let normalized = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
            tensor[[0, c, y as usize, x as usize]] = normalized;
        }
    }

    tensor
}

/// CTC (Connectionist Temporal Classification) greedy decoding
///
/// The recognition model outputs a probability distribution over characters
/// at each timestep. We use greedy decoding (best path) with blank removal
/// and repeat collapsing.
fn ctc_decode(dictionary: &[char], output: &ArrayViewD<'_, f32>) -> Result<(String, f32)> {
    let output_shape = output.shape();

    // Expected shape: [batch, seq_len, num_classes] or [seq_len, num_classes]
    let (seq_len, num_classes) = if output_shape.len() == 3 {
        (output_shape[1], output_shape[2])
    } else if output_shape.len() == 2 {
        (output_shape[0], output_shape[1])
    } else {
        anyhow::bail!("Unexpected output shape: {:?}", output_shape);
    };

    let mut text = String::new();
    let mut char_count = 0usize;
    let mut total_confidence = 0.0f32;
    let mut prev_index: Option<usize> = None;

    for t in 0..seq_len {
        // Find max probability class at this timestep
        let mut max_prob = f32::NEG_INFINITY;
        let mut max_index = 0usize;

        for c in 0..num_classes {
            let prob = if output_shape.len() == 3 {
                output[IxDyn(&[0, t, c])]
            } else {
                output[IxDyn(&[t, c])]
            };

            if prob > max_prob {
                max_prob = prob;
                max_index = c;
            }
        }

        // CTC blank token is index 0; skip blanks and collapse repeats
        if max_index != 0 && Some(max_index) != prev_index && max_index < dictionary.len() {
            text.push(dictionary[max_index]);
            total_confidence += max_prob;
            char_count += 1;
        }

        prev_index = if max_index == 0 { None } else { Some(max_index) };
    }

    let avg_confidence = if char_count == 0 {
        0.0
    } else {
        (total_confidence / char_count as f32).min(1.0)
    };

    Ok((text, avg_confidence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn digit_dictionary() -> Vec<char> {
        // Blank at index 0, then '0'..'9'
        let mut dict = vec![' '];
        dict.extend("0123456789".chars());
        dict
    }

    /// Build a [1, T, C] output where each timestep puts all probability
    /// mass on one class index.
    fn one_hot_output(indices: &[usize], num_classes: usize) -> ndarray::ArrayD<f32> {
        let mut arr = Array3::<f32>::zeros((1, indices.len(), num_classes));
        for (t, &idx) in indices.iter().enumerate() {
            arr[[0, t, idx]] = 0.9;
        }
        arr.into_dyn()
    }

    #[test]
    fn test_ctc_decode_simple() {
        let dict = digit_dictionary();
        // '4' is index 5, '2' is index 3
        let output = one_hot_output(&[5, 0, 3], dict.len());
        let (text, confidence) = ctc_decode(&dict, &output.view()).unwrap();
        assert_eq!(text, "42");
        assert!(confidence > 0.0);
    }

    #[test]
    fn test_ctc_decode_collapses_repeats() {
        let dict = digit_dictionary();
        // "777" emitted as repeated class without separating blanks is one '7'
        let output = one_hot_output(&[8, 8, 8], dict.len());
        let (text, _) = ctc_decode(&dict, &output.view()).unwrap();
        assert_eq!(text, "7");
    }

    #[test]
    fn test_ctc_decode_blank_separates_repeats() {
        let dict = digit_dictionary();
        // blank between identical classes yields two characters
        let output = one_hot_output(&[8, 0, 8], dict.len());
        let (text, _) = ctc_decode(&dict, &output.view()).unwrap();
        assert_eq!(text, "77");
    }

    #[test]
    fn test_ctc_decode_all_blank() {
        let dict = digit_dictionary();
        let output = one_hot_output(&[0, 0, 0], dict.len());
        let (text, confidence) = ctc_decode(&dict, &output.view()).unwrap();
        assert_eq!(text, "");
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_ctc_decode_two_dimensional_output() {
        let dict = digit_dictionary();
        let mut arr = ndarray::Array2::<f32>::zeros((2, dict.len()));
        arr[[0, 1]] = 0.8; // '0'
        arr[[1, 2]] = 0.8; // '1'
        let output = arr.into_dyn();
        let (text, _) = ctc_decode(&dict, &output.view()).unwrap();
        assert_eq!(text, "01");
    }

    #[test]
    fn test_ctc_decode_rejects_unexpected_shape() {
        let dict = digit_dictionary();
        let output = ndarray::Array1::<f32>::zeros(4).into_dyn();
        assert!(ctc_decode(&dict, &output.view()).is_err());
    }

    #[test]
    fn test_image_to_tensor_shape() {
        let img = RgbImage::new(TARGET_WIDTH, TARGET_HEIGHT);
        let tensor = image_to_tensor(&img);
        assert_eq!(
            tensor.shape(),
            &[1, 3, TARGET_HEIGHT as usize, TARGET_WIDTH as usize]
        );
    }

    #[test]
    fn test_image_to_tensor_normalization_range() {
        let img = RgbImage::from_pixel(TARGET_WIDTH, TARGET_HEIGHT, image::Rgb([255, 255, 255]));
        let tensor = image_to_tensor(&img);

        // For white pixels: (1.0 - mean) / std, roughly within [-3, 3]
        for val in tensor.iter() {
            assert!(
                *val >= -5.0 && *val <= 5.0,
                "Normalized value {} out of expected range",
                val
            );
        }
    }

    #[test]
    fn test_load_dictionary() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0\n1\n2").unwrap();

        let dict = OcrModel::load_dictionary(file.path()).unwrap();
        // Blank token plus three characters
        assert_eq!(dict.len(), 4);
        assert_eq!(dict[1], '0');
        assert_eq!(dict[3], '2');
    }

    #[test]
    fn test_recognized_text_is_empty() {
        assert!(RecognizedText::new("   ".to_string(), 0.5).is_empty());
        assert!(!RecognizedText::new("42".to_string(), 0.5).is_empty());
    }

    #[tokio::test]
    async fn test_model_load_missing_files() {
        let result = OcrModel::new("/nonexistent/rec_model.onnx", "/nonexistent/keys.txt").await;
        assert!(result.is_err());
    }
}
