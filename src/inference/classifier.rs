//! ONNX Runtime image classifier.
//!
//! Expects a Teachable Machine style export: a square RGB input with pixel
//! values scaled to `[-1, 1]` and one probability per label. The labels file
//! holds one species per line, optionally prefixed by its index (`0 Deer`).

use crate::config::{ModelConfig, TensorLayout};
use crate::constants::model::PIXEL_SCALE;
use crate::detection::Species;
use crate::error::{Error, Result};
use crate::inference::{Classifier, ClassifierGateway, Prediction};
use image::RgbImage;
use image::imageops::{self, FilterType};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Loads an [`OnnxClassifier`] from model configuration.
#[derive(Debug, Clone)]
pub struct OnnxGateway {
    model_path: PathBuf,
    labels_path: PathBuf,
    input_size: u32,
    layout: TensorLayout,
}

impl OnnxGateway {
    /// Build a gateway from configuration.
    ///
    /// Fails when no model is configured; file existence is checked at load.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let (Some(model_path), Some(labels_path)) = (&config.path, &config.labels) else {
            return Err(Error::ConfigValidation {
                message: "no model configured (set [model] path and labels, or use --model/--labels)"
                    .to_string(),
            });
        };

        Ok(Self {
            model_path: model_path.clone(),
            labels_path: labels_path.clone(),
            input_size: config.input_size,
            layout: config.layout,
        })
    }
}

impl ClassifierGateway for OnnxGateway {
    fn load(&self) -> Result<Arc<dyn Classifier>> {
        let classifier = OnnxClassifier::load(
            &self.model_path,
            &self.labels_path,
            self.input_size,
            self.layout,
        )?;
        Ok(Arc::new(classifier))
    }
}

/// Image classifier backed by an ONNX Runtime session.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    labels: Vec<Species>,
    input_size: u32,
    layout: TensorLayout,
}

fn load_error(e: impl std::fmt::Display) -> Error {
    Error::ModelLoad {
        reason: e.to_string(),
    }
}

fn inference_error(e: impl std::fmt::Display) -> Error {
    Error::Inference {
        reason: e.to_string(),
    }
}

impl OnnxClassifier {
    /// Load the model and labels.
    ///
    /// Every label must name a known species, so a classification can never
    /// produce a label without a hearing-range entry.
    pub fn load(
        model_path: &Path,
        labels_path: &Path,
        input_size: u32,
        layout: TensorLayout,
    ) -> Result<Self> {
        if !model_path.exists() {
            return Err(load_error(format!(
                "model file does not exist: {}",
                model_path.display()
            )));
        }

        let labels = read_labels(labels_path)?;
        debug!("Loaded {} labels from {}", labels.len(), labels_path.display());

        let builder = Session::builder().map_err(load_error)?;
        let mut builder = builder
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_error)?;
        let session = builder.commit_from_file(model_path).map_err(load_error)?;

        info!(
            "Loaded model: {}, labels: {}, input: {}x{} ({:?})",
            model_path.display(),
            labels.len(),
            input_size,
            input_size,
            layout
        );

        Ok(Self {
            session: Mutex::new(session),
            labels,
            input_size,
            layout,
        })
    }

    /// Labels in model output order.
    pub fn labels(&self) -> &[Species] {
        &self.labels
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, image: &RgbImage) -> Result<Vec<Prediction>> {
        let size = self.input_size as usize;
        let data = preprocess(image, self.input_size, self.layout);
        let shape = match self.layout {
            TensorLayout::Nhwc => [1, size, size, 3],
            TensorLayout::Nchw => [1, 3, size, size],
        };
        let input = Tensor::from_array((shape, data)).map_err(inference_error)?;

        let scores: Vec<f32> = {
            let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            let outputs = session.run(ort::inputs![input]).map_err(inference_error)?;
            let (_, scores) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(inference_error)?;
            scores.to_vec()
        };

        if scores.len() != self.labels.len() {
            return Err(inference_error(format!(
                "model produced {} scores for {} labels",
                scores.len(),
                self.labels.len()
            )));
        }

        let probabilities = normalize_scores(scores);
        Ok(self
            .labels
            .iter()
            .zip(probabilities)
            .map(|(&label, probability)| Prediction::new(label, probability))
            .collect())
    }
}

/// Read a labels file, one species per line.
fn read_labels(path: &Path) -> Result<Vec<Species>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        load_error(format!("failed to read labels file '{}': {e}", path.display()))
    })?;

    let labels = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            // Teachable Machine prefixes each label with its index.
            let name = match line.split_once(char::is_whitespace) {
                Some((index, rest)) if index.chars().all(|c| c.is_ascii_digit()) => rest,
                _ => line,
            };
            name.parse::<Species>().map_err(|e| {
                load_error(format!("labels file '{}': {e}", path.display()))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if labels.is_empty() {
        return Err(load_error(format!(
            "labels file '{}' is empty",
            path.display()
        )));
    }

    Ok(labels)
}

/// Center-crop to a square, resize, and scale pixels to `[-1, 1]`.
fn preprocess(image: &RgbImage, input_size: u32, layout: TensorLayout) -> Vec<f32> {
    let (width, height) = image.dimensions();
    let side = width.min(height);
    let cropped = imageops::crop_imm(image, (width - side) / 2, (height - side) / 2, side, side)
        .to_image();
    let resized = imageops::resize(&cropped, input_size, input_size, FilterType::Triangle);

    let scale = |v: u8| f32::from(v) / PIXEL_SCALE - 1.0;
    let size = input_size as usize;

    match layout {
        TensorLayout::Nhwc => resized
            .pixels()
            .flat_map(|p| p.0.map(scale))
            .collect(),
        TensorLayout::Nchw => {
            let mut data = vec![0.0; 3 * size * size];
            for (i, pixel) in resized.pixels().enumerate() {
                for (channel, value) in pixel.0.into_iter().enumerate() {
                    data[channel * size * size + i] = scale(value);
                }
            }
            data
        }
    }
}

/// Apply softmax unless the scores already form a probability distribution.
fn normalize_scores(scores: Vec<f32>) -> Vec<f32> {
    let sum: f32 = scores.iter().sum();
    let is_distribution =
        scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() < 1e-3;
    if is_distribution {
        return scores;
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
