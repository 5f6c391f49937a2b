//! Species classification.
//!
//! The classifier is an external capability behind [`ClassifierGateway`]
//! (load) and [`Classifier`] (classify). [`ModelHandle`] owns the single
//! loaded instance; [`evaluate`] applies the acceptance rule to a result.

mod classifier;
mod handle;

pub use classifier::{OnnxClassifier, OnnxGateway};
pub use handle::ModelHandle;

use crate::constants::ACCEPTANCE_THRESHOLD;
use crate::detection::Species;
use crate::error::Result;
use image::RgbImage;
use std::sync::Arc;

/// One scored label from a classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted species.
    pub label: Species,
    /// Probability in `[0, 1]`.
    pub probability: f32,
}

impl Prediction {
    /// Create a prediction.
    pub const fn new(label: Species, probability: f32) -> Self {
        Self { label, probability }
    }
}

/// A loaded classifier.
///
/// Calls may be slow; the session controller runs them on the blocking pool.
/// There is no cancellation: callers discard results they no longer want.
pub trait Classifier: Send + Sync {
    /// Score `image` against every known label.
    fn classify(&self, image: &RgbImage) -> Result<Vec<Prediction>>;
}

/// Loader for a classifier.
pub trait ClassifierGateway: Send + Sync {
    /// Fetch and initialize the classifier. Fails with `ModelLoad`.
    fn load(&self) -> Result<Arc<dyn Classifier>>;
}

/// Outcome of applying the acceptance rule to a classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// The best prediction cleared the acceptance threshold.
    Accepted(Prediction),
    /// Nothing cleared the threshold; carries the best candidate, if any.
    Rejected(Option<Prediction>),
}

/// Highest-probability prediction; the first one wins on ties.
///
/// Non-finite probabilities are ignored.
pub fn best_prediction(predictions: &[Prediction]) -> Option<Prediction> {
    let mut best: Option<Prediction> = None;
    for candidate in predictions.iter().filter(|p| p.probability.is_finite()) {
        match best {
            Some(current) if candidate.probability <= current.probability => {}
            _ => best = Some(*candidate),
        }
    }
    best
}

/// Accept the best prediction iff its probability is at least the
/// acceptance threshold.
pub fn evaluate(predictions: &[Prediction]) -> Verdict {
    match best_prediction(predictions) {
        Some(best) if best.probability >= ACCEPTANCE_THRESHOLD => Verdict::Accepted(best),
        best => Verdict::Rejected(best),
    }
}
