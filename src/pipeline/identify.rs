//! Still-image identification.

use crate::detection::{Detection, DetectionSink};
use crate::error::{Error, Result};
use crate::inference::{ModelHandle, Prediction, Verdict, evaluate};
use crate::output::progress;
use crate::signal::{SignalDecision, SignalDispatcher};
use chrono::Local;
use image::RgbImage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of identifying one image.
#[derive(Debug, Clone)]
pub struct IdentifyOutcome {
    /// The image file.
    pub path: PathBuf,
    /// Accepted detection and its signal decision.
    pub detection: Option<(Detection, SignalDecision)>,
    /// Best candidate when nothing was accepted.
    pub best: Option<Prediction>,
}

impl fmt::Display for IdentifyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.path.display())?;
        match (&self.detection, &self.best) {
            (Some((detection, decision)), _) => write!(f, "{detection} - {decision}"),
            (None, Some(best)) => write!(
                f,
                "no animal detected (best guess {} at {:.1}%)",
                best.label,
                best.probability * 100.0
            ),
            (None, None) => write!(f, "no animal detected"),
        }
    }
}

/// Totals for a batch of images.
#[derive(Debug, Default)]
pub struct IdentifySummary {
    /// Outcomes for images that were classified.
    pub outcomes: Vec<IdentifyOutcome>,
    /// Images that could not be decoded or classified.
    pub failed: usize,
}

impl IdentifySummary {
    /// Number of accepted detections.
    pub fn detections(&self) -> usize {
        self.outcomes.iter().filter(|o| o.detection.is_some()).count()
    }
}

/// Decode an image file on the blocking pool.
async fn decode_image(path: &Path) -> Result<RgbImage> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        image::open(&owned)
            .map(|decoded| decoded.to_rgb8())
            .map_err(|source| Error::ImageDecode {
                path: owned.clone(),
                source,
            })
    })
    .await
    .map_err(|e| Error::Internal {
        message: format!("decode task failed: {e}"),
    })?
}

/// Identify one image.
///
/// Applies the same acceptance rule as a live session. An accepted image is
/// appended to `log` and handed to `dispatcher`; this waits for the tone to
/// finish so consecutive images do not overlap.
pub async fn identify_file(
    path: &Path,
    model: &ModelHandle,
    dispatcher: &SignalDispatcher,
    log: &dyn DetectionSink,
) -> Result<IdentifyOutcome> {
    let image = Arc::new(decode_image(path).await?);
    let decoded_at = Local::now();
    debug!("Decoded {} ({}x{})", path.display(), image.width(), image.height());

    let classifier = model.acquire().await?;
    let predictions = tokio::task::spawn_blocking(move || classifier.classify(&image))
        .await
        .map_err(|e| Error::Inference {
            reason: format!("classification task failed: {e}"),
        })??;

    let outcome = match evaluate(&predictions) {
        Verdict::Accepted(best) => {
            let detection = Detection::new(
                best.label,
                best.probability,
                decoded_at,
                path.display().to_string(),
            );
            info!("{}: detected {detection}", path.display());

            let (decision, emission) = dispatcher.dispatch(&detection);
            log.append(detection.clone());
            if let Some(emission) = emission {
                emission.finished().await;
            }

            IdentifyOutcome {
                path: path.to_path_buf(),
                detection: Some((detection, decision)),
                best: Some(best),
            }
        }
        Verdict::Rejected(best) => IdentifyOutcome {
            path: path.to_path_buf(),
            detection: None,
            best,
        },
    };

    Ok(outcome)
}

/// Identify every image in `files`, in order.
///
/// Images that fail to decode or classify are counted and skipped. A
/// classifier that cannot be loaded aborts the batch.
pub async fn identify_files(
    files: &[PathBuf],
    model: &ModelHandle,
    dispatcher: &SignalDispatcher,
    log: &dyn DetectionSink,
    show_progress: bool,
) -> Result<IdentifySummary> {
    let pb = progress::create_file_progress(files.len(), show_progress);
    let mut summary = IdentifySummary::default();

    for path in files {
        match identify_file(path, model, dispatcher, log).await {
            Ok(outcome) => summary.outcomes.push(outcome),
            Err(e @ Error::ModelLoad { .. }) => return Err(e),
            Err(e) => {
                warn!("Skipping {}: {e}", path.display());
                summary.failed += 1;
            }
        }
        progress::inc_progress(pb.as_ref());
    }

    progress::finish_progress(pb, "done");
    Ok(summary)
}
