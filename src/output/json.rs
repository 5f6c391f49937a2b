//! JSON session log writer.

use crate::detection::{AudioRange, Detection, Species};
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use crate::signal::{SignalDecision, decide};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// JSON export file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSessionFile {
    /// Export timestamp.
    pub exported_at: DateTime<Local>,
    /// Detection records in log order.
    pub detections: Vec<JsonDetection>,
    /// Summary statistics.
    pub summary: JsonSummary,
}

/// Single detection in JSON format.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDetection {
    /// Capture time.
    pub timestamp: DateTime<Local>,
    /// Detected species.
    pub animal: Species,
    /// Confidence score.
    pub confidence: f32,
    /// Hearing range of the species.
    pub audio_range: AudioRange,
    /// Deterrent frequency in kHz, if the signal was emitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_khz: Option<f32>,
    /// Captured or uploaded still image.
    pub image_url: String,
}

/// Summary statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Total number of detections.
    pub total_detections: usize,
    /// Number of distinct species.
    pub unique_species: usize,
    /// Detections confident enough for a deterrent signal.
    pub signals_emitted: usize,
}

/// Writer for the JSON session log export.
pub struct JsonSessionWriter {
    detections: Vec<JsonDetection>,
    output_path: PathBuf,
}

impl JsonSessionWriter {
    /// Create a writer; nothing is written until [`finalize`](OutputWriter::finalize).
    pub fn new(output_path: &Path) -> Self {
        Self {
            detections: Vec::new(),
            output_path: output_path.to_path_buf(),
        }
    }

    fn compute_summary(&self) -> JsonSummary {
        let unique_species: HashSet<Species> = self.detections.iter().map(|d| d.animal).collect();

        JsonSummary {
            total_detections: self.detections.len(),
            unique_species: unique_species.len(),
            signals_emitted: self
                .detections
                .iter()
                .filter(|d| d.signal_khz.is_some())
                .count(),
        }
    }
}

impl OutputWriter for JsonSessionWriter {
    fn write_header(&mut self) -> Result<()> {
        // No header for JSON - written at finalize
        Ok(())
    }

    fn write_detection(&mut self, detection: &Detection) -> Result<()> {
        let signal_khz = match decide(detection, Duration::ZERO) {
            SignalDecision::Emit(signal) => Some(signal.frequency_khz),
            SignalDecision::Suppress => None,
        };

        self.detections.push(JsonDetection {
            timestamp: detection.timestamp(),
            animal: detection.animal(),
            confidence: detection.confidence(),
            audio_range: detection.audio_range(),
            signal_khz,
            image_url: detection.image_url().to_string(),
        });
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let summary = self.compute_summary();
        let result = JsonSessionFile {
            exported_at: Local::now(),
            detections: std::mem::take(&mut self.detections),
            summary,
        };

        let file = File::create(&self.output_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &result).map_err(|e| Error::JsonWrite {
            path: self.output_path.clone(),
            source: e,
        })?;

        Ok(())
    }
}
