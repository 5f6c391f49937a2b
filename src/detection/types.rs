//! Detection record.

use crate::detection::{AudioRange, Species};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An accepted species classification.
///
/// Built once at the moment a classification clears the acceptance
/// threshold and never modified afterwards; all fields are read through
/// accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    animal: Species,
    confidence: f32,
    audio_range: AudioRange,
    timestamp: DateTime<Local>,
    image_url: String,
}

impl Detection {
    /// Build a detection, looking the hearing range up from the species table.
    pub fn new(
        animal: Species,
        confidence: f32,
        timestamp: DateTime<Local>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            animal,
            confidence,
            audio_range: animal.audio_range(),
            timestamp,
            image_url: image_url.into(),
        }
    }

    /// Detected species.
    pub const fn animal(&self) -> Species {
        self.animal
    }

    /// Probability of the winning label.
    pub const fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Hearing range of the detected species.
    pub const fn audio_range(&self) -> AudioRange {
        self.audio_range
    }

    /// Capture instant of the classified image.
    pub const fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Reference to the captured or uploaded still image.
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    /// Confidence as a percentage with one decimal, e.g. `"92.0%"`.
    pub fn confidence_percent(&self) -> String {
        format!("{:.1}%", self.confidence * 100.0)
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} confidence, hearing range {})",
            self.animal,
            self.confidence_percent(),
            self.audio_range
        )
    }
}
