//! Configuration type definitions.

use crate::constants::{DEFAULT_FRAME_INTERVAL_MS, model, signal};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Classifier model settings.
    pub model: ModelConfig,

    /// Live session settings.
    pub session: SessionConfig,

    /// Configured cameras, in enumeration order.
    pub cameras: Vec<CameraConfig>,

    /// Deterrent signal settings.
    pub signal: SignalConfig,

    /// Session log export settings.
    pub log: LogConfig,
}

/// Classifier model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX model file.
    pub path: Option<PathBuf>,

    /// Path to the labels file.
    pub labels: Option<PathBuf>,

    /// Square input size expected by the model.
    pub input_size: u32,

    /// Memory layout of the input tensor.
    pub layout: TensorLayout,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            labels: None,
            input_size: model::DEFAULT_INPUT_SIZE,
            layout: TensorLayout::Nhwc,
        }
    }
}

/// Input tensor layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// `[batch, height, width, channels]`, as exported from TensorFlow.
    #[default]
    Nhwc,
    /// `[batch, channels, height, width]`, as exported from PyTorch.
    Nchw,
}

/// A camera exposed through a snapshot location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Device name shown to the user.
    pub name: String,

    /// Image file or directory the capture tool writes frames to.
    pub path: PathBuf,
}

/// Live session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Classification mode.
    pub mode: CaptureMode,

    /// Interval between frame ticks in milliseconds.
    pub frame_interval_ms: u64,

    /// Directory to save accepted frames to.
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: CaptureMode::Continuous,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            snapshot_dir: None,
        }
    }
}

/// How the live session invokes the classifier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureMode {
    /// Classify every frame tick; pause automatically on detection.
    #[default]
    Continuous,
    /// Classify only on an explicit capture command.
    OnDemand,
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continuous => write!(f, "continuous"),
            Self::OnDemand => write!(f, "on-demand"),
        }
    }
}

/// Deterrent signal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Where tones are sent.
    pub sink: SinkKind,

    /// Tone duration in milliseconds.
    pub duration_ms: u64,

    /// Fade-in duration in milliseconds.
    pub fade_in_ms: u64,

    /// Peak amplitude (0.0 - 1.0).
    pub gain: f32,

    /// Synthesis sample rate in Hz.
    pub sample_rate: u32,

    /// External player command for the `player` sink.
    pub player: String,

    /// Output directory for the `wav` sink.
    pub wav_dir: Option<PathBuf>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::Player,
            duration_ms: signal::DEFAULT_DURATION_MS,
            fade_in_ms: signal::DEFAULT_FADE_IN_MS,
            gain: signal::DEFAULT_GAIN,
            sample_rate: signal::DEFAULT_SAMPLE_RATE,
            player: signal::DEFAULT_PLAYER.to_string(),
            wav_dir: None,
        }
    }
}

/// Audio sink selection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Play through an external player command.
    #[default]
    Player,
    /// Write each tone to a WAV file.
    Wav,
    /// Discard tones.
    None,
}

/// Session log export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Export formats written when a session ends.
    pub formats: Vec<OutputFormat>,

    /// Directory exports are written to.
    pub output_dir: Option<PathBuf>,

    /// Prefix CSV exports with a UTF-8 BOM.
    pub csv_bom: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            formats: Vec::new(),
            output_dir: None,
            csv_bom: true,
        }
    }
}

/// Supported session log export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// CSV table.
    Csv,
    /// JSON document.
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
