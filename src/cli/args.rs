//! CLI argument definitions.

use crate::cli::validators::{ToneTarget, parse_camera, parse_gain, parse_tone_target};
use crate::config::{CameraConfig, CaptureMode, OutputFormat, SinkKind};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Wildlife species detection with species-tuned audio deterrents.
#[derive(Debug, Parser)]
#[command(name = "wildguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Path to ONNX model file (overrides config).
    #[arg(long, global = true, env = "WILDGUARD_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Path to labels file (overrides config).
    #[arg(long, global = true, env = "WILDGUARD_LABELS_PATH")]
    pub labels_path: Option<PathBuf>,

    /// Where deterrent tones go (overrides config).
    #[arg(long, global = true, value_enum, env = "WILDGUARD_SINK")]
    pub sink: Option<SinkKind>,

    /// Directory for the wav sink (overrides config).
    #[arg(long, global = true, env = "WILDGUARD_WAV_DIR")]
    pub wav_dir: Option<PathBuf>,

    /// Suppress progress output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a live detection session.
    Camera(CameraArgs),
    /// Identify animals in still images.
    Identify(IdentifyArgs),
    /// List available camera devices.
    Devices {
        /// Camera as NAME=PATH (replaces configured cameras).
        #[arg(long = "camera", value_parser = parse_camera)]
        cameras: Vec<CameraConfig>,
    },
    /// Print the species hearing-range table.
    Species,
    /// Emit a test deterrent tone.
    Tone(ToneArgs),
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Session log export options.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Export formats written at the end (comma-separated: csv,json).
    #[arg(short, long, value_delimiter = ',', env = "WILDGUARD_FORMAT")]
    pub format: Option<Vec<OutputFormat>>,

    /// Export directory (default: current directory).
    #[arg(short, long, env = "WILDGUARD_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Omit the UTF-8 BOM from CSV exports.
    #[arg(long)]
    pub no_csv_bom: bool,
}

/// Arguments for the camera command.
#[derive(Debug, Args)]
pub struct CameraArgs {
    /// Classification mode.
    #[arg(short, long, value_enum, env = "WILDGUARD_MODE")]
    pub mode: Option<CaptureMode>,

    /// Camera as NAME=PATH (repeatable; replaces configured cameras).
    #[arg(long = "camera", value_parser = parse_camera)]
    pub cameras: Vec<CameraConfig>,

    /// Frame interval in milliseconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..), env = "WILDGUARD_INTERVAL_MS")]
    pub interval_ms: Option<u64>,

    /// Save accepted frames to this directory.
    #[arg(long, env = "WILDGUARD_SNAPSHOT_DIR")]
    pub snapshot_dir: Option<PathBuf>,

    /// Export options.
    #[command(flatten)]
    pub export: ExportArgs,
}

/// Arguments for the identify command.
#[derive(Debug, Args)]
pub struct IdentifyArgs {
    /// Image files or directories.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Export options.
    #[command(flatten)]
    pub export: ExportArgs,
}

/// Arguments for the tone command.
#[derive(Debug, Args)]
pub struct ToneArgs {
    /// Species name (e.g. deer) or range in kHz (e.g. 2-5).
    #[arg(value_parser = parse_tone_target)]
    pub target: ToneTarget,

    /// Tone duration in milliseconds (overrides config).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub duration_ms: Option<u64>,

    /// Peak amplitude 0.0-1.0 (overrides config).
    #[arg(long, value_parser = parse_gain)]
    pub gain: Option<f32>,

    /// Write the tone to this WAV file instead of the sink.
    #[arg(long)]
    pub output: Option<PathBuf>,
}
