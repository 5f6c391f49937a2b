//! Error types for wildguard.

use std::path::PathBuf;

/// Result type alias for wildguard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for wildguard.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Camera access was refused.
    #[error("camera permission denied for '{device}'")]
    PermissionDenied {
        /// Device that refused access.
        device: String,
    },

    /// No camera could be enumerated or opened.
    #[error("camera device unavailable: {reason}")]
    DeviceUnavailable {
        /// Description of why the device is unavailable.
        reason: String,
    },

    /// An open camera has not produced a readable frame yet.
    #[error("camera '{device}' has not produced a frame yet")]
    FrameNotReady {
        /// Device that was polled.
        device: String,
    },

    /// The classifier could not be fetched or initialized.
    #[error("failed to load classifier: {reason}")]
    ModelLoad {
        /// Description of the load failure.
        reason: String,
    },

    /// A single classification call failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Audio output could not be produced.
    #[error("audio output unavailable: {reason}")]
    AudioUnavailable {
        /// Description of the audio failure.
        reason: String,
    },

    /// A label did not name a known species.
    #[error("unknown species label: '{label}'")]
    UnknownSpecies {
        /// The unrecognized label.
        label: String,
    },

    /// An audio range string was malformed or inverted.
    #[error("invalid audio range '{value}': {reason}")]
    InvalidAudioRange {
        /// The offending range text.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Failed to decode an image file.
    #[error("failed to decode image '{path}'")]
    ImageDecode {
        /// Path to the image file.
        path: PathBuf,
        /// Underlying image error.
        #[source]
        source: image::ImageError,
    },

    /// Failed to write a snapshot image.
    #[error("failed to write snapshot '{path}'")]
    SnapshotWrite {
        /// Path to the snapshot file.
        path: PathBuf,
        /// Underlying image error.
        #[source]
        source: image::ImageError,
    },

    /// No valid image files found.
    #[error("no valid image files found in the provided paths")]
    NoValidImageFiles,

    /// Failed to write WAV file.
    #[error("failed to write WAV file '{path}'")]
    WavWrite {
        /// Path to the WAV file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: hound::Error,
    },

    /// Failed to write CSV output.
    #[error("failed to write CSV output '{path}'")]
    CsvWrite {
        /// Path to the CSV file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },

    /// Failed to write JSON output file.
    #[error("failed to write JSON output file '{path}'")]
    JsonWrite {
        /// Path to the JSON file.
        path: PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The session driver is no longer running.
    #[error("detection session has ended")]
    SessionClosed,

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}
