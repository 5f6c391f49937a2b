//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "wildguard";

/// Minimum best-label probability for a classification to count as a detection.
pub const ACCEPTANCE_THRESHOLD: f32 = 0.5;

/// Minimum detection confidence for the deterrent signal to be emitted.
///
/// Stricter than [`ACCEPTANCE_THRESHOLD`]: the controller decides whether a
/// detection is real, the dispatcher decides whether it is worth acting on.
pub const SIGNAL_THRESHOLD: f32 = 0.75;

/// Default frame interval for the live loop (roughly one rendered frame at 30 fps).
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 33;

/// Model input constants.
pub mod model {
    /// Default square input size expected by the classifier.
    pub const DEFAULT_INPUT_SIZE: u32 = 224;

    /// Pixel values are mapped to `[-1, 1]` as `p / PIXEL_SCALE - 1`.
    pub const PIXEL_SCALE: f32 = 127.5;
}

/// Deterrent signal constants.
pub mod signal {
    /// Default tone duration in milliseconds.
    pub const DEFAULT_DURATION_MS: u64 = 3000;

    /// Default linear fade-in duration in milliseconds.
    pub const DEFAULT_FADE_IN_MS: u64 = 100;

    /// Default peak amplitude of the tone (0.0 - 1.0).
    pub const DEFAULT_GAIN: f32 = 0.1;

    /// Default synthesis sample rate in Hz.
    ///
    /// High enough to carry the ultrasonic midpoints of the cat and dog ranges.
    pub const DEFAULT_SAMPLE_RATE: u32 = 192_000;

    /// Default external player for rendered tones.
    pub const DEFAULT_PLAYER: &str = "aplay";

    /// Hertz per kilohertz.
    pub const HZ_PER_KHZ: f32 = 1000.0;
}

/// Confidence formatting.
pub mod confidence {
    /// Decimal places for confidence formatting in exports.
    pub const DECIMAL_PLACES: usize = 4;
}

/// Supported still-image extensions for the identify path and snapshot cameras.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// Output file names for session log exports.
pub mod output_filenames {
    /// CSV session log filename.
    pub const CSV: &str = "wildguard_session.csv";
    /// JSON session log filename.
    pub const JSON: &str = "wildguard_session.json";
}

/// UTF-8 Byte Order Mark for Excel compatibility in CSV files.
pub const UTF8_BOM: &[u8; 3] = b"\xEF\xBB\xBF";
