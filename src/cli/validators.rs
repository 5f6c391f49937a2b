//! CLI argument validators.
//!
//! Shared validation functions for CLI argument parsing.

use crate::config::CameraConfig;
use crate::detection::{AudioRange, Species};
use std::path::PathBuf;

/// What a test tone is aimed at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToneTarget {
    /// A species from the hearing-range table.
    Species(Species),
    /// An explicit range.
    Range(AudioRange),
}

impl ToneTarget {
    /// Range whose midpoint the tone is played at.
    pub const fn range(self) -> AudioRange {
        match self {
            Self::Species(species) => species.audio_range(),
            Self::Range(range) => range,
        }
    }
}

/// Parse a species name or a `min-max` range in kHz.
pub fn parse_tone_target(s: &str) -> Result<ToneTarget, String> {
    if let Ok(species) = s.parse::<Species>() {
        return Ok(ToneTarget::Species(species));
    }
    if s.contains('-') {
        return s
            .parse::<AudioRange>()
            .map(ToneTarget::Range)
            .map_err(|e| e.to_string());
    }

    let names: Vec<&str> = Species::ALL.iter().map(|s| s.name()).collect();
    Err(format!(
        "'{s}' is neither a species ({}) nor a range like 2-5",
        names.join(", ")
    ))
}

/// Parse a camera given as `NAME=PATH`.
pub fn parse_camera(s: &str) -> Result<CameraConfig, String> {
    let (name, path) = s
        .split_once('=')
        .ok_or_else(|| format!("'{s}' is not of the form NAME=PATH"))?;

    let name = name.trim();
    if name.is_empty() || path.is_empty() {
        return Err(format!("'{s}' is not of the form NAME=PATH"));
    }

    Ok(CameraConfig {
        name: name.to_string(),
        path: PathBuf::from(path),
    })
}

/// Parse and validate a gain value (0.0-1.0).
pub fn parse_gain(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(0.0..=1.0).contains(&value) {
        return Err(format!("gain must be between 0.0 and 1.0, got {value}"));
    }

    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gain_valid() {
        assert_eq!(parse_gain("0.5").ok(), Some(0.5));
        assert_eq!(parse_gain("0.0").ok(), Some(0.0));
        assert_eq!(parse_gain("1.0").ok(), Some(1.0));
    }

    #[test]
    fn test_parse_gain_invalid() {
        assert!(parse_gain("1.1").is_err());
        assert!(parse_gain("-0.1").is_err());
        assert!(parse_gain("abc").is_err());
    }

    #[test]
    fn test_parse_tone_target() {
        assert_eq!(
            parse_tone_target("Deer").unwrap(),
            ToneTarget::Species(Species::Deer)
        );

        let range = parse_tone_target("20-30 kHz").unwrap().range();
        assert_eq!(range.midpoint_khz(), 25.0);

        assert!(parse_tone_target("67-45").is_err());
        let err = parse_tone_target("moose").unwrap_err();
        assert!(err.contains("neither a species"));
    }

    #[test]
    fn test_parse_camera() {
        let camera = parse_camera("yard=/dev/shm/yard.jpg").unwrap();
        assert_eq!(camera.name, "yard");
        assert_eq!(camera.path, PathBuf::from("/dev/shm/yard.jpg"));

        assert!(parse_camera("yard").is_err());
        assert!(parse_camera("=/tmp/x").is_err());
    }
}
