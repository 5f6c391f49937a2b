//! Configuration validation.

use crate::config::Config;
use crate::error::{Error, Result};
use std::collections::HashSet;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_model(config)?;
    validate_session(config)?;
    validate_cameras(config)?;
    validate_signal(config)?;
    Ok(())
}

fn invalid(message: String) -> Error {
    Error::ConfigValidation { message }
}

fn validate_model(config: &Config) -> Result<()> {
    if config.model.input_size == 0 {
        return Err(invalid("model.input_size must be at least 1".to_string()));
    }

    // A model without labels (or the reverse) can never load.
    if config.model.path.is_some() != config.model.labels.is_some() {
        return Err(invalid(
            "model.path and model.labels must be set together".to_string(),
        ));
    }

    Ok(())
}

fn validate_session(config: &Config) -> Result<()> {
    if config.session.frame_interval_ms == 0 {
        return Err(invalid(
            "session.frame_interval_ms must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_cameras(config: &Config) -> Result<()> {
    let mut seen = HashSet::new();
    for camera in &config.cameras {
        if camera.name.trim().is_empty() {
            return Err(invalid("camera name must not be empty".to_string()));
        }
        if !seen.insert(camera.name.as_str()) {
            return Err(invalid(format!("duplicate camera name '{}'", camera.name)));
        }
    }
    Ok(())
}

fn validate_signal(config: &Config) -> Result<()> {
    let signal = &config.signal;

    if !(0.0..=1.0).contains(&signal.gain) {
        return Err(invalid(format!(
            "signal.gain must be between 0.0 and 1.0, got {}",
            signal.gain
        )));
    }

    if signal.duration_ms == 0 {
        return Err(invalid("signal.duration_ms must be at least 1".to_string()));
    }

    if signal.fade_in_ms >= signal.duration_ms {
        return Err(invalid(format!(
            "signal.fade_in_ms ({}) must be shorter than signal.duration_ms ({})",
            signal.fade_in_ms, signal.duration_ms
        )));
    }

    if signal.sample_rate == 0 {
        return Err(invalid("signal.sample_rate must be at least 1".to_string()));
    }

    if signal.player.trim().is_empty() {
        return Err(invalid("signal.player must not be empty".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_duplicate_camera_names() {
        let mut config = Config::default();
        let camera = CameraConfig {
            name: "yard".to_string(),
            path: PathBuf::from("/tmp/yard.jpg"),
        };
        config.cameras = vec![camera.clone(), camera];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_fade_longer_than_tone() {
        let mut config = Config::default();
        config.signal.fade_in_ms = 5000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_model_without_labels() {
        let mut config = Config::default();
        config.model.path = Some(PathBuf::from("/models/animals.onnx"));
        assert!(validate_config(&config).is_err());
    }
}
