//! Configuration file loading.

use crate::config::{Config, validate_config};
use crate::error::{Error, Result};
use std::path::Path;

/// Load and validate configuration from a TOML file.
///
/// Returns default config if the file does not exist.
pub fn load_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| Error::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from the default platform-specific path.
///
/// Returns default config if no config file exists.
pub fn load_default_config() -> Result<Config> {
    super::config_file_path().map_or_else(|_| Ok(Config::default()), |path| load_config_file(&path))
}

/// Save configuration to a TOML file.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::ConfigWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::ConfigSerialize { source: e })?;

    std::fs::write(path, contents).map_err(|e| Error::ConfigWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Save configuration to the default platform-specific path.
pub fn save_default_config(config: &Config) -> Result<std::path::PathBuf> {
    let path = super::config_file_path()?;
    save_config(config, &path)?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::config::{CaptureMode, SinkKind};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_load_nonexistent_file_returns_default() {
        let config = load_config_file(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert!(config.cameras.is_empty());
        assert!(config.model.path.is_none());
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[model]
path = "/models/animals.onnx"
labels = "/models/labels.txt"

[session]
mode = "on-demand"
frame_interval_ms = 100

[[cameras]]
name = "yard"
path = "/dev/shm/yard.jpg"

[[cameras]]
name = "porch"
path = "/dev/shm/porch"

[signal]
sink = "wav"
gain = 0.2
"#
        )
        .unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.session.mode, CaptureMode::OnDemand);
        assert_eq!(config.session.frame_interval_ms, 100);
        assert_eq!(config.cameras.len(), 2);
        assert_eq!(config.cameras[1].name, "porch");
        assert_eq!(config.signal.sink, SinkKind::Wav);
        assert_eq!(config.signal.gain, 0.2);
        assert_eq!(config.signal.duration_ms, 3000);
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();
        assert!(load_config_file(file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[signal]\ngain = 3.0").unwrap();
        let err = load_config_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.session.mode = CaptureMode::OnDemand;
        save_config(&config, &path).unwrap();

        let loaded = load_config_file(&path).unwrap();
        assert_eq!(loaded.session.mode, CaptureMode::OnDemand);
    }
}
