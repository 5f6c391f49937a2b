//! Help message display for CLI.

#![allow(clippy::print_stdout)]

use crate::config::Config;

/// Print help message based on configuration state.
pub fn print_smart_help(config: &Config) {
    if needs_setup(config) {
        print_first_time_help();
    } else {
        print_configured_help();
    }
}

/// Whether a classifier or camera still has to be configured.
fn needs_setup(config: &Config) -> bool {
    config.model.path.is_none() || config.cameras.is_empty()
}

/// Print detailed setup guide for first-time users.
pub fn print_first_time_help() {
    println!("No configuration found. Get started with wildguard:");
    println!();
    println!("1. Initialize configuration:");
    println!("   wildguard config init");
    println!();
    println!("2. Export an image classifier to ONNX (e.g. a Teachable Machine model)");
    println!("   and point [model] at it in the configuration file:");
    println!("   path = \"/path/to/model.onnx\"");
    println!("   labels = \"/path/to/labels.txt\"");
    println!();
    println!("3. Add a camera. Any capture tool that keeps writing a still frame works:");
    println!("   [[cameras]]");
    println!("   name = \"yard\"");
    println!("   path = \"/dev/shm/yard.jpg\"");
    println!();
    println!("4. Start a session:");
    println!("   wildguard camera");
    println!();
    println!("Or classify still images without a camera:");
    println!("   wildguard identify photo.jpg --model-path model.onnx --labels-path labels.txt");
    println!();
    println!("Run 'wildguard -h' for all options.");
}

/// Print brief usage reminder for configured users.
pub fn print_configured_help() {
    println!("Usage: wildguard <COMMAND> [OPTIONS]");
    println!();
    println!("Example: wildguard camera --mode on-demand -f csv");
    println!();
    println!("Run 'wildguard -h' for all options or 'wildguard devices' to list cameras.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_needs_setup() {
        assert!(needs_setup(&Config::default()));
    }

    #[test]
    fn test_configured_model_and_camera_skip_setup() {
        let mut config = Config::default();
        config.model.path = Some(PathBuf::from("/tmp/model.onnx"));
        config.model.labels = Some(PathBuf::from("/tmp/labels.txt"));
        assert!(needs_setup(&config));

        config.cameras.push(CameraConfig {
            name: "yard".to_string(),
            path: PathBuf::from("/dev/shm/yard.jpg"),
        });
        assert!(!needs_setup(&config));
    }
}
