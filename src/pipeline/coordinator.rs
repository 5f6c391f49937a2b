//! Input collection and session log export.

use crate::camera::is_image_file;
use crate::config::OutputFormat;
use crate::constants::output_filenames;
use crate::detection::Detection;
use crate::error::{Error, Result};
use crate::output::{CsvWriter, JsonSessionWriter, OutputWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Determine the export directory.
pub fn output_dir_for(explicit_output_dir: Option<&Path>) -> PathBuf {
    explicit_output_dir.map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Get the export file path for a given format.
pub fn output_path_for(output_dir: &Path, format: OutputFormat) -> PathBuf {
    let filename = match format {
        OutputFormat::Csv => output_filenames::CSV,
        OutputFormat::Json => output_filenames::JSON,
    };
    output_dir.join(filename)
}

/// Write `detections` in every requested format.
///
/// Returns the paths written.
pub fn export_detections(
    detections: &[Detection],
    output_dir: &Path,
    formats: &[OutputFormat],
    csv_bom: bool,
) -> Result<Vec<PathBuf>> {
    if formats.is_empty() {
        return Ok(Vec::new());
    }
    std::fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = output_path_for(output_dir, format);
        let mut writer: Box<dyn OutputWriter> = match format {
            OutputFormat::Csv => Box::new(CsvWriter::new(&path, csv_bom)?),
            OutputFormat::Json => Box::new(JsonSessionWriter::new(&path)),
        };

        writer.write_header()?;
        for detection in detections {
            writer.write_detection(detection)?;
        }
        writer.finalize()?;

        info!("Wrote {} detection(s) to {}", detections.len(), path.display());
        written.push(path);
    }

    Ok(written)
}

/// Collect image files from paths (files and directories).
pub fn collect_input_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_image_file(path) {
                files.push(path.clone());
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            collect_image_files_recursive(path, &mut files)?;
        } else {
            warn!("Skipping non-existent path: {}", path.display());
        }
    }

    if files.is_empty() {
        return Err(Error::NoValidImageFiles);
    }

    Ok(files)
}

/// Recursively collect image files from a directory, in name order.
fn collect_image_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_image_files_recursive(&path, files)?;
        } else if is_image_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::detection::Species;
    use chrono::Local;
    use tempfile::TempDir;

    #[test]
    fn test_output_dir_for() {
        assert_eq!(
            output_dir_for(Some(Path::new("/out"))),
            PathBuf::from("/out")
        );
        assert_eq!(output_dir_for(None), PathBuf::from("."));
    }

    #[test]
    fn test_output_path_for() {
        let dir = Path::new("/out");
        assert_eq!(
            output_path_for(dir, OutputFormat::Csv),
            PathBuf::from("/out/wildguard_session.csv")
        );
        assert_eq!(
            output_path_for(dir, OutputFormat::Json),
            PathBuf::from("/out/wildguard_session.json")
        );
    }

    #[test]
    fn test_collect_input_files_recurses_and_filters() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("night");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"").unwrap();
        std::fs::write(dir.path().join("a.png"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::write(nested.join("c.jpeg"), b"").unwrap();

        let files = collect_input_files(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.png", "b.jpg", "c.jpeg"]);
    }

    #[test]
    fn test_collect_input_files_without_images_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        assert!(matches!(
            collect_input_files(&[dir.path().to_path_buf()]),
            Err(Error::NoValidImageFiles)
        ));
    }

    #[test]
    fn test_export_detections_writes_each_format() {
        let dir = TempDir::new().unwrap();
        let detections = vec![Detection::new(Species::Rabbit, 0.8, Local::now(), "r.jpg")];

        let written = export_detections(
            &detections,
            dir.path(),
            &[OutputFormat::Csv, OutputFormat::Json],
            false,
        )
        .unwrap();

        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|p| p.exists()));
        assert!(export_detections(&detections, dir.path(), &[], true).unwrap().is_empty());
    }
}
