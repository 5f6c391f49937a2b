//! CSV session log writer.

use crate::constants::UTF8_BOM;
use crate::constants::confidence::DECIMAL_PLACES;
use crate::detection::Detection;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use crate::signal::decide;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const HEADER: [&str; 6] = ["Time", "Animal", "Confidence", "Audio Range", "Signal", "Image"];

/// CSV format output writer.
pub struct CsvWriter {
    writer: csv::Writer<BufWriter<File>>,
    path: PathBuf,
}

impl CsvWriter {
    /// Create a new CSV writer, optionally prefixing a UTF-8 BOM for Excel.
    pub fn new(path: &Path, bom: bool) -> Result<Self> {
        let mut file = BufWriter::new(File::create(path)?);
        if bom {
            file.write_all(UTF8_BOM)?;
        }

        Ok(Self {
            writer: csv::Writer::from_writer(file),
            path: path.to_path_buf(),
        })
    }

    fn csv_error(&self, source: csv::Error) -> Error {
        Error::CsvWrite {
            path: self.path.clone(),
            source,
        }
    }
}

impl OutputWriter for CsvWriter {
    fn write_header(&mut self) -> Result<()> {
        self.writer
            .write_record(HEADER)
            .map_err(|e| self.csv_error(e))
    }

    fn write_detection(&mut self, detection: &Detection) -> Result<()> {
        let record = [
            detection.timestamp().format("%Y-%m-%d %H:%M:%S").to_string(),
            detection.animal().to_string(),
            format!("{:.decimal$}", detection.confidence(), decimal = DECIMAL_PLACES),
            detection.audio_range().to_string(),
            // Only the decision matters here, not the tone length.
            decide(detection, Duration::ZERO).to_string(),
            detection.image_url().to_string(),
        ];
        self.writer
            .write_record(&record)
            .map_err(|e| self.csv_error(e))
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
