//! Output writer trait definition.

use crate::detection::Detection;
use crate::error::Result;

/// Trait for writing session log exports.
pub trait OutputWriter {
    /// Write the file header (if applicable).
    fn write_header(&mut self) -> Result<()>;

    /// Write a single detection.
    fn write_detection(&mut self, detection: &Detection) -> Result<()>;

    /// Finalize the output (flush, close, etc.).
    fn finalize(&mut self) -> Result<()>;
}
