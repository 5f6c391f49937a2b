//! Session log export writers.

mod csv;
mod json;
pub mod progress;
mod writer;

pub use csv::CsvWriter;
pub use json::{JsonDetection, JsonSessionFile, JsonSessionWriter, JsonSummary};
pub use writer::OutputWriter;
