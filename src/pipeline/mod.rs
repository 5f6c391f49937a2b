//! Still-image identification and session log export.

mod coordinator;
mod identify;

pub use coordinator::{collect_input_files, export_detections, output_dir_for, output_path_for};
pub use identify::{IdentifyOutcome, IdentifySummary, identify_file, identify_files};
