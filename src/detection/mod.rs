//! Detection records, the species table and the session log.

mod log;
mod species;
mod types;

pub use log::{DetectionSink, SessionLog, SortOrder};
pub use species::{AudioRange, Species};
pub use types::Detection;
