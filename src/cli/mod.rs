//! CLI argument parsing and command handling.

mod args;
pub mod console;
pub mod help;
pub mod validators;

pub use args::{
    CameraArgs, Cli, Command, ConfigAction, ExportArgs, GlobalArgs, IdentifyArgs, ToneArgs,
};
