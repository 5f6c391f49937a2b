//! Detection session: camera acquisition, the frame loop, classification
//! sequencing and confidence-gated dispatch.
//!
//! [`SessionController`] is the state machine
//! (`Initializing -> Live <-> Paused`, with `Error` reachable from any state
//! and left only by an explicit retry). [`driver::run`] schedules it.

mod controller;
pub mod driver;
mod event;
mod state;

pub use controller::{SessionController, SessionOptions};
pub use driver::SessionHandle;
pub use event::{SessionCommand, SessionEvent};
pub use state::{FailureReason, SessionState};
