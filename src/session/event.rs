//! Events published by the session and commands accepted by the driver.

use crate::camera::DeviceInfo;
use crate::detection::Detection;
use crate::inference::Prediction;
use crate::session::{FailureReason, SessionState};
use crate::signal::Signal;

/// Notification from a running session to its front end.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The session moved to a new state.
    StateChanged(SessionState),
    /// The session failed; `detail` carries the underlying error.
    Failed {
        /// Failure category.
        reason: FailureReason,
        /// Underlying error text.
        detail: String,
    },
    /// A camera device was selected.
    DeviceSelected {
        /// Index into the enumerated device list.
        index: usize,
        /// The selected device.
        device: DeviceInfo,
    },
    /// A classification was accepted.
    Detection(Detection),
    /// An on-demand capture produced no detection.
    NoDetection {
        /// Best candidate below the acceptance threshold, if any.
        best: Option<Prediction>,
    },
    /// A classification call failed; the session stays live.
    InferenceFailed {
        /// Underlying error text.
        reason: String,
    },
    /// The deterrent signal was started for the last detection.
    SignalEmitted(Signal),
    /// The last detection was not confident enough for a signal.
    SignalSuppressed,
    /// A capture arrived while a classification was running and was queued.
    CaptureQueued,
}

/// User command for a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Freeze the current frame and classify it (on-demand mode).
    Capture,
    /// Stop the camera and hold the current state.
    Pause,
    /// Restart the camera after a pause.
    Resume,
    /// Cycle to the next enumerated camera.
    SwitchDevice,
    /// Leave the error state and reinitialize.
    Retry,
    /// End the session.
    Shutdown,
}
