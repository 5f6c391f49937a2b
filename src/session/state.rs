//! Session states and failure categories.

use crate::error::Error;
use std::fmt;

/// Why a session entered the error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Camera access was refused.
    PermissionDenied,
    /// No camera could be enumerated or opened.
    DeviceUnavailable,
    /// The classifier could not be loaded.
    ModelLoadFailure,
}

impl FailureReason {
    /// Categorize a camera error.
    pub fn from_camera_error(error: &Error) -> Self {
        match error {
            Error::PermissionDenied { .. } => Self::PermissionDenied,
            _ => Self::DeviceUnavailable,
        }
    }

    /// Blocking message shown to the user, with the retry hint.
    pub const fn message(self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Camera access was denied. Grant access to the camera, then retry."
            }
            Self::DeviceUnavailable => "No camera is available. Connect a camera, then retry.",
            Self::ModelLoadFailure => {
                "The classifier could not be loaded. Check the model files, then retry."
            }
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::DeviceUnavailable => write!(f, "device unavailable"),
            Self::ModelLoadFailure => write!(f, "model load failure"),
        }
    }
}

/// Lifecycle state of a detection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Acquiring the classifier and the camera.
    Initializing,
    /// Camera running; classification enabled.
    Live,
    /// Camera released; the last detection is retained.
    Paused,
    /// Capture and classification disabled until retry.
    Error(FailureReason),
}

impl SessionState {
    /// Whether the camera is running.
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Live => write!(f, "live"),
            Self::Paused => write!(f, "paused"),
            Self::Error(reason) => write!(f, "error ({reason})"),
        }
    }
}
