//! Camera frame sources.
//!
//! A [`FrameSource`] enumerates camera devices and opens a [`FrameStream`]
//! for one of them. Streams hand out the most recent frame on demand and
//! release their resources on [`FrameStream::stop`].

mod snapshot;

pub use snapshot::SnapshotCamera;
pub(crate) use snapshot::is_image_file;

use crate::error::Result;
use chrono::{DateTime, Local};
use image::RgbImage;
use std::sync::Arc;

/// Descriptor of an enumerated camera device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Stable device identifier.
    pub id: String,
    /// Human-readable label.
    pub label: String,
}

/// A single image frame drawn from a stream.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded RGB pixels.
    pub image: Arc<RgbImage>,
    /// Instant the frame was drawn.
    pub captured_at: DateTime<Local>,
    /// Where the frame came from (file path or device reference).
    pub origin: String,
    /// Position of this frame in its stream, starting at 0.
    pub sequence: u64,
}

/// Abstraction over the set of camera devices.
pub trait FrameSource: Send + Sync {
    /// List available devices in a stable order.
    fn enumerate(&self) -> Result<Vec<DeviceInfo>>;

    /// Open a stream for `device`, or for the default device when `None`.
    ///
    /// Fails with `DeviceUnavailable` when no matching device exists and
    /// `PermissionDenied` when access is refused.
    fn open(&self, device: Option<&DeviceInfo>) -> Result<Box<dyn FrameStream>>;
}

/// A live stream of frames from one device.
pub trait FrameStream: Send {
    /// Draw the current frame.
    fn current_frame(&mut self) -> Result<Frame>;

    /// Release all resources. Calling this more than once has no effect.
    fn stop(&mut self);

    /// Device this stream was opened for.
    fn device(&self) -> &DeviceInfo;
}
