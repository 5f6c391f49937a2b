//! Headless camera backed by still frames written by an external capture tool.
//!
//! Each configured device points at either a single image file that the
//! capture process keeps overwriting (e.g. `libcamera-still --timelapse`
//! writing `/dev/shm/cam0.jpg`) or a directory that receives numbered frames,
//! in which case the most recently modified image is used.

use crate::camera::{DeviceInfo, Frame, FrameSource, FrameStream};
use crate::config::CameraConfig;
use crate::constants::IMAGE_EXTENSIONS;
use crate::error::{Error, Result};
use chrono::Local;
use image::RgbImage;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Frame source over configured snapshot locations.
#[derive(Debug, Clone)]
pub struct SnapshotCamera {
    cameras: Vec<CameraConfig>,
}

impl SnapshotCamera {
    /// Create a source over the given camera entries.
    pub fn new(cameras: Vec<CameraConfig>) -> Self {
        Self { cameras }
    }

    /// Resolve the entry a device was enumerated from.
    ///
    /// Labels carry the snapshot path, so entries sharing a name stay distinct.
    fn path_for(&self, device: &DeviceInfo) -> Option<&Path> {
        self.cameras
            .iter()
            .find(|c| describe(c) == *device)
            .map(|c| c.path.as_path())
    }
}

impl FrameSource for SnapshotCamera {
    fn enumerate(&self) -> Result<Vec<DeviceInfo>> {
        let devices: Vec<DeviceInfo> = self
            .cameras
            .iter()
            .filter(|camera| {
                let present = camera.path.exists();
                if !present {
                    debug!(
                        "Camera '{}' not present at {}",
                        camera.name,
                        camera.path.display()
                    );
                }
                present
            })
            .map(describe)
            .collect();

        debug!("Enumerated {} camera(s)", devices.len());
        Ok(devices)
    }

    fn open(&self, device: Option<&DeviceInfo>) -> Result<Box<dyn FrameStream>> {
        let device = match device {
            Some(device) => device.clone(),
            None => self
                .enumerate()?
                .into_iter()
                .next()
                .ok_or_else(|| Error::DeviceUnavailable {
                    reason: "no cameras configured".to_string(),
                })?,
        };

        let path = self
            .path_for(&device)
            .ok_or_else(|| Error::DeviceUnavailable {
                reason: format!("unknown camera '{}'", device.id),
            })?
            .to_path_buf();

        check_access(&device, &path)?;
        info!("Opened camera '{}' at {}", device.id, path.display());

        Ok(Box::new(SnapshotStream {
            device,
            path,
            cached: None,
            sequence: 0,
            stopped: false,
        }))
    }
}

fn describe(camera: &CameraConfig) -> DeviceInfo {
    DeviceInfo {
        id: camera.name.clone(),
        label: format!("{} ({})", camera.name, camera.path.display()),
    }
}

/// Verify the snapshot location is readable, classifying failures.
fn check_access(device: &DeviceInfo, path: &Path) -> Result<()> {
    let result = if path.is_dir() {
        std::fs::read_dir(path).map(|_| ())
    } else {
        std::fs::File::open(path).map(|_| ())
    };

    result.map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => Error::PermissionDenied {
            device: device.id.clone(),
        },
        _ => Error::DeviceUnavailable {
            reason: format!("camera '{}': {e}", device.id),
        },
    })
}

struct CachedFrame {
    path: PathBuf,
    modified: SystemTime,
    image: Arc<RgbImage>,
}

struct SnapshotStream {
    device: DeviceInfo,
    path: PathBuf,
    cached: Option<CachedFrame>,
    sequence: u64,
    stopped: bool,
}

impl SnapshotStream {
    /// Resolve the newest image file for this device.
    fn latest_file(&self) -> Result<(PathBuf, SystemTime)> {
        let unavailable = |e: std::io::Error| Error::DeviceUnavailable {
            reason: format!("camera '{}': {e}", self.device.id),
        };

        if !self.path.is_dir() {
            let modified = std::fs::metadata(&self.path)
                .and_then(|m| m.modified())
                .map_err(unavailable)?;
            return Ok((self.path.clone(), modified));
        }

        let mut newest: Option<(PathBuf, SystemTime)> = None;
        for entry in std::fs::read_dir(&self.path).map_err(unavailable)? {
            let entry = entry.map_err(unavailable)?;
            let path = entry.path();
            if !is_image_file(&path) {
                continue;
            }
            let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
                continue;
            };
            if newest.as_ref().is_none_or(|(_, t)| modified > *t) {
                newest = Some((path, modified));
            }
        }

        newest.ok_or_else(|| Error::FrameNotReady {
            device: self.device.id.clone(),
        })
    }
}

impl FrameStream for SnapshotStream {
    fn current_frame(&mut self) -> Result<Frame> {
        if self.stopped {
            return Err(Error::DeviceUnavailable {
                reason: format!("camera '{}' has been stopped", self.device.id),
            });
        }

        let (path, modified) = self.latest_file()?;
        let unchanged = self
            .cached
            .as_ref()
            .is_some_and(|c| c.path == path && c.modified == modified);

        if !unchanged {
            match image::open(&path) {
                Ok(decoded) => {
                    self.cached = Some(CachedFrame {
                        path: path.clone(),
                        modified,
                        image: Arc::new(decoded.to_rgb8()),
                    });
                }
                // The capture tool may be mid-write; reuse the previous frame.
                Err(e) if self.cached.is_some() => {
                    debug!("Keeping previous frame, {} unreadable: {e}", path.display());
                }
                Err(e) => return Err(Error::ImageDecode { path, source: e }),
            }
        }

        let cached = self.cached.as_ref().ok_or_else(|| Error::Internal {
            message: "snapshot cache empty after decode".to_string(),
        })?;

        let frame = Frame {
            image: Arc::clone(&cached.image),
            captured_at: Local::now(),
            origin: cached.path.display().to_string(),
            sequence: self.sequence,
        };
        self.sequence += 1;
        Ok(frame)
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.cached = None;
        info!("Stopped camera '{}'", self.device.id);
    }

    fn device(&self) -> &DeviceInfo {
        &self.device
    }
}

impl Drop for SnapshotStream {
    fn drop(&mut self) {
        if !self.stopped {
            warn!("Camera '{}' dropped without stop", self.device.id);
            self.stop();
        }
    }
}

/// Check if a file is a supported still-image format.
pub(crate) fn is_image_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(OsStr::new(known)))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    fn write_image(path: &Path, shade: u8) {
        RgbImage::from_pixel(8, 8, Rgb([shade, shade, shade]))
            .save(path)
            .unwrap();
    }

    fn camera(name: &str, path: &Path) -> CameraConfig {
        CameraConfig {
            name: name.to_string(),
            path: path.to_path_buf(),
        }
    }

    #[test]
    fn test_enumerate_skips_missing_devices() {
        let dir = TempDir::new().unwrap();
        let source = SnapshotCamera::new(vec![
            camera("front", dir.path()),
            camera("back", &dir.path().join("missing")),
        ]);

        let devices = source.enumerate().unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, "front");
    }

    #[test]
    fn test_open_without_devices_is_unavailable() {
        let source = SnapshotCamera::new(vec![]);
        let err = source.open(None).err().unwrap();
        assert!(matches!(err, Error::DeviceUnavailable { .. }));
    }

    #[test]
    fn test_directory_camera_reads_newest_frame() {
        let dir = TempDir::new().unwrap();
        write_image(&dir.path().join("a.png"), 10);
        std::thread::sleep(std::time::Duration::from_millis(20));
        write_image(&dir.path().join("b.png"), 200);

        let source = SnapshotCamera::new(vec![camera("yard", dir.path())]);
        let mut stream = source.open(None).unwrap();

        let frame = stream.current_frame().unwrap();
        assert!(frame.origin.ends_with("b.png"));
        assert_eq!(frame.image.get_pixel(0, 0), &Rgb([200, 200, 200]));
        assert_eq!(frame.sequence, 0);
        assert_eq!(stream.current_frame().unwrap().sequence, 1);
    }

    #[test]
    fn test_stop_is_idempotent_and_blocks_frames() {
        let dir = TempDir::new().unwrap();
        write_image(&dir.path().join("frame.png"), 50);

        let source = SnapshotCamera::new(vec![camera("yard", &dir.path().join("frame.png"))]);
        let mut stream = source.open(None).unwrap();
        assert!(stream.current_frame().is_ok());

        stream.stop();
        stream.stop();
        assert!(stream.current_frame().is_err());
    }

    #[test]
    fn test_empty_directory_is_not_ready() {
        let dir = TempDir::new().unwrap();
        let source = SnapshotCamera::new(vec![camera("yard", dir.path())]);
        let mut stream = source.open(None).unwrap();

        let err = stream.current_frame().unwrap_err();
        assert!(matches!(err, Error::FrameNotReady { .. }));
    }

    #[test]
    fn test_devices_sharing_a_name_open_their_own_path() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("a.png");
        let second = dir.path().join("b.png");
        write_image(&first, 10);
        write_image(&second, 200);

        let source = SnapshotCamera::new(vec![camera("yard", &first), camera("yard", &second)]);
        let devices = source.enumerate().unwrap();
        assert_eq!(devices.len(), 2);

        let mut stream = source.open(Some(&devices[1])).unwrap();
        assert!(stream.current_frame().unwrap().origin.ends_with("b.png"));
        assert_eq!(stream.device(), &devices[1]);
    }

    #[test]
    fn test_open_unknown_device_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let source = SnapshotCamera::new(vec![camera("yard", dir.path())]);
        let stranger = DeviceInfo {
            id: "yard".to_string(),
            label: "yard (/elsewhere)".to_string(),
        };

        let err = source.open(Some(&stranger)).err().unwrap();
        assert!(matches!(err, Error::DeviceUnavailable { .. }));
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("deer.JPG")));
        assert!(is_image_file(Path::new("frame.png")));
        assert!(!is_image_file(Path::new("notes.txt")));
    }
}
