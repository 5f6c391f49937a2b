//! Detection session state machine.

use crate::camera::{DeviceInfo, Frame, FrameSource, FrameStream};
use crate::config::CaptureMode;
use crate::detection::{Detection, DetectionSink};
use crate::error::{Error, Result};
use crate::inference::{Classifier, ModelHandle, Prediction, Verdict, evaluate};
use crate::session::{FailureReason, SessionEvent, SessionState};
use crate::signal::{Emission, SignalDecision, SignalDispatcher};
use image::ImageFormat;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Per-session options.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Classification mode.
    pub mode: CaptureMode,
    /// Directory accepted frames are saved to.
    pub snapshot_dir: Option<PathBuf>,
}

/// Result of one classification call, tagged with its submission id.
#[derive(Debug)]
pub(crate) struct Completion {
    id: u64,
    result: Result<Vec<Prediction>>,
}

/// The classification currently in flight.
struct PendingInference {
    id: u64,
    epoch: u64,
    frame: Frame,
}

/// Owns the camera stream and the classifier for one detection session.
///
/// All methods run on a single task. Classification runs on the blocking
/// pool and reports back through an internal channel; [`settle`](Self::settle)
/// (or the driver loop) applies each result. At most one classification is
/// in flight at any time.
///
/// Every pause, device switch, failure and shutdown bumps an epoch counter.
/// A result submitted under an older epoch is discarded when it arrives.
pub struct SessionController {
    source: Arc<dyn FrameSource>,
    model: Arc<ModelHandle>,
    dispatcher: SignalDispatcher,
    log: Arc<dyn DetectionSink>,
    options: SessionOptions,

    state: SessionState,
    devices: Vec<DeviceInfo>,
    active_device_index: usize,
    stream: Option<Box<dyn FrameStream>>,
    classifier: Option<Arc<dyn Classifier>>,

    epoch: u64,
    next_inference_id: u64,
    pending: Option<PendingInference>,
    capture_queued: bool,
    current_detection: Option<Detection>,
    frozen: Option<Frame>,
    emissions: Vec<Emission>,

    events: mpsc::UnboundedSender<SessionEvent>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl SessionController {
    /// Create a controller and the receiver for its events.
    ///
    /// Nothing is acquired until [`start`](Self::start).
    pub fn new(
        source: Arc<dyn FrameSource>,
        model: Arc<ModelHandle>,
        dispatcher: SignalDispatcher,
        log: Arc<dyn DetectionSink>,
        options: SessionOptions,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let controller = Self {
            source,
            model,
            dispatcher,
            log,
            options,
            state: SessionState::Initializing,
            devices: Vec::new(),
            active_device_index: 0,
            stream: None,
            classifier: None,
            epoch: 0,
            next_inference_id: 0,
            pending: None,
            capture_queued: false,
            current_detection: None,
            frozen: None,
            emissions: Vec::new(),
            events,
            completions_tx,
            completions_rx,
        };

        (controller, events_rx)
    }

    /// Current state.
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Classification mode.
    pub const fn mode(&self) -> CaptureMode {
        self.options.mode
    }

    /// Devices enumerated at start.
    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    /// Index of the selected device.
    pub const fn active_device_index(&self) -> usize {
        self.active_device_index
    }

    /// The selected device, if any were enumerated.
    pub fn active_device(&self) -> Option<&DeviceInfo> {
        self.devices.get(self.active_device_index)
    }

    /// Detection shown while paused.
    pub fn current_detection(&self) -> Option<&Detection> {
        self.current_detection.as_ref()
    }

    /// Frame frozen by the last on-demand capture.
    pub fn frozen_frame(&self) -> Option<&Frame> {
        self.frozen.as_ref()
    }

    /// Whether a classification is in flight.
    pub const fn has_pending_inference(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether a capture is waiting for the in-flight classification.
    pub const fn is_capture_queued(&self) -> bool {
        self.capture_queued
    }

    /// Whether a camera stream is open.
    pub const fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Enumerate devices once and initialize.
    pub async fn start(&mut self) {
        info!("Starting {} session", self.options.mode);
        if !self.enumerate_devices() {
            return;
        }
        self.initialize().await;
    }

    /// Acquire the classifier and open the selected device.
    ///
    /// Success enters `Live`; failure enters `Error` with nothing held open.
    pub async fn initialize(&mut self) {
        self.release_stream();
        self.set_state(SessionState::Initializing);

        match self.model.acquire().await {
            Ok(classifier) => self.classifier = Some(classifier),
            Err(e) => {
                self.fail(FailureReason::ModelLoadFailure, &e);
                return;
            }
        }

        let Some(device) = self.devices.get(self.active_device_index).cloned() else {
            let e = Error::DeviceUnavailable {
                reason: "no camera devices found".to_string(),
            };
            self.fail(FailureReason::DeviceUnavailable, &e);
            return;
        };

        match self.source.open(Some(&device)) {
            Ok(stream) => {
                info!("Camera '{}' is live", device.id);
                self.stream = Some(stream);
                self.set_state(SessionState::Live);
            }
            Err(e) => self.fail(FailureReason::from_camera_error(&e), &e),
        }
    }

    /// One frame tick.
    ///
    /// Draws the current frame. In continuous mode the frame is submitted for
    /// classification unless one is already in flight, in which case the
    /// tick is skipped.
    pub fn step(&mut self) {
        if !self.state.is_live() {
            return;
        }
        if self.options.mode == CaptureMode::OnDemand && self.frozen.is_some() {
            return;
        }

        let Some(frame) = self.draw_frame() else {
            return;
        };

        if self.options.mode == CaptureMode::Continuous {
            if self.pending.is_some() {
                trace!("Frame {} skipped, inference pending", frame.sequence);
                return;
            }
            self.submit(frame);
        }
    }

    /// Freeze the current frame and classify it (on-demand mode).
    ///
    /// A capture received while a classification is in flight is queued and
    /// runs once that classification resolves. Repeated captures collapse
    /// into one queued capture.
    pub fn capture(&mut self) {
        if self.options.mode != CaptureMode::OnDemand {
            debug!("Capture ignored in {} mode", self.options.mode);
            return;
        }
        if !self.state.is_live() {
            debug!("Capture ignored while {}", self.state);
            return;
        }
        if self.pending.is_some() {
            if !self.capture_queued {
                debug!("Capture queued behind pending inference");
                self.capture_queued = true;
                self.emit(SessionEvent::CaptureQueued);
            }
            return;
        }

        let Some(frame) = self.draw_frame() else {
            return;
        };
        self.frozen = Some(frame.clone());
        self.submit(frame);
    }

    /// Wait for the in-flight classification and apply its result.
    ///
    /// Returns immediately when nothing is in flight.
    pub async fn settle(&mut self) {
        if self.pending.is_none() {
            return;
        }
        if let Some(completion) = self.next_completion().await {
            self.apply(completion);
        }
    }

    /// Stop the camera, keeping the current detection.
    pub fn pause(&mut self) {
        if !self.state.is_live() {
            debug!("Pause ignored while {}", self.state);
            return;
        }
        self.release_stream();
        self.invalidate();
        self.set_state(SessionState::Paused);
    }

    /// Clear the detection and restart the camera.
    pub async fn resume(&mut self) {
        if self.state != SessionState::Paused {
            debug!("Resume ignored while {}", self.state);
            return;
        }
        self.current_detection = None;
        self.frozen = None;
        self.initialize().await;
    }

    /// Advance to the next enumerated device.
    ///
    /// No effect with fewer than two devices.
    pub async fn switch_device(&mut self) {
        if self.devices.len() < 2 {
            debug!("Device switch ignored, {} device(s)", self.devices.len());
            return;
        }

        self.release_stream();
        self.invalidate();
        self.current_detection = None;
        self.active_device_index = (self.active_device_index + 1) % self.devices.len();
        self.announce_device();
        self.initialize().await;
    }

    /// Leave the error state and reinitialize.
    pub async fn retry(&mut self) {
        if !matches!(self.state, SessionState::Error(_)) {
            debug!("Retry ignored while {}", self.state);
            return;
        }
        info!("Retrying session initialization");
        if self.devices.is_empty() && !self.enumerate_devices() {
            return;
        }
        self.initialize().await;
    }

    /// Release the camera and discard any in-flight result.
    pub fn shutdown(&mut self) {
        info!("Shutting down session");
        self.release_stream();
        self.invalidate();
    }

    /// Wait for every started tone to finish.
    pub async fn flush_signals(&mut self) {
        for emission in self.emissions.drain(..) {
            emission.finished().await;
        }
    }

    /// Next classification result from the blocking pool.
    pub(crate) async fn next_completion(&mut self) -> Option<Completion> {
        self.completions_rx.recv().await
    }

    /// Apply a classification result.
    pub(crate) fn apply(&mut self, completion: Completion) {
        let Some(pending) = self.pending.take_if(|p| p.id == completion.id) else {
            debug!("Ignoring result of unknown inference #{}", completion.id);
            return;
        };

        if pending.epoch != self.epoch || !self.state.is_live() {
            debug!("Discarding stale result of inference #{}", pending.id);
            self.run_queued_capture();
            return;
        }

        match completion.result {
            Err(e) => {
                warn!("Inference #{} failed: {e}", pending.id);
                self.frozen = None;
                self.emit(SessionEvent::InferenceFailed {
                    reason: e.to_string(),
                });
            }
            Ok(predictions) => match evaluate(&predictions) {
                Verdict::Accepted(best) => {
                    self.accept(pending.frame, best);
                    return;
                }
                Verdict::Rejected(best) => {
                    if let Some(best) = best {
                        debug!(
                            "Inference #{}: best {} at {:.3}, below threshold",
                            pending.id, best.label, best.probability
                        );
                    }
                    if self.options.mode == CaptureMode::OnDemand {
                        self.frozen = None;
                        self.emit(SessionEvent::NoDetection { best });
                    }
                }
            },
        }

        self.run_queued_capture();
    }

    fn enumerate_devices(&mut self) -> bool {
        match self.source.enumerate() {
            Ok(devices) => {
                info!("Found {} camera device(s)", devices.len());
                self.devices = devices;
                self.active_device_index = 0;
                self.announce_device();
                true
            }
            Err(e) => {
                self.fail(FailureReason::from_camera_error(&e), &e);
                false
            }
        }
    }

    fn announce_device(&mut self) {
        if let Some(device) = self.devices.get(self.active_device_index).cloned() {
            self.emit(SessionEvent::DeviceSelected {
                index: self.active_device_index,
                device,
            });
        }
    }

    /// Draw a frame, entering `Error` if the device is gone.
    fn draw_frame(&mut self) -> Option<Frame> {
        let stream = self.stream.as_mut()?;
        match stream.current_frame() {
            Ok(frame) => Some(frame),
            Err(e @ (Error::PermissionDenied { .. } | Error::DeviceUnavailable { .. })) => {
                self.fail(FailureReason::from_camera_error(&e), &e);
                None
            }
            Err(e) => {
                debug!("No frame this tick: {e}");
                None
            }
        }
    }

    fn submit(&mut self, frame: Frame) {
        let Some(classifier) = self.classifier.clone() else {
            return;
        };

        self.next_inference_id += 1;
        let id = self.next_inference_id;
        let image = Arc::clone(&frame.image);
        let completions = self.completions_tx.clone();

        debug!("Submitting frame {} as inference #{id}", frame.sequence);
        tokio::task::spawn_blocking(move || {
            let result = classifier.classify(&image);
            if completions.send(Completion { id, result }).is_err() {
                trace!("Session gone before inference #{id} resolved");
            }
        });

        self.pending = Some(PendingInference {
            id,
            epoch: self.epoch,
            frame,
        });
    }

    fn run_queued_capture(&mut self) {
        if self.capture_queued && self.pending.is_none() {
            self.capture_queued = false;
            self.capture();
        }
    }

    /// Build the detection from the submitted frame and pause.
    fn accept(&mut self, frame: Frame, best: Prediction) {
        let image_url = self.store_snapshot(&frame);
        let detection = Detection::new(best.label, best.probability, frame.captured_at, image_url);
        info!("Detected {detection}");

        let (decision, emission) = self.dispatcher.dispatch(&detection);
        if let Some(emission) = emission {
            self.emissions.retain(|e| !e.is_finished());
            self.emissions.push(emission);
        }
        self.log.append(detection.clone());

        self.release_stream();
        self.capture_queued = false;
        self.current_detection = Some(detection.clone());

        self.emit(SessionEvent::Detection(detection));
        self.emit(match decision {
            SignalDecision::Emit(signal) => SessionEvent::SignalEmitted(signal),
            SignalDecision::Suppress => SessionEvent::SignalSuppressed,
        });
        self.set_state(SessionState::Paused);
    }

    /// Save the frame if a snapshot directory is configured.
    ///
    /// Returns the reference stored in the detection: the saved file, or
    /// the frame's origin when nothing was saved.
    fn store_snapshot(&self, frame: &Frame) -> String {
        let Some(dir) = &self.options.snapshot_dir else {
            return frame.origin.clone();
        };

        let path = dir.join(format!(
            "capture_{}_{}.jpg",
            frame.captured_at.format("%Y%m%dT%H%M%S%.3f"),
            frame.sequence
        ));
        let saved = std::fs::create_dir_all(dir)
            .map_err(Error::from)
            .and_then(|()| {
                frame
                    .image
                    .save_with_format(&path, ImageFormat::Jpeg)
                    .map_err(|source| Error::SnapshotWrite {
                        path: path.clone(),
                        source,
                    })
            });

        match saved {
            Ok(()) => {
                debug!("Saved snapshot {}", path.display());
                path.display().to_string()
            }
            Err(e) => {
                warn!("Snapshot not saved: {e}");
                frame.origin.clone()
            }
        }
    }

    fn fail(&mut self, reason: FailureReason, error: &Error) {
        warn!("Session failed ({reason}): {error}");
        self.release_stream();
        self.invalidate();
        self.set_state(SessionState::Error(reason));
        self.emit(SessionEvent::Failed {
            reason,
            detail: error.to_string(),
        });
    }

    /// Stop the stream if one is open. The stream is stopped exactly once.
    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("Releasing camera '{}'", stream.device().id);
            stream.stop();
        }
    }

    /// Make any in-flight result stale.
    fn invalidate(&mut self) {
        self.epoch += 1;
        self.capture_queued = false;
        self.frozen = None;
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        info!("Session {} -> {}", self.state, state);
        self.state = state;
        self.emit(SessionEvent::StateChanged(state));
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            trace!("Session event dropped, no receiver");
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.release_stream();
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("mode", &self.options.mode)
            .field("devices", &self.devices.len())
            .field("active_device_index", &self.active_device_index)
            .field("epoch", &self.epoch)
            .field("pending", &self.pending.as_ref().map(|p| p.id))
            .finish_non_exhaustive()
    }
}
