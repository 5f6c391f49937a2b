//! Test doubles for cameras, classifiers and audio sinks.

#![allow(dead_code, clippy::unwrap_used)]

use chrono::Local;
use image::RgbImage;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use wildguard::camera::{DeviceInfo, Frame, FrameSource, FrameStream};
use wildguard::config::CaptureMode;
use wildguard::detection::{DetectionSink, SessionLog, Species};
use wildguard::inference::{Classifier, ClassifierGateway, ModelHandle, Prediction};
use wildguard::session::{SessionController, SessionEvent, SessionOptions};
use wildguard::signal::{AudioSink, SignalDispatcher, Tone};
use wildguard::{Error, Result};

/// What `open` should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenBehavior {
    Succeed,
    Deny,
}

/// Camera with a fixed device list that records every stream it opens.
pub struct MockCamera {
    devices: Vec<DeviceInfo>,
    open_behavior: Mutex<OpenBehavior>,
    streams: Mutex<Vec<StreamProbe>>,
}

/// Observation handle for one opened stream.
#[derive(Clone)]
pub struct StreamProbe {
    pub device: DeviceInfo,
    stops: Arc<AtomicUsize>,
}

impl StreamProbe {
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl MockCamera {
    pub fn with_devices(count: usize) -> Arc<Self> {
        let devices = (0..count)
            .map(|i| DeviceInfo {
                id: format!("cam{i}"),
                label: format!("Camera {i}"),
            })
            .collect();
        Arc::new(Self {
            devices,
            open_behavior: Mutex::new(OpenBehavior::Succeed),
            streams: Mutex::new(Vec::new()),
        })
    }

    pub fn set_open_behavior(&self, behavior: OpenBehavior) {
        *self.open_behavior.lock().unwrap() = behavior;
    }

    pub fn streams(&self) -> Vec<StreamProbe> {
        self.streams.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.streams.lock().unwrap().len()
    }
}

impl FrameSource for MockCamera {
    fn enumerate(&self) -> Result<Vec<DeviceInfo>> {
        Ok(self.devices.clone())
    }

    fn open(&self, device: Option<&DeviceInfo>) -> Result<Box<dyn FrameStream>> {
        let device = device
            .or_else(|| self.devices.first())
            .cloned()
            .ok_or_else(|| Error::DeviceUnavailable {
                reason: "no devices".to_string(),
            })?;

        if *self.open_behavior.lock().unwrap() == OpenBehavior::Deny {
            return Err(Error::PermissionDenied { device: device.id });
        }

        let stops = Arc::new(AtomicUsize::new(0));
        self.streams.lock().unwrap().push(StreamProbe {
            device: device.clone(),
            stops: Arc::clone(&stops),
        });

        Ok(Box::new(MockStream {
            device,
            stops,
            stopped: false,
            sequence: 0,
        }))
    }
}

struct MockStream {
    device: DeviceInfo,
    stops: Arc<AtomicUsize>,
    stopped: bool,
    sequence: u64,
}

impl FrameStream for MockStream {
    fn current_frame(&mut self) -> Result<Frame> {
        if self.stopped {
            return Err(Error::DeviceUnavailable {
                reason: "stream stopped".to_string(),
            });
        }
        let sequence = self.sequence;
        self.sequence += 1;
        Ok(Frame {
            image: Arc::new(RgbImage::new(4, 4)),
            captured_at: Local::now(),
            origin: format!("{}/frame{sequence}", self.device.id),
            sequence,
        })
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.stopped = true;
    }

    fn device(&self) -> &DeviceInfo {
        &self.device
    }
}

/// Classifier that replays scripted results, optionally after a delay.
pub struct ScriptedClassifier {
    script: Mutex<VecDeque<Result<Vec<Prediction>>>>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new(script: Vec<Result<Vec<Prediction>>>) -> Arc<Self> {
        Self::with_delay(script, Duration::ZERO)
    }

    pub fn with_delay(script: Vec<Result<Vec<Prediction>>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Classifier for ScriptedClassifier {
    fn classify(&self, _image: &RgbImage) -> Result<Vec<Prediction>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let next = self.script.lock().unwrap().pop_front();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        next.unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Gateway that fails a fixed number of loads before succeeding.
pub struct FlakyGateway {
    classifier: Arc<ScriptedClassifier>,
    failures_left: AtomicUsize,
    loads: AtomicUsize,
    delay: Duration,
}

impl FlakyGateway {
    pub fn new(classifier: Arc<ScriptedClassifier>, failures: usize) -> Arc<Self> {
        Self::with_delay(classifier, failures, Duration::ZERO)
    }

    pub fn with_delay(
        classifier: Arc<ScriptedClassifier>,
        failures: usize,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            classifier,
            failures_left: AtomicUsize::new(failures),
            loads: AtomicUsize::new(0),
            delay,
        })
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ClassifierGateway for FlakyGateway {
    fn load(&self) -> Result<Arc<dyn Classifier>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(Error::ModelLoad {
                reason: "model download failed".to_string(),
            });
        }
        Ok(Arc::clone(&self.classifier) as Arc<dyn Classifier>)
    }
}

/// Sink that records tone frequencies instead of playing them.
#[derive(Default)]
pub struct RecordingSink {
    tones: Mutex<Vec<f32>>,
}

impl RecordingSink {
    pub fn frequencies(&self) -> Vec<f32> {
        self.tones.lock().unwrap().clone()
    }
}

impl AudioSink for RecordingSink {
    fn emit(&self, tone: &Tone) -> Result<()> {
        self.tones.lock().unwrap().push(tone.frequency_hz());
        Ok(())
    }
}

pub fn predictions(pairs: &[(Species, f32)]) -> Vec<Prediction> {
    pairs
        .iter()
        .map(|&(species, probability)| Prediction::new(species, probability))
        .collect()
}

/// A controller wired to test doubles.
pub struct Harness {
    pub controller: SessionController,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub camera: Arc<MockCamera>,
    pub classifier: Arc<ScriptedClassifier>,
    pub gateway: Arc<FlakyGateway>,
    pub sink: Arc<RecordingSink>,
    pub log: Arc<SessionLog>,
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            devices: 1,
            mode: CaptureMode::Continuous,
            script: Vec::new(),
            delay: Duration::ZERO,
            load_failures: 0,
            load_delay: Duration::ZERO,
            snapshot_dir: None,
        }
    }

    /// Drain every event published so far.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

pub struct HarnessBuilder {
    devices: usize,
    mode: CaptureMode,
    script: Vec<Result<Vec<Prediction>>>,
    delay: Duration,
    load_failures: usize,
    load_delay: Duration,
    snapshot_dir: Option<PathBuf>,
}

impl HarnessBuilder {
    pub fn devices(mut self, devices: usize) -> Self {
        self.devices = devices;
        self
    }

    pub fn mode(mut self, mode: CaptureMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn script(mut self, script: Vec<Result<Vec<Prediction>>>) -> Self {
        self.script = script;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn load_failures(mut self, failures: usize) -> Self {
        self.load_failures = failures;
        self
    }

    pub fn load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Harness {
        let camera = MockCamera::with_devices(self.devices);
        let classifier = ScriptedClassifier::with_delay(self.script, self.delay);
        let gateway =
            FlakyGateway::with_delay(Arc::clone(&classifier), self.load_failures, self.load_delay);
        let sink = Arc::new(RecordingSink::default());
        let log = Arc::new(SessionLog::new());

        let dispatcher = SignalDispatcher::new(
            Arc::clone(&sink) as Arc<dyn AudioSink>,
            Duration::from_secs(3),
            Duration::from_millis(100),
            0.1,
        );
        let model = Arc::new(ModelHandle::new(
            Arc::clone(&gateway) as Arc<dyn ClassifierGateway>
        ));

        let (controller, events) = SessionController::new(
            Arc::clone(&camera) as Arc<dyn FrameSource>,
            model,
            dispatcher,
            Arc::clone(&log) as Arc<dyn DetectionSink>,
            SessionOptions {
                mode: self.mode,
                snapshot_dir: self.snapshot_dir,
            },
        );

        Harness {
            controller,
            events,
            camera,
            classifier,
            gateway,
            sink,
            log,
        }
    }
}
