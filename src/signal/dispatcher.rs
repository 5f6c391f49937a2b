//! Confidence-gated deterrent signal dispatch.

use crate::config::SignalConfig;
use crate::constants::{SIGNAL_THRESHOLD, signal::HZ_PER_KHZ};
use crate::detection::Detection;
use crate::signal::{AudioSink, Tone};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A deterrent signal chosen for a detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    /// Tone frequency in kHz.
    pub frequency_khz: f32,
    /// Tone length.
    pub duration: Duration,
}

/// Whether a detection warrants a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalDecision {
    /// Emit this signal.
    Emit(Signal),
    /// Confidence too low; stay silent.
    Suppress,
}

impl SignalDecision {
    /// Whether a signal is emitted.
    pub const fn is_emit(&self) -> bool {
        matches!(self, Self::Emit(_))
    }
}

impl fmt::Display for SignalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emit(signal) => {
                write!(f, "{} kHz signal emitted", format_khz(signal.frequency_khz))
            }
            Self::Suppress => f.write_str("No signal emitted"),
        }
    }
}

/// Format a kHz value with one decimal, rounding halves away from zero.
fn format_khz(khz: f32) -> String {
    format!("{:.1}", (khz * 10.0).round() / 10.0)
}

/// Signal decision for `detection` with a tone of `duration`.
pub fn decide(detection: &Detection, duration: Duration) -> SignalDecision {
    if detection.confidence() >= SIGNAL_THRESHOLD {
        SignalDecision::Emit(Signal {
            frequency_khz: detection.audio_range().midpoint_khz(),
            duration,
        })
    } else {
        SignalDecision::Suppress
    }
}

/// A tone playing in the background.
#[derive(Debug)]
pub struct Emission {
    handle: JoinHandle<()>,
}

impl Emission {
    /// Whether the sink has already returned.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait until the sink has finished with the tone.
    pub async fn finished(self) {
        if let Err(e) = self.handle.await {
            warn!("Signal task failed: {e}");
        }
    }
}

/// Turns detections into deterrent tones.
#[derive(Clone)]
pub struct SignalDispatcher {
    sink: Arc<dyn AudioSink>,
    duration: Duration,
    fade_in: Duration,
    gain: f32,
}

impl SignalDispatcher {
    /// Create a dispatcher with explicit tone parameters.
    pub fn new(sink: Arc<dyn AudioSink>, duration: Duration, fade_in: Duration, gain: f32) -> Self {
        Self {
            sink,
            duration,
            fade_in,
            gain,
        }
    }

    /// Create a dispatcher from configuration.
    pub fn from_config(sink: Arc<dyn AudioSink>, config: &SignalConfig) -> Self {
        Self::new(
            sink,
            Duration::from_millis(config.duration_ms),
            Duration::from_millis(config.fade_in_ms),
            config.gain,
        )
    }

    /// Decide whether `detection` warrants a signal.
    ///
    /// Emits at the midpoint of the species' hearing range iff confidence is
    /// at least the signal threshold.
    pub fn decide(&self, detection: &Detection) -> SignalDecision {
        decide(detection, self.duration)
    }

    /// The tone that realizes `signal`.
    pub fn tone(&self, signal: &Signal) -> Tone {
        Tone::new(
            signal.frequency_khz * HZ_PER_KHZ,
            signal.duration,
            self.fade_in,
            self.gain,
        )
    }

    /// Decide and, if warranted, start the tone on the blocking pool.
    ///
    /// Returns immediately. Sink failures are logged and never reach the
    /// caller. Must be called from within a tokio runtime.
    pub fn dispatch(&self, detection: &Detection) -> (SignalDecision, Option<Emission>) {
        let decision = self.decide(detection);
        let SignalDecision::Emit(signal) = decision else {
            debug!(
                "Signal suppressed for {} at {}",
                detection.animal(),
                detection.confidence_percent()
            );
            return (decision, None);
        };

        info!(
            "Emitting {} kHz deterrent for {}",
            format_khz(signal.frequency_khz),
            detection.animal()
        );
        let tone = self.tone(&signal);
        let sink = Arc::clone(&self.sink);
        let handle = tokio::task::spawn_blocking(move || {
            if let Err(e) = sink.emit(&tone) {
                warn!("Deterrent signal not played: {e}");
            }
        });

        (decision, Some(Emission { handle }))
    }
}

impl fmt::Debug for SignalDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalDispatcher")
            .field("duration", &self.duration)
            .field("fade_in", &self.fade_in)
            .field("gain", &self.gain)
            .finish_non_exhaustive()
    }
}
