//! Deterrent tone synthesis.

use crate::error::{Error, Result};
use std::f32::consts::TAU;
use std::time::Duration;

/// A sine tone with a linear fade-in and a linear fade-out to silence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    frequency_hz: f32,
    duration: Duration,
    fade_in: Duration,
    gain: f32,
}

impl Tone {
    /// Create a tone. `fade_in` is clamped to `duration`.
    pub fn new(frequency_hz: f32, duration: Duration, fade_in: Duration, gain: f32) -> Self {
        Self {
            frequency_hz,
            duration,
            fade_in: fade_in.min(duration),
            gain,
        }
    }

    /// Oscillator frequency in Hz.
    pub const fn frequency_hz(&self) -> f32 {
        self.frequency_hz
    }

    /// Total length of the tone.
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Peak amplitude.
    pub const fn gain(&self) -> f32 {
        self.gain
    }

    /// Amplitude envelope at `t` seconds from the start.
    ///
    /// Rises from zero to the gain over the fade-in, then falls linearly to
    /// zero at the end of the tone.
    pub fn envelope(&self, t: f32) -> f32 {
        let total = self.duration.as_secs_f32();
        let fade_in = self.fade_in.as_secs_f32();

        if t <= 0.0 || t >= total {
            return 0.0;
        }
        if t < fade_in {
            return self.gain * t / fade_in;
        }
        let fade_out = total - fade_in;
        if fade_out <= 0.0 {
            return 0.0;
        }
        self.gain * (total - t) / fade_out
    }

    /// Render mono samples at `sample_rate`.
    ///
    /// Fails with `AudioUnavailable` if the tone cannot be represented at this
    /// rate (frequency at or above Nyquist, or not a positive number).
    pub fn render(&self, sample_rate: u32) -> Result<Vec<f32>> {
        if sample_rate == 0 {
            return Err(Error::AudioUnavailable {
                reason: "sample rate must be positive".to_string(),
            });
        }
        if !self.frequency_hz.is_finite() || self.frequency_hz <= 0.0 {
            return Err(Error::AudioUnavailable {
                reason: format!("invalid tone frequency {} Hz", self.frequency_hz),
            });
        }

        #[allow(clippy::cast_precision_loss)]
        let rate = sample_rate as f32;
        let nyquist = rate / 2.0;
        if self.frequency_hz >= nyquist {
            return Err(Error::AudioUnavailable {
                reason: format!(
                    "{} Hz tone needs a sample rate above {} Hz (configured {sample_rate} Hz)",
                    self.frequency_hz,
                    self.frequency_hz * 2.0
                ),
            });
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = (self.duration.as_secs_f64() * f64::from(sample_rate)).round() as usize;

        #[allow(clippy::cast_precision_loss)]
        let samples = (0..count)
            .map(|i| {
                let t = i as f32 / rate;
                self.envelope(t) * (TAU * self.frequency_hz * t).sin()
            })
            .collect();

        Ok(samples)
    }
}
