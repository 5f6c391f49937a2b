//! Audio sinks for rendered tones.

use crate::config::{SignalConfig, SinkKind};
use crate::error::{Error, Result};
use crate::signal::Tone;
use chrono::Local;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, info};

/// Destination for deterrent tones.
///
/// `emit` may block for the whole length of the tone; the dispatcher always
/// calls it from the blocking pool.
pub trait AudioSink: Send + Sync {
    /// Render and output `tone`.
    fn emit(&self, tone: &Tone) -> Result<()>;
}

/// Discards every tone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn emit(&self, tone: &Tone) -> Result<()> {
        debug!("Muted {} Hz tone", tone.frequency_hz());
        Ok(())
    }
}

/// Writes each tone to a timestamped WAV file.
#[derive(Debug, Clone)]
pub struct WavSink {
    dir: PathBuf,
    sample_rate: u32,
}

impl WavSink {
    /// Create a sink writing into `dir` (created on first use).
    pub fn new(dir: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            dir: dir.into(),
            sample_rate,
        }
    }
}

impl AudioSink for WavSink {
    fn emit(&self, tone: &Tone) -> Result<()> {
        let samples = tone.render(self.sample_rate)?;
        std::fs::create_dir_all(&self.dir)?;

        let filename = format!(
            "tone_{:.0}hz_{}.wav",
            tone.frequency_hz(),
            Local::now().format("%Y%m%dT%H%M%S%.3f")
        );
        let path = self.dir.join(filename);
        write_wav_file(&path, &samples, self.sample_rate)?;

        info!("Wrote tone to {}", path.display());
        Ok(())
    }
}

/// Plays each tone through an external command such as `aplay`.
///
/// The tone is rendered to a temporary WAV whose path is appended to the
/// command line.
#[derive(Debug, Clone)]
pub struct PlayerSink {
    program: String,
    args: Vec<String>,
    sample_rate: u32,
}

impl PlayerSink {
    /// Create a player sink. `command` is split on whitespace.
    pub fn new(command: &str, sample_rate: u32) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| Error::ConfigValidation {
            message: "signal.player must not be empty".to_string(),
        })?;

        Ok(Self {
            program,
            args: parts.collect(),
            sample_rate,
        })
    }
}

impl AudioSink for PlayerSink {
    fn emit(&self, tone: &Tone) -> Result<()> {
        let samples = tone.render(self.sample_rate)?;

        let file = tempfile::Builder::new()
            .prefix("wildguard_tone_")
            .suffix(".wav")
            .tempfile()?;
        write_wav_file(file.path(), &samples, self.sample_rate)?;

        debug!("Playing tone with {}", self.program);
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(file.path())
            .status()
            .map_err(|e| Error::AudioUnavailable {
                reason: format!("failed to run '{}': {e}", self.program),
            })?;

        if !status.success() {
            return Err(Error::AudioUnavailable {
                reason: format!("'{}' exited with {status}", self.program),
            });
        }

        Ok(())
    }
}

/// Build the sink selected by configuration.
pub fn build_sink(config: &SignalConfig) -> Result<Arc<dyn AudioSink>> {
    match config.sink {
        SinkKind::None => Ok(Arc::new(NullSink)),
        SinkKind::Player => Ok(Arc::new(PlayerSink::new(
            &config.player,
            config.sample_rate,
        )?)),
        SinkKind::Wav => {
            let dir = config.wav_dir.clone().ok_or_else(|| Error::ConfigValidation {
                message: "signal.wav_dir is required for the wav sink".to_string(),
            })?;
            Ok(Arc::new(WavSink::new(dir, config.sample_rate)))
        }
    }
}

/// Write mono samples as 16-bit PCM.
pub fn write_wav_file(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let wav_error = |source| Error::WavWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = WavWriter::create(path, spec).map_err(wav_error)?;
    for &sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        let sample_i16 = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        writer.write_sample(sample_i16).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;

    Ok(())
}
