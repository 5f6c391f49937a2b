//! Deterrent signal: decision, tone synthesis, and audio output.

mod dispatcher;
mod sink;
mod tone;

pub use dispatcher::{Emission, Signal, SignalDecision, SignalDispatcher, decide};
pub use sink::{AudioSink, NullSink, PlayerSink, WavSink, build_sink, write_wav_file};
pub use tone::Tone;
