//! Timing context — sample rate, tempo and session length.
//!
//! Built once per session and borrowed by every constructor that needs to
//! know how long the session is or how fast it samples. Nothing looks it up
//! implicitly; whoever renders passes `&TimingContext` along.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dsp::waveform::Controller;
use crate::error::{QuantizerError, Result};

/// Number of beats (quarter notes) to number of samples.
///
/// Rounds half to even.
pub fn beats_to_samples(beats: f64, bpm: f64, fs: u32) -> usize {
    let samples = (beats * (1.0 / bpm) * 60.0 * fs as f64).round_ties_even();
    if samples.is_finite() && samples > 0.0 {
        samples as usize
    } else {
        0
    }
}

/// Seconds to samples, rounded half to even.
pub fn seconds_to_samples(seconds: f64, fs: u32) -> usize {
    let n = (seconds * fs as f64).round_ties_even();
    if n.is_finite() && n > 0.0 { n as usize } else { 0 }
}

/// Number of samples to number of beats (quarter notes).
pub fn samples_to_beats(samples: usize, bpm: f64, fs: u32) -> f64 {
    samples as f64 * bpm * (1.0 / 60.0) * (1.0 / fs as f64)
}

/// Session timing parameters. Exactly one of `beats` / `samples` is the
/// primary length; `samples` wins when both are given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session length in beats.
    pub beats: f64,
    /// Tempo in beats per minute.
    pub bpm: f64,
    /// Sample rate in Hz.
    pub fs: u32,
    /// Session length in samples (overrides `beats`).
    pub samples: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            beats: 48.0,
            bpm: 120.0,
            fs: 44100,
            samples: None,
        }
    }
}

/// Shared, read-only timing state plus the default parameter tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingContext {
    bpm: f64,
    fs: u32,
    beats: f64,
    samples: usize,
    axis: Controller,
    time: Controller,
    frequency: Controller,
    phase: Controller,
    amplitude: Controller,
}

impl TimingContext {
    /// Build a context whose length is given in beats.
    pub fn from_beats(beats: f64, bpm: f64, fs: u32) -> Result<Self> {
        validate(bpm, fs)?;
        if !beats.is_finite() || beats < 0.0 {
            return Err(QuantizerError::InvalidContext(format!(
                "beat count must be a non-negative number, got {beats}"
            )));
        }
        let samples = beats_to_samples(beats, bpm, fs);
        Ok(Self::build(beats, samples, bpm, fs))
    }

    /// Build a context whose length is given in samples.
    pub fn from_samples(samples: usize, bpm: f64, fs: u32) -> Result<Self> {
        validate(bpm, fs)?;
        let beats = samples_to_beats(samples, bpm, fs);
        Ok(Self::build(beats, samples, bpm, fs))
    }

    pub fn new(config: &SessionConfig) -> Result<Self> {
        match config.samples {
            Some(samples) => Self::from_samples(samples, config.bpm, config.fs),
            None => Self::from_beats(config.beats, config.bpm, config.fs),
        }
    }

    fn build(beats: f64, samples: usize, bpm: f64, fs: u32) -> Self {
        let axis: Vec<f64> = (0..samples).map(|i| i as f64).collect();
        let time = axis.iter().map(|&x| x / fs as f64).collect();
        TimingContext {
            bpm,
            fs,
            beats,
            samples,
            axis: Controller::new(axis),
            time: Controller::new(time),
            frequency: Controller::new(vec![440.0; samples]),
            phase: Controller::new(vec![0.0; samples]),
            amplitude: Controller::new(vec![1.0; samples]),
        }
    }

    /// Session length in samples.
    pub fn len(&self) -> usize {
        self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    pub fn fs(&self) -> u32 {
        self.fs
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn beats(&self) -> f64 {
        self.beats
    }

    /// Sample-count conversion at this context's tempo and rate.
    pub fn beats_to_samples(&self, beats: f64) -> usize {
        beats_to_samples(beats, self.bpm, self.fs)
    }

    pub fn seconds_to_samples(&self, seconds: f64) -> usize {
        seconds_to_samples(seconds, self.fs)
    }

    /// Sample indices `0, 1, 2, …`.
    pub fn axis(&self) -> &Controller {
        &self.axis
    }

    /// Sample times in seconds.
    pub fn time(&self) -> &Controller {
        &self.time
    }

    /// Default frequency track (440 Hz).
    pub fn frequency(&self) -> &Controller {
        &self.frequency
    }

    /// Default phase track (0 rad).
    pub fn phase(&self) -> &Controller {
        &self.phase
    }

    /// Default amplitude track (1.0).
    pub fn amplitude(&self) -> &Controller {
        &self.amplitude
    }
}

fn validate(bpm: f64, fs: u32) -> Result<()> {
    if fs == 0 {
        return Err(QuantizerError::InvalidContext(
            "sample rate must be positive".to_string(),
        ));
    }
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(QuantizerError::InvalidContext(format!(
            "tempo must be positive, got {bpm} bpm"
        )));
    }
    Ok(())
}

impl fmt::Display for TimingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TimingContext {{ beats = {}, bpm = {}, fs = {}, samples = {} }}",
            self.beats, self.bpm, self.fs, self.samples
        )
    }
}
