//! Mixer — Sums voice streams with per-line and master gain.

use crate::error::{QuantizerError, Result};
use crate::units::db_to_mag;

use super::waveform::Stream;

/// A summing mixer. Levels are in decibels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mixer {
    /// One gain per input stream, or `None` for unity on every line.
    pub line_levels: Option<Vec<f64>>,
    pub master_level: f64,
}

impl Mixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_levels(mut self, levels: Vec<f64>) -> Self {
        self.line_levels = Some(levels);
        self
    }

    pub fn with_master_level(mut self, db: f64) -> Self {
        self.master_level = db;
        self
    }

    /// Zero-pad every stream to the longest, apply line gains, sum, then
    /// apply the master gain.
    pub fn mix(&self, streams: &[Stream]) -> Result<Stream> {
        let gains: Vec<f64> = match &self.line_levels {
            Some(levels) if levels.len() != streams.len() => {
                return Err(QuantizerError::LineLevelCount {
                    streams: streams.len(),
                    levels: levels.len(),
                });
            }
            Some(levels) => levels.iter().map(|&db| db_to_mag(db)).collect(),
            None => vec![1.0; streams.len()],
        };

        let len = streams.iter().map(|s| s.len()).max().unwrap_or(0);
        let mut buffer = vec![0.0; len];
        for (stream, gain) in streams.iter().zip(gains) {
            for (acc, &s) in buffer.iter_mut().zip(stream.samples()) {
                *acc += gain * s;
            }
        }

        let master = db_to_mag(self.master_level);
        buffer.iter_mut().for_each(|s| *s *= master);
        Ok(Stream::new(buffer))
    }
}
