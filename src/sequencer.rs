//! Sequencer — named patterns plus the streams rendered from them.

use std::collections::BTreeMap;

use log::info;
use serde_json::Value;

use crate::context::TimingContext;
use crate::dsp::mixer::Mixer;
use crate::dsp::renderer::AudioSink;
use crate::dsp::waveform::Stream;
use crate::error::{QuantizerError, Result};
use crate::pattern::Pattern;
use crate::score::parse_patterns;

#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    patterns: BTreeMap<String, Pattern>,
    streams: Vec<Stream>,
    line_levels: Vec<f64>,
    master_level: f64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Master level in dB.
    pub fn with_master_level(mut self, db: f64) -> Self {
        self.master_level = db;
        self
    }

    pub fn master_level(&self) -> f64 {
        self.master_level
    }

    /// Register a pattern under its own name, replacing any previous one.
    pub fn insert_pattern(&mut self, pattern: Pattern) {
        self.patterns.insert(pattern.name.clone(), pattern);
    }

    pub fn pattern(&self, name: &str) -> Result<&Pattern> {
        self.patterns
            .get(name)
            .ok_or_else(|| QuantizerError::UnknownPattern(name.to_string()))
    }

    pub fn patterns(&self) -> &BTreeMap<String, Pattern> {
        &self.patterns
    }

    /// Add a rendered stream at `line_level` dB.
    pub fn push_stream(&mut self, stream: Stream, line_level: f64) {
        self.streams.push(stream);
        self.line_levels.push(line_level);
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    /// Read a pattern table (name → event specs) and register every pattern.
    pub fn load_score(&mut self, ctx: &TimingContext, table: &Value) -> Result<()> {
        let patterns = parse_patterns(ctx, table)?;
        info!("loaded {} patterns", patterns.len());
        self.patterns.extend(patterns);
        Ok(())
    }

    pub fn mix(&self) -> Result<Stream> {
        Mixer::new()
            .with_line_levels(self.line_levels.clone())
            .with_master_level(self.master_level)
            .mix(&self.streams)
    }

    /// Mix and hand the result to `sink`.
    pub fn export(&self, sink: &mut impl AudioSink, sample_rate: u32) -> Result<()> {
        self.mix()?.bounce(sink, sample_rate)
    }
}
