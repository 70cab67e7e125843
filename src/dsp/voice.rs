//! Voice — one pattern played through oscillator, envelopes and effects.

use log::debug;

use crate::context::TimingContext;
use crate::error::Result;
use crate::pattern::Pattern;
use crate::score::{AdsrConfig, FilterConfig, VoiceConfig};

use super::effect::{Effect, EffectChain};
use super::envelope::Envelope;
use super::filter::{ButterworthFilter, FilterMode, SincFilter};
use super::oscillator::Oscillator;
use super::waveform::Stream;
use super::wavetable::Wavetable;

/// An instrument: a wavetable shaped by an ADSR envelope, followed by an
/// effect chain.
#[derive(Debug)]
pub struct Voice {
    pub wavetable: Wavetable,
    pub adsr: AdsrConfig,
    /// Detune in cents.
    pub detune: f64,
    pub effects: EffectChain,
}

impl Voice {
    pub fn new(wavetable: Wavetable) -> Self {
        Voice {
            wavetable,
            adsr: AdsrConfig::default(),
            detune: 0.0,
            effects: EffectChain::new(),
        }
    }

    /// Create a voice configured from a score entry.
    pub fn with_config(ctx: &TimingContext, config: &VoiceConfig) -> Result<Self> {
        let mut voice = Voice::new(config.wavetable.parse()?);
        voice.adsr = config.adsr;
        voice.detune = config.detune;
        for filter in &config.filters {
            voice.effects.push(build_filter(ctx, filter)?);
        }
        Ok(voice)
    }

    /// Render `pattern` at the context's length. Effects may lengthen the
    /// result (FIR convolution adds its kernel length).
    pub fn render(&mut self, ctx: &TimingContext, pattern: &Pattern) -> Result<Stream> {
        let AdsrConfig {
            attack,
            decay,
            sustain,
            release,
        } = self.adsr;
        let frequency = Envelope::frequency(ctx, pattern);
        let velocity = Envelope::amplitude(ctx, pattern);
        let contour = Envelope::adsr(ctx, pattern, attack, decay, sustain, release);
        let amplitude = contour.controller().mul(velocity.controller())?;

        let dry = Oscillator::new(ctx)
            .wavetable(self.wavetable.clone())
            .frequency(frequency)
            .amplitude(amplitude)
            .detune(self.detune)
            .render()?;
        debug!(
            "voice '{}': {} events through {} effects",
            pattern.name,
            pattern.len(),
            self.effects.len()
        );
        self.effects.patch(&dry)
    }
}

fn build_filter(ctx: &TimingContext, config: &FilterConfig) -> Result<Box<dyn Effect>> {
    let effect: Box<dyn Effect> = match config {
        FilterConfig::Sinc {
            cutoff,
            bandwidth,
            mode,
        } => Box::new(SincFilter::new(ctx, *cutoff, *bandwidth, mode.parse::<FilterMode>()?)?),
        FilterConfig::Butterworth {
            cutoff,
            order,
            mode,
        } => Box::new(ButterworthFilter::new(ctx, *cutoff, *order, mode.parse::<FilterMode>()?)?),
    };
    Ok(effect)
}
