//! Oscillator — phase accumulation over per-sample parameter tracks.

use std::f64::consts::TAU;

use log::debug;

use crate::context::TimingContext;
use crate::error::Result;

use super::waveform::{Param, Stream};
use super::wavetable::Wavetable;

/// A wavetable driven by frequency, phase and amplitude tracks.
///
/// Every input is either a scalar or a full-length track; envelopes and other
/// oscillators can be plugged in directly for FM/PM/AM. Unset inputs fall
/// back to the context's default tracks.
#[derive(Debug, Clone)]
pub struct Oscillator<'ctx> {
    ctx: &'ctx TimingContext,
    pub wavetable: Wavetable,
    dt: Option<Param>,
    frequency: Option<Param>,
    phase: Option<Param>,
    amplitude: Option<Param>,
    detune: Param,
}

impl<'ctx> Oscillator<'ctx> {
    pub fn new(ctx: &'ctx TimingContext) -> Self {
        Oscillator {
            ctx,
            wavetable: Wavetable::Sine,
            dt: None,
            frequency: None,
            phase: None,
            amplitude: None,
            detune: Param::Scalar(0.0),
        }
    }

    pub fn wavetable(mut self, wavetable: Wavetable) -> Self {
        self.wavetable = wavetable;
        self
    }

    /// Time step per sample in seconds (default `1/fs`).
    pub fn dt(mut self, dt: impl Into<Param>) -> Self {
        self.dt = Some(dt.into());
        self
    }

    /// Instantaneous frequency in Hz.
    pub fn frequency(mut self, frequency: impl Into<Param>) -> Self {
        self.frequency = Some(frequency.into());
        self
    }

    /// Phase offset in radians, added after integration.
    pub fn phase(mut self, phase: impl Into<Param>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    pub fn amplitude(mut self, amplitude: impl Into<Param>) -> Self {
        self.amplitude = Some(amplitude.into());
        self
    }

    /// Detune in cents, applied to the frequency track before integration.
    pub fn detune(mut self, cents: impl Into<Param>) -> Self {
        self.detune = cents.into();
        self
    }

    /// Integrate the frequency track and evaluate the wavetable.
    ///
    /// The phase integral is a strictly left-to-right running sum so results
    /// are bit-for-bit reproducible.
    pub fn render(self) -> Result<Stream> {
        let ctx = self.ctx;
        let n = ctx.len();
        let dt = self
            .dt
            .unwrap_or(Param::Scalar(1.0 / ctx.fs() as f64))
            .cast(n)?;
        let f = self
            .frequency
            .unwrap_or_else(|| ctx.frequency().into())
            .cast(n)?;
        let p = self.phase.unwrap_or_else(|| ctx.phase().into()).cast(n)?;
        let a = self
            .amplitude
            .unwrap_or_else(|| ctx.amplitude().into())
            .cast(n)?;
        let detune = self.detune.cast(n)?;

        let mut integral = 0.0;
        let mut phase = Vec::with_capacity(n);
        for i in 0..n {
            let fd = f.samples()[i] * 2.0_f64.powf(detune.samples()[i] / 1200.0);
            integral += TAU * fd * dt.samples()[i];
            phase.push(integral + p.samples()[i]);
        }

        let mut wavetable = self.wavetable;
        let shaped = wavetable.render(&phase);
        let out: Vec<f64> = shaped
            .iter()
            .zip(a.samples())
            .map(|(&y, &gain)| gain * y)
            .collect();

        debug!("rendered {} oscillator samples at {} Hz", n, ctx.fs());
        Ok(Stream::new(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::waveform::Controller;
    use crate::error::QuantizerError;

    fn rising_crossings(samples: &[f64]) -> usize {
        samples
            .windows(2)
            .filter(|w| w[0] < 0.0 && w[1] >= 0.0)
            .count()
    }

    #[test]
    fn constant_frequency_is_accurate() {
        let ctx = TimingContext::from_samples(44100, 120.0, 44100).unwrap();
        let out = Oscillator::new(&ctx).frequency(440.0).render().unwrap();
        assert_eq!(out.len(), 44100);
        let crossings = rising_crossings(out.samples()) as i64;
        assert!((crossings - 440).abs() <= 1, "got {crossings} crossings");
    }

    #[test]
    fn default_frequency_is_440() {
        let ctx = TimingContext::from_samples(44100, 120.0, 44100).unwrap();
        let out = Oscillator::new(&ctx).render().unwrap();
        let crossings = rising_crossings(out.samples()) as i64;
        assert!((crossings - 440).abs() <= 1);
    }

    #[test]
    fn detune_by_an_octave_doubles_frequency() {
        let ctx = TimingContext::from_samples(44100, 120.0, 44100).unwrap();
        let out = Oscillator::new(&ctx)
            .frequency(110.0)
            .detune(1200.0)
            .render()
            .unwrap();
        let crossings = rising_crossings(out.samples()) as i64;
        assert!((crossings - 220).abs() <= 1);
    }

    #[test]
    fn amplitude_track_scales_output() {
        let ctx = TimingContext::from_samples(1000, 120.0, 1000).unwrap();
        let full = Oscillator::new(&ctx).frequency(10.0).render().unwrap();
        let half = Oscillator::new(&ctx)
            .frequency(10.0)
            .amplitude(0.5)
            .render()
            .unwrap();
        for (a, b) in full.samples().iter().zip(half.samples()) {
            assert!((a * 0.5 - b).abs() < 1e-12);
        }
    }

    #[test]
    fn frequency_track_sweeps() {
        let ctx = TimingContext::from_samples(44100, 120.0, 44100).unwrap();
        let sweep: Vec<f64> = (0..44100).map(|i| if i < 22050 { 100.0 } else { 300.0 }).collect();
        let out = Oscillator::new(&ctx)
            .frequency(Controller::new(sweep))
            .render()
            .unwrap();
        let first = rising_crossings(&out.samples()[..22050]) as i64;
        let second = rising_crossings(&out.samples()[22050..]) as i64;
        assert!((first - 50).abs() <= 1);
        assert!((second - 150).abs() <= 1);
    }

    #[test]
    fn short_track_is_a_contract_violation() {
        let ctx = TimingContext::from_samples(100, 120.0, 1000).unwrap();
        let err = Oscillator::new(&ctx)
            .frequency(vec![1.0; 99])
            .render()
            .unwrap_err();
        assert!(matches!(
            err,
            QuantizerError::LengthMismatch { expected: 100, found: 99 }
        ));
    }
}
