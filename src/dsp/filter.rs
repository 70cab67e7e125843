//! Filters — windowed-sinc FIR and Butterworth IIR.
//!
//! Both are mono temporal effects. The sinc filter convolves with a fixed
//! kernel and has no state; the Butterworth filter runs a direct-form
//! recursion whose history carries over between calls until `reset()`.

use std::f64::consts::PI;
use std::str::FromStr;

use log::debug;
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::context::TimingContext;
use crate::error::{QuantizerError, Result};

use super::channels::{Arity, Channels};
use super::effect::{Domain, Effect, unsupported_arity};
use super::waveform::Stream;

/// Pass band selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Lowpass,
    Highpass,
}

impl FromStr for FilterMode {
    type Err = QuantizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lp" | "lowpass" => Ok(FilterMode::Lowpass),
            "hp" | "highpass" => Ok(FilterMode::Highpass),
            _ => Err(QuantizerError::UnsupportedFilterMode(s.to_string())),
        }
    }
}

/// Normalized cutoff `2·f/fs`, required to lie strictly inside (0, 1).
fn normalized_cutoff(cutoff: f64, fs: u32) -> Result<f64> {
    let wn = 2.0 * cutoff / fs as f64;
    if !(wn > 0.0 && wn < 1.0) {
        return Err(QuantizerError::InvalidFilter(format!(
            "cutoff {cutoff} Hz must lie between 0 and Nyquist ({} Hz)",
            fs as f64 / 2.0
        )));
    }
    Ok(wn)
}

// ── Windowed sinc ───────────────────────────────────────────

/// Blackman-windowed sinc FIR filter.
#[derive(Debug, Clone)]
pub struct SincFilter {
    pub mode: FilterMode,
    kernel: Vec<f64>,
}

impl SincFilter {
    /// `bandwidth` is the transition width in Hz; narrower means more taps.
    pub fn new(ctx: &TimingContext, cutoff: f64, bandwidth: f64, mode: FilterMode) -> Result<Self> {
        let fs = ctx.fs();
        let fc = normalized_cutoff(cutoff, fs)?;
        let bw = bandwidth / fs as f64;
        if !(bw > 0.0) || !bw.is_finite() {
            return Err(QuantizerError::InvalidFilter(format!(
                "bandwidth must be positive, got {bandwidth} Hz"
            )));
        }

        let mut m = ((4.0 / bw).round_ties_even() as usize).max(1);
        if mode == FilterMode::Highpass && m % 2 == 1 {
            m += 1;
        }
        let taps = if m % 2 == 1 { m } else { m + 1 };

        let m_f = m as f64;
        let mut kernel: Vec<f64> = (0..taps)
            .map(|i| {
                let x = i as f64;
                let w = 0.42 - 0.5 * (2.0 * PI * x / m_f).cos() + 0.08 * (4.0 * PI * x / m_f).cos();
                sinc(fc * (x - m_f / 2.0)) * w
            })
            .collect();
        let sum: f64 = kernel.iter().sum();
        if sum != 0.0 {
            kernel.iter_mut().for_each(|h| *h /= sum);
        }

        if mode == FilterMode::Highpass {
            kernel.iter_mut().for_each(|h| *h = -*h);
            kernel[m / 2] += 1.0;
        }

        debug!("sinc {mode:?} filter at {cutoff} Hz: {taps} taps");
        Ok(SincFilter { mode, kernel })
    }

    pub fn kernel(&self) -> &[f64] {
        &self.kernel
    }

    /// Full linear convolution through the FFT; the output is `taps - 1`
    /// samples longer.
    pub fn convolve(&self, input: &[f64]) -> Vec<f64> {
        if input.is_empty() {
            return Vec::new();
        }
        let out_len = input.len() + self.kernel.len() - 1;
        let size = out_len.next_power_of_two();

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);

        let mut x = zero_padded(input, size);
        let mut h = zero_padded(&self.kernel, size);
        forward.process(&mut x);
        forward.process(&mut h);
        for (a, &b) in x.iter_mut().zip(&h) {
            *a *= b;
        }
        inverse.process(&mut x);

        // rustfft leaves the inverse unnormalized
        let scale = 1.0 / size as f64;
        x[..out_len].iter().map(|c| c.re * scale).collect()
    }
}

fn zero_padded(samples: &[f64], size: usize) -> Vec<Complex64> {
    let mut out: Vec<Complex64> = samples.iter().map(|&s| Complex64::new(s, 0.0)).collect();
    out.resize(size, Complex64::new(0.0, 0.0));
    out
}

/// Normalized sinc, `sin(πx)/(πx)`.
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

impl Effect for SincFilter {
    fn name(&self) -> &str {
        "sinc filter"
    }

    fn arity(&self) -> Arity {
        Arity::Mono
    }

    fn domain(&self) -> Domain {
        Domain::Temporal
    }

    fn apply(&mut self, input: Channels) -> Result<Channels> {
        match input {
            Channels::Mono(stream) => Ok(Channels::Mono(Stream::new(self.convolve(stream.samples())))),
            other => Err(unsupported_arity(&*self, &other)),
        }
    }
}

// ── Butterworth ─────────────────────────────────────────────

/// Direct-form IIR filter with Butterworth coefficients.
#[derive(Debug, Clone)]
pub struct ButterworthFilter {
    b: Vec<f64>,
    a: Vec<f64>,
    dx: Vec<f64>,
    dy: Vec<f64>,
}

impl ButterworthFilter {
    pub fn new(ctx: &TimingContext, cutoff: f64, order: usize, mode: FilterMode) -> Result<Self> {
        let wn = normalized_cutoff(cutoff, ctx.fs())?;
        let (b, a) = butterworth(order, wn, mode);
        debug!("butterworth {mode:?} filter at {cutoff} Hz, order {order}");
        Self::from_coefficients(b, a)
    }

    /// Arbitrary transfer function `b / a`. The shorter vector is padded with
    /// zeros; the order is one less than the longer.
    pub fn from_coefficients(mut b: Vec<f64>, mut a: Vec<f64>) -> Result<Self> {
        if b.is_empty() || a.is_empty() {
            return Err(QuantizerError::InvalidFilter(
                "coefficient vectors must not be empty".to_string(),
            ));
        }
        if a[0] == 0.0 {
            return Err(QuantizerError::InvalidFilter(
                "leading denominator coefficient must be non-zero".to_string(),
            ));
        }
        let len = b.len().max(a.len());
        b.resize(len, 0.0);
        a.resize(len, 0.0);
        let order = len - 1;
        Ok(ButterworthFilter {
            b,
            a,
            dx: vec![0.0; order],
            dy: vec![0.0; order],
        })
    }

    pub fn order(&self) -> usize {
        self.dx.len()
    }

    pub fn b(&self) -> &[f64] {
        &self.b
    }

    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Clear the input and output history.
    pub fn reset(&mut self) {
        self.dx.fill(0.0);
        self.dy.fill(0.0);
    }

    /// Run the recursion over `input`, one sample at a time.
    pub fn process(&mut self, input: &[f64]) -> Vec<f64> {
        let mut out = Vec::with_capacity(input.len());
        for &x in input {
            let mut acc = self.b[0] * x;
            for j in 1..self.b.len() {
                acc += self.b[j] * self.dx[j - 1] - self.a[j] * self.dy[j - 1];
            }
            let y = acc / self.a[0];
            if !self.dx.is_empty() {
                self.dx.rotate_right(1);
                self.dx[0] = x;
                self.dy.rotate_right(1);
                self.dy[0] = y;
            }
            out.push(y);
        }
        out
    }
}

impl Effect for ButterworthFilter {
    fn name(&self) -> &str {
        "butterworth filter"
    }

    fn arity(&self) -> Arity {
        Arity::Mono
    }

    fn domain(&self) -> Domain {
        Domain::Temporal
    }

    fn apply(&mut self, input: Channels) -> Result<Channels> {
        match input {
            Channels::Mono(stream) => Ok(Channels::Mono(Stream::new(self.process(stream.samples())))),
            other => Err(unsupported_arity(&*self, &other)),
        }
    }
}

/// Digital Butterworth design: analog prototype, prewarp, band transform,
/// bilinear transform, then expand zeros and poles into polynomials.
fn butterworth(order: usize, wn: f64, mode: FilterMode) -> (Vec<f64>, Vec<f64>) {
    if order == 0 {
        return (vec![1.0], vec![1.0]);
    }
    let n = order as f64;

    // prototype poles on the left half of the unit circle, unit gain
    let prototype: Vec<Complex64> = (0..order)
        .map(|k| {
            let m = -(order as f64) + 1.0 + 2.0 * k as f64;
            -Complex64::from_polar(1.0, PI * m / (2.0 * n))
        })
        .collect();

    // bilinear transform runs at fs = 2
    let fs2 = 4.0;
    let warped = fs2 * (PI * wn / 2.0).tan();

    let (zeros, poles, gain): (Vec<Complex64>, Vec<Complex64>, f64) = match mode {
        FilterMode::Lowpass => (
            Vec::new(),
            prototype.iter().map(|&p| p * warped).collect(),
            warped.powi(order as i32),
        ),
        FilterMode::Highpass => {
            let neg_prod: Complex64 = prototype.iter().map(|&p| -p).product();
            (
                vec![Complex64::new(0.0, 0.0); order],
                prototype.iter().map(|&p| warped / p).collect(),
                (Complex64::new(1.0, 0.0) / neg_prod).re,
            )
        }
    };

    let num: Complex64 = zeros.iter().map(|&z| fs2 - z).product();
    let den: Complex64 = poles.iter().map(|&p| fs2 - p).product();
    let gain = gain * (num / den).re;

    let mut zeros_z: Vec<Complex64> = zeros.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
    zeros_z.resize(poles.len(), Complex64::new(-1.0, 0.0));
    let poles_z: Vec<Complex64> = poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();

    let b = poly(&zeros_z).iter().map(|c| gain * c.re).collect();
    let a = poly(&poles_z).iter().map(|c| c.re).collect();
    (b, a)
}

/// Monic polynomial with the given roots, highest power first.
fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut c = vec![Complex64::new(1.0, 0.0)];
    for &r in roots {
        let mut next = c.clone();
        next.push(Complex64::new(0.0, 0.0));
        for i in 1..next.len() {
            next[i] -= r * c[i - 1];
        }
        c = next;
    }
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn ctx() -> TimingContext {
        TimingContext::from_samples(1000, 120.0, 44100).unwrap()
    }

    #[test]
    fn mode_names() {
        assert_eq!("lp".parse::<FilterMode>().unwrap(), FilterMode::Lowpass);
        assert_eq!("HighPass".parse::<FilterMode>().unwrap(), FilterMode::Highpass);
        assert!(matches!(
            "bp".parse::<FilterMode>(),
            Err(QuantizerError::UnsupportedFilterMode(_))
        ));
    }

    #[test]
    fn sinc_output_length_and_kernel_sum() {
        let mut f = SincFilter::new(&ctx(), 1000.0, 441.0, FilterMode::Lowpass).unwrap();
        // m = round(4 / 0.01) = 400 → 401 taps
        assert_eq!(f.kernel().len(), 401);
        assert_approx_eq!(f.kernel().iter().sum::<f64>(), 1.0, 1e-12);

        let out = f.patch(&Stream::new(vec![1.0; 1000])).unwrap();
        assert_eq!(out.len(), 1000 + 401 - 1);
        // settled in the middle: unity DC gain
        assert_approx_eq!(out.samples()[700], 1.0, 1e-9);
    }

    #[test]
    fn sinc_lowpass_with_odd_order_keeps_m_taps() {
        // bandwidth chosen so that m = round(4 / bw) = 401
        let mut f = SincFilter::new(&ctx(), 1000.0, 44100.0 * 4.0 / 401.0, FilterMode::Lowpass).unwrap();
        assert_eq!(f.kernel().len(), 401);
        assert_approx_eq!(f.kernel().iter().sum::<f64>(), 1.0, 1e-12);

        let out = f.patch(&Stream::new(vec![1.0; 1000])).unwrap();
        assert_eq!(out.len(), 1000 + 400);
        assert_approx_eq!(out.samples()[700], 1.0, 1e-9);
    }

    #[test]
    fn fft_convolution_matches_direct_sum() {
        let f = SincFilter::new(&ctx(), 3000.0, 4410.0, FilterMode::Lowpass).unwrap();
        let h = f.kernel();
        let x: Vec<f64> = (0..37).map(|i| ((i * 7) % 11) as f64 / 5.0 - 1.0).collect();
        let mut direct = vec![0.0; x.len() + h.len() - 1];
        for (i, &xi) in x.iter().enumerate() {
            for (j, &hj) in h.iter().enumerate() {
                direct[i + j] += xi * hj;
            }
        }
        let out = f.convolve(&x);
        assert_eq!(out.len(), direct.len());
        for (a, b) in out.iter().zip(&direct) {
            assert_approx_eq!(*a, *b, 1e-12);
        }
        assert!(f.convolve(&[]).is_empty());
    }

    #[test]
    fn sinc_highpass_removes_dc() {
        let f = SincFilter::new(&ctx(), 1000.0, 441.0, FilterMode::Highpass).unwrap();
        assert_eq!(f.kernel().len() % 2, 1);
        assert_approx_eq!(f.kernel().iter().sum::<f64>(), 0.0, 1e-12);
        let out = f.convolve(&[1.0; 1000]);
        assert_approx_eq!(out[700], 0.0, 1e-9);
    }

    #[test]
    fn sinc_rejects_bad_parameters() {
        assert!(SincFilter::new(&ctx(), 1000.0, 0.0, FilterMode::Lowpass).is_err());
        assert!(SincFilter::new(&ctx(), 30000.0, 100.0, FilterMode::Lowpass).is_err());
        assert!(SincFilter::new(&ctx(), -5.0, 100.0, FilterMode::Lowpass).is_err());
    }

    #[test]
    fn butterworth_matches_reference_design() {
        let ctx = TimingContext::from_samples(10, 120.0, 44100).unwrap();
        let lp = ButterworthFilter::new(&ctx, 11025.0, 2, FilterMode::Lowpass).unwrap();
        let expected_b = [0.292_893_218_8, 0.585_786_437_6, 0.292_893_218_8];
        let expected_a = [1.0, 0.0, 0.171_572_875_3];
        for (x, y) in lp.b().iter().zip(expected_b) {
            assert_approx_eq!(*x, y, 1e-9);
        }
        for (x, y) in lp.a().iter().zip(expected_a) {
            assert_approx_eq!(*x, y, 1e-9);
        }

        let hp = ButterworthFilter::new(&ctx, 11025.0, 2, FilterMode::Highpass).unwrap();
        assert_approx_eq!(hp.b()[1], -0.585_786_437_6, 1e-9);
        assert_approx_eq!(hp.a()[2], 0.171_572_875_3, 1e-9);
    }

    #[test]
    fn butterworth_dc_gain() {
        let ctx = ctx();
        for order in 1..=6 {
            let lp = ButterworthFilter::new(&ctx, 800.0, order, FilterMode::Lowpass).unwrap();
            let gain = lp.b().iter().sum::<f64>() / lp.a().iter().sum::<f64>();
            assert_approx_eq!(gain, 1.0, 1e-6);

            let hp = ButterworthFilter::new(&ctx, 800.0, order, FilterMode::Highpass).unwrap();
            assert_approx_eq!(hp.b().iter().sum::<f64>(), 0.0, 1e-9);
        }
    }

    #[test]
    fn order_zero_is_passthrough() {
        let mut f = ButterworthFilter::from_coefficients(vec![1.0], vec![1.0]).unwrap();
        assert_eq!(f.order(), 0);
        let x = vec![0.3, -0.7, 1.0, 0.0, 0.25];
        assert_eq!(f.process(&x), x);
        assert_eq!(
            ButterworthFilter::new(&ctx(), 100.0, 0, FilterMode::Lowpass)
                .unwrap()
                .process(&x),
            x
        );
    }

    #[test]
    fn history_persists_until_reset() {
        let mut f = ButterworthFilter::new(&ctx(), 800.0, 4, FilterMode::Lowpass).unwrap();
        let x = vec![1.0; 64];
        let first = f.process(&x);
        let second = f.process(&x);
        assert_ne!(first, second);
        f.reset();
        assert_eq!(f.process(&x), first);
    }

    #[test]
    fn invalid_coefficients() {
        assert!(ButterworthFilter::from_coefficients(vec![], vec![1.0]).is_err());
        assert!(ButterworthFilter::from_coefficients(vec![1.0], vec![0.0, 1.0]).is_err());
    }

    #[test]
    fn filters_reject_stereo_input() {
        let mut f = ButterworthFilter::new(&ctx(), 800.0, 2, FilterMode::Lowpass).unwrap();
        let stereo = Channels::stereo(Stream::new(vec![0.0]), Stream::new(vec![0.0])).unwrap();
        assert!(matches!(
            f.apply(stereo),
            Err(QuantizerError::UnsupportedArity { .. })
        ));
    }
}
