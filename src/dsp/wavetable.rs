//! Wavetables — periodic shapes evaluated over phase.
//!
//! Every shape is defined on `[-π, π]` and min-max normalized into `[-1, 1]`
//! after evaluation. `render` folds an arbitrary phase into that interval
//! first, which makes every table periodic in 2π.

use std::f64::consts::{PI, TAU};
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::QuantizerError;
use crate::units::normalize;

/// Seed for every noise table, so noise renders identically run to run.
pub const NOISE_SEED: u64 = 0;

/// Uniform white noise from a fixed-seed generator.
///
/// The generator advances across calls on the same instance; it is seeded
/// once at construction and never reseeded.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: SmallRng,
}

impl NoiseSource {
    pub fn new() -> Self {
        Self::with_seed(NOISE_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        NoiseSource {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn fill(&mut self, len: usize) -> Vec<f64> {
        (0..len).map(|_| self.rng.random_range(-1.0..1.0)).collect()
    }
}

impl Default for NoiseSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Supported wavetable shapes.
#[derive(Debug, Clone)]
pub enum Wavetable {
    Sine,
    Square,
    Saw,
    Triangle,
    Noise(NoiseSource),
}

impl Wavetable {
    /// A fresh noise table seeded with [`NOISE_SEED`].
    pub fn noise() -> Self {
        Wavetable::Noise(NoiseSource::new())
    }

    /// Evaluate the shape on phases already inside `[-π, π]`, then normalize.
    pub fn shape(&mut self, phase: &[f64]) -> Vec<f64> {
        let mut y: Vec<f64> = match self {
            Wavetable::Sine => phase.iter().map(|x| x.sin()).collect(),
            Wavetable::Square => phase.iter().map(|&x| square(x)).collect(),
            Wavetable::Saw => phase.to_vec(),
            Wavetable::Triangle => phase.iter().map(|&x| triangle(x)).collect(),
            Wavetable::Noise(source) => source.fill(phase.len()),
        };
        normalize(&mut y);
        y
    }

    /// Evaluate the shape at arbitrary phases (radians).
    pub fn render(&mut self, phase: &[f64]) -> Vec<f64> {
        let wrapped: Vec<f64> = phase.iter().map(|&x| wrap_phase(x)).collect();
        self.shape(&wrapped)
    }

    /// One period of the shape at frequency `f`, `round(fs/f)` points long.
    pub fn discretize(&mut self, frequency: f64, fs: u32) -> Vec<f64> {
        let window = (fs as f64 / frequency).round_ties_even();
        let window = if window.is_finite() && window > 0.0 { window as usize } else { 0 };
        let x = linspace(-PI, PI, window);
        self.shape(&x)
    }
}

impl FromStr for Wavetable {
    type Err = QuantizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sine" | "sin" => Ok(Wavetable::Sine),
            "square" | "squ" => Ok(Wavetable::Square),
            "saw" | "sawtooth" => Ok(Wavetable::Saw),
            "triangle" | "tri" => Ok(Wavetable::Triangle),
            "noise" => Ok(Wavetable::noise()),
            _ => Err(QuantizerError::UnsupportedWavetable(s.to_string())),
        }
    }
}

/// Fold a phase into `[-π, π)` by centered modulo 2π.
#[inline]
pub fn wrap_phase(x: f64) -> f64 {
    (x + PI).rem_euclid(TAU) - PI
}

fn square(x: f64) -> f64 {
    if x < 0.0 {
        -1.0
    } else if x > 0.0 {
        1.0
    } else {
        0.0
    }
}

fn triangle(x: f64) -> f64 {
    if x < -PI / 2.0 {
        (-2.0 / PI) * x - 2.0
    } else if x <= PI / 2.0 {
        (2.0 / PI) * x
    } else {
        (-2.0 / PI) * x + 2.0
    }
}

/// `n` evenly spaced points from `start` to `stop`, both inclusive.
pub(crate) fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut y: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            y[n - 1] = stop;
            y
        }
    }
}
