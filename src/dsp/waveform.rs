//! Waveform — fixed-length sample buffers and their algebra.
//!
//! `Waveform` is the plain buffer. `Stream` (audio-rate signal headed for the
//! mixer) and `Controller` (per-sample parameter track) wrap it so the two
//! roles stay apart in signatures while sharing the same operations.

use std::ops::Deref;

use crate::error::{QuantizerError, Result};

use super::renderer::AudioSink;

/// Right-hand side of an arithmetic operation: a scalar broadcast over the
/// whole buffer, or another buffer of the same length.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Scalar(f64),
    Buffer(&'a [f64]),
}

impl From<f64> for Operand<'_> {
    fn from(v: f64) -> Self {
        Operand::Scalar(v)
    }
}

impl<'a> From<&'a [f64]> for Operand<'a> {
    fn from(v: &'a [f64]) -> Self {
        Operand::Buffer(v)
    }
}

impl<'a> From<&'a Vec<f64>> for Operand<'a> {
    fn from(v: &'a Vec<f64>) -> Self {
        Operand::Buffer(v)
    }
}

impl<'a> From<&'a Waveform> for Operand<'a> {
    fn from(v: &'a Waveform) -> Self {
        Operand::Buffer(&v.samples)
    }
}

impl<'a> From<&'a Stream> for Operand<'a> {
    fn from(v: &'a Stream) -> Self {
        Operand::Buffer(&v.0.samples)
    }
}

impl<'a> From<&'a Controller> for Operand<'a> {
    fn from(v: &'a Controller) -> Self {
        Operand::Buffer(&v.0.samples)
    }
}

/// A fixed-length buffer of samples.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Waveform {
    samples: Vec<f64>,
}

impl Waveform {
    pub fn new(samples: Vec<f64>) -> Self {
        Waveform { samples }
    }

    pub fn zeros(len: usize) -> Self {
        Self::constant(len, 0.0)
    }

    pub fn constant(len: usize, value: f64) -> Self {
        Waveform {
            samples: vec![value; len],
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    /// Elementwise (or broadcast) sum.
    pub fn add<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Waveform> {
        self.zip_with(rhs.into(), |a, b| a + b)
    }

    /// Elementwise (or broadcast) product.
    pub fn mul<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Waveform> {
        self.zip_with(rhs.into(), |a, b| a * b)
    }

    /// Join `other` after this buffer. Lengths may differ.
    pub fn concat(&self, other: &Waveform) -> Waveform {
        let mut samples = Vec::with_capacity(self.len() + other.len());
        samples.extend_from_slice(&self.samples);
        samples.extend_from_slice(&other.samples);
        Waveform { samples }
    }

    /// Tile the buffer `n` times.
    pub fn repeat(&self, n: usize) -> Waveform {
        Waveform {
            samples: self.samples.repeat(n),
        }
    }

    /// Hand the buffer to an output sink at the given sample rate.
    pub fn bounce(&self, sink: &mut impl AudioSink, sample_rate: u32) -> Result<()> {
        sink.write(&self.samples, sample_rate)
    }

    fn zip_with(&self, rhs: Operand<'_>, op: impl Fn(f64, f64) -> f64) -> Result<Waveform> {
        let samples = match rhs {
            Operand::Scalar(v) => self.samples.iter().map(|&a| op(a, v)).collect(),
            Operand::Buffer(other) => {
                if other.len() != self.samples.len() {
                    return Err(QuantizerError::LengthMismatch {
                        expected: self.samples.len(),
                        found: other.len(),
                    });
                }
                self.samples
                    .iter()
                    .zip(other)
                    .map(|(&a, &b)| op(a, b))
                    .collect()
            }
        };
        Ok(Waveform { samples })
    }
}

impl From<Vec<f64>> for Waveform {
    fn from(samples: Vec<f64>) -> Self {
        Waveform { samples }
    }
}

macro_rules! named_waveform {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct $name(Waveform);

        impl $name {
            pub fn new(samples: Vec<f64>) -> Self {
                $name(Waveform::new(samples))
            }

            pub fn into_waveform(self) -> Waveform {
                self.0
            }
        }

        impl Deref for $name {
            type Target = Waveform;

            fn deref(&self) -> &Waveform {
                &self.0
            }
        }

        impl From<Waveform> for $name {
            fn from(w: Waveform) -> Self {
                $name(w)
            }
        }

        impl From<Vec<f64>> for $name {
            fn from(samples: Vec<f64>) -> Self {
                $name::new(samples)
            }
        }

        impl From<$name> for Waveform {
            fn from(w: $name) -> Self {
                w.0
            }
        }
    };
}

named_waveform!(
    /// An audio-rate signal: oscillator output, filtered voice or final mix.
    Stream
);

named_waveform!(
    /// A per-sample parameter track (frequency, phase, amplitude, gain).
    Controller
);

impl From<Stream> for Controller {
    fn from(s: Stream) -> Self {
        Controller(s.0)
    }
}

// ── Parameter inputs ────────────────────────────────────────

/// A time-varying parameter: either one value held for the whole context or
/// a full per-sample track.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Scalar(f64),
    Track(Controller),
}

impl Param {
    /// Materialize the parameter as a track of exactly `len` samples.
    pub fn cast(self, len: usize) -> Result<Controller> {
        match self {
            Param::Scalar(v) => Ok(Controller(Waveform::constant(len, v))),
            Param::Track(track) if track.len() == len => Ok(track),
            Param::Track(track) => Err(QuantizerError::LengthMismatch {
                expected: len,
                found: track.len(),
            }),
        }
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Scalar(v)
    }
}

impl From<Vec<f64>> for Param {
    fn from(v: Vec<f64>) -> Self {
        Param::Track(Controller::new(v))
    }
}

impl From<Waveform> for Param {
    fn from(w: Waveform) -> Self {
        Param::Track(Controller(w))
    }
}

impl From<Controller> for Param {
    fn from(c: Controller) -> Self {
        Param::Track(c)
    }
}

impl From<&Controller> for Param {
    fn from(c: &Controller) -> Self {
        Param::Track(c.clone())
    }
}

impl From<Stream> for Param {
    fn from(s: Stream) -> Self {
        Param::Track(s.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elementwise_and_broadcast_arithmetic() {
        let a = Waveform::new(vec![1.0, 2.0, 3.0]);
        let b = Waveform::new(vec![0.5, 0.5, 2.0]);

        assert_eq!(a.add(&b).unwrap().samples(), &[1.5, 2.5, 5.0]);
        assert_eq!(a.mul(&b).unwrap().samples(), &[0.5, 1.0, 6.0]);
        assert_eq!(a.add(1.0).unwrap().samples(), &[2.0, 3.0, 4.0]);
        assert_eq!(a.mul(-1.0).unwrap().samples(), &[-1.0, -2.0, -3.0]);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let a = Waveform::new(vec![1.0, 2.0, 3.0]);
        let b = Waveform::new(vec![1.0, 2.0]);
        let err = a.add(&b).unwrap_err();
        assert!(matches!(
            err,
            QuantizerError::LengthMismatch { expected: 3, found: 2 }
        ));
        assert!(a.mul(&b).is_err());
    }

    #[test]
    fn operations_do_not_mutate_operands() {
        let a = Stream::new(vec![1.0, 2.0]);
        let b = Controller::new(vec![3.0, 4.0]);
        let _ = a.mul(&b).unwrap();
        assert_eq!(a.samples(), &[1.0, 2.0]);
        assert_eq!(b.samples(), &[3.0, 4.0]);
    }

    #[test]
    fn concat_and_repeat() {
        let a = Waveform::new(vec![1.0, 2.0]);
        let b = Waveform::new(vec![3.0]);
        assert_eq!(a.concat(&b).samples(), &[1.0, 2.0, 3.0]);
        assert_eq!(b.concat(&a).samples(), &[3.0, 1.0, 2.0]);
        assert_eq!(a.repeat(3).samples(), &[1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
        assert!(a.repeat(0).is_empty());
    }

    #[test]
    fn param_cast_broadcasts_scalars() {
        let track = Param::from(0.25).cast(4).unwrap();
        assert_eq!(track.samples(), &[0.25; 4]);
    }

    #[test]
    fn param_cast_passes_tracks_through() {
        let track = Param::from(vec![1.0, 2.0, 3.0]).cast(3).unwrap();
        assert_eq!(track.samples(), &[1.0, 2.0, 3.0]);

        let err = Param::from(vec![1.0, 2.0]).cast(3).unwrap_err();
        assert!(matches!(err, QuantizerError::LengthMismatch { .. }));
    }
}
