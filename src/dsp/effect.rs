//! Effect capability — anything that transforms a channel layout.

use std::fmt;

use crate::error::{QuantizerError, Result};

use super::channels::{Arity, Channels};
use super::waveform::Stream;

/// Whether an effect works on samples directly or on a spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Temporal,
    Spectral,
}

/// A signal processor with a declared channel arity and processing domain.
///
/// Implementors may hold history (IIR state), so `apply` takes `&mut self`.
pub trait Effect: fmt::Debug + Send {
    fn name(&self) -> &str;

    fn arity(&self) -> Arity;

    fn domain(&self) -> Domain;

    /// Process one channel bundle. Fails when the bundle's layout does not
    /// match [`Effect::arity`].
    fn apply(&mut self, input: Channels) -> Result<Channels>;

    /// Process a single mono stream.
    fn patch(&mut self, input: &Stream) -> Result<Stream> {
        let out = self.apply(Channels::Mono(input.clone()))?;
        match out {
            Channels::Mono(s) => Ok(s),
            other => Err(QuantizerError::UnsupportedArity {
                effect: self.name().to_string(),
                input: other.arity().to_string(),
            }),
        }
    }
}

/// The error for a layout the effect was not built for.
pub fn unsupported_arity(effect: &dyn Effect, input: &Channels) -> QuantizerError {
    QuantizerError::UnsupportedArity {
        effect: effect.name().to_string(),
        input: input.arity().to_string(),
    }
}

/// Effects applied one after another.
#[derive(Debug, Default)]
pub struct EffectChain {
    effects: Vec<Box<dyn Effect>>,
}

impl EffectChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: Box<dyn Effect>) {
        self.effects.push(effect);
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn apply(&mut self, mut input: Channels) -> Result<Channels> {
        for effect in &mut self.effects {
            input = effect.apply(input)?;
        }
        Ok(input)
    }

    pub fn patch(&mut self, input: &Stream) -> Result<Stream> {
        let mut out = input.clone();
        for effect in &mut self.effects {
            out = effect.patch(&out)?;
        }
        Ok(out)
    }
}
