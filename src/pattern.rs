//! Events and patterns — the musical input every envelope and voice reads.

use serde::{Deserialize, Serialize};

use crate::context::TimingContext;
use crate::units::{midi_to_freq, transpose};

/// MIDI note used when a score leaves the pitch unspecified.
pub const DEFAULT_MIDI_NOTE: f64 = 36.0;

// ── Event ───────────────────────────────────────────────────

/// One note or rest, with its duration already resolved to samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Rests carry a duration but no contour.
    pub idle: bool,
    /// Duration in samples.
    pub samples: usize,
    /// Frequency in Hz.
    pub frequency: f64,
    /// Phase offset in radians.
    pub phase: f64,
    /// Linear amplitude.
    pub amplitude: f64,
    /// Extra per-event controller values.
    #[serde(default)]
    pub cc: Vec<f64>,
}

impl Event {
    /// A sounding event one beat long at the default pitch.
    pub fn new(ctx: &TimingContext) -> Self {
        Event::note(ctx.beats_to_samples(1.0), midi_to_freq(DEFAULT_MIDI_NOTE), 1.0)
    }

    pub fn note(samples: usize, frequency: f64, amplitude: f64) -> Self {
        Event {
            idle: false,
            samples,
            frequency,
            phase: 0.0,
            amplitude,
            cc: Vec::new(),
        }
    }

    pub fn rest(samples: usize) -> Self {
        Event {
            idle: true,
            ..Event::note(samples, midi_to_freq(DEFAULT_MIDI_NOTE), 1.0)
        }
    }

    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_cc(mut self, cc: Vec<f64>) -> Self {
        self.cc = cc;
        self
    }
}

// ── Pattern ─────────────────────────────────────────────────

/// A named, ordered list of events.
///
/// Every transform returns a fresh pattern; the receiver is left as it was.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    pub events: Vec<Event>,
}

impl Pattern {
    pub fn new(name: impl Into<String>) -> Self {
        Pattern {
            name: name.into(),
            events: Vec::new(),
        }
    }

    pub fn with_events(name: impl Into<String>, events: Vec<Event>) -> Self {
        Pattern {
            name: name.into(),
            events,
        }
    }

    /// Join several patterns end to end under a new name.
    pub fn chain<'a>(name: impl Into<String>, patterns: impl IntoIterator<Item = &'a Pattern>) -> Self {
        let events = patterns
            .into_iter()
            .flat_map(|p| p.events.iter().cloned())
            .collect();
        Pattern::with_events(name, events)
    }

    pub fn append(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total duration in samples, rests included.
    pub fn duration(&self) -> usize {
        self.events.iter().map(|e| e.samples).sum()
    }

    /// `self` followed by `other`.
    pub fn concat(&self, other: &Pattern) -> Pattern {
        Pattern::chain(self.name.clone(), [self, other])
    }

    /// `other` followed by `self`.
    pub fn prepend(&self, other: &Pattern) -> Pattern {
        Pattern::chain(self.name.clone(), [other, self])
    }

    /// The event list tiled `n` times.
    pub fn repeat(&self, n: usize) -> Pattern {
        let events = std::iter::repeat_n(self.events.iter().cloned(), n)
            .flatten()
            .collect();
        Pattern::with_events(self.name.clone(), events)
    }

    /// Every event's frequency shifted by octaves, semitones and cents.
    pub fn transpose(&self, octaves: f64, semitones: f64, cents: f64) -> Pattern {
        let events = self
            .events
            .iter()
            .map(|e| Event {
                frequency: transpose(e.frequency, octaves, semitones, cents),
                ..e.clone()
            })
            .collect();
        Pattern::with_events(self.name.clone(), events)
    }
}
