//! Envelope — contour rendering from event sequences.
//!
//! A [`Contour`] describes the shape of a single event: a head of
//! interpolated segments, a sustain level held until the event ends, and a
//! tail appended after it. An [`Envelope`] lays one contour per event onto a
//! zero track the length of the session.

use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::context::{TimingContext, seconds_to_samples};
use crate::error::{QuantizerError, Result};
use crate::pattern::{Event, Pattern};

use super::waveform::{Controller, Param};

/// Breakpoints of a piecewise curve.
///
/// `amplitudes` has one more entry than `durations` and `exponents`; segment
/// `i` runs from `amplitudes[i]` to `amplitudes[i + 1]` over `durations[i]`
/// seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Segments {
    amplitudes: Vec<f64>,
    durations: Vec<f64>,
    exponents: Vec<f64>,
}

impl Segments {
    pub fn new(amplitudes: Vec<f64>, durations: Vec<f64>, exponents: Vec<f64>) -> Result<Self> {
        if amplitudes.len() != durations.len() + 1 || exponents.len() != durations.len() {
            return Err(QuantizerError::InvalidEnvelope(format!(
                "{} amplitudes, {} durations and {} exponents do not describe {} segments",
                amplitudes.len(),
                durations.len(),
                exponents.len(),
                durations.len()
            )));
        }
        Ok(Segments {
            amplitudes,
            durations,
            exponents,
        })
    }

    /// A single linear segment.
    pub fn linear(from: f64, to: f64, duration: f64) -> Self {
        Segments {
            amplitudes: vec![from, to],
            durations: vec![duration],
            exponents: vec![1.0],
        }
    }

    /// Contributes no samples.
    pub fn empty() -> Self {
        Segments::linear(0.0, 0.0, 0.0)
    }

    /// Linear segments through `amplitudes`.
    fn linear_through(amplitudes: Vec<f64>, durations: Vec<f64>) -> Self {
        let exponents = vec![1.0; durations.len()];
        Segments {
            amplitudes,
            durations,
            exponents,
        }
    }

    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn exponents(&self) -> &[f64] {
        &self.exponents
    }

    /// Render every segment at `fs` and concatenate.
    pub fn render(&self, fs: u32) -> Vec<f64> {
        self.render_upto(fs, usize::MAX)
    }

    /// Final rendered point, without rendering.
    fn last_value(&self, fs: u32) -> Option<f64> {
        self.amplitudes
            .windows(2)
            .zip(&self.durations)
            .filter_map(|(pair, &d)| match seconds_to_samples(d, fs) {
                0 => None,
                1 => Some(pair[0]),
                _ => Some(pair[1]),
            })
            .last()
    }

    /// Like [`Segments::render`], stopping after `limit` samples.
    pub fn render_upto(&self, fs: u32, limit: usize) -> Vec<f64> {
        let mut y = Vec::new();
        let segments = self
            .amplitudes
            .windows(2)
            .zip(&self.durations)
            .zip(&self.exponents);
        for ((pair, &duration), &exponent) in segments {
            let remaining = limit - y.len();
            if remaining == 0 {
                break;
            }
            let n = seconds_to_samples(duration, fs);
            y.extend(curve(pair[0], pair[1], n, exponent).take(remaining));
        }
        y
    }
}

/// `n` points from `from` to `to`, both ends included, bent by `frac^exponent`.
fn curve(from: f64, to: f64, n: usize, exponent: f64) -> impl Iterator<Item = f64> {
    let span = to - from;
    (0..n).map(move |i| {
        if n == 1 {
            from
        } else if i == n - 1 {
            to
        } else {
            let frac = i as f64 / (n - 1) as f64;
            from + span * frac.powf(exponent)
        }
    })
}

type SustainFn = Arc<dyn Fn(&Event) -> f64 + Send + Sync>;

/// The shape of one event: head, sustain, tail.
#[derive(Clone)]
pub struct Contour {
    pub head: Segments,
    sustain: SustainFn,
    pub tail: Segments,
}

impl Contour {
    pub fn new(
        head: Segments,
        sustain: impl Fn(&Event) -> f64 + Send + Sync + 'static,
        tail: Segments,
    ) -> Self {
        Contour {
            head,
            sustain: Arc::new(sustain),
            tail,
        }
    }

    /// Holds the event's frequency.
    pub fn frequency() -> Self {
        Contour::new(Segments::empty(), |e| e.frequency, Segments::empty())
    }

    /// Holds the event's phase offset.
    pub fn phase() -> Self {
        Contour::new(Segments::empty(), |e| e.phase, Segments::empty())
    }

    /// Holds the event's amplitude.
    pub fn amplitude() -> Self {
        Contour::new(Segments::empty(), |e| e.amplitude, Segments::empty())
    }

    /// A short 0 → 1 → 0 blip at the start of every event.
    pub fn delta(attack: f64, decay: f64) -> Self {
        Contour::new(
            Segments::linear_through(vec![0.0, 1.0, 0.0], vec![attack, decay]),
            |_| 0.0,
            Segments::empty(),
        )
    }

    /// Classic attack/decay/sustain/release. Times in seconds, sustain level
    /// linear.
    pub fn adsr(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Contour::new(
            Segments::linear_through(vec![0.0, 1.0, sustain], vec![attack, decay]),
            move |_| sustain,
            Segments::linear(sustain, 0.0, release),
        )
    }

    pub fn sustain(&self, event: &Event) -> f64 {
        (self.sustain)(event)
    }

    /// The event's contour: head (truncated to the event if longer), then
    /// sustain to the event's end, then the full tail.
    pub fn render(&self, ctx: &TimingContext, event: &Event) -> Vec<f64> {
        self.render_upto(ctx, event, usize::MAX)
    }

    /// The first `limit` samples of [`Contour::render`]. Nothing past the
    /// limit is allocated.
    pub fn render_upto(&self, ctx: &TimingContext, event: &Event, limit: usize) -> Vec<f64> {
        let body = event.samples.min(limit);
        let mut y = self.head.render_upto(ctx.fs(), body);
        y.resize(body, self.sustain(event));
        if event.samples < limit {
            y.extend(self.tail.render_upto(ctx.fs(), limit - event.samples));
        }
        y
    }

    /// The value the unclipped contour ends on, or `None` when it is empty.
    pub fn final_value(&self, ctx: &TimingContext, event: &Event) -> Option<f64> {
        let fs = ctx.fs();
        if let Some(v) = self.tail.last_value(fs) {
            return Some(v);
        }
        match event.samples {
            0 => None,
            n => Some(
                self.head
                    .render_upto(fs, n)
                    .get(n - 1)
                    .copied()
                    .unwrap_or_else(|| self.sustain(event)),
            ),
        }
    }
}

impl fmt::Debug for Contour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contour")
            .field("head", &self.head)
            .field("tail", &self.tail)
            .finish_non_exhaustive()
    }
}

// ── Envelope ────────────────────────────────────────────────

/// A control track rendered from a pattern, one contour per sounding event.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    track: Controller,
}

impl Envelope {
    /// Lay `contour` onto a zero track of context length, event by event.
    ///
    /// Contours are written in order and a later event overwrites whatever
    /// an earlier tail left in its region. Rests are left alone when
    /// `reactive`; otherwise they hold the last sounding contour's final
    /// value.
    pub fn new(ctx: &TimingContext, pattern: &Pattern, contour: &Contour, reactive: bool) -> Self {
        let len = ctx.len();
        let mut track = vec![0.0; len];
        let mut last = 0.0;
        let mut start = 0usize;

        for event in &pattern.events {
            if !event.idle {
                if start < len {
                    let c = contour.render_upto(ctx, event, len - start);
                    track[start..start + c.len()].copy_from_slice(&c);
                    if event.samples > len - start {
                        debug!(
                            "pattern '{}': event at sample {start} runs past the end of the session ({len})",
                            pattern.name
                        );
                    }
                } else {
                    debug!(
                        "pattern '{}': event at sample {start} starts past the end ({len})",
                        pattern.name
                    );
                }
                if let Some(v) = contour.final_value(ctx, event) {
                    last = v;
                }
            } else if !reactive {
                let end = start.saturating_add(event.samples).min(len);
                if start < end {
                    track[start..end].fill(last);
                }
            }
            start = start.saturating_add(event.samples);
        }

        Envelope {
            track: Controller::new(track),
        }
    }

    /// Frequency track in Hz; rests hold the previous pitch.
    pub fn frequency(ctx: &TimingContext, pattern: &Pattern) -> Self {
        Envelope::new(ctx, pattern, &Contour::frequency(), false)
    }

    pub fn phase(ctx: &TimingContext, pattern: &Pattern) -> Self {
        Envelope::new(ctx, pattern, &Contour::phase(), false)
    }

    /// Per-event amplitude (velocity); rests hold the previous level.
    pub fn amplitude(ctx: &TimingContext, pattern: &Pattern) -> Self {
        Envelope::new(ctx, pattern, &Contour::amplitude(), false)
    }

    pub fn delta(ctx: &TimingContext, pattern: &Pattern, attack: f64, decay: f64) -> Self {
        Envelope::new(ctx, pattern, &Contour::delta(attack, decay), true)
    }

    pub fn adsr(
        ctx: &TimingContext,
        pattern: &Pattern,
        attack: f64,
        decay: f64,
        sustain: f64,
        release: f64,
    ) -> Self {
        Envelope::new(ctx, pattern, &Contour::adsr(attack, decay, sustain, release), true)
    }

    pub fn controller(&self) -> &Controller {
        &self.track
    }

    pub fn into_controller(self) -> Controller {
        self.track
    }
}

impl From<Envelope> for Param {
    fn from(e: Envelope) -> Self {
        Param::Track(e.track)
    }
}

impl From<&Envelope> for Param {
    fn from(e: &Envelope) -> Self {
        Param::Track(e.track.clone())
    }
}
