//! DSP — Buffers, oscillators, envelopes, effects and mixing.
//!
//! Everything here renders whole buffers at once against a borrowed
//! `TimingContext`; nothing streams in real time.

pub mod channels;
pub mod effect;
pub mod envelope;
pub mod filter;
pub mod mixer;
pub mod oscillator;
pub mod renderer;
pub mod voice;
pub mod waveform;
pub mod wavetable;
