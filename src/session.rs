//! Session — owns the timing context and renders whole score documents.

use log::{info, warn};

use crate::context::{SessionConfig, TimingContext};
use crate::dsp::renderer::{AudioSink, render_wav};
use crate::dsp::voice::Voice;
use crate::dsp::waveform::Stream;
use crate::error::Result;
use crate::score::ScoreDocument;
use crate::sequencer::Sequencer;

#[derive(Debug, Clone)]
pub struct Session {
    ctx: TimingContext,
}

impl Session {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let ctx = TimingContext::new(config)?;
        info!("session: {ctx}");
        Ok(Session { ctx })
    }

    pub fn context(&self) -> &TimingContext {
        &self.ctx
    }

    /// Patterns parsed, each voice rendered, then mixed.
    pub fn render(&self, doc: &ScoreDocument) -> Result<Stream> {
        let mut seq = Sequencer::new().with_master_level(doc.master_level);
        for pattern in doc.patterns(&self.ctx)?.into_values() {
            seq.insert_pattern(pattern);
        }
        if doc.voices.is_empty() {
            warn!("score has no voices; rendering silence");
        }
        for config in &doc.voices {
            let pattern = seq.pattern(&config.pattern)?.clone();
            let mut voice = Voice::with_config(&self.ctx, config)?;
            let stream = voice.render(&self.ctx, &pattern)?;
            seq.push_stream(stream, config.line_level);
        }
        seq.mix()
    }

    pub fn render_wav(&self, doc: &ScoreDocument) -> Result<Vec<u8>> {
        render_wav(self.render(doc)?.samples(), self.ctx.fs())
    }

    pub fn export(&self, doc: &ScoreDocument, sink: &mut impl AudioSink) -> Result<()> {
        self.render(doc)?.bounce(sink, self.ctx.fs())
    }
}

/// Build the session a document asks for and render it.
pub fn render_document(doc: &ScoreDocument) -> Result<Stream> {
    Session::new(&doc.session)?.render(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuantizerError;

    const SCORE: &str = r#"{
        "session": {"beats": 4, "bpm": 120, "fs": 8000},
        "patterns": {
            "bass": [["1", "36", "100"], ["1"], ["2", "43", "-"]],
            "lead": [["0.5", "72", "90"], ["0.5", "76", "90"], ["3"]]
        },
        "voices": [
            {"pattern": "bass", "wavetable": "saw", "line_level": -6,
             "filters": [{"kind": "butterworth", "cutoff": 600, "order": 2, "mode": "lp"}]},
            {"pattern": "lead", "wavetable": "triangle", "detune": 5,
             "adsr": {"attack": 0.005, "decay": 0.05, "sustain": 0.7, "release": 0.2}}
        ],
        "master_level": -3
    }"#;

    #[test]
    fn renders_a_full_document() {
        let doc = ScoreDocument::from_json(SCORE).unwrap();
        let out = render_document(&doc).unwrap();
        // 4 beats at 120 bpm, 8 kHz
        assert_eq!(out.len(), 16000);
        assert!(out.samples().iter().any(|s| s.abs() > 0.05));
        assert!(out.samples().iter().all(|s| s.is_finite()));
    }

    #[test]
    fn rendering_is_deterministic() {
        let doc = ScoreDocument::from_json(SCORE).unwrap();
        let session = Session::new(&doc.session).unwrap();
        assert_eq!(session.render_wav(&doc).unwrap(), session.render_wav(&doc).unwrap());
    }

    #[test]
    fn unknown_pattern_fails() {
        let doc = ScoreDocument::from_json(r#"{"voices": [{"pattern": "nope"}]}"#).unwrap();
        assert!(matches!(
            render_document(&doc),
            Err(QuantizerError::UnknownPattern(_))
        ));
    }

    #[test]
    fn empty_document_is_silence() {
        let doc = ScoreDocument {
            session: SessionConfig {
                beats: 1.0,
                ..SessionConfig::default()
            },
            ..ScoreDocument::default()
        };
        let out = render_document(&doc).unwrap();
        assert!(out.is_empty());
    }
}
