use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{SessionConfig, TimingContext};
use crate::error::{QuantizerError, Result};
use crate::pattern::{DEFAULT_MIDI_NOTE, Event, Pattern};
use crate::units::{midi_to_freq, midi_to_mag};

/// Velocity used when a score leaves it unspecified.
pub const DEFAULT_VELOCITY: f64 = 127.0;

// ── Voice Configuration ─────────────────────────────────────

/// ADSR times in seconds, sustain as a linear level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsrConfig {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Default for AdsrConfig {
    fn default() -> Self {
        AdsrConfig {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.5,
            release: 1.0,
        }
    }
}

/// One entry of a voice's effect chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FilterConfig {
    Sinc {
        cutoff: f64,
        #[serde(default = "default_bandwidth")]
        bandwidth: f64,
        #[serde(default = "default_mode")]
        mode: String,
    },
    Butterworth {
        cutoff: f64,
        #[serde(default = "default_order")]
        order: usize,
        #[serde(default = "default_mode")]
        mode: String,
    },
}

fn default_bandwidth() -> f64 {
    440.0
}

fn default_order() -> usize {
    4
}

fn default_mode() -> String {
    "lp".to_string()
}

/// How one pattern is played: wavetable, envelope, tuning, level, effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Name of the pattern to play.
    pub pattern: String,
    /// Wavetable name: "sine", "square", "saw", "triangle" or "noise".
    pub wavetable: String,
    pub adsr: AdsrConfig,
    /// Detune in cents.
    pub detune: f64,
    /// Line level in dB.
    pub line_level: f64,
    pub filters: Vec<FilterConfig>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        VoiceConfig {
            pattern: String::new(),
            wavetable: "sine".to_string(),
            adsr: AdsrConfig::default(),
            detune: 0.0,
            line_level: 0.0,
            filters: Vec::new(),
        }
    }
}

// ── Score Document ──────────────────────────────────────────

/// A complete piece: session timing, named patterns, and the voices that
/// play them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreDocument {
    pub session: SessionConfig,
    /// Pattern name → event spec, or list of event specs.
    pub patterns: serde_json::Map<String, Value>,
    pub voices: Vec<VoiceConfig>,
    /// Master level in dB.
    pub master_level: f64,
}

impl ScoreDocument {
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Parse every pattern against `ctx`.
    pub fn patterns(&self, ctx: &TimingContext) -> Result<BTreeMap<String, Pattern>> {
        parse_table(ctx, &self.patterns)
    }
}

// ── Event Specs ─────────────────────────────────────────────

/// Parse a whole pattern table: an object mapping names to event specs.
pub fn parse_patterns(ctx: &TimingContext, table: &Value) -> Result<BTreeMap<String, Pattern>> {
    let Value::Object(map) = table else {
        return Err(QuantizerError::Score(
            "pattern table must be an object of name → events".to_string(),
        ));
    };
    parse_table(ctx, map)
}

fn parse_table(
    ctx: &TimingContext,
    table: &serde_json::Map<String, Value>,
) -> Result<BTreeMap<String, Pattern>> {
    table
        .iter()
        .map(|(name, spec)| Ok((name.clone(), parse_pattern(ctx, name, spec)?)))
        .collect()
}

/// One named pattern. `spec` is either a single event spec (an array of
/// scalars, possibly empty) or an array of event specs.
pub fn parse_pattern(ctx: &TimingContext, name: &str, spec: &Value) -> Result<Pattern> {
    let Value::Array(items) = spec else {
        return Err(QuantizerError::Score(format!(
            "pattern '{name}' must be an array"
        )));
    };
    let mut pattern = Pattern::new(name);
    match items.first() {
        Some(Value::Array(_)) => {
            for item in items {
                let Value::Array(fields) = item else {
                    return Err(QuantizerError::Score(format!(
                        "pattern '{name}' mixes events and scalars"
                    )));
                };
                pattern.append(parse_event_spec(ctx, fields)?);
            }
        }
        _ => pattern.append(parse_event_spec(ctx, items)?),
    }
    Ok(pattern)
}

/// Build one event from its score fields `[beats, pitch, velocity, cc...]`.
///
/// Fewer than three fields make a rest: none at all lasts one beat, otherwise
/// the first field is its length in beats. A pitch or velocity containing
/// `-` falls back to MIDI note 36 or velocity 127.
pub fn parse_event_spec(ctx: &TimingContext, fields: &[Value]) -> Result<Event> {
    let text: Vec<String> = fields.iter().map(field_text).collect::<Result<_>>()?;

    if text.len() < 3 {
        let beats = match text.first() {
            Some(b) => parse_number(b)?,
            None => 1.0,
        };
        return Ok(Event::rest(ctx.beats_to_samples(beats)));
    }

    let beats = parse_number(&text[0])?;
    let pitch = if text[1].contains('-') {
        DEFAULT_MIDI_NOTE
    } else {
        parse_number(&text[1])?
    };
    let velocity = if text[2].contains('-') {
        DEFAULT_VELOCITY
    } else {
        parse_number(&text[2])?
    };
    let cc = text[3..]
        .iter()
        .map(|s| parse_number(s))
        .collect::<Result<Vec<_>>>()?;

    Ok(Event::note(ctx.beats_to_samples(beats), midi_to_freq(pitch), midi_to_mag(velocity)).with_cc(cc))
}

fn field_text(v: &Value) -> Result<String> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(QuantizerError::Score(format!(
            "event fields must be strings or numbers, got {other}"
        ))),
    }
}

fn parse_number(s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| QuantizerError::Score(format!("'{s}' is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use serde_json::json;

    fn ctx() -> TimingContext {
        TimingContext::from_beats(16.0, 120.0, 44100).unwrap()
    }

    fn event(spec: Value) -> Result<Event> {
        let Value::Array(fields) = spec else { panic!("not an array") };
        parse_event_spec(&ctx(), &fields)
    }

    #[test]
    fn empty_spec_is_a_one_beat_rest() {
        let e = event(json!([])).unwrap();
        assert!(e.idle);
        assert_eq!(e.samples, 22050);
    }

    #[test]
    fn one_or_two_fields_are_rests() {
        let e = event(json!(["2"])).unwrap();
        assert!(e.idle);
        assert_eq!(e.samples, 44100);

        let e = event(json!(["0.5", "60"])).unwrap();
        assert!(e.idle);
        assert_eq!(e.samples, 11025);
    }

    #[test]
    fn three_fields_are_a_note() {
        let e = event(json!(["1", "69", "127"])).unwrap();
        assert!(!e.idle);
        assert_eq!(e.samples, 22050);
        assert_approx_eq!(e.frequency, 440.0);
        assert_approx_eq!(e.amplitude, 1.0);
        assert!(e.cc.is_empty());
    }

    #[test]
    fn dashes_select_defaults() {
        let e = event(json!(["1", "-", "-"])).unwrap();
        assert_approx_eq!(e.frequency, midi_to_freq(36.0));
        assert_approx_eq!(e.amplitude, 1.0);

        let e = event(json!(["1", "-", "63.5"])).unwrap();
        assert_approx_eq!(e.frequency, midi_to_freq(36.0));
        assert_approx_eq!(e.amplitude, 0.5);

        let e = event(json!(["1", "81", "-"])).unwrap();
        assert_approx_eq!(e.frequency, 880.0);
        assert_approx_eq!(e.amplitude, 1.0);
    }

    #[test]
    fn extra_fields_become_cc() {
        let e = event(json!([1, 60, 100, "0.25", 7])).unwrap();
        assert_eq!(e.cc, vec![0.25, 7.0]);
        assert_approx_eq!(e.amplitude, 100.0 / 127.0);
    }

    #[test]
    fn bad_numbers_are_reported() {
        assert!(matches!(event(json!(["x"])), Err(QuantizerError::Score(_))));
        assert!(matches!(event(json!(["1", "60", "loud"])), Err(QuantizerError::Score(_))));
        assert!(matches!(event(json!([true])), Err(QuantizerError::Score(_))));
    }

    #[test]
    fn pattern_table_accepts_single_and_multiple_events() {
        let table = json!({
            "kick": ["1", "36", "127"],
            "rest": [],
            "bass": [["1", "36", "100"], ["1"], ["2", "43", "-"]]
        });
        let patterns = parse_patterns(&ctx(), &table).unwrap();
        assert_eq!(patterns["kick"].len(), 1);
        assert!(patterns["rest"].events[0].idle);
        assert_eq!(patterns["bass"].len(), 3);
        assert_eq!(patterns["bass"].name, "bass");
        assert_eq!(patterns["bass"].duration(), 22050 * 4);
    }

    #[test]
    fn document_defaults() {
        let doc = ScoreDocument::from_json(
            r#"{"patterns": {"a": ["1"]}, "voices": [{"pattern": "a"}]}"#,
        )
        .unwrap();
        assert_eq!(doc.session, SessionConfig::default());
        assert_eq!(doc.voices[0].wavetable, "sine");
        assert_eq!(doc.voices[0].adsr, AdsrConfig::default());
        assert_eq!(doc.master_level, 0.0);
    }

    #[test]
    fn filter_configs_are_tagged() {
        let doc = ScoreDocument::from_json(
            r#"{"voices": [{"pattern": "a", "filters": [
                {"kind": "sinc", "cutoff": 2000, "bandwidth": 400, "mode": "hp"},
                {"kind": "butterworth", "cutoff": 800}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(
            doc.voices[0].filters,
            vec![
                FilterConfig::Sinc { cutoff: 2000.0, bandwidth: 400.0, mode: "hp".to_string() },
                FilterConfig::Butterworth { cutoff: 800.0, order: 4, mode: "lp".to_string() },
            ]
        );
    }
}
