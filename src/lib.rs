pub mod context;
pub mod dsp;
pub mod error;
pub mod pattern;
pub mod score;
pub mod sequencer;
pub mod session;
pub mod units;

use crate::error::QuantizerError;
use crate::score::ScoreDocument;
use crate::session::Session;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the quantizer-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Parse a JSON score document.
pub fn parse_score(source: &str) -> Result<ScoreDocument, QuantizerError> {
    ScoreDocument::from_json(source)
}

fn js_error(e: QuantizerError) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed: render a JSON score document to a WAV byte array
/// (16-bit mono PCM at the score's sample rate).
#[wasm_bindgen]
pub fn render_score_wav(source: &str) -> Result<Vec<u8>, JsValue> {
    let doc = parse_score(source).map_err(js_error)?;
    let session = Session::new(&doc.session).map_err(js_error)?;
    session.render_wav(&doc).map_err(js_error)
}

/// WASM-exposed: render a JSON score document to mono f32 samples.
/// Returns the raw audio buffer for AudioWorklet playback.
#[wasm_bindgen]
pub fn render_score_samples(source: &str) -> Result<Vec<f32>, JsValue> {
    let doc = parse_score(source).map_err(js_error)?;
    let mix = session::render_document(&doc).map_err(js_error)?;
    Ok(mix.samples().iter().map(|&s| s as f32).collect())
}

/// WASM-exposed: parse the score's pattern table into resolved events.
#[wasm_bindgen]
pub fn score_patterns(source: &str) -> Result<JsValue, JsValue> {
    let doc = parse_score(source).map_err(js_error)?;
    let session = Session::new(&doc.session).map_err(js_error)?;
    let patterns = doc.patterns(session.context()).map_err(js_error)?;
    serde_wasm_bindgen::to_value(&patterns).map_err(|e| JsValue::from_str(&format!("{e}")))
}
