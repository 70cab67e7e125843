use std::fmt;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, QuantizerError>;

#[derive(Debug)]
pub enum QuantizerError {
    /// Elementwise operation or track cast on buffers of different lengths.
    LengthMismatch { expected: usize, found: usize },
    UnsupportedFilterMode(String),
    UnsupportedWavetable(String),
    /// Effect applied to a channel layout it does not process.
    UnsupportedArity { effect: String, input: String },
    InvalidFilter(String),
    /// Line levels given for a different number of streams.
    LineLevelCount { streams: usize, levels: usize },
    /// Multi-channel stream built from channels of the wrong shape.
    ChannelLayout(String),
    InvalidContext(String),
    /// Envelope breakpoints whose counts do not line up.
    InvalidEnvelope(String),
    Score(String),
    UnknownPattern(String),
    Json(serde_json::Error),
    Io(std::io::Error),
    Wav(hound::Error),
}

impl fmt::Display for QuantizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantizerError::LengthMismatch { expected, found } => {
                write!(f, "Length mismatch: expected {expected} samples, found {found}")
            }
            QuantizerError::UnsupportedFilterMode(mode) => {
                write!(f, "Unsupported filter mode '{mode}'")
            }
            QuantizerError::UnsupportedWavetable(name) => {
                write!(f, "Unsupported wavetable '{name}'")
            }
            QuantizerError::UnsupportedArity { effect, input } => {
                write!(f, "Effect {effect} cannot process a {input} stream")
            }
            QuantizerError::InvalidFilter(msg) => write!(f, "Invalid filter: {msg}"),
            QuantizerError::LineLevelCount { streams, levels } => {
                write!(f, "Got {levels} line levels for {streams} streams")
            }
            QuantizerError::ChannelLayout(msg) => write!(f, "Invalid channel layout: {msg}"),
            QuantizerError::InvalidContext(msg) => write!(f, "Invalid timing context: {msg}"),
            QuantizerError::InvalidEnvelope(msg) => write!(f, "Invalid envelope: {msg}"),
            QuantizerError::Score(msg) => write!(f, "Score error: {msg}"),
            QuantizerError::UnknownPattern(name) => write!(f, "Unknown pattern '{name}'"),
            QuantizerError::Json(e) => write!(f, "JSON error: {e}"),
            QuantizerError::Io(e) => write!(f, "I/O error: {e}"),
                    QuantizerError::Wav(e) => write!(f, "WAV error: {e}"),
        }
    }
}

impl std::error::Error for QuantizerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QuantizerError::Json(e) => Some(e),
            QuantizerError::Io(e) => Some(e),
                    QuantizerError::Wav(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for QuantizerError {
    fn from(e: serde_json::Error) -> Self {
        QuantizerError::Json(e)
    }
}

impl From<std::io::Error> for QuantizerError {
    fn from(e: std::io::Error) -> Self {
        QuantizerError::Io(e)
    }
}

impl From<hound::Error> for QuantizerError {
    fn from(e: hound::Error) -> Self {
        QuantizerError::Wav(e)
    }
}
