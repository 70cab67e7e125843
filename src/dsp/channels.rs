//! Channel layouts — mono, stereo and multichannel stream bundles.

use std::fmt;

use crate::error::{QuantizerError, Result};

use super::waveform::Stream;

/// Channel count class, shared by layouts and effect capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Mono,
    Stereo,
    Multi,
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Mono => write!(f, "mono"),
            Arity::Stereo => write!(f, "stereo"),
            Arity::Multi => write!(f, "multi"),
        }
    }
}

/// One or more equal-length streams.
#[derive(Debug, Clone, PartialEq)]
pub enum Channels {
    Mono(Stream),
    Stereo([Stream; 2]),
    Multi(Vec<Stream>),
}

impl Channels {
    pub fn mono(stream: Stream) -> Self {
        Channels::Mono(stream)
    }

    pub fn stereo(left: Stream, right: Stream) -> Result<Self> {
        if left.len() != right.len() {
            return Err(QuantizerError::ChannelLayout(format!(
                "stereo channels differ in length ({} vs {})",
                left.len(),
                right.len()
            )));
        }
        Ok(Channels::Stereo([left, right]))
    }

    /// More than two channels of equal length.
    pub fn multi(streams: Vec<Stream>) -> Result<Self> {
        if streams.len() <= 2 {
            return Err(QuantizerError::ChannelLayout(format!(
                "multichannel layout needs more than two channels, got {}",
                streams.len()
            )));
        }
        let len = streams[0].len();
        if let Some(odd) = streams.iter().find(|s| s.len() != len) {
            return Err(QuantizerError::ChannelLayout(format!(
                "multichannel streams differ in length ({} vs {})",
                len,
                odd.len()
            )));
        }
        Ok(Channels::Multi(streams))
    }

    pub fn arity(&self) -> Arity {
        match self {
            Channels::Mono(_) => Arity::Mono,
            Channels::Stereo(_) => Arity::Stereo,
            Channels::Multi(_) => Arity::Multi,
        }
    }

    pub fn channel_count(&self) -> usize {
        match self {
            Channels::Mono(_) => 1,
            Channels::Stereo(_) => 2,
            Channels::Multi(s) => s.len(),
        }
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        match self {
            Channels::Mono(s) => s.len(),
            Channels::Stereo([l, _]) => l.len(),
            Channels::Multi(s) => s.first().map_or(0, |c| c.len()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_streams(self) -> Vec<Stream> {
        match self {
            Channels::Mono(s) => vec![s],
            Channels::Stereo([l, r]) => vec![l, r],
            Channels::Multi(s) => s,
        }
    }
}

impl From<Stream> for Channels {
    fn from(s: Stream) -> Self {
        Channels::Mono(s)
    }
}
