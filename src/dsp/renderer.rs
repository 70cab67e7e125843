//! WAV renderer — sinks that take finished sample buffers.

use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::units::minmax_scale_i16;

/// Destination for a rendered buffer: a file, memory, a playback device.
pub trait AudioSink {
    fn write(&mut self, samples: &[f64], sample_rate: u32) -> Result<()>;
}

/// Quantize float samples in [-1, 1] to 16-bit PCM.
pub fn to_pcm_i16(samples: &[f64]) -> Vec<i16> {
    samples.iter().map(|&s| minmax_scale_i16(s)).collect()
}

/// 16-bit mono PCM, the only format the renderer writes.
fn pcm_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn write_pcm<W: Write + Seek>(mut writer: hound::WavWriter<W>, samples: &[f64]) -> Result<()> {
    for &s in samples {
        writer.write_sample(minmax_scale_i16(s))?;
    }
    writer.finalize()?;
    Ok(())
}

/// Render mono samples to a WAV file as bytes (16-bit mono PCM).
pub fn render_wav(samples: &[f64], sample_rate: u32) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    write_pcm(hound::WavWriter::new(&mut cursor, pcm_spec(sample_rate))?, samples)?;
    Ok(cursor.into_inner())
}

/// In-memory WAV encoder. Each `write` replaces the previous contents.
#[derive(Debug, Clone, Default)]
pub struct WavBytes {
    bytes: Vec<u8>,
}

impl WavBytes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AudioSink for WavBytes {
    fn write(&mut self, samples: &[f64], sample_rate: u32) -> Result<()> {
        self.bytes = render_wav(samples, sample_rate)?;
        Ok(())
    }
}

/// WAV file on disk, written through `hound`.
#[derive(Debug, Clone)]
pub struct WavFile {
    path: PathBuf,
}

impl WavFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        WavFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AudioSink for WavFile {
    fn write(&mut self, samples: &[f64], sample_rate: u32) -> Result<()> {
        write_pcm(hound::WavWriter::create(&self.path, pcm_spec(sample_rate))?, samples)?;
        log::info!(
            "wrote {} samples at {} Hz to {}",
            samples.len(),
            sample_rate,
            self.path.display()
        );
        Ok(())
    }
}
