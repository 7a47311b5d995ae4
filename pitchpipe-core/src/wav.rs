//! # WAV Decoding Module
//!
//! Offline input path: decodes an entire uncompressed WAV file into one
//! or two channels of f32 samples. Decoding is a pure function with no
//! handle left open afterwards; feed a channel to the session through
//! [`DecodedAudio::into_source`].

use std::path::Path;

use crate::TunerError;
use crate::audio::MemorySource;

/// A fully decoded audio file, split into channels.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Rate the file was recorded at, in Hz.
    pub sample_rate: u32,
    /// One entry for mono input, two (left then right) for stereo.
    pub channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    /// Serves one channel through the frame-source contract.
    ///
    /// # Arguments
    /// * `channel` - Channel index, 0 for mono or the left channel
    /// * `chunk_size` - Samples per frame the source will yield
    pub fn into_source(mut self, channel: usize, chunk_size: usize) -> Result<MemorySource, TunerError> {
        if channel >= self.channels.len() {
            return Err(TunerError::UnsupportedFormat(format!(
                "channel {channel} requested from {}-channel audio",
                self.channels.len()
            )));
        }
        let samples = self.channels.swap_remove(channel);
        Ok(MemorySource::new(self.sample_rate, chunk_size, samples))
    }
}

/// Decodes a whole `.wav` file into memory.
///
/// Accepts mono or stereo PCM at 8/16/24/32-bit integer or 32-bit float
/// depth; integer samples are normalized to [-1, 1]. Files without a
/// `.wav` extension (any case) are rejected before they are opened.
///
/// # Arguments
/// * `path` - Path to the file
///
/// # Returns
/// * The decoded channels, or `UnsupportedFormat` / `Io` on anything
///   the decoder cannot read
pub fn read_wav(path: &Path) -> Result<DecodedAudio, TunerError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "wav" {
        return Err(TunerError::UnsupportedFormat(format!(
            "unrecognized audio file: {}",
            path.display()
        )));
    }

    let mut reader = hound::WavReader::open(path).map_err(map_hound_error)?;
    let spec = reader.spec();
    if spec.channels == 0 || spec.channels > 2 {
        return Err(TunerError::UnsupportedFormat(format!(
            "{}-channel WAV; only mono and stereo are supported",
            spec.channels
        )));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(map_hound_error)?,
        hound::SampleFormat::Int => {
            // Full-scale for signed integers of this bit depth.
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(map_hound_error)?
        }
    };

    let channel_count = spec.channels as usize;
    let mut channels: Vec<Vec<f32>> = (0..channel_count)
        .map(|_| Vec::with_capacity(interleaved.len() / channel_count))
        .collect();
    for (i, sample) in interleaved.into_iter().enumerate() {
        channels[i % channel_count].push(sample);
    }

    log::info!(
        "decoded {}: {} channel(s), {} samples at {} Hz",
        path.display(),
        channel_count,
        channels[0].len(),
        spec.sample_rate
    );

    Ok(DecodedAudio {
        sample_rate: spec.sample_rate,
        channels,
    })
}

/// I/O problems stay I/O errors; everything else hound reports means
/// the encoding is one we do not read.
fn map_hound_error(err: hound::Error) -> TunerError {
    match err {
        hound::Error::IoError(e) => TunerError::Io(e),
        other => TunerError::UnsupportedFormat(other.to_string()),
    }
}
