//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform
//! Audio Library), plus the buffer-backed source used for offline input
//! and tests. Both ends of the pipeline speak [`FrameSource`]: a blocking
//! producer of fixed-size frames with an idempotent close.
//!
//! ## Features
//! - Automatic audio device selection
//! - Fixed-size frame delivery regardless of the device's callback sizes
//! - Stream errors surfaced through `read` instead of a side channel
//! - Scoped stream lifetime: closed explicitly or on drop, exactly once

use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Receiver;

use crate::TunerError;

/// Default capture rate (CD quality), in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// One chunk of captured audio.
///
/// Every frame a source produces has the same length and carries the
/// same sample rate; frequency resolution downstream depends on both.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Capture rate in Hz.
    pub sample_rate: u32,
    /// Mono samples, nominally in [-1, 1].
    pub samples: Vec<f32>,
}

/// A blocking producer of fixed-size audio frames.
pub trait FrameSource {
    /// Blocks until a full frame is available.
    fn read(&mut self) -> Result<AudioFrame, TunerError>;

    /// Releases the underlying input. Idempotent; after the first call
    /// subsequent `read`s fail rather than block.
    fn close(&mut self);
}

/// Live microphone input.
///
/// The CPAL stream callback accumulates whatever slice sizes the device
/// delivers and hands whole chunks over a channel; `read` blocks on that
/// channel. The frame channel is unbounded, so a consumer that ticks
/// slower than real time sees frames queue up rather than drop.
pub struct InputSource {
    stream: Option<cpal::Stream>,
    frames: Receiver<Vec<f32>>,
    errors: Receiver<String>,
    sample_rate: u32,
}

impl InputSource {
    /// Opens the default input device at the default rate with
    /// one-second chunks.
    pub fn open_default() -> Result<Self, TunerError> {
        Self::open(DEFAULT_SAMPLE_RATE, DEFAULT_SAMPLE_RATE as usize)
    }

    /// Opens the default input device.
    ///
    /// # Arguments
    /// * `sample_rate` - Capture rate in Hz
    /// * `chunk_size` - Samples per frame; `read` blocks until this many
    ///   have been captured
    ///
    /// # Audio Configuration
    /// - Format: 32-bit float
    /// - Channels: Mono (1 channel)
    pub fn open(sample_rate: u32, chunk_size: usize) -> Result<Self, TunerError> {
        if chunk_size == 0 {
            return Err(TunerError::Device("chunk size must be nonzero".into()));
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| TunerError::Device("no input device available".into()))?;
        let device_name = device.name().map_err(|e| TunerError::Device(e.to_string()))?;

        let configs = device
            .supported_input_configs()
            .map_err(|e| TunerError::Device(e.to_string()))?
            .collect::<Vec<_>>();
        let supported = find_supported_config(configs, sample_rate).ok_or_else(|| {
            TunerError::Device(format!("no mono f32 input format at {sample_rate} Hz"))
        })?;
        let config: cpal::StreamConfig = supported
            .with_sample_rate(cpal::SampleRate(sample_rate))
            .into();

        log::info!("capturing from {device_name} at {sample_rate} Hz, {chunk_size}-sample frames");

        let (frame_tx, frame_rx) = crossbeam_channel::unbounded::<Vec<f32>>();
        let (error_tx, error_rx) = crossbeam_channel::bounded::<String>(1);

        // This buffer accumulates audio data from the callback.
        let mut audio_buffer = Vec::with_capacity(chunk_size * 2);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Append new data to our buffer.
                    audio_buffer.extend_from_slice(data);

                    // While we have enough data for a full frame, hand it over.
                    while audio_buffer.len() >= chunk_size {
                        let frame_to_send = audio_buffer[..chunk_size].to_vec();
                        let _ = frame_tx.send(frame_to_send);
                        audio_buffer.drain(..chunk_size);
                    }
                },
                move |err| {
                    log::error!("capture stream failed: {err}");
                    let _ = error_tx.try_send(err.to_string());
                },
                None,
            )
            .map_err(|e| TunerError::Device(e.to_string()))?;

        stream.play().map_err(|e| TunerError::Device(e.to_string()))?;

        Ok(Self {
            stream: Some(stream),
            frames: frame_rx,
            errors: error_rx,
            sample_rate,
        })
    }
}

impl FrameSource for InputSource {
    fn read(&mut self) -> Result<AudioFrame, TunerError> {
        if self.stream.is_none() {
            return Err(TunerError::Device("capture source is closed".into()));
        }
        crossbeam_channel::select! {
            recv(self.frames) -> frame => match frame {
                Ok(samples) => Ok(AudioFrame {
                    sample_rate: self.sample_rate,
                    samples,
                }),
                Err(_) => Err(TunerError::Device("capture stream disconnected".into())),
            },
            recv(self.errors) -> err => {
                let detail = err.unwrap_or_else(|_| "capture stream disconnected".into());
                Err(TunerError::Device(detail))
            }
        }
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::warn!("failed to pause capture stream: {e}");
            }
            drop(stream);
            log::info!("capture stream closed");
        }
    }
}

impl Drop for InputSource {
    fn drop(&mut self) {
        // Backstop for sources that were never closed explicitly.
        self.close();
    }
}

/// Finds a mono f32 input configuration whose rate range contains the
/// target.
///
/// Containment matters: forcing a rate outside a configuration's
/// advertised range is rejected by CPAL when the stream is built. Among
/// the containing candidates the one with the tightest range around the
/// target wins.
///
/// # Arguments
/// * `configs` - List of supported audio configurations from the device
/// * `target_rate` - Desired sample rate in Hz
///
/// # Returns
/// * `Some(config)` - Best matching configuration
/// * `None` - No suitable configuration found
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .filter(|c| c.min_sample_rate().0 <= target_rate && target_rate <= c.max_sample_rate().0)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
            let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
            min_diff.min(max_diff)
        })
}

/// Pre-decoded audio served as fixed-size frames, for offline input and
/// tests.
///
/// Yields successive chunks of the buffer and [`TunerError::EndOfStream`]
/// once fewer than `chunk_size` samples remain; a trailing partial chunk
/// is dropped so every frame has the same length.
#[derive(Debug, Clone)]
pub struct MemorySource {
    sample_rate: u32,
    chunk_size: usize,
    samples: Vec<f32>,
    position: usize,
}

impl MemorySource {
    pub fn new(sample_rate: u32, chunk_size: usize, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            chunk_size,
            samples,
            position: 0,
        }
    }
}

impl FrameSource for MemorySource {
    fn read(&mut self) -> Result<AudioFrame, TunerError> {
        if self.chunk_size == 0 || self.position + self.chunk_size > self.samples.len() {
            return Err(TunerError::EndOfStream);
        }
        let frame = AudioFrame {
            sample_rate: self.sample_rate,
            samples: self.samples[self.position..self.position + self.chunk_size].to_vec(),
        };
        self.position += self.chunk_size;
        Ok(frame)
    }

    fn close(&mut self) {
        // No device behind this source; just stop serving frames.
        self.position = self.samples.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_yields_fixed_size_frames() {
        let mut source = MemorySource::new(8000, 4, (0..10).map(|i| i as f32).collect());
        let first = source.read().unwrap();
        assert_eq!(first.samples, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(first.sample_rate, 8000);
        let second = source.read().unwrap();
        assert_eq!(second.samples, vec![4.0, 5.0, 6.0, 7.0]);
        // Two samples remain, fewer than a frame.
        assert!(matches!(source.read(), Err(TunerError::EndOfStream)));
    }

    #[test]
    fn memory_source_close_stops_delivery() {
        let mut source = MemorySource::new(8000, 2, vec![0.0; 8]);
        source.read().unwrap();
        source.close();
        assert!(matches!(source.read(), Err(TunerError::EndOfStream)));
        // Closing again is harmless.
        source.close();
        assert!(matches!(source.read(), Err(TunerError::EndOfStream)));
    }

    #[test]
    fn zero_chunk_size_never_delivers() {
        let mut source = MemorySource::new(8000, 0, vec![0.0; 8]);
        assert!(matches!(source.read(), Err(TunerError::EndOfStream)));
    }
}
