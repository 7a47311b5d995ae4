// pitchpipe-core/src/lib.rs

//! The core logic for the pitchpipe chromatic tuner.
//! This crate is responsible for audio capture, spectral analysis,
//! note mapping and tuning evaluation. It is completely headless
//! and contains no terminal or GUI code.

pub mod audio;
pub mod config;
pub mod fft;
pub mod notes;
pub mod session;
pub mod tuning;
pub mod wav;

use thiserror::Error;

/// Errors surfaced by the capture and decode boundaries.
///
/// Quiet input and unmatched frequencies are ordinary analysis outcomes,
/// not errors; only device, format and I/O failures end a session.
#[derive(Debug, Error)]
pub enum TunerError {
    /// The capture device could not be opened or failed mid-stream.
    #[error("audio device error: {0}")]
    Device(String),
    /// The input is not audio this crate can decode.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    /// A buffer-backed source ran out of frames. Live capture never
    /// returns this.
    #[error("end of audio stream")]
    EndOfStream,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
