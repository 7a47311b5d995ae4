//! # Pitchpipe - Headless Chromatic Tuner
//!
//! This binary runs the tuning pipeline against the default microphone
//! (or a WAV file given as the single argument) and prints one line per
//! second: the loudest frequency, the matched note, and which way to
//! correct. A lone `*` means the input went quiet.
//!
//! ## Architecture
//! - **Main Thread**: owns the session loop; no worker threads
//! - **Audio Callback**: CPAL delivers samples on its own thread, handed
//!   over via crossbeam channels inside the core crate
//! - **Settings**: optional `pitchpipe.json` in the working directory

use anyhow::{Context, Result};

use pitchpipe_core::TunerError;
use pitchpipe_core::audio::{FrameSource, InputSource};
use pitchpipe_core::config::TunerConfig;
use pitchpipe_core::session::{DEFAULT_TICK_INTERVAL, Session, SessionEvent};
use pitchpipe_core::tuning::TuneDirection;
use pitchpipe_core::wav;

/// Settings file read from the working directory when present.
const CONFIG_PATH: &str = "pitchpipe.json";

fn main() -> Result<()> {
    env_logger::init();

    let config = load_config(CONFIG_PATH)?;
    log::info!(
        "reference pitch {} Hz, band {}-{} Hz",
        config.reference_pitch,
        config.min_frequency_hz,
        config.max_frequency_hz
    );

    let result = match std::env::args().nth(1) {
        Some(path) => {
            let decoded = wav::read_wav(std::path::Path::new(&path))
                .with_context(|| format!("could not decode {path}"))?;
            let chunk_size = decoded.sample_rate as usize;
            let source = decoded.into_source(0, chunk_size)?;
            run_session(Session::new(source, config))
        }
        None => {
            let source = InputSource::open_default()
                .context("could not open the default input device")?;
            run_session(Session::new(source, config))
        }
    };

    match result {
        // A file source running dry is the normal way an offline run ends.
        Err(TunerError::EndOfStream) => {
            log::info!("input exhausted");
            Ok(())
        }
        other => other.map_err(Into::into),
    }
}

/// Drives the session at the default one-second cadence until the input
/// fails or runs out, printing every emission.
fn run_session<S: FrameSource>(mut session: Session<S>) -> Result<(), TunerError> {
    session.run(
        DEFAULT_TICK_INTERVAL,
        crossbeam_channel::never(),
        print_event,
    )
}

/// Renders one session emission as a terminal line.
///
/// Flat notes get an up arrow (tune up), sharp notes a down arrow.
fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::Tuning { result, .. } => {
            let arrow = match result.direction {
                TuneDirection::InTune => "\u{2713}",
                TuneDirection::Sharp => "\u{2193}",
                TuneDirection::Flat => "\u{2191}",
                TuneDirection::None => " ",
            };
            let note = result.note.unwrap_or("?");
            let octave = result.octave.map(|o| o.to_string()).unwrap_or_default();
            println!("{:>7.1} Hz ({note}{octave}) {arrow}", result.frequency_hz);
        }
        SessionEvent::Silence => println!("*"),
    }
}

/// Loads tuner settings from `path`, falling back to the defaults when
/// the file does not exist.
fn load_config(path: &str) -> Result<TunerConfig> {
    match std::fs::read_to_string(path) {
        Ok(data) => {
            let config = serde_json::from_str(&data)
                .with_context(|| format!("could not parse {path}"))?;
            log::info!("loaded settings from {path}");
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TunerConfig::default()),
        Err(e) => Err(e).with_context(|| format!("could not read {path}")),
    }
}
