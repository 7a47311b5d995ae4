//! # Session Loop Module
//!
//! This module drives the capture, analysis, mapping and evaluation
//! stages at a fixed cadence and owns the per-session display state:
//! the silence debounce counter and the note most recently announced as
//! in tune.
//!
//! ## Features
//! - One blocking frame read and one full pipeline pass per tick
//! - Silence debounce: the display clears once after three straight
//!   unmatched ticks, not on every quiet frame
//! - One announcement per freshly tuned note, re-armed when the pitch
//!   drifts off again
//! - Source closed exactly once on every exit path

use std::time::Duration;

use crossbeam_channel::Receiver;

use crate::audio::FrameSource;
use crate::config::TunerConfig;
use crate::tuning::{self, TuneDirection, TuningResult};
use crate::{TunerError, fft, notes};

/// Consecutive unmatched ticks before a single clear is emitted.
const SILENCE_TICKS: u32 = 3;

/// Default spacing between pipeline passes.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// What one tick tells the presentation layer, when it says anything.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A confident match. `newly_in_tune` is set on the first in-tune
    /// tick of a note that was not already the announced one, so a
    /// front end can ring a bell once instead of every second.
    Tuning {
        result: TuningResult,
        newly_in_tune: bool,
    },
    /// Three straight ticks without a match; displayed state should
    /// clear.
    Silence,
}

/// Mutable per-session display state. The loop owns it exclusively.
#[derive(Debug, Default)]
struct SessionState {
    consecutive_no_match: u32,
    /// The note most recently announced as in tune, if still standing.
    /// Survives silence: re-striking the same string cleanly does not
    /// ring the bell again.
    announced: Option<(&'static str, i32)>,
}

/// Owns a frame source and runs the full pipeline over it.
pub struct Session<S: FrameSource> {
    source: S,
    config: TunerConfig,
    state: SessionState,
}

impl<S: FrameSource> Session<S> {
    pub fn new(source: S, config: TunerConfig) -> Self {
        Self {
            source,
            config,
            state: SessionState::default(),
        }
    }

    /// Runs one pipeline pass: one blocking read, then analysis.
    ///
    /// Returns `Ok(None)` for the first ticks of an unmatched streak;
    /// the debounce emits [`SessionEvent::Silence`] on the third and
    /// then starts counting afresh. Callers driving their own timer
    /// decide the cadence.
    pub fn tick(&mut self) -> Result<Option<SessionEvent>, TunerError> {
        let frame = self.source.read()?;
        let (estimate, _spectrum) = fft::analyze(&frame, None);

        let Some(matched) = notes::nearest_note(estimate.frequency, estimate.amplitude, &self.config)
        else {
            self.state.consecutive_no_match += 1;
            log::debug!(
                "no match ({} in a row), loudest {:.1} Hz",
                self.state.consecutive_no_match,
                estimate.frequency
            );
            if self.state.consecutive_no_match == SILENCE_TICKS {
                self.state.consecutive_no_match = 0;
                return Ok(Some(SessionEvent::Silence));
            }
            return Ok(None);
        };

        self.state.consecutive_no_match = 0;
        let result = tuning::evaluate(estimate.frequency, &matched, self.config.reference_pitch);

        let newly_in_tune = if result.direction == TuneDirection::InTune {
            let fresh = self.state.announced != Some((matched.name, matched.octave));
            if fresh {
                self.state.announced = Some((matched.name, matched.octave));
            }
            fresh
        } else {
            // An off-tune reading re-arms the announcement.
            self.state.announced = None;
            false
        };

        log::debug!(
            "{}{} {:?}, {:.2} Hz off",
            matched.name,
            matched.octave,
            result.direction,
            result.deviation_hz
        );
        Ok(Some(SessionEvent::Tuning {
            result,
            newly_in_tune,
        }))
    }

    /// Drives [`Session::tick`] on a fixed cadence until the stop
    /// channel fires or a device error ends the session.
    ///
    /// Whatever the exit path, the source is closed before returning.
    ///
    /// # Arguments
    /// * `cadence` - Time between pipeline passes
    /// * `stop` - Fires (or disconnects) to end the session cleanly
    /// * `sink` - Receives every emitted event
    pub fn run<F>(&mut self, cadence: Duration, stop: Receiver<()>, mut sink: F) -> Result<(), TunerError>
    where
        F: FnMut(SessionEvent),
    {
        let ticker = crossbeam_channel::tick(cadence);
        loop {
            crossbeam_channel::select! {
                recv(ticker) -> _ => match self.tick() {
                    Ok(Some(event)) => sink(event),
                    Ok(None) => {}
                    Err(e) => {
                        self.source.close();
                        return Err(e);
                    }
                },
                recv(stop) -> _ => {
                    log::info!("session stopped");
                    self.source.close();
                    return Ok(());
                }
            }
        }
    }

    /// Closes the underlying source. Idempotent, like the sources
    /// themselves; [`Session::run`] already closes on every exit path.
    pub fn close(&mut self) {
        self.source.close();
    }
}
