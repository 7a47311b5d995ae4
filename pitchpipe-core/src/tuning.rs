//! # Tuning Evaluation Module
//!
//! This module turns a matched note into presentation-ready tuning
//! guidance: which way the pitch leans, how severe the lean is on a
//! 0-3 scale, and the raw deviation in Hz.
//!
//! ## Features
//! - In-tune detection with an absolute half-Hz tolerance
//! - Sharp/flat direction from the signed deviation
//! - Severity levels scaled to the distance toward the neighboring
//!   semitone, so a 5 Hz error counts for more at the bottom of the
//!   scale than at the top

use serde::Serialize;

use crate::notes::{self, NoteMatch};

/// Deviation magnitude, in Hz, still reported as in tune.
const IN_TUNE_TOLERANCE_HZ: f32 = 0.5;

/// Which way the player needs to correct, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TuneDirection {
    InTune,
    Sharp,
    Flat,
    /// No confident match this tick.
    None,
}

/// Everything the presentation layer needs to draw one tick.
///
/// Serializes with kebab-case directions and `null` for absent fields,
/// so front ends in any language can consume an event stream directly.
#[derive(Debug, Clone, Serialize)]
pub struct TuningResult {
    /// Chromatic label of the matched note, absent on silence.
    pub note: Option<&'static str>,
    /// Octave of the matched note, absent on silence.
    pub octave: Option<i32>,
    /// The loudest input frequency this tick, in Hz.
    pub frequency_hz: f32,
    pub direction: TuneDirection,
    /// Severity 0 (barely off) to 3 (nearly the next semitone); absent
    /// when in tune.
    pub level: Option<u8>,
    /// Absolute distance between input and matched note, in Hz.
    pub deviation_hz: f32,
}

impl TuningResult {
    /// The row emitted when nothing matched; every field a front end
    /// keys on is absent.
    pub fn silence() -> Self {
        Self {
            note: None,
            octave: None,
            frequency_hz: 0.0,
            direction: TuneDirection::None,
            level: None,
            deviation_hz: 0.0,
        }
    }
}

/// Evaluates how far an input frequency sits from its matched note.
///
/// Within the half-Hz tolerance the result is in tune and carries no
/// level. Outside it, the severity is bucketed against half the distance
/// to the neighboring semitone in the direction of the error, so the
/// scale adapts to how far apart notes actually are at that pitch.
///
/// # Arguments
/// * `input_frequency` - Detected frequency in Hz
/// * `matched` - The note the mapper snapped it to
/// * `reference_pitch` - Reference A frequency the scale is built on
pub fn evaluate(input_frequency: f32, matched: &NoteMatch, reference_pitch: f32) -> TuningResult {
    let offset = input_frequency - matched.frequency;

    if offset.abs() <= IN_TUNE_TOLERANCE_HZ {
        return TuningResult {
            note: Some(matched.name),
            octave: Some(matched.octave),
            frequency_hz: input_frequency,
            direction: TuneDirection::InTune,
            level: None,
            deviation_hz: offset.abs(),
        };
    }

    let (direction, step) = if offset > 0.0 {
        (TuneDirection::Sharp, 1)
    } else {
        (TuneDirection::Flat, -1)
    };
    // Half the gap to the next semitone in the direction of the error.
    // Semitone gaps widen with pitch, so sharp and flat use different
    // scales around the same note.
    let neighbor = notes::note_frequency(reference_pitch, matched.semitone + step);
    let half_step = (matched.frequency - neighbor).abs() / 2.0;

    TuningResult {
        note: Some(matched.name),
        octave: Some(matched.octave),
        frequency_hz: input_frequency,
        direction,
        level: tune_level(offset.abs(), half_step),
        deviation_hz: offset.abs(),
    }
}

/// Buckets an absolute deviation against half the distance to the
/// neighboring semitone.
///
/// The top three buckets are fractions of the half step; the lowest is
/// an absolute half-Hz floor instead. Deviations under the floor report
/// no level at all, which `evaluate` never produces because its in-tune
/// gate absorbs them first.
pub fn tune_level(deviation: f32, half_step: f32) -> Option<u8> {
    if deviation > 0.8 * half_step {
        Some(3)
    } else if deviation > 0.6 * half_step {
        Some(2)
    } else if deviation > 0.3 * half_step {
        Some(1)
    } else if deviation > IN_TUNE_TOLERANCE_HZ {
        Some(0)
    } else {
        None
    }
}
