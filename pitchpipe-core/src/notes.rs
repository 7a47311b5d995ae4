//! # Note Mapping Module
//!
//! This module maps detected frequencies onto the chromatic scale in
//! equal temperament. It owns the gates that decide whether a spectral
//! peak counts as a playable note at all: the usable frequency band,
//! the amplitude floor, and the snap distance to the nearest note.
//!
//! ## Features
//! - Chromatic scale table spanning A1 to G#6 (55 Hz to ~1661 Hz)
//! - Equal temperament frequency calculations around a movable reference
//! - Band, amplitude and snap gating for raw spectral peaks
//! - Scientific pitch octave numbering (the reference A is A4)

use once_cell::sync::Lazy;

use crate::config::TunerConfig;

/// The twelve chromatic labels, starting from the reference note A.
pub const NOTE_NAMES: [&str; 12] = [
    "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
];

/// Lowest searched offset from the reference A, in semitones (A1).
const SEMITONE_MIN: i32 = -36;
/// Highest searched offset from the reference A, in semitones (G#6).
const SEMITONE_MAX: i32 = 23;

/// One entry of the chromatic scale, independent of the reference pitch.
#[derive(Debug, Clone, Copy)]
struct ScaleEntry {
    /// Signed semitone offset from the reference A.
    semitone: i32,
    name: &'static str,
    octave: i32,
}

/// Statically computed chromatic scale covering the searchable band.
///
/// Names and octaves do not depend on the reference pitch, so the table
/// is built once; frequencies are derived per lookup from the configured
/// reference. The span comfortably encloses the usable frequency band,
/// which keeps the nearest entry away from the table edges.
static SCALE: Lazy<Vec<ScaleEntry>> = Lazy::new(|| {
    (SEMITONE_MIN..=SEMITONE_MAX)
        .map(|semitone| ScaleEntry {
            semitone,
            // The name cycles every 12 semitones.
            name: NOTE_NAMES[semitone.rem_euclid(12) as usize],
            // The octave number changes at C, three semitones above A.
            octave: 4 + (semitone + 9).div_euclid(12),
        })
        .collect()
});

/// The note the mapper snapped an input frequency to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteMatch {
    /// Chromatic label, e.g. "A#".
    pub name: &'static str,
    /// Octave in scientific pitch notation.
    pub octave: i32,
    /// Equal-tempered frequency of the matched note in Hz.
    pub frequency: f32,
    /// Offset from the reference A; the evaluator walks this to find the
    /// neighboring semitone.
    pub(crate) semitone: i32,
}

/// Equal temperament frequency for a semitone offset from the reference A.
///
/// The formula is f = f0 * 2^(n/12), with f0 the reference pitch and n
/// the signed number of semitones away from it.
///
/// # Arguments
/// * `reference_pitch` - Frequency of the reference A in Hz
/// * `semitone` - Signed semitone offset (0 is the reference A itself)
pub fn note_frequency(reference_pitch: f32, semitone: i32) -> f32 {
    reference_pitch * 2.0_f32.powf(semitone as f32 / 12.0)
}

/// Maps a detected spectral peak to the nearest chromatic note, if any.
///
/// Gates run first: frequencies at or outside the usable band and peaks
/// quieter than the amplitude floor never match, whatever note they sit
/// near. The scale is scanned in ascending order; distance shrinks while
/// approaching the nearest note and grows past it, so the scan stops at
/// the first increase.
///
/// # Arguments
/// * `frequency` - Detected peak frequency in Hz
/// * `amplitude` - Length-scaled magnitude of that peak
/// * `config` - Band, floor and snap settings
///
/// # Returns
/// * The matched note, or `None` when every gate or the snap distance
///   rejects the input
pub fn nearest_note(frequency: f32, amplitude: f32, config: &TunerConfig) -> Option<NoteMatch> {
    if frequency <= config.min_frequency_hz || frequency >= config.max_frequency_hz {
        return None;
    }
    if amplitude < config.amplitude_threshold {
        return None;
    }

    let mut best: Option<(ScaleEntry, f32, f32)> = None;
    for entry in SCALE.iter() {
        let candidate = note_frequency(config.reference_pitch, entry.semitone);
        let distance = (frequency - candidate).abs();
        match best {
            None => best = Some((*entry, candidate, distance)),
            Some((_, _, best_distance)) if distance < best_distance => {
                best = Some((*entry, candidate, distance));
            }
            // Ties keep the lower note; a growing distance means the
            // nearest entry is already behind us.
            Some((_, _, best_distance)) if distance > best_distance => break,
            Some(_) => {}
        }
    }

    let (entry, target, distance) = best?;
    if distance < config.snap_threshold_hz {
        Some(NoteMatch {
            name: entry.name,
            octave: entry.octave,
            frequency: target,
            semitone: entry.semitone,
        })
    } else {
        None
    }
}
