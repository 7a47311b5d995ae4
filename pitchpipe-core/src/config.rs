//! Tuning and gating parameters consumed by the analysis pipeline.

use serde::{Deserialize, Serialize};

/// Knobs for the note mapper and tuning evaluator.
///
/// The core never touches disk for these; the embedding application
/// supplies them, and the serde derives let it round-trip a settings
/// file with missing fields filled from the defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Frequency of the reference A above middle C, in Hz.
    pub reference_pitch: f32,
    /// Minimum spectral peak magnitude accepted as signal rather than
    /// noise. Calibrated against the analyzer's length-scaled magnitudes
    /// for a one-second chunk of f32 samples in [-1, 1].
    pub amplitude_threshold: f32,
    /// Lower edge of the usable fundamental band, exclusive.
    pub min_frequency_hz: f32,
    /// Upper edge of the usable fundamental band, exclusive.
    pub max_frequency_hz: f32,
    /// How far a frequency may sit from the nearest note and still match.
    pub snap_threshold_hz: f32,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            reference_pitch: 440.0,
            amplitude_threshold: 1.0e7,
            min_frequency_hz: 80.0,
            max_frequency_hz: 1000.0,
            snap_threshold_hz: 15.0,
        }
    }
}
