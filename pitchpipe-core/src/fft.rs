//! # Spectral Analysis Module
//!
//! This module turns one captured frame into a one-sided magnitude
//! spectrum and picks out its loudest component. The analysis is
//! deliberately plain: no windowing, no DC removal, no interpolation
//! between bins. Frequency resolution is whatever the frame length
//! affords (1 Hz for a one-second chunk at 44.1 kHz).
//!
//! ## Features
//! - Forward FFT using RustFFT, planned per call for arbitrary lengths
//! - Length-scaled magnitudes (N * |X_k|) the amplitude gate is
//!   calibrated against
//! - Loudest-bin extraction with ties broken toward the lower bin

use rustfft::{num_complex::Complex, FftPlanner};

use crate::audio::AudioFrame;

/// One-sided magnitude spectrum of a single frame.
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Frequency spacing between adjacent bins, in Hz.
    pub resolution_hz: f32,
    /// Length-scaled magnitude per bin, DC first.
    pub magnitudes: Vec<f32>,
}

impl Spectrum {
    /// (frequency, magnitude) pairs, for plotting.
    pub fn bins(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.magnitudes
            .iter()
            .enumerate()
            .map(|(k, &magnitude)| (k as f32 * self.resolution_hz, magnitude))
    }
}

/// The loudest spectral component of a frame.
#[derive(Debug, Clone, Copy)]
pub struct PitchEstimate {
    /// Center frequency of the loudest bin, in Hz.
    pub frequency: f32,
    /// Length-scaled magnitude of that bin.
    pub amplitude: f32,
}

/// Analyzes the leading samples of a frame.
///
/// The bin at 0 Hz takes part in the peak search like any other, so a
/// strongly biased signal can legitimately report DC as its loudest
/// component; the note mapper's band gate rejects it downstream.
///
/// # Arguments
/// * `frame` - Captured audio frame
/// * `sample_count` - How many leading samples to transform; `None`
///   uses the whole frame, larger requests are clamped to it
///
/// # Returns
/// * The loudest component and the full one-sided spectrum
pub fn analyze(frame: &AudioFrame, sample_count: Option<usize>) -> (PitchEstimate, Spectrum) {
    let requested = sample_count.unwrap_or(frame.samples.len());
    let n = requested.min(frame.samples.len());
    if n < requested {
        log::warn!(
            "sample count {requested} exceeds frame length {}; clamping",
            frame.samples.len()
        );
    }
    if n == 0 {
        return (
            PitchEstimate {
                frequency: 0.0,
                amplitude: 0.0,
            },
            Spectrum {
                resolution_hz: 0.0,
                magnitudes: Vec::new(),
            },
        );
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);

    let mut buffer: Vec<Complex<f32>> = frame.samples[..n]
        .iter()
        .map(|&sample| Complex {
            re: sample,
            im: 0.0,
        })
        .collect();
    fft.process(&mut buffer);

    // Only the first half carries distinct information for real input.
    let scale = n as f32;
    let magnitudes: Vec<f32> = buffer[..n / 2]
        .iter()
        .map(|c| scale * c.norm()) // .norm() is sqrt(re^2 + im^2)
        .collect();

    let mut peak_bin = 0;
    let mut peak_magnitude = 0.0_f32;
    for (k, &magnitude) in magnitudes.iter().enumerate() {
        if magnitude > peak_magnitude {
            peak_bin = k;
            peak_magnitude = magnitude;
        }
    }

    let resolution_hz = frame.sample_rate as f32 / n as f32;
    (
        PitchEstimate {
            frequency: peak_bin as f32 * resolution_hz,
            amplitude: peak_magnitude,
        },
        Spectrum {
            resolution_hz,
            magnitudes,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_frame(sample_rate: u32, frequency: f32, amplitude: f32, count: usize) -> AudioFrame {
        let samples = (0..count)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect();
        AudioFrame {
            sample_rate,
            samples,
        }
    }

    #[test]
    fn bin_aligned_sine_lands_on_its_exact_frequency() {
        // 4410 samples at 44.1 kHz gives 10 Hz bins; 440 Hz sits on bin 44.
        let frame = sine_frame(44_100, 440.0, 0.5, 4410);
        let (estimate, spectrum) = analyze(&frame, None);
        assert_eq!(estimate.frequency, 440.0);
        assert_eq!(spectrum.resolution_hz, 10.0);
        // Length-scaled magnitude of a clean sine is N * (A * N / 2).
        let expected = 4410.0 * 0.5 * 2205.0;
        assert!((estimate.amplitude - expected).abs() < expected * 0.01);
    }

    #[test]
    fn off_bin_sine_stays_within_one_bin_width() {
        let frame = sine_frame(44_100, 263.0, 0.5, 4410);
        let (estimate, _) = analyze(&frame, None);
        assert!((estimate.frequency - 263.0).abs() <= 10.0);
    }

    #[test]
    fn dc_biased_input_reports_zero_hz() {
        let frame = AudioFrame {
            sample_rate: 44_100,
            samples: vec![0.25; 4410],
        };
        let (estimate, _) = analyze(&frame, None);
        assert_eq!(estimate.frequency, 0.0);
        assert!(estimate.amplitude > 0.0);
    }

    #[test]
    fn silent_input_reports_dc_at_zero_amplitude() {
        let frame = AudioFrame {
            sample_rate: 44_100,
            samples: vec![0.0; 4410],
        };
        let (estimate, spectrum) = analyze(&frame, None);
        assert_eq!(estimate.frequency, 0.0);
        assert_eq!(estimate.amplitude, 0.0);
        assert_eq!(spectrum.magnitudes.len(), 2205);
    }

    #[test]
    fn empty_frames_yield_an_empty_spectrum() {
        let frame = AudioFrame {
            sample_rate: 44_100,
            samples: Vec::new(),
        };
        let (estimate, spectrum) = analyze(&frame, None);
        assert_eq!(estimate.amplitude, 0.0);
        assert!(spectrum.magnitudes.is_empty());
    }

    #[test]
    fn sample_count_truncates_the_frame() {
        // Analyzing the first half of a longer capture halves the
        // resolution accordingly.
        let frame = sine_frame(44_100, 440.0, 0.5, 8820);
        let (estimate, spectrum) = analyze(&frame, Some(4410));
        assert_eq!(spectrum.resolution_hz, 10.0);
        assert_eq!(spectrum.magnitudes.len(), 2205);
        assert_eq!(estimate.frequency, 440.0);
    }

    #[test]
    fn oversized_sample_counts_clamp_to_the_frame() {
        let frame = sine_frame(44_100, 440.0, 0.5, 4410);
        let (clamped, clamped_spectrum) = analyze(&frame, Some(frame.samples.len() * 2));
        let (full, full_spectrum) = analyze(&frame, None);
        assert_eq!(clamped_spectrum.resolution_hz, full_spectrum.resolution_hz);
        assert_eq!(clamped_spectrum.magnitudes.len(), full_spectrum.magnitudes.len());
        assert_eq!(clamped.frequency, full.frequency);
        assert_eq!(clamped.amplitude, full.amplitude);
    }

    #[test]
    fn bins_iterate_in_frequency_order() {
        let frame = sine_frame(44_100, 440.0, 0.5, 4410);
        let (_, spectrum) = analyze(&frame, None);
        let bins: Vec<(f32, f32)> = spectrum.bins().collect();
        assert_eq!(bins[0].0, 0.0);
        assert_eq!(bins[44].0, 440.0);
        assert_eq!(bins.len(), spectrum.magnitudes.len());
    }
}
