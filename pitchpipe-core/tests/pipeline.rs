//! End-to-end runs of the capture-to-evaluation pipeline over known
//! signals, through the same public API a front end would use.

use pitchpipe_core::TunerError;
use pitchpipe_core::audio::MemorySource;
use pitchpipe_core::config::TunerConfig;
use pitchpipe_core::session::{Session, SessionEvent};
use pitchpipe_core::tuning::TuneDirection;
use pitchpipe_core::wav;

const RATE: u32 = 44_100;
/// One-second chunks give 1 Hz frequency resolution.
const CHUNK: usize = 44_100;

fn sine(frequency: f32, seconds: usize) -> Vec<f32> {
    (0..RATE as usize * seconds)
        .map(|i| {
            let t = i as f32 / RATE as f32;
            0.2 * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

fn expect_tuning(event: Option<SessionEvent>) -> (pitchpipe_core::tuning::TuningResult, bool) {
    match event {
        Some(SessionEvent::Tuning {
            result,
            newly_in_tune,
        }) => (result, newly_in_tune),
        other => panic!("expected a tuning event, got {other:?}"),
    }
}

#[test]
fn a_steady_reference_tone_reads_in_tune() {
    let source = MemorySource::new(RATE, CHUNK, sine(440.0, 3));
    let mut session = Session::new(source, TunerConfig::default());

    let (first, fresh) = expect_tuning(session.tick().unwrap());
    assert_eq!(first.note, Some("A"));
    assert_eq!(first.octave, Some(4));
    assert_eq!(first.direction, TuneDirection::InTune);
    assert_eq!(first.frequency_hz, 440.0);
    assert!(fresh);

    // The same tone again is in tune but no longer newly so.
    let (_, repeat) = expect_tuning(session.tick().unwrap());
    assert!(!repeat);
    let (_, third) = expect_tuning(session.tick().unwrap());
    assert!(!third);

    // Three seconds of input make exactly three frames.
    assert!(matches!(session.tick(), Err(TunerError::EndOfStream)));
}

#[test]
fn a_sharp_tone_reports_direction_and_severity() {
    let mut samples = sine(440.0, 1);
    samples.extend(sine(450.0, 1));
    let source = MemorySource::new(RATE, CHUNK, samples);
    let mut session = Session::new(source, TunerConfig::default());

    let (reference, _) = expect_tuning(session.tick().unwrap());
    assert_eq!(reference.direction, TuneDirection::InTune);

    // 10 Hz sharp of A4 sits in the second severity band.
    let (sharp, announced) = expect_tuning(session.tick().unwrap());
    assert_eq!(sharp.note, Some("A"));
    assert_eq!(sharp.direction, TuneDirection::Sharp);
    assert_eq!(sharp.level, Some(2));
    assert_eq!(sharp.deviation_hz, 10.0);
    assert!(!announced);
}

#[test]
fn quiet_input_clears_the_display_once() {
    let mut samples = sine(440.0, 1);
    samples.extend(std::iter::repeat(0.0).take(CHUNK * 3));
    let source = MemorySource::new(RATE, CHUNK, samples);
    let mut session = Session::new(source, TunerConfig::default());

    assert!(matches!(
        session.tick().unwrap(),
        Some(SessionEvent::Tuning { .. })
    ));
    assert!(session.tick().unwrap().is_none());
    assert!(session.tick().unwrap().is_none());
    assert!(matches!(
        session.tick().unwrap(),
        Some(SessionEvent::Silence)
    ));
}

#[test]
fn a_decoded_wav_file_drives_the_same_pipeline() {
    let path = std::env::temp_dir().join(format!(
        "pitchpipe_pipeline_{}.wav",
        std::process::id()
    ));
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    // One second of E4, slightly flat of the 330 Hz bin it lands in.
    for sample in sine(329.63, 1) {
        writer.write_sample((sample * 32767.0) as i16).unwrap();
    }
    writer.finalize().unwrap();

    let decoded = wav::read_wav(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(decoded.sample_rate, RATE);

    let source = decoded.into_source(0, CHUNK).unwrap();
    let mut session = Session::new(source, TunerConfig::default());

    let (result, fresh) = expect_tuning(session.tick().unwrap());
    // The loudest bin is 330 Hz, 0.37 Hz off E4's 329.63 Hz, within
    // the in-tune tolerance.
    assert_eq!(result.note, Some("E"));
    assert_eq!(result.octave, Some(4));
    assert_eq!(result.direction, TuneDirection::InTune);
    assert!(fresh);

    assert!(matches!(session.tick(), Err(TunerError::EndOfStream)));
}
