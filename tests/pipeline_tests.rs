//! Integration tests for the acoustic degradation pipeline
//!
//! End-to-end coverage of the reference test case: a spoken-utterance
//! stand-in degraded by background noise and room acoustics.

use approx::assert_relative_eq;

use carebench::acoustics::{
    AcousticScenario, DegradationPipeline, MicDistance, NoiseInjector, RoomSimulator,
};
use carebench::audio::AudioBuffer;
use carebench::CarebenchError;

/// The reference utterance: 5 seconds of a 440 Hz sine at amplitude 0.5
fn reference_signal() -> AudioBuffer {
    AudioBuffer::sine_wave(440.0, 0.5, 5.0, 16000)
}

#[test]
fn test_reference_degradation_chain() {
    let signal = reference_signal();

    let mut injector = NoiseInjector::with_seed(16000, 1);
    let noisy = injector.add_noise(&signal, 15.0).unwrap();
    assert_eq!(noisy.num_samples(), signal.num_samples());

    let room = RoomSimulator::new();
    let degraded = room.simulate_at(&noisy, 1.0).unwrap();

    // Peak lands exactly on the working level; the tail extends the buffer
    assert_relative_eq!(degraded.peak(), 0.8, epsilon = 1e-4);
    assert!(degraded.num_samples() >= signal.num_samples());
    assert!(degraded.is_valid());

    // Noise and reverberation both alter the waveform
    let same = signal
        .samples()
        .iter()
        .zip(degraded.samples())
        .all(|(a, b)| (a - b).abs() < 1e-6);
    assert!(!same);
}

#[test]
fn test_near_and_far_differ() {
    let signal = reference_signal();
    let room = RoomSimulator::new();

    let near = room.simulate(&signal, MicDistance::Near).unwrap();
    let far = room.simulate(&signal, MicDistance::Far).unwrap();

    // Same working peak on both placements
    assert_relative_eq!(near.peak(), 0.8, epsilon = 1e-4);
    assert_relative_eq!(far.peak(), 0.8, epsilon = 1e-4);

    // The entrance microphone hears a measurably different signal
    let common = near.num_samples().min(far.num_samples());
    let max_diff = near.samples()[..common]
        .iter()
        .zip(&far.samples()[..common])
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f32, f32::max);
    assert!(max_diff > 0.01, "placements too similar: {}", max_diff);
}

#[test]
fn test_unsupported_distance_rejected() {
    let signal = reference_signal();
    let room = RoomSimulator::new();

    for meters in [0.5, 2.0, 5.0] {
        let result = room.simulate_at(&signal, meters);
        assert!(matches!(
            result,
            Err(CarebenchError::UnsupportedDistance { .. })
        ));
    }
}

#[test]
fn test_pipeline_seeded_reproducibility() {
    let signal = AudioBuffer::speech_like(2.0, 16000);
    let scenario = AcousticScenario::new(MicDistance::Far, 10.0);

    let mut first = DegradationPipeline::with_seed(16000, 77);
    let mut second = DegradationPipeline::with_seed(16000, 77);

    let out_first = first.degrade(&signal, &scenario).unwrap();
    let out_second = second.degrade(&signal, &scenario).unwrap();

    assert_eq!(out_first.samples(), out_second.samples());
}

#[test]
fn test_pipeline_rejects_silence() {
    let silence = AudioBuffer::silence(1.0, 16000);
    let scenario = AcousticScenario::new(MicDistance::Near, 15.0);

    let mut pipeline = DegradationPipeline::with_seed(16000, 3);
    let result = pipeline.degrade(&silence, &scenario);
    assert!(matches!(
        result,
        Err(CarebenchError::DegenerateSignal { .. })
    ));
}

#[test]
fn test_noise_ceiling_holds_across_snr_range() {
    let signal = AudioBuffer::speech_like(1.0, 16000);
    let mut injector = NoiseInjector::with_seed(16000, 21);

    for snr_db in [-5.0, 0.0, 5.0, 10.0, 20.0, 40.0] {
        let noisy = injector.add_noise(&signal, snr_db).unwrap();
        assert!(
            noisy.peak() <= 0.95 + 1e-4,
            "peak {} exceeds ceiling at {} dB",
            noisy.peak(),
            snr_db
        );
    }
}

#[test]
fn test_simulate_preserves_silence() {
    let silence = AudioBuffer::silence(1.0, 16000);
    let room = RoomSimulator::new();

    let out = room.simulate(&silence, MicDistance::Far).unwrap();
    assert_eq!(out.num_samples(), silence.num_samples());
    assert!(out.is_silent());
}
