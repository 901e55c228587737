//! Audio buffer type for the degradation pipeline

use crate::audio::linear_to_db;
use crate::error::{CarebenchError, Result};

/// Mono audio buffer
///
/// Samples are 32-bit floats, amplitude nominally in [-1, 1]. The buffer
/// carries its own sample rate; engines reject buffers whose rate differs
/// from their configuration rather than resampling.
#[derive(Clone, Debug)]
pub struct AudioBuffer {
    /// Sample data
    samples: Vec<f32>,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a buffer from existing samples
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(CarebenchError::EmptyAudio);
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a silent buffer with the given duration
    pub fn silence(duration_secs: f32, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        Self {
            samples: vec![0.0; num_samples.max(1)],
            sample_rate,
        }
    }

    /// Create a sine wave test tone
    pub fn sine_wave(frequency: f32, amplitude: f32, duration_secs: f32, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        let mut samples = Vec::with_capacity(num_samples);

        for i in 0..num_samples {
            let t = i as f32 / sample_rate as f32;
            samples.push(amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin());
        }

        Self {
            samples,
            sample_rate,
        }
    }

    /// Create a speech-like test signal
    ///
    /// Three harmonics (200/400/800 Hz at 0.3/0.2/0.1) under a 2 Hz
    /// amplitude-modulation envelope approximate the rhythm of speech,
    /// normalized to peak 0.8. A stand-in for recorded utterances when no
    /// TTS output is available.
    pub fn speech_like(duration_secs: f32, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        let mut samples = Vec::with_capacity(num_samples);

        for i in 0..num_samples {
            let t = i as f32 / sample_rate as f32;
            let tone = 0.3 * (2.0 * std::f32::consts::PI * 200.0 * t).sin()
                + 0.2 * (2.0 * std::f32::consts::PI * 400.0 * t).sin()
                + 0.1 * (2.0 * std::f32::consts::PI * 800.0 * t).sin();
            let envelope = (2.0 * std::f32::consts::PI * 2.0 * t).sin().abs();
            samples.push(tone * envelope);
        }

        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        if peak > 0.0 {
            let scale = 0.8 / peak;
            for s in &mut samples {
                *s *= scale;
            }
        }

        Self {
            samples,
            sample_rate,
        }
    }

    /// Get a reference to the samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Get a mutable reference to the samples
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Consume the buffer and return its samples
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Peak absolute amplitude
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
    }

    /// Peak level in dBFS
    pub fn peak_db(&self) -> f32 {
        linear_to_db(self.peak())
    }

    /// Mean squared power
    pub fn power(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        sum_sq / self.samples.len() as f64
    }

    /// RMS level in dB
    pub fn rms_db(&self) -> f32 {
        linear_to_db(self.power().sqrt() as f32)
    }

    /// Check that the buffer contains no NaN or infinite samples
    pub fn is_valid(&self) -> bool {
        self.samples.iter().all(|s| s.is_finite())
    }

    /// Check whether every sample is exactly zero
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }
}
