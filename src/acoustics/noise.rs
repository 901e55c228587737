//! Noise injection engine
//!
//! Adds a pink-noise ambient floor to a clean signal at a caller-specified
//! signal-to-noise ratio. Pink noise approximates the low-frequency bias of
//! indoor ambience (television, hallway activity, ventilation) far better
//! than white noise.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::audio::AudioBuffer;
use crate::error::{CarebenchError, Result};

/// One-pole low-pass coefficient shaping white noise toward 1/f
const PINK_FILTER_POLE: f32 = 0.99;

/// Peak ceiling applied to the mixed output
const CLIP_GUARD_PEAK: f32 = 0.95;

/// Below this mean squared power the SNR scale factor is undefined
const MIN_SIGNAL_POWER: f64 = 1e-12;

/// Pink-noise injector calibrated to a target SNR
///
/// The sample rate is configuration metadata: noise shaping happens in the
/// discrete-sample domain, but buffers at a different rate are rejected
/// because the pipeline performs no resampling.
#[derive(Debug)]
pub struct NoiseInjector {
    sample_rate: u32,
    rng: StdRng,
}

impl NoiseInjector {
    /// Injector with operating-system entropy
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            rng: StdRng::from_entropy(),
        }
    }

    /// Injector with a fixed seed, for deterministic fixtures
    pub fn with_seed(sample_rate: u32, seed: u64) -> Self {
        Self {
            sample_rate,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Configured sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Mix pink noise into the signal at the target SNR
    ///
    /// The scale factor is derived from the realized powers of signal and
    /// noise, so the output's empirical signal-to-noise power ratio equals
    /// `10^(snr_db/10)` up to floating-point error. If mixing pushes the
    /// peak above 0.95 the whole buffer is rescaled to that ceiling;
    /// otherwise amplitude is untouched.
    ///
    /// # Errors
    /// * `SampleRateMismatch` - buffer rate differs from the injector's
    /// * `InvalidParameter` - `snr_db` is not finite
    /// * `DegenerateSignal` - signal power is zero or near zero, leaving
    ///   the scale factor undefined
    pub fn add_noise(&mut self, signal: &AudioBuffer, snr_db: f32) -> Result<AudioBuffer> {
        if signal.sample_rate() != self.sample_rate {
            return Err(CarebenchError::SampleRateMismatch {
                expected: self.sample_rate,
                actual: signal.sample_rate(),
            });
        }
        if !snr_db.is_finite() {
            return Err(CarebenchError::InvalidParameter {
                param: "snr_db".to_string(),
                value: snr_db.to_string(),
                expected: "finite decibel value".to_string(),
            });
        }

        let signal_power = signal.power();
        if signal_power < MIN_SIGNAL_POWER {
            return Err(CarebenchError::DegenerateSignal {
                reason: "zero signal power, SNR scale factor undefined".to_string(),
            });
        }

        let noise = self.pink_noise(signal.num_samples());
        let noise_power: f64 = noise.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>()
            / noise.len() as f64;
        if noise_power < MIN_SIGNAL_POWER {
            return Err(CarebenchError::DegenerateSignal {
                reason: "noise generator produced silence".to_string(),
            });
        }

        let snr_linear = 10.0f64.powf(snr_db as f64 / 10.0);
        let scale = (signal_power / (snr_linear * noise_power)).sqrt() as f32;
        debug!("noise scale {:.6} for target {} dB SNR", scale, snr_db);

        let mut mixed: Vec<f32> = signal
            .samples()
            .iter()
            .zip(&noise)
            .map(|(&s, &n)| s + scale * n)
            .collect();

        let peak = mixed.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        if peak > CLIP_GUARD_PEAK {
            let rescale = CLIP_GUARD_PEAK / peak;
            for s in &mut mixed {
                *s *= rescale;
            }
        }

        AudioBuffer::from_samples(mixed, self.sample_rate)
    }

    /// Generate peak-normalized pink noise
    ///
    /// White Gaussian noise through a one-pole low-pass,
    /// `y[n] = 0.99·y[n-1] + 0.01·w[n]`, then normalized to peak 1.0.
    /// An approximation of true 1/f noise, adequate for indoor ambience.
    fn pink_noise(&mut self, length: usize) -> Vec<f32> {
        let mut pink = Vec::with_capacity(length);
        let mut state = 0.0f32;

        for i in 0..length {
            let white = self.gaussian();
            if i == 0 {
                state = white;
            } else {
                state = PINK_FILTER_POLE * state + (1.0 - PINK_FILTER_POLE) * white;
            }
            pink.push(state);
        }

        let peak = pink.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        if peak > 0.0 {
            for s in &mut pink {
                *s /= peak;
            }
        }

        pink
    }

    /// Standard Gaussian draw via the Box-Muller transform
    fn gaussian(&mut self) -> f32 {
        let u1 = self.rng.gen::<f32>().max(1e-7);
        let u2 = self.rng.gen::<f32>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
    }
}
