//! Acoustic degradation pipeline
//!
//! Two independent engines compose the core of the test bench:
//! - [`NoiseInjector`] mixes pink noise at a target SNR
//! - [`RoomSimulator`] applies image-source room reverberation
//!
//! [`DegradationPipeline`] chains them in the reference order (noise first,
//! then room propagation) to turn a clean utterance into what the
//! companion's microphone would actually pick up.

mod noise;
mod room;

pub use noise::NoiseInjector;
pub use room::{MicDistance, RoomGeometry, RoomSimulator, SurfaceMaterials, SPEED_OF_SOUND};

use log::debug;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;
use crate::error::Result;

/// Above this work estimate, convolution switches to the FFT path
const DIRECT_CONVOLUTION_LIMIT: usize = 1 << 20;

/// Acoustic conditions for one test case
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AcousticScenario {
    /// Microphone placement
    pub distance: MicDistance,
    /// Target signal-to-noise ratio in dB
    pub snr_db: f32,
}

impl AcousticScenario {
    pub fn new(distance: MicDistance, snr_db: f32) -> Self {
        Self { distance, snr_db }
    }

    /// Resolve a distance in meters, rejecting unsupported values
    pub fn from_meters(meters: f32, snr_db: f32) -> Result<Self> {
        Ok(Self {
            distance: MicDistance::from_meters(meters)?,
            snr_db,
        })
    }

    /// Short identifier for reports and baseline names, e.g. `1m_15db`
    pub fn label(&self) -> String {
        format!("{:.0}m_{:.0}db", self.distance.meters(), self.snr_db)
    }
}

/// The full degradation chain: noise injection, then room acoustics
#[derive(Debug)]
pub struct DegradationPipeline {
    injector: NoiseInjector,
    room: RoomSimulator,
}

impl DegradationPipeline {
    /// Pipeline for the reference private room
    pub fn new(sample_rate: u32) -> Self {
        Self {
            injector: NoiseInjector::new(sample_rate),
            room: RoomSimulator::new(),
        }
    }

    /// Pipeline with seeded noise, for deterministic fixtures
    pub fn with_seed(sample_rate: u32, seed: u64) -> Self {
        Self {
            injector: NoiseInjector::with_seed(sample_rate, seed),
            room: RoomSimulator::new(),
        }
    }

    /// Pipeline from explicitly configured engines
    pub fn with_components(injector: NoiseInjector, room: RoomSimulator) -> Self {
        Self { injector, room }
    }

    /// Configured sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.injector.sample_rate()
    }

    /// Degrade a clean utterance under the given acoustic conditions
    pub fn degrade(
        &mut self,
        clean: &AudioBuffer,
        scenario: &AcousticScenario,
    ) -> Result<AudioBuffer> {
        debug!(
            "degrading {} samples under {}",
            clean.num_samples(),
            scenario.label()
        );
        let noisy = self.injector.add_noise(clean, scenario.snr_db)?;
        self.room.simulate(&noisy, scenario.distance)
    }
}

/// Linear convolution of a signal with a filter kernel
///
/// Output length is `signal + kernel - 1`. Small problems run the direct
/// sum; larger ones go through zero-padded FFTs.
pub fn convolve(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }

    if signal.len().saturating_mul(kernel.len()) <= DIRECT_CONVOLUTION_LIMIT {
        convolve_direct(signal, kernel)
    } else {
        convolve_fft(signal, kernel)
    }
}

fn convolve_direct(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    let out_len = signal.len() + kernel.len() - 1;
    let mut output = vec![0.0f32; out_len];

    for (i, &s) in signal.iter().enumerate() {
        if s == 0.0 {
            continue;
        }
        for (j, &k) in kernel.iter().enumerate() {
            output[i + j] += s * k;
        }
    }

    output
}

fn convolve_fft(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    let out_len = signal.len() + kernel.len() - 1;
    let fft_len = out_len.next_power_of_two();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(fft_len);
    let ifft = planner.plan_fft_inverse(fft_len);

    let mut a: Vec<Complex<f32>> = signal
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(fft_len)
        .collect();
    let mut b: Vec<Complex<f32>> = kernel
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(fft_len)
        .collect();

    fft.process(&mut a);
    fft.process(&mut b);
    for (x, y) in a.iter_mut().zip(&b) {
        *x *= *y;
    }
    ifft.process(&mut a);

    // rustfft leaves transforms unnormalized
    let scale = 1.0 / fft_len as f32;
    a[..out_len].iter().map(|c| c.re * scale).collect()
}
