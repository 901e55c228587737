//! Room acoustics engine
//!
//! Image-source simulation of a rectangular private room. The engine
//! builds an impulse response from the direct path plus all mirror-image
//! sources up to a bounded reflection order, convolves the input with it,
//! and returns the signal a microphone at the chosen position would
//! receive, renormalized to a fixed working peak.

use log::debug;

use crate::acoustics::convolve;
use crate::audio::AudioBuffer;
use crate::error::{CarebenchError, Result};

/// Speed of sound in air (m/s, 20 °C)
pub const SPEED_OF_SOUND: f32 = 343.0;

/// Maximum reflection order
///
/// First- through third-order reflections dominate perceptual
/// reverberation in a small room; higher orders grow the image count
/// sharply for little audible gain.
const MAX_REFLECTION_ORDER: i32 = 3;

/// Peak absolute amplitude of every non-silent simulation output
const OUTPUT_PEAK: f32 = 0.8;

/// Resident position: seated, center of the room
const SOURCE_POSITION: [f32; 3] = [2.0, 2.5, 0.5];

/// Microphone position for a close private conversation
const NEAR_MIC_POSITION: [f32; 3] = [2.0, 1.5, 1.2];

/// Microphone position at the doorway corner, just inside the room
const FAR_MIC_POSITION: [f32; 3] = [3.8, 4.9, 1.2];

// ============================================================================
// Scenario geometry
// ============================================================================

/// Microphone placement, as a discrete scenario parameter
///
/// The deployment under test defines exactly two positions; any other
/// requested distance is rejected rather than interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MicDistance {
    /// 1 m: companion beside the resident
    Near,
    /// 3 m: companion at the room entrance
    Far,
}

impl MicDistance {
    /// Resolve a requested distance in meters to a supported placement
    pub fn from_meters(meters: f32) -> Result<Self> {
        if (meters - 1.0).abs() < 1e-6 {
            Ok(MicDistance::Near)
        } else if (meters - 3.0).abs() < 1e-6 {
            Ok(MicDistance::Far)
        } else {
            Err(CarebenchError::UnsupportedDistance { requested: meters })
        }
    }

    /// Nominal separation in meters
    pub fn meters(&self) -> f32 {
        match self {
            MicDistance::Near => 1.0,
            MicDistance::Far => 3.0,
        }
    }

    /// Microphone coordinate for this placement
    pub fn mic_position(&self) -> [f32; 3] {
        match self {
            MicDistance::Near => NEAR_MIC_POSITION,
            MicDistance::Far => FAR_MIC_POSITION,
        }
    }
}

/// Rectangular room dimensions in meters
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct RoomGeometry {
    pub width: f32,
    pub length: f32,
    pub height: f32,
}

impl RoomGeometry {
    /// Create a room, rejecting non-positive dimensions
    pub fn new(width: f32, length: f32, height: f32) -> Result<Self> {
        for (name, value) in [("width", width), ("length", length), ("height", height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CarebenchError::InvalidParameter {
                    param: name.to_string(),
                    value: value.to_string(),
                    expected: "positive finite meters".to_string(),
                });
            }
        }
        Ok(Self {
            width,
            length,
            height,
        })
    }

    /// Reference layout: 4 m × 5 m × 3 m private room
    pub fn private_room() -> Self {
        Self {
            width: 4.0,
            length: 5.0,
            height: 3.0,
        }
    }

    /// Check that a point lies strictly inside the enclosure
    pub fn contains(&self, point: [f32; 3]) -> bool {
        point[0] > 0.0
            && point[0] < self.width
            && point[1] > 0.0
            && point[1] < self.length
            && point[2] > 0.0
            && point[2] < self.height
    }
}

/// Absorption coefficient per surface, in [0, 1]
///
/// 0 is fully reflective, 1 fully absorptive. West/east walls bound the
/// x axis, south/north the y axis, floor/ceiling the z axis.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct SurfaceMaterials {
    pub east: f32,
    pub west: f32,
    pub north: f32,
    pub south: f32,
    pub floor: f32,
    pub ceiling: f32,
}

impl SurfaceMaterials {
    /// Create a material set, rejecting coefficients outside [0, 1]
    pub fn new(
        east: f32,
        west: f32,
        north: f32,
        south: f32,
        floor: f32,
        ceiling: f32,
    ) -> Result<Self> {
        for (name, value) in [
            ("east", east),
            ("west", west),
            ("north", north),
            ("south", south),
            ("floor", floor),
            ("ceiling", ceiling),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(CarebenchError::InvalidParameter {
                    param: name.to_string(),
                    value: value.to_string(),
                    expected: "absorption coefficient in [0, 1]".to_string(),
                });
            }
        }
        Ok(Self {
            east,
            west,
            north,
            south,
            floor,
            ceiling,
        })
    }

    /// Reference materials: drywall walls, carpet floor, acoustic-tile
    /// ceiling
    pub fn private_room() -> Self {
        Self {
            east: 0.05,
            west: 0.05,
            north: 0.05,
            south: 0.05,
            floor: 0.30,
            ceiling: 0.70,
        }
    }
}

// ============================================================================
// Simulator
// ============================================================================

/// One mirror-image arrival at the microphone
struct Arrival {
    delay_secs: f32,
    amplitude: f32,
}

/// Image-source room simulator
///
/// Constructed once per room configuration; each `simulate` call is a
/// pure function of the input buffer and placement.
#[derive(Debug, Clone)]
pub struct RoomSimulator {
    geometry: RoomGeometry,
    materials: SurfaceMaterials,
}

impl RoomSimulator {
    /// Simulator for the reference private room
    pub fn new() -> Self {
        Self {
            geometry: RoomGeometry::private_room(),
            materials: SurfaceMaterials::private_room(),
        }
    }

    /// Simulator for an explicit room configuration
    pub fn with_room(geometry: RoomGeometry, materials: SurfaceMaterials) -> Self {
        Self {
            geometry,
            materials,
        }
    }

    /// Room dimensions
    pub fn geometry(&self) -> &RoomGeometry {
        &self.geometry
    }

    /// Surface absorption
    pub fn materials(&self) -> &SurfaceMaterials {
        &self.materials
    }

    /// Simulate the signal received at the microphone placement
    ///
    /// Returns a new buffer at the input's sample rate, extended by the
    /// reverberant tail, with peak renormalized to 0.8. An all-zero input
    /// is returned unchanged.
    pub fn simulate(&self, signal: &AudioBuffer, distance: MicDistance) -> Result<AudioBuffer> {
        if signal.is_silent() {
            return Ok(signal.clone());
        }

        let ir = self.impulse_response(distance.mic_position(), signal.sample_rate())?;
        debug!(
            "room IR: {} taps at {} Hz for {:?} placement",
            ir.len(),
            signal.sample_rate(),
            distance
        );

        let mut received = convolve(signal.samples(), &ir);

        let peak = received.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        if peak > 0.0 {
            let scale = OUTPUT_PEAK / peak;
            for s in &mut received {
                *s *= scale;
            }
        }

        AudioBuffer::from_samples(received, signal.sample_rate())
    }

    /// Simulate at a requested distance in meters
    ///
    /// Any distance outside the supported set fails with
    /// `UnsupportedDistance`.
    pub fn simulate_at(&self, signal: &AudioBuffer, meters: f32) -> Result<AudioBuffer> {
        self.simulate(signal, MicDistance::from_meters(meters)?)
    }

    /// Build the impulse response from source to microphone
    fn impulse_response(&self, mic: [f32; 3], sample_rate: u32) -> Result<Vec<f32>> {
        if !self.geometry.contains(SOURCE_POSITION) {
            return Err(CarebenchError::InvalidParameter {
                param: "source position".to_string(),
                value: format!("{:?}", SOURCE_POSITION),
                expected: "strictly inside the room".to_string(),
            });
        }
        if !self.geometry.contains(mic) {
            return Err(CarebenchError::InvalidParameter {
                param: "microphone position".to_string(),
                value: format!("{:?}", mic),
                expected: "strictly inside the room".to_string(),
            });
        }

        let arrivals = self.image_arrivals(mic);

        let max_delay = arrivals
            .iter()
            .map(|a| a.delay_secs)
            .fold(0.0f32, f32::max);
        let ir_len = (max_delay * sample_rate as f32).ceil() as usize + 2;
        let mut ir = vec![0.0f32; ir_len];

        // Fractional-delay placement by linear interpolation
        for arrival in &arrivals {
            let position = arrival.delay_secs * sample_rate as f32;
            let index = position.floor() as usize;
            let frac = position - index as f32;
            ir[index] += arrival.amplitude * (1.0 - frac);
            if index + 1 < ir.len() {
                ir[index + 1] += arrival.amplitude * frac;
            }
        }

        Ok(ir)
    }

    /// Enumerate image-source arrivals up to the maximum reflection order
    fn image_arrivals(&self, mic: [f32; 3]) -> Vec<Arrival> {
        let dims = [self.geometry.width, self.geometry.length, self.geometry.height];
        // Reflection coefficients (amplitude) per axis: (low wall, high wall)
        let walls = [
            (reflection_coeff(self.materials.west), reflection_coeff(self.materials.east)),
            (reflection_coeff(self.materials.south), reflection_coeff(self.materials.north)),
            (reflection_coeff(self.materials.floor), reflection_coeff(self.materials.ceiling)),
        ];

        let n = MAX_REFLECTION_ORDER;
        let mut arrivals = Vec::new();

        for ix in -n..=n {
            for iy in -n..=n {
                for iz in -n..=n {
                    let order = ix.abs() + iy.abs() + iz.abs();
                    if order > n {
                        continue;
                    }

                    let indices = [ix, iy, iz];
                    let mut amplitude = 1.0f32;
                    let mut dist_sq = 0.0f32;

                    for axis in 0..3 {
                        let image =
                            image_coordinate(SOURCE_POSITION[axis], dims[axis], indices[axis]);
                        let (low_hits, high_hits) = wall_hits(indices[axis]);
                        amplitude *= walls[axis].0.powi(low_hits)
                            * walls[axis].1.powi(high_hits);
                        let d = image - mic[axis];
                        dist_sq += d * d;
                    }

                    // Spherical spreading; source and mic never coincide
                    let distance = dist_sq.sqrt().max(1e-3);
                    arrivals.push(Arrival {
                        delay_secs: distance / SPEED_OF_SOUND,
                        amplitude: amplitude / distance,
                    });
                }
            }
        }

        arrivals
    }
}

impl Default for RoomSimulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Amplitude reflection coefficient for an energy absorption coefficient
#[inline]
fn reflection_coeff(absorption: f32) -> f32 {
    (1.0 - absorption).max(0.0).sqrt()
}

/// Mirror-image coordinate along one axis for reflection index `n`
///
/// Even indices preserve the source coordinate, odd indices mirror it;
/// together they enumerate the image set {2k·L + x, 2k·L − x}.
#[inline]
fn image_coordinate(pos: f32, dim: f32, n: i32) -> f32 {
    if n % 2 == 0 {
        n as f32 * dim + pos
    } else {
        n as f32 * dim + (dim - pos)
    }
}

/// Number of reflections off the low (coordinate 0) and high (coordinate
/// L) walls for reflection index `n`
#[inline]
fn wall_hits(n: i32) -> (i32, i32) {
    if n >= 0 {
        (n / 2, (n + 1) / 2)
    } else {
        ((-n + 1) / 2, -n / 2)
    }
}
