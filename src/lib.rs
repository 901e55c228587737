//! Carebench - Acoustic Degradation Test Bench
//!
//! Carebench validates the safety-critical conversational behavior of a
//! voice-interactive care companion under realistic acoustic conditions.
//! It degrades spoken test utterances with a room-acoustics model and
//! calibrated background noise, feeds the result to the companion agent,
//! and checks the textual response against safety and latency criteria.
//!
//! # Architecture
//!
//! The degradation pipeline is the core:
//! - Noise injection: pink-noise mixing at a caller-specified SNR
//! - Room acoustics: image-source simulation of a private room, microphone
//!   at a near (1 m) or far (3 m) position
//!
//! Everything else (scenario scripts, validators, regression baselines,
//! the agent client) consumes or produces the pipeline's buffers.

pub mod acoustics;
pub mod agent;
pub mod audio;
pub mod cli;
pub mod error;
pub mod harness;
pub mod regression;
pub mod scenario;
pub mod validate;

pub use error::{CarebenchError, Result};
