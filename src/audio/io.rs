//! WAV file I/O
//!
//! Test utterances and degraded outputs move between runs as mono WAV
//! files. Import converts integer and float encodings to f32; export
//! writes 16-bit PCM at the buffer's own sample rate.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::audio::AudioBuffer;
use crate::error::{CarebenchError, Result};

/// Import a mono WAV file
///
/// # Errors
/// * `FileNotFound` - the path does not exist
/// * `InvalidAudio` - the file is not readable as WAV or has an
///   unsupported bit depth
/// * `UnsupportedFormat`-style rejection of multi-channel audio via
///   `InvalidAudio` (the pipeline is mono only)
pub fn import_wav(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(CarebenchError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut reader = WavReader::open(path).map_err(|e| CarebenchError::InvalidAudio {
        reason: format!("failed to open WAV file: {}", e),
    })?;

    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(CarebenchError::InvalidAudio {
            reason: format!("{}-channel audio (pipeline is mono only)", spec.channels),
        });
    }

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| CarebenchError::InvalidAudio {
                reason: format!("failed to read samples: {}", e),
            })?,
        (SampleFormat::Int, bits @ (16 | 24 | 32)) => {
            let max = (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| CarebenchError::InvalidAudio {
                    reason: format!("failed to read samples: {}", e),
                })?
        }
        (format, bits) => {
            return Err(CarebenchError::InvalidAudio {
                reason: format!("unsupported encoding: {:?} {} bit", format, bits),
            })
        }
    };

    AudioBuffer::from_samples(samples, spec.sample_rate)
}

/// Export a buffer as a 16-bit PCM mono WAV file
pub fn export_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| CarebenchError::InvalidAudio {
        reason: format!("failed to create WAV file: {}", e),
    })?;

    for &sample in buffer.samples() {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(value)
            .map_err(|e| CarebenchError::InvalidAudio {
                reason: format!("failed to write sample: {}", e),
            })?;
    }

    writer.finalize().map_err(|e| CarebenchError::InvalidAudio {
        reason: format!("failed to finalize WAV file: {}", e),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let original = AudioBuffer::sine_wave(440.0, 0.5, 0.5, 16000);
        export_wav(&original, &path).unwrap();

        let restored = import_wav(&path).unwrap();
        assert_eq!(restored.sample_rate(), 16000);
        assert_eq!(restored.num_samples(), original.num_samples());

        // 16-bit quantization bounds the round-trip error
        for (a, b) in original.samples().iter().zip(restored.samples()) {
            assert!((a - b).abs() < 1.0 / 16384.0);
        }
    }

    #[test]
    fn test_import_missing_file() {
        let result = import_wav(Path::new("/nonexistent/missing.wav"));
        assert!(matches!(result, Err(CarebenchError::FileNotFound { .. })));
    }
}
