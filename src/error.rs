//! Error handling for Carebench
//!
//! All engine preconditions fail fast with a typed error; corrective
//! numerical paths (renormalization) are silent and never raise.

use thiserror::Error;

/// Result type alias for Carebench operations
pub type Result<T> = std::result::Result<T, CarebenchError>;

/// Main error type for Carebench operations
#[derive(Error, Debug)]
pub enum CarebenchError {
    // Scenario parameter errors
    #[error("Unsupported microphone distance: {requested} m (supported: 1.0 m, 3.0 m)")]
    UnsupportedDistance { requested: f32 },

    #[error("Invalid parameter {param}: got {value}, expected {expected}")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    // Signal errors
    #[error("Degenerate input signal: {reason}")]
    DegenerateSignal { reason: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("Sample rate mismatch: engine configured for {expected} Hz, buffer is {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("Invalid audio: {reason}")]
    InvalidAudio { reason: String },

    // File errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // Agent errors
    #[error("Companion agent unavailable: {reason}")]
    AgentUnavailable { reason: String },

    #[error("Companion agent timed out after {timeout_ms} ms")]
    AgentTimeout { timeout_ms: u64 },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CarebenchError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            CarebenchError::UnsupportedDistance { .. } => "UNSUPPORTED_DISTANCE",
            CarebenchError::InvalidParameter { .. } => "INVALID_PARAMETER",
            CarebenchError::DegenerateSignal { .. } => "DEGENERATE_SIGNAL",
            CarebenchError::EmptyAudio => "EMPTY_AUDIO",
            CarebenchError::SampleRateMismatch { .. } => "SAMPLE_RATE_MISMATCH",
            CarebenchError::InvalidAudio { .. } => "INVALID_AUDIO",
            CarebenchError::FileNotFound { .. } => "FILE_NOT_FOUND",
            CarebenchError::AgentUnavailable { .. } => "AGENT_UNAVAILABLE",
            CarebenchError::AgentTimeout { .. } => "AGENT_TIMEOUT",
            CarebenchError::Io(_) => "IO_ERROR",
            CarebenchError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the caller can recover by choosing different inputs
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CarebenchError::UnsupportedDistance { .. }
                | CarebenchError::InvalidParameter { .. }
                | CarebenchError::DegenerateSignal { .. }
                | CarebenchError::FileNotFound { .. }
                | CarebenchError::AgentUnavailable { .. }
                | CarebenchError::AgentTimeout { .. }
        )
    }
}
