use thiserror::Error;

/// Construction-time error types.
///
/// All validation runs while the radar description is assembled; the
/// synthesis hot path assumes valid inputs and never fails.
#[derive(Error, Debug)]
pub enum RadarError {
    #[error("invalid waveform: {0}")]
    InvalidWaveform(String),

    #[error("invalid antenna pattern: {0}")]
    InvalidPattern(String),

    #[error("invalid phase noise mask: {0}")]
    InvalidMask(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for radar construction
pub type RadarResult<T> = Result<T, RadarError>;
