use thiserror::Error;

/// Configuration problems. All of these are fatal at startup; none may be
/// allowed to degrade into NaN terrain.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("noise scale must be non-zero")]
    ZeroScale,

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    #[error("chunk size along {axis} must be positive")]
    ZeroChunkDimension { axis: char },

    #[error("view distance along {axis} is {value}, above the coordinate range")]
    ViewDistanceTooLarge { axis: char, value: u32 },

    #[error("completion interval must be positive, got {0}")]
    NonPositiveInterval(f32),

    #[error("failed to parse terrain config RON: {0}")]
    Parse(String),

    #[error("failed to read terrain config: {0}")]
    Io(String),
}
