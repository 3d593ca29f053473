use altitude_core::error::ConfigError;
use altitude_core::types::ChunkCoord;

/// Errors raised while streaming terrain.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("invalid terrain config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to allocate density grid of {samples} samples")]
    Allocation { samples: usize },

    #[error("sampling job for chunk {coord} finished without a result")]
    JobLost { coord: ChunkCoord },

    #[error("chunk {coord} has no sampling job")]
    NotScheduled { coord: ChunkCoord },

    #[error("chunk {coord} was already removed")]
    ChunkRemoved { coord: ChunkCoord },

    #[error("failed to build worker pool: {0}")]
    RuntimeBuild(String),
}
