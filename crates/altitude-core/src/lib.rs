//! Shared vocabulary for the terrain streaming engine: coordinates, grid
//! addressing, configuration and its validation.

pub mod config;
pub mod constants;
pub mod error;
pub mod math;
pub mod noise_config;
pub mod types;

pub use config::TerrainConfig;
pub use error::ConfigError;
pub use noise_config::NoiseConfig;
pub use types::{ChunkCoord, ChunkId, WorldPos};
