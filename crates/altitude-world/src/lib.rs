//! Procedural terrain streaming: layered-noise density sampling,
//! marching-cubes meshing and the chunk streaming controller.

pub mod chunk;
pub mod chunk_map;
pub mod completion;
pub mod controller;
pub mod density;
pub mod error;
pub mod jobs;
pub mod marching;
pub mod mesh;
pub mod noise;
pub mod sink;
pub mod state_machine;
pub mod streaming;
pub mod tables;

pub use chunk::TerrainChunk;
pub use chunk_map::{ChunkCounts, ChunkMap};
pub use controller::{StreamingController, TickStats};
pub use density::{DensityGrid, DensitySample, DensitySampler};
pub use error::WorldError;
pub use jobs::{ImmediateRuntime, JobRuntime, RayonRuntime};
pub use mesh::Mesh;
pub use sink::{MeshSink, NullSink, RecordingSink, SurfaceKind};
pub use state_machine::ChunkState;
