use std::sync::Arc;

use altitude_core::constants::NOISE_TABLE_SEED;
use altitude_core::error::ConfigError;
use altitude_core::math::{grid_index, grid_local};
use altitude_core::noise_config::NoiseConfig;
use glam::{UVec3, Vec3};

use crate::error::WorldError;
use crate::jobs::{parallel_for, JobHandle, JobRuntime};
use crate::noise::SimplexNoise;

/// One grid sample: chunk-local position plus the density there.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DensitySample {
    pub position: Vec3,
    pub value: f32,
}

/// Scalar field for one chunk, (N+1)^3 samples for N^3 cells.
/// Addressed only through `grid_index` / `grid_local`.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    dims: UVec3,
    samples: Vec<DensitySample>,
}

impl DensityGrid {
    /// Allocate a zeroed grid. Fails instead of aborting when the buffer
    /// cannot be reserved.
    pub fn try_new(dims: UVec3) -> Result<Self, WorldError> {
        let len = (dims.x as usize)
            .checked_mul(dims.y as usize)
            .and_then(|n| n.checked_mul(dims.z as usize))
            .ok_or(WorldError::Allocation {
                samples: usize::MAX,
            })?;
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(len)
            .map_err(|_| WorldError::Allocation { samples: len })?;
        samples.resize(len, DensitySample::default());
        Ok(Self { dims, samples })
    }

    /// Build a grid by evaluating `f` at every local position.
    pub fn from_fn(dims: UVec3, f: impl Fn(UVec3) -> f32) -> Self {
        let len = altitude_core::math::grid_len(dims);
        let samples = (0..len)
            .map(|index| {
                let local = grid_local(dims, index);
                DensitySample {
                    position: local.as_vec3(),
                    value: f(local),
                }
            })
            .collect();
        Self { dims, samples }
    }

    fn from_parts(dims: UVec3, samples: Vec<DensitySample>) -> Self {
        debug_assert_eq!(samples.len(), altitude_core::math::grid_len(dims));
        Self { dims, samples }
    }

    /// Sample counts per axis.
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// Cell counts per axis (one fewer than samples).
    pub fn cell_dims(&self) -> UVec3 {
        self.dims.saturating_sub(UVec3::ONE)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, local: UVec3) -> &DensitySample {
        &self.samples[grid_index(self.dims, local)]
    }

    pub fn value_at(&self, local: UVec3) -> f32 {
        self.get(local).value
    }

    pub fn set(&mut self, local: UVec3, value: f32) {
        let index = grid_index(self.dims, local);
        self.samples[index] = DensitySample {
            position: local.as_vec3(),
            value,
        };
    }

    pub fn sample_at_index(&self, index: usize) -> &DensitySample {
        &self.samples[index]
    }

    pub fn samples(&self) -> &[DensitySample] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [DensitySample] {
        &mut self.samples
    }

    fn into_samples(self) -> Vec<DensitySample> {
        self.samples
    }
}

/// Evaluates the layered noise density field.
pub struct DensitySampler {
    config: NoiseConfig,
    noise: SimplexNoise,
}

impl DensitySampler {
    /// Validates the config up front so a zero scale never reaches a job.
    pub fn new(config: NoiseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            noise: SimplexNoise::new(NOISE_TABLE_SEED),
        })
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    /// Sum of `num_layers` octaves at a world position.
    pub fn layered_noise(&self, point: Vec3) -> f32 {
        let c = &self.config;
        let offset = Vec3::splat(c.seed as f32);
        let mut value = 0.0f32;
        let mut frequency = c.base_roughness;
        let mut amplitude = 1.0f32;
        for _ in 0..c.num_layers {
            let p = (point + offset) / c.scale * frequency;
            let v = self.noise.sample(p.x as f64, p.y as f64, p.z as f64) as f32;
            value += v * amplitude;
            frequency *= c.roughness;
            amplitude *= c.persistence;
        }
        value
    }

    /// Density at a world position. Falls off with height so the zero
    /// crossing forms a ground surface shaped by the noise.
    pub fn density_at(&self, point: Vec3) -> f32 {
        let c = &self.config;
        (self.layered_noise(point) - c.recede).max(c.min_value) * c.strength - point.y
    }

    fn sample_index(&self, origin: Vec3, dims: UVec3, index: usize) -> DensitySample {
        let position = grid_local(dims, index).as_vec3();
        DensitySample {
            position,
            value: self.density_at(origin + position),
        }
    }

    /// Fill `grid` on the calling thread.
    pub fn fill(&self, origin: Vec3, grid: &mut DensityGrid) {
        let dims = grid.dims();
        for (index, sample) in grid.samples_mut().iter_mut().enumerate() {
            *sample = self.sample_index(origin, dims, index);
        }
    }

    /// Fill `grid` on `runtime`, one task per linear sample index, batched
    /// by rows of `dims.x`.
    pub fn submit(
        self: &Arc<Self>,
        runtime: &dyn JobRuntime,
        origin: Vec3,
        grid: DensityGrid,
    ) -> SamplingJob {
        let dims = grid.dims();
        let sampler = Arc::clone(self);
        let handle = parallel_for(
            runtime,
            grid.into_samples(),
            dims.x as usize,
            move |index, sample| *sample = sampler.sample_index(origin, dims, index),
        );
        SamplingJob { dims, handle }
    }
}

/// In-flight density fill for one chunk.
pub struct SamplingJob {
    dims: UVec3,
    handle: JobHandle<Vec<DensitySample>>,
}

impl SamplingJob {
    pub fn is_complete(&mut self) -> bool {
        self.handle.is_complete()
    }

    /// Block for the filled grid. None if the job was lost or already taken.
    pub fn wait(&mut self) -> Option<DensityGrid> {
        let dims = self.dims;
        self.handle
            .wait()
            .map(|samples| DensityGrid::from_parts(dims, samples))
    }
}
