use std::sync::Arc;

use altitude_core::math::{chunk_origin, grid_dims};
use altitude_core::types::{ChunkCoord, ChunkId};
use glam::{UVec3, Vec3};

use crate::density::{DensityGrid, DensitySampler, SamplingJob};
use crate::error::WorldError;
use crate::jobs::JobRuntime;
use crate::marching::extract_mesh;
use crate::mesh::Mesh;
use crate::state_machine::ChunkState;

/// One streamed terrain chunk.
///
/// Owns its density grid (inside the sampling job until the mesh is built)
/// and, once generated, its mesh. Neither is ever shared with another chunk.
pub struct TerrainChunk {
    id: ChunkId,
    coord: ChunkCoord,
    /// World-space position of local grid sample (0, 0, 0).
    origin: Vec3,
    /// Cells per axis.
    size: UVec3,
    state: ChunkState,
    marked_for_removal: bool,
    job: Option<SamplingJob>,
    mesh: Option<Mesh>,
}

impl TerrainChunk {
    pub fn new(id: ChunkId, coord: ChunkCoord, size: UVec3) -> Self {
        Self {
            id,
            coord,
            origin: chunk_origin(coord, size),
            size,
            state: ChunkState::Unscheduled,
            marked_for_removal: false,
            job: None,
            mesh: None,
        }
    }

    /// Allocate the density grid and submit its sampling job. Only an
    /// allocation failure is an error; scheduling twice is a no-op.
    pub fn schedule_sampling(
        &mut self,
        sampler: &Arc<DensitySampler>,
        runtime: &dyn JobRuntime,
    ) -> Result<(), WorldError> {
        match self.state {
            ChunkState::Unscheduled => {}
            ChunkState::Removed => return Err(WorldError::ChunkRemoved { coord: self.coord }),
            _ => return Ok(()),
        }
        let grid = DensityGrid::try_new(grid_dims(self.size))?;
        self.job = Some(sampler.submit(runtime, self.origin, grid));
        self.transition(ChunkState::Scheduled);
        log::debug!("Chunk {} scheduled at {}", self.coord, self.origin);
        Ok(())
    }

    /// Non-blocking poll. Moves `Scheduled` to `ValueReady` once the job has
    /// finished. Safe to call in any state.
    pub fn is_sampling_complete(&mut self) -> bool {
        let done = match self.job.as_mut() {
            Some(job) => job.is_complete(),
            None => self.state == ChunkState::Generated,
        };
        if done && self.state == ChunkState::Scheduled {
            self.transition(ChunkState::ValueReady);
        }
        done
    }

    /// `ValueReady -> Queued`. Returns false in any other state.
    pub fn mark_queued(&mut self) -> bool {
        if self.state != ChunkState::ValueReady {
            return false;
        }
        self.transition(ChunkState::Queued);
        true
    }

    /// Wait for the density grid, build the mesh and free the grid.
    /// Calling it again on a generated chunk returns the same mesh.
    pub fn complete_sampling(&mut self, iso: f32) -> Result<&Mesh, WorldError> {
        let coord = self.coord;
        match self.state {
            ChunkState::Generated => {}
            ChunkState::Removed => return Err(WorldError::ChunkRemoved { coord }),
            ChunkState::Unscheduled => return Err(WorldError::NotScheduled { coord }),
            ChunkState::Scheduled | ChunkState::ValueReady | ChunkState::Queued => {
                let grid = self
                    .job
                    .take()
                    .and_then(|mut job| job.wait())
                    .ok_or(WorldError::JobLost { coord })?;
                let mesh = extract_mesh(&grid, iso);
                drop(grid);
                log::debug!(
                    "Chunk {} generated ({} triangles)",
                    coord,
                    mesh.triangle_count()
                );
                self.mesh = Some(mesh);
                self.transition(ChunkState::Generated);
            }
        }
        self.mesh.as_ref().ok_or(WorldError::ChunkRemoved { coord })
    }

    pub fn mark_for_removal(&mut self, marked: bool) {
        self.marked_for_removal = marked;
    }

    pub fn should_remove(&self) -> bool {
        self.marked_for_removal
    }

    /// Deactivate the chunk and release its grid and mesh. Returns whether a
    /// generated mesh was released. Idempotent.
    ///
    /// A chunk that is not yet generated is not force-completed: its
    /// in-flight sampling job is waited on and the grid dropped without
    /// meshing, so no mesh is built only to be discarded and nothing is
    /// handed to the sink for detaching.
    pub fn remove(&mut self) -> bool {
        if self.state == ChunkState::Removed {
            return false;
        }
        if let Some(mut job) = self.job.take() {
            // Blocking; there is no cancellation
            drop(job.wait());
        }
        let was_generated = self.state == ChunkState::Generated;
        self.mesh = None;
        self.transition(ChunkState::Removed);
        was_generated
    }

    fn transition(&mut self, next: ChunkState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal chunk transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    pub fn id(&self) -> ChunkId {
        self.id
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn size(&self) -> UVec3 {
        self.size
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn is_generated(&self) -> bool {
        self.state == ChunkState::Generated
    }

    pub fn is_removed(&self) -> bool {
        self.state == ChunkState::Removed
    }

    /// Whether a density grid is still held (in flight or awaiting meshing).
    pub fn holds_grid(&self) -> bool {
        self.job.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{ImmediateRuntime, RayonRuntime, Task};
    use altitude_core::noise_config::NoiseConfig;
    use glam::IVec3;

    const ISO: f32 = 0.5;

    struct VanishingRuntime;

    impl JobRuntime for VanishingRuntime {
        fn spawn(&self, task: Task) {
            drop(task);
        }
    }

    fn sampler() -> Arc<DensitySampler> {
        // Low strength keeps the surface well above y = -16
        let config = NoiseConfig {
            strength: 4.0,
            ..Default::default()
        };
        Arc::new(DensitySampler::new(config).expect("valid config"))
    }

    fn ground_chunk() -> TerrainChunk {
        // Spans y in [-16, 0]: density is 0 at the world origin and above
        // iso at the bottom, so some cell must cross
        TerrainChunk::new(ChunkId(0), IVec3::new(0, -1, 0), UVec3::splat(16))
    }

    #[test]
    fn test_new_chunk_origin() {
        let chunk = TerrainChunk::new(ChunkId(3), IVec3::new(1, -2, 3), UVec3::new(16, 8, 4));
        assert_eq!(chunk.origin(), Vec3::new(16.0, -16.0, 12.0));
        assert_eq!(chunk.state(), ChunkState::Unscheduled);
        assert!(!chunk.is_generated());
        assert!(!chunk.holds_grid());
    }

    #[test]
    fn test_lifecycle_through_queue() {
        let sampler = sampler();
        let mut chunk = ground_chunk();
        chunk
            .schedule_sampling(&sampler, &ImmediateRuntime)
            .expect("schedules");
        assert_eq!(chunk.state(), ChunkState::Scheduled);
        assert!(chunk.holds_grid());

        assert!(chunk.is_sampling_complete());
        assert_eq!(chunk.state(), ChunkState::ValueReady);
        assert!(chunk.mark_queued());
        assert!(!chunk.mark_queued(), "queued only once");

        let triangles = chunk.complete_sampling(ISO).expect("mesh").triangle_count();
        assert!(triangles > 0, "ground chunk should contain surface");
        assert!(chunk.is_generated());
        assert!(!chunk.holds_grid(), "grid freed after meshing");
    }

    #[test]
    fn test_complete_sampling_is_idempotent() {
        let sampler = sampler();
        let mut chunk = ground_chunk();
        chunk
            .schedule_sampling(&sampler, &ImmediateRuntime)
            .expect("schedules");
        let first = chunk.complete_sampling(ISO).expect("mesh").clone();
        let second = chunk.complete_sampling(ISO).expect("mesh").clone();
        assert_eq!(first, second);
        assert!(chunk.is_sampling_complete());
    }

    #[test]
    fn test_remove_pending_chunk_waits_and_frees() {
        let sampler = sampler();
        let runtime = RayonRuntime::new(1).expect("pool builds");
        let mut chunk = ground_chunk();
        chunk.schedule_sampling(&sampler, &runtime).expect("schedules");
        chunk.mark_for_removal(true);
        assert!(chunk.should_remove());

        assert!(!chunk.remove(), "nothing was generated yet");
        assert!(chunk.is_removed());
        assert!(!chunk.holds_grid());
        assert!(chunk.mesh().is_none());
        assert!(!chunk.remove(), "second remove is a no-op");
    }

    #[test]
    fn test_remove_generated_chunk() {
        let sampler = sampler();
        let mut chunk = ground_chunk();
        chunk
            .schedule_sampling(&sampler, &ImmediateRuntime)
            .expect("schedules");
        chunk.complete_sampling(ISO).expect("mesh");
        assert!(chunk.remove());
        assert!(chunk.mesh().is_none());
    }

    #[test]
    fn test_stale_operations_after_removal() {
        let sampler = sampler();
        let mut chunk = ground_chunk();
        chunk
            .schedule_sampling(&sampler, &ImmediateRuntime)
            .expect("schedules");
        chunk.remove();

        assert!(!chunk.is_sampling_complete());
        assert!(!chunk.mark_queued());
        assert!(matches!(
            chunk.complete_sampling(ISO),
            Err(WorldError::ChunkRemoved { .. })
        ));
        assert!(matches!(
            chunk.schedule_sampling(&sampler, &ImmediateRuntime),
            Err(WorldError::ChunkRemoved { .. })
        ));
    }

    #[test]
    fn test_unscheduled_chunk_cannot_complete() {
        let mut chunk = ground_chunk();
        assert!(!chunk.is_sampling_complete());
        assert!(matches!(
            chunk.complete_sampling(ISO),
            Err(WorldError::NotScheduled { .. })
        ));
    }

    #[test]
    fn test_lost_job_surfaces_as_error() {
        let sampler = sampler();
        let mut chunk = ground_chunk();
        chunk
            .schedule_sampling(&sampler, &VanishingRuntime)
            .expect("schedules");
        assert!(chunk.is_sampling_complete());
        assert!(matches!(
            chunk.complete_sampling(ISO),
            Err(WorldError::JobLost { .. })
        ));
        assert!(!chunk.holds_grid());
        assert!(!chunk.remove());
    }
}
