use std::sync::Arc;

use altitude_core::config::TerrainConfig;
use altitude_core::types::{ChunkCoord, ChunkId, WorldPos};

use crate::chunk::TerrainChunk;
use crate::chunk_map::{ChunkCounts, ChunkMap};
use crate::completion::CompletionQueue;
use crate::density::DensitySampler;
use crate::error::WorldError;
use crate::jobs::JobRuntime;
use crate::sink::MeshSink;
use crate::state_machine::ChunkState;
use crate::streaming::StreamingPolicy;

/// What one `update` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Chunks created and scheduled.
    pub created: usize,
    /// Chunks removed for leaving the view box.
    pub evicted: usize,
    /// Chunks whose sampling finished and joined the completion queue.
    pub enqueued: usize,
    /// Chunks meshed and attached (0 or 1).
    pub completed: usize,
    /// Resident chunks after the tick.
    pub loaded: usize,
    /// Resident chunks still waiting for a mesh.
    pub pending: usize,
}

/// Keeps the chunks around a moving viewer resident and generated.
///
/// Each `update` runs three passes on the caller's thread:
/// 1. mark chunks outside the view box and create the missing ones,
/// 2. sweep: evict marked chunks, queue chunks whose sampling finished,
/// 3. complete at most one queued chunk when the throttle allows.
pub struct StreamingController<S: MeshSink> {
    policy: StreamingPolicy,
    iso_level: f32,
    sampler: Arc<DensitySampler>,
    runtime: Arc<dyn JobRuntime>,
    chunks: ChunkMap,
    queue: CompletionQueue,
    next_id: ChunkId,
    sink: S,
}

impl<S: MeshSink> StreamingController<S> {
    /// Validate `config` and set up an empty controller.
    pub fn new(
        config: &TerrainConfig,
        runtime: Arc<dyn JobRuntime>,
        sink: S,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        let sampler = Arc::new(DensitySampler::new(config.noise.clone())?);
        Ok(Self {
            policy: StreamingPolicy::new(config.chunk_size(), config.view_distance()),
            iso_level: config.iso_level,
            sampler,
            runtime,
            chunks: ChunkMap::new(),
            queue: CompletionQueue::new(config.complete_interval),
            next_id: ChunkId::default(),
            sink,
        })
    }

    /// Create and fully generate every chunk in the view box around
    /// `viewer` before streaming starts. Returns how many were generated.
    pub fn generate_initial(&mut self, viewer: WorldPos) -> Result<usize, WorldError> {
        let policy = self.policy;
        let center = policy.center_for(viewer);
        self.create_missing(center)?;

        let mut generated = 0;
        for coord in policy.desired_coords(center) {
            let Some(chunk) = self.chunks.get_mut(&coord) else {
                continue;
            };
            if chunk.is_generated() {
                continue;
            }
            let origin = chunk.origin();
            let mesh = chunk.complete_sampling(self.iso_level)?;
            self.sink.attach(coord, origin, mesh);
            generated += 1;
        }

        log::info!(
            "Initial terrain pass around chunk {}: {} chunks generated",
            center,
            generated
        );
        Ok(generated)
    }

    /// One streaming tick for the viewer at `viewer`, `dt` seconds after
    /// the previous one.
    pub fn update(&mut self, viewer: WorldPos, dt: f32) -> Result<TickStats, WorldError> {
        let center = self.policy.center_for(viewer);
        let mut stats = TickStats::default();

        let policy = self.policy;
        for (coord, chunk) in self.chunks.iter_mut() {
            chunk.mark_for_removal(!policy.contains(center, *coord));
        }
        stats.created = self.create_missing(center)?;

        // Keys are copied first; the map is mutated during the sweep
        for coord in self.chunks.coords() {
            let Some(chunk) = self.chunks.get_mut(&coord) else {
                continue;
            };
            if chunk.should_remove() {
                if let Some(mut evicted) = self.chunks.remove(&coord) {
                    if evicted.remove() {
                        self.sink.detach(coord);
                    }
                    log::debug!("Chunk {} evicted", coord);
                    stats.evicted += 1;
                }
                continue;
            }
            if chunk.is_sampling_complete() && chunk.mark_queued() {
                self.queue.push(coord, chunk.id());
                stats.enqueued += 1;
            }
        }

        if self.queue.advance(dt) && self.complete_next()? {
            stats.completed = 1;
        }

        let counts = self.chunks.counts();
        stats.loaded = counts.total;
        stats.pending = counts.pending;
        if stats.created + stats.evicted + stats.completed > 0 {
            log::debug!(
                "Tick at {}: +{} -{} queued {} completed {} ({} loaded, {} pending)",
                center,
                stats.created,
                stats.evicted,
                stats.enqueued,
                stats.completed,
                stats.loaded,
                stats.pending
            );
        }
        Ok(stats)
    }

    /// Force-complete every chunk without a mesh, then release all chunks.
    /// No density grid outlives this call. Returns how many chunks had to be
    /// force-completed.
    pub fn shutdown(&mut self) -> usize {
        let mut completed = 0;
        for coord in self.chunks.coords() {
            let Some(chunk) = self.chunks.get_mut(&coord) else {
                continue;
            };
            if chunk.is_generated() {
                continue;
            }
            let origin = chunk.origin();
            match chunk.complete_sampling(self.iso_level) {
                Ok(mesh) => {
                    self.sink.attach(coord, origin, mesh);
                    completed += 1;
                }
                Err(e) => log::warn!("Chunk {} not completed at shutdown: {}", coord, e),
            }
        }

        self.queue.clear();
        let mut released = 0;
        for (coord, mut chunk) in self.chunks.drain() {
            if chunk.remove() {
                self.sink.detach(coord);
            }
            released += 1;
        }

        log::info!(
            "Terrain streaming shut down: {} chunks force-completed, {} released",
            completed,
            released
        );
        completed
    }

    /// Create and schedule every coordinate of the view box that has no
    /// chunk yet. A chunk enters the map only once scheduling succeeded.
    fn create_missing(&mut self, center: ChunkCoord) -> Result<usize, WorldError> {
        let policy = self.policy;
        let mut created = 0;
        for coord in policy.desired_coords(center) {
            if self.chunks.contains(&coord) {
                continue;
            }
            let id = ChunkId::next(&mut self.next_id);
            let mut chunk = TerrainChunk::new(id, coord, policy.chunk_size());
            chunk.schedule_sampling(&self.sampler, self.runtime.as_ref())?;
            self.chunks.insert(chunk);
            created += 1;
        }
        Ok(created)
    }

    /// Mesh the oldest live queued chunk. Entries whose chunk was evicted,
    /// or whose coordinate now holds a newer chunk, are skipped.
    fn complete_next(&mut self) -> Result<bool, WorldError> {
        while let Some((coord, id)) = self.queue.pop_front() {
            let Some(chunk) = self.chunks.get_mut(&coord) else {
                continue;
            };
            if chunk.id() != id || chunk.state() != ChunkState::Queued {
                continue;
            }
            let origin = chunk.origin();
            match chunk.complete_sampling(self.iso_level) {
                Ok(mesh) => {
                    self.sink.attach(coord, origin, mesh);
                    return Ok(true);
                }
                Err(WorldError::JobLost { coord }) => {
                    log::warn!(
                        "Sampling job for chunk {} was lost; chunk dropped for rescheduling",
                        coord
                    );
                    self.chunks.remove(&coord);
                    return Ok(false);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(false)
    }

    pub fn chunk_map(&self) -> &ChunkMap {
        &self.chunks
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn policy(&self) -> &StreamingPolicy {
        &self.policy
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn counts(&self) -> ChunkCounts {
        self.chunks.counts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{ImmediateRuntime, RayonRuntime, Task};
    use crate::sink::RecordingSink;
    use altitude_core::error::ConfigError;
    use glam::{IVec3, Vec3};
    use std::collections::HashSet;

    const DT: f32 = 0.025;

    struct VanishingRuntime;

    impl JobRuntime for VanishingRuntime {
        fn spawn(&self, task: Task) {
            drop(task);
        }
    }

    fn config(view: [u32; 3]) -> TerrainConfig {
        let mut config = TerrainConfig {
            chunk_size: [16, 16, 16],
            view_distance: view,
            complete_interval: DT,
            ..Default::default()
        };
        // Gentle terrain: the surface always crosses the chunks at y in [-16, 0]
        config.noise.strength = 4.0;
        config
    }

    fn controller(config: &TerrainConfig) -> StreamingController<RecordingSink> {
        StreamingController::new(config, Arc::new(ImmediateRuntime), RecordingSink::new())
            .expect("valid config")
    }

    fn key_set(ctrl: &StreamingController<RecordingSink>) -> HashSet<ChunkCoord> {
        ctrl.chunk_map().coords().into_iter().collect()
    }

    fn box_set(ctrl: &StreamingController<RecordingSink>, viewer: Vec3) -> HashSet<ChunkCoord> {
        let policy = ctrl.policy();
        policy.desired_coords(policy.center_for(viewer)).collect()
    }

    #[test]
    fn test_initial_pass_generates_whole_box() {
        let mut ctrl = controller(&config([2, 2, 2]));
        let generated = ctrl.generate_initial(Vec3::ZERO).expect("startup");
        assert_eq!(generated, 8);
        assert_eq!(ctrl.chunk_map().len(), 8);
        for (_, chunk) in ctrl.chunk_map().iter() {
            assert!(chunk.is_generated());
            assert!(chunk.mesh().is_some(), "chunk {} has no mesh", chunk.coord());
            assert!(!chunk.holds_grid());
        }
        assert_eq!(ctrl.sink().attached().len(), 8);
        assert_eq!(ctrl.sink().double_attaches, 0);
        // Origin straddles y = 0, so the ground surface is in the box
        assert!(ctrl.sink().total_triangles() > 0);
    }

    #[test]
    fn test_key_set_tracks_view_box() {
        let mut ctrl = controller(&config([3, 2, 3]));
        ctrl.generate_initial(Vec3::ZERO).expect("startup");

        let path = [
            Vec3::new(8.5, 0.0, 0.0),
            Vec3::new(40.0, 0.0, 0.0),
            Vec3::new(40.0, -30.0, 17.0),
            Vec3::new(-100.0, 5.0, 64.0),
            Vec3::new(-100.0, 5.0, 64.0),
            Vec3::ZERO,
        ];
        for viewer in path {
            ctrl.update(viewer, DT).expect("tick");
            assert_eq!(key_set(&ctrl), box_set(&ctrl, viewer), "viewer at {viewer}");
        }
    }

    #[test]
    fn test_eviction_detaches_generated_chunks() {
        let mut ctrl = controller(&config([2, 2, 2]));
        ctrl.generate_initial(Vec3::ZERO).expect("startup");

        let stats = ctrl.update(Vec3::new(1000.0, 0.0, 0.0), DT).expect("tick");
        assert_eq!(stats.evicted, 8);
        assert_eq!(stats.created, 8);
        assert_eq!(ctrl.sink().detach_calls, 8);
        assert_eq!(ctrl.sink().stray_detaches, 0);
        // Only the one chunk completed this tick is attached
        assert_eq!(ctrl.sink().attached().len(), stats.completed);
    }

    #[test]
    fn test_far_viewer_clips_box_at_coordinate_limit() {
        let mut ctrl = controller(&config([2, 2, 2]));
        let viewer = Vec3::new(1.0e12, 0.0, 0.0);

        let stats = ctrl.update(viewer, DT).expect("tick");
        // x saturates at i32::MAX, leaving one column of the box
        assert_eq!(stats.created, 4);
        assert_eq!(key_set(&ctrl), box_set(&ctrl, viewer));
        assert!(ctrl.chunk_map().coords().iter().all(|c| c.x == i32::MAX - 1));

        let stats = ctrl.update(viewer, DT).expect("tick");
        assert_eq!((stats.created, stats.evicted), (0, 0));
    }

    #[test]
    fn test_throttle_completes_one_chunk_per_interval() {
        let mut ctrl = controller(&config([10, 1, 1]));

        for tick in 1..=9 {
            let stats = ctrl.update(Vec3::ZERO, DT).expect("tick");
            assert_eq!(stats.completed, 1, "tick {tick}");
        }
        assert_eq!(ctrl.counts().generated, 9);
        assert_eq!(ctrl.counts().queued, 1);

        ctrl.update(Vec3::ZERO, DT).expect("tick");
        assert_eq!(ctrl.counts().generated, 10);
        assert_eq!(ctrl.queue_len(), 0);

        let stats = ctrl.update(Vec3::ZERO, DT).expect("tick");
        assert_eq!(stats, TickStats { loaded: 10, ..Default::default() });
    }

    #[test]
    fn test_no_completion_between_intervals() {
        let mut ctrl = controller(&TerrainConfig {
            complete_interval: 0.1,
            ..config([2, 1, 1])
        });
        let stats = ctrl.update(Vec3::ZERO, 0.04).expect("tick");
        assert_eq!((stats.created, stats.enqueued, stats.completed), (2, 2, 0));
        assert_eq!(ctrl.update(Vec3::ZERO, 0.04).expect("tick").completed, 0);
        assert_eq!(ctrl.update(Vec3::ZERO, 0.04).expect("tick").completed, 1);
    }

    #[test]
    fn test_stale_queue_entries_are_skipped() {
        let mut ctrl = controller(&TerrainConfig {
            complete_interval: 1.0,
            ..config([1, 1, 1])
        });
        let far = Vec3::new(160.0, 0.0, 0.0);

        ctrl.update(Vec3::ZERO, 0.01).expect("tick");
        let first_id = ctrl.chunk_map().get(&IVec3::ZERO).expect("chunk").id();
        ctrl.update(far, 0.01).expect("tick");
        // Back at the origin: a new chunk replaces the evicted one
        let stats = ctrl.update(Vec3::ZERO, 1.0).expect("tick");

        assert_eq!(stats.completed, 1);
        assert_eq!(ctrl.queue_len(), 0, "both stale entries were dropped");
        let chunk = ctrl.chunk_map().get(&IVec3::ZERO).expect("chunk");
        assert_ne!(chunk.id(), first_id);
        assert!(chunk.is_generated());
        assert_eq!(ctrl.sink().attach_calls, 1);
    }

    #[test]
    fn test_shutdown_force_completes_pending_chunks() {
        let mut ctrl = controller(&TerrainConfig {
            complete_interval: 10.0,
            ..config([2, 2, 2])
        });
        let stats = ctrl.update(Vec3::ZERO, DT).expect("tick");
        assert_eq!(stats.pending, 8);

        assert_eq!(ctrl.shutdown(), 8);
        assert!(ctrl.chunk_map().is_empty());
        assert_eq!(ctrl.queue_len(), 0);
        assert_eq!(ctrl.sink().attach_calls, 8);
        assert_eq!(ctrl.sink().detach_calls, 8);
        assert!(ctrl.sink().attached().is_empty());
    }

    #[test]
    fn test_all_solid_field_has_no_triangles() {
        let mut config = config([2, 2, 2]);
        config.noise.num_layers = 0;
        config.noise.recede = 100.0;
        config.noise.min_value = -100.0;
        // Density is -400 - y: below iso everywhere in the box
        let mut ctrl = controller(&config);
        ctrl.generate_initial(Vec3::ZERO).expect("startup");
        assert_eq!(ctrl.counts().generated, 8);
        assert_eq!(ctrl.sink().total_triangles(), 0);
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut config = config([2, 2, 2]);
        config.noise.scale = 0.0;
        let result =
            StreamingController::new(&config, Arc::new(ImmediateRuntime), RecordingSink::new());
        assert!(matches!(
            result,
            Err(WorldError::Config(ConfigError::ZeroScale))
        ));
    }

    #[test]
    fn test_lost_job_is_dropped_and_rescheduled() {
        let runtime: Arc<dyn JobRuntime> = Arc::new(VanishingRuntime);
        let mut ctrl =
            StreamingController::new(&config([1, 1, 1]), runtime, RecordingSink::new())
                .expect("valid config");

        let stats = ctrl.update(Vec3::ZERO, DT).expect("tick");
        assert_eq!((stats.created, stats.completed), (1, 0));
        assert!(ctrl.chunk_map().is_empty(), "lost chunk was dropped");

        let stats = ctrl.update(Vec3::ZERO, DT).expect("tick");
        assert_eq!(stats.created, 1, "coordinate rescheduled");
    }

    #[test]
    fn test_lost_job_fails_startup() {
        let runtime: Arc<dyn JobRuntime> = Arc::new(VanishingRuntime);
        let mut ctrl =
            StreamingController::new(&config([1, 1, 1]), runtime, RecordingSink::new())
                .expect("valid config");
        assert!(matches!(
            ctrl.generate_initial(Vec3::ZERO),
            Err(WorldError::JobLost { .. })
        ));
    }

    #[test]
    fn test_streaming_on_worker_pool_converges() {
        let runtime: Arc<dyn JobRuntime> = Arc::new(RayonRuntime::new(2).expect("pool builds"));
        let mut ctrl = StreamingController::new(&config([2, 2, 2]), runtime, RecordingSink::new())
            .expect("valid config");
        ctrl.generate_initial(Vec3::ZERO).expect("startup");

        let viewer = Vec3::new(48.0, 0.0, 0.0);
        let mut ticks = 0;
        loop {
            ctrl.update(viewer, DT).expect("tick");
            let counts = ctrl.counts();
            if counts.generated == counts.total {
                break;
            }
            ticks += 1;
            assert!(ticks < 100_000, "streaming did not converge: {counts:?}");
            std::thread::yield_now();
        }
        assert_eq!(key_set(&ctrl), box_set(&ctrl, viewer));
        assert_eq!(ctrl.sink().attached().len(), 8);
        assert_eq!(ctrl.shutdown(), 0);
    }
}
