use std::sync::Arc;
use std::time::Instant;

use altitude_core::config::TerrainConfig;
use altitude_world::{JobRuntime, RayonRuntime, RecordingSink, StreamingController, WorldError};

use crate::paths::ViewerPath;

/// Timing data for a single benchmark run.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimingSeries {
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Result of streaming along one viewer path.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PathResult {
    pub path_name: String,
    pub tick_count: u32,
    /// Wall time of the synchronous initial pass.
    pub startup_ms: f64,
    pub initial_chunks: usize,
    pub chunks_created: usize,
    pub chunks_evicted: usize,
    pub chunks_completed: usize,
    /// Chunks still waiting for a mesh after the last tick.
    pub pending_at_end: usize,
    pub triangles_attached: usize,
    /// Per-tick update cost.
    pub timings: TimingSeries,
}

/// Drives a `StreamingController` headlessly on a shared worker pool.
pub struct StreamRunner {
    config: TerrainConfig,
    runtime: Arc<RayonRuntime>,
    tick_count: u32,
    dt: f32,
}

impl StreamRunner {
    pub fn new(config: TerrainConfig, tick_count: u32, dt: f32) -> Result<Self, WorldError> {
        config.validate()?;
        let runtime = Arc::new(RayonRuntime::new(config.worker_threads)?);
        Ok(Self {
            config,
            runtime,
            tick_count,
            dt,
        })
    }

    /// Stream along `path` and return timing results.
    pub fn run_path(&self, path: &ViewerPath) -> Result<PathResult, WorldError> {
        log::info!(
            "Running path '{}' ({} ticks, dt={}s)...",
            path.name,
            self.tick_count,
            self.dt
        );

        let runtime: Arc<dyn JobRuntime> = self.runtime.clone();
        let mut controller =
            StreamingController::new(&self.config, runtime, RecordingSink::new())?;

        let startup = Instant::now();
        let initial_chunks = controller.generate_initial(path.position_at(0.0))?;
        let startup_ms = startup.elapsed().as_secs_f64() * 1000.0;

        let mut tick_times = Vec::with_capacity(self.tick_count as usize);
        let (mut created, mut evicted, mut completed) = (0, 0, 0);
        let mut pending_at_end = 0;

        for tick in 1..=self.tick_count {
            let viewer = path.position_at(tick as f32 * self.dt);

            let tick_start = Instant::now();
            let stats = controller.update(viewer, self.dt)?;
            tick_times.push(tick_start.elapsed().as_secs_f64() * 1000.0);

            created += stats.created;
            evicted += stats.evicted;
            completed += stats.completed;
            pending_at_end = stats.pending;
        }

        let triangles_attached = controller.sink().total_triangles();
        controller.shutdown();

        let timings = compute_timings(&tick_times);
        log::info!(
            "  Done: startup={:.2}ms, mean={:.3}ms, p99={:.3}ms, {} completed, {} pending",
            startup_ms,
            timings.mean_ms,
            timings.p99_ms,
            completed,
            pending_at_end
        );

        Ok(PathResult {
            path_name: path.name.to_string(),
            tick_count: self.tick_count,
            startup_ms,
            initial_chunks,
            chunks_created: created,
            chunks_evicted: evicted,
            chunks_completed: completed,
            pending_at_end,
            triangles_attached,
            timings,
        })
    }
}

/// Compute timing statistics from a list of times in milliseconds.
pub fn compute_timings(times: &[f64]) -> TimingSeries {
    if times.is_empty() {
        return TimingSeries::default();
    }

    let mut sorted = times.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let p95_idx = ((n as f64) * 0.95).ceil() as usize;
    let p99_idx = ((n as f64) * 0.99).ceil() as usize;

    TimingSeries {
        mean_ms: mean,
        median_ms: median,
        p95_ms: sorted[p95_idx.min(n - 1)],
        p99_ms: sorted[p99_idx.min(n - 1)],
        min_ms: sorted[0],
        max_ms: sorted[n - 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_timings() {
        let t = compute_timings(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(t.mean_ms, 2.5);
        assert_eq!(t.median_ms, 2.5);
        assert_eq!(t.min_ms, 1.0);
        assert_eq!(t.max_ms, 4.0);
        assert_eq!(t.p99_ms, 4.0);
    }

    #[test]
    fn test_compute_timings_empty() {
        assert_eq!(compute_timings(&[]), TimingSeries::default());
    }

    #[test]
    fn test_small_run_completes() {
        let config = TerrainConfig {
            chunk_size: [8, 8, 8],
            view_distance: [2, 2, 2],
            worker_threads: 2,
            ..Default::default()
        };
        let runner = StreamRunner::new(config, 20, 0.025).expect("runner builds");
        let path = ViewerPath {
            name: "test",
            start: [0.0, 0.0, 0.0],
            velocity: [40.0, 0.0, 0.0],
        };
        let result = runner.run_path(&path).expect("path runs");
        assert_eq!(result.initial_chunks, 8);
        assert_eq!(result.tick_count, 20);
        assert_eq!(result.chunks_created, result.chunks_evicted);
        assert!(result.chunks_completed <= 20);
    }
}
