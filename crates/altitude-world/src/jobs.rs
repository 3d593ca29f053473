//! Job runtime seam for density sampling.
//!
//! The controller never blocks on a job during a normal tick: it polls
//! `JobHandle::is_complete` once per tick and only calls `wait` when a
//! chunk must be finished right now (startup, removal, throttled completion).

use std::sync::mpsc::{self, Receiver, TryRecvError};

use rayon::prelude::*;

use crate::error::WorldError;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run a task off the controller's stack.
pub trait JobRuntime: Send + Sync {
    fn spawn(&self, task: Task);
}

/// Runs jobs on a dedicated rayon pool.
pub struct RayonRuntime {
    pool: rayon::ThreadPool,
}

impl RayonRuntime {
    /// Build a pool with `threads` workers (0 = one per core).
    pub fn new(threads: usize) -> Result<Self, WorldError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("density-{i}"))
            .panic_handler(|_| log::error!("Density job panicked; its chunk will be rescheduled"))
            .build()
            .map_err(|e| WorldError::RuntimeBuild(e.to_string()))?;
        log::info!(
            "Density worker pool ready ({} threads)",
            pool.current_num_threads()
        );
        Ok(Self { pool })
    }
}

impl JobRuntime for RayonRuntime {
    fn spawn(&self, task: Task) {
        self.pool.spawn(task);
    }
}

/// Runs every job to completion inside `spawn`. Deterministic; used by tests
/// and by tools that want synchronous generation.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateRuntime;

impl JobRuntime for ImmediateRuntime {
    fn spawn(&self, task: Task) {
        task();
    }
}

enum HandleState<T> {
    Pending(Receiver<T>),
    Ready(T),
    /// The worker dropped its sender without producing a result.
    Lost,
    /// The result was already handed out by `wait`.
    Taken,
}

/// Pollable reference to a submitted job's result.
pub struct JobHandle<T> {
    state: HandleState<T>,
}

impl<T> JobHandle<T> {
    fn pending(rx: Receiver<T>) -> Self {
        Self {
            state: HandleState::Pending(rx),
        }
    }

    /// Non-blocking poll. True once the job has finished, failed, or its
    /// result was already taken; polling a spent handle is a no-op.
    pub fn is_complete(&mut self) -> bool {
        let polled = match &self.state {
            HandleState::Pending(rx) => rx.try_recv(),
            _ => return true,
        };
        match polled {
            Ok(value) => {
                self.state = HandleState::Ready(value);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.state = HandleState::Lost;
                true
            }
        }
    }

    /// Block until the result is available and take it. Returns None if the
    /// job was lost or the result was already taken.
    pub fn wait(&mut self) -> Option<T> {
        match std::mem::replace(&mut self.state, HandleState::Taken) {
            HandleState::Pending(rx) => rx.recv().ok(),
            HandleState::Ready(value) => Some(value),
            HandleState::Lost => {
                self.state = HandleState::Lost;
                None
            }
            HandleState::Taken => None,
        }
    }
}

/// Submit a data-parallel loop over `items`, partitioned into batches of
/// `batch_size`. `body` receives each item's linear index. The handle yields
/// the items back once every batch has run.
pub fn parallel_for<T, F>(
    runtime: &dyn JobRuntime,
    items: Vec<T>,
    batch_size: usize,
    body: F,
) -> JobHandle<Vec<T>>
where
    T: Send + 'static,
    F: Fn(usize, &mut T) + Send + Sync + 'static,
{
    let batch_size = batch_size.max(1);
    let (tx, rx) = mpsc::channel();
    runtime.spawn(Box::new(move || {
        let mut items = items;
        items
            .par_chunks_mut(batch_size)
            .enumerate()
            .for_each(|(batch, slice)| {
                let base = batch * batch_size;
                for (offset, item) in slice.iter_mut().enumerate() {
                    body(base + offset, item);
                }
            });
        // A closed receiver means the owner no longer wants the result.
        let _ = tx.send(items);
    }));
    JobHandle::pending(rx)
}
