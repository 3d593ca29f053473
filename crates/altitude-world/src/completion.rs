use std::collections::VecDeque;

use altitude_core::types::{ChunkCoord, ChunkId};

/// FIFO of chunks waiting for mesh extraction, gated by a fixed-interval
/// countdown so at most one chunk completes per interval.
#[derive(Debug, Clone)]
pub struct CompletionQueue {
    entries: VecDeque<(ChunkCoord, ChunkId)>,
    interval: f32,
    countdown: f32,
}

impl CompletionQueue {
    pub fn new(interval: f32) -> Self {
        Self {
            entries: VecDeque::new(),
            interval,
            countdown: interval,
        }
    }

    pub fn push(&mut self, coord: ChunkCoord, id: ChunkId) {
        self.entries.push_back((coord, id));
    }

    /// Advance the countdown by `dt`. Returns true when a completion slot
    /// opened this tick. Each slot restarts the full interval, so two slots
    /// are never closer than `interval` apart and overshoot is dropped.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.countdown -= dt;
        if self.countdown > 0.0 {
            return false;
        }
        self.countdown = self.interval;
        true
    }

    pub fn pop_front(&mut self) -> Option<(ChunkCoord, ChunkId)> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
