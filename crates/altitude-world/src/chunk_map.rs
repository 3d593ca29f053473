use std::collections::HashMap;

use altitude_core::types::ChunkCoord;

use crate::chunk::TerrainChunk;
use crate::state_machine::ChunkState;

/// Chunk totals by lifecycle state, for debug display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkCounts {
    pub total: usize,
    /// Scheduled, ValueReady or Queued.
    pub pending: usize,
    pub queued: usize,
    pub generated: usize,
}

/// Spatial container for every resident chunk, keyed by exact coordinate.
#[derive(Default)]
pub struct ChunkMap {
    chunks: HashMap<ChunkCoord, TerrainChunk>,
}

impl ChunkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chunk under its own coordinate. Returns the chunk it
    /// replaced, if any.
    pub fn insert(&mut self, chunk: TerrainChunk) -> Option<TerrainChunk> {
        self.chunks.insert(chunk.coord(), chunk)
    }

    pub fn remove(&mut self, coord: &ChunkCoord) -> Option<TerrainChunk> {
        self.chunks.remove(coord)
    }

    pub fn get(&self, coord: &ChunkCoord) -> Option<&TerrainChunk> {
        self.chunks.get(coord)
    }

    pub fn get_mut(&mut self, coord: &ChunkCoord) -> Option<&mut TerrainChunk> {
        self.chunks.get_mut(coord)
    }

    pub fn contains(&self, coord: &ChunkCoord) -> bool {
        self.chunks.contains_key(coord)
    }

    /// Snapshot of the keys, so callers can mutate the map while walking it.
    pub fn coords(&self) -> Vec<ChunkCoord> {
        self.chunks.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChunkCoord, &TerrainChunk)> {
        self.chunks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ChunkCoord, &mut TerrainChunk)> {
        self.chunks.iter_mut()
    }

    /// Remove every chunk, handing ownership to the caller.
    pub fn drain(&mut self) -> impl Iterator<Item = (ChunkCoord, TerrainChunk)> + '_ {
        self.chunks.drain()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn counts(&self) -> ChunkCounts {
        let mut counts = ChunkCounts {
            total: self.chunks.len(),
            ..Default::default()
        };
        for chunk in self.chunks.values() {
            let state = chunk.state();
            if state.is_pending() {
                counts.pending += 1;
            }
            match state {
                ChunkState::Queued => counts.queued += 1,
                ChunkState::Generated => counts.generated += 1,
                _ => {}
            }
        }
        counts
    }
}
