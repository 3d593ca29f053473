/// Chunk lifecycle. Transitions only move forward; `Removed` is terminal.
///
/// ```text
/// Unscheduled -> Scheduled -> ValueReady -> Queued -> Generated
///                    \            \           \          \
///                     +------------+-----------+----------+--> Removed
/// ```
///
/// Force-completion may skip `ValueReady`/`Queued`; removal is allowed from
/// every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Created, no sampling job yet.
    Unscheduled,
    /// Density sampling submitted, not finished.
    Scheduled,
    /// Sampling finished; waiting for a completion slot.
    ValueReady,
    /// In the completion queue.
    Queued,
    /// Mesh built and attached.
    Generated,
    /// Deactivated; grid and mesh released.
    Removed,
}

impl ChunkState {
    fn rank(self) -> u8 {
        match self {
            ChunkState::Unscheduled => 0,
            ChunkState::Scheduled => 1,
            ChunkState::ValueReady => 2,
            ChunkState::Queued => 3,
            ChunkState::Generated => 4,
            ChunkState::Removed => 5,
        }
    }

    /// Whether `self -> next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: ChunkState) -> bool {
        match (self, next) {
            (ChunkState::Removed, _) => false,
            (_, ChunkState::Removed) => true,
            (ChunkState::Unscheduled, ChunkState::Scheduled) => true,
            (ChunkState::Unscheduled, _) => false,
            _ => next.rank() > self.rank(),
        }
    }

    /// Sampling has been submitted but no mesh exists yet.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            ChunkState::Scheduled | ChunkState::ValueReady | ChunkState::Queued
        )
    }
}
