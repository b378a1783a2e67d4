use std::time::{Duration, Instant};

/// What the loop should do after finishing a frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SyncDecision {
    /// Busy-wait until the frame boundary (possibly already past, in which
    /// case the next frame starts immediately and the loop catches up
    /// gradually).
    WaitUntil(Instant),
    /// Simulated time fell behind wall clock by more than the residual
    /// bound; the backlog is dropped and simulated time re-anchored to now
    /// instead of fast-forwarding many substeps.
    DropBacklog { behind: Duration },
}

/// Real-time synchronizer: keeps simulated time marching one fixed frame
/// interval per tick, bounded by `max_residual` of tolerated backlog.
pub struct RealtimeSync {
    sim_time: Instant,
    frame: Duration,
    max_residual: Duration,
}

impl RealtimeSync {
    pub fn new(frame: Duration, max_residual: Duration, now: Instant) -> Self {
        Self { sim_time: now, frame, max_residual }
    }

    /// Re-anchor after a pause so the paused span is not treated as
    /// backlog.
    pub fn reset(&mut self, now: Instant) {
        self.sim_time = now;
    }

    /// Account one simulated frame and decide how to spend the rest of the
    /// wall-clock interval.
    pub fn advance(&mut self, now: Instant) -> SyncDecision {
        self.sim_time += self.frame;
        let behind = now.saturating_duration_since(self.sim_time);
        if behind > self.max_residual {
            self.sim_time = now;
            SyncDecision::DropBacklog { behind }
        } else {
            SyncDecision::WaitUntil(self.sim_time)
        }
    }
}
