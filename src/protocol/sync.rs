use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Barrier;

/// Round coordination shared by every node task.
///
/// Each round has two barrier points. At the first one every send of the round has completed.
/// At the second one every node has drained, relaxed and reported whether its table changed.
/// Change counters alternate by round parity. A counter is reset by the leader of the first
/// barrier one round before it is reused, so no node is still reading it.
#[derive(Debug)]
pub struct RoundSync {
    barrier: Barrier,
    changes: [AtomicUsize; 2],
    aborted: AtomicBool,
}

impl RoundSync {
    pub fn new(participants: usize) -> Self {
        Self {
            barrier: Barrier::new(participants),
            changes: [AtomicUsize::new(0), AtomicUsize::new(0)],
            aborted: AtomicBool::new(false),
        }
    }

    /// Waits until every node has finished broadcasting for `round`.
    pub async fn sends_complete(&self, round: usize) {
        if self.barrier.wait().await.is_leader() {
            self.changes[(round + 1) % 2].store(0, Ordering::SeqCst);
        }
    }

    pub fn record_change(&self, round: usize) {
        self.changes[round % 2].fetch_add(1, Ordering::SeqCst);
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    /// Waits until every node has relaxed for `round`, then returns the verdict all nodes share.
    pub async fn round_complete(&self, round: usize) -> RoundVerdict {
        self.barrier.wait().await;
        if self.aborted.load(Ordering::SeqCst) {
            RoundVerdict::Aborted
        } else if self.changes[round % 2].load(Ordering::SeqCst) == 0 {
            RoundVerdict::Converged
        } else {
            RoundVerdict::Continue
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundVerdict {
    Continue,
    Converged,
    Aborted,
}
