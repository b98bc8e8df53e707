//! Event queue and simulation clock for the simulated print queue

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use webprint_shared::JobId;

/// A state change scheduled for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimEvent {
    pub timestamp: Duration,
    pub job_id: JobId,
    pub state: &'static str,
    pub reason: &'static str,
}

// Earliest timestamp first; ties keep job id order so runs are reproducible.
impl PartialOrd for SimEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for SimEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.job_id.cmp(&self.job_id))
    }
}

#[derive(Debug, Default)]
pub struct SimEventQueue {
    queue: BinaryHeap<SimEvent>,
}

impl SimEventQueue {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
        }
    }
    pub fn push(&mut self, event: SimEvent) {
        self.queue.push(event);
    }
    /// Pops the earliest event if it is due at `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<SimEvent> {
        if self.queue.peek()?.timestamp <= now {
            self.queue.pop()
        } else {
            None
        }
    }
    /// Drops every pending event for `job_id`.
    pub fn discard_job(&mut self, job_id: JobId) {
        self.queue.retain(|e| e.job_id != job_id);
    }
    pub fn len(&self) -> usize {
        self.queue.len()
    }
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Simulation clock
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    pub current_time: Duration,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            current_time: Duration::from_secs(0),
        }
    }
    pub fn advance(&mut self, dt: Duration) {
        self.current_time += dt;
    }
    /// Moves forward to `t`; never moves backwards.
    pub fn advance_to(&mut self, t: Duration) {
        if t > self.current_time {
            self.current_time = t;
        }
    }
}
