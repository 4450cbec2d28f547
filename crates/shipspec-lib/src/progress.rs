//! Progress reporting contract shared by the collector, deriver and pipeline.
//!
//! A sink receives `(total, count)` pairs. Within one stage `count` never
//! decreases and ends at `total` when the stage completes.

use serde::Serialize;

/// Receives `(total, count)` progress updates.
pub trait ProgressSink {
    fn update(&mut self, total: u64, count: u64);
}

impl<F> ProgressSink for F
where
    F: FnMut(u64, u64),
{
    fn update(&mut self, total: u64, count: u64) {
        self(total, count)
    }
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _total: u64, _count: u64) {}
}

/// Snapshot of one stage's progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: u64,
    pub count: u64,
}

impl Progress {
    pub fn new(total: u64, count: u64) -> Self {
        Self { total, count }
    }

    /// Completion percentage rounded to one decimal; 0 while the total is unknown.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let ratio = self.count as f64 / self.total as f64 * 100.0;
        (ratio * 10.0).round() / 10.0
    }
}
