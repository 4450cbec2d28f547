//! Request pacing for the encyclopedia API.
//!
//! A [`RateLimiter`] wraps one upstream call. The call and the cooldown start
//! together, and the wrapper returns once both are over, so each call takes
//! `max(latency, cooldown)` of wall-clock time. Calls made back to back are
//! therefore never closer together than the cooldown.

use std::thread;
use std::time::{Duration, Instant};

use crate::config::DEFAULT_COOLDOWN;

/// Paces operations against an upstream rate ceiling.
pub trait RateLimiter {
    /// Run `op` and return its output no earlier than the cooldown allows.
    fn throttle<T, F>(&self, op: F) -> T
    where
        F: FnOnce() -> T;
}

/// Fixed cooldown measured from the moment the operation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCooldown {
    cooldown: Duration,
}

impl FixedCooldown {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    /// Wait still owed once an operation has run for `elapsed`.
    pub fn remaining_after(&self, elapsed: Duration) -> Duration {
        self.cooldown.saturating_sub(elapsed)
    }
}

impl Default for FixedCooldown {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl RateLimiter for FixedCooldown {
    fn throttle<T, F>(&self, op: F) -> T
    where
        F: FnOnce() -> T,
    {
        let started = Instant::now();
        let output = op();
        let remaining = self.remaining_after(started.elapsed());
        if !remaining.is_zero() {
            thread::sleep(remaining);
        }
        output
    }
}

/// No pacing at all; for tests and local fixture sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unthrottled;

impl RateLimiter for Unthrottled {
    fn throttle<T, F>(&self, op: F) -> T
    where
        F: FnOnce() -> T,
    {
        op()
    }
}

impl<L: RateLimiter + ?Sized> RateLimiter for &L {
    fn throttle<T, F>(&self, op: F) -> T
    where
        F: FnOnce() -> T,
    {
        (**self).throttle(op)
    }
}
