// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Debounced recompute scheduling
//!
//! A recompute request arms a deadline one quiescence window in the future.
//! Every further request before the deadline pushes it back and bumps the
//! generation, so a burst of edits collapses into one recompute that runs
//! once the burst has been quiet for a full window. Nothing is queued.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Time source for the scheduler
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for deterministic tests and replay tools
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        *elapsed += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + *elapsed
    }
}

/// Timer plus generation counter
#[derive(Debug, Clone)]
pub struct RecomputeScheduler {
    window: Duration,
    deadline: Option<Instant>,
    generation: u64,
}

impl RecomputeScheduler {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            generation: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Arm (or re-arm) the timer. Supersedes any pending request.
    pub fn request(&mut self, now: Instant) -> u64 {
        self.generation += 1;
        self.deadline = Some(now + self.window);
        self.generation
    }

    /// Generation of the latest request
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.map_or(false, |deadline| now >= deadline)
    }

    /// Disarm the timer if its deadline has passed, returning the generation
    /// the caller is now responsible for computing
    pub fn take_due(&mut self, now: Instant) -> Option<u64> {
        if self.is_due(now) {
            self.deadline = None;
            Some(self.generation)
        } else {
            None
        }
    }

    /// Disarm the timer regardless of its deadline
    pub fn take(&mut self) -> Option<u64> {
        self.deadline.take().map(|_| self.generation)
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a result computed for `generation` is still the latest
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}
