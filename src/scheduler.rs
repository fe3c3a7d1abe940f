//! Flush throttling
//!
//! The external tick can arrive at any rate; the scheduler gates persistence
//! to at most once per configured interval. The timestamp advances only when
//! the caller confirms a successful flush, so a failed attempt is retried on
//! the next due tick with everything still buffered.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct FlushScheduler {
    min_interval: Duration,
    last_flush: Option<Instant>,
}

impl FlushScheduler {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_flush: None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_flush {
            None => true,
            Some(last) => now.duration_since(last) >= self.min_interval,
        }
    }

    pub fn mark_flushed(&mut self, now: Instant) {
        self.last_flush = Some(now);
    }
}
