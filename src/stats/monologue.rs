//! Consecutive-speaker run tracking
//!
//! `is_becoming_monologue` is true only when the run count sits exactly at
//! the threshold, so a monologue is flagged once, not on every message after
//! the fifth.

use crate::ident::{Channel, Nick};
use std::collections::HashMap;

const MONOLOGUE_LENGTH: u32 = 5;

#[derive(Debug, Default)]
pub struct MonologueMonitor {
    runs: HashMap<String, (Nick, u32)>,
}

impl MonologueMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoke(&mut self, channel: &Channel, nick: &Nick) {
        let key = channel.normalized();
        match self.runs.get_mut(&key) {
            Some((last, count)) if last == nick => *count += 1,
            _ => {
                self.runs.insert(key, (nick.clone(), 1));
            }
        }
    }

    pub fn is_becoming_monologue(&self, channel: &Channel) -> bool {
        self.runs
            .get(&channel.normalized())
            .map(|(_, count)| *count == MONOLOGUE_LENGTH)
            .unwrap_or(false)
    }

    pub fn purge_channel(&mut self, channel: &Channel) {
        self.runs.remove(&channel.normalized());
    }
}
