//! Hour-of-day activity histogram per (nick, channel)

use crate::ident::{Channel, Nick};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ActiveTimesBuffer {
    data: HashMap<(Nick, Channel, u8), u64>,
}

impl ActiveTimesBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `hour` is the local hour of day, 0-23.
    pub fn add(&mut self, nick: &Nick, channel: &Channel, hour: u8) {
        self.add_amount(nick, channel, hour, 1);
    }

    pub fn add_amount(&mut self, nick: &Nick, channel: &Channel, hour: u8, amount: u64) {
        if amount == 0 {
            return;
        }
        *self
            .data
            .entry((nick.clone(), channel.clone(), hour))
            .or_insert(0) += amount;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(Nick, Channel, u8), &u64)> {
        self.data.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, nick: &Nick, channel: &Channel, hour: u8) -> u64 {
        self.data
            .get(&(nick.clone(), channel.clone(), hour))
            .copied()
            .unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.data.clear();
    }

    pub fn purge_channel(&mut self, channel: &Channel) {
        self.data.retain(|(_, chan, _), _| chan != channel);
    }
}
