//! Typed event counter buffer

use crate::ident::{Channel, Nick};
use std::collections::HashMap;

/// Category of a counted event. The discriminants are the stable `type` codes
/// stored in the line-counts table; never renumber them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatType {
    Join = 1,
    Part = 2,
    KickVictim = 3,
    KickPerpetrator = 4,
    Monologue = 5,
    Profanity = 6,
    Action = 7,
    Violence = 8,
    Question = 9,
    Shout = 10,
    Caps = 11,
    Smile = 12,
    Frown = 13,
    DonatedOps = 14,
    RevokedOps = 15,
}

impl StatType {
    pub fn code(self) -> i64 {
        self as i64
    }
}

/// In-memory accumulator keyed by (type, channel, nick).
#[derive(Debug, Default)]
pub struct LineCountsBuffer {
    data: HashMap<(StatType, Channel, Nick), u64>,
}

impl LineCountsBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, channel: &Channel, nick: &Nick, stat_type: StatType) {
        self.add_amount(channel, nick, stat_type, 1);
    }

    pub fn add_amount(&mut self, channel: &Channel, nick: &Nick, stat_type: StatType, amount: u64) {
        // 0 values would only generate needless database writes
        if amount == 0 {
            return;
        }
        *self
            .data
            .entry((stat_type, channel.clone(), nick.clone()))
            .or_insert(0) += amount;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(StatType, Channel, Nick), &u64)> {
        self.data.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, channel: &Channel, nick: &Nick, stat_type: StatType) -> u64 {
        self.data
            .get(&(stat_type, channel.clone(), nick.clone()))
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
