//! Message/word/character totals per (nick, channel)
//!
//! Only the running sums live here. Average word and character lengths depend
//! on the post-merge totals in the store, so they are derived at flush time,
//! never accumulated incrementally.

use crate::ident::{Channel, Nick};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextTotals {
    pub messages: u64,
    pub words: u64,
    pub chars: u64,
}

#[derive(Debug, Default)]
pub struct TextStatsBuffer {
    data: HashMap<(Nick, Channel), TextTotals>,
}

impl TextStatsBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, nick: &Nick, channel: &Channel, messages: u64, words: u64, chars: u64) {
        let totals = self
            .data
            .entry((nick.clone(), channel.clone()))
            .or_default();
        totals.messages += messages;
        totals.words += words;
        totals.chars += chars;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(Nick, Channel), &TextTotals)> {
        self.data.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, nick: &Nick, channel: &Channel) -> Option<TextTotals> {
        self.data.get(&(nick.clone(), channel.clone())).copied()
    }

    pub fn reset(&mut self) {
        self.data.clear();
    }

    pub fn purge_channel(&mut self, channel: &Channel) {
        self.data.retain(|(_, chan), _| chan != channel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chan(name: &str) -> Channel {
        Channel::parse(name).unwrap()
    }

    #[test]
    fn test_totals_accumulate() {
        let mut buffer = TextStatsBuffer::new();
        let bob = Nick::new("Bob");
        let rust = chan("#rust");

        buffer.add(&bob, &rust, 1, 3, 10);
        buffer.add(&bob, &rust, 1, 3, 10);

        let totals = buffer.get(&bob, &rust).unwrap();
        assert_eq!(totals.messages, 2);
        assert_eq!(totals.words, 6);
        assert_eq!(totals.chars, 20);
    }

    #[test]
    fn test_reset_and_purge() {
        let mut buffer = TextStatsBuffer::new();
        let bob = Nick::new("Bob");
        buffer.add(&bob, &chan("#rust"), 1, 2, 3);
        buffer.add(&bob, &chan("#ops"), 1, 2, 3);

        buffer.purge_channel(&chan("#rust"));
        assert!(buffer.get(&bob, &chan("#rust")).is_none());
        assert!(buffer.get(&bob, &chan("#ops")).is_some());

        buffer.reset();
        assert!(buffer.is_empty());
    }
}
