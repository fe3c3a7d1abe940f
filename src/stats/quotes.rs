//! Latest-quote buffer: last value wins, no accumulation

use crate::ident::{Channel, Nick};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct QuoteBuffer {
    data: HashMap<(Nick, Channel), String>,
}

impl QuoteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, nick: &Nick, channel: &Channel, quote: &str) {
        self.data
            .insert((nick.clone(), channel.clone()), quote.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(Nick, Channel), &String)> {
        self.data.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, nick: &Nick, channel: &Channel) -> Option<&String> {
        self.data.get(&(nick.clone(), channel.clone()))
    }

    pub fn reset(&mut self) {
        self.data.clear();
    }

    pub fn purge_channel(&mut self, channel: &Channel) {
        self.data.retain(|(_, chan), _| chan != channel);
    }
}
