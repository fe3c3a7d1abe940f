//! In-memory stat accumulators
//!
//! All buffers share the same contract: add/set is O(1) with no I/O,
//! `reset` deletes entries outright (a reset buffer produces zero writes on
//! the next flush), and `purge_channel` drops every entry under one channel.

pub mod active_times;
pub mod line_counts;
pub mod monologue;
pub mod quotes;
pub mod text_stats;

pub use active_times::ActiveTimesBuffer;
pub use line_counts::{LineCountsBuffer, StatType};
pub use monologue::MonologueMonitor;
pub use quotes::QuoteBuffer;
pub use text_stats::{TextStatsBuffer, TextTotals};

use crate::ident::Channel;

/// The four persistable buffers, bundled for the flush path.
#[derive(Debug, Default)]
pub struct StatBuffers {
    pub line_counts: LineCountsBuffer,
    pub text_stats: TextStatsBuffer,
    pub active_times: ActiveTimesBuffer,
    pub quotes: QuoteBuffer,
}

impl StatBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.line_counts.is_empty()
            && self.text_stats.is_empty()
            && self.active_times.is_empty()
            && self.quotes.is_empty()
    }

    pub fn reset(&mut self) {
        self.line_counts.reset();
        self.text_stats.reset();
        self.active_times.reset();
        self.quotes.reset();
    }

    pub fn purge_channel(&mut self, channel: &Channel) {
        self.line_counts.purge_channel(channel);
        self.text_stats.purge_channel(channel);
        self.active_times.purge_channel(channel);
        self.quotes.purge_channel(channel);
    }
}
