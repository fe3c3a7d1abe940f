//! Event handling: which counters does each inbound event feed
//!
//! The recorder owns the stat buffers and the monologue monitor. Every
//! handler filters first (untracked channel, ignored nick, self-originated,
//! command-prefixed) and only then touches the buffers, so a discarded event
//! costs nothing at flush time.

use crate::classify::MessageClassifier;
use crate::events::{ChatEvent, KickEvent, ModeEvent, Polarity, PresenceEvent};
use crate::ident::{Channel, Context, Nick};
use crate::roster::{ChannelRoster, IgnoreList};
use crate::stats::{MonologueMonitor, StatBuffers, StatType};
use chrono::Timelike;

pub struct StatRecorder {
    classifier: MessageClassifier,
    buffers: StatBuffers,
    monologues: MonologueMonitor,
    command_prefix: char,
}

impl StatRecorder {
    pub fn new(command_prefix: char) -> Self {
        Self {
            classifier: MessageClassifier::new(),
            buffers: StatBuffers::new(),
            monologues: MonologueMonitor::new(),
            command_prefix,
        }
    }

    pub fn buffers(&self) -> &StatBuffers {
        &self.buffers
    }

    /// Clears the persistable buffers. Called only after a confirmed commit.
    pub fn reset_buffers(&mut self) {
        self.buffers.reset();
    }

    /// Drops all buffered and transient state for a removed channel.
    pub fn purge_channel(&mut self, channel: &Channel) {
        self.buffers.purge_channel(channel);
        self.monologues.purge_channel(channel);
    }

    pub fn handle_chat(&mut self, roster: &ChannelRoster, ignores: &IgnoreList, event: &ChatEvent) {
        // Messages for the bot itself are commands, not content.
        if event.text.starts_with(self.command_prefix) {
            return;
        }
        if event.is_self {
            return;
        }
        let Some(channel) = tracked_channel(roster, &event.channel) else {
            return;
        };
        let nick = Nick::new(&event.from);
        if ignores.is_ignored(&Context::channel(&channel), &nick) {
            return;
        }

        let hour = chrono::Local::now().hour() as u8;
        self.record_chat(&nick, &channel, &event.text, hour);
    }

    /// Buffer updates for an accepted chat message. The hour is injected so
    /// tests can pin the histogram bucket.
    pub fn record_chat(&mut self, nick: &Nick, channel: &Channel, message: &str, hour: u8) {
        self.monologues.spoke(channel, nick);
        if self.monologues.is_becoming_monologue(channel) {
            self.buffers.line_counts.add(channel, nick, StatType::Monologue);
        }

        self.buffers.text_stats.add(
            nick,
            channel,
            1,
            self.classifier.word_count(message),
            message.len() as u64,
        );

        self.buffers.active_times.add(nick, channel, hour);

        if self.classifier.is_profane(message) {
            self.buffers.line_counts.add(channel, nick, StatType::Profanity);
        }

        if self.classifier.is_action(message) {
            self.buffers.line_counts.add(channel, nick, StatType::Action);

            if self.classifier.is_violent_action(message) {
                self.buffers.line_counts.add(channel, nick, StatType::Violence);
            }
        } else {
            // Actions are never quotable.
            self.buffers.quotes.set(nick, channel, message);
        }

        if self.classifier.is_question(message) {
            self.buffers.line_counts.add(channel, nick, StatType::Question);
        }
        if self.classifier.is_shouting(message) {
            self.buffers.line_counts.add(channel, nick, StatType::Shout);
        }
        if self.classifier.is_all_caps(message) {
            self.buffers.line_counts.add(channel, nick, StatType::Caps);
        }
        if self.classifier.is_smile(message) {
            self.buffers.line_counts.add(channel, nick, StatType::Smile);
        }
        if self.classifier.is_frown(message) {
            self.buffers.line_counts.add(channel, nick, StatType::Frown);
        }
    }

    /// Victim and perpetrator are counted independently; either side can be
    /// ignored without suppressing the other.
    pub fn handle_kick(&mut self, roster: &ChannelRoster, ignores: &IgnoreList, event: &KickEvent) {
        let Some(channel) = tracked_channel(roster, &event.channel) else {
            return;
        };
        let context = Context::channel(&channel);
        let victim = Nick::new(&event.victim);
        let kicker = Nick::new(&event.kicker);

        if !ignores.is_ignored(&context, &victim) {
            self.buffers
                .line_counts
                .add(&channel, &victim, StatType::KickVictim);
        }
        if !ignores.is_ignored(&context, &kicker) {
            self.buffers
                .line_counts
                .add(&channel, &kicker, StatType::KickPerpetrator);
        }
    }

    /// `stat_type` is Join or Part depending on the event variant.
    pub fn handle_presence(
        &mut self,
        roster: &ChannelRoster,
        ignores: &IgnoreList,
        event: &PresenceEvent,
        stat_type: StatType,
    ) {
        if event.is_self {
            return;
        }
        let Some(channel) = tracked_channel(roster, &event.channel) else {
            return;
        };
        let nick = Nick::new(&event.nick);
        if ignores.is_ignored(&Context::channel(&channel), &nick) {
            return;
        }

        self.buffers.line_counts.add(&channel, &nick, stat_type);
    }

    /// Only operator-flag changes count, attributed to the issuer.
    pub fn handle_mode(&mut self, roster: &ChannelRoster, ignores: &IgnoreList, event: &ModeEvent) {
        if event.is_self {
            return;
        }
        let Some(channel) = tracked_channel(roster, &event.channel) else {
            return;
        };
        let nick = Nick::new(&event.nick);
        if ignores.is_ignored(&Context::channel(&channel), &nick) {
            return;
        }

        for change in &event.changes {
            if change.mode == 'o' {
                let stat_type = match change.polarity {
                    Polarity::Grant => StatType::DonatedOps,
                    Polarity::Revoke => StatType::RevokedOps,
                };
                self.buffers.line_counts.add(&channel, &nick, stat_type);
            }
        }
    }
}

fn tracked_channel(roster: &ChannelRoster, raw: &str) -> Option<Channel> {
    let channel = match Channel::parse(raw) {
        Ok(channel) => channel,
        Err(err) => {
            log::warn!("Discarding event with unusable channel name {:?}: {}", raw, err);
            return None;
        }
    };
    roster.has(&channel).then_some(channel)
}
