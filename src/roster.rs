//! Desired-state configuration: tracked channels and ignore lists
//!
//! These in-memory sets are authoritative; the store is reconciled to match
//! them on every flush, never the other way around.

use crate::ident::{Channel, Context, Nick, GLOBAL_CONTEXT};
use std::collections::{HashMap, HashSet};

/// The set of channels currently tracked.
#[derive(Debug, Default)]
pub struct ChannelRoster {
    channels: Vec<Channel>,
}

impl ChannelRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel; adding one already present is a no-op.
    pub fn add(&mut self, channel: Channel) -> bool {
        if self.has(&channel) {
            return false;
        }
        self.channels.push(channel);
        true
    }

    /// Removes a channel, returning it if it was tracked.
    pub fn remove(&mut self, channel: &Channel) -> Option<Channel> {
        let index = self.channels.iter().position(|c| c == channel)?;
        Some(self.channels.remove(index))
    }

    pub fn has(&self, channel: &Channel) -> bool {
        self.channels.iter().any(|c| c == channel)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Scoped ignore lists: one set per channel context plus the global scope.
#[derive(Debug, Default)]
pub struct IgnoreList {
    entries: HashMap<String, HashSet<Nick>>,
}

impl IgnoreList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, context: &Context, nick: Nick) {
        self.entries
            .entry(context.normalized())
            .or_default()
            .insert(nick);
    }

    pub fn remove(&mut self, context: &Context, nick: &Nick) {
        if let Some(set) = self.entries.get_mut(&context.normalized()) {
            set.remove(nick);
            if set.is_empty() {
                self.entries.remove(&context.normalized());
            }
        }
    }

    /// The context's direct entries only; no implicit global merge.
    pub fn list(&self, context: &Context) -> Vec<Nick> {
        self.entries
            .get(&context.normalized())
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Membership in the named scope only.
    pub fn is_ignored_in(&self, context: &Context, nick: &Nick) -> bool {
        self.entries
            .get(&context.normalized())
            .map(|set| set.contains(nick))
            .unwrap_or(false)
    }

    /// Membership with fallback: the named scope first, then the global
    /// scope unless the query already was global.
    pub fn is_ignored(&self, context: &Context, nick: &Nick) -> bool {
        if self.is_ignored_in(context, nick) {
            return true;
        }
        if context.is_global() {
            return false;
        }
        self.is_ignored_in(&Context::Global, nick)
    }

    /// Drops a removed channel's entries so the next reconciliation deletes
    /// the stored rows rather than waiting on an external manager.
    pub fn purge_channel(&mut self, channel: &Channel) {
        self.entries.remove(&channel.normalized());
    }

    /// Normalized nicks of the global scope.
    pub fn global_nicks(&self) -> HashSet<String> {
        self.entries
            .get(GLOBAL_CONTEXT)
            .map(|set| set.iter().map(Nick::normalized).collect())
            .unwrap_or_default()
    }

    /// Normalized nicks per channel scope (the global scope excluded).
    pub fn channel_scopes(&self) -> HashMap<String, HashSet<String>> {
        self.entries
            .iter()
            .filter(|(scope, _)| scope.as_str() != GLOBAL_CONTEXT)
            .map(|(scope, set)| {
                (
                    scope.clone(),
                    set.iter().map(Nick::normalized).collect(),
                )
            })
            .collect()
    }
}
