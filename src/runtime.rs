//! Application wiring: one task owns everything
//!
//! Events and flush ticks arrive on the same channel, so buffer mutation and
//! persistence are serialized without any locking. A flush that fails leaves
//! the buffers and the schedule untouched; the next due tick retries with the
//! accumulated deltas plus whatever arrived in between.

use crate::events::Event;
use crate::ident::{Channel, Context, Nick};
use crate::persistence::{PersistOutcome, StatsStore, StoreError};
use crate::recorder::StatRecorder;
use crate::roster::{ChannelRoster, IgnoreList};
use crate::scheduler::FlushScheduler;
use crate::stats::StatType;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// What the run loop consumes: decoded transport events, plus the periodic
/// tick that drives flushing.
#[derive(Debug)]
pub enum Inbound {
    Event(Event),
    Tick,
}

#[derive(Debug)]
pub enum ControlError {
    /// The context names a channel that is not tracked.
    InvalidContext(String),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::InvalidContext(name) => {
                write!(f, "Invalid channel/context: {}", name)
            }
        }
    }
}

impl std::error::Error for ControlError {}

pub struct App<S: StatsStore> {
    recorder: StatRecorder,
    roster: ChannelRoster,
    ignores: IgnoreList,
    store: S,
    scheduler: FlushScheduler,
}

impl<S: StatsStore> App<S> {
    pub fn new(store: S, command_prefix: char, write_interval: Duration) -> Self {
        Self {
            recorder: StatRecorder::new(command_prefix),
            roster: ChannelRoster::new(),
            ignores: IgnoreList::new(),
            store,
            scheduler: FlushScheduler::new(write_interval),
        }
    }

    /// Builds an app seeded from the store: tracked channels and ignore
    /// lists survive restarts.
    pub async fn boot(
        mut store: S,
        command_prefix: char,
        write_interval: Duration,
    ) -> Result<Self, StoreError> {
        let channels = store.load_channels().await?;
        let ignores = store.load_ignore_list().await?;

        let mut app = Self::new(store, command_prefix, write_interval);
        app.ignores = ignores;
        for channel in channels {
            app.roster.add(channel);
        }

        log::info!(
            "Booted with {} tracked channel{}",
            app.roster.len(),
            if app.roster.len() == 1 { "" } else { "s" },
        );

        Ok(app)
    }

    pub fn channels(&self) -> &[Channel] {
        self.roster.channels()
    }

    pub fn has_channel(&self, channel: &Channel) -> bool {
        self.roster.has(channel)
    }

    pub fn add_channel(&mut self, channel: Channel) -> bool {
        if self.roster.has(&channel) {
            return false;
        }
        log::info!("Now recording stats for {}", channel);
        self.roster.add(channel);
        true
    }

    /// Stops tracking a channel and purges every buffered counter, the
    /// monologue run and the in-memory ignore entries for it. The stored
    /// rows go on the next flush's reconciliation.
    pub fn remove_channel(&mut self, channel: &Channel) -> bool {
        let Some(removed) = self.roster.remove(channel) else {
            return false;
        };
        self.recorder.purge_channel(&removed);
        self.ignores.purge_channel(&removed);
        log::info!("Stopped recording stats for {}", removed);
        true
    }

    /// Adds an ignore entry to exactly the named scope. Returns false when
    /// the nick was already directly ignored there.
    pub fn add_ignored_nick(
        &mut self,
        context: &Context,
        nick: Nick,
    ) -> Result<bool, ControlError> {
        self.validate_context(context)?;
        if self.ignores.is_ignored_in(context, &nick) {
            return Ok(false);
        }
        log::info!("Ignoring {} {}", nick, context.locative());
        self.ignores.add(context, nick);
        Ok(true)
    }

    pub fn remove_ignored_nick(
        &mut self,
        context: &Context,
        nick: &Nick,
    ) -> Result<bool, ControlError> {
        self.validate_context(context)?;
        if !self.ignores.is_ignored_in(context, nick) {
            return Ok(false);
        }
        self.ignores.remove(context, nick);
        log::info!("No longer ignoring {} {}", nick, context.locative());
        Ok(true)
    }

    /// Direct entries of the named scope only.
    pub fn ignored_nicks(&self, context: &Context) -> Result<Vec<Nick>, ControlError> {
        self.validate_context(context)?;
        Ok(self.ignores.list(context))
    }

    pub fn is_ignored_nick(&self, context: &Context, nick: &Nick) -> bool {
        self.ignores.is_ignored(context, nick)
    }

    fn validate_context(&self, context: &Context) -> Result<(), ControlError> {
        match context {
            Context::Global => Ok(()),
            Context::Channel(channel) if self.roster.has(channel) => Ok(()),
            Context::Channel(channel) => {
                Err(ControlError::InvalidContext(channel.canonical().to_string()))
            }
        }
    }

    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Chat(chat) => self.recorder.handle_chat(&self.roster, &self.ignores, chat),
            Event::Kick(kick) => self.recorder.handle_kick(&self.roster, &self.ignores, kick),
            Event::Join(presence) => {
                self.recorder
                    .handle_presence(&self.roster, &self.ignores, presence, StatType::Join)
            }
            Event::Part(presence) => {
                self.recorder
                    .handle_presence(&self.roster, &self.ignores, presence, StatType::Part)
            }
            Event::Mode(mode) => self.recorder.handle_mode(&self.roster, &self.ignores, mode),
        }
    }

    /// Scheduler-gated flush, driven by the periodic tick.
    pub async fn tick(&mut self) {
        if !self.scheduler.is_due(Instant::now()) {
            return;
        }
        if let Err(err) = self.flush().await {
            log::error!("Flush failed, keeping buffers for retry: {}", err);
        }
    }

    /// One reconciliation + commit. Buffers reset and the schedule advances
    /// only on success.
    pub async fn flush(&mut self) -> Result<PersistOutcome, StoreError> {
        let outcome = self
            .store
            .persist(
                self.recorder.buffers(),
                self.roster.channels(),
                &self.ignores,
            )
            .await?;

        self.recorder.reset_buffers();
        self.scheduler.mark_flushed(Instant::now());

        Ok(outcome)
    }

    pub async fn run(mut self, mut rx: mpsc::Receiver<Inbound>) {
        while let Some(inbound) = rx.recv().await {
            match inbound {
                Inbound::Event(event) => self.handle_event(&event),
                Inbound::Tick => self.tick().await,
            }
        }

        // Feed closed; push out whatever is still buffered.
        if let Err(err) = self.flush().await {
            log::error!("Final flush failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChatEvent;
    use crate::persistence::SqliteStore;
    use crate::stats::StatBuffers;
    use async_trait::async_trait;

    fn chan(name: &str) -> Channel {
        Channel::parse(name).unwrap()
    }

    fn chat(from: &str, channel: &str, text: &str) -> Event {
        Event::Chat(ChatEvent {
            from: from.to_string(),
            channel: channel.to_string(),
            text: text.to_string(),
            is_self: false,
        })
    }

    /// Real store behind a wrapper that fails the first N persist calls.
    struct FailingOnceStore {
        inner: SqliteStore,
        failures_left: usize,
    }

    #[async_trait]
    impl StatsStore for FailingOnceStore {
        async fn persist(
            &mut self,
            buffers: &StatBuffers,
            channels: &[Channel],
            ignores: &IgnoreList,
        ) -> Result<PersistOutcome, StoreError> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(StoreError::UnknownChannel("#rust".to_string()));
            }
            self.inner.persist(buffers, channels, ignores).await
        }

        async fn load_channels(&mut self) -> Result<Vec<Channel>, StoreError> {
            self.inner.load_channels().await
        }

        async fn load_ignore_list(&mut self) -> Result<IgnoreList, StoreError> {
            self.inner.load_ignore_list().await
        }
    }

    async fn app() -> App<SqliteStore> {
        App::new(
            SqliteStore::open_in_memory().unwrap(),
            '!',
            Duration::from_secs(0),
        )
    }

    #[tokio::test]
    async fn test_ignore_management_validates_context() {
        let mut app = app().await;
        app.add_channel(chan("#rust"));

        let tracked = Context::channel(&chan("#rust"));
        let untracked = Context::channel(&chan("#nope"));

        assert!(app.add_ignored_nick(&tracked, Nick::new("bob")).unwrap());
        assert!(!app.add_ignored_nick(&tracked, Nick::new("BOB")).unwrap());
        assert!(app
            .add_ignored_nick(&untracked, Nick::new("bob"))
            .is_err());
        assert!(app.add_ignored_nick(&Context::Global, Nick::new("pest")).unwrap());
    }

    #[tokio::test]
    async fn test_global_add_not_blocked_by_channel_entry() {
        let mut app = app().await;
        app.add_channel(chan("#rust"));

        let ctx = Context::channel(&chan("#rust"));
        app.add_ignored_nick(&ctx, Nick::new("bob")).unwrap();

        // The strict check consults only the named scope, so a channel entry
        // does not shadow a global add (and vice versa).
        assert!(app.add_ignored_nick(&Context::Global, Nick::new("bob")).unwrap());
        assert!(app.remove_ignored_nick(&ctx, &Nick::new("bob")).unwrap());
        assert!(app.is_ignored_nick(&ctx, &Nick::new("bob")));
    }

    #[tokio::test]
    async fn test_remove_channel_purges_ignores() {
        let mut app = app().await;
        app.add_channel(chan("#rust"));
        let ctx = Context::channel(&chan("#rust"));
        app.add_ignored_nick(&ctx, Nick::new("bob")).unwrap();

        assert!(app.remove_channel(&chan("#RUST")));
        assert!(!app.remove_channel(&chan("#rust")));
        assert!(!app.ignores.is_ignored_in(&ctx, &Nick::new("bob")));
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_buffers_for_retry() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("behold.db");

        let store = FailingOnceStore {
            inner: SqliteStore::open(&db_path).unwrap(),
            failures_left: 1,
        };
        let mut app = App::new(store, '!', Duration::from_secs(0));
        app.add_channel(chan("#rust"));

        app.handle_event(&chat("Alice", "#rust", "tea is hot"));
        assert!(app.flush().await.is_err());

        // The failed attempt kept the first delta; the retry commits both
        // messages in one flush.
        app.handle_event(&chat("Alice", "#rust", "pot is big"));
        let outcome = app.flush().await.unwrap();
        assert!(!outcome.is_noop());

        let conn = rusqlite::Connection::open(&db_path).unwrap();
        let messages: i64 = conn
            .query_row(
                "SELECT messages FROM behold_text_stats WHERE nick = 'alice'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(messages, 2);

        // Buffers were reset on the successful commit, exactly once.
        assert!(app.flush().await.unwrap().is_noop());
    }

    #[tokio::test]
    async fn test_boot_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("behold.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            let mut app = App::new(store, '!', Duration::from_secs(0));
            app.add_channel(chan("#rust"));
            app.add_ignored_nick(&Context::Global, Nick::new("pest"))
                .unwrap();
            app.flush().await.unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        let app = App::boot(store, '!', Duration::from_secs(0)).await.unwrap();

        assert!(app.has_channel(&chan("#rust")));
        assert!(app.is_ignored_nick(&Context::Global, &Nick::new("pest")));
    }
}
