//! SQLite store: reconciliation plus transactional counter commit
//!
//! The flush works in three steps inside one transaction: synchronize the
//! stored channel set to the desired list (deleting a removed channel
//! cascades over every dependent table), diff the ignore lists per scope,
//! then apply the buffered counter deltas as additive upserts. Counter rows
//! key on (channel id, normalized nick), so replaying the same delta after a
//! rolled-back attempt merges instead of duplicating.

use super::migrations::run_migrations;
use super::{PersistOutcome, StatsStore, StoreError};
use crate::ident::{Channel, Context, Nick};
use crate::roster::IgnoreList;
use crate::stats::StatBuffers;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub struct SqliteStore {
    conn: Connection,
    // Channel table cache (normalized name -> id), dropped whenever channel
    // reconciliation writes anything.
    channels_cache: Option<HashMap<String, i64>>,
}

impl SqliteStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        run_migrations(&mut conn)?;

        log::info!("SQLite database initialized with WAL mode");

        Ok(Self {
            conn,
            channels_cache: None,
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut conn = Connection::open_in_memory()?;
        run_migrations(&mut conn)?;
        Ok(Self {
            conn,
            channels_cache: None,
        })
    }

    fn persist_sync(
        &mut self,
        buffers: &StatBuffers,
        channels: &[Channel],
        ignores: &IgnoreList,
    ) -> Result<PersistOutcome, StoreError> {
        let cached = match self.channels_cache.take() {
            Some(cache) => cache,
            None => fetch_channel_ids(&self.conn)?,
        };

        let tx = self.conn.transaction()?;

        let channel_writes = synchronize_channels(&tx, &cached, channels)?;
        let cached = if channel_writes > 0 {
            fetch_channel_ids(&tx)?
        } else {
            cached
        };

        synchronize_ignore_lists(&tx, &cached, ignores)?;

        let counter_statements = write_counters(&tx, &cached, buffers)?;

        if counter_statements == 0 {
            log::debug!("Nothing to write.");
        } else {
            log::debug!(
                "Writing to database ({} update{})...",
                counter_statements,
                if counter_statements == 1 { "" } else { "s" },
            );
        }

        tx.commit()?;
        self.channels_cache = Some(cached);

        if counter_statements > 0 {
            log::debug!("Database write completed.");
        }

        Ok(PersistOutcome { counter_statements })
    }

    fn load_channels_sync(&self) -> Result<Vec<Channel>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT canonical_channel FROM behold_channels")?;
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let mut channels = Vec::with_capacity(names.len());
        for name in names {
            match Channel::parse(&name) {
                Ok(channel) => channels.push(channel),
                Err(err) => log::warn!("Skipping stored channel {:?}: {}", name, err),
            }
        }
        Ok(channels)
    }

    fn load_ignore_list_sync(&self) -> Result<IgnoreList, StoreError> {
        let mut ignores = IgnoreList::new();

        let mut stmt = self.conn.prepare(
            "SELECT ig.normalized_nick, c.canonical_channel
             FROM behold_ignored_nicks ig
             INNER JOIN behold_channels c ON c.id = ig.channel_id",
        )?;
        let scoped: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<_, _>>()?;
        for (nick, channel) in scoped {
            match Channel::parse(&channel) {
                Ok(channel) => ignores.add(&Context::channel(&channel), Nick::new(&nick)),
                Err(err) => log::warn!("Skipping ignore row for {:?}: {}", channel, err),
            }
        }

        let mut stmt = self
            .conn
            .prepare("SELECT normalized_nick FROM behold_ignored_nicks_global")?;
        let global: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        for nick in global {
            ignores.add(&Context::Global, Nick::new(&nick));
        }

        Ok(ignores)
    }
}

#[async_trait]
impl StatsStore for SqliteStore {
    async fn persist(
        &mut self,
        buffers: &StatBuffers,
        channels: &[Channel],
        ignores: &IgnoreList,
    ) -> Result<PersistOutcome, StoreError> {
        self.persist_sync(buffers, channels, ignores)
    }

    async fn load_channels(&mut self) -> Result<Vec<Channel>, StoreError> {
        self.load_channels_sync()
    }

    async fn load_ignore_list(&mut self) -> Result<IgnoreList, StoreError> {
        self.load_ignore_list_sync()
    }
}

fn fetch_channel_ids(conn: &Connection) -> Result<HashMap<String, i64>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, normalized_channel FROM behold_channels")?;
    let rows: Vec<(i64, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<_, _>>()?;
    Ok(rows.into_iter().map(|(id, name)| (name, id)).collect())
}

fn channel_id(cache: &HashMap<String, i64>, normalized: &str) -> Result<i64, StoreError> {
    cache
        .get(normalized)
        .copied()
        .ok_or_else(|| StoreError::UnknownChannel(normalized.to_string()))
}

/// Converges the stored channel set to the desired one. Returns the number of
/// statements executed so the caller knows to drop its id cache.
fn synchronize_channels(
    conn: &Connection,
    cached: &HashMap<String, i64>,
    desired: &[Channel],
) -> Result<usize, StoreError> {
    let desired_keys: HashSet<String> = desired.iter().map(Channel::normalized).collect();
    let mut writes = 0;

    for (stored_name, stored_id) in cached {
        if desired_keys.contains(stored_name) {
            continue;
        }
        // Removed since the last flush; dependent rows have no independent
        // lifecycle, so they go too.
        for sql in [
            "DELETE FROM behold_line_counts WHERE channel_id = ?1",
            "DELETE FROM behold_active_times WHERE channel_id = ?1",
            "DELETE FROM behold_latest_quote WHERE channel_id = ?1",
            "DELETE FROM behold_text_stats WHERE channel_id = ?1",
            "DELETE FROM behold_ignored_nicks WHERE channel_id = ?1",
            "DELETE FROM behold_channels WHERE id = ?1",
        ] {
            conn.execute(sql, params![stored_id])?;
            writes += 1;
        }
    }

    let now = chrono::Utc::now().timestamp();
    for channel in desired {
        conn.execute(
            "INSERT INTO behold_channels
                (normalized_channel, canonical_channel, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(normalized_channel) DO UPDATE SET
                canonical_channel = excluded.canonical_channel,
                updated_at = excluded.updated_at",
            params![channel.normalized(), channel.canonical(), now],
        )?;
        writes += 1;
    }

    Ok(writes)
}

/// Diffs each ignore scope independently: inserts entries present in memory
/// but not stored, deletes stored entries no longer desired. Global and
/// per-channel scopes never bleed into each other.
fn synchronize_ignore_lists(
    conn: &Connection,
    cached: &HashMap<String, i64>,
    ignores: &IgnoreList,
) -> Result<(), StoreError> {
    let desired_global = ignores.global_nicks();

    let mut stmt = conn.prepare("SELECT normalized_nick FROM behold_ignored_nicks_global")?;
    let stored_global: HashSet<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for nick in desired_global.difference(&stored_global) {
        conn.execute(
            "INSERT INTO behold_ignored_nicks_global (normalized_nick) VALUES (?1)",
            params![nick],
        )?;
    }
    for nick in stored_global.difference(&desired_global) {
        conn.execute(
            "DELETE FROM behold_ignored_nicks_global WHERE normalized_nick = ?1",
            params![nick],
        )?;
    }

    let desired_scoped = ignores.channel_scopes();

    let mut stmt = conn.prepare(
        "SELECT ig.normalized_nick, ig.channel_id, c.normalized_channel
         FROM behold_ignored_nicks ig
         INNER JOIN behold_channels c ON c.id = ig.channel_id",
    )?;
    let rows: Vec<(String, i64, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<Result<_, _>>()?;

    let mut stored_scoped: HashMap<String, HashSet<String>> = HashMap::new();
    for (nick, _, channel) in &rows {
        stored_scoped
            .entry(channel.clone())
            .or_default()
            .insert(nick.clone());
    }

    for (scope, desired_nicks) in &desired_scoped {
        let stored_nicks = stored_scoped.get(scope);
        for nick in desired_nicks {
            if stored_nicks.map(|set| set.contains(nick)).unwrap_or(false) {
                continue;
            }
            conn.execute(
                "INSERT INTO behold_ignored_nicks (channel_id, normalized_nick) VALUES (?1, ?2)",
                params![channel_id(cached, scope)?, nick],
            )?;
        }
    }

    for (nick, stored_channel_id, channel) in &rows {
        let still_desired = desired_scoped
            .get(channel)
            .map(|set| set.contains(nick))
            .unwrap_or(false);
        if !still_desired {
            conn.execute(
                "DELETE FROM behold_ignored_nicks WHERE normalized_nick = ?1 AND channel_id = ?2",
                params![nick, stored_channel_id],
            )?;
        }
    }

    Ok(())
}

/// Applies every buffered delta as an idempotent upsert. Returns the number
/// of statements executed (canonical-nick bookkeeping included); zero means
/// the buffers were empty.
fn write_counters(
    conn: &Connection,
    cached: &HashMap<String, i64>,
    buffers: &StatBuffers,
) -> Result<usize, StoreError> {
    let mut statements = 0;
    let mut recorded_nicks: HashSet<String> = HashSet::new();

    for ((stat_type, channel, nick), total) in buffers.line_counts.iter() {
        statements += record_canonical_nick(conn, nick, &mut recorded_nicks)?;
        conn.execute(
            "INSERT INTO behold_line_counts (type, channel_id, nick, total)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(type, channel_id, nick) DO UPDATE SET
                total = total + excluded.total",
            params![
                stat_type.code(),
                channel_id(cached, &channel.normalized())?,
                nick.normalized(),
                *total as i64,
            ],
        )?;
        statements += 1;
    }

    for ((nick, channel), totals) in buffers.text_stats.iter() {
        statements += record_canonical_nick(conn, nick, &mut recorded_nicks)?;
        // Averages always derive from the post-merge totals, never from the
        // buffered delta alone.
        conn.execute(
            "INSERT INTO behold_text_stats
                (channel_id, nick, messages, words, chars, avg_words, avg_chars)
             VALUES (?1, ?2, ?3, ?4, ?5,
                     CAST(?4 AS REAL) / ?3,
                     CAST(?5 AS REAL) / ?3)
             ON CONFLICT(channel_id, nick) DO UPDATE SET
                messages = messages + excluded.messages,
                words = words + excluded.words,
                chars = chars + excluded.chars,
                avg_words = CAST(words + excluded.words AS REAL)
                    / (messages + excluded.messages),
                avg_chars = CAST(chars + excluded.chars AS REAL)
                    / (messages + excluded.messages)",
            params![
                channel_id(cached, &channel.normalized())?,
                nick.normalized(),
                totals.messages as i64,
                totals.words as i64,
                totals.chars as i64,
            ],
        )?;
        statements += 1;
    }

    for ((nick, channel, hour), total) in buffers.active_times.iter() {
        statements += record_canonical_nick(conn, nick, &mut recorded_nicks)?;
        conn.execute(
            "INSERT INTO behold_active_times (channel_id, nick, hour, total)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(channel_id, nick, hour) DO UPDATE SET
                total = total + excluded.total",
            params![
                channel_id(cached, &channel.normalized())?,
                nick.normalized(),
                *hour as i64,
                *total as i64,
            ],
        )?;
        statements += 1;
    }

    for ((nick, channel), quote) in buffers.quotes.iter() {
        statements += record_canonical_nick(conn, nick, &mut recorded_nicks)?;
        conn.execute(
            "INSERT INTO behold_latest_quote (channel_id, nick, quote)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(channel_id, nick) DO UPDATE SET
                quote = excluded.quote",
            params![
                channel_id(cached, &channel.normalized())?,
                nick.normalized(),
                quote,
            ],
        )?;
        statements += 1;
    }

    Ok(statements)
}

/// Keeps the normalized-to-canonical spelling map fresh; the most recent
/// spelling wins on conflict. One statement per nick per flush.
fn record_canonical_nick(
    conn: &Connection,
    nick: &Nick,
    recorded: &mut HashSet<String>,
) -> Result<usize, StoreError> {
    let normalized = nick.normalized();
    if recorded.contains(&normalized) {
        return Ok(0);
    }

    conn.execute(
        "INSERT INTO behold_canonical_nicks (normalized_nick, canonical_nick)
         VALUES (?1, ?2)
         ON CONFLICT(normalized_nick) DO UPDATE SET
            canonical_nick = excluded.canonical_nick",
        params![normalized, nick.canonical()],
    )?;
    recorded.insert(normalized);
    Ok(1)
}
