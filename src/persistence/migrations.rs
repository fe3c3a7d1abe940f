//! Versioned schema migrations
//!
//! Each entry is one schema version; `PRAGMA user_version` records the last
//! applied version so reopening an up-to-date database does nothing. Every
//! version runs inside its own transaction.

use rusqlite::Connection;

const MIGRATIONS: &[&[&str]] = &[
    // v1: full schema
    &[
        "CREATE TABLE behold_channels (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            normalized_channel TEXT UNIQUE NOT NULL,
            canonical_channel TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        "CREATE TABLE behold_canonical_nicks (
            normalized_nick TEXT NOT NULL PRIMARY KEY,
            canonical_nick TEXT NOT NULL DEFAULT ''
        )",
        "CREATE TABLE behold_line_counts (
            type INTEGER NOT NULL DEFAULT 0,
            channel_id INTEGER NOT NULL DEFAULT 0,
            nick TEXT NOT NULL DEFAULT '',
            total INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (type, channel_id, nick)
        )",
        "CREATE TABLE behold_text_stats (
            channel_id INTEGER NOT NULL DEFAULT 0,
            nick TEXT NOT NULL DEFAULT '',
            messages INTEGER NOT NULL DEFAULT 0,
            words INTEGER NOT NULL DEFAULT 0,
            chars INTEGER NOT NULL DEFAULT 0,
            avg_words REAL NOT NULL DEFAULT 0.0,
            avg_chars REAL NOT NULL DEFAULT 0.0,
            PRIMARY KEY (channel_id, nick)
        )",
        "CREATE TABLE behold_active_times (
            channel_id INTEGER NOT NULL DEFAULT 0,
            nick TEXT NOT NULL DEFAULT '',
            hour INTEGER NOT NULL DEFAULT 0,
            total INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (channel_id, nick, hour)
        )",
        "CREATE TABLE behold_latest_quote (
            channel_id INTEGER NOT NULL DEFAULT 0,
            nick TEXT NOT NULL DEFAULT '',
            quote TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (channel_id, nick)
        )",
        "CREATE TABLE behold_ignored_nicks (
            channel_id INTEGER NOT NULL DEFAULT 0,
            normalized_nick TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (normalized_nick, channel_id)
        )",
        "CREATE TABLE behold_ignored_nicks_global (
            normalized_nick TEXT NOT NULL DEFAULT '' PRIMARY KEY
        )",
    ],
];

pub fn run_migrations(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (index, batch) in MIGRATIONS.iter().enumerate() {
        let version = index as i64 + 1;
        if version <= current {
            continue;
        }

        let tx = conn.transaction()?;
        for sql in batch.iter() {
            tx.execute_batch(sql)?;
        }
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;

        log::info!("Applied schema migration v{}", version);
    }

    Ok(())
}
