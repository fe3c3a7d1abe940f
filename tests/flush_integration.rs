//! End-to-end: JSON events in, committed SQLite rows out.

use behold::events::Event;
use behold::ident::{Channel, Context, Nick};
use behold::persistence::SqliteStore;
use behold::runtime::App;
use rusqlite::Connection;
use std::time::Duration;

fn decode(json: &str) -> Event {
    serde_json::from_str(json).unwrap()
}

fn channel_id(conn: &Connection, normalized: &str) -> i64 {
    conn.query_row(
        "SELECT id FROM behold_channels WHERE normalized_channel = ?1",
        [normalized],
        |row| row.get(0),
    )
    .unwrap()
}

#[tokio::test]
async fn test_event_feed_to_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("behold.db");

    let store = SqliteStore::open(&db_path).unwrap();
    let mut app = App::new(store, '!', Duration::from_secs(0));
    app.add_channel(Channel::parse("#Rust").unwrap());
    app.add_ignored_nick(&Context::Global, Nick::new("Spammer"))
        .unwrap();

    let events = [
        r##"{"kind":"chat","from":"Alice","channel":"#rust","text":"tea is hot"}"##,
        r##"{"kind":"chat","from":"Alice","channel":"#RUST","text":"pot is big"}"##,
        // Discarded: bot command, ignored nick, untracked channel.
        r##"{"kind":"chat","from":"Alice","channel":"#rust","text":"!stats Alice"}"##,
        r##"{"kind":"chat","from":"spammer","channel":"#rust","text":"buy gold"}"##,
        r##"{"kind":"chat","from":"Alice","channel":"#elsewhere","text":"hello"}"##,
        r##"{"kind":"join","nick":"Bob","channel":"#rust"}"##,
        r##"{"kind":"kick","channel":"#rust","kicker":"Op","victim":"Bob"}"##,
        r##"{"kind":"mode","nick":"Op","channel":"#rust",
            "changes":[{"polarity":"+","mode":"o","target":"Alice"}]}"##,
    ];
    for json in events {
        app.handle_event(&decode(json));
    }

    let outcome = app.flush().await.unwrap();
    assert!(!outcome.is_noop());

    let conn = Connection::open(&db_path).unwrap();
    let id = channel_id(&conn, "#rust");

    // Canonical spelling of the channel comes from the roster entry.
    let canonical: String = conn
        .query_row(
            "SELECT canonical_channel FROM behold_channels WHERE id = ?1",
            [id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(canonical, "#Rust");

    let (messages, words, chars, avg_words, avg_chars): (i64, i64, i64, f64, f64) = conn
        .query_row(
            "SELECT messages, words, chars, avg_words, avg_chars
             FROM behold_text_stats WHERE channel_id = ?1 AND nick = 'alice'",
            [id],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )
        .unwrap();
    assert_eq!((messages, words, chars), (2, 6, 20));
    assert!((avg_words - 3.0).abs() < f64::EPSILON);
    assert!((avg_chars - 10.0).abs() < f64::EPSILON);

    let quote: String = conn
        .query_row(
            "SELECT quote FROM behold_latest_quote WHERE channel_id = ?1 AND nick = 'alice'",
            [id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(quote, "pot is big");

    // Join=1, KickVictim=3 for Bob; KickPerpetrator=4, DonatedOps=14 for Op.
    let count = |stat: i64, nick: &str| -> i64 {
        conn.query_row(
            "SELECT total FROM behold_line_counts
             WHERE type = ?1 AND channel_id = ?2 AND nick = ?3",
            rusqlite::params![stat, id, nick],
            |row| row.get(0),
        )
        .unwrap()
    };
    assert_eq!(count(1, "bob"), 1);
    assert_eq!(count(3, "bob"), 1);
    assert_eq!(count(4, "op"), 1);
    assert_eq!(count(14, "op"), 1);

    // Hour histogram has exactly the two accepted messages, whatever the hour.
    let active_total: i64 = conn
        .query_row(
            "SELECT COALESCE(SUM(total), 0) FROM behold_active_times
             WHERE channel_id = ?1 AND nick = 'alice'",
            [id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(active_total, 2);

    // Nothing leaked from the discarded events.
    let spammer_rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM behold_text_stats WHERE nick = 'spammer'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(spammer_rows, 0);
    let channels: i64 = conn
        .query_row("SELECT COUNT(*) FROM behold_channels", [], |row| row.get(0))
        .unwrap();
    assert_eq!(channels, 1);

    let canonical_nick: String = conn
        .query_row(
            "SELECT canonical_nick FROM behold_canonical_nicks WHERE normalized_nick = 'alice'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(canonical_nick, "Alice");

    let ignored: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM behold_ignored_nicks_global WHERE normalized_nick = 'spammer'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(ignored, 1);
}

#[tokio::test]
async fn test_second_flush_is_additive() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("behold.db");

    let store = SqliteStore::open(&db_path).unwrap();
    let mut app = App::new(store, '!', Duration::from_secs(0));
    app.add_channel(Channel::parse("#rust").unwrap());

    app.handle_event(&decode(
        r##"{"kind":"chat","from":"Alice","channel":"#rust","text":"tea is hot"}"##,
    ));
    app.flush().await.unwrap();

    // The buffers were reset, so an immediate flush commits nothing.
    assert!(app.flush().await.unwrap().is_noop());

    app.handle_event(&decode(
        r##"{"kind":"chat","from":"alice","channel":"#rust","text":"two words here now"}"##,
    ));
    app.flush().await.unwrap();

    let conn = Connection::open(&db_path).unwrap();
    let id = channel_id(&conn, "#rust");
    let (messages, words, avg_words): (i64, i64, f64) = conn
        .query_row(
            "SELECT messages, words, avg_words FROM behold_text_stats
             WHERE channel_id = ?1 AND nick = 'alice'",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!((messages, words), (2, 7));
    assert!((avg_words - 3.5).abs() < f64::EPSILON);
}
