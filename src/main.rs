//! JSON-lines event feed on stdin, SQLite stats out

use behold::config::RuntimeConfig;
use behold::events::Event;
use behold::ident::Channel;
use behold::persistence::SqliteStore;
use behold::runtime::{App, Inbound};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = match RuntimeConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.rust_log.clone()),
    )
    .target(env_logger::Target::Stderr)
    .init();

    let store = SqliteStore::open(&config.db_path)?;
    let mut app = App::boot(
        store,
        config.command_prefix,
        Duration::from_secs(config.write_interval_secs),
    )
    .await?;

    for name in &config.seed_channels {
        match Channel::parse(name) {
            Ok(channel) => {
                app.add_channel(channel);
            }
            Err(err) => log::warn!("Skipping seed channel '{}': {}", name, err),
        }
    }

    let (tx, rx) = mpsc::channel(256);
    let app_task = tokio::spawn(app.run(rx));

    // The flush cadence itself lives in the scheduler; this just wakes it.
    let ticker_tx = tx.clone();
    let ticker = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            if ticker_tx.send(Inbound::Tick).await.is_err() {
                break;
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Event>(line) {
            Ok(event) => {
                if tx.send(Inbound::Event(event)).await.is_err() {
                    break;
                }
            }
            Err(err) => log::error!("Failed to decode event: {}", err),
        }
    }

    log::info!("Event feed closed, shutting down");
    ticker.abort();
    drop(tx);
    app_task.await?;

    Ok(())
}
