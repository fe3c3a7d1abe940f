//! Durable storage seam
//!
//! The store owns the relational schema and the reconciliation algorithm.
//! Callers hand it the current buffers plus the desired channel and ignore
//! configuration; everything is applied in one transaction or not at all.

pub mod migrations;
pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::ident::Channel;
use crate::roster::IgnoreList;
use crate::stats::StatBuffers;
use async_trait::async_trait;
use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    /// A buffered or ignored entry referenced a channel that is not tracked.
    UnknownChannel(String),
    Io(std::io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(err) => write!(f, "Database error: {}", err),
            StoreError::UnknownChannel(name) => write!(f, "No such channel: {}", name),
            StoreError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(err) => Some(err),
            StoreError::Io(err) => Some(err),
            StoreError::UnknownChannel(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

/// Result of one flush transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistOutcome {
    /// Counter and canonical-nick statements executed. Zero means the commit
    /// step was a no-op (reconciliation may still have written).
    pub counter_statements: usize,
}

impl PersistOutcome {
    pub fn is_noop(&self) -> bool {
        self.counter_statements == 0
    }
}

#[async_trait]
pub trait StatsStore {
    /// Reconciles the stored channel set and ignore lists to the desired
    /// state, then commits all buffered counter deltas, inside a single
    /// transaction. On error nothing is visible and the buffers must be kept.
    async fn persist(
        &mut self,
        buffers: &StatBuffers,
        channels: &[Channel],
        ignores: &IgnoreList,
    ) -> Result<PersistOutcome, StoreError>;

    /// The stored channel set, for seeding the roster at boot.
    async fn load_channels(&mut self) -> Result<Vec<Channel>, StoreError>;

    /// The stored ignore lists, for seeding the in-memory lists at boot.
    async fn load_ignore_list(&mut self) -> Result<IgnoreList, StoreError>;
}
