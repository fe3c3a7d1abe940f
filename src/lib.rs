//! Behold: per-channel chat activity statistics
//!
//! Events flow in (chat lines, joins, parts, kicks, mode changes), counters
//! accumulate in memory, and a periodic flush reconciles and commits them to
//! SQLite in a single transaction.

pub mod classify;
pub mod config;
pub mod events;
pub mod ident;
pub mod persistence;
pub mod recorder;
pub mod roster;
pub mod runtime;
pub mod scheduler;
pub mod stats;
