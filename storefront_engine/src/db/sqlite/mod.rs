//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or open an atomic transaction as the
//! need arises, and call through to the functions without any other changes.
mod db;
mod errors;

pub mod audit;
pub mod backup;
pub mod maintenance;
pub mod orders;
pub mod products;
pub mod reports;
pub mod users;

use std::{str::FromStr, time::Duration};

pub use db::SqliteDatabase;
pub use errors::SqliteDatabaseError;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for the connection pool. Every connection enforces foreign keys and runs in WAL mode, so readers never
/// observe a half-written order while a writer holds the database lock.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub busy_timeout: Duration,
    pub create_if_missing: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self { max_connections: 5, busy_timeout: DEFAULT_BUSY_TIMEOUT, create_if_missing: true }
    }
}

pub async fn new_pool(url: &str, settings: &PoolSettings) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(settings.create_if_missing)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(settings.busy_timeout);
    let pool = SqlitePoolOptions::new().max_connections(settings.max_connections).connect_with(options).await?;
    Ok(pool)
}
